use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_operations() {
    Command::cargo_bin("pgvault")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("archive"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn missing_config_file_is_a_fatal_error() {
    Command::cargo_bin("pgvault")
        .unwrap()
        .args(["--config", "/nonexistent/pgvault.toml", "backup", "primary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn backup_writes_the_status_code_to_the_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("pgdata");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("PG_VERSION"), b"16\n").unwrap();

    let config_path = dir.path().join("pgvault.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[global]
base_dir = "{}"

[[servers]]
name = "primary"
data_dir = "{}"
version = 16
"#,
            dir.path().join("vault").display(),
            data_dir.display()
        ),
    )
    .unwrap();

    let status_path = dir.path().join("status");
    Command::cargo_bin("pgvault")
        .unwrap()
        .args(["--config"])
        .arg(&config_path)
        .args(["--status-to"])
        .arg(&status_path)
        .args(["backup", "primary"])
        .assert()
        .success();

    assert_eq!(fs::read(&status_path).unwrap(), vec![0, 0, 0, 0]);
}

#[test]
fn unknown_server_fails_with_a_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("pgvault.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[global]
base_dir = "{}"

[[servers]]
name = "primary"
data_dir = "{}"
version = 16
"#,
            dir.path().join("vault").display(),
            dir.path().display()
        ),
    )
    .unwrap();

    Command::cargo_bin("pgvault")
        .unwrap()
        .args(["--config"])
        .arg(&config_path)
        .args(["backup", "standby"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown server"));
}
