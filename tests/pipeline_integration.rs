//! End-to-end pipeline runs over a throwaway server fixture.

use std::fs;
use std::path::Path;

use pgvault::archive::extract_tar_file;
use pgvault::config::{Config, GlobalConfig, ServerConfig};
use pgvault::ops::{self, OperationRequest};
use pgvault::workflow::OperationKind;

fn fixture(compression: bool) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("pgdata");
    fs::create_dir_all(data_dir.join("base/16384")).unwrap();
    fs::create_dir_all(data_dir.join("global")).unwrap();
    fs::write(data_dir.join("base/16384/2608"), b"pg_depend contents").unwrap();
    fs::write(data_dir.join("base/16384/1259"), b"pg_class contents").unwrap();
    fs::write(data_dir.join("global/1262"), b"pg_database contents").unwrap();
    fs::write(data_dir.join("PG_VERSION"), b"16\n").unwrap();

    let config = Config {
        global: GlobalConfig {
            base_dir: dir.path().join("vault"),
        },
        servers: vec![ServerConfig {
            name: "primary".into(),
            data_dir,
            version: Some(16),
            compression,
        }],
    };
    (dir, config)
}

fn backup_label(config: &Config) -> String {
    let backup_root = config.global.base_dir.join("primary/backup");
    let mut labels: Vec<String> = fs::read_dir(backup_root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    labels.sort();
    labels.pop().unwrap()
}

fn run_ok(config: &Config, kind: OperationKind, request: &OperationRequest) {
    let mut channel = Vec::new();
    let ok = ops::run(config, kind, "primary", request, &mut channel).unwrap();
    assert!(ok, "{kind} should succeed");
    assert_eq!(channel, vec![0, 0, 0, 0]);
}

#[test]
fn backup_then_restore_round_trips_the_data_directory() {
    let (dir, config) = fixture(false);

    run_ok(&config, OperationKind::Backup, &OperationRequest::default());

    let label = backup_label(&config);
    let backup = config.global.base_dir.join("primary/backup").join(&label);
    assert!(backup.join("backup.info").is_file());
    assert_eq!(
        fs::read(backup.join("data/base/16384/2608")).unwrap(),
        b"pg_depend contents"
    );

    let target = dir.path().join("restored");
    run_ok(
        &config,
        OperationKind::Restore,
        &OperationRequest {
            identifier: Some("newest"),
            directory: Some(&target),
        },
    );

    let restored = target.join(format!("primary-{label}"));
    assert_eq!(
        fs::read(restored.join("base/16384/2608")).unwrap(),
        b"pg_depend contents"
    );
    assert_eq!(fs::read(restored.join("PG_VERSION")).unwrap(), b"16\n");
}

#[test]
fn compressed_backup_is_gzipped_on_disk_and_plain_after_restore() {
    let (dir, config) = fixture(true);

    run_ok(&config, OperationKind::Backup, &OperationRequest::default());

    let label = backup_label(&config);
    let data = config
        .global
        .base_dir
        .join("primary/backup")
        .join(&label)
        .join("data");
    assert!(data.join("base/16384/2608.gz").is_file());
    assert!(!data.join("base/16384/2608").exists());

    let target = dir.path().join("restored");
    run_ok(
        &config,
        OperationKind::Restore,
        &OperationRequest {
            identifier: Some("newest"),
            directory: Some(&target),
        },
    );

    let restored = target.join(format!("primary-{label}"));
    assert_eq!(
        fs::read(restored.join("base/16384/2608")).unwrap(),
        b"pg_depend contents"
    );
    assert!(!restored.join("base/16384/2608.gz").exists());
}

#[test]
fn archive_packages_a_tarball_and_removes_its_staging_tree() {
    let (dir, config) = fixture(false);

    run_ok(&config, OperationKind::Backup, &OperationRequest::default());
    let label = backup_label(&config);

    let target = dir.path().join("archives");
    run_ok(
        &config,
        OperationKind::Archive,
        &OperationRequest {
            identifier: Some("newest"),
            directory: Some(&target),
        },
    );

    let prefix = format!("primary-{label}");
    let tarball = target.join(format!("{prefix}.tar.gz"));
    assert!(tarball.is_file());
    // The staging tree the archive was packaged from is gone.
    assert!(!target.join(&prefix).exists());

    let extracted = dir.path().join("extracted");
    extract_tar_file(&tarball, &extracted).unwrap();
    assert_eq!(
        fs::read(extracted.join(&prefix).join("base/16384/2608")).unwrap(),
        b"pg_depend contents"
    );
}

#[test]
fn verify_passes_on_an_untouched_backup() {
    let (_dir, config) = fixture(false);
    run_ok(&config, OperationKind::Backup, &OperationRequest::default());

    run_ok(
        &config,
        OperationKind::Verify,
        &OperationRequest {
            identifier: Some("newest"),
            directory: None,
        },
    );
}

#[test]
fn verify_passes_on_a_compressed_backup() {
    let (_dir, config) = fixture(true);
    run_ok(&config, OperationKind::Backup, &OperationRequest::default());

    run_ok(
        &config,
        OperationKind::Verify,
        &OperationRequest {
            identifier: Some("newest"),
            directory: None,
        },
    );
}

#[test]
fn verify_reports_a_tampered_backup() {
    let (_dir, config) = fixture(false);
    run_ok(&config, OperationKind::Backup, &OperationRequest::default());

    let label = backup_label(&config);
    let data = config
        .global
        .base_dir
        .join("primary/backup")
        .join(&label)
        .join("data");
    // Same path, different length: the recorded size no longer matches.
    fs::write(data.join("base/16384/2608"), b"truncated").unwrap();

    let mut channel = Vec::new();
    let ok = ops::run(
        &config,
        OperationKind::Verify,
        "primary",
        &OperationRequest {
            identifier: Some("newest"),
            directory: None,
        },
        &mut channel,
    )
    .unwrap();

    assert!(!ok);
    assert_eq!(channel, vec![0, 0, 0, 1]);
}

#[cfg(unix)]
#[test]
fn backup_tree_is_clamped_to_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, config) = fixture(false);
    run_ok(&config, OperationKind::Backup, &OperationRequest::default());

    let label = backup_label(&config);
    let backup = config.global.base_dir.join("primary/backup").join(&label);

    let dir_mode = fs::metadata(&backup).unwrap().permissions().mode() & 0o777;
    assert_eq!(dir_mode, 0o700);
    let file_mode = fs::metadata(backup.join("data/PG_VERSION"))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(file_mode, 0o600);
}

#[test]
fn restore_of_an_unknown_label_fails_and_leaves_no_target() {
    let (dir, config) = fixture(false);
    run_ok(&config, OperationKind::Backup, &OperationRequest::default());

    let target = dir.path().join("restored");
    let mut channel = Vec::new();
    let ok = ops::run(
        &config,
        OperationKind::Restore,
        "primary",
        &OperationRequest {
            identifier: Some("19990101000000"),
            directory: Some(&target),
        },
        &mut channel,
    )
    .unwrap();

    assert!(!ok);
    assert_eq!(channel, vec![0, 0, 0, 1]);
    assert!(!has_entries(&target));
}

fn has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
