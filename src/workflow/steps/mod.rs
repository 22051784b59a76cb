//! Workflow step implementations.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};

mod archive;
mod basebackup;
mod compression;
mod permissions;
mod restore;
mod verify;

pub use archive::ArchiveStep;
pub use basebackup::BasebackupStep;
pub use compression::CompressionStep;
pub use permissions::PermissionsStep;
pub use restore::RestoreStep;
pub use verify::VerifyStep;

/// File name of the per-backup manifest written beside the data directory.
pub(crate) const MANIFEST_FILE: &str = "backup.manifest";

/// One recorded file of a backup's data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ManifestEntry {
    /// Path relative to the data directory.
    pub path: String,
    pub size: u64,
}

/// Record every regular file under `data` into `<root>/backup.manifest`,
/// sorted by path. Steps that rewrite the data directory after the base
/// backup (compression) call this again so the manifest always describes
/// the on-disk state.
pub(crate) fn write_manifest(root: &Path, data: &Path) -> Result<()> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(data) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(data)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        entries.push(ManifestEntry {
            path: relative.to_string_lossy().into_owned(),
            size: entry
                .metadata()
                .map_err(|e| std::io::Error::other(e.to_string()))?
                .len(),
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    let file = File::create(root.join(MANIFEST_FILE))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &entries)?;
    Ok(())
}

/// Load the manifest recorded at backup time.
pub(crate) fn read_manifest(root: &Path) -> Result<Vec<ManifestEntry>> {
    let path = root.join(MANIFEST_FILE);
    let file = File::open(&path).map_err(|_| {
        Error::InvalidArgument(format!("backup has no manifest: {}", path.display()))
    })?;
    let entries = serde_json::from_reader(BufReader::new(file))?;
    Ok(entries)
}

/// Pick a backup label under `backup_root` for `identifier`: `newest`,
/// `oldest`, or an exact label. Labels sort chronologically by name.
pub(crate) fn select_backup(backup_root: &Path, identifier: &str) -> Result<String> {
    let mut labels: Vec<String> = fs::read_dir(backup_root)
        .map_err(|_| {
            Error::InvalidArgument(format!("no backups under {}", backup_root.display()))
        })?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    labels.sort();

    let chosen = match identifier {
        "newest" | "latest" => labels.last().cloned(),
        "oldest" => labels.first().cloned(),
        label => labels.iter().find(|l| *l == label).cloned(),
    };
    chosen.ok_or_else(|| Error::InvalidArgument(format!("backup not found: {identifier}")))
}

/// Recursively copy `src` into `dst`, creating directories as needed.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Total size in bytes of the regular files under `root`.
pub(crate) fn dir_size(root: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(|e| std::io::Error::other(e.to_string()))?.len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_tree_preserves_structure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("base/1")).unwrap();
        fs::write(src.join("base/1/1259"), b"pg_class").unwrap();
        fs::write(src.join("PG_VERSION"), b"16\n").unwrap();

        let dst = dir.path().join("dst");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read(dst.join("base/1/1259")).unwrap(), b"pg_class");
        assert_eq!(dir_size(&dst).unwrap(), dir_size(&src).unwrap());
    }

    #[test]
    fn manifest_round_trips_sorted_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("backup");
        let data = root.join("data");
        fs::create_dir_all(data.join("base/1")).unwrap();
        fs::write(data.join("base/1/1259"), b"pg_class").unwrap();
        fs::write(data.join("PG_VERSION"), b"16\n").unwrap();

        write_manifest(&root, &data).unwrap();
        let entries = read_manifest(&root).unwrap();

        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    path: "PG_VERSION".into(),
                    size: 3,
                },
                ManifestEntry {
                    path: "base/1/1259".into(),
                    size: 8,
                },
            ]
        );
    }

    #[test]
    fn missing_manifest_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_manifest(dir.path()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn select_backup_honors_identifier_forms() {
        let dir = tempfile::tempdir().unwrap();
        for label in ["20250101000000", "20250201000000", "20250301000000"] {
            fs::create_dir_all(dir.path().join(label)).unwrap();
        }

        assert_eq!(select_backup(dir.path(), "newest").unwrap(), "20250301000000");
        assert_eq!(select_backup(dir.path(), "oldest").unwrap(), "20250101000000");
        assert_eq!(
            select_backup(dir.path(), "20250201000000").unwrap(),
            "20250201000000"
        );
        assert!(matches!(
            select_backup(dir.path(), "19990101000000"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
