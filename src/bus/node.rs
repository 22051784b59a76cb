//! Well-known parameter bus entry names.

/// Server name the operation targets.
pub const SERVER: &str = "server";
/// Label of the backup being created or consumed.
pub const LABEL: &str = "label";
/// Backup identifier from the request (`newest`, `oldest`, or a label).
pub const IDENTIFIER: &str = "identifier";
/// Target directory from the request.
pub const DIRECTORY: &str = "directory";

/// Root directory of the backup produced by the basebackup step.
pub const BACKUP_ROOT: &str = "backup_root";
/// Data directory inside the backup root.
pub const BACKUP_DATA: &str = "backup_data";
/// Total size in bytes of the backed-up data directory.
pub const BACKUP_SIZE: &str = "backup_size";

/// Root directory a restore operation writes under.
pub const TARGET_ROOT: &str = "target_root";
/// The restored tree itself, `<target_root>/<server>-<label>`.
pub const TARGET_BASE: &str = "target_base";
/// The packaged archive file produced by the archive step.
pub const ARCHIVE_FILE: &str = "archive_file";
