//! Pipeline assembly.
//!
//! Wires the fixed, deterministic step sequence for each operation kind.
//! No I/O happens here; the steps themselves touch the filesystem.

use crate::config::ServerConfig;
use crate::workflow::steps::{
    ArchiveStep, BasebackupStep, CompressionStep, PermissionsStep, RestoreStep, VerifyStep,
};
use crate::workflow::{OperationKind, WorkflowStep};

/// Build the step sequence for an operation.
///
/// - backup: basebackup, compression (when the server enables it),
///   permissions
/// - restore: restore, permissions
/// - archive: restore to a staging tree, package, permissions
/// - verify: manifest re-check, read-only
///
/// Operation kinds are exhaustive here; an unregistered kind is rejected
/// earlier, when the request string is parsed into [`OperationKind`].
pub fn assemble(kind: OperationKind, server: &ServerConfig) -> Vec<Box<dyn WorkflowStep>> {
    match kind {
        OperationKind::Backup => {
            let mut steps: Vec<Box<dyn WorkflowStep>> = vec![Box::new(BasebackupStep::create())];
            if server.compression {
                steps.push(Box::new(CompressionStep::create()));
            }
            steps.push(Box::new(PermissionsStep::create(kind)));
            steps
        }
        OperationKind::Restore => vec![
            Box::new(RestoreStep::create()),
            Box::new(PermissionsStep::create(kind)),
        ],
        OperationKind::Archive => vec![
            Box::new(RestoreStep::create()),
            Box::new(ArchiveStep::create()),
            Box::new(PermissionsStep::create(kind)),
        ],
        OperationKind::Verify => vec![Box::new(VerifyStep::create())],
    }
}
