//! Permissions step: clamp produced trees to owner-only access.
//!
//! Backups and restored data directories carry credentials and catalog
//! contents; directories are clamped to 0700 and files to 0600, matching
//! what the server itself requires of a data directory.

use std::path::Path;

use tracing::debug;

use crate::bus::{node, ParameterBus};
use crate::error::Result;
use crate::workflow::{OperationContext, OperationKind, StepKind, WorkflowStep};

pub struct PermissionsStep {
    operation: OperationKind,
}

impl PermissionsStep {
    pub fn create(operation: OperationKind) -> Self {
        Self { operation }
    }
}

impl WorkflowStep for PermissionsStep {
    fn kind(&self) -> StepKind {
        StepKind::Permissions
    }

    fn execute(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        match self.operation {
            OperationKind::Backup => {
                if let Some(root) = output.get_path(node::BACKUP_ROOT) {
                    clamp_tree(root)?;
                }
            }
            OperationKind::Restore => {
                if let Some(base) = output.get_path(node::TARGET_BASE) {
                    clamp_tree(base)?;
                }
            }
            OperationKind::Archive => {
                if let Some(file) = output.get_path(node::ARCHIVE_FILE) {
                    clamp_file(file)?;
                }
            }
            // Verify is read-only and assembles no permissions step.
            OperationKind::Verify => {}
        }
        debug!(
            "permissions complete: {} ({})",
            ctx.server.name, self.operation
        );
        Ok(())
    }
}

#[cfg(unix)]
fn clamp_tree(root: &Path) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        let mode = if entry.file_type().is_dir() { 0o700 } else { 0o600 };
        fs::set_permissions(entry.path(), fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(unix)]
fn clamp_file(path: &Path) -> Result<()> {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn clamp_tree(_root: &Path) -> Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn clamp_file(_path: &Path) -> Result<()> {
    Ok(())
}
