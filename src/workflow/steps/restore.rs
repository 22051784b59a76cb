//! Restore step: place a backup's data under a target directory.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;
use walkdir::WalkDir;

use crate::bus::{node, ParameterBus, Value};
use crate::error::{Error, Result};
use crate::workflow::steps::select_backup;
use crate::workflow::{OperationContext, StepKind, WorkflowStep};

pub struct RestoreStep {
    /// Resolved during setup: (backup label, backup data dir, target base).
    selected: Option<Selection>,
}

struct Selection {
    label: String,
    data: PathBuf,
    target_base: PathBuf,
}

impl RestoreStep {
    pub fn create() -> Self {
        Self { selected: None }
    }
}

impl WorkflowStep for RestoreStep {
    fn kind(&self) -> StepKind {
        StepKind::Restore
    }

    /// Resolves the backup to restore and publishes the target paths; later
    /// steps' setup validates against these before any execute runs.
    fn setup(
        &mut self,
        ctx: &OperationContext,
        input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        let identifier = input
            .require(node::IDENTIFIER)?
            .as_str()
            .ok_or_else(|| Error::InvalidArgument("identifier must be a string".into()))?
            .to_owned();
        let directory = input
            .require(node::DIRECTORY)?
            .as_path()
            .ok_or_else(|| Error::InvalidArgument("directory must be a path".into()))?
            .to_owned();

        let backup_root = ctx.server.backup_root(ctx.base_dir);
        let label = select_backup(&backup_root, &identifier)?;
        let data = backup_root.join(&label).join("data");
        let target_base = directory.join(format!("{}-{}", ctx.server.name, label));

        fs::create_dir_all(&directory)?;

        output.append(node::LABEL, Value::String(label.clone()))?;
        output.append(node::TARGET_ROOT, Value::Path(directory))?;
        output.append(node::TARGET_BASE, Value::Path(target_base.clone()))?;

        self.selected = Some(Selection {
            label,
            data,
            target_base,
        });
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        _output: &mut ParameterBus,
    ) -> Result<()> {
        let selection = self
            .selected
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("restore executed before setup".into()))?;

        restore_tree(&selection.data, &selection.target_base)?;
        debug!(
            "restore complete: {}/{} -> {}",
            ctx.server.name,
            selection.label,
            selection.target_base.display()
        );
        Ok(())
    }
}

/// Copy the backup data into place, reversing per-file gzip compression for
/// entries carrying a `.gz` suffix.
fn restore_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            if entry.path().extension().is_some_and(|ext| ext == "gz") {
                let plain = target.with_extension("");
                let reader = BufReader::new(File::open(entry.path())?);
                let mut decoder = GzDecoder::new(reader);
                let mut writer = BufWriter::new(File::create(plain)?);
                io::copy(&mut decoder, &mut writer)?;
            } else {
                fs::copy(entry.path(), &target)?;
            }
        }
    }
    Ok(())
}
