//! Archive step: package a restored staging tree into a tarball.

use std::fs;

use tracing::debug;

use crate::archive::create_tar_gz;
use crate::bus::{node, ParameterBus, Value};
use crate::error::{Error, Result};
use crate::workflow::{OperationContext, StepKind, WorkflowStep};

pub struct ArchiveStep;

impl ArchiveStep {
    pub fn create() -> Self {
        Self
    }
}

impl WorkflowStep for ArchiveStep {
    fn kind(&self) -> StepKind {
        StepKind::Archive
    }

    /// Requires the target paths published by the restore step's setup.
    fn setup(
        &mut self,
        _ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        output.require(node::TARGET_ROOT)?;
        output.require(node::TARGET_BASE)?;
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        let root = output
            .get_path(node::TARGET_ROOT)
            .ok_or_else(|| Error::InvalidArgument("target root must be a path".into()))?
            .to_owned();
        let base = output
            .get_path(node::TARGET_BASE)
            .ok_or_else(|| Error::InvalidArgument("target base must be a path".into()))?
            .to_owned();

        let prefix = base
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidArgument("target base has no directory name".into()))?
            .to_owned();
        let tarball = root.join(format!("{prefix}.tar.gz"));

        create_tar_gz(&base, &tarball, &prefix)?;
        debug!(
            "archive complete: {} -> {}",
            ctx.server.name,
            tarball.display()
        );
        output.append(node::ARCHIVE_FILE, Value::Path(tarball))?;
        Ok(())
    }

    /// The staging tree only exists to be packaged; remove it.
    fn teardown(
        &mut self,
        _ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        if let Some(base) = output.get_path(node::TARGET_BASE) {
            if base.is_dir() {
                fs::remove_dir_all(base)?;
            }
        }
        Ok(())
    }
}
