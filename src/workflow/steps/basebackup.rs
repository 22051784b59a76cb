//! Base backup step: snapshot the server's data directory.

use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::bus::{node, ParameterBus, Value};
use crate::error::{Error, Result};
use crate::workflow::steps::{copy_tree, dir_size, write_manifest};
use crate::workflow::{OperationContext, StepKind, WorkflowStep};

/// Metadata written next to the backed-up data directory.
#[derive(Debug, Serialize)]
struct BackupInfo<'a> {
    label: &'a str,
    server: &'a str,
    version: Option<u32>,
    size: u64,
    created: String,
    elapsed_seconds: u64,
}

pub struct BasebackupStep;

impl BasebackupStep {
    pub fn create() -> Self {
        Self
    }
}

impl WorkflowStep for BasebackupStep {
    fn kind(&self) -> StepKind {
        StepKind::Basebackup
    }

    /// Validates the snapshot source, creates the backup directories and
    /// publishes their paths for the steps chained after this one. A label
    /// directory that already exists belongs to another backup and is
    /// rejected rather than merged into.
    fn setup(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        if !ctx.server.data_dir.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "data directory {} does not exist",
                ctx.server.data_dir.display()
            )));
        }

        let root = ctx.backup_dir();
        if root.exists() {
            return Err(Error::InvalidArgument(format!(
                "backup label already exists: {}",
                root.display()
            )));
        }
        let data = root.join("data");
        std::fs::create_dir_all(&data)?;

        output.append(node::BACKUP_ROOT, Value::Path(root))?;
        output.append(node::BACKUP_DATA, Value::Path(data))?;
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        let started = Instant::now();
        let root = ctx.backup_dir();
        let data = root.join("data");

        copy_tree(&ctx.server.data_dir, &data)?;
        let size = dir_size(&data)?;
        write_manifest(&root, &data)?;

        let info = BackupInfo {
            label: &ctx.label,
            server: &ctx.server.name,
            version: ctx.server.version,
            size,
            created: chrono::Local::now().to_rfc3339(),
            elapsed_seconds: started.elapsed().as_secs(),
        };
        let file = File::create(root.join("backup.info"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &info)?;

        output.append(node::BACKUP_SIZE, Value::Int(size as i64))?;
        debug!(
            "basebackup complete: {}/{} ({size} bytes)",
            ctx.server.name, ctx.label
        );
        Ok(())
    }

    /// Nothing to release; the backup tree is the operation's product.
    fn teardown(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        _output: &mut ParameterBus,
    ) -> Result<()> {
        debug!("basebackup (teardown): {}/{}", ctx.server.name, ctx.label);
        Ok(())
    }
}
