//! Gzip compression step for freshly written backup data.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::bus::{node, ParameterBus};
use crate::error::{Error, Result};
use crate::workflow::steps::write_manifest;
use crate::workflow::{OperationContext, StepKind, WorkflowStep};

pub struct CompressionStep;

impl CompressionStep {
    pub fn create() -> Self {
        Self
    }
}

impl WorkflowStep for CompressionStep {
    fn kind(&self) -> StepKind {
        StepKind::Compression
    }

    /// Requires the backup directories published by the basebackup step's
    /// setup.
    fn setup(
        &mut self,
        _ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        output.require(node::BACKUP_ROOT)?;
        output.require(node::BACKUP_DATA)?;
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &OperationContext,
        _input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()> {
        let data = output
            .get_path(node::BACKUP_DATA)
            .ok_or_else(|| Error::InvalidArgument("backup data must be a path".into()))?
            .to_owned();

        let mut compressed = 0usize;
        for entry in walkdir::WalkDir::new(&data) {
            let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().is_some_and(|ext| ext == "gz") {
                continue;
            }
            gzip_file(entry.path())?;
            compressed += 1;
        }

        // The data files changed; re-record them so the manifest always
        // describes the on-disk state verification will see.
        let root = output
            .get_path(node::BACKUP_ROOT)
            .ok_or_else(|| Error::InvalidArgument("backup root must be a path".into()))?
            .to_owned();
        write_manifest(&root, &data)?;

        debug!(
            "compression complete: {}/{} ({compressed} files)",
            ctx.server.name, ctx.label
        );
        Ok(())
    }
}

/// Gzip `path` to `<path>.gz` and remove the original.
fn gzip_file(path: &Path) -> Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push(".gz");

    let mut reader = BufReader::new(File::open(path)?);
    let mut encoder = GzEncoder::new(
        BufWriter::new(File::create(&target)?),
        Compression::default(),
    );
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(path)?;
    Ok(())
}
