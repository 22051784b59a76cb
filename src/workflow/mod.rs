//! Staged workflow pipeline.
//!
//! Operations are sequences of [`WorkflowStep`]s run through uniform
//! setup → execute → teardown phases by the [`executor::Pipeline`]. Steps
//! exchange values over the shared [`crate::bus::ParameterBus`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::bus::ParameterBus;
use crate::config::ServerConfig;
use crate::error::{Error, Result};

pub mod assembler;
pub mod executor;
pub mod steps;


/// The operation kinds a pipeline can be assembled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Backup,
    Restore,
    Archive,
    Verify,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Backup => "backup",
            OperationKind::Restore => "restore",
            OperationKind::Archive => "archive",
            OperationKind::Verify => "verify",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = Error;

    /// Parse an operation kind from the management surface. Unknown kinds
    /// have no registered step sequence and are rejected.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "backup" => Ok(OperationKind::Backup),
            "restore" => Ok(OperationKind::Restore),
            "archive" => Ok(OperationKind::Archive),
            "verify" => Ok(OperationKind::Verify),
            other => Err(Error::InvalidArgument(format!(
                "unsupported operation: {other}"
            ))),
        }
    }
}

/// Identifies one step implementation, for logging and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Basebackup,
    Restore,
    Archive,
    Compression,
    Permissions,
    Verify,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Basebackup => "basebackup",
            StepKind::Restore => "restore",
            StepKind::Archive => "archive",
            StepKind::Compression => "compression",
            StepKind::Permissions => "permissions",
            StepKind::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// One of the three pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Execute,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Execute => "execute",
            Phase::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

/// Per-operation context passed into every step phase.
///
/// Replaces any ambient global configuration lookup: the configuration
/// snapshot is taken at operation start and carried here explicitly.
#[derive(Debug, Clone)]
pub struct OperationContext<'a> {
    pub server: &'a ServerConfig,
    pub base_dir: &'a Path,
    /// Label of the backup this operation creates.
    pub label: String,
}

impl OperationContext<'_> {
    /// Directory of the backup this operation creates,
    /// `<base_dir>/<server>/backup/<label>`.
    pub fn backup_dir(&self) -> PathBuf {
        self.server.backup_root(self.base_dir).join(&self.label)
    }
}

/// A unit of a backup/restore/archive operation.
///
/// Each step receives the operation context, the read-only input bus and
/// the mutable output bus in every phase. Setup validates preconditions and
/// publishes the paths later steps depend on; execute does the work;
/// teardown releases whatever setup acquired. Steps that have nothing to do
/// in a phase keep the default no-op.
pub trait WorkflowStep {
    fn kind(&self) -> StepKind;

    fn setup(
        &mut self,
        _ctx: &OperationContext,
        _input: &ParameterBus,
        _output: &mut ParameterBus,
    ) -> Result<()> {
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &OperationContext,
        input: &ParameterBus,
        output: &mut ParameterBus,
    ) -> Result<()>;

    fn teardown(
        &mut self,
        _ctx: &OperationContext,
        _input: &ParameterBus,
        _output: &mut ParameterBus,
    ) -> Result<()> {
        Ok(())
    }
}
