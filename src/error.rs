use thiserror::Error;

use crate::workflow::{Phase, StepKind};

/// The unified error type for the pgvault agent.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported PostgreSQL version: {0}")]
    UnsupportedVersion(u32),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("{kind} failed during {phase}: {message}")]
    Stage {
        phase: Phase,
        kind: StepKind,
        message: String,
    },

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a step failure with the phase and step kind it occurred in.
    pub fn stage(phase: Phase, kind: StepKind, source: Error) -> Self {
        Error::Stage {
            phase,
            kind,
            message: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
