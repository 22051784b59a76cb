//! # pgvault
//!
//! Backup, restore and archive orchestration agent for PostgreSQL servers.
//!
//! ## Modules
//!
//! - `archive` - Tar packaging and extraction collaborator
//! - `bus` - Shared parameter bus carrying values between workflow stages
//! - `config` - TOML configuration loading and validation
//! - `error` - Unified error type and result alias
//! - `management` - Result channel and observability label surface
//! - `ops` - Operation entry points (backup, restore, archive)
//! - `relpath` - On-disk relation path resolver and catalog version table
//! - `workflow` - Step trait, pipeline assembler and phase executor
pub mod archive;
pub mod bus;
pub mod config;
pub mod error;
pub mod management;
pub mod ops;
pub mod relpath;
pub mod workflow;
