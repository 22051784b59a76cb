//! Configuration loading and validation.
//!
//! The configuration is a TOML file with a `[global]` section and one
//! `[[servers]]` entry per managed server. A snapshot is taken when an
//! operation starts and passed explicitly into the assembler, executor and
//! resolver; core logic never consults ambient global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub global: GlobalConfig,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Root under which per-server backup directories are created.
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub name: String,
    /// The server's data directory, the snapshot source for backups.
    pub data_dir: PathBuf,
    /// Target major version. Absence is a hard error at use time, never a
    /// silent default.
    pub version: Option<u32>,
    /// Gzip backup data files after the base backup completes.
    #[serde(default)]
    pub compression: bool,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw).map_err(Error::Toml)?;
        if config.servers.is_empty() {
            return Err(Error::Config(format!(
                "no servers defined in {}",
                path.display()
            )));
        }
        Ok(config)
    }

    pub fn find_server(&self, name: &str) -> Result<&ServerConfig> {
        self.servers
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown server: {name}")))
    }
}

impl ServerConfig {
    /// The configured target major version, or [`Error::InvalidArgument`]
    /// when the configuration omits it.
    pub fn target_version(&self) -> Result<u32> {
        self.version.ok_or_else(|| {
            Error::InvalidArgument(format!("server {} has no version configured", self.name))
        })
    }

    /// Per-server backup root, `<base_dir>/<name>/backup`.
    pub fn backup_root(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.name).join("backup")
    }
}
