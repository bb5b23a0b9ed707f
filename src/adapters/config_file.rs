//! JSON file configuration source.
//!
//! The path comes from `TANKBOT_CONFIG`.  No variable means defaults.

use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::SystemConfig;
use crate::error::ConfigError;

pub const CONFIG_ENV_VAR: &str = "TANKBOT_CONFIG";

pub struct FileConfig {
    path: Option<PathBuf>,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ConfigPort for FileConfig {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(path) = &self.path else {
            info!("config: {} not set, using defaults", CONFIG_ENV_VAR);
            return Ok(SystemConfig::default());
        };
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::IoError,
        })?;
        let cfg: SystemConfig =
            serde_json::from_slice(&bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("config: loaded {}", path.display());
        Ok(cfg)
    }
}
