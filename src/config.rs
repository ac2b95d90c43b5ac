//! Optional TOML configuration for the CLI.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::report::DEFAULT_LIMIT;

pub const DEFAULT_CONFIG_FILE: &str = "lms-analytics.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when neither `RUST_LOG` nor `--log-level` is given.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub default_limit: usize,
    pub export_dir: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            export_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub data: DataConfig,
    pub reports: ReportsConfig,
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => {
                debug!(path = %path.display(), "loaded configuration");
                Self::from_toml(&raw)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
