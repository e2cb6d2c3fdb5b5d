use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_ARCHIVE_FILE, DEFAULT_CONFIG_FILE, DEFAULT_LOG_DIR, DEFAULT_METRICS_FILE,
    DEFAULT_OUTPUT_FILE, DEFAULT_PREDICTIONS_FILE,
};
use crate::error::{Result, WrangleError};
use crate::pipeline::ingestion::{SourceLocation, SourceSet};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub fetch: FetchConfig,
}

/// File paths or `http(s)://` URLs of the three source tables
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub archive: String,
    pub predictions: String,
    pub metrics: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            archive: DEFAULT_ARCHIVE_FILE.to_string(),
            predictions: DEFAULT_PREDICTIONS_FILE.to_string(),
            metrics: DEFAULT_METRICS_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Config {
    /// Load from `path`, or from `wrangle.toml` in the working directory.
    ///
    /// An explicitly named file must exist. A missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !explicit && !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            WrangleError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.fetch.timeout_seconds == 0 {
            return Err(WrangleError::Config(
                "fetch.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn source_set(&self) -> SourceSet {
        SourceSet {
            archive: SourceLocation::parse(&self.sources.archive),
            predictions: SourceLocation::parse(&self.sources.predictions),
            metrics: SourceLocation::parse(&self.sources.metrics),
        }
    }
}
