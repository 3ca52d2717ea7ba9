//! Runner configuration (klass.toml)
//!
//! ```toml
//! [run]
//! filter = "classes"
//! fail_fast = true
//! format = "json"
//! color = "never"
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent
pub const CONFIG_FILE_NAME: &str = "klass.toml";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read file
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Output format for run results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored, human-readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// When to use colored output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorWhen {
    /// Color when writing to a terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

/// Top-level config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `[run]` table
    pub run: RunConfig,
}

/// Settings for `klass run`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Only run cases whose name contains this text
    pub filter: Option<String>,
    /// Stop after the first failing case
    pub fail_fast: bool,
    /// Output format
    pub format: OutputFormat,
    /// Color mode
    pub color: ColorWhen,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub filter: Option<String>,
    pub fail_fast: bool,
    pub format: Option<OutputFormat>,
    pub color: Option<ColorWhen>,
}

impl Config {
    /// Parse a config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Load the explicit config, or `klass.toml` from `dir` if present, or defaults
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using config file");
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(filter) = &self.run.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "run.filter cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl RunConfig {
    /// Apply command-line overrides
    pub fn merge(mut self, overrides: RunOverrides) -> Self {
        if overrides.filter.is_some() {
            self.filter = overrides.filter;
        }
        self.fail_fast |= overrides.fail_fast;
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(color) = overrides.color {
            self.color = color;
        }
        self
    }
}
