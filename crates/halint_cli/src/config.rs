//! Lint configuration.
//!
//! A [`LintConfig`] can be read from a RON file and is then overlaid with
//! whatever was given on the command line:
//!
//! ```ron
//! (
//!     names: ["erdman", "djma"],
//!     show_overkill: true,
//!     parallel: 4,
//! )
//! ```

use std::path::{Path, PathBuf};

use halint_core::notify::{LintOptions, NameFilter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// Everything that controls a lint run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Name fragments to report on; empty reports on everyone.
    pub names: Vec<String>,
    /// Report production-caused cap loss per event.
    pub show_caploss_from_production: bool,
    /// Report overkill per event.
    pub show_overkill: bool,
    /// Report flip-flops per event.
    pub show_flip_flops: bool,
    /// Files analyzed at once (0 = one per core).
    pub parallel: usize,
    /// Directory to write one JSON report per replay into.
    pub json_report: Option<PathBuf>,
}

/// Command-line values laid over a [`LintConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Whitespace-separated name fragments; replaces the configured list.
    pub names: Option<String>,
    /// Switches are OR-ed into the configured ones.
    pub show_caploss_from_production: bool,
    /// See [`LintConfig::show_overkill`].
    pub show_overkill: bool,
    /// See [`LintConfig::show_flip_flops`].
    pub show_flip_flops: bool,
    /// Replaces the configured thread count.
    pub parallel: Option<usize>,
    /// Replaces the configured report directory.
    pub json_report: Option<PathBuf>,
}

impl LintConfig {
    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: LintConfig = ron::from_str(ron)?;
        Ok(config)
    }

    /// Lay command-line values over this configuration.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(names) = overrides.names {
            self.names = names.split_whitespace().map(str::to_string).collect();
        }
        self.show_caploss_from_production |= overrides.show_caploss_from_production;
        self.show_overkill |= overrides.show_overkill;
        self.show_flip_flops |= overrides.show_flip_flops;
        if let Some(parallel) = overrides.parallel {
            self.parallel = parallel;
        }
        if overrides.json_report.is_some() {
            self.json_report = overrides.json_report;
        }
        self
    }

    /// Analysis switches for the core.
    #[must_use]
    pub fn to_options(&self) -> LintOptions {
        LintOptions {
            names: NameFilter::new(self.names.iter().cloned()),
            show_caploss_from_production: self.show_caploss_from_production,
            show_overkill: self.show_overkill,
            show_flip_flops: self.show_flip_flops,
        }
    }
}
