//! Pipeline configuration file support.
//!
//! The file only names where data comes from and goes to, plus the default
//! log filter:
//!
//! ```toml
//! [input]
//! path = "data/crashes.csv"
//!
//! [output]
//! features = "out/features.csv"
//! report = "out/report.json"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub features: Option<PathBuf>,
    /// JSON run report; skipped when unset.
    #[serde(default)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PipelineConfig {
    /// Load the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Replaces the file settings with whichever command-line values are set.
    pub fn with_overrides(
        mut self,
        input: Option<PathBuf>,
        features: Option<PathBuf>,
        report: Option<PathBuf>,
    ) -> Self {
        if input.is_some() {
            self.input.path = input;
        }
        if features.is_some() {
            self.output.features = features;
        }
        if report.is_some() {
            self.output.report = report;
        }
        self
    }

    pub fn input_path(&self) -> Result<&Path> {
        self.input
            .path
            .as_deref()
            .ok_or_else(|| PipelineError::Config("No input path configured ([input] path)".to_string()))
    }

    pub fn features_path(&self) -> Result<&Path> {
        self.output.features.as_deref().ok_or_else(|| {
            PipelineError::Config("No feature output configured ([output] features)".to_string())
        })
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.output.report.as_deref()
    }
}
