//! Configuration file handling for bms-cli

use anyhow::{Context, Result};
use bms_core::DetectionThresholds;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Default time range for `summary`
    pub range: Option<String>,
    /// Detection limits for `detect`
    pub detection: Option<DetectionThresholds>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("bms-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        output: Option<OutputFormat>,
        no_color: bool,
    ) -> Result<MergedConfig> {
        let output = match (output, self.output.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => OutputFormat::from_str(name, true)
                .map_err(|e| anyhow::anyhow!("Invalid output format in config: {}", e))?,
            (None, None) => OutputFormat::default(),
        };

        Ok(MergedConfig {
            output,
            no_color: no_color || self.no_color.unwrap_or(false),
            range: self.range.clone().unwrap_or_else(|| "1day".to_string()),
            detection: self.detection.clone().unwrap_or_default(),
        })
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub output: OutputFormat,
    pub no_color: bool,
    pub range: String,
    pub detection: DetectionThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let config = Config {
            output: Some("json".to_string()),
            no_color: Some(true),
            ..Default::default()
        };
        let merged = config.merge_with_args(Some(OutputFormat::Csv), false).unwrap();
        assert_eq!(merged.output, OutputFormat::Csv);
        assert!(merged.no_color);

        let merged = config.merge_with_args(None, false).unwrap();
        assert_eq!(merged.output, OutputFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let merged = Config::default().merge_with_args(None, false).unwrap();
        assert_eq!(merged.output, OutputFormat::Table);
        assert!(!merged.no_color);
        assert_eq!(merged.range, "1day");
        assert_eq!(merged.detection, DetectionThresholds::default());
    }

    #[test]
    fn test_bad_output_in_config() {
        let config = Config {
            output: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(config.merge_with_args(None, false).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "output = \"csv\"\nrange = \"1hour\"\n\n[detection]\npower_spike_kw = 40.0\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        let merged = config.merge_with_args(None, false).unwrap();
        assert_eq!(merged.output, OutputFormat::Csv);
        assert_eq!(merged.range, "1hour");
        assert_eq!(merged.detection.power_spike_kw, 40.0);
        assert_eq!(merged.detection.temp_high, 35.0);
    }
}
