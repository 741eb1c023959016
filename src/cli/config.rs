//! TOML configuration file support.
//!
//! Instead of passing many CLI flags, users can specify settings in a config file:
//!
//! ```toml
//! # mzbin.toml
//! [conversion]
//! mode = "parallel"
//! workers = 8
//! sink = "file"
//! temp_dir = "/scratch/mzbin"
//! progress_interval = 5000
//! metadata = true
//! ```
//!
//! Command-line flags win over the file, and the file wins over the defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use mzbin::convert::{ConversionConfig, SinkKind, WriteMode};

use super::ConversionArgs;

/// Root configuration structure for mzbin.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: FileConversionConfig,
}

/// Conversion settings as they appear in the file; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConversionConfig {
    /// Write mode ("sequential", "parallel", "shared").
    pub mode: Option<WriteMode>,

    /// Worker count.
    pub workers: Option<usize>,

    /// Partition sink ("file" or "memory").
    pub sink: Option<SinkKind>,

    /// Directory for partition temp files.
    pub temp_dir: Option<PathBuf>,

    /// Progress log interval in scans.
    pub progress_interval: Option<usize>,

    /// Write the metadata sidecar.
    pub metadata: Option<bool>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

/// Resolve the effective configuration: flag > file > default
pub fn resolve(args: &ConversionArgs) -> Result<ConversionConfig> {
    let file = match &args.config {
        Some(path) => Config::from_file(path)?.conversion,
        None => FileConversionConfig::default(),
    };
    Ok(merge(args, file))
}

fn merge(args: &ConversionArgs, file: FileConversionConfig) -> ConversionConfig {
    let defaults = ConversionConfig::default();
    ConversionConfig {
        mode: args.mode.map(WriteMode::from).or(file.mode).unwrap_or(defaults.mode),
        workers: args.workers.or(file.workers).unwrap_or(defaults.workers),
        sink: args.sink.map(SinkKind::from).or(file.sink).unwrap_or(defaults.sink),
        temp_dir: args.temp_dir.clone().or(file.temp_dir).or(defaults.temp_dir),
        progress_interval: args
            .progress_interval
            .or(file.progress_interval)
            .unwrap_or(defaults.progress_interval),
        write_metadata: args.metadata || file.metadata.unwrap_or(defaults.write_metadata),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ModeArg, SinkArg};
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [conversion]
            mode = "shared"
            workers = 8
            sink = "memory"
            temp_dir = "/scratch"
            progress_interval = 5000
            metadata = true
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.mode, Some(WriteMode::Shared));
        assert_eq!(config.conversion.workers, Some(8));
        assert_eq!(config.conversion.sink, Some(SinkKind::Memory));
        assert_eq!(config.conversion.temp_dir, Some(PathBuf::from("/scratch")));
        assert_eq!(config.conversion.progress_interval, Some(5000));
        assert_eq!(config.conversion.metadata, Some(true));
    }

    #[test]
    fn test_partitioned_alias() {
        let config = Config::from_str("[conversion]\nmode = \"partitioned\"").unwrap();
        assert_eq!(config.conversion.mode, Some(WriteMode::Parallel));
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.conversion.mode, None);
        assert_eq!(config.conversion.workers, None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_str("[conversion]\ncompression_level = 3").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let file = Config::from_str("[conversion]\nmode = \"sequential\"\nworkers = 2\nsink = \"memory\"")
            .unwrap()
            .conversion;
        let args = ConversionArgs {
            mode: Some(ModeArg::Shared),
            sink: Some(SinkArg::File),
            ..Default::default()
        };

        let config = merge(&args, file);
        assert_eq!(config.mode, WriteMode::Shared);
        assert_eq!(config.workers, 2);
        assert_eq!(config.sink, SinkKind::File);
        assert_eq!(config.progress_interval, 1000);
        assert!(!config.write_metadata);
    }

    #[test]
    fn test_defaults_without_file() {
        let config = merge(&ConversionArgs::default(), FileConversionConfig::default());
        assert_eq!(config, ConversionConfig::default());
    }
}
