//! Session configuration from the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use posemirror_core::{ComparisonConfig, MetricKind};

/// Metric argument enum for CLI
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricArg {
    /// Summed keypoint distance after scale normalization
    Distance,
    /// Largest joint-angle difference
    Angle,
}

impl From<MetricArg> for MetricKind {
    fn from(val: MetricArg) -> Self {
        match val {
            MetricArg::Distance => MetricKind::Distance,
            MetricArg::Angle => MetricKind::Angle,
        }
    }
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the configuration to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Start from an existing configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the active metric
    #[arg(short, long, value_enum)]
    pub metric: Option<MetricArg>,
}

/// Loads `path` (or the defaults) and applies a metric override.
pub fn load_config(path: Option<&Path>, metric: Option<MetricArg>) -> Result<ComparisonConfig> {
    let mut config = match path {
        Some(path) => ComparisonConfig::from_json(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ComparisonConfig::default(),
    };
    if let Some(metric) = metric {
        config.metric = metric.into();
    }
    Ok(config)
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.metric)?;

    match args.output {
        Some(path) => {
            config
                .to_json(&path)
                .with_context(|| format!("Failed to write config {}", path.display()))?;
            println!(
                "{} Configuration written to {}",
                "[OK]".green().bold(),
                path.display()
            );
        }
        None => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_conversion() {
        let m: MetricKind = MetricArg::Angle.into();
        assert_eq!(m, MetricKind::Angle);
    }

    #[test]
    fn test_load_defaults_with_override() {
        let cfg = load_config(None, Some(MetricArg::Angle)).unwrap();
        assert_eq!(cfg.metric, MetricKind::Angle);
        assert_eq!(cfg.feedback.frame_gate, 15);
    }

    #[test]
    fn test_execute_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posemirror.json");
        execute(ConfigArgs {
            output: Some(path.clone()),
            config: None,
            metric: Some(MetricArg::Angle),
        })
        .unwrap();

        let loaded = load_config(Some(&path), None).unwrap();
        assert_eq!(loaded.metric, MetricKind::Angle);
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"feedback":{"frame_gate":0}}"#).unwrap();
        assert!(load_config(Some(&path), None).is_err());
    }
}
