//! One-shot comparison of two poses.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use posemirror_core::metrics::ActiveComparator;
use posemirror_core::score::{accuracy_percent, tier_for};
use posemirror_core::{Comparator, ComparisonConfig, ComparisonResult, MetricKind, Pose, Tier};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::display::{format_percent, format_tier};
use crate::recording::load_pose;
use crate::settings::{load_config, MetricArg};

/// Arguments for the compare command
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Live pose (JSON)
    #[arg(short, long)]
    pub live: PathBuf,

    /// Reference pose (JSON)
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the active metric
    #[arg(short, long, value_enum)]
    pub metric: Option<MetricArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON
    Json,
}

/// Everything the compare command reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareReport {
    /// Raw comparison with per-part breakdown
    pub comparison: ComparisonResult,
    /// Accuracy in `[0, 100]`
    pub accuracy_percent: f32,
    /// Accuracy bucket
    pub tier: Tier,
    /// Whether the deviation exceeds the feedback threshold
    pub exceeds_threshold: bool,
}

/// Per-part row for tables
#[derive(Tabled)]
struct DeviationRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Deviation")]
    deviation: String,
    #[tabled(rename = "")]
    marker: String,
}

/// Compares `live` against `reference` with the configured metric.
pub fn build_report(
    live: &Pose,
    reference: &Pose,
    config: &ComparisonConfig,
) -> Result<CompareReport> {
    let comparator = ActiveComparator::from_config(config);
    let comparison = comparator
        .compare(live, reference)
        .context("Poses cannot be compared")?;
    let accuracy_percent =
        accuracy_percent(comparison.aggregate_deviation, config.max_expected_deviation());
    Ok(CompareReport {
        exceeds_threshold: comparison.aggregate_deviation > config.feedback_threshold(),
        tier: tier_for(accuracy_percent, &config.tiers),
        accuracy_percent,
        comparison,
    })
}

fn unit(metric: MetricKind) -> &'static str {
    match metric {
        MetricKind::Distance => "px",
        MetricKind::Angle => "deg",
    }
}

/// Execute the compare command
pub async fn execute(args: CompareArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.metric)?;
    let live = load_pose(&args.live).await?;
    let reference = load_pose(&args.reference).await?;

    let report = build_report(&live, &reference, &config)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => print_table(&report),
    }
    Ok(())
}

fn print_table(report: &CompareReport) {
    let comparison = &report.comparison;
    let unit = unit(comparison.metric);

    let rows: Vec<DeviationRow> = comparison
        .per_part
        .iter()
        .map(|p| DeviationRow {
            target: p.target.to_string(),
            deviation: format!("{:.1} {unit}", p.deviation),
            marker: if comparison.most_divergent == Some(p.target) {
                "<- most divergent".red().to_string()
            } else {
                String::new()
            },
        })
        .collect();

    println!(
        "{} {:?} metric, {} parts compared",
        "[COMPARE]".bright_cyan().bold(),
        comparison.metric,
        rows.len()
    );
    println!();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
    println!(
        "  {} {:.1} {unit}{}",
        "Deviation:".dimmed(),
        comparison.aggregate_deviation,
        if report.exceeds_threshold {
            " (above threshold)".red().to_string()
        } else {
            String::new()
        }
    );
    println!(
        "  {} {} {}",
        "Accuracy:".dimmed(),
        format_percent(report.accuracy_percent, report.tier),
        format_tier(report.tier)
    );
    if let Some(target) = comparison.most_divergent {
        println!("  {} {}", "Most divergent:".dimmed(), target.to_string().bold());
    }
}
