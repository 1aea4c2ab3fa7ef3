//! Terminal formatting helpers.

use colored::Colorize;
use posemirror_core::{FeedbackMode, FeedbackOutput, Tier};

/// Tier label colored like the progress bar of the original UI.
pub fn format_tier(tier: Tier) -> String {
    match tier {
        Tier::Good => "GOOD".green().bold().to_string(),
        Tier::Warning => "WARNING".yellow().bold().to_string(),
        Tier::Poor => "POOR".red().bold().to_string(),
    }
}

/// Accuracy as a percentage colored by tier.
pub fn format_percent(percent: f32, tier: Tier) -> String {
    let text = format!("{percent:5.1}%");
    match tier {
        Tier::Good => text.green().to_string(),
        Tier::Warning => text.yellow().to_string(),
        Tier::Poor => text.red().to_string(),
    }
}

/// Short label for a state machine mode.
pub fn format_mode(mode: FeedbackMode) -> String {
    match mode {
        FeedbackMode::Idle => "idle".dimmed().to_string(),
        FeedbackMode::Good => "good".green().to_string(),
        FeedbackMode::Warning => "warning".yellow().to_string(),
        FeedbackMode::Correcting { target } => format!("correcting {target}").red().to_string(),
        FeedbackMode::Inactive => "inactive".bright_magenta().to_string(),
    }
}

/// Ten-cell bar for an accuracy percentage.
pub fn accuracy_bar(percent: f32) -> String {
    let filled = (percent.clamp(0.0, 100.0) / 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(10 - filled))
}

/// One feedback line for the replay log.
pub fn format_feedback_line(
    elapsed_secs: f64,
    output: &FeedbackOutput,
    mode: FeedbackMode,
) -> String {
    format!(
        "{} {} {} {:<8} {}  {}",
        format!("[{elapsed_secs:7.2}s]").dimmed(),
        accuracy_bar(output.accuracy_percent),
        format_percent(output.accuracy_percent, output.tier),
        format_tier(output.tier),
        output.message.bold(),
        format!("({})", format_mode(mode)).dimmed(),
    )
}
