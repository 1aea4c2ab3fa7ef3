//! Replay two recordings through a comparison session.
//!
//! The live and reference recordings are published by independent feed
//! tasks. A fixed-interval ticker reads the latest pair and runs one session
//! tick; a pending debounced message is landed by its own timer between
//! ticks. Everything that touches the session runs on this one task.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use posemirror_core::{FeedbackOutput, Session, Target, TickReport};
use tabled::{settings::Style, Table, Tabled};
use tokio::time::{Instant as TokioInstant, MissedTickBehavior};
use tracing::{debug, info};

use crate::display::{format_feedback_line, format_percent, format_tier};
use crate::feed::{frame_interval, spawn_feed, PoseFeed};
use crate::recording::{load_recording, Frame};
use crate::settings::{load_config, MetricArg};

/// Arguments for the replay command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Live pose recording (JSON lines, `null` for failed detections)
    #[arg(short, long)]
    pub live: PathBuf,

    /// Reference pose recording (JSON lines)
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the active metric
    #[arg(short, long, value_enum)]
    pub metric: Option<MetricArg>,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "100")]
    pub tick_ms: u64,

    /// Frame rate both recordings were captured at
    #[arg(long, default_value = "30", value_parser = parse_positive_rate)]
    pub fps: f64,

    /// Playback rate of the reference recording
    #[arg(long, default_value = "0.5", value_parser = parse_positive_rate)]
    pub reference_rate: f64,

    /// Restart the reference recording when it ends
    #[arg(long)]
    pub loop_reference: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ReplayFormat,
}

/// Parses a frame rate or playback rate: finite and greater than zero.
fn parse_positive_rate(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("`{s}` is not a number: {e}"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("`{s}` must be a finite number greater than 0"))
    }
}

/// Replay output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayFormat {
    /// One colored line whenever the displayed feedback changes
    Text,
    /// Every tick report as a JSON line
    Json,
}

/// Pacing of a replay.
#[derive(Debug, Clone)]
pub struct ReplayTiming {
    /// Session tick period
    pub tick: Duration,
    /// Period between live frames
    pub live_frame: Duration,
    /// Period between reference frames
    pub reference_frame: Duration,
    /// Restart the reference when it ends
    pub loop_reference: bool,
}

impl ReplayTiming {
    fn from_args(args: &ReplayArgs) -> Self {
        Self {
            tick: Duration::from_millis(args.tick_ms.max(1)),
            live_frame: frame_interval(args.fps, 1.0),
            reference_frame: frame_interval(args.fps, args.reference_rate),
            loop_reference: args.loop_reference,
        }
    }
}

/// Totals for a finished replay.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    /// Ticks run
    pub ticks: u64,
    /// Ticks that produced a comparison
    pub evaluated: u64,
    /// Times the displayed output changed
    pub changes: u64,
    /// Debounced messages that landed
    pub debounced: u64,
    /// Output displayed when the replay ended
    pub final_output: FeedbackOutput,
    /// Corrections per target, most frequent first
    pub tally: Vec<(Target, u32)>,
}

/// A report handed to the output sink.
pub struct ReplayEvent<'a> {
    /// Seconds since the replay started
    pub elapsed_secs: f64,
    /// What the tick or debounce timer produced
    pub report: &'a TickReport,
    /// Whether the displayed output differs from before
    pub changed: bool,
}

/// Runs `session` over two recordings until the live recording ends.
pub async fn run_replay<F>(
    session: &mut Session,
    live: Vec<Frame>,
    reference: Vec<Frame>,
    timing: &ReplayTiming,
    mut sink: F,
) -> Result<ReplaySummary>
where
    F: FnMut(ReplayEvent<'_>),
{
    let start = TokioInstant::now();
    let PoseFeed {
        latest: live_rx,
        task: mut live_task,
    } = spawn_feed("live", live, timing.live_frame, false);
    let PoseFeed {
        latest: reference_rx,
        task: reference_task,
    } = spawn_feed("reference", reference, timing.reference_frame, timing.loop_reference);

    let mut ticker = tokio::time::interval(timing.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = 0_u64;
    let mut evaluated = 0_u64;
    let mut changes = 0_u64;
    let mut debounced = 0_u64;
    let mut shown = session.output().clone();

    loop {
        let due = session.state().pending().map(|p| p.due);

        let report = tokio::select! {
            _ = ticker.tick() => {
                let live = live_rx.borrow().clone();
                let reference = reference_rx.borrow().clone();
                let now = TokioInstant::now().into_std();
                ticks += 1;
                let report = session
                    .tick(live.as_deref(), reference.as_deref(), now)
                    .context("Session tick failed")?;
                if report.comparison.is_some() {
                    evaluated += 1;
                }
                report
            }
            () = debounce_timer(due) => {
                match session.poll(TokioInstant::now().into_std()) {
                    Some(output) => TickReport {
                        output,
                        mode: session.mode(),
                        comparison: None,
                        debounce_landed: true,
                    },
                    None => continue,
                }
            }
            res = &mut live_task => {
                res.context("Live feed task failed")?;
                debug!(ticks, "live recording finished");
                break;
            }
        };

        if report.debounce_landed {
            debounced += 1;
        }
        let changed = report.output != shown;
        if changed {
            changes += 1;
            shown = report.output.clone();
        }
        sink(ReplayEvent {
            elapsed_secs: start.elapsed().as_secs_f64(),
            report: &report,
            changed,
        });
    }

    reference_task.abort();

    let mut tally: Vec<(Target, u32)> = session
        .state()
        .mistake_tally()
        .iter()
        .map(|(target, count)| (*target, *count))
        .collect();
    tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    Ok(ReplaySummary {
        ticks,
        evaluated,
        changes,
        debounced,
        final_output: session.output().clone(),
        tally,
    })
}

/// Fires when the pending debounced message is due; never without one.
async fn debounce_timer(due: Option<std::time::Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(TokioInstant::from_std(due)).await,
        None => std::future::pending().await,
    }
}

/// Correction tally display row for tables
#[derive(Tabled)]
struct TallyRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Corrections")]
    corrections: u32,
}

/// Execute the replay command
pub async fn execute(args: ReplayArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.metric)?;
    let live = load_recording(&args.live).await?;
    let reference = load_recording(&args.reference).await?;
    let timing = ReplayTiming::from_args(&args);

    if args.format == ReplayFormat::Text {
        println!("{} Replaying recordings...", "[REPLAY]".bright_cyan().bold());
        println!();
        println!("{}", "Configuration:".bold());
        println!("  {} {:?}", "Metric:".dimmed(), config.metric);
        println!("  {} {} frames", "Live:".dimmed(), live.len());
        println!(
            "  {} {} frames at {:.2}x",
            "Reference:".dimmed(),
            reference.len(),
            args.reference_rate
        );
        println!("  {} {}ms", "Tick:".dimmed(), args.tick_ms);
        println!(
            "  {} {} ticks, {}ms debounce",
            "Frame gate:".dimmed(),
            config.feedback.frame_gate,
            config.feedback.debounce_delay_ms
        );
        println!();
    }

    let mut session = Session::new(config).context("Invalid session configuration")?;
    info!(live = live.len(), reference = reference.len(), "replay started");

    let format = args.format;
    let summary = run_replay(&mut session, live, reference, &timing, |event| match format {
        ReplayFormat::Text => {
            if event.changed {
                let report = event.report;
                println!(
                    "{}",
                    format_feedback_line(event.elapsed_secs, &report.output, report.mode)
                );
            }
        }
        ReplayFormat::Json => match serde_json::to_string(event.report) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize tick report"),
        },
    })
    .await?;

    info!(ticks = summary.ticks, evaluated = summary.evaluated, "replay finished");

    if format == ReplayFormat::Text {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &ReplaySummary) {
    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} {} ({} evaluated)",
        "Ticks:".dimmed(),
        summary.ticks,
        summary.evaluated
    );
    println!(
        "  {} {} ({} debounced)",
        "Feedback changes:".dimmed(),
        summary.changes,
        summary.debounced
    );
    println!(
        "  {} {} {}",
        "Final accuracy:".dimmed(),
        format_percent(summary.final_output.accuracy_percent, summary.final_output.tier),
        format_tier(summary.final_output.tier)
    );

    if summary.tally.is_empty() {
        println!("  {} none", "Corrections:".dimmed());
        return;
    }

    let rows: Vec<TallyRow> = summary
        .tally
        .iter()
        .map(|(target, corrections)| TallyRow {
            target: target.to_string(),
            corrections: *corrections,
        })
        .collect();
    println!();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use posemirror_core::{
        BodyPart, ComparisonConfig, Joint, MetricKind, Point2D, Pose, NUM_KEYPOINTS,
    };

    fn upright(knee_angle: f32) -> Pose {
        use BodyPart as P;
        let mut pts = [Point2D::ZERO; NUM_KEYPOINTS];
        for (part, x, y) in [
            (P::Nose, 100.0, 20.0),
            (P::LeftEye, 105.0, 15.0),
            (P::RightEye, 95.0, 15.0),
            (P::LeftEar, 110.0, 18.0),
            (P::RightEar, 90.0, 18.0),
            (P::LeftShoulder, 130.0, 60.0),
            (P::RightShoulder, 70.0, 60.0),
            (P::LeftElbow, 130.0, 110.0),
            (P::RightElbow, 70.0, 110.0),
            (P::LeftWrist, 130.0, 160.0),
            (P::RightWrist, 70.0, 160.0),
            (P::LeftHip, 120.0, 160.0),
            (P::RightHip, 80.0, 160.0),
            (P::LeftKnee, 120.0, 220.0),
            (P::RightKnee, 80.0, 220.0),
        ] {
            pts[part.index()] = Point2D::new(x, y);
        }
        let theta = knee_angle.to_radians();
        pts[P::LeftAnkle.index()] =
            Point2D::new(120.0 + 60.0 * theta.sin(), 220.0 - 60.0 * theta.cos());
        pts[P::RightAnkle.index()] = Point2D::new(80.0, 280.0);
        Pose::from_positions(&pts, 0.9)
    }

    fn timing() -> ReplayTiming {
        ReplayTiming {
            tick: Duration::from_millis(100),
            live_frame: Duration::from_millis(100),
            reference_frame: Duration::from_millis(200),
            loop_reference: true,
        }
    }

    fn angle_config() -> ComparisonConfig {
        ComparisonConfig::builder()
            .metric(MetricKind::Angle)
            .frame_gate(2)
            .debounce_delay_ms(300)
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_lands_debounced_correction() {
        let mut session = Session::new(angle_config()).unwrap();
        let live = vec![Some(upright(90.0)); 30];
        let reference = vec![Some(upright(180.0)); 10];

        let mut landed = Vec::new();
        let summary = run_replay(&mut session, live, reference, &timing(), |event| {
            if event.report.debounce_landed {
                landed.push(event.report.output.message.clone());
            }
        })
        .await
        .unwrap();

        assert!(summary.ticks >= 25);
        assert!(summary.evaluated > 0);
        assert!(!landed.is_empty());
        assert_eq!(landed[0], "Adjust your left knee to match the video.");
        assert!(summary.final_output.message.contains("left knee"));
        assert_eq!(summary.tally[0].0, Target::Joint(Joint::LeftKnee));
        assert_eq!(summary.debounced as usize, landed.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_survives_failed_detections() {
        let mut session = Session::new(angle_config()).unwrap();
        let live: Vec<Frame> = (0..20)
            .map(|i| if i % 2 == 0 { None } else { Some(upright(180.0)) })
            .collect();
        let reference = vec![Some(upright(180.0))];

        let summary = run_replay(&mut session, live, reference, &timing(), |_| {})
            .await
            .unwrap();

        assert!(summary.tally.is_empty());
        assert_eq!(summary.debounced, 0);
        assert!(summary.ticks > summary.evaluated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_surfaces_misaligned_recordings() {
        let mut session = Session::new(angle_config()).unwrap();
        let mut short = upright(180.0);
        short.keypoints.truncate(5);
        let live = vec![Some(short); 5];
        let reference = vec![Some(upright(180.0))];

        let result = run_replay(&mut session, live, reference, &timing(), |_| {}).await;
        assert!(result.is_err());
    }
}
