//! Per-session tick driver.
//!
//! A [`Session`] is the explicit context object that replaces process-wide
//! pose buffers and counters. The caller drives it from a periodic trigger:
//!
//! ```rust
//! use std::time::Instant;
//! use posemirror_core::{ComparisonConfig, Session};
//!
//! let mut session = Session::new(ComparisonConfig::default()).unwrap();
//! let report = session.tick(None, None, Instant::now()).unwrap();
//! assert_eq!(report.output.message, "Waiting for pose detection...");
//! ```
//!
//! Each tick consumes whatever `(live, reference)` pair is latest; it never
//! waits for a fresher one. [`Session::poll`] lands a due debounced message
//! between ticks.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::activity::live_motion;
use crate::config::{ActivitySource, ComparisonConfig, MetricKind};
use crate::error::{CoreError, CoreResult, GeometryError};
use crate::feedback::{FeedbackMode, FeedbackOutput, FeedbackState};
use crate::metrics::{ActiveComparator, Comparator, ComparisonResult};
use crate::score::{accuracy_percent, tier_for};
use crate::types::Pose;

/// What one tick produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Output to display after this tick
    pub output: FeedbackOutput,
    /// State machine sub-mode after this tick
    pub mode: FeedbackMode,
    /// Comparison computed this tick, if one was
    pub comparison: Option<ComparisonResult>,
    /// Whether a debounced message landed during this tick
    pub debounce_landed: bool,
}

/// One comparison session.
#[derive(Debug)]
pub struct Session {
    config: ComparisonConfig,
    comparator: ActiveComparator,
    state: FeedbackState,
    previous_live: Option<Pose>,
    valid_ticks: u64,
}

impl Session {
    /// Starts a session.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`](crate::CoreError::Config) if `config` fails validation.
    pub fn new(config: ComparisonConfig) -> CoreResult<Self> {
        config.validate()?;
        let comparator = ActiveComparator::from_config(&config);
        let state = FeedbackState::new(&config);
        Ok(Self {
            config,
            comparator,
            state,
            previous_live: None,
            valid_ticks: 0,
        })
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Feedback state, for diagnostics.
    #[must_use]
    pub fn state(&self) -> &FeedbackState {
        &self.state
    }

    /// Currently displayed output.
    #[must_use]
    pub fn output(&self) -> &FeedbackOutput {
        self.state.output()
    }

    /// Current sub-mode.
    #[must_use]
    pub fn mode(&self) -> FeedbackMode {
        self.state.mode()
    }

    /// Replaces all feedback state with a fresh instance.
    ///
    /// Tallies, streaks and any in-flight debounce are discarded.
    pub fn restart(&mut self) {
        info!(
            tallied_targets = self.state.mistake_tally().len(),
            "session restarted"
        );
        self.state = FeedbackState::new(&self.config);
        self.previous_live = None;
        self.valid_ticks = 0;
    }

    /// Lands a due debounced message without a new pose pair.
    ///
    /// Returns the new output when one landed.
    pub fn poll(&mut self, now: Instant) -> Option<FeedbackOutput> {
        self.state
            .resolve_due(now, self.config.feedback.mistake_repeat_threshold)
            .cloned()
    }

    /// Runs one tick over the latest available pose pair.
    ///
    /// A missing pose is not an error: the session goes idle and keeps the
    /// displayed output. A pose with no confident keypoints counts as
    /// missing. Degenerate geometry skips the tick.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Alignment`](crate::CoreError::Alignment) or
    /// [`CoreError::MisalignedPart`](crate::CoreError::MisalignedPart) when
    /// the two poses cannot be compared index by index.
    pub fn tick(
        &mut self,
        live: Option<&Pose>,
        reference: Option<&Pose>,
        now: Instant,
    ) -> CoreResult<TickReport> {
        let (Some(live), Some(reference)) = (live, reference) else {
            trace!("no pose pair this tick");
            self.state.on_missing_pose();
            return Ok(self.report(None, false));
        };

        live.check_aligned(reference)?;

        self.valid_ticks += 1;
        let interval = u64::from(self.config.feedback.evaluation_interval);
        if (self.valid_ticks - 1) % interval != 0 {
            let landed = self.poll(now).is_some();
            return Ok(self.report(None, landed));
        }

        let comparison = match self.comparator.compare(live, reference) {
            Ok(c) => c,
            // Nothing detected with enough confidence: same as no pose.
            Err(CoreError::Geometry(GeometryError::NoComparableKeypoints)) => {
                trace!("no confident keypoints this tick");
                self.state.on_missing_pose();
                return Ok(self.report(None, false));
            }
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "tick skipped");
                let landed = self.poll(now).is_some();
                return Ok(self.report(None, landed));
            }
            Err(e) => return Err(e),
        };

        let deviation = comparison.aggregate_deviation;
        let percent = accuracy_percent(deviation, self.config.max_expected_deviation());
        let tier = tier_for(percent, &self.config.tiers);
        trace!(
            metric = ?comparison.metric,
            deviation,
            percent,
            ?tier,
            most_divergent = ?comparison.most_divergent,
            "tick evaluated"
        );

        let signal = self.activity_signal(live, &comparison);
        self.previous_live = Some(live.clone());
        if self.state.on_activity(signal, percent, tier) {
            return Ok(self.report(Some(comparison), false));
        }

        self.state.on_evaluation(
            deviation > self.config.feedback_threshold(),
            comparison.most_divergent,
            percent,
            tier,
            self.config.feedback.frame_gate,
            self.config.feedback.debounce_delay(),
            now,
        );

        let landed = self.poll(now).is_some();
        Ok(self.report(Some(comparison), landed))
    }

    fn activity_signal(&self, live: &Pose, comparison: &ComparisonResult) -> f32 {
        match self.config.activity.source {
            ActivitySource::ReferenceDeviation => comparison.total_deviation(),
            ActivitySource::LiveMotion => {
                let min_confidence = match self.comparator.kind() {
                    MetricKind::Distance => self.config.distance.min_confidence,
                    MetricKind::Angle => self.config.angle.min_confidence,
                };
                // The first observed pose has nothing to move against.
                self.previous_live
                    .as_ref()
                    .map_or(f32::INFINITY, |prev| live_motion(prev, live, min_confidence))
            }
        }
    }

    fn report(&self, comparison: Option<ComparisonResult>, debounce_landed: bool) -> TickReport {
        TickReport {
            output: self.state.output().clone(),
            mode: self.state.mode(),
            comparison,
            debounce_landed,
        }
    }
}
