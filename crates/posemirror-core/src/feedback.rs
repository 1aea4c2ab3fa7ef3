//! Feedback state machine.
//!
//! [`FeedbackState`] owns every counter that lives across ticks: the
//! above-threshold streak, the activity monitor, the per-target mistake
//! tally and the one debounced message that may be in flight. It is mutated
//! only by [`Session`](crate::Session); nothing here reads a clock, the
//! caller passes `now` in.
//!
//! A debounced message is a [`PendingFeedback`] with a due time. It lands
//! when a tick or poll observes `now >= due`, unless something superseded it
//! first (falling below threshold, a missing pose, inactivity, restart).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::activity::{ActivityMonitor, ActivityState};
use crate::config::ComparisonConfig;
use crate::score::Tier;
use crate::types::Target;

/// Shown until the first pose pair has been evaluated.
pub const WAITING_MESSAGE: &str = "Waiting for pose detection...";

/// Shown while the user is inactive.
pub const INACTIVE_MESSAGE: &str = "Please follow the activity as shown in the video!";

/// Holistic message for an accuracy tier.
#[must_use]
pub fn holistic_message(tier: Tier) -> &'static str {
    match tier {
        Tier::Good => "Great job! Keep it up!",
        Tier::Warning => "You're on the right track. Adjust a bit more!",
        Tier::Poor => "Please adjust your pose to match the video!",
    }
}

/// Corrective message for `target`, escalated once `tally` exceeds `repeat_threshold`.
#[must_use]
pub fn corrective_message(target: Target, tally: u32, repeat_threshold: u32) -> String {
    if tally > repeat_threshold {
        format!("Remember to adjust your {target}!")
    } else {
        format!("Adjust your {target} to match the video.")
    }
}

/// What the rendering layer displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackOutput {
    /// Text shown to the user
    pub message: String,
    /// Accuracy in `[0, 100]`
    pub accuracy_percent: f32,
    /// Accuracy bucket
    pub tier: Tier,
}

impl FeedbackOutput {
    /// Output before any pose pair has been evaluated.
    #[must_use]
    pub fn waiting() -> Self {
        Self {
            message: WAITING_MESSAGE.to_string(),
            accuracy_percent: 0.0,
            tier: Tier::Poor,
        }
    }
}

impl Default for FeedbackOutput {
    fn default() -> Self {
        Self::waiting()
    }
}

/// Sub-mode of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum FeedbackMode {
    /// No valid pose pair this tick, or none yet
    Idle,
    /// Below threshold at Good tier
    Good,
    /// Below threshold at a lower tier, or above threshold before a correction lands
    Warning,
    /// A corrective message for `target` is displayed
    Correcting {
        /// Part or joint being corrected
        target: Target,
    },
    /// The user has stopped moving
    Inactive,
}

/// A debounced message waiting for its due time.
///
/// Percent and tier are captured when it is scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFeedback {
    /// Earliest instant at which it may land
    pub due: Instant,
    /// Most divergent target at scheduling time, if any
    pub target: Option<Target>,
    /// Accuracy at scheduling time
    pub accuracy_percent: f32,
    /// Tier at scheduling time
    pub tier: Tier,
    /// Monotonic id; a superseded generation never lands
    pub generation: u64,
}

/// Per-session feedback state.
#[derive(Debug, Clone)]
pub struct FeedbackState {
    consecutive_above_threshold: u32,
    activity: ActivityMonitor,
    mistake_tally: BTreeMap<Target, u32>,
    output: FeedbackOutput,
    pending: Option<PendingFeedback>,
    mode: FeedbackMode,
    next_generation: u64,
}

impl FeedbackState {
    /// Fresh, zero-valued state.
    #[must_use]
    pub fn new(config: &ComparisonConfig) -> Self {
        Self {
            consecutive_above_threshold: 0,
            activity: ActivityMonitor::new(&config.activity),
            mistake_tally: BTreeMap::new(),
            output: FeedbackOutput::waiting(),
            pending: None,
            mode: FeedbackMode::Idle,
            next_generation: 0,
        }
    }

    /// Ticks in a row above the feedback threshold.
    #[must_use]
    pub fn consecutive_above_threshold(&self) -> u32 {
        self.consecutive_above_threshold
    }

    /// Ticks in a row below the activity threshold.
    #[must_use]
    pub fn consecutive_inactive_frames(&self) -> u32 {
        self.activity.consecutive_inactive_frames()
    }

    /// How often each target has been the subject of a correction.
    #[must_use]
    pub fn mistake_tally(&self) -> &BTreeMap<Target, u32> {
        &self.mistake_tally
    }

    /// Tally for one target.
    #[must_use]
    pub fn tally_of(&self, target: Target) -> u32 {
        self.mistake_tally.get(&target).copied().unwrap_or(0)
    }

    /// Currently displayed output.
    #[must_use]
    pub fn output(&self) -> &FeedbackOutput {
        &self.output
    }

    /// Last message written to the display.
    #[must_use]
    pub fn last_displayed_message(&self) -> &str {
        &self.output.message
    }

    /// Current sub-mode.
    #[must_use]
    pub fn mode(&self) -> FeedbackMode {
        self.mode
    }

    /// The debounced message waiting to land, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingFeedback> {
        self.pending.as_ref()
    }

    /// Returns `true` while a debounced message is waiting.
    #[must_use]
    pub fn debounce_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// No usable pose pair this tick: go idle, keep the displayed output.
    pub(crate) fn on_missing_pose(&mut self) {
        self.supersede_pending("missing pose");
        self.mode = FeedbackMode::Idle;
    }

    /// Feeds the activity monitor; on inactivity, displays the inactivity
    /// message and returns `true`.
    pub(crate) fn on_activity(&mut self, signal: f32, accuracy_percent: f32, tier: Tier) -> bool {
        let was_inactive = self.mode == FeedbackMode::Inactive;
        match self.activity.observe(signal) {
            ActivityState::Inactive => {
                if !was_inactive {
                    info!(
                        inactive_frames = self.activity.consecutive_inactive_frames(),
                        "user inactive"
                    );
                }
                self.supersede_pending("inactivity");
                self.consecutive_above_threshold = 0;
                self.mode = FeedbackMode::Inactive;
                self.output = FeedbackOutput {
                    message: INACTIVE_MESSAGE.to_string(),
                    accuracy_percent,
                    tier,
                };
                true
            }
            ActivityState::Active => {
                if was_inactive {
                    info!("activity resumed");
                }
                false
            }
        }
    }

    /// Applies one evaluated tick.
    ///
    /// Above threshold the streak grows and, once it passes `frame_gate`
    /// with nothing in flight, a correction is scheduled for
    /// `now + debounce_delay`. Below threshold the streak resets, any
    /// pending correction is superseded and the holistic message for the
    /// tier is displayed. Tallies are never touched here.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn on_evaluation(
        &mut self,
        above_threshold: bool,
        target: Option<Target>,
        accuracy_percent: f32,
        tier: Tier,
        frame_gate: u32,
        debounce_delay: Duration,
        now: Instant,
    ) {
        if !above_threshold {
            self.consecutive_above_threshold = 0;
            self.supersede_pending("below threshold");
            self.show_holistic(accuracy_percent, tier);
            return;
        }

        self.consecutive_above_threshold = self.consecutive_above_threshold.saturating_add(1);

        self.output.accuracy_percent = accuracy_percent;
        self.output.tier = tier;
        match self.mode {
            FeedbackMode::Correcting { .. } => {}
            FeedbackMode::Idle | FeedbackMode::Inactive => {
                self.output.message = holistic_message(tier).to_string();
                self.mode = FeedbackMode::Warning;
            }
            FeedbackMode::Good | FeedbackMode::Warning => self.mode = FeedbackMode::Warning,
        }

        if self.consecutive_above_threshold > frame_gate && self.pending.is_none() {
            let generation = self.next_generation;
            self.next_generation += 1;
            let due = now + debounce_delay;
            debug!(generation, ?target, delay_ms = debounce_delay.as_millis() as u64, "debounce scheduled");
            self.pending = Some(PendingFeedback {
                due,
                target,
                accuracy_percent,
                tier,
                generation,
            });
        }
    }

    /// Lands the pending message if it is due at `now`.
    ///
    /// Returns the new output when something landed.
    pub(crate) fn resolve_due(&mut self, now: Instant, repeat_threshold: u32) -> Option<&FeedbackOutput> {
        if !self.pending.as_ref().is_some_and(|p| now >= p.due) {
            return None;
        }
        let pending = self.pending.take()?;

        match pending.target {
            Some(target) => {
                let tally = self.mistake_tally.entry(target).or_insert(0);
                *tally = tally.saturating_add(1);
                let tally = *tally;
                self.output = FeedbackOutput {
                    message: corrective_message(target, tally, repeat_threshold),
                    accuracy_percent: pending.accuracy_percent,
                    tier: pending.tier,
                };
                self.mode = FeedbackMode::Correcting { target };
                debug!(generation = pending.generation, %target, tally, "debounced correction landed");
            }
            None => {
                self.show_holistic(pending.accuracy_percent, pending.tier);
                debug!(generation = pending.generation, "debounced holistic message landed");
            }
        }
        Some(&self.output)
    }

    fn show_holistic(&mut self, accuracy_percent: f32, tier: Tier) {
        self.output = FeedbackOutput {
            message: holistic_message(tier).to_string(),
            accuracy_percent,
            tier,
        };
        self.mode = match tier {
            Tier::Good => FeedbackMode::Good,
            Tier::Warning | Tier::Poor => FeedbackMode::Warning,
        };
    }

    fn supersede_pending(&mut self, reason: &'static str) {
        if let Some(p) = self.pending.take() {
            debug!(generation = p.generation, reason, "debounce superseded");
        }
    }
}
