//! Session configuration.
//!
//! [`ComparisonConfig`] holds every threshold the comparison and feedback
//! pipeline consumes. Nothing is hidden from the caller: the defaults below
//! are starting points, and each field can be overridden in code, through
//! [`ComparisonConfig::builder`], or from a JSON file.
//!
//! # Example
//!
//! ```rust
//! use posemirror_core::config::{ComparisonConfig, MetricKind};
//!
//! let cfg = ComparisonConfig::builder()
//!     .metric(MetricKind::Angle)
//!     .frame_gate(10)
//!     .build();
//! cfg.validate().expect("config is valid");
//!
//! assert_eq!(cfg.feedback.frame_gate, 10);
//! assert_eq!(cfg.feedback_threshold(), 30.0);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::normalize::NormalizationMode;

// ---------------------------------------------------------------------------
// Metric selection
// ---------------------------------------------------------------------------

/// Which comparator drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Summed keypoint distance after scale normalization
    #[default]
    Distance,
    /// Largest joint-angle difference
    Angle,
}

/// Settings for the normalized keypoint-distance metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceMetricConfig {
    /// Keypoints below this confidence in either pose are skipped. Default: **0.5**.
    pub min_confidence: f32,
    /// Leave nose, eyes and ears out of the summed deviation. Default: **true**.
    pub exclude_face: bool,
    /// How the live pose is mapped onto the reference. Default: **scale only**.
    pub normalization: NormalizationMode,
    /// Summed deviation above which a tick counts as off. Default: **1000**.
    pub feedback_threshold: f32,
    /// Summed deviation that maps to 0 % accuracy. Default: **3500**.
    pub max_expected_deviation: f32,
}

impl Default for DistanceMetricConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            exclude_face: true,
            normalization: NormalizationMode::ScaleOnly,
            feedback_threshold: 1000.0,
            max_expected_deviation: 3500.0,
        }
    }
}

/// Settings for the joint-angle metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleMetricConfig {
    /// A joint is unavailable if any of its three keypoints is below this. Default: **0.6**.
    pub min_confidence: f32,
    /// Largest joint difference (degrees) above which a tick counts as off. Default: **30**.
    pub feedback_threshold: f32,
    /// Joint difference (degrees) that maps to 0 % accuracy. Default: **90**.
    pub max_expected_deviation: f32,
}

impl Default for AngleMetricConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            feedback_threshold: 30.0,
            max_expected_deviation: 90.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// What the activity monitor measures each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    /// Sum of per-part deviations between live and reference
    #[default]
    ReferenceDeviation,
    /// Sum of live keypoint displacement since the previous live pose
    LiveMotion,
}

/// Inactivity detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Signal source. Default: **reference deviation**.
    pub source: ActivitySource,
    /// Ticks whose signal is below this count as inactive. Default: **10**.
    pub activity_threshold: f32,
    /// Consecutive inactive ticks before the inactivity message. Default: **60**.
    pub inactivity_limit: u32,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            source: ActivitySource::ReferenceDeviation,
            activity_threshold: 10.0,
            inactivity_limit: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

/// Debounce and escalation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Ticks above threshold that must pass before a correction is composed. Default: **15**.
    pub frame_gate: u32,
    /// Delay between scheduling and showing a correction. Default: **1000 ms**.
    pub debounce_delay_ms: u64,
    /// Corrections of one target after which phrasing escalates. Default: **3**.
    pub mistake_repeat_threshold: u32,
    /// Evaluate every N-th tick; others retain the last output. Default: **1**.
    pub evaluation_interval: u32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            frame_gate: 15,
            debounce_delay_ms: 1000,
            mistake_repeat_threshold: 3,
            evaluation_interval: 1,
        }
    }
}

impl FeedbackConfig {
    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }
}

/// Accuracy boundaries for the Good / Warning / Poor tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierBoundaries {
    /// Accuracy strictly above this is Good. Default: **80**.
    pub good: f32,
    /// Accuracy strictly above this (and not Good) is Warning. Default: **60**.
    pub warning: f32,
}

impl Default for TierBoundaries {
    fn default() -> Self {
        Self {
            good: 80.0,
            warning: 60.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ComparisonConfig
// ---------------------------------------------------------------------------

/// Complete configuration for a comparison session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Active comparator
    pub metric: MetricKind,
    /// Distance metric settings
    pub distance: DistanceMetricConfig,
    /// Angle metric settings
    pub angle: AngleMetricConfig,
    /// Inactivity detection
    pub activity: ActivityConfig,
    /// Debounce and escalation
    pub feedback: FeedbackConfig,
    /// Accuracy tiers
    pub tiers: TierBoundaries,
}

impl ComparisonConfig {
    /// Create a new configuration builder
    pub fn builder() -> ComparisonConfigBuilder {
        ComparisonConfigBuilder::default()
    }

    /// Feedback threshold of the active metric.
    #[must_use]
    pub fn feedback_threshold(&self) -> f32 {
        match self.metric {
            MetricKind::Distance => self.distance.feedback_threshold,
            MetricKind::Angle => self.angle.feedback_threshold,
        }
    }

    /// Maximum expected deviation of the active metric.
    #[must_use]
    pub fn max_expected_deviation(&self) -> f32 {
        match self.metric {
            MetricKind::Distance => self.distance.max_expected_deviation,
            MetricKind::Angle => self.angle.max_expected_deviation,
        }
    }

    /// Load a [`ComparisonConfig`] from a JSON file at `path`.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be opened,
    /// [`ConfigError::ParseError`] if the JSON is malformed, and
    /// [`ConfigError::InvalidValue`] if validation fails.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: ComparisonConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize this configuration to pretty-printed JSON at `path`,
    /// creating parent directories if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the directory or file cannot be written.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Validate all fields and return the first problem found.
    ///
    /// # Validated invariants
    ///
    /// - Confidence thresholds lie in `[0, 1]`.
    /// - Feedback thresholds are non-negative; max expected deviations are positive.
    /// - `inactivity_limit`, `frame_gate` and `evaluation_interval` are at least 1.
    /// - `activity_threshold` is non-negative.
    /// - Tier boundaries satisfy `0 <= warning <= good <= 100`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.distance.min_confidence) {
            return Err(ConfigError::invalid_value(
                "distance.min_confidence",
                "must be in [0.0, 1.0]",
            ));
        }
        if !(0.0..=1.0).contains(&self.angle.min_confidence) {
            return Err(ConfigError::invalid_value(
                "angle.min_confidence",
                "must be in [0.0, 1.0]",
            ));
        }

        if !(self.distance.feedback_threshold >= 0.0) {
            return Err(ConfigError::invalid_value(
                "distance.feedback_threshold",
                "must be >= 0.0",
            ));
        }
        if !(self.angle.feedback_threshold >= 0.0) {
            return Err(ConfigError::invalid_value(
                "angle.feedback_threshold",
                "must be >= 0.0",
            ));
        }
        if !(self.distance.max_expected_deviation > 0.0) {
            return Err(ConfigError::invalid_value(
                "distance.max_expected_deviation",
                "must be > 0.0",
            ));
        }
        if !(self.angle.max_expected_deviation > 0.0) {
            return Err(ConfigError::invalid_value(
                "angle.max_expected_deviation",
                "must be > 0.0",
            ));
        }

        if !(self.activity.activity_threshold >= 0.0) {
            return Err(ConfigError::invalid_value(
                "activity.activity_threshold",
                "must be >= 0.0",
            ));
        }
        if self.activity.inactivity_limit == 0 {
            return Err(ConfigError::invalid_value(
                "activity.inactivity_limit",
                "must be > 0",
            ));
        }

        if self.feedback.frame_gate == 0 {
            return Err(ConfigError::invalid_value("feedback.frame_gate", "must be > 0"));
        }
        if self.feedback.evaluation_interval == 0 {
            return Err(ConfigError::invalid_value(
                "feedback.evaluation_interval",
                "must be > 0",
            ));
        }

        let TierBoundaries { good, warning } = self.tiers;
        if !(0.0..=100.0).contains(&good) || !(0.0..=100.0).contains(&warning) {
            return Err(ConfigError::invalid_value(
                "tiers",
                "boundaries must be in [0, 100]",
            ));
        }
        if warning > good {
            return Err(ConfigError::invalid_value(
                "tiers.warning",
                "must be <= tiers.good",
            ));
        }

        Ok(())
    }
}

/// Builder for [`ComparisonConfig`]
#[derive(Debug, Default)]
pub struct ComparisonConfigBuilder {
    config: ComparisonConfig,
}

impl ComparisonConfigBuilder {
    /// Set the active metric
    pub fn metric(mut self, metric: MetricKind) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the distance metric settings
    pub fn distance(mut self, distance: DistanceMetricConfig) -> Self {
        self.config.distance = distance;
        self
    }

    /// Set the angle metric settings
    pub fn angle(mut self, angle: AngleMetricConfig) -> Self {
        self.config.angle = angle;
        self
    }

    /// Set the feedback threshold of the currently selected metric
    pub fn feedback_threshold(mut self, threshold: f32) -> Self {
        let threshold = threshold.max(0.0);
        match self.config.metric {
            MetricKind::Distance => self.config.distance.feedback_threshold = threshold,
            MetricKind::Angle => self.config.angle.feedback_threshold = threshold,
        }
        self
    }

    /// Set the activity signal source
    pub fn activity_source(mut self, source: ActivitySource) -> Self {
        self.config.activity.source = source;
        self
    }

    /// Set the activity threshold
    pub fn activity_threshold(mut self, threshold: f32) -> Self {
        self.config.activity.activity_threshold = threshold.max(0.0);
        self
    }

    /// Set the inactivity limit in ticks
    pub fn inactivity_limit(mut self, ticks: u32) -> Self {
        self.config.activity.inactivity_limit = ticks.max(1);
        self
    }

    /// Set the frame gate in ticks
    pub fn frame_gate(mut self, ticks: u32) -> Self {
        self.config.feedback.frame_gate = ticks.max(1);
        self
    }

    /// Set the debounce delay
    pub fn debounce_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.feedback.debounce_delay_ms = delay_ms;
        self
    }

    /// Set the escalation threshold
    pub fn mistake_repeat_threshold(mut self, repeats: u32) -> Self {
        self.config.feedback.mistake_repeat_threshold = repeats;
        self
    }

    /// Set the evaluation interval in ticks
    pub fn evaluation_interval(mut self, ticks: u32) -> Self {
        self.config.feedback.evaluation_interval = ticks.max(1);
        self
    }

    /// Set the tier boundaries
    pub fn tiers(mut self, good: f32, warning: f32) -> Self {
        self.config.tiers = TierBoundaries { good, warning };
        self
    }

    /// Build the configuration
    pub fn build(self) -> ComparisonConfig {
        self.config
    }
}
