//! Similarity metrics between a live and a reference pose.
//!
//! Two interchangeable comparators implement [`Comparator`]:
//!
//! - [`DistanceMetric`]: summed keypoint distance after scale normalization.
//!   Holistic; the aggregate is a sum.
//! - [`AngleMetric`]: absolute difference of six joint angles. Per-joint;
//!   the aggregate is the largest difference.
//!
//! [`ActiveComparator`] picks one from a [`ComparisonConfig`].

mod angle;
mod distance;

pub use angle::{joint_angles, AngleMetric};
pub use distance::DistanceMetric;

use serde::{Deserialize, Serialize};

use crate::config::{ComparisonConfig, MetricKind};
use crate::error::CoreResult;
use crate::types::{Pose, Target};

/// Deviation attributed to one keypoint or joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartDeviation {
    /// Keypoint or joint
    pub target: Target,
    /// Distance in pixels or difference in degrees
    pub deviation: f32,
}

/// Output of one comparison, produced fresh each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Which metric produced this result
    pub metric: MetricKind,
    /// Signal compared against the feedback threshold; always `>= 0`
    pub aggregate_deviation: f32,
    /// Per-keypoint or per-joint breakdown, in skeleton order
    pub per_part: Vec<PartDeviation>,
    /// Target of the largest deviation, if any part stands out
    pub most_divergent: Option<Target>,
}

impl ComparisonResult {
    /// Sum of the per-part breakdown.
    #[must_use]
    pub fn total_deviation(&self) -> f32 {
        self.per_part.iter().map(|p| p.deviation).sum()
    }

    /// Deviation recorded for `target`, if it was compared.
    #[must_use]
    pub fn deviation_of(&self, target: Target) -> Option<f32> {
        self.per_part
            .iter()
            .find(|p| p.target == target)
            .map(|p| p.deviation)
    }
}

/// A pure function from a `(live, reference)` pose pair to a deviation.
pub trait Comparator {
    /// Which metric this is.
    fn kind(&self) -> MetricKind;

    /// Compares `live` against `reference`.
    ///
    /// # Errors
    ///
    /// Alignment errors are returned as-is. Degenerate geometry surfaces as
    /// a recoverable [`GeometryError`](crate::GeometryError).
    fn compare(&self, live: &Pose, reference: &Pose) -> CoreResult<ComparisonResult>;
}

/// The comparator selected by configuration.
#[derive(Debug, Clone)]
pub enum ActiveComparator {
    /// Normalized keypoint distance
    Distance(DistanceMetric),
    /// Joint angle difference
    Angle(AngleMetric),
}

impl ActiveComparator {
    /// Builds the comparator named by `config.metric`.
    #[must_use]
    pub fn from_config(config: &ComparisonConfig) -> Self {
        match config.metric {
            MetricKind::Distance => Self::Distance(DistanceMetric::new(config.distance.clone())),
            MetricKind::Angle => Self::Angle(AngleMetric::new(config.angle.clone())),
        }
    }
}

impl Comparator for ActiveComparator {
    fn kind(&self) -> MetricKind {
        match self {
            Self::Distance(m) => m.kind(),
            Self::Angle(m) => m.kind(),
        }
    }

    fn compare(&self, live: &Pose, reference: &Pose) -> CoreResult<ComparisonResult> {
        match self {
            Self::Distance(m) => m.compare(live, reference),
            Self::Angle(m) => m.compare(live, reference),
        }
    }
}
