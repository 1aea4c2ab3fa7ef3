//! # posemirror core
//!
//! Pose comparison and coaching feedback for a performer following an
//! on-screen instructor.
//!
//! Each tick the caller supplies the latest live pose and the latest
//! reference pose (either may be missing). The core compares them with the
//! configured metric, tracks inactivity and repeated mistakes, debounces
//! corrective messages, and emits a [`FeedbackOutput`] for display.
//!
//! - **Data Types**: [`Pose`], [`Keypoint`], [`BodyPart`], [`Joint`],
//!   [`JointAngleSet`] in the [`types`] module.
//! - **Geometry**: distance and vertex angle in [`geometry`], scale
//!   normalization in [`normalize`].
//! - **Metrics**: the [`Comparator`] trait with [`DistanceMetric`] and
//!   [`AngleMetric`], selected through [`ActiveComparator`].
//! - **Temporal State**: [`ActivityMonitor`], [`FeedbackState`] and the
//!   [`Session`] tick driver.
//! - **Errors**: [`CoreError`] and friends in the [`error`] module.
//!
//! The core performs no I/O apart from loading a [`ComparisonConfig`] and
//! never reads a clock: every time-dependent call takes `now`.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Instant;
//! use posemirror_core::{ComparisonConfig, Pose, Point2D, Session, Tier, NUM_KEYPOINTS};
//!
//! let positions: [Point2D; NUM_KEYPOINTS] =
//!     std::array::from_fn(|i| Point2D::new((i % 4) as f32 * 30.0, (i / 4) as f32 * 30.0));
//! let pose = Pose::from_positions(&positions, 0.9);
//!
//! let mut session = Session::new(ComparisonConfig::default()).unwrap();
//! let report = session.tick(Some(&pose), Some(&pose), Instant::now()).unwrap();
//!
//! assert_eq!(report.output.accuracy_percent, 100.0);
//! assert_eq!(report.output.tier, Tier::Good);
//! ```

#![forbid(unsafe_code)]

pub mod activity;
pub mod config;
pub mod error;
pub mod feedback;
pub mod geometry;
pub mod metrics;
pub mod normalize;
pub mod score;
pub mod session;
pub mod types;

pub use activity::{ActivityMonitor, ActivityState};
pub use config::{
    ActivityConfig, ActivitySource, AngleMetricConfig, ComparisonConfig, ComparisonConfigBuilder,
    DistanceMetricConfig, FeedbackConfig, MetricKind, TierBoundaries,
};
pub use error::{ConfigError, CoreError, CoreResult, GeometryError};
pub use feedback::{FeedbackMode, FeedbackOutput, FeedbackState, PendingFeedback};
pub use metrics::{
    ActiveComparator, AngleMetric, Comparator, ComparisonResult, DistanceMetric, PartDeviation,
};
pub use normalize::NormalizationMode;
pub use score::Tier;
pub use session::{Session, TickReport};
pub use types::{BodyPart, Joint, JointAngleSet, Keypoint, Point2D, Pose, Target};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keypoints in a full skeleton (COCO / PoseNet layout)
pub const NUM_KEYPOINTS: usize = 17;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ComparisonConfig, MetricKind};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::feedback::{FeedbackMode, FeedbackOutput};
    pub use crate::metrics::{Comparator, ComparisonResult};
    pub use crate::score::Tier;
    pub use crate::session::{Session, TickReport};
    pub use crate::types::{BodyPart, Joint, Keypoint, Point2D, Pose, Target};
}
