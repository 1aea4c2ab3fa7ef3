//! Scale normalization of a live pose onto a reference pose.
//!
//! Two performers filmed at different distances produce skeletons of
//! different sizes. Before summing keypoint distances the live pose is
//! rescaled about its own centroid so that its mean spread matches the
//! reference's. Centroid and spread use every keypoint, regardless of
//! confidence.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, GeometryError};
use crate::geometry::{centroid, mean_spread};
use crate::types::{Point2D, Pose};

/// How the live pose is mapped onto the reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Rescale about the live centroid; the centroid itself stays put.
    #[default]
    ScaleOnly,
    /// Rescale, then move the live centroid onto the reference centroid.
    ScaleAndTranslate,
}

/// Centroid and spread of one pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseFrame {
    /// Mean keypoint position
    pub centroid: Point2D,
    /// Mean keypoint distance to the centroid
    pub spread: f32,
}

impl PoseFrame {
    /// Measures `pose`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateNormalization`] for an empty pose.
    pub fn of(pose: &Pose) -> Result<Self, GeometryError> {
        let points: Vec<Point2D> = pose.keypoints.iter().map(|kp| kp.position).collect();
        let centroid = centroid(&points).ok_or(GeometryError::DegenerateNormalization)?;
        Ok(Self {
            centroid,
            spread: mean_spread(&points, centroid),
        })
    }
}

/// Result of normalizing a live pose.
#[derive(Debug, Clone)]
pub struct NormalizedPose {
    /// Live pose re-projected onto the reference scale
    pub pose: Pose,
    /// `spread_reference / spread_live`
    pub scale_factor: f32,
}

/// Rescales `live` so its spread matches `reference`.
///
/// Each live keypoint becomes
/// `centroid_live + (position - centroid_live) * scale_factor`, shifted by
/// `centroid_reference - centroid_live` in [`NormalizationMode::ScaleAndTranslate`].
///
/// # Errors
///
/// - [`CoreError::Alignment`](crate::CoreError::Alignment) if keypoint counts differ.
/// - [`GeometryError::DegenerateNormalization`] if either pose is empty or
///   the live pose has zero spread.
pub fn normalize_to_reference(
    live: &Pose,
    reference: &Pose,
    mode: NormalizationMode,
) -> CoreResult<NormalizedPose> {
    live.check_aligned(reference)?;

    let live_frame = PoseFrame::of(live)?;
    let reference_frame = PoseFrame::of(reference)?;

    if live_frame.spread == 0.0 || !live_frame.spread.is_finite() {
        return Err(GeometryError::DegenerateNormalization.into());
    }
    let scale_factor = reference_frame.spread / live_frame.spread;

    let anchor = match mode {
        NormalizationMode::ScaleOnly => live_frame.centroid,
        NormalizationMode::ScaleAndTranslate => reference_frame.centroid,
    };
    let origin = live_frame.centroid;
    let shift = Point2D::new(anchor.x - origin.x, anchor.y - origin.y);
    let stretch = scale_factor - 1.0;

    // Same mapping rearranged so that an identity transform is exact.
    let mut pose = live.clone();
    for kp in &mut pose.keypoints {
        let p = kp.position;
        kp.position = Point2D::new(
            p.x + shift.x + (p.x - origin.x) * stretch,
            p.y + shift.y + (p.y - origin.y) * stretch,
        );
    }

    Ok(NormalizedPose { pose, scale_factor })
}
