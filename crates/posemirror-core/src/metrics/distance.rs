//! Normalized keypoint-distance metric.

use crate::config::{DistanceMetricConfig, MetricKind};
use crate::error::{CoreResult, GeometryError};
use crate::geometry::distance;
use crate::metrics::{Comparator, ComparisonResult, PartDeviation};
use crate::normalize::normalize_to_reference;
use crate::types::{Pose, Target};

/// Sums keypoint distances between the normalized live pose and the reference.
///
/// The summed keypoints skip face landmarks (when `exclude_face` is set) and
/// any keypoint below `min_confidence` in either pose. The message target is
/// chosen separately from raw, unnormalized distances over every confident
/// keypoint.
#[derive(Debug, Clone, Default)]
pub struct DistanceMetric {
    config: DistanceMetricConfig,
}

impl DistanceMetric {
    /// Creates a distance metric.
    #[must_use]
    pub fn new(config: DistanceMetricConfig) -> Self {
        Self { config }
    }

    /// Returns the metric settings.
    #[must_use]
    pub fn config(&self) -> &DistanceMetricConfig {
        &self.config
    }
}

impl Comparator for DistanceMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Distance
    }

    fn compare(&self, live: &Pose, reference: &Pose) -> CoreResult<ComparisonResult> {
        let normalized = normalize_to_reference(live, reference, self.config.normalization)?;
        let min_conf = self.config.min_confidence;

        let mut per_part = Vec::with_capacity(live.len());
        let mut most_divergent = None;
        let mut max_raw = 0.0_f32;

        let pairs = live
            .keypoints
            .iter()
            .zip(normalized.pose.keypoints.iter())
            .zip(reference.keypoints.iter());

        for ((raw, norm), reference_kp) in pairs {
            if !raw.is_confident(min_conf) || !reference_kp.is_confident(min_conf) {
                continue;
            }

            let raw_distance = distance(raw.position, reference_kp.position);
            if raw_distance > max_raw {
                max_raw = raw_distance;
                most_divergent = Some(Target::Part(raw.part));
            }

            if self.config.exclude_face && raw.part.is_face() {
                continue;
            }
            per_part.push(PartDeviation {
                target: Target::Part(raw.part),
                deviation: distance(norm.position, reference_kp.position),
            });
        }

        if per_part.is_empty() {
            return Err(GeometryError::NoComparableKeypoints.into());
        }

        let aggregate_deviation: f32 = per_part.iter().map(|p| p.deviation).sum();
        if !aggregate_deviation.is_finite() {
            return Err(GeometryError::DegenerateNormalization.into());
        }

        Ok(ComparisonResult {
            metric: MetricKind::Distance,
            aggregate_deviation,
            per_part,
            most_divergent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::normalize::NormalizationMode;
    use crate::types::{BodyPart, Point2D};
    use crate::NUM_KEYPOINTS;
    use approx::assert_abs_diff_eq;

    fn grid(scale: f32, offset: f32) -> [Point2D; NUM_KEYPOINTS] {
        std::array::from_fn(|i| {
            let col = (i % 4) as f32;
            let row = (i / 4) as f32;
            Point2D::new(offset + col * scale, offset + row * scale)
        })
    }

    #[test]
    fn test_identical_poses_have_zero_deviation() {
        let pose = Pose::from_positions(&grid(10.0, 0.0), 0.9);
        let result = DistanceMetric::default().compare(&pose, &pose).unwrap();
        assert_abs_diff_eq!(result.aggregate_deviation, 0.0, epsilon = 1e-4);
        assert_eq!(result.most_divergent, None);
        // 17 keypoints minus 5 face landmarks.
        assert_eq!(result.per_part.len(), 12);
    }

    #[test]
    fn test_scaled_copy_normalizes_away() {
        let reference = Pose::from_positions(&grid(20.0, 0.0), 0.9);
        let live = Pose::from_positions(&grid(10.0, 0.0), 0.9);

        let metric = DistanceMetric::new(DistanceMetricConfig {
            normalization: NormalizationMode::ScaleAndTranslate,
            ..DistanceMetricConfig::default()
        });
        let result = metric.compare(&live, &reference).unwrap();
        assert_abs_diff_eq!(result.aggregate_deviation, 0.0, epsilon = 1e-3);

        // Raw distances still differ, so a target is still reported.
        assert!(result.most_divergent.is_some());
    }

    #[test]
    fn test_face_exclusion_toggles_sum() {
        let reference = Pose::from_positions(&grid(10.0, 0.0), 0.9);
        let mut live = reference.clone();
        live.keypoints[BodyPart::Nose.index()].position.x += 30.0;

        let excluded = DistanceMetric::default().compare(&live, &reference).unwrap();
        assert!(excluded
            .deviation_of(Target::Part(BodyPart::Nose))
            .is_none());
        // The nose still leads the raw ranking.
        assert_eq!(excluded.most_divergent, Some(Target::Part(BodyPart::Nose)));

        let included = DistanceMetric::new(DistanceMetricConfig {
            exclude_face: false,
            ..DistanceMetricConfig::default()
        })
        .compare(&live, &reference)
        .unwrap();
        assert_eq!(included.per_part.len(), NUM_KEYPOINTS);
        assert!(included.aggregate_deviation > excluded.aggregate_deviation);
    }

    #[test]
    fn test_low_confidence_keypoints_are_skipped() {
        let reference = Pose::from_positions(&grid(10.0, 0.0), 0.9);
        let mut live = reference.clone();
        let knee = BodyPart::LeftKnee.index();
        live.keypoints[knee].position.y += 500.0;
        live.keypoints[knee].score = 0.2;

        let result = DistanceMetric::default().compare(&live, &reference).unwrap();
        assert!(result.deviation_of(Target::Part(BodyPart::LeftKnee)).is_none());
        assert_ne!(result.most_divergent, Some(Target::Part(BodyPart::LeftKnee)));
    }

    #[test]
    fn test_most_divergent_is_largest_raw_distance() {
        let reference = Pose::from_positions(&grid(10.0, 0.0), 0.9);
        let mut live = reference.clone();
        live.keypoints[BodyPart::RightWrist.index()].position.x += 15.0;
        live.keypoints[BodyPart::LeftAnkle.index()].position.y += 40.0;

        let result = DistanceMetric::default().compare(&live, &reference).unwrap();
        assert_eq!(result.most_divergent, Some(Target::Part(BodyPart::LeftAnkle)));
        assert!(result.aggregate_deviation > 0.0);
    }

    #[test]
    fn test_all_low_confidence_is_recoverable() {
        let pose = Pose::from_positions(&grid(10.0, 0.0), 0.1);
        let err = DistanceMetric::default().compare(&pose, &pose).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Geometry(GeometryError::NoComparableKeypoints)
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_collapsed_live_pose_is_recoverable() {
        let reference = Pose::from_positions(&grid(10.0, 0.0), 0.9);
        let live = Pose::from_positions(&[Point2D::new(5.0, 5.0); NUM_KEYPOINTS], 0.9);
        let err = DistanceMetric::default().compare(&live, &reference).unwrap_err();
        assert!(err.is_recoverable());
    }
}
