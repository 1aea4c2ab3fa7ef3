//! Joint-angle metric.

use tracing::trace;

use crate::config::{AngleMetricConfig, MetricKind};
use crate::error::{CoreResult, GeometryError};
use crate::geometry::angle_at;
use crate::metrics::{Comparator, ComparisonResult, PartDeviation};
use crate::types::{Joint, JointAngleSet, Pose, Target};

/// Measures the six tracked joint angles of `pose`.
///
/// A joint is left unset when any keypoint of its triplet is missing or
/// below `min_confidence`, or when the triplet is degenerate.
#[must_use]
pub fn joint_angles(pose: &Pose, min_confidence: f32) -> JointAngleSet {
    let mut set = JointAngleSet::default();
    for joint in Joint::ALL {
        let (a, b, c) = joint.triplet();
        let points = [a, b, c].map(|part| {
            pose.keypoint(part)
                .filter(|kp| kp.is_confident(min_confidence))
                .map(|kp| kp.position)
        });
        let [Some(pa), Some(pb), Some(pc)] = points else {
            continue;
        };
        match angle_at(pa, pb, pc) {
            Ok(angle) => set.set(joint, Some(angle)),
            Err(e) => trace!(%joint, error = %e, "joint angle unavailable"),
        }
    }
    set
}

/// Compares joint angles; the aggregate is the largest single difference.
#[derive(Debug, Clone, Default)]
pub struct AngleMetric {
    config: AngleMetricConfig,
}

impl AngleMetric {
    /// Creates an angle metric.
    #[must_use]
    pub fn new(config: AngleMetricConfig) -> Self {
        Self { config }
    }

    /// Returns the metric settings.
    #[must_use]
    pub fn config(&self) -> &AngleMetricConfig {
        &self.config
    }
}

impl Comparator for AngleMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Angle
    }

    fn compare(&self, live: &Pose, reference: &Pose) -> CoreResult<ComparisonResult> {
        live.check_aligned(reference)?;

        let live_angles = joint_angles(live, self.config.min_confidence);
        let reference_angles = joint_angles(reference, self.config.min_confidence);

        let per_part: Vec<PartDeviation> = live_angles
            .iter()
            .filter_map(|(joint, live_angle)| {
                reference_angles.get(joint).map(|reference_angle| PartDeviation {
                    target: Target::Joint(joint),
                    deviation: (live_angle - reference_angle).abs(),
                })
            })
            .collect();

        if per_part.is_empty() {
            return Err(GeometryError::NoComparableKeypoints.into());
        }

        let mut aggregate_deviation = 0.0_f32;
        let mut most_divergent = None;
        for p in &per_part {
            if p.deviation > aggregate_deviation {
                aggregate_deviation = p.deviation;
                most_divergent = Some(p.target);
            }
        }

        Ok(ComparisonResult {
            metric: MetricKind::Angle,
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
    use crate::types::{BodyPart, Point2D};
    use crate::NUM_KEYPOINTS;
    use approx::assert_abs_diff_eq;

    /// Upright figure, arms hanging straight down, legs straight.
    fn upright() -> [Point2D; NUM_KEYPOINTS] {
        use BodyPart as P;
        let mut pts = [Point2D::ZERO; NUM_KEYPOINTS];
        let mut put = |part: P, x: f32, y: f32| pts[part.index()] = Point2D::new(x, y);
        put(P::Nose, 100.0, 20.0);
        put(P::LeftEye, 105.0, 15.0);
        put(P::RightEye, 95.0, 15.0);
        put(P::LeftEar, 110.0, 18.0);
        put(P::RightEar, 90.0, 18.0);
        put(P::LeftShoulder, 130.0, 60.0);
        put(P::RightShoulder, 70.0, 60.0);
        put(P::LeftElbow, 130.0, 110.0);
        put(P::RightElbow, 70.0, 110.0);
        put(P::LeftWrist, 130.0, 160.0);
        put(P::RightWrist, 70.0, 160.0);
        put(P::LeftHip, 120.0, 160.0);
        put(P::RightHip, 80.0, 160.0);
        put(P::LeftKnee, 120.0, 220.0);
        put(P::RightKnee, 80.0, 220.0);
        put(P::LeftAnkle, 120.0, 280.0);
        put(P::RightAnkle, 80.0, 280.0);
        pts
    }

    #[test]
    fn test_upright_angles() {
        let angles = joint_angles(&Pose::from_positions(&upright(), 0.9), 0.6);
        assert_abs_diff_eq!(angles.right_elbow.unwrap(), 180.0, epsilon = 1e-3);
        assert_abs_diff_eq!(angles.left_elbow.unwrap(), 180.0, epsilon = 1e-3);
        assert_abs_diff_eq!(angles.right_knee.unwrap(), 180.0, epsilon = 1e-3);
        assert!(angles.left_shoulder.is_some());
    }

    #[test]
    fn test_straight_elbows_match_and_another_joint_leads() {
        let reference = Pose::from_positions(&upright(), 0.9);
        let mut bent = upright();
        bent[BodyPart::LeftAnkle.index()] = Point2D::new(180.0, 220.0);
        let live = Pose::from_positions(&bent, 0.9);

        let result = AngleMetric::default().compare(&live, &reference).unwrap();
        assert_abs_diff_eq!(
            result.deviation_of(Target::Joint(Joint::RightElbow)).unwrap(),
            0.0,
            epsilon = 1e-3
        );
        assert_eq!(result.most_divergent, Some(Target::Joint(Joint::LeftKnee)));
        assert_abs_diff_eq!(result.aggregate_deviation, 90.0, epsilon = 1e-2);
    }

    #[test]
    fn test_identical_poses_report_no_dominant_joint() {
        let pose = Pose::from_positions(&upright(), 0.9);
        let result = AngleMetric::default().compare(&pose, &pose).unwrap();
        assert_eq!(result.aggregate_deviation, 0.0);
        assert_eq!(result.most_divergent, None);
        assert_eq!(result.per_part.len(), Joint::ALL.len());
    }

    #[test]
    fn test_degenerate_joint_is_excluded() {
        let reference = Pose::from_positions(&upright(), 0.9);
        let mut collapsed = upright();
        // Right wrist on top of the right elbow: zero-length ray.
        collapsed[BodyPart::RightWrist.index()] = collapsed[BodyPart::RightElbow.index()];
        let live = Pose::from_positions(&collapsed, 0.9);

        let result = AngleMetric::default().compare(&live, &reference).unwrap();
        assert!(result.deviation_of(Target::Joint(Joint::RightElbow)).is_none());
        assert_ne!(result.most_divergent, Some(Target::Joint(Joint::RightElbow)));
        assert_eq!(result.per_part.len(), Joint::ALL.len() - 1);
    }

    #[test]
    fn test_low_confidence_joint_is_excluded() {
        let reference = Pose::from_positions(&upright(), 0.9);
        let mut live = reference.clone();
        live.keypoints[BodyPart::LeftKnee.index()].score = 0.55;

        let result = AngleMetric::default().compare(&live, &reference).unwrap();
        assert!(result.deviation_of(Target::Joint(Joint::LeftKnee)).is_none());
    }

    #[test]
    fn test_nothing_confident_is_recoverable() {
        let pose = Pose::from_positions(&upright(), 0.3);
        let err = AngleMetric::default().compare(&pose, &pose).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Geometry(GeometryError::NoComparableKeypoints)
        ));
    }

    #[test]
    fn test_misaligned_poses_fail() {
        let reference = Pose::from_positions(&upright(), 0.9);
        let mut live = reference.clone();
        live.keypoints.truncate(12);
        let err = AngleMetric::default().compare(&live, &reference).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
