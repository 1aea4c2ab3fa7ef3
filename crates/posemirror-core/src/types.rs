//! Core data types for pose comparison.
//!
//! # Type Categories
//!
//! - **Geometry**: [`Point2D`]
//! - **Pose Types**: [`Pose`], [`Keypoint`], [`BodyPart`]
//! - **Joint Types**: [`Joint`], [`JointAngleSet`]
//! - **Feedback Targets**: [`Target`]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::NUM_KEYPOINTS;

// =============================================================================
// Geometry
// =============================================================================

/// A screen-space coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point2D {
    /// Origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// Pose Types
// =============================================================================

/// Body parts of the 17-point COCO / PoseNet skeleton.
///
/// The discriminant is the keypoint index used by the pose source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum BodyPart {
    /// Nose
    Nose = 0,
    /// Left eye
    LeftEye = 1,
    /// Right eye
    RightEye = 2,
    /// Left ear
    LeftEar = 3,
    /// Right ear
    RightEar = 4,
    /// Left shoulder
    LeftShoulder = 5,
    /// Right shoulder
    RightShoulder = 6,
    /// Left elbow
    LeftElbow = 7,
    /// Right elbow
    RightElbow = 8,
    /// Left wrist
    LeftWrist = 9,
    /// Right wrist
    RightWrist = 10,
    /// Left hip
    LeftHip = 11,
    /// Right hip
    RightHip = 12,
    /// Left knee
    LeftKnee = 13,
    /// Right knee
    RightKnee = 14,
    /// Left ankle
    LeftAnkle = 15,
    /// Right ankle
    RightAnkle = 16,
}

impl BodyPart {
    /// Returns all body parts in keypoint order.
    #[must_use]
    pub fn all() -> &'static [Self; NUM_KEYPOINTS] {
        &[
            Self::Nose,
            Self::LeftEye,
            Self::RightEye,
            Self::LeftEar,
            Self::RightEar,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
        ]
    }

    /// Keypoint index of this part in an aligned pose.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable name used in feedback messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left eye",
            Self::RightEye => "right eye",
            Self::LeftEar => "left ear",
            Self::RightEar => "right ear",
            Self::LeftShoulder => "left shoulder",
            Self::RightShoulder => "right shoulder",
            Self::LeftElbow => "left elbow",
            Self::RightElbow => "right elbow",
            Self::LeftWrist => "left wrist",
            Self::RightWrist => "right wrist",
            Self::LeftHip => "left hip",
            Self::RightHip => "right hip",
            Self::LeftKnee => "left knee",
            Self::RightKnee => "right knee",
            Self::LeftAnkle => "left ankle",
            Self::RightAnkle => "right ankle",
        }
    }

    /// Returns `true` if this is a face landmark.
    ///
    /// Facial jitter is not postural error, so the distance metric can
    /// leave these out of its sum.
    #[must_use]
    pub fn is_face(&self) -> bool {
        matches!(
            self,
            Self::Nose | Self::LeftEye | Self::RightEye | Self::LeftEar | Self::RightEar
        )
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for BodyPart {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::all()
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| CoreError::validation(format!("Invalid body part index: {value}")))
    }
}

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Which landmark this is
    pub part: BodyPart,
    /// Screen-space position
    pub position: Point2D,
    /// Detection confidence in [0.0, 1.0]
    pub score: f32,
}

impl Keypoint {
    /// Creates a new keypoint.
    #[must_use]
    pub const fn new(part: BodyPart, x: f32, y: f32, score: f32) -> Self {
        Self {
            part,
            position: Point2D::new(x, y),
            score,
        }
    }

    /// Returns `true` if the detection confidence reaches `threshold`.
    #[must_use]
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.score >= threshold
    }
}

/// One detected body in one frame.
///
/// Keypoints are index-aligned across the live and reference streams:
/// index `i` names the same [`BodyPart`] in both. The pose source
/// guarantees this; the core never re-sorts by part.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Keypoints in skeleton order
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    /// Creates a pose from keypoints already in skeleton order.
    #[must_use]
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Builds a full 17-point pose from positions, all with the same score.
    #[must_use]
    pub fn from_positions(positions: &[Point2D; NUM_KEYPOINTS], score: f32) -> Self {
        let keypoints = BodyPart::all()
            .iter()
            .zip(positions.iter())
            .map(|(&part, p)| Keypoint::new(part, p.x, p.y, score))
            .collect();
        Self { keypoints }
    }

    /// Number of keypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// Returns `true` if the pose has no keypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Returns the keypoint for `part`, if present at its skeleton index.
    #[must_use]
    pub fn keypoint(&self, part: BodyPart) -> Option<&Keypoint> {
        self.keypoints
            .get(part.index())
            .filter(|kp| kp.part == part)
    }

    /// Checks that `other` can be compared index-by-index with `self`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Alignment`] if the keypoint counts differ and
    /// [`CoreError::MisalignedPart`] if a shared index names different parts.
    pub fn check_aligned(&self, other: &Self) -> CoreResult<()> {
        if self.len() != other.len() {
            return Err(CoreError::alignment(self.len(), other.len()));
        }
        if let Some((index, (a, b))) = self
            .keypoints
            .iter()
            .zip(other.keypoints.iter())
            .enumerate()
            .find(|(_, (a, b))| a.part != b.part)
        {
            return Err(CoreError::MisalignedPart {
                index,
                live: a.part,
                reference: b.part,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Joint Types
// =============================================================================

/// The six tracked joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Joint {
    /// Shoulder - elbow - wrist, right side
    RightElbow,
    /// Shoulder - elbow - wrist, left side
    LeftElbow,
    /// Hip - shoulder - elbow, right side
    RightShoulder,
    /// Hip - shoulder - elbow, left side
    LeftShoulder,
    /// Hip - knee - ankle, right side
    RightKnee,
    /// Hip - knee - ankle, left side
    LeftKnee,
}

impl Joint {
    /// All tracked joints.
    pub const ALL: [Self; 6] = [
        Self::RightElbow,
        Self::LeftElbow,
        Self::RightShoulder,
        Self::LeftShoulder,
        Self::RightKnee,
        Self::LeftKnee,
    ];

    /// The `(A, B, C)` triplet whose angle at `B` defines this joint.
    #[must_use]
    pub const fn triplet(self) -> (BodyPart, BodyPart, BodyPart) {
        use BodyPart as P;
        match self {
            Self::RightElbow => (P::RightShoulder, P::RightElbow, P::RightWrist),
            Self::LeftElbow => (P::LeftShoulder, P::LeftElbow, P::LeftWrist),
            Self::RightShoulder => (P::RightHip, P::RightShoulder, P::RightElbow),
            Self::LeftShoulder => (P::LeftHip, P::LeftShoulder, P::LeftElbow),
            Self::RightKnee => (P::RightHip, P::RightKnee, P::RightAnkle),
            Self::LeftKnee => (P::LeftHip, P::LeftKnee, P::LeftAnkle),
        }
    }

    /// The body part at the joint vertex.
    #[must_use]
    pub const fn vertex(self) -> BodyPart {
        self.triplet().1
    }

    /// Human-readable name used in feedback messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.vertex().name()
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Angles in degrees for the six tracked joints.
///
/// A joint is `None` when its triplet was low-confidence or degenerate in
/// this frame; it is then left out of any aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointAngleSet {
    /// Right elbow angle
    pub right_elbow: Option<f32>,
    /// Left elbow angle
    pub left_elbow: Option<f32>,
    /// Right shoulder angle
    pub right_shoulder: Option<f32>,
    /// Left shoulder angle
    pub left_shoulder: Option<f32>,
    /// Right knee angle
    pub right_knee: Option<f32>,
    /// Left knee angle
    pub left_knee: Option<f32>,
}

impl JointAngleSet {
    /// Returns the angle for `joint`, if available.
    #[must_use]
    pub fn get(&self, joint: Joint) -> Option<f32> {
        match joint {
            Joint::RightElbow => self.right_elbow,
            Joint::LeftElbow => self.left_elbow,
            Joint::RightShoulder => self.right_shoulder,
            Joint::LeftShoulder => self.left_shoulder,
            Joint::RightKnee => self.right_knee,
            Joint::LeftKnee => self.left_knee,
        }
    }

    /// Sets the angle for `joint`.
    pub fn set(&mut self, joint: Joint, angle: Option<f32>) {
        let slot = match joint {
            Joint::RightElbow => &mut self.right_elbow,
            Joint::LeftElbow => &mut self.left_elbow,
            Joint::RightShoulder => &mut self.right_shoulder,
            Joint::LeftShoulder => &mut self.left_shoulder,
            Joint::RightKnee => &mut self.right_knee,
            Joint::LeftKnee => &mut self.left_knee,
        };
        *slot = angle;
    }

    /// Iterates over available `(joint, angle)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, f32)> + '_ {
        Joint::ALL
            .iter()
            .filter_map(move |&joint| self.get(joint).map(|angle| (joint, angle)))
    }
}

// =============================================================================
// Feedback Targets
// =============================================================================

/// What a deviation or corrective message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    /// A single keypoint (distance metric)
    Part(BodyPart),
    /// A joint angle (angle metric)
    Joint(Joint),
}

impl Target {
    /// Human-readable name used in feedback messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Part(part) => part.name(),
            Self::Joint(joint) => joint.name(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
