//! Tracked bone table
//!
//! Which solved rotation drives which humanoid bone, with the per-axis
//! permutation and scale applied on the way. Every numeric constant of the
//! tracking path lives here; the blender walks the table with one generic
//! routine.

use glam::{Quat, Vec3};
use mimic_core::{euler_xyz, Axis, AxisMap, BoneName, Side};
use mimic_solve::{Finger, HandJoint, PoseJoint, Segment, SolvedSnapshot};

/// Gain on the finger curl axis
pub const FINGER_AMPLIFICATION: f32 = 3.0;

/// Finger segments: curl amplified on X, Y and Z swapped and negated
pub const LEFT_FINGER_AXES: AxisMap =
    AxisMap::new([Axis::X, Axis::Z, Axis::Y], [FINGER_AMPLIFICATION, -1.0, -1.0]);
pub const RIGHT_FINGER_AXES: AxisMap =
    AxisMap::new([Axis::X, Axis::Z, Axis::Y], [-FINGER_AMPLIFICATION, 1.0, 1.0]);

/// Wrists: X and Z swapped, one of them negated
pub const LEFT_WRIST_AXES: AxisMap = AxisMap::new([Axis::Z, Axis::Y, Axis::X], [1.0, 1.0, -1.0]);
pub const RIGHT_WRIST_AXES: AxisMap = AxisMap::new([Axis::Z, Axis::Y, Axis::X], [-1.0, -1.0, 1.0]);

/// Where a tracked bone reads its solved rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvedSource {
    /// Head rotation of the face solution
    Head,
    Pose(PoseJoint),
    /// Joint of the hand solved for the given anatomical side
    Hand(Side, HandJoint),
}

impl SolvedSource {
    /// Solved Euler rotation, `None` when the category is absent
    pub fn resolve(&self, snapshot: &SolvedSnapshot) -> Option<Vec3> {
        match *self {
            SolvedSource::Head => snapshot.face.as_ref().map(|face| face.head.rotation),
            SolvedSource::Pose(joint) => snapshot.pose.as_ref().map(|pose| pose.rotation(joint)),
            SolvedSource::Hand(side, joint) => snapshot.hand(side).map(|hand| hand.rotation(joint)),
        }
    }
}

/// Which smoothing rate a bone uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateClass {
    Body,
    Hand,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedBone {
    pub bone: BoneName,
    pub source: SolvedSource,
    pub axes: AxisMap,
    pub rate: RateClass,
}

impl TrackedBone {
    /// Target local rotation for the current snapshot
    pub fn target(&self, snapshot: &SolvedSnapshot) -> Option<Quat> {
        let euler = self.source.resolve(snapshot)?;
        Some(euler_xyz(self.axes.apply(euler)))
    }
}

const fn body(bone: BoneName, source: SolvedSource, axes: AxisMap) -> TrackedBone {
    TrackedBone {
        bone,
        source,
        axes,
        rate: RateClass::Body,
    }
}

const fn wrist(bone: BoneName, side: Side) -> TrackedBone {
    TrackedBone {
        bone,
        source: SolvedSource::Hand(side, HandJoint::Wrist),
        axes: match side {
            Side::Left => LEFT_WRIST_AXES,
            Side::Right => RIGHT_WRIST_AXES,
        },
        rate: RateClass::Hand,
    }
}

const fn finger(bone: BoneName, side: Side, finger: Finger, segment: Segment) -> TrackedBone {
    TrackedBone {
        bone,
        source: SolvedSource::Hand(side, HandJoint::Finger(finger, segment)),
        axes: match side {
            Side::Left => LEFT_FINGER_AXES,
            Side::Right => RIGHT_FINGER_AXES,
        },
        rate: RateClass::Hand,
    }
}

macro_rules! hand_bones {
    ($side:expr, $wrist:ident,
     $thumb_meta:ident, $thumb_prox:ident, $thumb_dist:ident,
     $(($finger:ident, $prox:ident, $inter:ident, $dist:ident)),*) => {
        [
            wrist(BoneName::$wrist, $side),
            // The thumb's metacarpal is driven by the solved intermediate
            // segment
            finger(BoneName::$thumb_meta, $side, Finger::Thumb, Segment::Intermediate),
            finger(BoneName::$thumb_prox, $side, Finger::Thumb, Segment::Proximal),
            finger(BoneName::$thumb_dist, $side, Finger::Thumb, Segment::Distal),
            $(
                finger(BoneName::$prox, $side, Finger::$finger, Segment::Proximal),
                finger(BoneName::$inter, $side, Finger::$finger, Segment::Intermediate),
                finger(BoneName::$dist, $side, Finger::$finger, Segment::Distal),
            )*
        ]
    };
}

const BODY_BONES: [TrackedBone; 8] = [
    body(BoneName::Neck, SolvedSource::Head, AxisMap::uniform(0.7)),
    body(BoneName::Chest, SolvedSource::Pose(PoseJoint::Spine), AxisMap::uniform(0.3)),
    body(BoneName::Spine, SolvedSource::Pose(PoseJoint::Spine), AxisMap::uniform(0.3)),
    body(BoneName::Hips, SolvedSource::Pose(PoseJoint::Hips), AxisMap::uniform(0.7)),
    body(BoneName::LeftUpperArm, SolvedSource::Pose(PoseJoint::LeftUpperArm), AxisMap::IDENTITY),
    body(BoneName::LeftLowerArm, SolvedSource::Pose(PoseJoint::LeftLowerArm), AxisMap::IDENTITY),
    body(BoneName::RightUpperArm, SolvedSource::Pose(PoseJoint::RightUpperArm), AxisMap::IDENTITY),
    body(BoneName::RightLowerArm, SolvedSource::Pose(PoseJoint::RightLowerArm), AxisMap::IDENTITY),
];

const LEFT_HAND_BONES: [TrackedBone; 16] = hand_bones!(
    Side::Left,
    LeftHand,
    LeftThumbMetacarpal,
    LeftThumbProximal,
    LeftThumbDistal,
    (Index, LeftIndexProximal, LeftIndexIntermediate, LeftIndexDistal),
    (Middle, LeftMiddleProximal, LeftMiddleIntermediate, LeftMiddleDistal),
    (Ring, LeftRingProximal, LeftRingIntermediate, LeftRingDistal),
    (Little, LeftLittleProximal, LeftLittleIntermediate, LeftLittleDistal)
);

const RIGHT_HAND_BONES: [TrackedBone; 16] = hand_bones!(
    Side::Right,
    RightHand,
    RightThumbMetacarpal,
    RightThumbProximal,
    RightThumbDistal,
    (Index, RightIndexProximal, RightIndexIntermediate, RightIndexDistal),
    (Middle, RightMiddleProximal, RightMiddleIntermediate, RightMiddleDistal),
    (Ring, RightRingProximal, RightRingIntermediate, RightRingDistal),
    (Little, RightLittleProximal, RightLittleIntermediate, RightLittleDistal)
);

/// Every bone the tracking path writes, in write order
pub fn tracked_bones() -> impl Iterator<Item = &'static TrackedBone> {
    BODY_BONES.iter().chain(LEFT_HAND_BONES.iter()).chain(RIGHT_HAND_BONES.iter())
}

/// Table entry for a bone, if tracking drives it
pub fn tracked_bone(bone: BoneName) -> Option<&'static TrackedBone> {
    tracked_bones().find(|entry| entry.bone == bone)
}
