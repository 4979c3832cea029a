//! Solved poses
//!
//! Rotations are Euler angles in radians (or solver-local units for the
//! hands), applied in X, Y, Z order by the consumer. Shapes are normalized
//! weights.

use glam::{Vec2, Vec3};
use mimic_core::{ExpressionName, Side};

/// Head orientation and face plane metrics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadSolution {
    /// Euler rotation in radians
    pub rotation: Vec3,
    /// Same rotation as fractions of π
    pub normalized: Vec3,
    /// Face plane width and height in scaled image units
    pub width: f32,
    pub height: f32,
    /// Centre of the face plane
    pub position: Vec3,
}

/// Eye openness, 0 = closed, 1 = open
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeOpenness {
    pub left: f32,
    pub right: f32,
}

impl Default for EyeOpenness {
    fn default() -> Self {
        Self {
            left: 1.0,
            right: 1.0,
        }
    }
}

/// Vowel mouth shapes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouthShape {
    pub a: f32,
    pub e: f32,
    pub i: f32,
    pub o: f32,
    pub u: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouthSolution {
    /// Normalized mouth width
    pub x: f32,
    /// Normalized mouth opening
    pub y: f32,
    pub shape: MouthShape,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceSolution {
    pub head: HeadSolution,
    pub eye: EyeOpenness,
    /// Brow raise 0..1 (iris mesh only, else 0)
    pub brow: f32,
    /// Pupil offset from the eye centre (iris mesh only)
    pub pupil: Option<Vec2>,
    pub mouth: MouthSolution,
}

impl FaceSolution {
    /// Target weight for a solved expression channel. Blinks are the
    /// complement of eye openness.
    pub fn channel(&self, name: ExpressionName) -> Option<f32> {
        match name {
            ExpressionName::Aa => Some(self.mouth.shape.a),
            ExpressionName::Ih => Some(self.mouth.shape.i),
            ExpressionName::Ee => Some(self.mouth.shape.e),
            ExpressionName::Oh => Some(self.mouth.shape.o),
            ExpressionName::Ou => Some(self.mouth.shape.u),
            ExpressionName::BlinkLeft => Some(1.0 - self.eye.left),
            ExpressionName::BlinkRight => Some(1.0 - self.eye.right),
            _ => None,
        }
    }
}

/// Joints produced by the pose solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseJoint {
    Hips,
    Spine,
    LeftUpperArm,
    LeftLowerArm,
    LeftHand,
    RightUpperArm,
    RightLowerArm,
    RightHand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HipsSolution {
    pub rotation: Vec3,
    /// Screen-relative hips offset from the 2D landmarks
    pub position: Vec3,
    pub world_position: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoseSolution {
    pub hips: HipsSolution,
    pub spine: Vec3,
    pub left_upper_arm: Vec3,
    pub left_lower_arm: Vec3,
    pub left_hand: Vec3,
    pub right_upper_arm: Vec3,
    pub right_lower_arm: Vec3,
    pub right_hand: Vec3,
}

impl PoseSolution {
    pub fn rotation(&self, joint: PoseJoint) -> Vec3 {
        match joint {
            PoseJoint::Hips => self.hips.rotation,
            PoseJoint::Spine => self.spine,
            PoseJoint::LeftUpperArm => self.left_upper_arm,
            PoseJoint::LeftLowerArm => self.left_lower_arm,
            PoseJoint::LeftHand => self.left_hand,
            PoseJoint::RightUpperArm => self.right_upper_arm,
            PoseJoint::RightLowerArm => self.right_lower_arm,
            PoseJoint::RightHand => self.right_hand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Little,
    ];

    /// Landmark indices from the knuckle to the tip
    pub fn chain(self) -> [usize; 4] {
        match self {
            Finger::Thumb => [1, 2, 3, 4],
            Finger::Index => [5, 6, 7, 8],
            Finger::Middle => [9, 10, 11, 12],
            Finger::Ring => [13, 14, 15, 16],
            Finger::Little => [17, 18, 19, 20],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Proximal,
    Intermediate,
    Distal,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Proximal, Segment::Intermediate, Segment::Distal];
}

/// Joints produced by the hand solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    Finger(Finger, Segment),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSolution {
    /// Anatomical side this solution describes
    pub side: Side,
    pub wrist: Vec3,
    /// Indexed by [`Finger`] then [`Segment`]
    pub fingers: [[Vec3; 3]; 5],
}

impl HandSolution {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            wrist: Vec3::ZERO,
            fingers: [[Vec3::ZERO; 3]; 5],
        }
    }

    pub fn finger(&self, finger: Finger, segment: Segment) -> Vec3 {
        self.fingers[finger as usize][segment as usize]
    }

    pub fn finger_mut(&mut self, finger: Finger, segment: Segment) -> &mut Vec3 {
        &mut self.fingers[finger as usize][segment as usize]
    }

    pub fn rotation(&self, joint: HandJoint) -> Vec3 {
        match joint {
            HandJoint::Wrist => self.wrist,
            HandJoint::Finger(finger, segment) => self.finger(finger, segment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blink_is_complement_of_openness() {
        let face = FaceSolution {
            eye: EyeOpenness {
                left: 0.25,
                right: 1.0,
            },
            ..Default::default()
        };
        assert_eq!(face.channel(ExpressionName::BlinkLeft), Some(0.75));
        assert_eq!(face.channel(ExpressionName::BlinkRight), Some(0.0));
        assert_eq!(face.channel(ExpressionName::Happy), None);
    }

    #[test]
    fn test_every_solved_channel_has_a_source() {
        let face = FaceSolution::default();
        for name in ExpressionName::SOLVED {
            assert!(face.channel(*name).is_some(), "{name}");
        }
    }

    #[test]
    fn test_finger_indexing() {
        let mut hand = HandSolution::new(Side::Left);
        *hand.finger_mut(Finger::Ring, Segment::Distal) = Vec3::Z;
        assert_eq!(
            hand.rotation(HandJoint::Finger(Finger::Ring, Segment::Distal)),
            Vec3::Z
        );
        assert_eq!(hand.finger(Finger::Ring, Segment::Proximal), Vec3::ZERO);
    }
}
