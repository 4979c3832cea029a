//! Pose solver
//!
//! Arm rotations come from world-space landmarks (metres around the hips),
//! the hips offset from the normalized image landmarks. A wrist that is
//! out of frame or poorly visible drops its whole arm to the resting pose.

use std::f32::consts::PI;

use glam::Vec3;
use mimic_core::{remap01, MimicResult, Side};
use serde::{Deserialize, Serialize};

use crate::landmark::{require, POSE_LANDMARKS};
use crate::vector::{angle_between, find_rotation, segment_roll_pitch_yaw};
use crate::{HipsSolution, Landmark, PoseSolution};

const LEFT_SHOULDER: usize = 11;
const RIGHT_SHOULDER: usize = 12;
const LEFT_ELBOW: usize = 13;
const RIGHT_ELBOW: usize = 14;
const LEFT_WRIST: usize = 15;
const RIGHT_WRIST: usize = 16;
const LEFT_PINKY: usize = 17;
const RIGHT_PINKY: usize = 18;
const LEFT_INDEX: usize = 19;
const RIGHT_INDEX: usize = 20;
const LEFT_HIP: usize = 23;
const RIGHT_HIP: usize = 24;

/// Upper arm z rotation of the resting (arms down) pose, subject's left
const RESTING_UPPER_ARM_Z: f32 = -1.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSolveConfig {
    /// Wrist visibility below this counts as offscreen
    pub offscreen_visibility: f32,
    /// Wrist world height (y down) beyond this counts as offscreen
    pub offscreen_depth: f32,
    /// Wrist image y beyond this counts as offscreen
    pub offscreen_edge: f32,
}

impl Default for PoseSolveConfig {
    fn default() -> Self {
        Self {
            offscreen_visibility: 0.23,
            offscreen_depth: 0.1,
            offscreen_edge: 0.995,
        }
    }
}

/// Arm rotations before offscreen handling
#[derive(Debug, Clone, Copy, Default)]
struct ArmRig {
    upper: Vec3,
    lower: Vec3,
    hand: Vec3,
}

/// Solve hips, spine and arms. `world` and `image` are the world-space and
/// normalized image-space sets of the same detection.
pub fn solve_pose(world: &[Landmark], image: &[Landmark], config: &PoseSolveConfig) -> MimicResult<PoseSolution> {
    require("pose_world", world, POSE_LANDMARKS)?;
    require("pose", image, POSE_LANDMARKS)?;

    let w: Vec<Vec3> = world.iter().map(Landmark::position).collect();
    let i: Vec<Vec3> = image.iter().map(Landmark::position).collect();

    // Detector labels are swapped relative to the rig sides
    let mut right = solve_arm(&w, LEFT_SHOULDER, RIGHT_SHOULDER, LEFT_ELBOW, LEFT_WRIST, LEFT_PINKY, LEFT_INDEX, Side::Right);
    let mut left = solve_arm(&w, RIGHT_SHOULDER, LEFT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST, RIGHT_PINKY, RIGHT_INDEX, Side::Left);

    if offscreen(world, image, LEFT_WRIST, config) {
        right = resting_arm(Side::Right);
    }
    if offscreen(world, image, RIGHT_WRIST, config) {
        left = resting_arm(Side::Left);
    }

    let (hips, spine) = solve_hips(&w, &i);

    Ok(PoseSolution {
        hips,
        spine,
        left_upper_arm: left.upper,
        left_lower_arm: left.lower,
        left_hand: left.hand,
        right_upper_arm: right.upper,
        right_lower_arm: right.lower,
        right_hand: right.hand,
    })
}

fn offscreen(world: &[Landmark], image: &[Landmark], wrist: usize, config: &PoseSolveConfig) -> bool {
    world[wrist].y > config.offscreen_depth
        || world[wrist].visibility.unwrap_or(0.0) < config.offscreen_visibility
        || image[wrist].y > config.offscreen_edge
}

fn resting_arm(side: Side) -> ArmRig {
    let z = match side {
        Side::Left => RESTING_UPPER_ARM_Z,
        Side::Right => -RESTING_UPPER_ARM_Z,
    };
    ArmRig {
        upper: Vec3::new(0.0, 0.0, z),
        ..Default::default()
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_arm(
    w: &[Vec3],
    shoulder: usize,
    other_shoulder: usize,
    elbow: usize,
    wrist: usize,
    pinky: usize,
    index: usize,
    side: Side,
) -> ArmRig {
    let mut upper = find_rotation(w[shoulder], w[elbow]);
    upper.y = angle_between(w[other_shoulder], w[shoulder], w[elbow]);

    let mut lower = find_rotation(w[elbow], w[wrist]);
    lower.y = angle_between(w[shoulder], w[elbow], w[wrist]);
    lower.z = lower.z.clamp(-2.14, 0.0);

    let hand = find_rotation(w[wrist], w[pinky].lerp(w[index], 0.5));

    rig_arm(ArmRig { upper, lower, hand }, side)
}

/// Scale into rig space, couple the upper arm twist to the elbow, and clamp
/// to human limits
fn rig_arm(mut arm: ArmRig, side: Side) -> ArmRig {
    let invert = match side {
        Side::Right => 1.0,
        Side::Left => -1.0,
    };

    arm.upper.z *= -2.3 * invert;
    arm.upper.y *= PI * invert;
    arm.upper.y -= arm.lower.x;
    arm.upper.y -= -invert * arm.lower.z.max(0.0);
    arm.upper.x -= 0.3 * invert;

    arm.lower.z *= -2.14 * invert;
    arm.lower.y *= 2.14 * invert;
    arm.lower.x *= 2.14 * invert;

    arm.upper.x = arm.upper.x.clamp(-0.5, PI);
    arm.lower.x = arm.lower.x.clamp(-0.3, 0.3);

    arm.hand.y = (arm.hand.z * 2.0).clamp(-0.6, 0.6);
    arm.hand.z *= -2.3 * invert;
    arm
}

/// Fold a two-point roll/pitch/yaw so left/right tilt does not flip across
/// ±π, and fade the tilt out as the body turns sideways
fn stabilize_torso(mut rotation: Vec3) -> Vec3 {
    if rotation.y > 0.5 {
        rotation.y -= 2.0;
    }
    rotation.y += 0.5;

    if rotation.z > 0.0 {
        rotation.z = 1.0 - rotation.z;
    } else if rotation.z < 0.0 {
        rotation.z = -1.0 - rotation.z;
    }
    let turned = remap01(rotation.y.abs(), 0.2, 0.4);
    rotation.z *= 1.0 - turned;
    rotation.x = 0.0;
    rotation
}

fn solve_hips(w: &[Vec3], i: &[Vec3]) -> (HipsSolution, Vec3) {
    let hip_center = i[LEFT_HIP].lerp(i[RIGHT_HIP], 1.0);
    let shoulder_center = i[LEFT_SHOULDER].lerp(i[RIGHT_SHOULDER], 1.0);
    let spine_length = hip_center.distance(shoulder_center);

    let position = Vec3::new(
        (hip_center.x - 0.4).clamp(-1.0, 1.0),
        0.0,
        (spine_length - 1.0).clamp(-2.0, 0.0),
    );
    let world_z = position.z * (position.z * -2.0).powi(2);
    let world_position = Vec3::new(position.x * world_z, 0.0, world_z);

    let hips_rotation = stabilize_torso(segment_roll_pitch_yaw(w[LEFT_HIP], w[RIGHT_HIP]));
    let spine_rotation = stabilize_torso(segment_roll_pitch_yaw(w[LEFT_SHOULDER], w[RIGHT_SHOULDER]));

    (
        HipsSolution {
            rotation: hips_rotation * PI,
            position,
            world_position,
        },
        spine_rotation * PI,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::MimicError;

    /// Standing subject facing the camera, arms hanging, world y down
    fn standing() -> (Vec<Landmark>, Vec<Landmark>) {
        let mut world = vec![Landmark::new(0.0, 0.0, 0.0).with_visibility(0.99); POSE_LANDMARKS];
        let mut image = vec![Landmark::new(0.5, 0.5, 0.0).with_visibility(0.99); POSE_LANDMARKS];

        let mut place = |idx: usize, wx: f32, wy: f32, ix: f32, iy: f32| {
            world[idx] = Landmark::new(wx, wy, 0.0).with_visibility(0.99);
            image[idx] = Landmark::new(ix, iy, 0.0).with_visibility(0.99);
        };
        // Detector-left landmarks are on +x in world space
        place(LEFT_SHOULDER, 0.18, -0.45, 0.62, 0.30);
        place(RIGHT_SHOULDER, -0.18, -0.45, 0.38, 0.30);
        place(LEFT_ELBOW, 0.20, -0.20, 0.64, 0.45);
        place(RIGHT_ELBOW, -0.20, -0.20, 0.36, 0.45);
        place(LEFT_WRIST, 0.21, 0.02, 0.65, 0.60);
        place(RIGHT_WRIST, -0.21, 0.02, 0.35, 0.60);
        place(LEFT_PINKY, 0.21, 0.06, 0.65, 0.63);
        place(RIGHT_PINKY, -0.21, 0.06, 0.35, 0.63);
        place(LEFT_INDEX, 0.22, 0.07, 0.66, 0.63);
        place(RIGHT_INDEX, -0.22, 0.07, 0.34, 0.63);
        place(LEFT_HIP, 0.10, 0.0, 0.56, 0.62);
        place(RIGHT_HIP, -0.10, 0.0, 0.44, 0.62);
        (world, image)
    }

    #[test]
    fn test_requires_both_sets() {
        let (world, image) = standing();
        let err = solve_pose(&world, &image[..10], &PoseSolveConfig::default()).unwrap_err();
        assert_eq!(
            err,
            MimicError::MissingLandmarks {
                category: "pose",
                expected: POSE_LANDMARKS,
                actual: 10
            }
        );
    }

    #[test]
    fn test_standing_pose_is_finite() {
        let (world, image) = standing();
        let pose = solve_pose(&world, &image, &PoseSolveConfig::default()).unwrap();
        for v in [
            pose.hips.rotation,
            pose.spine,
            pose.left_upper_arm,
            pose.left_lower_arm,
            pose.right_upper_arm,
            pose.right_lower_arm,
        ] {
            assert!(v.is_finite());
        }
        // Level shoulders: no tilt
        assert!(pose.spine.z.abs() < 1e-4);
        assert_eq!(pose.spine.x, 0.0);
    }

    #[test]
    fn test_arm_rotations_within_limits() {
        let (world, image) = standing();
        let pose = solve_pose(&world, &image, &PoseSolveConfig::default()).unwrap();
        for (upper, lower, hand) in [
            (pose.left_upper_arm, pose.left_lower_arm, pose.left_hand),
            (pose.right_upper_arm, pose.right_lower_arm, pose.right_hand),
        ] {
            assert!((-0.5..=PI).contains(&upper.x));
            assert!((-0.3..=0.3).contains(&lower.x));
            assert!((-0.6..=0.6).contains(&hand.y));
        }
        assert!(pose.left_upper_arm.z.signum() != pose.right_upper_arm.z.signum());
    }

    #[test]
    fn test_hidden_wrist_rests_arm() {
        let (world, mut image) = standing();
        image[RIGHT_WRIST].y = 1.2;
        let pose = solve_pose(&world, &image, &PoseSolveConfig::default()).unwrap();
        assert_eq!(pose.left_upper_arm, Vec3::new(0.0, 0.0, -1.25));
        assert_eq!(pose.left_lower_arm, Vec3::ZERO);
        assert_ne!(pose.right_upper_arm, Vec3::new(0.0, 0.0, 1.25));
    }

    #[test]
    fn test_low_visibility_is_offscreen() {
        let (mut world, image) = standing();
        world[LEFT_WRIST].visibility = Some(0.1);
        let pose = solve_pose(&world, &image, &PoseSolveConfig::default()).unwrap();
        assert_eq!(pose.right_upper_arm, Vec3::new(0.0, 0.0, 1.25));
    }
}
