//! Hand solver
//!
//! Wrist orientation comes from the palm plane (wrist, index and little
//! knuckles). Each finger segment gets a single curl angle measured at its
//! joint; the thumb spreads that curl over all three axes.

use std::f32::consts::PI;

use glam::Vec3;
use mimic_core::{MimicResult, Side};

use crate::landmark::{require, HAND_LANDMARKS};
use crate::vector::{angle_between, plane_roll_pitch_yaw};
use crate::{Finger, HandSolution, Landmark, Segment};

const WRIST: usize = 0;
const INDEX_KNUCKLE: usize = 5;
const LITTLE_KNUCKLE: usize = 17;

/// Solve wrist and finger rotations for the anatomical `side`
pub fn solve_hand(landmarks: &[Landmark], side: Side) -> MimicResult<HandSolution> {
    require("hand", landmarks, HAND_LANDMARKS)?;
    let points: Vec<Vec3> = landmarks.iter().map(Landmark::position).collect();

    let mut solution = HandSolution::new(side);
    solution.wrist = palm_rotation(&points, side);
    for finger in Finger::ALL {
        let curls = finger_curls(&points, finger);
        for (segment, curl) in Segment::ALL.into_iter().zip(curls) {
            *solution.finger_mut(finger, segment) = Vec3::new(0.0, 0.0, curl);
        }
    }
    rig_fingers(&mut solution);
    Ok(solution)
}

/// Raw curl of each segment of a finger, independent of side and of any
/// reflection of the hand
pub fn finger_curls(points: &[Vec3], finger: Finger) -> [f32; 3] {
    let [a, b, c, d] = finger.chain();
    [
        angle_between(points[WRIST], points[a], points[b]),
        angle_between(points[a], points[b], points[c]),
        angle_between(points[b], points[c], points[d]),
    ]
}

fn palm_rotation(points: &[Vec3], side: Side) -> Vec3 {
    let (first, second) = match side {
        Side::Right => (LITTLE_KNUCKLE, INDEX_KNUCKLE),
        Side::Left => (INDEX_KNUCKLE, LITTLE_KNUCKLE),
    };
    let mut rotation = plane_roll_pitch_yaw(points[WRIST], points[first], points[second]);
    rotation.y = rotation.z - 0.4;
    rotation
}

#[inline]
fn invert(side: Side) -> f32 {
    match side {
        Side::Right => 1.0,
        Side::Left => -1.0,
    }
}

/// Scale raw angles into rig space and clamp to human limits
fn rig_fingers(hand: &mut HandSolution) {
    let side = hand.side;
    let invert = invert(side);
    let right = side == Side::Right;

    hand.wrist.x = (hand.wrist.x * 2.0 * invert).clamp(-0.3, 0.3);
    hand.wrist.y = (hand.wrist.y * 2.3).clamp(if right { -1.2 } else { -0.6 }, if right { 0.6 } else { 1.6 });
    hand.wrist.z *= -2.3 * invert;

    for finger in Finger::ALL {
        for segment in Segment::ALL {
            let tracked = hand.finger_mut(finger, segment);
            if finger == Finger::Thumb {
                *tracked = rig_thumb(tracked.z, segment, side);
            } else {
                let (min, max) = if right { (-PI, 0.0) } else { (0.0, PI) };
                tracked.z = (tracked.z * -PI * invert).clamp(min, max);
            }
        }
    }
}

fn rig_thumb(curl: f32, segment: Segment, side: Side) -> Vec3 {
    let invert = invert(side);
    let right = side == Side::Right;

    let dampener = match segment {
        Segment::Proximal => Vec3::new(2.2, 2.2, 0.5),
        Segment::Intermediate => Vec3::new(0.0, 0.7, 0.5),
        Segment::Distal => Vec3::new(0.0, 1.0, 0.5),
    };
    let start = match segment {
        Segment::Proximal => Vec3::new(1.2, 1.1 * invert, 0.2 * invert),
        Segment::Intermediate | Segment::Distal => Vec3::new(-0.2, 0.1 * invert, 0.2 * invert),
    };
    let bent = curl * -PI;

    let x = start.x + bent * dampener.x;
    let y = start.y + bent * dampener.y * invert;
    let z = start.z + bent * dampener.z * invert;

    match segment {
        Segment::Proximal => Vec3::new(
            x.clamp(-0.6, 0.3),
            y.clamp(if right { -1.0 } else { -0.3 }, if right { 0.3 } else { 1.0 }),
            z.clamp(if right { -0.6 } else { -0.3 }, if right { 0.3 } else { 0.6 }),
        ),
        Segment::Intermediate | Segment::Distal => {
            Vec3::new(x.clamp(-2.0, 2.0), y.clamp(-2.0, 2.0), z.clamp(-2.0, 2.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mirror_landmarks, HandJoint};
    use proptest::prelude::*;

    /// An open right hand, palm facing the camera, fingers up
    fn open_hand() -> Vec<Landmark> {
        let mut lm = vec![Landmark::new(0.5, 0.8, 0.0)];
        for (k, finger) in Finger::ALL.iter().enumerate() {
            let x = 0.42 + 0.04 * k as f32;
            let spread = if *finger == Finger::Thumb { -0.03 } else { 0.0 };
            for j in 0..4 {
                lm.push(Landmark::new(x + spread * j as f32, 0.7 - 0.05 * j as f32, 0.0));
            }
        }
        lm
    }

    fn curled(mut lm: Vec<Landmark>, finger: Finger) -> Vec<Landmark> {
        let [a, b, c, d] = finger.chain();
        let base = lm[a];
        lm[b] = Landmark::new(base.x, base.y - 0.04, -0.04);
        lm[c] = Landmark::new(base.x, base.y - 0.01, -0.07);
        lm[d] = Landmark::new(base.x, base.y + 0.02, -0.05);
        lm
    }

    #[test]
    fn test_too_few_landmarks() {
        assert!(solve_hand(&open_hand()[..20], Side::Right).is_err());
    }

    #[test]
    fn test_open_fingers_are_straight() {
        let hand = solve_hand(&open_hand(), Side::Right).unwrap();
        let middle = hand.rotation(HandJoint::Finger(Finger::Middle, Segment::Intermediate));
        assert!(middle.z.abs() < 1e-2);
        assert!(hand.wrist.is_finite());
    }

    #[test]
    fn test_curl_sign_follows_side() {
        let lm = curled(open_hand(), Finger::Index);
        let right = solve_hand(&lm, Side::Right).unwrap();
        let left = solve_hand(&lm, Side::Left).unwrap();

        let r = right.finger(Finger::Index, Segment::Intermediate).z;
        let l = left.finger(Finger::Index, Segment::Intermediate).z;
        assert!(r < -0.1, "{r}");
        assert!((l + r).abs() < 1e-5);
    }

    #[test]
    fn test_thumb_uses_all_axes() {
        let hand = solve_hand(&open_hand(), Side::Left).unwrap();
        let thumb = hand.finger(Finger::Thumb, Segment::Proximal);
        assert!(thumb.x != 0.0 && thumb.y != 0.0);
    }

    proptest! {
        #[test]
        fn prop_finger_curls_survive_mirroring(
            coords in proptest::collection::vec((0u8..=64, 0u8..=64, -8i8..=8), 21),
        ) {
            // Coordinates on a 1/64 grid so that x -> 1 - x is exact
            let lm: Vec<Landmark> = coords
                .iter()
                .map(|&(x, y, z)| Landmark::new(x as f32 / 64.0, y as f32 / 64.0, z as f32 / 64.0))
                .collect();
            let mirrored = mirror_landmarks(&lm);

            let direct = solve_hand(&lm, Side::Right).unwrap();
            let flipped = solve_hand(&mirrored, Side::Right).unwrap();

            for finger in Finger::ALL {
                for segment in Segment::ALL {
                    let a = direct.finger(finger, segment);
                    let b = flipped.finger(finger, segment);
                    prop_assert!(a.abs_diff_eq(b, 1e-6), "{:?} {:?}: {} vs {}", finger, segment, a, b);
                }
            }
        }
    }
}
