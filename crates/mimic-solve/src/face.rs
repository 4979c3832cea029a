//! Face solver
//!
//! Works on the 468-point face mesh, or the 478-point mesh with iris
//! refinement. Landmarks are scaled by the image size first so that ratios
//! are measured in pixel space rather than on a non-square unit image.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use mimic_core::{lerp, remap01, MimicError, MimicResult};
use serde::{Deserialize, Serialize};

use crate::landmark::{require, FACE_LANDMARKS, FACE_LANDMARKS_WITH_IRIS};
use crate::vector::{distance_2d, finite_or_zero, plane_roll_pitch_yaw};
use crate::{EyeOpenness, FaceSolution, HeadSolution, Landmark, MouthShape, MouthSolution, VideoSource};

/// Face plane corners: top left, top right, bottom right, bottom left
const FACE_PLANE: [usize; 4] = [21, 251, 397, 172];

/// Outer corner, inner corner, upper lid (outer, mid, inner),
/// lower lid (outer, mid, inner)
const LEFT_EYE: [usize; 8] = [130, 133, 160, 159, 158, 144, 145, 153];
const RIGHT_EYE: [usize; 8] = [263, 362, 387, 386, 385, 373, 374, 380];
const LEFT_BROW: [usize; 8] = [35, 244, 63, 105, 66, 229, 230, 231];
const RIGHT_BROW: [usize; 8] = [265, 464, 293, 334, 296, 449, 450, 451];
const LEFT_PUPIL: usize = 468;
const RIGHT_PUPIL: usize = 473;

const UPPER_INNER_LIP: usize = 13;
const LOWER_INNER_LIP: usize = 14;
const MOUTH_CORNER_LEFT: usize = 61;
const MOUTH_CORNER_RIGHT: usize = 291;

/// Lid-to-width ratio of a wide open eye
const MAX_EYE_RATIO: f32 = 0.285;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceSolveConfig {
    /// Image size the normalized landmarks are scaled by
    pub image_width: f32,
    pub image_height: f32,
    /// Eye openness ratio mapped to fully closed / fully open
    pub blink_thresholds: [f32; 2],
    /// Couple the two eyes so single-eye noise does not read as a wink
    pub smooth_blink: bool,
}

impl Default for FaceSolveConfig {
    fn default() -> Self {
        Self {
            image_width: 640.0,
            image_height: 480.0,
            blink_thresholds: [0.25, 0.75],
            smooth_blink: false,
        }
    }
}

impl FaceSolveConfig {
    /// Same settings measured against an attached video's frame size
    pub fn for_video(&self, video: VideoSource) -> Self {
        Self {
            image_width: video.width as f32,
            image_height: video.height as f32,
            ..*self
        }
    }
}

/// Solve head rotation, eyes, pupils, brows and mouth from a face mesh
pub fn solve_face(landmarks: &[Landmark], config: &FaceSolveConfig) -> MimicResult<FaceSolution> {
    require("face", landmarks, FACE_LANDMARKS)?;
    if landmarks.len() != FACE_LANDMARKS && landmarks.len() != FACE_LANDMARKS_WITH_IRIS {
        return Err(MimicError::MissingLandmarks {
            category: "face",
            expected: FACE_LANDMARKS_WITH_IRIS,
            actual: landmarks.len(),
        });
    }

    let scale = Vec3::new(config.image_width, config.image_height, config.image_width);
    let points: Vec<Vec3> = landmarks.iter().map(|lm| lm.position() * scale).collect();
    let iris = points.len() == FACE_LANDMARKS_WITH_IRIS;

    let head = solve_head(&points);
    let [low, high] = config.blink_thresholds;
    let mut eye = EyeOpenness {
        left: eye_open(&points, &LEFT_EYE, low, high),
        right: eye_open(&points, &RIGHT_EYE, low, high),
    };
    if config.smooth_blink {
        eye = stabilize_blink(eye, head.rotation.y);
    }

    Ok(FaceSolution {
        head,
        eye,
        brow: if iris { brow_raise(&points) } else { 0.0 },
        pupil: iris.then(|| pupils(&points)),
        mouth: solve_mouth(&points),
    })
}

fn solve_head(points: &[Vec3]) -> HeadSolution {
    let [tl, tr, br, bl] = FACE_PLANE.map(|idx| points[idx]);
    let bottom = br.lerp(bl, 0.5);

    let mut normalized = plane_roll_pitch_yaw(tl, tr, bottom);
    normalized.x = -normalized.x;
    normalized.z = -normalized.z;

    let top = tl.lerp(tr, 0.5);
    HeadSolution {
        rotation: normalized * PI,
        normalized,
        width: tl.distance(tr),
        height: top.distance(bottom),
        position: top.lerp(bottom, 0.5),
    }
}

/// Average lid gap over eye width, measured in the image plane
fn lid_ratio(points: &[Vec3], idx: &[usize; 8]) -> f32 {
    let width = distance_2d(points[idx[0]], points[idx[1]]);
    let outer = distance_2d(points[idx[2]], points[idx[5]]);
    let mid = distance_2d(points[idx[3]], points[idx[6]]);
    let inner = distance_2d(points[idx[4]], points[idx[7]]);
    finite_or_zero((outer + mid + inner) / 3.0 / width)
}

fn eye_open(points: &[Vec3], idx: &[usize; 8], low: f32, high: f32) -> f32 {
    let ratio = (lid_ratio(points, idx) / MAX_EYE_RATIO).clamp(0.0, 2.0);
    finite_or_zero(remap01(ratio, low, high))
}

/// Couple both eyes unless one is clearly winking; when the head is turned
/// far, trust the eye facing the camera
fn stabilize_blink(eye: EyeOpenness, head_yaw: f32) -> EyeOpenness {
    const MAX_ROTATION: f32 = 0.5;
    const WINK_THRESHOLD: f32 = 0.8;

    let left = eye.left.clamp(0.0, 1.0);
    let right = eye.right.clamp(0.0, 1.0);

    if head_yaw > MAX_ROTATION {
        return EyeOpenness { left: right, right };
    }
    if head_yaw < -MAX_ROTATION {
        return EyeOpenness { left, right: left };
    }

    let closing = left < 0.3 && right < 0.3;
    let open = left > 0.6 && right > 0.6;
    if (left - right).abs() >= WINK_THRESHOLD && !closing && !open {
        return EyeOpenness { left, right };
    }
    let coupled = if right > left {
        lerp(right, left, 0.95)
    } else {
        lerp(right, left, 0.05)
    };
    EyeOpenness {
        left: coupled,
        right: coupled,
    }
}

fn pupil_offset(points: &[Vec3], eye: &[usize; 8], pupil: usize) -> Vec2 {
    let outer = points[eye[0]];
    let inner = points[eye[1]];
    let width = distance_2d(outer, inner);
    let mid = outer.lerp(inner, 0.5);
    let pupil = points[pupil];

    let dx = mid.x - pupil.x;
    let dy = mid.y - width * 0.075 - pupil.y;
    Vec2::new(
        finite_or_zero(dx / (width / 2.0) * 4.0),
        finite_or_zero(dy / (width / 4.0) * 4.0),
    )
}

fn pupils(points: &[Vec3]) -> Vec2 {
    (pupil_offset(points, &LEFT_EYE, LEFT_PUPIL) + pupil_offset(points, &RIGHT_EYE, RIGHT_PUPIL)) * 0.5
}

fn brow_raise(points: &[Vec3]) -> f32 {
    const MAX_BROW_RATIO: f32 = 1.15;
    const BROW_HIGH: f32 = 0.125;
    const BROW_LOW: f32 = 0.07;

    let side = |idx: &[usize; 8]| {
        let ratio = lid_ratio(points, idx) / MAX_BROW_RATIO - 1.0;
        remap01(ratio, BROW_LOW, BROW_HIGH)
    };
    finite_or_zero((side(&LEFT_BROW) + side(&RIGHT_BROW)) / 2.0)
}

fn solve_mouth(points: &[Vec3]) -> MouthSolution {
    let eye_inner = points[LEFT_EYE[1]].distance(points[RIGHT_EYE[1]]);
    let eye_outer = points[LEFT_EYE[0]].distance(points[RIGHT_EYE[0]]);
    let open = points[UPPER_INNER_LIP].distance(points[LOWER_INNER_LIP]);
    let width = points[MOUTH_CORNER_LEFT].distance(points[MOUTH_CORNER_RIGHT]);

    let ratio_y = remap01(open / eye_inner, 0.15, 0.7);
    let ratio_x = (remap01(width / eye_outer, 0.45, 0.9) - 0.3) * 2.0;

    let mouth_x = ratio_x;
    let mouth_y = remap01(open / eye_inner, 0.17, 0.5);

    let i = (remap01(mouth_x, 0.0, 1.0) * 2.0 * remap01(mouth_y, 0.2, 0.7)).clamp(0.0, 1.0);
    let a = mouth_y * 0.4 + mouth_y * (1.0 - i) * 0.6;
    let u = mouth_y * remap01(1.0 - i, 0.0, 0.3) * 0.1;
    let e = remap01(u, 0.2, 1.0) * (1.0 - i) * 0.3;
    let o = (1.0 - i) * remap01(mouth_y, 0.3, 1.0) * 0.4;

    MouthSolution {
        x: finite_or_zero(ratio_x),
        y: finite_or_zero(ratio_y),
        shape: MouthShape {
            a: finite_or_zero(a),
            e: finite_or_zero(e),
            i: finite_or_zero(i),
            o: finite_or_zero(o),
            u: finite_or_zero(u),
        },
    }
}
