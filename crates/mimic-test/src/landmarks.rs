//! Synthetic landmark generators
//!
//! Detector-shaped landmark sets built from a handful of intuitive
//! parameters, with optional uniform jitter standing in for detection
//! noise. Face geometry is calibrated against a 640x480 source so that the
//! parameters come back out of the solver (mouth opening as the A shape,
//! eye openness, pupil offset).

use glam::{Vec2, Vec3};
use mimic_solve::{Landmark, RawLandmarkFrame, FACE_LANDMARKS, FACE_LANDMARKS_WITH_IRIS, HAND_LANDMARKS, POSE_LANDMARKS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const IMAGE_WIDTH: f32 = 640.0;
const IMAGE_HEIGHT: f32 = 480.0;

// Face mesh indices read by the face solver
const FACE_PLANE: [usize; 4] = [21, 251, 397, 172];
const LEFT_EYE: [usize; 8] = [130, 133, 160, 159, 158, 144, 145, 153];
const RIGHT_EYE: [usize; 8] = [263, 362, 387, 386, 385, 373, 374, 380];
const LEFT_PUPIL: usize = 468;
const RIGHT_PUPIL: usize = 473;
const UPPER_INNER_LIP: usize = 13;
const LOWER_INNER_LIP: usize = 14;
const MOUTH_CORNERS: [usize; 2] = [61, 291];

const EYE_HALF_WIDTH: f32 = 0.04;
const EYE_Y: f32 = 0.45;
const MOUTH_Y: f32 = 0.62;

/// Face expression to synthesize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceParams {
    /// Target A mouth shape, 0 = closed
    pub mouth_open: f32,
    pub left_eye_open: f32,
    pub right_eye_open: f32,
    /// Pupil offset in solver units; `None` produces a mesh without iris
    pub pupil: Option<Vec2>,
}

impl Default for FaceParams {
    fn default() -> Self {
        Self {
            mouth_open: 0.0,
            left_eye_open: 1.0,
            right_eye_open: 1.0,
            pupil: None,
        }
    }
}

/// Upper body to synthesize, subject facing the camera
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseParams {
    /// Outward raise of the detector-left arm, radians from hanging
    pub left_arm_raise: f32,
    /// Outward raise of the detector-right arm
    pub right_arm_raise: f32,
}

/// Which categories one synthetic detection carries
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaptureParams {
    pub face: Option<FaceParams>,
    pub pose: Option<PoseParams>,
    /// Finger curl (0..1) of the hand on the image's left
    pub image_left_hand: Option<f32>,
    /// Finger curl of the hand on the image's right
    pub image_right_hand: Option<f32>,
}

impl CaptureParams {
    /// Every category present, neutral
    pub fn full() -> Self {
        Self {
            face: Some(FaceParams::default()),
            pose: Some(PoseParams::default()),
            image_left_hand: Some(0.0),
            image_right_hand: Some(0.0),
        }
    }
}

/// Seeded landmark source
#[derive(Debug, Clone)]
pub struct LandmarkGenerator {
    rng: StdRng,
    /// Uniform jitter amplitude in normalized image units
    noise: f32,
}

impl LandmarkGenerator {
    pub fn new(seed: u64, noise: f32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            noise,
        }
    }

    /// Generator without jitter
    pub fn exact() -> Self {
        Self::new(0, 0.0)
    }

    pub fn face(&mut self, params: &FaceParams) -> Vec<Landmark> {
        let face = synthetic_face(params);
        self.jitter(face)
    }

    pub fn hand(&mut self, x0: f32, curl: f32) -> Vec<Landmark> {
        let hand = synthetic_hand(x0, curl);
        self.jitter(hand)
    }

    /// World and image pose sets
    pub fn pose(&mut self, params: &PoseParams) -> (Vec<Landmark>, Vec<Landmark>) {
        let (world, image) = synthetic_pose(params);
        (world, self.jitter(image))
    }

    /// One detection callback's worth of landmarks
    pub fn frame(&mut self, params: &CaptureParams) -> RawLandmarkFrame {
        let (pose_world, pose) = match params.pose.as_ref().map(|p| self.pose(p)) {
            Some((world, image)) => (Some(world), Some(image)),
            None => (None, None),
        };
        RawLandmarkFrame {
            face: params.face.as_ref().map(|f| self.face(f)),
            pose,
            pose_world,
            left_hand: params.image_left_hand.map(|curl| self.hand(0.25, curl)),
            right_hand: params.image_right_hand.map(|curl| self.hand(0.65, curl)),
        }
    }

    fn jitter(&mut self, mut landmarks: Vec<Landmark>) -> Vec<Landmark> {
        if self.noise > 0.0 {
            for lm in &mut landmarks {
                lm.x += self.rng.gen_range(-self.noise..=self.noise);
                lm.y += self.rng.gen_range(-self.noise..=self.noise);
            }
        }
        landmarks
    }
}

/// Frontal face mesh. Only the indices the solver reads carry geometry.
pub fn synthetic_face(params: &FaceParams) -> Vec<Landmark> {
    let count = if params.pupil.is_some() {
        FACE_LANDMARKS_WITH_IRIS
    } else {
        FACE_LANDMARKS
    };
    let mut lm = vec![Landmark::new(0.5, 0.5, 0.0); count];
    let mut set = |idx: usize, x: f32, y: f32| lm[idx] = Landmark::new(x, y, 0.0);

    for (idx, (x, y)) in FACE_PLANE.into_iter().zip([(0.35, 0.35), (0.65, 0.35), (0.62, 0.70), (0.38, 0.70)]) {
        set(idx, x, y);
    }

    let eye_width_px = 2.0 * EYE_HALF_WIDTH * IMAGE_WIDTH;
    for (eye, cx, open) in [
        (&LEFT_EYE, 0.40, params.left_eye_open),
        (&RIGHT_EYE, 0.60, params.right_eye_open),
    ] {
        set(eye[0], cx - EYE_HALF_WIDTH, EYE_Y);
        set(eye[1], cx + EYE_HALF_WIDTH, EYE_Y);
        // Openness maps linearly onto the lid ratio between the blink
        // thresholds, in units of the widest natural lid ratio
        let ratio = 0.25 + open.clamp(0.0, 1.0) * 0.5;
        let gap = ratio * 0.285 * eye_width_px / IMAGE_HEIGHT;
        for k in 0..3 {
            let x = cx - EYE_HALF_WIDTH / 2.0 + EYE_HALF_WIDTH / 2.0 * k as f32;
            set(eye[2 + k], x, EYE_Y - gap / 2.0);
            set(eye[5 + k], x, EYE_Y + gap / 2.0);
        }
    }

    // With a narrow mouth the A shape equals the opening remapped from
    // [0.17, 0.5] of the inner eye distance
    let inner_eye_px = 0.2 * IMAGE_WIDTH;
    let opening = if params.mouth_open > 0.0 {
        (0.17 + params.mouth_open.clamp(0.0, 1.0) * 0.33) * inner_eye_px / IMAGE_HEIGHT
    } else {
        0.0
    };
    set(UPPER_INNER_LIP, 0.5, MOUTH_Y);
    set(LOWER_INNER_LIP, 0.5, MOUTH_Y + opening);
    set(MOUTH_CORNERS[0], 0.45, MOUTH_Y);
    set(MOUTH_CORNERS[1], 0.55, MOUTH_Y);

    if let Some(pupil) = params.pupil {
        for (cx, idx) in [(0.40, LEFT_PUPIL), (0.60, RIGHT_PUPIL)] {
            let x_px = cx * IMAGE_WIDTH - pupil.x * eye_width_px / 8.0;
            let y_px = EYE_Y * IMAGE_HEIGHT - eye_width_px * 0.075 - pupil.y * eye_width_px / 16.0;
            set(idx, x_px / IMAGE_WIDTH, y_px / IMAGE_HEIGHT);
        }
    }
    lm
}

/// Right-way-up hand, palm to the camera. `curl` bends the four fingers
/// toward the palm, 1 being a loose fist.
pub fn synthetic_hand(x0: f32, curl: f32) -> Vec<Landmark> {
    const SEGMENT: f32 = 0.05;
    let bend = curl.clamp(0.0, 1.0) * std::f32::consts::FRAC_PI_3;

    let mut lm = Vec::with_capacity(HAND_LANDMARKS);
    lm.push(Landmark::new(x0 + 0.08, 0.8, 0.0));
    for k in 0..5 {
        let x = x0 + 0.04 * k as f32;
        if k == 0 {
            // Thumb splays out and stays open
            for j in 0..4 {
                lm.push(Landmark::new(x - 0.03 * j as f32, 0.7 - 0.05 * j as f32, 0.0));
            }
            continue;
        }
        let mut point = Vec3::new(x, 0.7, 0.0);
        lm.push(Landmark::new(point.x, point.y, point.z));
        for j in 0..3 {
            let angle = bend * (j + 1) as f32;
            point += Vec3::new(0.0, -angle.cos(), -angle.sin()) * SEGMENT;
            lm.push(Landmark::new(point.x, point.y, point.z));
        }
    }
    lm
}

/// Standing upper body, world units in metres with y down and the origin
/// between the hips
pub fn synthetic_pose(params: &PoseParams) -> (Vec<Landmark>, Vec<Landmark>) {
    const VISIBLE: f32 = 0.99;
    let to_image = |w: Vec3| Vec2::new(0.5 + w.x * 0.667, 0.62 + w.y * 0.711);

    let mut world = vec![Landmark::new(0.0, 0.0, 0.0).with_visibility(VISIBLE); POSE_LANDMARKS];
    let mut image = vec![Landmark::new(0.5, 0.5, 0.0).with_visibility(VISIBLE); POSE_LANDMARKS];
    let mut place = |idx: usize, w: Vec3| {
        let i = to_image(w);
        world[idx] = Landmark::new(w.x, w.y, w.z).with_visibility(VISIBLE);
        image[idx] = Landmark::new(i.x, i.y, 0.0).with_visibility(VISIBLE);
    };

    place(23, Vec3::new(0.10, 0.0, 0.0));
    place(24, Vec3::new(-0.10, 0.0, 0.0));

    // (shoulder, elbow, wrist, pinky, index), outward sign, raise
    for (joints, sign, raise) in [
        ([11, 13, 15, 17, 19], 1.0, params.left_arm_raise),
        ([12, 14, 16, 18, 20], -1.0, params.right_arm_raise),
    ] {
        let shoulder = Vec3::new(0.18 * sign, -0.45, 0.0);
        let direction = Vec3::new(raise.sin() * sign, raise.cos(), 0.0);
        let elbow = shoulder + direction * 0.25;
        let wrist = elbow + direction * 0.22;
        place(joints[0], shoulder);
        place(joints[1], elbow);
        place(joints[2], wrist);
        place(joints[3], wrist + direction * 0.04 - Vec3::X * 0.01 * sign);
        place(joints[4], wrist + direction * 0.05 + Vec3::X * 0.01 * sign);
    }
    (world, image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::Side;
    use mimic_solve::{solve_face, solve_hand, solve_pose, FaceSolveConfig, Finger, PoseSolveConfig, Segment};

    #[test]
    fn test_mouth_opening_round_trips() {
        for target in [0.2, 0.5, 0.8] {
            let face = synthetic_face(&FaceParams {
                mouth_open: target,
                ..Default::default()
            });
            let solved = solve_face(&face, &FaceSolveConfig::default()).unwrap();
            assert!((solved.mouth.shape.a - target).abs() < 1e-3, "{target}: {:?}", solved.mouth.shape);
            assert_eq!(solved.mouth.shape.i, 0.0);
        }
    }

    #[test]
    fn test_eye_openness_round_trips() {
        let face = synthetic_face(&FaceParams {
            left_eye_open: 0.0,
            right_eye_open: 0.6,
            ..Default::default()
        });
        let solved = solve_face(&face, &FaceSolveConfig::default()).unwrap();
        assert!(solved.eye.left < 1e-3);
        assert!((solved.eye.right - 0.6).abs() < 1e-3);
    }

    #[test]
    fn test_pupil_round_trips() {
        let face = synthetic_face(&FaceParams {
            pupil: Some(Vec2::new(0.5, -0.25)),
            ..Default::default()
        });
        let pupil = solve_face(&face, &FaceSolveConfig::default()).unwrap().pupil.unwrap();
        assert!(pupil.abs_diff_eq(Vec2::new(0.5, -0.25), 1e-3), "{pupil:?}");
    }

    #[test]
    fn test_curl_bends_fingers() {
        let open = solve_hand(&synthetic_hand(0.4, 0.0), Side::Right).unwrap();
        let fist = solve_hand(&synthetic_hand(0.4, 1.0), Side::Right).unwrap();
        let open_curl = open.finger(Finger::Index, Segment::Intermediate).z.abs();
        let fist_curl = fist.finger(Finger::Index, Segment::Intermediate).z.abs();
        assert!(fist_curl > open_curl + 0.1, "open {open_curl}, fist {fist_curl}");
    }

    #[test]
    fn test_pose_solves() {
        let (world, image) = synthetic_pose(&PoseParams {
            left_arm_raise: 1.2,
            ..Default::default()
        });
        let pose = solve_pose(&world, &image, &PoseSolveConfig::default()).unwrap();
        assert!(pose.right_upper_arm.is_finite());
        assert_ne!(pose.right_upper_arm, pose.left_upper_arm);
    }

    #[test]
    fn test_noise_is_seeded() {
        let params = CaptureParams::full();
        let a = LandmarkGenerator::new(7, 0.002).frame(&params);
        let b = LandmarkGenerator::new(7, 0.002).frame(&params);
        assert_eq!(a.face, b.face);
        assert_eq!(a.left_hand, b.left_hand);
        assert_ne!(a.face, LandmarkGenerator::exact().frame(&params).face);
    }
}
