//! Raw landmark detections

use glam::Vec3;
use mimic_core::{MimicError, MimicResult};
use serde::{Deserialize, Serialize};

/// Face mesh without iris refinement
pub const FACE_LANDMARKS: usize = 468;
/// Face mesh with the ten iris points appended
pub const FACE_LANDMARKS_WITH_IRIS: usize = 478;
pub const POSE_LANDMARKS: usize = 33;
pub const HAND_LANDMARKS: usize = 21;

/// One detected point. Image landmarks are normalized to [0, 1] with `z`
/// relative to the image width; world landmarks are metres around the hips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Horizontally flipped copy, as seen through a mirrored capture
    pub fn mirrored(&self) -> Self {
        Self {
            x: 1.0 - self.x,
            ..*self
        }
    }
}

/// Flip every landmark of a set horizontally
pub fn mirror_landmarks(landmarks: &[Landmark]) -> Vec<Landmark> {
    landmarks.iter().map(Landmark::mirrored).collect()
}

/// Check a landmark set has at least `expected` points
pub(crate) fn require(category: &'static str, landmarks: &[Landmark], expected: usize) -> MimicResult<()> {
    if landmarks.len() < expected {
        return Err(MimicError::MissingLandmarks {
            category,
            expected,
            actual: landmarks.len(),
        });
    }
    Ok(())
}

/// One detection callback's worth of landmarks. Any subset may be absent.
/// Hand sets are labelled by the side of the image they appear on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLandmarkFrame {
    pub face: Option<Vec<Landmark>>,
    /// Normalized image-space body landmarks
    pub pose: Option<Vec<Landmark>>,
    /// World-space body landmarks
    pub pose_world: Option<Vec<Landmark>>,
    pub left_hand: Option<Vec<Landmark>>,
    pub right_hand: Option<Vec<Landmark>>,
}

impl RawLandmarkFrame {
    pub fn is_empty(&self) -> bool {
        self.face.is_none()
            && self.pose.is_none()
            && self.pose_world.is_none()
            && self.left_hand.is_none()
            && self.right_hand.is_none()
    }
}

/// The attached camera stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    pub width: u32,
    pub height: u32,
}

impl VideoSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_flips_x_only() {
        let lm = Landmark::new(0.2, 0.4, -0.1).with_visibility(0.9);
        let m = lm.mirrored();
        assert!((m.x - 0.8).abs() < 1e-6);
        assert_eq!(m.y, 0.4);
        assert_eq!(m.z, -0.1);
        assert_eq!(m.visibility, Some(0.9));
    }

    #[test]
    fn test_require_counts() {
        let set = vec![Landmark::default(); 20];
        assert_eq!(
            require("hand", &set, HAND_LANDMARKS),
            Err(MimicError::MissingLandmarks {
                category: "hand",
                expected: 21,
                actual: 20
            })
        );
        assert!(require("hand", &set, 20).is_ok());
    }
}
