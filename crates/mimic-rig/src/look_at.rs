//! Look-at - eye bones tracking a point in space
//!
//! The target is a world-space point, independent of the skeleton. Each
//! update the direction from the head to the target is expressed in head
//! space, split into yaw and pitch, and range-mapped onto a small eye
//! rotation.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Input/output range mapping, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookAtConfig {
    /// Head-space yaw that saturates the horizontal output
    pub horizontal_input_deg: f32,
    /// Eye yaw at saturation
    pub horizontal_output_deg: f32,
    /// Head-space pitch that saturates the vertical output
    pub vertical_input_deg: f32,
    /// Eye pitch at saturation
    pub vertical_output_deg: f32,
}

impl Default for LookAtConfig {
    fn default() -> Self {
        Self {
            horizontal_input_deg: 90.0,
            horizontal_output_deg: 10.0,
            vertical_input_deg: 90.0,
            vertical_output_deg: 10.0,
        }
    }
}

/// Look-at state of a rig
#[derive(Debug, Clone)]
pub struct LookAt {
    pub config: LookAtConfig,
    /// World-space point the eyes should track
    pub target: Option<Vec3>,
    /// Applied eye yaw in degrees (positive = toward +X in head space)
    pub yaw: f32,
    /// Applied eye pitch in degrees (positive = up)
    pub pitch: f32,
}

impl LookAt {
    pub fn new(config: LookAtConfig) -> Self {
        Self {
            config,
            target: None,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Compute the eye rotation (relative to the eye rest pose) that looks
    /// from `head_position` toward `target`.
    pub fn solve(&mut self, head_position: Vec3, head_rotation: Quat, target: Vec3) -> Quat {
        let local = head_rotation.inverse() * (target - head_position);
        if local.length_squared() < 1e-12 {
            return self.rotation();
        }

        let yaw = local.x.atan2(local.z).to_degrees();
        let pitch = local
            .y
            .atan2((local.x * local.x + local.z * local.z).sqrt())
            .to_degrees();

        self.yaw = Self::range_map(yaw, self.config.horizontal_input_deg, self.config.horizontal_output_deg);
        self.pitch = Self::range_map(pitch, self.config.vertical_input_deg, self.config.vertical_output_deg);
        self.rotation()
    }

    /// Eye rotation for the currently applied yaw/pitch
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw.to_radians()) * Quat::from_rotation_x(-self.pitch.to_radians())
    }

    fn range_map(angle: f32, input: f32, output: f32) -> f32 {
        if input <= 0.0 {
            return 0.0;
        }
        (angle / input).clamp(-1.0, 1.0) * output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_straight_ahead_is_identity() {
        let mut look_at = LookAt::new(LookAtConfig::default());
        let rotation = look_at.solve(Vec3::ZERO, Quat::IDENTITY, Vec3::new(0.0, 0.0, 2.0));
        assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn test_output_saturates() {
        let mut look_at = LookAt::new(LookAtConfig::default());
        // Directly to the side and slightly behind: yaw beyond the input range
        look_at.solve(Vec3::ZERO, Quat::IDENTITY, Vec3::new(1.0, 0.0, -0.5));
        assert!((look_at.yaw - 10.0).abs() < 1e-4);

        look_at.solve(Vec3::ZERO, Quat::IDENTITY, Vec3::new(0.0, 1.0, 1.0));
        // 45° up maps to half the output
        assert!((look_at.pitch - 5.0).abs() < 1e-3);
        assert!(look_at.yaw.abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_eye_rotation_stays_in_output_range(
            x in -10.0f32..10.0, y in -10.0f32..10.0, z in -10.0f32..10.0, head_yaw in -3.0f32..3.0,
        ) {
            let mut look_at = LookAt::new(LookAtConfig::default());
            let rotation = look_at.solve(Vec3::new(0.0, 1.5, 0.0), Quat::from_rotation_y(head_yaw), Vec3::new(x, y, z));
            prop_assert!(rotation.is_finite());
            prop_assert!(look_at.yaw.abs() <= 10.0 + 1e-4);
            prop_assert!(look_at.pitch.abs() <= 10.0 + 1e-4);
        }
    }
}
