//! Avatar configuration

use glam::Vec3;
use mimic_core::{MimicError, MimicResult};
use mimic_rig::LookAtConfig;
use mimic_solve::AdapterConfig;
use serde::{Deserialize, Serialize};

use crate::ClockConfig;

/// Smoothing rates (per second) and gaze mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Expression channels, tracked and manual alike
    pub expression_rate: f32,
    /// Look-at target
    pub gaze_rate: f32,
    /// Head, torso and arm bones
    pub body_rate: f32,
    /// Wrist and finger bones
    pub hand_rate: f32,
    /// Camera-space gaze destination: x and y scale the pupil offset, z is
    /// a fixed depth
    pub gaze_scale: Vec3,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            expression_rate: 12.0,
            gaze_rate: 5.0,
            body_rate: 5.0,
            hand_rate: 2.0,
            gaze_scale: Vec3::new(-2.0, 2.0, 0.0),
        }
    }
}

/// Everything tunable about one avatar
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub blend: BlendConfig,
    pub adapter: AdapterConfig,
    pub look_at: LookAtConfig,
    pub clock: ClockConfig,
}

impl AvatarConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> MimicResult<Self> {
        let config: AvatarConfig =
            serde_json::from_str(json).map_err(|e| MimicError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> MimicResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MimicError::InvalidConfig(e.to_string()))
    }

    /// Reject values that would stall or invert the smoothing
    pub fn validate(&self) -> MimicResult<()> {
        let rates = [
            ("blend.expression_rate", self.blend.expression_rate),
            ("blend.gaze_rate", self.blend.gaze_rate),
            ("blend.body_rate", self.blend.body_rate),
            ("blend.hand_rate", self.blend.hand_rate),
            ("clock.max_delta", self.clock.max_delta),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value <= 0.0 {
                return Err(MimicError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        let [low, high] = self.adapter.face.blink_thresholds;
        if low >= high {
            return Err(MimicError::InvalidConfig(format!(
                "adapter.face.blink_thresholds must be increasing, got [{low}, {high}]"
            )));
        }
        Ok(())
    }
}
