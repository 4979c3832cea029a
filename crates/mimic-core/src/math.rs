//! Smoothing and axis remapping
//!
//! Tracking data is noisy, so nothing snaps: every output moves a fraction
//! `delta * rate` of the remaining distance toward its target each frame.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Fraction of the remaining distance covered this frame.
/// Clamped to [0, 1] so a long stall never overshoots the target.
#[inline]
pub fn damp_factor(delta: f32, rate: f32) -> f32 {
    (delta * rate).clamp(0.0, 1.0)
}

/// Scalar linear interpolation
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Clamp `value` into [min, max] and rescale to [0, 1]
#[inline]
pub fn remap01(value: f32, min: f32, max: f32) -> f32 {
    (value.clamp(min, max) - min) / (max - min)
}

/// Frames needed for a geometric lerp at `delta * rate` to come within
/// `tolerance` (as a fraction of the initial distance) of its target.
pub fn convergence_frames(delta: f32, rate: f32, tolerance: f32) -> u32 {
    let t = damp_factor(delta, rate);
    if t >= 1.0 {
        return 1;
    }
    if t <= 0.0 {
        return u32::MAX;
    }
    (tolerance.ln() / (1.0 - t).ln()).ceil() as u32
}

/// Build a quaternion from Euler angles applied in intrinsic X, Y, Z order
/// (`Rx * Ry * Rz`).
#[inline]
pub fn euler_xyz(euler: Vec3) -> Quat {
    Quat::from_rotation_x(euler.x) * Quat::from_rotation_y(euler.y) * Quat::from_rotation_z(euler.z)
}

/// Cartesian axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn pick(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

/// Per-axis permutation and scale applied to a solved Euler rotation before
/// it is written to a bone: `out[i] = scale[i] * in[source[i]]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisMap {
    pub source: [Axis; 3],
    pub scale: [f32; 3],
}

impl AxisMap {
    pub const IDENTITY: AxisMap = AxisMap::uniform(1.0);

    /// Keep axis order, scale every axis by `factor`
    pub const fn uniform(factor: f32) -> Self {
        AxisMap {
            source: [Axis::X, Axis::Y, Axis::Z],
            scale: [factor, factor, factor],
        }
    }

    pub const fn new(source: [Axis; 3], scale: [f32; 3]) -> Self {
        AxisMap { source, scale }
    }

    #[inline]
    pub fn apply(&self, euler: Vec3) -> Vec3 {
        Vec3::new(
            self.scale[0] * self.source[0].pick(euler),
            self.scale[1] * self.source[1].pick(euler),
            self.scale[2] * self.source[2].pick(euler),
        )
    }

    /// Same permutation with every scale negated
    pub fn negated(&self) -> AxisMap {
        AxisMap {
            source: self.source,
            scale: [-self.scale[0], -self.scale[1], -self.scale[2]],
        }
    }
}

impl Default for AxisMap {
    fn default() -> Self {
        AxisMap::IDENTITY
    }
}
