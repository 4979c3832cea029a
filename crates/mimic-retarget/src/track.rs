//! Keyframe tracks and sampling

use glam::{Quat, Vec3};
use mimic_core::{MimicError, MimicResult};

/// Keyframed values over time. `times` are strictly non-decreasing seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes<T> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

pub type RotationKeys = Keyframes<Quat>;
pub type TranslationKeys = Keyframes<Vec3>;

impl<T: Copy> Keyframes<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>) -> MimicResult<Self> {
        if times.len() != values.len() {
            return Err(MimicError::InvalidClip(format!(
                "{} key times for {} values",
                times.len(),
                values.len()
            )));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(MimicError::InvalidClip(format!("non-finite key time {bad}")));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(MimicError::InvalidClip("key times out of order".into()));
        }
        Ok(Self { times, values })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time of the last key
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Apply `f` to every value, keeping the key times
    pub fn map(&self, f: impl Fn(T) -> T) -> Self {
        Self {
            times: self.times.clone(),
            values: self.values.iter().copied().map(f).collect(),
        }
    }

    /// Bracketing keys and blend weight for time `t`
    fn locate(&self, t: f32) -> Option<(usize, usize, f32)> {
        let last = self.times.len().checked_sub(1)?;
        if t <= self.times[0] {
            return Some((0, 0, 0.0));
        }
        if t >= self.times[last] {
            return Some((last, last, 0.0));
        }
        if t.is_nan() {
            return Some((0, 0, 0.0));
        }
        let next = self.times.partition_point(|&key| key <= t).clamp(1, last);
        let prev = next - 1;
        let span = self.times[next] - self.times[prev];
        let weight = if span > 0.0 {
            (t - self.times[prev]) / span
        } else {
            0.0
        };
        Some((prev, next, weight))
    }
}

impl Keyframes<Quat> {
    /// Spherically interpolated rotation at time `t`, clamped to the ends
    pub fn sample(&self, t: f32) -> Option<Quat> {
        let (a, b, w) = self.locate(t)?;
        Some(self.values[a].slerp(self.values[b], w))
    }
}

impl Keyframes<Vec3> {
    /// Linearly interpolated translation at time `t`, clamped to the ends
    pub fn sample(&self, t: f32) -> Option<Vec3> {
        let (a, b, w) = self.locate(t)?;
        Some(self.values[a].lerp(self.values[b], w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatched_lengths_rejected() {
        let err = RotationKeys::new(vec![0.0, 1.0], vec![Quat::IDENTITY]).unwrap_err();
        assert!(matches!(err, MimicError::InvalidClip(_)));
    }

    #[test]
    fn test_out_of_order_rejected() {
        assert!(TranslationKeys::new(vec![1.0, 0.5], vec![Vec3::ZERO, Vec3::ONE]).is_err());
    }

    #[test]
    fn test_non_finite_key_time_rejected() {
        let err = RotationKeys::new(vec![f32::NAN, 1.0], vec![Quat::IDENTITY, Quat::IDENTITY]).unwrap_err();
        assert!(matches!(err, MimicError::InvalidClip(_)));
        assert!(TranslationKeys::new(vec![0.0, f32::INFINITY], vec![Vec3::ZERO, Vec3::ONE]).is_err());
    }

    #[test]
    fn test_nan_sample_time_holds_first_key() {
        let keys = RotationKeys::new(vec![0.0, 1.0], vec![Quat::IDENTITY, Quat::from_rotation_y(1.0)]).unwrap();
        assert_eq!(keys.sample(f32::NAN), Some(Quat::IDENTITY));
    }

    #[test]
    fn test_sample_translation() {
        let keys = TranslationKeys::new(
            vec![0.0, 1.0, 3.0],
            vec![Vec3::ZERO, Vec3::X, Vec3::new(3.0, 0.0, 0.0)],
        )
        .unwrap();
        assert_eq!(keys.sample(-1.0), Some(Vec3::ZERO));
        assert!(keys.sample(0.5).unwrap().abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
        assert!(keys.sample(2.0).unwrap().abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert_eq!(keys.sample(10.0), Some(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(keys.end_time(), 3.0);
    }

    #[test]
    fn test_sample_rotation_midpoint() {
        let keys = RotationKeys::new(
            vec![0.0, 1.0],
            vec![Quat::IDENTITY, Quat::from_rotation_y(1.0)],
        )
        .unwrap();
        let mid = keys.sample(0.5).unwrap();
        assert!(mid.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-5));
    }

    #[test]
    fn test_empty_track_samples_none() {
        let keys = RotationKeys::new(Vec::new(), Vec::new()).unwrap();
        assert!(keys.sample(0.0).is_none());
    }
}
