//! End-to-end scenarios
//!
//! Each scenario builds a fresh avatar on the standard humanoid, drives it
//! through the public API the way a host would, and reports what it
//! observed. Tests assert on the reports; the demo prints them.

use glam::{Quat, Vec3};
use mimic_core::{convergence_frames, BoneName, ExpressionName, MimicError, MimicResult, Mode};
use mimic_retarget::{ClipRemapper, RotationKeys, SourceClip, SourceSkeleton, SourceTrack, IDLE_CLIP};
use mimic_rig::standard_humanoid;
use mimic_runtime::{Avatar, AvatarConfig, BlendPath, FrameContext, FrameOutcome};
use mimic_solve::VideoSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::{CaptureParams, FaceParams, LandmarkGenerator};

/// Tolerance used for "converged", as a share of the starting distance
pub const CONVERGENCE_TOLERANCE: f32 = 0.01;

/// Scripted expressions settling with no clip selected
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    pub frames: u32,
    /// (channel, target, final weight)
    pub channels: Vec<(ExpressionName, f32, f32)>,
    /// Bones whose rotation left identity
    pub bones_moved: Vec<BoneName>,
}

impl ConvergenceReport {
    pub fn converged(&self) -> bool {
        self.channels
            .iter()
            .all(|(_, target, weight)| (target - weight).abs() <= CONVERGENCE_TOLERANCE + 1e-5)
    }
}

pub fn scripted_convergence(targets: &[(ExpressionName, f32)], delta: f32) -> MimicResult<ConvergenceReport> {
    let mut avatar = Avatar::new(AvatarConfig::default());
    avatar.load_rig(standard_humanoid()?);

    let mut ctx = FrameContext::new();
    ctx.set_mode(Mode::Scripted);
    for &(name, value) in targets {
        ctx.overrides_mut().set_expression(name, value);
    }

    let rate = avatar.config().blend.expression_rate;
    let frames = convergence_frames(delta, rate, CONVERGENCE_TOLERANCE);
    for _ in 0..frames {
        if let FrameOutcome::Updated(report) = avatar.update(delta, &ctx) {
            debug_assert_eq!(report.path, BlendPath::Manual);
        }
    }

    let rig = avatar.rig().ok_or(MimicError::RigNotReady)?;
    let report = ConvergenceReport {
        frames,
        channels: targets
            .iter()
            .map(|&(name, target)| (name, target, rig.expression_weight(name)))
            .collect(),
        bones_moved: BoneName::ALL
            .iter()
            .copied()
            .filter(|bone| rig.bone_rotation(*bone).is_some_and(|q| !q.abs_diff_eq(Quat::IDENTITY, 1e-6)))
            .collect(),
    };
    info!(frames, converged = report.converged(), "scripted convergence");
    Ok(report)
}

/// One tracked face frame pulling the mouth channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouthStepReport {
    /// A shape the solver read from the synthetic face
    pub solved: f32,
    pub before: f32,
    pub after: f32,
}

impl MouthStepReport {
    /// Share of the remaining distance covered by the update
    pub fn fraction(&self) -> f32 {
        (self.after - self.before) / (self.solved - self.before)
    }
}

pub fn tracked_mouth_step(previous: f32, mouth_open: f32, delta: f32) -> MimicResult<MouthStepReport> {
    let mut avatar = Avatar::new(AvatarConfig::default());
    avatar.load_rig(standard_humanoid()?);
    if let Some(rig) = avatar.rig_mut() {
        rig.set_expression_weight(ExpressionName::Aa, previous);
    }

    let mut ctx = FrameContext::new();
    ctx.set_mode(Mode::Tracking);
    ctx.attach_video(VideoSource::new(640, 480));

    let params = CaptureParams {
        face: Some(FaceParams {
            mouth_open,
            ..Default::default()
        }),
        ..Default::default()
    };
    let frame = LandmarkGenerator::exact().frame(&params);
    avatar.on_landmarks(&frame, &ctx);
    let solved = avatar
        .solved_cache()
        .face()
        .map(|face| face.mouth.shape.a)
        .ok_or_else(|| MimicError::InvalidConfig("face detection was not accepted".to_string()))?;

    avatar.update(delta, &ctx);
    let after = avatar.rig().ok_or(MimicError::RigNotReady)?.expression_weight(ExpressionName::Aa);

    let report = MouthStepReport {
        solved,
        before: previous,
        after,
    };
    info!(solved, before = previous, after, fraction = report.fraction(), "tracked mouth step");
    Ok(report)
}

/// Remapping a clip authored on a skeleton whose arm is rotated at rest
#[derive(Debug, Clone, PartialEq)]
pub struct RestOffsetReport {
    pub bones_checked: usize,
    pub keys_checked: usize,
    /// Largest angle (radians) between a remapped key and its expected value
    pub max_error: f32,
}

const OFFSET_JOINT: &str = "mixamorigLeftArm";

/// Source skeleton: hips and spine at identity, left arm rotated by
/// `offset` at rest
pub fn offset_skeleton(offset: Quat) -> MimicResult<SourceSkeleton> {
    let mut skeleton = SourceSkeleton::new();
    skeleton.add_joint("mixamorigHips", None, Quat::IDENTITY, Vec3::new(0.0, 100.0, 0.0))?;
    skeleton.add_joint("mixamorigSpine", Some("mixamorigHips"), Quat::IDENTITY, Vec3::new(0.0, 10.0, 0.0))?;
    skeleton.add_joint(OFFSET_JOINT, Some("mixamorigSpine"), offset, Vec3::new(15.0, 35.0, 0.0))?;
    Ok(skeleton)
}

/// Idle clip with random keys on every joint of [`offset_skeleton`]
pub fn random_idle_clip(seed: u64, keys: usize) -> MimicResult<SourceClip> {
    let mut rng = StdRng::seed_from_u64(seed);
    let times: Vec<f32> = (0..keys).map(|k| k as f32 / 10.0).collect();
    let duration = times.last().copied().unwrap_or(0.0);

    let mut clip = SourceClip::new(IDLE_CLIP, duration);
    for joint in ["mixamorigHips", "mixamorigSpine", OFFSET_JOINT] {
        let values = (0..keys)
            .map(|_| {
                let axis = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                Quat::from_axis_angle(axis.try_normalize().unwrap_or(Vec3::Y), rng.gen_range(-3.0..3.0))
            })
            .collect();
        clip = clip.with_track(SourceTrack::rotation(joint, RotationKeys::new(times.clone(), values)?));
    }
    Ok(clip)
}

pub fn rest_offset_remap(offset: Quat, seed: u64) -> MimicResult<RestOffsetReport> {
    let rig = standard_humanoid()?;
    let skeleton = offset_skeleton(offset)?;
    let clip = random_idle_clip(seed, 8)?;
    let remapped = ClipRemapper::mixamo()
        .remap_onto(&clip, &skeleton, &rig)
        .ok_or_else(|| MimicError::InvalidClip(format!("{IDLE_CLIP} could not be remapped")))?;

    let mut report = RestOffsetReport {
        bones_checked: 0,
        keys_checked: 0,
        max_error: 0.0,
    };
    for (joint, bone) in [
        ("mixamorigHips", BoneName::Hips),
        ("mixamorigSpine", BoneName::Spine),
        (OFFSET_JOINT, BoneName::LeftUpperArm),
    ] {
        // The rig's bind pose is identity, so the correction undoes the
        // source's own rest rotation
        let correction = if joint == OFFSET_JOINT { offset.inverse() } else { Quat::IDENTITY };
        let source = clip
            .tracks
            .iter()
            .find(|track| track.joint == joint)
            .and_then(|track| track.rotation_keys())
            .ok_or_else(|| MimicError::InvalidClip(format!("no rotation track for {joint}")))?;
        let target = remapped
            .track(bone)
            .and_then(|track| track.rotation.as_ref())
            .ok_or_else(|| MimicError::UnknownBone(bone.to_string()))?;

        for (key, remapped_key) in source.values.iter().zip(&target.values) {
            let expected = (*key * correction).normalize();
            report.max_error = report.max_error.max(expected.angle_between(*remapped_key));
            report.keys_checked += 1;
        }
        report.bones_checked += 1;
    }
    info!(bones = report.bones_checked, keys = report.keys_checked, max_error = report.max_error, "rest offset remap");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_scripted_expressions_converge_without_bones() {
        let report = scripted_convergence(
            &[(ExpressionName::Happy, 1.0), (ExpressionName::Oh, 0.5)],
            1.0 / 60.0,
        )
        .unwrap();
        assert!(report.converged(), "{report:?}");
        assert!(report.bones_moved.is_empty(), "{:?}", report.bones_moved);
        assert!(report.frames > 10);
    }

    #[test]
    fn test_single_face_frame_moves_mouth_a_fifth_of_the_way() {
        let report = tracked_mouth_step(0.3, 0.8, 1.0 / 60.0).unwrap();
        assert!((report.solved - 0.8).abs() < 1e-3, "{report:?}");
        assert!((report.fraction() - 0.2).abs() < 1e-4, "{report:?}");
        assert!((report.after - (0.3 + 0.2 * (report.solved - 0.3))).abs() < 1e-6);
    }

    #[test]
    fn test_quarter_turn_rest_offset_is_undone_on_every_key() {
        let offset = Quat::from_rotation_z(FRAC_PI_2);
        for seed in 0..4 {
            let report = rest_offset_remap(offset, seed).unwrap();
            assert_eq!(report.bones_checked, 3);
            assert_eq!(report.keys_checked, 24);
            assert!(report.max_error < 1e-3, "seed {seed}: {report:?}");
        }
    }

    #[test]
    fn test_offset_is_what_the_remap_removes() {
        // Without correcting for the offset the keys would be a quarter
        // turn out
        let skeleton = offset_skeleton(Quat::from_rotation_z(FRAC_PI_2)).unwrap();
        let clip = random_idle_clip(3, 2).unwrap();
        let rig = standard_humanoid().unwrap();
        let remapped = ClipRemapper::mixamo().remap_onto(&clip, &skeleton, &rig).unwrap();

        let source = clip.tracks.iter().find(|t| t.joint == OFFSET_JOINT).unwrap().rotation_keys().unwrap();
        let target = remapped.track(BoneName::LeftUpperArm).unwrap().rotation.as_ref().unwrap();
        let raw_error = source.values[0].angle_between(target.values[0]);
        assert!((raw_error - FRAC_PI_2).abs() < 1e-3, "{raw_error}");
    }
}
