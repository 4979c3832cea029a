//! MIMIC Frame Loop Demo
//!
//! Drives one avatar on the standard humanoid through three phases:
//! - Scripted: manual expressions, no clip
//! - Tracking: a synthetic subject captured at 30 Hz, rendered at 60 Hz
//! - Camera off: the selected clip plays on the whole skeleton
//!
//! Set `RUST_LOG=debug` (or `trace`) for per-stage detail.

use std::f32::consts::FRAC_PI_2;

use glam::Quat;
use mimic_core::{BoneName, ExpressionName, Mode};
use mimic_retarget::{ClipSelection, IDLE_CLIP};
use mimic_rig::standard_humanoid;
use mimic_runtime::{Avatar, AvatarConfig, FrameContext, FrameOutcome};
use mimic_solve::VideoSource;
use mimic_test::{offset_skeleton, random_idle_clip, CaptureConfig, CaptureParams, CaptureSimulator, FaceParams, PoseParams};
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAME: f32 = 1.0 / 60.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut avatar = Avatar::new(AvatarConfig::default());
    avatar.begin_loading_rig();

    // Clips may arrive before the rig; they are remapped once it loads
    let idle = random_idle_clip(42, 60)?;
    avatar.load_clip(idle, offset_skeleton(Quat::from_rotation_z(FRAC_PI_2))?);
    avatar.load_rig(standard_humanoid()?);

    let mut ctx = FrameContext::new();

    // Phase 1: scripted expressions
    ctx.set_mode(Mode::Scripted);
    ctx.overrides_mut().set_expression(ExpressionName::Happy, 1.0);
    ctx.overrides_mut().set_expression(ExpressionName::Oh, 0.4);
    run_frames(&mut avatar, &ctx, 60);
    if let Some(rig) = avatar.rig() {
        info!(
            happy = rig.expression_weight(ExpressionName::Happy),
            oh = rig.expression_weight(ExpressionName::Oh),
            "scripted phase done"
        );
    }

    // Phase 2: tracking a synthetic subject
    ctx.overrides_mut().set_expression(ExpressionName::Happy, 0.0);
    ctx.set_mode(Mode::Tracking);
    ctx.attach_video(VideoSource::new(640, 480));

    let mut capture = CaptureSimulator::new(CaptureConfig::shaky(), |t: f32| CaptureParams {
        face: Some(FaceParams {
            mouth_open: (t * 3.0).sin().abs() * 0.8,
            left_eye_open: 1.0,
            right_eye_open: if (t % 2.0) < 0.15 { 0.0 } else { 1.0 },
            pupil: Some(glam::Vec2::new((t * 0.7).sin() * 0.5, 0.0)),
        }),
        pose: Some(PoseParams {
            left_arm_raise: (t * 1.5).sin().abs() * 1.2,
            right_arm_raise: 0.2,
        }),
        image_left_hand: Some((t * 2.0).sin().abs()),
        image_right_hand: Some(0.1),
    });

    for _ in 0..120 {
        let detection = avatar.detection_context(&ctx);
        capture.step(FRAME, avatar.landmark_sink(), &detection);
        avatar.update(FRAME, &ctx);
    }
    if let Some(rig) = avatar.rig() {
        let arm = rig.bone_rotation(BoneName::LeftUpperArm).unwrap_or(Quat::IDENTITY);
        info!(
            detections = capture.stats().detections,
            dropped = capture.stats().dropped,
            aa = rig.expression_weight(ExpressionName::Aa),
            left_arm_angle = arm.angle_between(Quat::IDENTITY),
            active_clip = avatar.player().active().unwrap_or("-"),
            "tracking phase done"
        );
    }

    // Phase 3: camera off, the selection plays everywhere
    ctx.detach_video();
    ctx.overrides_mut().select_clip(ClipSelection::named(IDLE_CLIP));
    run_frames(&mut avatar, &ctx, 60);

    let stats = avatar.stats();
    info!(
        frames = stats.frames,
        skipped = stats.skipped_frames,
        clip_cuts = stats.clip_cuts,
        bones_written = stats.bones_written_last,
        clock_clamped = avatar.clock().clamped_frames(),
        last_update_us = stats.last_update_duration.as_micros() as u64,
        active_clip = avatar.player().active().unwrap_or("-"),
        "demo finished"
    );
    Ok(())
}

fn run_frames(avatar: &mut Avatar, ctx: &FrameContext, frames: usize) {
    for _ in 0..frames {
        if let FrameOutcome::Skipped = avatar.update(FRAME, ctx) {
            info!("rig not ready, frame skipped");
        }
    }
}
