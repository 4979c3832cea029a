//! Pose Blender
//!
//! Writes smoothed targets onto the rig once per frame. With the camera in
//! control, solved expressions, gaze and bone rotations are chased; in every
//! other case the expression channels chase the manual overrides and the
//! skeleton is left to whatever clip is playing.
//!
//! Nothing snaps: each output covers `delta * rate` of its remaining
//! distance. A bone whose solved category is absent this frame is not
//! written at all and keeps its previous orientation.

use glam::Vec3;
use mimic_core::{damp_factor, lerp, ExpressionName};
use mimic_rig::Rig;
use mimic_solve::SolvedSnapshot;
use tracing::trace;

use crate::{tracked_bones, BlendConfig, FrameContext, RateClass};

/// Which data path fed the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendPath {
    /// Solved landmarks
    Tracking,
    /// Manual overrides
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendReport {
    pub path: BlendPath,
    pub bones_written: usize,
    pub channels_written: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PoseBlender {
    config: BlendConfig,
    /// Look-at target in camera space, once a pupil has been seen
    gaze: Option<Vec3>,
}

impl PoseBlender {
    pub fn new(config: BlendConfig) -> Self {
        Self { config, gaze: None }
    }

    pub fn config(&self) -> &BlendConfig {
        &self.config
    }

    /// Current camera-space look-at target
    pub fn gaze(&self) -> Option<Vec3> {
        self.gaze
    }

    /// Forget the gaze target, e.g. after the rig is swapped
    pub fn reset(&mut self) {
        self.gaze = None;
    }

    /// Blend one frame
    pub fn blend(&mut self, delta: f32, rig: &mut Rig, ctx: &FrameContext, snapshot: &SolvedSnapshot) -> BlendReport {
        let report = if ctx.is_tracking_live() {
            self.blend_tracking(delta, rig, ctx, snapshot)
        } else {
            self.blend_manual(delta, rig, ctx)
        };

        // The target hangs off the camera, so re-place it every frame
        if let Some(local) = self.gaze {
            rig.set_look_at_target(ctx.camera_point_to_world(local));
        }

        trace!(
            path = ?report.path,
            bones = report.bones_written,
            channels = report.channels_written,
            "frame blended"
        );
        report
    }

    fn blend_tracking(&mut self, delta: f32, rig: &mut Rig, ctx: &FrameContext, snapshot: &SolvedSnapshot) -> BlendReport {
        let expression_t = damp_factor(delta, self.config.expression_rate);
        let mut channels_written = 0;

        for &name in ExpressionName::EMOTIONS {
            channels_written += chase_expression(rig, name, ctx.overrides().expression(name), expression_t);
        }

        if let Some(face) = snapshot.face.as_deref() {
            for &name in ExpressionName::SOLVED {
                if let Some(target) = face.channel(name) {
                    channels_written += chase_expression(rig, name, target, expression_t);
                }
            }

            if let Some(pupil) = face.pupil {
                let destination = Vec3::new(pupil.x, pupil.y, 1.0) * self.config.gaze_scale;
                let current = self.gaze.unwrap_or(Vec3::ZERO);
                self.gaze = Some(current.lerp(destination, damp_factor(delta, self.config.gaze_rate)));
            }
        }

        let body_t = damp_factor(delta, self.config.body_rate);
        let hand_t = damp_factor(delta, self.config.hand_rate);
        let mut bones_written = 0;
        for entry in tracked_bones() {
            let Some(target) = entry.target(snapshot) else {
                continue;
            };
            let Some(current) = rig.bone_rotation(entry.bone) else {
                continue;
            };
            let t = match entry.rate {
                RateClass::Body => body_t,
                RateClass::Hand => hand_t,
            };
            rig.set_bone_rotation(entry.bone, current.slerp(target, t));
            bones_written += 1;
        }

        BlendReport {
            path: BlendPath::Tracking,
            bones_written,
            channels_written,
        }
    }

    fn blend_manual(&self, delta: f32, rig: &mut Rig, ctx: &FrameContext) -> BlendReport {
        let t = damp_factor(delta, self.config.expression_rate);
        let channels_written = ExpressionName::EMOTIONS
            .iter()
            .chain(ExpressionName::SOLVED)
            .map(|&name| chase_expression(rig, name, ctx.overrides().expression(name), t))
            .sum();

        BlendReport {
            path: BlendPath::Manual,
            bones_written: 0,
            channels_written,
        }
    }
}

/// Move one channel toward `target`. Returns 1 if the rig has it.
fn chase_expression(rig: &mut Rig, name: ExpressionName, target: f32, t: f32) -> usize {
    let current = rig.expression_weight(name);
    usize::from(rig.set_expression_weight(name, lerp(current, target, t)))
}
