//! Frame context
//!
//! Everything the host owns that the per-frame update reads: the current
//! mode, the attached video source, the manual-control values and where the
//! camera is. Passed explicitly into every update instead of living in a
//! global store.

use std::collections::BTreeMap;

use glam::{Affine3A, Vec3};
use mimic_core::{ExpressionName, MimicError, MimicResult, Mode};
use mimic_retarget::ClipSelection;
use mimic_solve::VideoSource;
use tracing::debug;

use crate::ModeMachine;

/// Values set on the manual-control surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualOverrides {
    expressions: BTreeMap<ExpressionName, f32>,
    /// Clip to play when the camera is not driving the skeleton
    pub clip: ClipSelection,
}

impl ManualOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a manual weight, clamped to [0, 1]
    pub fn set_expression(&mut self, name: ExpressionName, value: f32) {
        let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        self.expressions.insert(name, value);
    }

    /// Set a manual weight by its stable id, e.g. `"happy"`
    pub fn set_expression_by_id(&mut self, id: &str, value: f32) -> MimicResult<()> {
        let name = ExpressionName::from_id(id).ok_or_else(|| MimicError::UnknownExpression(id.to_string()))?;
        self.set_expression(name, value);
        Ok(())
    }

    /// Manual weight, 0 when never set
    pub fn expression(&self, name: ExpressionName) -> f32 {
        self.expressions.get(&name).copied().unwrap_or(0.0)
    }

    pub fn select_clip(&mut self, selection: ClipSelection) {
        if selection != self.clip {
            debug!(clip = ?selection.name(), "clip selection changed");
        }
        self.clip = selection;
    }
}

/// Host state read by one frame update
#[derive(Debug, Clone)]
pub struct FrameContext {
    mode: ModeMachine,
    video: Option<VideoSource>,
    overrides: ManualOverrides,
    camera_to_world: Affine3A,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            mode: ModeMachine::new(),
            video: None,
            overrides: ManualOverrides::new(),
            camera_to_world: Affine3A::IDENTITY,
        }
    }
}

impl FrameContext {
    /// Scripted mode, no video, no overrides, camera at the origin
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn mode_machine(&self) -> &ModeMachine {
        &self.mode
    }

    /// Switch mode. Takes effect on the next update.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        self.mode.set(mode)
    }

    pub fn video(&self) -> Option<VideoSource> {
        self.video
    }

    pub fn video_attached(&self) -> bool {
        self.video.is_some()
    }

    pub fn attach_video(&mut self, video: VideoSource) {
        debug!(width = video.width, height = video.height, "video source attached");
        self.video = Some(video);
    }

    pub fn detach_video(&mut self) {
        if self.video.take().is_some() {
            debug!("video source detached");
        }
    }

    /// The camera is live and in control of the skeleton
    pub fn is_tracking_live(&self) -> bool {
        self.mode().is_tracking() && self.video_attached()
    }

    pub fn overrides(&self) -> &ManualOverrides {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut ManualOverrides {
        &mut self.overrides
    }

    pub fn camera_to_world(&self) -> Affine3A {
        self.camera_to_world
    }

    /// Place the camera. The gaze target is expressed in camera space and
    /// follows it.
    pub fn set_camera(&mut self, camera_to_world: Affine3A) {
        self.camera_to_world = camera_to_world;
    }

    /// Convert a camera-space point to world space
    pub fn camera_point_to_world(&self, point: Vec3) -> Vec3 {
        self.camera_to_world.transform_point3(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_clamped_and_defaulted() {
        let mut overrides = ManualOverrides::new();
        assert_eq!(overrides.expression(ExpressionName::Happy), 0.0);
        overrides.set_expression(ExpressionName::Happy, 1.7);
        overrides.set_expression(ExpressionName::Sad, f32::NAN);
        assert_eq!(overrides.expression(ExpressionName::Happy), 1.0);
        assert_eq!(overrides.expression(ExpressionName::Sad), 0.0);
    }

    #[test]
    fn test_override_by_id() {
        let mut overrides = ManualOverrides::new();
        overrides.set_expression_by_id("blinkLeft", 0.5).unwrap();
        assert_eq!(overrides.expression(ExpressionName::BlinkLeft), 0.5);
        assert_eq!(
            overrides.set_expression_by_id("smirk", 1.0),
            Err(MimicError::UnknownExpression("smirk".to_string()))
        );
    }

    #[test]
    fn test_tracking_needs_video() {
        let mut ctx = FrameContext::new();
        assert_eq!(ctx.mode(), Mode::Scripted);
        ctx.set_mode(Mode::Tracking);
        assert!(!ctx.is_tracking_live());
        ctx.attach_video(VideoSource::new(1280, 720));
        assert!(ctx.is_tracking_live());
        ctx.detach_video();
        assert!(!ctx.is_tracking_live());
        assert_eq!(ctx.mode_machine().transitions(), 1);
    }

    #[test]
    fn test_camera_space_points() {
        let mut ctx = FrameContext::new();
        ctx.set_camera(Affine3A::from_translation(Vec3::new(0.0, 1.4, 2.0)));
        assert_eq!(ctx.camera_point_to_world(Vec3::new(-0.2, 0.1, 0.0)), Vec3::new(-0.2, 1.5, 2.0));
    }
}
