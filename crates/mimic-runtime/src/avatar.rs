//! MIMIC Avatar - The per-frame update loop
//!
//! One avatar owns its rig, its clip library and the solved-pose cache its
//! adapter publishes into. The host calls [`Avatar::update`] once per render
//! frame and forwards detections through [`Avatar::landmark_sink`] (or a
//! capture-side adapter sharing the same cache).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use mimic_core::{AssetState, BoneName};
use mimic_retarget::{ClipPlayer, ClipRemapper, SourceClip, SourceSkeleton};
use mimic_rig::Rig;
use mimic_solve::{
    DetectionContext, DetectionOutcome, LandmarkSink, RawLandmarkFrame, SolvedPoseCache, SolverAdapter,
};
use tracing::{debug, info};

use crate::{tracked_bone, AvatarConfig, BlendReport, FrameClock, FrameContext, PoseBlender};

#[derive(Clone, Debug, Default)]
pub struct AvatarStats {
    pub frames: u64,
    /// Frames that found the rig still loading
    pub skipped_frames: u64,
    pub detections_accepted: u64,
    pub detections_cleared: u64,
    pub solve_failures: u64,
    pub clip_cuts: u64,
    pub bones_written_last: usize,
    pub last_update_duration: Duration,
}

/// What one call to [`Avatar::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Rig not ready, nothing touched
    Skipped,
    Updated(BlendReport),
}

/// A clip as loaded, kept so it can be remapped again onto a new rig
#[derive(Debug, Clone)]
struct ClipSource {
    clip: SourceClip,
    skeleton: SourceSkeleton,
}

/// A humanoid character driven by tracking and clips
#[derive(Debug)]
pub struct Avatar {
    config: AvatarConfig,
    rig: AssetState<Rig>,
    player: ClipPlayer,
    remapper: ClipRemapper,
    sources: BTreeMap<String, ClipSource>,
    adapter: SolverAdapter,
    blender: PoseBlender,
    clock: FrameClock,
    stats: AvatarStats,
}

impl Avatar {
    pub fn new(config: AvatarConfig) -> Self {
        Self {
            config,
            rig: AssetState::NotLoaded,
            player: ClipPlayer::new(),
            remapper: ClipRemapper::mixamo(),
            sources: BTreeMap::new(),
            adapter: SolverAdapter::new(config.adapter),
            blender: PoseBlender::new(config.blend),
            clock: FrameClock::new(config.clock),
            stats: AvatarStats::default(),
        }
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Assets
    // ------------------------------------------------------------------

    /// Mark the rig as loading
    pub fn begin_loading_rig(&mut self) {
        self.rig.begin_loading();
        debug!("rig loading");
    }

    /// Install a loaded rig. Clips already loaded are remapped onto it and
    /// playback restarts; a previous rig is returned.
    pub fn load_rig(&mut self, mut rig: Rig) -> Option<Rig> {
        rig.configure_look_at(self.config.look_at);
        info!(nodes = rig.len(), bones = rig.humanoid().len(), "rig ready");

        let previous = self.rig.finish(rig);
        self.player.clear();
        self.blender.reset();

        let names: Vec<String> = self.sources.keys().cloned().collect();
        for name in names {
            self.remap_source(&name);
        }
        previous
    }

    /// Mark a clip as loading. A tracking session waiting on it retries each
    /// frame.
    pub fn begin_loading_clip(&mut self, name: &str) {
        self.player.begin_loading(name);
    }

    /// Install a source clip and the skeleton it was authored against.
    /// Returns whether it is playable now; otherwise it is remapped as soon
    /// as a rig is loaded.
    pub fn load_clip(&mut self, clip: SourceClip, skeleton: SourceSkeleton) -> bool {
        let name = clip.name.clone();
        self.sources.insert(name.clone(), ClipSource { clip, skeleton });
        self.remap_source(&name)
    }

    fn remap_source(&mut self, name: &str) -> bool {
        let Some(source) = self.sources.get(name) else {
            return false;
        };
        match self.remapper.remap(&source.clip, &source.skeleton, &self.rig) {
            Some(remapped) => {
                debug!(clip = name, bones = remapped.len(), "clip remapped");
                self.player.insert(remapped);
                true
            }
            None => {
                self.player.begin_loading(name);
                false
            }
        }
    }

    /// Rig loaded and ready to drive
    pub fn is_ready(&self) -> bool {
        self.rig.is_ready()
    }

    pub fn rig(&self) -> Option<&Rig> {
        self.rig.ready()
    }

    pub fn rig_mut(&mut self) -> Option<&mut Rig> {
        self.rig.ready_mut()
    }

    pub fn player(&self) -> &ClipPlayer {
        &self.player
    }

    pub fn blender(&self) -> &PoseBlender {
        &self.blender
    }

    // ------------------------------------------------------------------
    // Detections
    // ------------------------------------------------------------------

    /// Sink for a capture pipeline on the render thread. Readiness comes
    /// from this avatar, whatever the caller's context says.
    pub fn landmark_sink(&mut self) -> &mut dyn LandmarkSink {
        self
    }

    /// Adapter for a capture pipeline on another thread. It publishes into
    /// this avatar's cache.
    pub fn capture_adapter(&self) -> SolverAdapter {
        SolverAdapter::with_cache(self.config.adapter, self.adapter.cache().clone())
    }

    /// Guard inputs for a detection arriving now
    pub fn detection_context(&self, ctx: &FrameContext) -> DetectionContext {
        DetectionContext {
            mode: ctx.mode(),
            video: ctx.video(),
            rig_ready: self.is_ready(),
        }
    }

    /// Deliver one detection
    pub fn on_landmarks(&mut self, frame: &RawLandmarkFrame, ctx: &FrameContext) -> DetectionOutcome {
        let detection = self.detection_context(ctx);
        self.ingest(frame, &detection)
    }

    fn ingest(&mut self, frame: &RawLandmarkFrame, detection: &DetectionContext) -> DetectionOutcome {
        let outcome = self.adapter.process(frame, detection);
        let adapter = self.adapter.stats();
        self.stats.detections_accepted = adapter.accepted;
        self.stats.detections_cleared = adapter.cleared;
        self.stats.solve_failures = adapter.solve_failures;
        outcome
    }

    pub fn solved_cache(&self) -> &SolvedPoseCache {
        self.adapter.cache()
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Advance one render frame by `delta` seconds
    pub fn update(&mut self, delta: f32, ctx: &FrameContext) -> FrameOutcome {
        let start = Instant::now();
        self.stats.frames += 1;

        // Stage 1: Sanitize the frame delta
        let delta = self.clock.tick(delta);

        // Stage 2: Readiness gate, never touch a half-loaded rig
        if !self.rig.is_ready() {
            self.stats.skipped_frames += 1;
            if self.stats.skipped_frames == 1 {
                debug!(state = self.rig.label(), "frame skipped: rig not ready");
            }
            return FrameOutcome::Skipped;
        }
        let Some(rig) = self.rig.ready_mut() else {
            return FrameOutcome::Skipped;
        };

        // Stage 3: Clip playback. While the camera drives the skeleton the
        // forced idle clip only moves bones tracking leaves alone.
        self.player.sync(ctx.mode(), ctx.video_attached(), &ctx.overrides().clip);
        if ctx.is_tracking_live() {
            self.player.advance_where(delta, rig, |bone: BoneName| tracked_bone(bone).is_none());
        } else {
            self.player.advance(delta, rig);
        }

        // Stage 4: Blend tracking or manual targets
        let snapshot = self.adapter.cache().snapshot();
        let report = self.blender.blend(delta, rig, ctx, &snapshot);

        // Stage 5: Rig time step (look-at, secondary motion)
        rig.update(delta);

        self.stats.clip_cuts = self.player.cuts();
        self.stats.bones_written_last = report.bones_written;
        self.stats.last_update_duration = start.elapsed();
        FrameOutcome::Updated(report)
    }

    pub fn stats(&self) -> &AvatarStats {
        &self.stats
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }
}

impl Default for Avatar {
    fn default() -> Self {
        Self::new(AvatarConfig::default())
    }
}

impl LandmarkSink for Avatar {
    fn on_landmarks(&mut self, frame: &RawLandmarkFrame, ctx: &DetectionContext) {
        let detection = DetectionContext {
            rig_ready: self.is_ready(),
            ..*ctx
        };
        self.ingest(frame, &detection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use mimic_core::{ExpressionName, Mode, Side};
    use mimic_retarget::{RotationKeys, SourceTrack, IDLE_CLIP, THRILLER_CLIP};
    use mimic_rig::standard_humanoid;
    use mimic_solve::{HandSolution, VideoSource};

    use crate::BlendPath;

    const FRAME: f32 = 1.0 / 60.0;

    fn mixamo_skeleton() -> SourceSkeleton {
        let mut skeleton = SourceSkeleton::new();
        skeleton
            .add_joint("mixamorigHips", None, Quat::IDENTITY, Vec3::new(0.0, 100.0, 0.0))
            .unwrap();
        skeleton
            .add_joint("mixamorigLeftUpLeg", Some("mixamorigHips"), Quat::IDENTITY, Vec3::X * 9.0)
            .unwrap();
        skeleton
            .add_joint("mixamorigLeftHand", Some("mixamorigHips"), Quat::IDENTITY, Vec3::X * 60.0)
            .unwrap();
        skeleton
    }

    fn swing_clip(name: &str) -> SourceClip {
        let keys = |angle: f32| {
            RotationKeys::new(vec![0.0, 1.0], vec![Quat::from_rotation_x(angle), Quat::from_rotation_x(angle)]).unwrap()
        };
        SourceClip::new(name, 1.0)
            .with_track(SourceTrack::rotation("mixamorigLeftUpLeg", keys(0.4)))
            .with_track(SourceTrack::rotation("mixamorigLeftHand", keys(0.9)))
    }

    fn ready_avatar() -> Avatar {
        let mut avatar = Avatar::default();
        avatar.load_rig(standard_humanoid().unwrap());
        avatar
    }

    #[test]
    fn test_not_ready_is_noop() {
        let mut avatar = Avatar::default();
        avatar.begin_loading_rig();
        let mut ctx = FrameContext::new();
        ctx.overrides_mut().set_expression(ExpressionName::Happy, 1.0);

        assert_eq!(avatar.update(FRAME, &ctx), FrameOutcome::Skipped);
        assert_eq!(avatar.update(FRAME, &ctx), FrameOutcome::Skipped);
        assert!(!avatar.is_ready());
        assert_eq!(avatar.stats().skipped_frames, 2);
    }

    #[test]
    fn test_scripted_expressions_converge_without_touching_bones() {
        let mut avatar = ready_avatar();
        let mut ctx = FrameContext::new();
        ctx.overrides_mut().set_expression(ExpressionName::Happy, 1.0);

        let frames = mimic_core::convergence_frames(FRAME, 12.0, 0.01);
        for _ in 0..frames {
            let outcome = avatar.update(FRAME, &ctx);
            assert!(matches!(outcome, FrameOutcome::Updated(report) if report.path == BlendPath::Manual));
        }

        let rig = avatar.rig().unwrap();
        assert!(rig.expression_weight(ExpressionName::Happy) >= 0.99);
        for bone in BoneName::ALL {
            assert_eq!(rig.bone_rotation(*bone), Some(Quat::IDENTITY), "{bone} moved");
        }
    }

    #[test]
    fn test_clips_loaded_before_rig_are_remapped_on_load() {
        let mut avatar = Avatar::default();
        avatar.begin_loading_rig();
        assert!(!avatar.load_clip(swing_clip(IDLE_CLIP), mixamo_skeleton()));
        assert!(!avatar.player().is_ready(IDLE_CLIP));

        avatar.load_rig(standard_humanoid().unwrap());
        assert!(avatar.player().is_ready(IDLE_CLIP));
        assert!(avatar.load_clip(swing_clip(THRILLER_CLIP), mixamo_skeleton()));
    }

    #[test]
    fn test_tracking_with_video_forces_idle_on_untracked_bones() {
        let mut avatar = ready_avatar();
        avatar.load_clip(swing_clip(IDLE_CLIP), mixamo_skeleton());
        avatar.load_clip(swing_clip(THRILLER_CLIP), mixamo_skeleton());

        let mut ctx = FrameContext::new();
        ctx.overrides_mut().select_clip(mimic_retarget::ClipSelection::named(THRILLER_CLIP));
        ctx.set_mode(Mode::Tracking);
        ctx.attach_video(VideoSource::new(640, 480));

        avatar.update(FRAME, &ctx);
        assert_eq!(avatar.player().active(), Some(IDLE_CLIP));

        let rig = avatar.rig().unwrap();
        assert!(rig
            .bone_rotation(BoneName::LeftUpperLeg)
            .unwrap()
            .abs_diff_eq(Quat::from_rotation_x(0.4), 1e-5));
        // The wrist belongs to tracking, the clip leaves it alone
        assert_eq!(rig.bone_rotation(BoneName::LeftHand), Some(Quat::IDENTITY));

        // Camera off: the selected clip plays everywhere
        ctx.detach_video();
        avatar.update(FRAME, &ctx);
        assert_eq!(avatar.player().active(), Some(THRILLER_CLIP));
        assert!(avatar
            .rig()
            .unwrap()
            .bone_rotation(BoneName::LeftHand)
            .unwrap()
            .abs_diff_eq(Quat::from_rotation_x(0.9), 1e-5));
    }

    #[test]
    fn test_capture_adapter_shares_cache() {
        let mut avatar = ready_avatar();
        let capture = avatar.capture_adapter();
        capture.cache().store_hand(HandSolution::new(Side::Right));
        assert!(avatar.solved_cache().hand(Side::Right).is_some());

        // Leaving tracking clears the shared slots on the next detection
        let ctx = FrameContext::new();
        assert_eq!(
            avatar.on_landmarks(&RawLandmarkFrame::default(), &ctx),
            DetectionOutcome::Cleared
        );
        assert!(capture.cache().is_empty());
        assert_eq!(avatar.stats().detections_cleared, 1);
    }

    #[test]
    fn test_sink_uses_avatar_readiness_and_stats() {
        let mut avatar = Avatar::default();
        avatar.begin_loading_rig();
        let claimed = DetectionContext {
            mode: Mode::Tracking,
            video: Some(VideoSource::new(640, 480)),
            rig_ready: true,
        };
        avatar.capture_adapter().cache().store_hand(HandSolution::new(Side::Left));

        avatar.landmark_sink().on_landmarks(&RawLandmarkFrame::default(), &claimed);
        assert!(avatar.solved_cache().is_empty());
        assert_eq!(avatar.stats().detections_cleared, 1);
        assert_eq!(avatar.stats().detections_accepted, 0);

        avatar.load_rig(standard_humanoid().unwrap());
        avatar.landmark_sink().on_landmarks(&RawLandmarkFrame::default(), &claimed);
        assert_eq!(avatar.stats().detections_accepted, 1);
    }

    #[test]
    fn test_unknown_selection_is_not_fatal() {
        let mut avatar = ready_avatar();
        let mut ctx = FrameContext::new();
        ctx.overrides_mut().select_clip(mimic_retarget::ClipSelection::named("Moonwalk"));
        for _ in 0..3 {
            assert!(matches!(avatar.update(FRAME, &ctx), FrameOutcome::Updated(_)));
        }
        assert!(avatar.player().active().is_none());
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut config = AvatarConfig::default();
        config.clock.max_delta = 0.05;
        let mut avatar = Avatar::new(config);
        avatar.load_rig(standard_humanoid().unwrap());
        let mut ctx = FrameContext::new();
        ctx.overrides_mut().set_expression(ExpressionName::Sad, 1.0);

        // 5 s stall advances like a 50 ms frame
        avatar.update(5.0, &ctx);
        let sad = avatar.rig().unwrap().expression_weight(ExpressionName::Sad);
        assert!((sad - 0.6).abs() < 1e-6, "sad = {sad}");
        assert_eq!(avatar.clock().clamped_frames(), 1);
    }
}
