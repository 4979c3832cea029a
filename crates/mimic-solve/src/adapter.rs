//! Solver Adapter
//!
//! The capture pipeline hands every detection to one [`LandmarkSink`]. The
//! adapter checks whether tracking should run at all, solves each category
//! present in the detection, and publishes the results to the cache.
//!
//! Two policies live here:
//! - Guard: outside tracking mode, without a video source, or without a
//!   loaded rig, every slot is cleared so no stale pose survives into the
//!   scripted path.
//! - Mirroring: a front camera shows the subject's left hand on the image's
//!   right. With mirrored capture the image-left set solves the subject's
//!   right hand and vice versa.

use mimic_core::{Mode, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    solve_face, solve_hand, solve_pose, FaceSolveConfig, Landmark, PoseSolveConfig, RawLandmarkFrame,
    SolvedPoseCache, VideoSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Capture is horizontally mirrored (typical front camera)
    pub mirrored: bool,
    pub face: FaceSolveConfig,
    pub pose: PoseSolveConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            mirrored: true,
            face: FaceSolveConfig::default(),
            pose: PoseSolveConfig::default(),
        }
    }
}

/// Host state at the time a detection arrives
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionContext {
    pub mode: Mode,
    pub video: Option<VideoSource>,
    pub rig_ready: bool,
}

impl DetectionContext {
    /// Tracking is live: camera mode, a video source and a rig to drive
    pub fn is_live(&self) -> bool {
        self.mode.is_tracking() && self.video.is_some() && self.rig_ready
    }
}

/// Receiver of detection callbacks
pub trait LandmarkSink {
    fn on_landmarks(&mut self, frame: &RawLandmarkFrame, ctx: &DetectionContext);
}

/// What the adapter did with one detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// At least the guard passed; present categories were solved
    Accepted,
    /// Guard failed; every slot was cleared
    Cleared,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterStats {
    pub accepted: u64,
    pub cleared: u64,
    /// Categories present in a detection but rejected by their solver
    pub solve_failures: u64,
}

/// Turns detections into cached solutions
#[derive(Debug, Default)]
pub struct SolverAdapter {
    config: AdapterConfig,
    cache: SolvedPoseCache,
    stats: AdapterStats,
}

impl SolverAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self::with_cache(config, SolvedPoseCache::new())
    }

    /// Adapter publishing into an existing cache, e.g. one the render loop
    /// already reads
    pub fn with_cache(config: AdapterConfig, cache: SolvedPoseCache) -> Self {
        Self {
            config,
            cache,
            stats: AdapterStats::default(),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn cache(&self) -> &SolvedPoseCache {
        &self.cache
    }

    pub fn stats(&self) -> AdapterStats {
        self.stats
    }

    /// Handle one detection. Categories absent from it keep their last
    /// solution.
    pub fn process(&mut self, frame: &RawLandmarkFrame, ctx: &DetectionContext) -> DetectionOutcome {
        let Some(video) = ctx.video.filter(|_| ctx.is_live()) else {
            if !self.cache.is_empty() {
                debug!(
                    mode = %ctx.mode,
                    video = ctx.video.is_some(),
                    rig_ready = ctx.rig_ready,
                    "tracking inactive, clearing solved poses"
                );
            }
            self.cache.clear();
            self.stats.cleared += 1;
            return DetectionOutcome::Cleared;
        };

        if let Some(face) = &frame.face {
            match solve_face(face, &self.config.face.for_video(video)) {
                Ok(solution) => self.cache.store_face(solution),
                Err(err) => self.reject(err),
            }
        }

        if let (Some(world), Some(image)) = (&frame.pose_world, &frame.pose) {
            match solve_pose(world, image, &self.config.pose) {
                Ok(solution) => self.cache.store_pose(solution),
                Err(err) => self.reject(err),
            }
        }

        let (left_source, right_source) = self.hand_sources(frame);
        for (side, landmarks) in [(Side::Left, left_source), (Side::Right, right_source)] {
            let Some(landmarks) = landmarks else {
                continue;
            };
            match solve_hand(landmarks, side) {
                Ok(solution) => self.cache.store_hand(solution),
                Err(err) => self.reject(err),
            }
        }

        self.stats.accepted += 1;
        DetectionOutcome::Accepted
    }

    /// Landmark sets for the subject's (left, right) hand
    fn hand_sources<'a>(&self, frame: &'a RawLandmarkFrame) -> (Option<&'a [Landmark]>, Option<&'a [Landmark]>) {
        let image_left = frame.left_hand.as_deref();
        let image_right = frame.right_hand.as_deref();
        if self.config.mirrored {
            (image_right, image_left)
        } else {
            (image_left, image_right)
        }
    }

    fn reject(&mut self, err: mimic_core::MimicError) {
        trace!(error = %err, "detection category rejected");
        self.stats.solve_failures += 1;
    }
}

impl LandmarkSink for SolverAdapter {
    fn on_landmarks(&mut self, frame: &RawLandmarkFrame, ctx: &DetectionContext) {
        self.process(frame, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Finger, Segment, HAND_LANDMARKS};

    fn live() -> DetectionContext {
        DetectionContext {
            mode: Mode::Tracking,
            video: Some(VideoSource::new(640, 480)),
            rig_ready: true,
        }
    }

    /// A hand with the index finger bent, on a 1/64 grid so that mirroring
    /// is exact
    fn pointing_hand(x0: f32) -> Vec<Landmark> {
        let mut lm: Vec<Landmark> = (0..HAND_LANDMARKS)
            .map(|k| Landmark::new(x0 + (k % 4) as f32 / 64.0, (56 - 2 * k) as f32 / 64.0, 0.0))
            .collect();
        lm[7] = Landmark::new(lm[6].x, lm[6].y, -3.0 / 64.0);
        lm
    }

    fn open_hand(x0: f32) -> Vec<Landmark> {
        (0..HAND_LANDMARKS)
            .map(|k| Landmark::new(x0 + 0.02 * (k / 4) as f32, 0.8 - 0.02 * k as f32, 0.0))
            .collect()
    }

    #[test]
    fn test_mirrored_capture_swaps_hands() {
        let mut adapter = SolverAdapter::new(AdapterConfig::default());
        let frame = RawLandmarkFrame {
            left_hand: Some(pointing_hand(0.2)),
            right_hand: Some(open_hand(0.7)),
            ..Default::default()
        };
        assert_eq!(adapter.process(&frame, &live()), DetectionOutcome::Accepted);

        let right = adapter.cache().hand(Side::Right).unwrap();
        let left = adapter.cache().hand(Side::Left).unwrap();
        assert_eq!(right.side, Side::Right);
        assert_eq!(*right, solve_hand(&pointing_hand(0.2), Side::Right).unwrap());
        assert_eq!(*left, solve_hand(&open_hand(0.7), Side::Left).unwrap());
    }

    #[test]
    fn test_unmirrored_capture_keeps_labels() {
        let config = AdapterConfig {
            mirrored: false,
            ..Default::default()
        };
        let mut adapter = SolverAdapter::new(config);
        let frame = RawLandmarkFrame {
            left_hand: Some(pointing_hand(0.2)),
            ..Default::default()
        };
        adapter.process(&frame, &live());
        assert!(adapter.cache().hand(Side::Right).is_none());
        let left = adapter.cache().hand(Side::Left).unwrap();
        assert_eq!(*left, solve_hand(&pointing_hand(0.2), Side::Left).unwrap());
    }

    #[test]
    fn test_mirroring_law() {
        // Solving the image-left set as the right hand equals solving the
        // physically mirrored set as the right hand, for every finger curl
        let lm = pointing_hand(0.25);
        let mut adapter = SolverAdapter::new(AdapterConfig::default());
        adapter.process(
            &RawLandmarkFrame {
                left_hand: Some(lm.clone()),
                ..Default::default()
            },
            &live(),
        );
        let swapped = adapter.cache().hand(Side::Right).unwrap();
        let unmirrored = solve_hand(&crate::mirror_landmarks(&lm), Side::Right).unwrap();
        for finger in Finger::ALL {
            for segment in Segment::ALL {
                assert!(swapped
                    .finger(finger, segment)
                    .abs_diff_eq(unmirrored.finger(finger, segment), 1e-6));
            }
        }
    }

    #[test]
    fn test_guard_clears_every_slot() {
        let mut adapter = SolverAdapter::new(AdapterConfig::default());
        let frame = RawLandmarkFrame {
            left_hand: Some(open_hand(0.2)),
            right_hand: Some(open_hand(0.6)),
            ..Default::default()
        };
        adapter.process(&frame, &live());
        assert!(!adapter.cache().is_empty());

        for ctx in [
            DetectionContext { mode: Mode::Scripted, ..live() },
            DetectionContext { video: None, ..live() },
            DetectionContext { rig_ready: false, ..live() },
        ] {
            adapter.process(&frame, &live());
            assert_eq!(adapter.process(&frame, &ctx), DetectionOutcome::Cleared);
            assert!(adapter.cache().is_empty());
        }
        assert_eq!(adapter.stats().cleared, 3);
    }

    #[test]
    fn test_absent_category_keeps_last_solution() {
        let mut adapter = SolverAdapter::new(AdapterConfig::default());
        adapter.process(
            &RawLandmarkFrame {
                left_hand: Some(open_hand(0.2)),
                ..Default::default()
            },
            &live(),
        );
        let before = adapter.cache().hand(Side::Right).unwrap();

        adapter.process(&RawLandmarkFrame::default(), &live());
        assert_eq!(adapter.cache().hand(Side::Right).unwrap(), before);
    }

    #[test]
    fn test_malformed_category_is_counted_not_fatal() {
        let mut adapter = SolverAdapter::new(AdapterConfig::default());
        let frame = RawLandmarkFrame {
            face: Some(vec![Landmark::default(); 12]),
            left_hand: Some(open_hand(0.2)),
            ..Default::default()
        };
        assert_eq!(adapter.process(&frame, &live()), DetectionOutcome::Accepted);
        assert!(adapter.cache().face().is_none());
        assert!(adapter.cache().hand(Side::Right).is_some());
        assert_eq!(adapter.stats().solve_failures, 1);
    }
}
