//! Capture Simulator - A detector running at its own rate
//!
//! Real capture delivers detections at the camera rate (typically 30 Hz)
//! while the render loop runs faster, and a detector occasionally misses a
//! frame altogether. The simulator reproduces both: it accumulates render
//! time, emits one detection per capture period, and drops a configurable
//! share of them.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use mimic_solve::{AdapterStats, DetectionContext, LandmarkSink, RawLandmarkFrame, SolverAdapter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::{CaptureParams, LandmarkGenerator};

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    /// Detections per second
    pub rate_hz: f32,
    /// Uniform landmark jitter, normalized image units
    pub noise: f32,
    /// Probability a detection reports nothing (0.0 - 1.0)
    pub drop_rate: f64,
    pub seed: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            rate_hz: 30.0,
            noise: 0.0,
            drop_rate: 0.0,
            seed: 0,
        }
    }
}

impl CaptureConfig {
    /// Shaky webcam: noisy landmarks and missed detections
    pub fn shaky() -> Self {
        Self {
            noise: 0.002,
            drop_rate: 0.1,
            ..Default::default()
        }
    }

    pub fn period(&self) -> f32 {
        1.0 / self.rate_hz
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub detections: u64,
    /// Detections that came back empty
    pub dropped: u64,
}

/// Emits scripted detections at the capture rate. The script maps capture
/// time (seconds) to what the subject is doing.
pub struct CaptureSimulator<S> {
    config: CaptureConfig,
    generator: LandmarkGenerator,
    script: S,
    rng: StdRng,
    accumulator: f32,
    time: f32,
    stats: CaptureStats,
}

impl<S> CaptureSimulator<S>
where
    S: FnMut(f32) -> CaptureParams,
{
    pub fn new(config: CaptureConfig, script: S) -> Self {
        Self {
            generator: LandmarkGenerator::new(config.seed, config.noise),
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            config,
            script,
            accumulator: 0.0,
            time: 0.0,
            stats: CaptureStats::default(),
        }
    }

    /// Next detection, advancing capture time by one period
    pub fn next_frame(&mut self) -> RawLandmarkFrame {
        let params = (self.script)(self.time);
        self.time += self.config.period();
        self.stats.detections += 1;

        if self.config.drop_rate > 0.0 && self.rng.gen_bool(self.config.drop_rate.min(1.0)) {
            self.stats.dropped += 1;
            trace!(time = self.time, "detection dropped");
            return RawLandmarkFrame::default();
        }
        self.generator.frame(&params)
    }

    /// Advance by one render frame and deliver every detection that fell
    /// due. Returns how many were delivered.
    pub fn step(&mut self, delta: f32, sink: &mut dyn LandmarkSink, ctx: &DetectionContext) -> usize {
        self.accumulator += delta.max(0.0);
        let period = self.config.period();
        let mut delivered = 0;
        while self.accumulator >= period {
            self.accumulator -= period;
            let frame = self.next_frame();
            sink.on_landmarks(&frame, ctx);
            delivered += 1;
        }
        delivered
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn stats(&self) -> &CaptureStats {
        &self.stats
    }
}

impl<S> CaptureSimulator<S>
where
    S: FnMut(f32) -> CaptureParams + Send + 'static,
{
    /// Run `detections` captures on a worker thread, paced at the capture
    /// rate when `realtime` is set. The adapter usually comes from
    /// `Avatar::capture_adapter` so results land in the avatar's cache.
    pub fn spawn(
        mut self,
        mut adapter: SolverAdapter,
        ctx: DetectionContext,
        detections: usize,
        realtime: bool,
    ) -> JoinHandle<(AdapterStats, CaptureStats)> {
        thread::spawn(move || {
            let pause = Duration::from_secs_f32(self.config.period());
            for _ in 0..detections {
                let frame = self.next_frame();
                adapter.process(&frame, &ctx);
                if realtime {
                    thread::sleep(pause);
                }
            }
            (adapter.stats(), self.stats)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_core::{Mode, Side};
    use mimic_solve::VideoSource;
    use proptest::prelude::*;

    use crate::FaceParams;

    fn live() -> DetectionContext {
        DetectionContext {
            mode: Mode::Tracking,
            video: Some(VideoSource::new(640, 480)),
            rig_ready: true,
        }
    }

    #[test]
    fn test_paces_detections_at_capture_rate() {
        let mut sim = CaptureSimulator::new(CaptureConfig::default(), |_| CaptureParams::full());
        let mut adapter = SolverAdapter::default();

        // One second of 60 Hz render frames
        let delivered: usize = (0..60).map(|_| sim.step(1.0 / 60.0, &mut adapter, &live())).sum();
        assert!((29..=30).contains(&delivered), "{delivered}");
        assert_eq!(adapter.stats().accepted as usize, delivered);
        assert!(adapter.cache().face().is_some());
        assert!(adapter.cache().hand(Side::Left).is_some());
    }

    #[test]
    fn test_script_sees_capture_time() {
        let mut sim = CaptureSimulator::new(CaptureConfig::default(), |t| CaptureParams {
            face: Some(FaceParams {
                mouth_open: if t < 0.5 { 0.0 } else { 0.8 },
                ..Default::default()
            }),
            ..Default::default()
        });
        let mut adapter = SolverAdapter::default();
        for _ in 0..30 {
            sim.step(1.0 / 30.0 + 1e-6, &mut adapter, &live());
        }
        let face = adapter.cache().face().unwrap();
        assert!((face.mouth.shape.a - 0.8).abs() < 1e-2);
        assert!(sim.time() >= 0.99);
    }

    #[test]
    fn test_drops_are_seeded() {
        let config = CaptureConfig {
            drop_rate: 0.5,
            seed: 11,
            ..Default::default()
        };
        let run = |config: CaptureConfig| {
            let mut sim = CaptureSimulator::new(config, |_| CaptureParams::full());
            (0..100).map(|_| sim.next_frame().is_empty()).collect::<Vec<_>>()
        };
        let a = run(config.clone());
        assert_eq!(a, run(config));
        let dropped = a.iter().filter(|empty| **empty).count();
        assert!((20..=80).contains(&dropped), "{dropped}");
    }

    #[test]
    fn test_worker_thread_publishes_into_shared_cache() {
        let reader = SolverAdapter::default();
        let capture = SolverAdapter::with_cache(Default::default(), reader.cache().clone());
        let sim = CaptureSimulator::new(CaptureConfig::shaky(), |_| CaptureParams::full());

        let (adapter_stats, capture_stats) = sim.spawn(capture, live(), 20, false).join().unwrap();
        assert_eq!(adapter_stats.accepted, 20);
        assert_eq!(capture_stats.detections, 20);
        assert!(reader.cache().snapshot().pose.is_some() || capture_stats.dropped == 20);
    }

    proptest! {
        #[test]
        fn prop_delivery_follows_elapsed_time(deltas in proptest::collection::vec(0.001f32..0.05, 1..200)) {
            let mut sim = CaptureSimulator::new(CaptureConfig::default(), |_| CaptureParams::default());
            let mut adapter = SolverAdapter::default();
            let delivered: usize = deltas.iter().map(|&d| sim.step(d, &mut adapter, &live())).sum();
            let expected = deltas.iter().sum::<f32>() * 30.0;
            prop_assert!((delivered as f32 - expected).abs() <= 1.0, "{} vs {}", delivered, expected);
        }
    }
}
