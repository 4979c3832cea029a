//! Animation Clip Player
//!
//! Holds the preloaded remapped clips and plays at most one of them. Which
//! clip plays is resolved every frame from the mode, whether a video source
//! is attached, and the externally selected clip name. Transitions are hard
//! cuts.

use std::collections::BTreeMap;

use mimic_core::{AssetState, BoneName, MimicError, MimicResult, Mode};
use mimic_rig::Rig;
use tracing::{debug, trace, warn};

use crate::RemappedClip;

/// Clip forced while the camera drives the skeleton
pub const IDLE_CLIP: &str = "Idle";
pub const SWING_DANCING_CLIP: &str = "Swing Dancing";
pub const THRILLER_CLIP: &str = "Thriller Part 2";

/// Clip chosen on the manual-control surface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClipSelection {
    #[default]
    None,
    Named(String),
}

impl ClipSelection {
    pub fn named(name: &str) -> Self {
        ClipSelection::Named(name.to_string())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ClipSelection::None => None,
            ClipSelection::Named(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone)]
struct Playback {
    name: String,
    time: f32,
}

/// Inputs of the last `sync`, so a change can be detected without cloning
/// the selection every frame
#[derive(Debug, Clone, PartialEq)]
struct SyncKey {
    mode: Mode,
    video_attached: bool,
    selection: ClipSelection,
}

/// Plays one remapped clip at a time onto a rig
#[derive(Debug, Default)]
pub struct ClipPlayer {
    library: BTreeMap<String, AssetState<RemappedClip>>,
    active: Option<Playback>,
    last_sync: Option<SyncKey>,
    warned: bool,
    cuts: u64,
}

impl ClipPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip whose remap has not finished yet
    pub fn begin_loading(&mut self, name: &str) {
        self.library.entry(name.to_string()).or_default().begin_loading();
    }

    /// Install a remapped clip under its own name, returning the clip it
    /// replaces. A replaced clip that is playing restarts from the top.
    pub fn insert(&mut self, clip: RemappedClip) -> Option<RemappedClip> {
        let name = clip.name.clone();
        if self.active.as_ref().is_some_and(|p| p.name == name) {
            self.active = Some(Playback { name: name.clone(), time: 0.0 });
        }
        debug!(clip = %name, bones = clip.len(), "clip ready");
        self.library.entry(name).or_default().finish(clip)
    }

    /// Drop every clip, e.g. after the rig they were remapped onto is swapped
    pub fn clear(&mut self) {
        self.library.clear();
        self.active = None;
        self.last_sync = None;
    }

    pub fn clip_state(&self, name: &str) -> Option<&AssetState<RemappedClip>> {
        self.library.get(name)
    }

    pub fn is_ready(&self, name: &str) -> bool {
        self.library.get(name).is_some_and(AssetState::is_ready)
    }

    /// Registered clip names, loaded or not
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.library.keys().map(String::as_str)
    }

    /// Name of the playing clip
    pub fn active(&self) -> Option<&str> {
        self.active.as_ref().map(|p| p.name.as_str())
    }

    /// Playhead of the playing clip in seconds
    pub fn time(&self) -> Option<f32> {
        self.active.as_ref().map(|p| p.time)
    }

    /// Number of clip starts so far
    pub fn cuts(&self) -> u64 {
        self.cuts
    }

    /// Start `name` from its first frame, stopping whatever was playing
    pub fn play(&mut self, name: &str) -> MimicResult<()> {
        match self.library.get(name) {
            None => return Err(MimicError::UnknownClip(name.to_string())),
            Some(state) if !state.is_ready() => return Err(MimicError::ClipNotReady(name.to_string())),
            Some(_) => {}
        }
        if let Some(previous) = self.active.take() {
            debug!(clip = %previous.name, "clip stopped");
        }
        debug!(clip = name, "clip started");
        self.active = Some(Playback {
            name: name.to_string(),
            time: 0.0,
        });
        self.cuts += 1;
        Ok(())
    }

    /// Stop `name` if it is the playing clip
    pub fn stop(&mut self, name: &str) -> bool {
        if self.active.as_ref().is_some_and(|p| p.name == name) {
            self.active = None;
            debug!(clip = name, "clip stopped");
            true
        } else {
            false
        }
    }

    /// Clip that should play for the given inputs. Live tracking always
    /// gets the idle clip so authored motion does not fight the camera.
    /// Scripted mode plays the selection whether or not video is attached.
    pub fn desired_clip<'a>(mode: Mode, video_attached: bool, selection: &'a ClipSelection) -> Option<&'a str> {
        if mode.is_tracking() && video_attached {
            Some(IDLE_CLIP)
        } else {
            selection.name()
        }
    }

    /// Reconcile playback with the current inputs. Any input change is a hard
    /// cut. Unavailable clips are reported once per change and retried every
    /// frame while still loading.
    pub fn sync(&mut self, mode: Mode, video_attached: bool, selection: &ClipSelection) {
        let changed = self.last_sync.as_ref().map_or(true, |key| {
            key.mode != mode || key.video_attached != video_attached || &key.selection != selection
        });
        if changed {
            self.last_sync = Some(SyncKey {
                mode,
                video_attached,
                selection: selection.clone(),
            });
            self.warned = false;
            if let Some(previous) = self.active.take() {
                debug!(clip = %previous.name, "clip stopped");
            }
        }
        if self.active.is_some() {
            return;
        }

        let Some(name) = Self::desired_clip(mode, video_attached, selection) else {
            return;
        };
        match self.play(name) {
            Ok(()) => {}
            Err(MimicError::ClipNotReady(_)) => trace!(clip = name, "clip still loading"),
            Err(err) => {
                if !self.warned {
                    warn!(error = %err, "selected clip unavailable");
                    self.warned = true;
                }
            }
        }
    }

    /// Move the playhead forward by `delta` seconds (looping) and write the
    /// sampled pose onto the rig
    pub fn advance(&mut self, delta: f32, rig: &mut Rig) {
        self.advance_where(delta, rig, |_| true);
    }

    /// Like [`advance`](Self::advance), leaving bones rejected by `include`
    /// to another driver
    pub fn advance_where(&mut self, delta: f32, rig: &mut Rig, include: impl Fn(BoneName) -> bool) {
        let Some(playback) = self.active.as_mut() else {
            return;
        };
        let Some(clip) = self.library.get(&playback.name).and_then(AssetState::ready) else {
            debug!(clip = %playback.name, "playing clip unloaded");
            self.active = None;
            return;
        };

        playback.time += delta.max(0.0);
        if clip.duration > 0.0 {
            playback.time = playback.time.rem_euclid(clip.duration);
        } else {
            playback.time = 0.0;
        }
        clip.apply_where(playback.time, rig, include);
    }
}
