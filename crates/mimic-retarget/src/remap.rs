//! Clip Remapper - source clip to humanoid clip
//!
//! Runs once per (clip, rig) pair when assets finish loading, never on the
//! per-frame path. For a source joint with rest world rotation `S` (parent
//! `P_s`) mapped onto a target bone with rest world rotation `T` (parent
//! `P_t`), every keyframe `k` becomes
//!
//! ```text
//! k' = (P_t⁻¹ · P_s) · k · (S⁻¹ · T)
//! ```
//!
//! which for a normalized target (identity rest) is
//! `parentRestWorld · k · restWorld⁻¹`. The remap is a pure function of its
//! inputs, so repeating it yields bit-identical tracks.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use mimic_core::{AssetState, BoneName};
use mimic_rig::{MetaVersion, Rig};
use tracing::{debug, trace};

use crate::{
    BoneCorrespondence, CorrespondenceTable, RotationKeys, SourceChannel, SourceClip,
    SourceSkeleton, TranslationKeys,
};

/// Pre/post multipliers baked into every keyframe of one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestCorrection {
    pub pre: Quat,
    pub post: Quat,
}

impl RestCorrection {
    pub const IDENTITY: RestCorrection = RestCorrection {
        pre: Quat::IDENTITY,
        post: Quat::IDENTITY,
    };

    /// Correction between a source joint's and a target bone's bind pose
    pub fn between(
        source_rest: Quat,
        source_parent_rest: Quat,
        target_rest: Quat,
        target_parent_rest: Quat,
    ) -> Self {
        Self {
            pre: target_parent_rest.inverse() * source_parent_rest,
            post: source_rest.inverse() * target_rest,
        }
    }

    #[inline]
    pub fn apply(&self, key: Quat) -> Quat {
        (self.pre * key * self.post).normalize()
    }
}

/// Remapped tracks for one humanoid bone
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTrack {
    pub bone: BoneName,
    pub correction: RestCorrection,
    pub rotation: Option<RotationKeys>,
    pub translation: Option<TranslationKeys>,
}

/// A clip expressed in humanoid bones, ready to play on the rig it was
/// remapped onto
#[derive(Debug, Clone, PartialEq)]
pub struct RemappedClip {
    pub name: String,
    pub duration: f32,
    tracks: BTreeMap<BoneName, BoneTrack>,
}

impl RemappedClip {
    /// Assemble a clip from already-remapped tracks. A later track for the
    /// same bone replaces an earlier one.
    pub fn from_tracks(name: &str, duration: f32, tracks: impl IntoIterator<Item = BoneTrack>) -> Self {
        Self {
            name: name.to_string(),
            duration,
            tracks: tracks.into_iter().map(|track| (track.bone, track)).collect(),
        }
    }

    pub fn track(&self, bone: BoneName) -> Option<&BoneTrack> {
        self.tracks.get(&bone)
    }

    /// Tracks in taxonomy order
    pub fn tracks(&self) -> impl Iterator<Item = &BoneTrack> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Write the pose at time `t` onto a rig. Bones the rig lacks are skipped.
    pub fn apply_at(&self, t: f32, rig: &mut Rig) {
        self.apply_where(t, rig, |_| true);
    }

    /// Like [`apply_at`](Self::apply_at), writing only bones accepted by
    /// `include`
    pub fn apply_where(&self, t: f32, rig: &mut Rig, include: impl Fn(BoneName) -> bool) {
        for track in self.tracks.values().filter(|track| include(track.bone)) {
            let Some(node) = rig.bone_mut(track.bone) else {
                continue;
            };
            if let Some(rotation) = track.rotation.as_ref().and_then(|keys| keys.sample(t)) {
                node.rotation = rotation;
            }
            if let Some(translation) = track.translation.as_ref().and_then(|keys| keys.sample(t)) {
                node.translation = translation;
            }
        }
    }
}

/// Remaps source clips onto a humanoid rig
#[derive(Debug, Clone)]
pub struct ClipRemapper<C = CorrespondenceTable> {
    correspondence: C,
}

impl ClipRemapper<CorrespondenceTable> {
    /// Remapper for Mixamo-authored clips
    pub fn mixamo() -> Self {
        Self::new(CorrespondenceTable::mixamo())
    }
}

impl<C: BoneCorrespondence> ClipRemapper<C> {
    pub fn new(correspondence: C) -> Self {
        Self { correspondence }
    }

    /// Remap against a rig that may still be loading. Returns `None` until
    /// the rig is ready; callers retry once it is.
    pub fn remap(
        &self,
        clip: &SourceClip,
        source: &SourceSkeleton,
        target: &AssetState<Rig>,
    ) -> Option<RemappedClip> {
        let Some(rig) = target.ready() else {
            debug!(clip = %clip.name, state = target.label(), "remap deferred: rig not ready");
            return None;
        };
        self.remap_onto(clip, source, rig)
    }

    /// Remap onto a loaded rig. Returns `None` if the rig has no humanoid
    /// bind pose to correct against.
    pub fn remap_onto(&self, clip: &SourceClip, source: &SourceSkeleton, rig: &Rig) -> Option<RemappedClip> {
        if rig.humanoid().is_empty() {
            debug!(clip = %clip.name, "remap deferred: rig has no humanoid bind pose");
            return None;
        }

        let legacy = rig.meta_version() == MetaVersion::V0;
        let hips_scale = self.hips_scale(source, rig);
        let mut tracks: BTreeMap<BoneName, BoneTrack> = BTreeMap::new();
        let mut dropped = 0usize;

        for track in &clip.tracks {
            let Some(bone) = self.correspondence.bone_for(&track.joint) else {
                trace!(joint = %track.joint, "no humanoid counterpart, dropped");
                dropped += 1;
                continue;
            };
            let (Some(source_idx), Some(target_idx)) = (source.index(&track.joint), rig.bone_index(bone)) else {
                trace!(joint = %track.joint, bone = %bone, "joint or bone missing, dropped");
                dropped += 1;
                continue;
            };
            // Root motion only
            if matches!(track.channel, SourceChannel::Translation(_)) && bone != BoneName::Hips {
                trace!(joint = %track.joint, bone = %bone, "translation off the hips, dropped");
                dropped += 1;
                continue;
            }

            let target_parent_rest = rig
                .node(target_idx)
                .and_then(|node| node.parent)
                .map(|parent| rig.rest_world_rotation(parent))
                .unwrap_or(Quat::IDENTITY);
            let correction = RestCorrection::between(
                source.rest_world_rotation(source_idx),
                source.parent_rest_world_rotation(source_idx),
                rig.rest_world_rotation(target_idx),
                target_parent_rest,
            );

            let entry = tracks.entry(bone).or_insert(BoneTrack {
                bone,
                correction,
                rotation: None,
                translation: None,
            });

            match &track.channel {
                SourceChannel::Rotation(keys) => {
                    entry.rotation = Some(keys.map(|key| {
                        let corrected = correction.apply(key);
                        if legacy {
                            Quat::from_xyzw(-corrected.x, corrected.y, -corrected.z, corrected.w)
                        } else {
                            corrected
                        }
                    }));
                }
                SourceChannel::Translation(keys) => {
                    entry.translation = Some(keys.map(|value| {
                        let flipped = if legacy {
                            Vec3::new(-value.x, value.y, -value.z)
                        } else {
                            value
                        };
                        flipped * hips_scale
                    }));
                }
            }
        }

        debug!(
            clip = %clip.name,
            bones = tracks.len(),
            dropped,
            hips_scale,
            "clip remapped"
        );

        Some(RemappedClip {
            name: clip.name.clone(),
            duration: clip.duration,
            tracks,
        })
    }

    /// Ratio of target to source hips height, used to scale root motion
    fn hips_scale(&self, source: &SourceSkeleton, rig: &Rig) -> f32 {
        let source_height = (0..source.len())
            .filter_map(|idx| source.joint(idx))
            .find(|joint| self.correspondence.bone_for(&joint.name) == Some(BoneName::Hips))
            .map(|joint| joint.rest_translation.y.abs());
        match (source_height, rig.rest_hips_height()) {
            (Some(source_height), Some(target_height)) if source_height > f32::EPSILON => {
                target_height / source_height
            }
            _ => 1.0,
        }
    }
}
