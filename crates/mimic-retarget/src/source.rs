//! Source skeleton and clips
//!
//! The skeleton and clips an animation asset was authored against, before
//! any retargeting. Joint names follow the source tool's convention.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use mimic_core::{MimicError, MimicResult};

use crate::{RotationKeys, TranslationKeys};

/// A joint of the source skeleton in its bind pose
#[derive(Debug, Clone)]
pub struct SourceJoint {
    pub name: String,
    pub parent: Option<usize>,
    pub rest_rotation: Quat,
    pub rest_translation: Vec3,
}

/// Skeleton a clip was authored against. Joints are stored parents-first.
#[derive(Debug, Clone, Default)]
pub struct SourceSkeleton {
    joints: Vec<SourceJoint>,
    by_name: HashMap<String, usize>,
}

impl SourceSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a joint. `parent` must name a joint added earlier.
    pub fn add_joint(
        &mut self,
        name: &str,
        parent: Option<&str>,
        rest_rotation: Quat,
        rest_translation: Vec3,
    ) -> MimicResult<usize> {
        if self.by_name.contains_key(name) {
            return Err(MimicError::InvalidClip(format!("duplicate joint {name}")));
        }
        let parent = match parent {
            Some(parent_name) => Some(self.index(parent_name).ok_or_else(|| {
                MimicError::InvalidClip(format!("joint {name} references unknown parent {parent_name}"))
            })?),
            None => None,
        };
        let idx = self.joints.len();
        self.joints.push(SourceJoint {
            name: name.to_string(),
            parent,
            rest_rotation,
            rest_translation,
        });
        self.by_name.insert(name.to_string(), idx);
        Ok(idx)
    }

    pub fn index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn joint(&self, index: usize) -> Option<&SourceJoint> {
        self.joints.get(index)
    }

    pub fn joint_by_name(&self, name: &str) -> Option<&SourceJoint> {
        self.index(name).and_then(|idx| self.joints.get(idx))
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// World rotation of a joint in the bind pose
    pub fn rest_world_rotation(&self, index: usize) -> Quat {
        let mut rotation = Quat::IDENTITY;
        let mut cursor = Some(index);
        while let Some(idx) = cursor {
            let Some(joint) = self.joints.get(idx) else {
                break;
            };
            rotation = joint.rest_rotation * rotation;
            cursor = joint.parent;
        }
        rotation
    }

    /// World rotation of a joint's parent in the bind pose (identity for roots)
    pub fn parent_rest_world_rotation(&self, index: usize) -> Quat {
        self.joints
            .get(index)
            .and_then(|joint| joint.parent)
            .map(|parent| self.rest_world_rotation(parent))
            .unwrap_or(Quat::IDENTITY)
    }
}

/// What a source track animates
#[derive(Debug, Clone, PartialEq)]
pub enum SourceChannel {
    Rotation(RotationKeys),
    Translation(TranslationKeys),
}

/// One animated property of one source joint
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTrack {
    pub joint: String,
    pub channel: SourceChannel,
}

impl SourceTrack {
    pub fn rotation(joint: &str, keys: RotationKeys) -> Self {
        Self {
            joint: joint.to_string(),
            channel: SourceChannel::Rotation(keys),
        }
    }

    pub fn translation(joint: &str, keys: TranslationKeys) -> Self {
        Self {
            joint: joint.to_string(),
            channel: SourceChannel::Translation(keys),
        }
    }

    pub fn rotation_keys(&self) -> Option<&RotationKeys> {
        match &self.channel {
            SourceChannel::Rotation(keys) => Some(keys),
            SourceChannel::Translation(_) => None,
        }
    }
}

/// A clip as authored, keyed by source joint name
#[derive(Debug, Clone, PartialEq)]
pub struct SourceClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<SourceTrack>,
}

impl SourceClip {
    pub fn new(name: &str, duration: f32) -> Self {
        Self {
            name: name.to_string(),
            duration,
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: SourceTrack) -> Self {
        self.tracks.push(track);
        self
    }
}
