//! Rig node graph
//!
//! Nodes are stored parents-first. Rotations and translations are local to
//! the parent node; world transforms are resolved on demand by walking the
//! parent chain.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use mimic_core::{BoneName, ExpressionName, MimicError, MimicResult};
use tracing::{debug, warn};

use crate::{ExpressionManager, Humanoid, LookAt, LookAtConfig, SecondaryMotion};

/// Orientation convention of the rig asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MetaVersion {
    /// Legacy rigs face -Z; retargeted rotations and translations have
    /// their X and Z components negated.
    V0,
    #[default]
    V1,
}

/// One node of the rig
#[derive(Debug, Clone)]
pub struct RigNode {
    pub name: String,
    pub parent: Option<usize>,
    /// Bind pose rotation, local to the parent
    pub rest_rotation: Quat,
    /// Bind pose translation, local to the parent
    pub rest_translation: Vec3,
    /// Current rotation, local to the parent
    pub rotation: Quat,
    /// Current translation, local to the parent
    pub translation: Vec3,
}

impl RigNode {
    pub fn new(name: impl Into<String>, parent: Option<usize>, rest_rotation: Quat, rest_translation: Vec3) -> Self {
        Self {
            name: name.into(),
            parent,
            rest_rotation,
            rest_translation,
            rotation: rest_rotation,
            translation: rest_translation,
        }
    }

    /// Put the node back in its bind pose
    pub fn reset(&mut self) {
        self.rotation = self.rest_rotation;
        self.translation = self.rest_translation;
    }
}

/// A loaded character rig
pub struct Rig {
    nodes: Vec<RigNode>,
    by_name: HashMap<String, usize>,
    humanoid: Humanoid,
    expressions: Option<ExpressionManager>,
    look_at: Option<LookAt>,
    secondary: Vec<Box<dyn SecondaryMotion>>,
    meta_version: MetaVersion,
    elapsed: f32,
}

impl std::fmt::Debug for Rig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rig")
            .field("nodes", &self.nodes.len())
            .field("humanoid_bones", &self.humanoid.len())
            .field("expressions", &self.expressions.is_some())
            .field("look_at", &self.look_at.is_some())
            .field("secondary", &self.secondary.len())
            .field("meta_version", &self.meta_version)
            .finish()
    }
}

impl Rig {
    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[RigNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&RigNode> {
        self.nodes.get(index)
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<&RigNode> {
        self.node_index(name).and_then(|idx| self.nodes.get(idx))
    }

    pub fn humanoid(&self) -> &Humanoid {
        &self.humanoid
    }

    pub fn meta_version(&self) -> MetaVersion {
        self.meta_version
    }

    /// Seconds of `update` integrated since the rig was built
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Node index of a humanoid bone
    pub fn bone_index(&self, bone: BoneName) -> Option<usize> {
        self.humanoid.index(bone)
    }

    /// Look up a humanoid bone. `None` if this rig lacks it.
    pub fn bone(&self, bone: BoneName) -> Option<&RigNode> {
        self.bone_index(bone).and_then(|idx| self.nodes.get(idx))
    }

    /// Mutable humanoid bone handle. `None` if this rig lacks it.
    pub fn bone_mut(&mut self, bone: BoneName) -> Option<&mut RigNode> {
        let idx = self.bone_index(bone)?;
        self.nodes.get_mut(idx)
    }

    /// Current local rotation of a humanoid bone
    pub fn bone_rotation(&self, bone: BoneName) -> Option<Quat> {
        self.bone(bone).map(|node| node.rotation)
    }

    /// Set the local rotation of a humanoid bone. Returns false (and does
    /// nothing) if the rig lacks the bone.
    pub fn set_bone_rotation(&mut self, bone: BoneName, rotation: Quat) -> bool {
        match self.bone_mut(bone) {
            Some(node) => {
                node.rotation = rotation;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn expressions(&self) -> Option<&ExpressionManager> {
        self.expressions.as_ref()
    }

    pub fn has_expressions(&self) -> bool {
        self.expressions.is_some()
    }

    /// Current weight of an expression channel, 0 if absent
    pub fn expression_weight(&self, name: ExpressionName) -> f32 {
        self.expressions
            .as_ref()
            .map(|manager| manager.value(name))
            .unwrap_or(0.0)
    }

    /// Set an expression weight. No-op when the rig has no expression
    /// system or lacks the channel.
    pub fn set_expression_weight(&mut self, name: ExpressionName, value: f32) -> bool {
        match self.expressions.as_mut() {
            Some(manager) => manager.set_value(name, value),
            None => false,
        }
    }

    /// Install (or replace) the expression system, e.g. once morph targets
    /// finish loading
    pub fn attach_expressions(&mut self, manager: ExpressionManager) {
        self.expressions = Some(manager);
    }

    // ------------------------------------------------------------------
    // Look-at
    // ------------------------------------------------------------------

    pub fn look_at(&self) -> Option<&LookAt> {
        self.look_at.as_ref()
    }

    /// Point the eyes at a world-space position on the next `update`
    pub fn set_look_at_target(&mut self, target: Vec3) {
        if let Some(look_at) = self.look_at.as_mut() {
            look_at.target = Some(target);
        }
    }

    /// Replace the look-at range mapping. No-op without look-at.
    pub fn configure_look_at(&mut self, config: LookAtConfig) {
        if let Some(look_at) = self.look_at.as_mut() {
            look_at.config = config;
        }
    }

    pub fn clear_look_at_target(&mut self) {
        if let Some(look_at) = self.look_at.as_mut() {
            look_at.target = None;
        }
    }

    // ------------------------------------------------------------------
    // Secondary motion
    // ------------------------------------------------------------------

    pub fn add_secondary(&mut self, motion: Box<dyn SecondaryMotion>) {
        debug!(motion = motion.name(), "secondary motion attached");
        self.secondary.push(motion);
    }

    // ------------------------------------------------------------------
    // Forward kinematics
    // ------------------------------------------------------------------

    /// World rotation of a node in the current pose
    pub fn world_rotation(&self, index: usize) -> Quat {
        self.accumulate(index, |node| (node.rotation, node.translation)).0
    }

    /// World position of a node in the current pose
    pub fn world_position(&self, index: usize) -> Vec3 {
        self.accumulate(index, |node| (node.rotation, node.translation)).1
    }

    /// World rotation of a node in the bind pose
    pub fn rest_world_rotation(&self, index: usize) -> Quat {
        self.accumulate(index, |node| (node.rest_rotation, node.rest_translation)).0
    }

    /// World position of a node in the bind pose
    pub fn rest_world_position(&self, index: usize) -> Vec3 {
        self.accumulate(index, |node| (node.rest_rotation, node.rest_translation)).1
    }

    fn accumulate(&self, index: usize, local: impl Fn(&RigNode) -> (Quat, Vec3)) -> (Quat, Vec3) {
        let mut chain = Vec::new();
        let mut cursor = Some(index);
        while let Some(idx) = cursor {
            let Some(node) = self.nodes.get(idx) else {
                break;
            };
            chain.push(idx);
            cursor = node.parent;
        }

        let mut rotation = Quat::IDENTITY;
        let mut position = Vec3::ZERO;
        for idx in chain.into_iter().rev() {
            let (r, t) = local(&self.nodes[idx]);
            position += rotation * t;
            rotation = rotation * r;
        }
        (rotation, position)
    }

    /// Height of the hips above the rig root in the bind pose
    pub fn rest_hips_height(&self) -> Option<f32> {
        let hips = self.bone_index(BoneName::Hips)?;
        Some(self.rest_world_position(hips).y.abs())
    }

    /// Return every node to the bind pose
    pub fn reset_pose(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    /// Advance the rig's own time integration: eye look-at, then every
    /// secondary motion hook.
    pub fn update(&mut self, delta: f32) {
        self.elapsed += delta;
        self.apply_look_at();

        let mut secondary = std::mem::take(&mut self.secondary);
        for motion in &mut secondary {
            motion.advance(delta, &mut self.nodes);
        }
        self.secondary = secondary;
    }

    fn apply_look_at(&mut self) {
        let Some(target) = self.look_at.as_ref().and_then(|l| l.target) else {
            return;
        };
        let Some(head) = self.bone_index(BoneName::Head) else {
            return;
        };
        let head_rotation = self.world_rotation(head);
        let head_position = self.world_position(head);

        let Some(look_at) = self.look_at.as_mut() else {
            return;
        };
        let eye_rotation = look_at.solve(head_position, head_rotation, target);

        for eye in [BoneName::LeftEye, BoneName::RightEye] {
            if let Some(node) = self.bone_mut(eye) {
                node.rotation = node.rest_rotation * eye_rotation;
            }
        }
    }
}

/// Builder for [`Rig`]
#[derive(Default)]
pub struct RigBuilder {
    nodes: Vec<RigNode>,
    by_name: HashMap<String, usize>,
    humanoid: Vec<(BoneName, String)>,
    expressions: Option<ExpressionManager>,
    look_at: Option<LookAtConfig>,
    meta_version: MetaVersion,
    error: Option<MimicError>,
}

impl RigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. `parent` must name a node added earlier.
    pub fn node(mut self, name: &str, parent: Option<&str>, rest_rotation: Quat, rest_translation: Vec3) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.by_name.contains_key(name) {
            self.error = Some(MimicError::InvalidConfig(format!("duplicate node {name}")));
            return self;
        }
        let parent_idx = match parent {
            Some(parent_name) => match self.by_name.get(parent_name) {
                Some(idx) => Some(*idx),
                None => {
                    self.error = Some(MimicError::InvalidConfig(format!(
                        "node {name} references unknown parent {parent_name}"
                    )));
                    return self;
                }
            },
            None => None,
        };
        self.by_name.insert(name.to_string(), self.nodes.len());
        self.nodes
            .push(RigNode::new(name, parent_idx, rest_rotation, rest_translation));
        self
    }

    /// Map a humanoid bone onto a node
    pub fn humanoid_bone(mut self, bone: BoneName, node_name: &str) -> Self {
        self.humanoid.push((bone, node_name.to_string()));
        self
    }

    pub fn expressions(mut self, manager: ExpressionManager) -> Self {
        self.expressions = Some(manager);
        self
    }

    pub fn look_at(mut self, config: LookAtConfig) -> Self {
        self.look_at = Some(config);
        self
    }

    pub fn meta_version(mut self, version: MetaVersion) -> Self {
        self.meta_version = version;
        self
    }

    pub fn build(self) -> MimicResult<Rig> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut humanoid = Humanoid::default();
        for (bone, node_name) in &self.humanoid {
            match self.by_name.get(node_name) {
                Some(idx) => humanoid.insert(*bone, *idx),
                None => warn!(bone = %bone, node = %node_name, "humanoid bone maps to missing node"),
            }
        }

        debug!(
            nodes = self.nodes.len(),
            humanoid_bones = humanoid.len(),
            "rig built"
        );

        Ok(Rig {
            nodes: self.nodes,
            by_name: self.by_name,
            humanoid,
            expressions: self.expressions,
            look_at: self.look_at.map(LookAt::new),
            secondary: Vec::new(),
            meta_version: self.meta_version,
            elapsed: 0.0,
        })
    }
}
