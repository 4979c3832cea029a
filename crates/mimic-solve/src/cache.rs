//! Solved-pose cache
//!
//! One slot per category (face, pose, each hand). The adapter replaces a
//! whole slot at a time and the frame loop takes `Arc` snapshots, so a
//! reader never observes a half-written solution even when capture runs on
//! another thread.

use std::sync::Arc;

use mimic_core::Side;
use parking_lot::RwLock;

use crate::{FaceSolution, HandSolution, PoseSolution};

type Slot<T> = RwLock<Option<Arc<T>>>;

#[derive(Debug, Default)]
struct Slots {
    face: Slot<FaceSolution>,
    pose: Slot<PoseSolution>,
    left_hand: Slot<HandSolution>,
    right_hand: Slot<HandSolution>,
}

/// Shared handle to the latest solved poses. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct SolvedPoseCache {
    slots: Arc<Slots>,
}

/// Latest solution per category as of one read
#[derive(Debug, Clone, Default)]
pub struct SolvedSnapshot {
    pub face: Option<Arc<FaceSolution>>,
    pub pose: Option<Arc<PoseSolution>>,
    pub left_hand: Option<Arc<HandSolution>>,
    pub right_hand: Option<Arc<HandSolution>>,
}

impl SolvedSnapshot {
    pub fn hand(&self, side: Side) -> Option<&HandSolution> {
        match side {
            Side::Left => self.left_hand.as_deref(),
            Side::Right => self.right_hand.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.face.is_none() && self.pose.is_none() && self.left_hand.is_none() && self.right_hand.is_none()
    }
}

impl SolvedPoseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_face(&self, solution: FaceSolution) {
        *self.slots.face.write() = Some(Arc::new(solution));
    }

    pub fn store_pose(&self, solution: PoseSolution) {
        *self.slots.pose.write() = Some(Arc::new(solution));
    }

    /// Store a hand under the side it was solved for
    pub fn store_hand(&self, solution: HandSolution) {
        *self.hand_slot(solution.side).write() = Some(Arc::new(solution));
    }

    pub fn face(&self) -> Option<Arc<FaceSolution>> {
        self.slots.face.read().clone()
    }

    pub fn pose(&self) -> Option<Arc<PoseSolution>> {
        self.slots.pose.read().clone()
    }

    pub fn hand(&self, side: Side) -> Option<Arc<HandSolution>> {
        self.hand_slot(side).read().clone()
    }

    /// Read every slot
    pub fn snapshot(&self) -> SolvedSnapshot {
        SolvedSnapshot {
            face: self.face(),
            pose: self.pose(),
            left_hand: self.hand(Side::Left),
            right_hand: self.hand(Side::Right),
        }
    }

    /// Mark every category absent
    pub fn clear(&self) {
        *self.slots.face.write() = None;
        *self.slots.pose.write() = None;
        *self.slots.left_hand.write() = None;
        *self.slots.right_hand.write() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slots.face.read().is_none()
            && self.slots.pose.read().is_none()
            && self.slots.left_hand.read().is_none()
            && self.slots.right_hand.read().is_none()
    }

    fn hand_slot(&self, side: Side) -> &Slot<HandSolution> {
        match side {
            Side::Left => &self.slots.left_hand,
            Side::Right => &self.slots.right_hand,
        }
    }
}
