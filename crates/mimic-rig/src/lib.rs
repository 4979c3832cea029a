//! MIMIC Rig - The loaded character skeleton
//!
//! A rig is a node graph with a bind pose, a humanoid map from
//! [`BoneName`](mimic_core::BoneName) to nodes, and the optional subsystems a
//! character asset may carry:
//! - Expression manager (blend shape weights)
//! - Look-at (eye bones tracking a target point)
//! - Secondary motion hooks advanced once per frame
//!
//! Everything here tolerates incomplete assets: a bone the rig lacks, or an
//! expression system it does not have, turns the corresponding write into a
//! no-op.

pub mod expression;
pub mod humanoid;
pub mod look_at;
pub mod rig;
pub mod secondary;
pub mod standard;

pub use expression::*;
pub use humanoid::*;
pub use look_at::*;
pub use rig::*;
pub use secondary::*;
pub use standard::*;
