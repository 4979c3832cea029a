//! MIMIC Retarget - Authored clips on the humanoid rig
//!
//! Clips are authored against a different skeleton (Mixamo-style joint
//! names and bind pose). This crate:
//! - Models the source skeleton and its clips
//! - Maps source joints onto the humanoid taxonomy by name
//! - Bakes a per-bone rest-pose correction into every keyframe, once per
//!   (clip, rig) pair
//! - Plays one remapped clip at a time onto a rig

pub mod correspondence;
pub mod player;
pub mod remap;
pub mod source;
pub mod track;

pub use correspondence::*;
pub use player::*;
pub use remap::*;
pub use source::*;
pub use track::*;
