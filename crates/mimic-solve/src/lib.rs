//! MIMIC Solve - From camera landmarks to rotations and shapes
//!
//! The capture pipeline reports image-space landmarks for the face, the body
//! and each hand. This crate turns them into semantic data:
//! - Face: head rotation, eye openness, pupil offset, mouth shapes, brow raise
//! - Pose: hips, spine and arm rotations
//! - Hands: wrist rotation and per-segment finger curl
//!
//! The [`SolverAdapter`] receives detections, applies the mirroring and
//! guard policies, and publishes whole-category snapshots into a
//! [`SolvedPoseCache`] that the frame loop reads.

pub mod adapter;
pub mod cache;
pub mod face;
pub mod hand;
pub mod landmark;
pub mod pose;
pub mod solution;
pub mod vector;

pub use adapter::*;
pub use cache::*;
pub use face::*;
pub use hand::*;
pub use landmark::*;
pub use pose::*;
pub use solution::*;
