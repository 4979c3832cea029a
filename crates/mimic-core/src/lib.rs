//! MIMIC Core - Fundamental types and primitives
//!
//! This crate defines the vocabulary shared by every other MIMIC crate:
//! - Humanoid bone taxonomy (BoneName, Side)
//! - Expression channels (ExpressionName)
//! - Operating mode (Mode)
//! - Asynchronous asset readiness (AssetState)
//! - Smoothing and axis-remapping math
//! - Error types

pub mod asset;
pub mod bone;
pub mod error;
pub mod expression;
pub mod math;
pub mod mode;

pub use asset::*;
pub use bone::*;
pub use error::*;
pub use expression::*;
pub use math::*;
pub use mode::*;
