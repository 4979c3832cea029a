//! MIMIC Runtime - The per-frame avatar update
//!
//! Ties the other crates together behind one [`Avatar`]:
//! - Asset readiness (rig and clips load asynchronously)
//! - Mode state machine and the per-frame [`FrameContext`]
//! - Clip playback, then tracking or manual blending, then the rig's own
//!   time step
//! - Frame clock and statistics

pub mod avatar;
pub mod blender;
pub mod bone_map;
pub mod clock;
pub mod config;
pub mod context;
pub mod mode;

pub use avatar::*;
pub use blender::*;
pub use bone_map::*;
pub use clock::*;
pub use config::*;
pub use context::*;
pub use mode::*;
