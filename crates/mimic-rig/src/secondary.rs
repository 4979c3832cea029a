//! Secondary motion hooks
//!
//! Anything the rig integrates over time on its own (spring bones, jiggle)
//! plugs in here and is advanced by [`Rig::update`](crate::Rig::update)
//! after all pose targets for the frame have been written.

use crate::RigNode;

pub trait SecondaryMotion: Send {
    fn name(&self) -> &str;

    /// Advance by `delta` seconds, reading and writing node transforms
    fn advance(&mut self, delta: f32, nodes: &mut [RigNode]);
}
