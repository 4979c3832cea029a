//! Mode state machine
//!
//! Two states, every transition legal, no terminal state. Switching only
//! changes which data path the blender consults on the next frame.

use mimic_core::Mode;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    mode: Mode,
    transitions: u64,
}

impl ModeMachine {
    /// Starts in [`Mode::Scripted`]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of actual mode changes so far
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Set the mode. Returns whether it changed.
    pub fn set(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }
        debug!(from = %self.mode, to = %mode, "mode transition");
        self.mode = mode;
        self.transitions += 1;
        true
    }
}
