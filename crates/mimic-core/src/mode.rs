//! Operating mode

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which data path feeds the avatar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Camera-driven: solved landmarks drive bones and expressions
    Tracking,
    /// Manual overrides and authored clips drive the avatar.
    /// Camera access is opt-in, so this is the initial mode.
    #[default]
    Scripted,
}

impl Mode {
    pub fn is_tracking(self) -> bool {
        self == Mode::Tracking
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Tracking => "tracking",
            Mode::Scripted => "scripted",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
