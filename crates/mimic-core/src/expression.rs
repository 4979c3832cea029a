//! Facial expression channels
//!
//! Named blendable facial parameters. The lip-sync and blink channels are
//! driven by the face solver while tracking; the emotion channels are always
//! driven by manual overrides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MimicError;

/// Expression preset identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpressionName {
    // Lip sync
    Aa,
    Ih,
    Ou,
    Ee,
    Oh,

    // Blink
    Blink,
    BlinkLeft,
    BlinkRight,

    // Emotion
    Happy,
    Angry,
    Sad,
    Relaxed,
    Surprised,
    Neutral,
}

impl ExpressionName {
    pub const ALL: &'static [ExpressionName] = &[
        ExpressionName::Aa,
        ExpressionName::Ih,
        ExpressionName::Ou,
        ExpressionName::Ee,
        ExpressionName::Oh,
        ExpressionName::Blink,
        ExpressionName::BlinkLeft,
        ExpressionName::BlinkRight,
        ExpressionName::Happy,
        ExpressionName::Angry,
        ExpressionName::Sad,
        ExpressionName::Relaxed,
        ExpressionName::Surprised,
        ExpressionName::Neutral,
    ];

    /// Channels the face solver drives while tracking: five mouth shapes
    /// and two blinks
    pub const SOLVED: &'static [ExpressionName] = &[
        ExpressionName::Aa,
        ExpressionName::Ih,
        ExpressionName::Ee,
        ExpressionName::Oh,
        ExpressionName::Ou,
        ExpressionName::BlinkLeft,
        ExpressionName::BlinkRight,
    ];

    /// Emotion channels that are always manually controlled
    pub const EMOTIONS: &'static [ExpressionName] = &[
        ExpressionName::Angry,
        ExpressionName::Sad,
        ExpressionName::Happy,
    ];

    /// Stable string identifier
    pub fn as_str(self) -> &'static str {
        match self {
            ExpressionName::Aa => "aa",
            ExpressionName::Ih => "ih",
            ExpressionName::Ou => "ou",
            ExpressionName::Ee => "ee",
            ExpressionName::Oh => "oh",
            ExpressionName::Blink => "blink",
            ExpressionName::BlinkLeft => "blinkLeft",
            ExpressionName::BlinkRight => "blinkRight",
            ExpressionName::Happy => "happy",
            ExpressionName::Angry => "angry",
            ExpressionName::Sad => "sad",
            ExpressionName::Relaxed => "relaxed",
            ExpressionName::Surprised => "surprised",
            ExpressionName::Neutral => "neutral",
        }
    }

    pub fn from_id(id: &str) -> Option<ExpressionName> {
        ExpressionName::ALL.iter().copied().find(|e| e.as_str() == id)
    }

    /// Is this a lip-sync (mouth shape) channel?
    pub fn is_mouth(self) -> bool {
        matches!(
            self,
            ExpressionName::Aa
                | ExpressionName::Ih
                | ExpressionName::Ou
                | ExpressionName::Ee
                | ExpressionName::Oh
        )
    }
}

impl fmt::Display for ExpressionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpressionName {
    type Err = MimicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExpressionName::from_id(s).ok_or_else(|| MimicError::UnknownExpression(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_roundtrip() {
        for expr in ExpressionName::ALL {
            assert_eq!(expr.as_str().parse::<ExpressionName>().unwrap(), *expr);
        }
    }

    #[test]
    fn test_solved_channels() {
        assert_eq!(ExpressionName::SOLVED.len(), 7);
        assert_eq!(
            ExpressionName::SOLVED.iter().filter(|e| e.is_mouth()).count(),
            5
        );
        assert!(ExpressionName::EMOTIONS
            .iter()
            .all(|e| !ExpressionName::SOLVED.contains(e)));
    }
}
