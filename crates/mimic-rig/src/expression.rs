//! Expression manager - blend shape weights of a loaded rig

use std::collections::BTreeMap;

use mimic_core::ExpressionName;

/// Weights for the expression channels a rig actually provides
#[derive(Debug, Clone, Default)]
pub struct ExpressionManager {
    weights: BTreeMap<ExpressionName, f32>,
}

impl ExpressionManager {
    /// Manager exposing only the given channels, all at zero
    pub fn new(channels: impl IntoIterator<Item = ExpressionName>) -> Self {
        Self {
            weights: channels.into_iter().map(|name| (name, 0.0)).collect(),
        }
    }

    /// Manager exposing every preset channel
    pub fn with_presets() -> Self {
        Self::new(ExpressionName::ALL.iter().copied())
    }

    pub fn has(&self, name: ExpressionName) -> bool {
        self.weights.contains_key(&name)
    }

    /// Current weight, 0 for channels this rig lacks
    pub fn value(&self, name: ExpressionName) -> f32 {
        self.weights.get(&name).copied().unwrap_or(0.0)
    }

    /// Set a weight, clamped to [0, 1]. Returns false for unknown channels.
    pub fn set_value(&mut self, name: ExpressionName, value: f32) -> bool {
        match self.weights.get_mut(&name) {
            Some(weight) => {
                *weight = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
                true
            }
            None => false,
        }
    }

    pub fn channels(&self) -> impl Iterator<Item = (ExpressionName, f32)> + '_ {
        self.weights.iter().map(|(name, weight)| (*name, *weight))
    }

    pub fn reset(&mut self) {
        for weight in self.weights.values_mut() {
            *weight = 0.0;
        }
    }
}
