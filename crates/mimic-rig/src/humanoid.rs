//! Humanoid bone map
//!
//! Resolved BoneName -> node index table, built once when the rig is
//! assembled. The table belongs to its rig instance, so swapping the rig
//! swaps (and thereby invalidates) the resolved handles.

use std::collections::BTreeMap;

use mimic_core::BoneName;

#[derive(Debug, Clone, Default)]
pub struct Humanoid {
    bones: BTreeMap<BoneName, usize>,
}

impl Humanoid {
    pub(crate) fn insert(&mut self, bone: BoneName, index: usize) {
        self.bones.insert(bone, index);
    }

    /// Node index for a bone, `None` if the rig lacks it
    #[inline]
    pub fn index(&self, bone: BoneName) -> Option<usize> {
        self.bones.get(&bone).copied()
    }

    pub fn contains(&self, bone: BoneName) -> bool {
        self.bones.contains_key(&bone)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Resolved bones in taxonomy order
    pub fn iter(&self) -> impl Iterator<Item = (BoneName, usize)> + '_ {
        self.bones.iter().map(|(bone, idx)| (*bone, *idx))
    }

    /// Bones of the taxonomy this rig does not provide
    pub fn missing(&self) -> Vec<BoneName> {
        BoneName::ALL
            .iter()
            .copied()
            .filter(|bone| !self.contains(*bone))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanoid_lookup() {
        let mut humanoid = Humanoid::default();
        humanoid.insert(BoneName::Hips, 3);
        humanoid.insert(BoneName::Neck, 7);

        assert_eq!(humanoid.index(BoneName::Hips), Some(3));
        assert_eq!(humanoid.index(BoneName::Head), None);
        assert_eq!(humanoid.len(), 2);
        assert_eq!(humanoid.missing().len(), BoneName::count() - 2);
        assert_eq!(humanoid.iter().next(), Some((BoneName::Hips, 3)));
    }
}
