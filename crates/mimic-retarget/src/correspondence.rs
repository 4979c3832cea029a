//! Source joint -> humanoid bone correspondence

use std::collections::HashMap;

use mimic_core::BoneName;
use tracing::warn;

/// Name-based mapping from a source skeleton's joints onto the taxonomy
pub trait BoneCorrespondence {
    /// Humanoid bone for a source joint name, `None` if it has no counterpart
    fn bone_for(&self, joint: &str) -> Option<BoneName>;
}

/// Mixamo rig naming
pub const MIXAMO_CORRESPONDENCE: &[(&str, BoneName)] = &[
    ("mixamorigHips", BoneName::Hips),
    ("mixamorigSpine", BoneName::Spine),
    ("mixamorigSpine1", BoneName::Chest),
    ("mixamorigSpine2", BoneName::UpperChest),
    ("mixamorigNeck", BoneName::Neck),
    ("mixamorigHead", BoneName::Head),
    ("mixamorigLeftShoulder", BoneName::LeftShoulder),
    ("mixamorigLeftArm", BoneName::LeftUpperArm),
    ("mixamorigLeftForeArm", BoneName::LeftLowerArm),
    ("mixamorigLeftHand", BoneName::LeftHand),
    ("mixamorigLeftHandThumb1", BoneName::LeftThumbMetacarpal),
    ("mixamorigLeftHandThumb2", BoneName::LeftThumbProximal),
    ("mixamorigLeftHandThumb3", BoneName::LeftThumbDistal),
    ("mixamorigLeftHandIndex1", BoneName::LeftIndexProximal),
    ("mixamorigLeftHandIndex2", BoneName::LeftIndexIntermediate),
    ("mixamorigLeftHandIndex3", BoneName::LeftIndexDistal),
    ("mixamorigLeftHandMiddle1", BoneName::LeftMiddleProximal),
    ("mixamorigLeftHandMiddle2", BoneName::LeftMiddleIntermediate),
    ("mixamorigLeftHandMiddle3", BoneName::LeftMiddleDistal),
    ("mixamorigLeftHandRing1", BoneName::LeftRingProximal),
    ("mixamorigLeftHandRing2", BoneName::LeftRingIntermediate),
    ("mixamorigLeftHandRing3", BoneName::LeftRingDistal),
    ("mixamorigLeftHandPinky1", BoneName::LeftLittleProximal),
    ("mixamorigLeftHandPinky2", BoneName::LeftLittleIntermediate),
    ("mixamorigLeftHandPinky3", BoneName::LeftLittleDistal),
    ("mixamorigRightShoulder", BoneName::RightShoulder),
    ("mixamorigRightArm", BoneName::RightUpperArm),
    ("mixamorigRightForeArm", BoneName::RightLowerArm),
    ("mixamorigRightHand", BoneName::RightHand),
    ("mixamorigRightHandThumb1", BoneName::RightThumbMetacarpal),
    ("mixamorigRightHandThumb2", BoneName::RightThumbProximal),
    ("mixamorigRightHandThumb3", BoneName::RightThumbDistal),
    ("mixamorigRightHandIndex1", BoneName::RightIndexProximal),
    ("mixamorigRightHandIndex2", BoneName::RightIndexIntermediate),
    ("mixamorigRightHandIndex3", BoneName::RightIndexDistal),
    ("mixamorigRightHandMiddle1", BoneName::RightMiddleProximal),
    ("mixamorigRightHandMiddle2", BoneName::RightMiddleIntermediate),
    ("mixamorigRightHandMiddle3", BoneName::RightMiddleDistal),
    ("mixamorigRightHandRing1", BoneName::RightRingProximal),
    ("mixamorigRightHandRing2", BoneName::RightRingIntermediate),
    ("mixamorigRightHandRing3", BoneName::RightRingDistal),
    ("mixamorigRightHandPinky1", BoneName::RightLittleProximal),
    ("mixamorigRightHandPinky2", BoneName::RightLittleIntermediate),
    ("mixamorigRightHandPinky3", BoneName::RightLittleDistal),
    ("mixamorigLeftUpLeg", BoneName::LeftUpperLeg),
    ("mixamorigLeftLeg", BoneName::LeftLowerLeg),
    ("mixamorigLeftFoot", BoneName::LeftFoot),
    ("mixamorigLeftToeBase", BoneName::LeftToes),
    ("mixamorigRightUpLeg", BoneName::RightUpperLeg),
    ("mixamorigRightLeg", BoneName::RightLowerLeg),
    ("mixamorigRightFoot", BoneName::RightFoot),
    ("mixamorigRightToeBase", BoneName::RightToes),
];

/// Correspondence backed by an owned lookup table
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceTable {
    map: HashMap<String, BoneName>,
}

impl CorrespondenceTable {
    /// The Mixamo naming table
    pub fn mixamo() -> Self {
        Self {
            map: MIXAMO_CORRESPONDENCE
                .iter()
                .map(|(joint, bone)| (joint.to_string(), *bone))
                .collect(),
        }
    }

    /// Build from (source joint, bone id) string pairs, e.g. loaded from a
    /// config file. Pairs naming an unknown bone are reported and skipped.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut map = HashMap::new();
        for (joint, bone_id) in pairs {
            match bone_id.parse::<BoneName>() {
                Ok(bone) => {
                    map.insert(joint.to_string(), bone);
                }
                Err(err) => warn!(joint, error = %err, "correspondence entry skipped"),
            }
        }
        Self { map }
    }

    pub fn insert(&mut self, joint: &str, bone: BoneName) {
        self.map.insert(joint.to_string(), bone);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl BoneCorrespondence for CorrespondenceTable {
    fn bone_for(&self, joint: &str) -> Option<BoneName> {
        self.map.get(joint).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixamo_table() {
        let table = CorrespondenceTable::mixamo();
        assert_eq!(table.len(), 52);
        assert_eq!(table.bone_for("mixamorigSpine1"), Some(BoneName::Chest));
        assert_eq!(
            table.bone_for("mixamorigRightHandPinky2"),
            Some(BoneName::RightLittleIntermediate)
        );
        assert_eq!(table.bone_for("mixamorigHeadTop_End"), None);
    }

    #[test]
    fn test_mixamo_table_is_injective() {
        let mut bones: Vec<_> = MIXAMO_CORRESPONDENCE.iter().map(|(_, b)| *b).collect();
        bones.sort();
        bones.dedup();
        assert_eq!(bones.len(), MIXAMO_CORRESPONDENCE.len());
    }

    #[test]
    fn test_unknown_bone_id_skipped() {
        let table = CorrespondenceTable::from_pairs([("Bip01_Pelvis", "hips"), ("Bip01_Tail", "tail")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.bone_for("Bip01_Pelvis"), Some(BoneName::Hips));
        assert_eq!(table.bone_for("Bip01_Tail"), None);
    }
}
