//! Humanoid bone taxonomy
//!
//! A closed set of humanoid joints shared by the rig accessor, the clip
//! remapper's correspondence table and the per-frame blender. The string
//! identifiers are stable: they match the normalized humanoid naming used by
//! VRM-style rigs (`hips`, `leftUpperArm`, `rightIndexDistal`, ...).

use std::fmt;
use std::str::FromStr;

use crate::MimicError;

/// Body side of a bone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// The anatomically opposite side
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

macro_rules! humanoid_bones {
    ($($variant:ident => $id:literal,)*) => {
        /// Humanoid bone identifier
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum BoneName {
            $($variant,)*
        }

        impl BoneName {
            /// Every bone in the taxonomy, parents before children
            pub const ALL: &'static [BoneName] = &[$(BoneName::$variant,)*];

            /// Stable string identifier
            pub fn as_str(self) -> &'static str {
                match self {
                    $(BoneName::$variant => $id,)*
                }
            }

            /// Parse a stable identifier. Unknown names yield `None`.
            pub fn from_id(id: &str) -> Option<BoneName> {
                match id {
                    $($id => Some(BoneName::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

humanoid_bones! {
    Hips => "hips",
    Spine => "spine",
    Chest => "chest",
    UpperChest => "upperChest",
    Neck => "neck",
    Head => "head",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",

    LeftUpperLeg => "leftUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    LeftFoot => "leftFoot",
    LeftToes => "leftToes",
    RightUpperLeg => "rightUpperLeg",
    RightLowerLeg => "rightLowerLeg",
    RightFoot => "rightFoot",
    RightToes => "rightToes",

    LeftShoulder => "leftShoulder",
    LeftUpperArm => "leftUpperArm",
    LeftLowerArm => "leftLowerArm",
    LeftHand => "leftHand",
    RightShoulder => "rightShoulder",
    RightUpperArm => "rightUpperArm",
    RightLowerArm => "rightLowerArm",
    RightHand => "rightHand",

    LeftThumbMetacarpal => "leftThumbMetacarpal",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",

    RightThumbMetacarpal => "rightThumbMetacarpal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
}

impl BoneName {
    /// Number of bones in the taxonomy
    pub fn count() -> usize {
        Self::ALL.len()
    }

    /// Side of the body, `None` for bones on the midline
    pub fn side(self) -> Option<Side> {
        let id = self.as_str();
        if id.starts_with("left") {
            Some(Side::Left)
        } else if id.starts_with("right") {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Is this one of the thirty finger segments?
    pub fn is_finger(self) -> bool {
        let id = self.as_str();
        ["Thumb", "Index", "Middle", "Ring", "Little"]
            .iter()
            .any(|digit| id.contains(digit))
    }

    /// The same bone on the opposite side. Midline bones map to themselves.
    pub fn mirrored(self) -> BoneName {
        let id = self.as_str();
        let swapped = if let Some(rest) = id.strip_prefix("left") {
            format!("right{rest}")
        } else if let Some(rest) = id.strip_prefix("right") {
            format!("left{rest}")
        } else {
            return self;
        };
        BoneName::from_id(&swapped).unwrap_or(self)
    }

    /// Canonical parent in the humanoid hierarchy. `None` for the root.
    pub fn parent(self) -> Option<BoneName> {
        use BoneName::*;
        let parent = match self {
            Hips => return None,
            Spine => Hips,
            Chest => Spine,
            UpperChest => Chest,
            Neck => UpperChest,
            Head => Neck,
            LeftEye | RightEye | Jaw => Head,

            LeftUpperLeg | RightUpperLeg => Hips,
            LeftLowerLeg => LeftUpperLeg,
            LeftFoot => LeftLowerLeg,
            LeftToes => LeftFoot,
            RightLowerLeg => RightUpperLeg,
            RightFoot => RightLowerLeg,
            RightToes => RightFoot,

            LeftShoulder | RightShoulder => UpperChest,
            LeftUpperArm => LeftShoulder,
            LeftLowerArm => LeftUpperArm,
            LeftHand => LeftLowerArm,
            RightUpperArm => RightShoulder,
            RightLowerArm => RightUpperArm,
            RightHand => RightLowerArm,

            LeftThumbMetacarpal | LeftIndexProximal | LeftMiddleProximal | LeftRingProximal
            | LeftLittleProximal => LeftHand,
            LeftThumbProximal => LeftThumbMetacarpal,
            LeftThumbDistal => LeftThumbProximal,
            LeftIndexIntermediate => LeftIndexProximal,
            LeftIndexDistal => LeftIndexIntermediate,
            LeftMiddleIntermediate => LeftMiddleProximal,
            LeftMiddleDistal => LeftMiddleIntermediate,
            LeftRingIntermediate => LeftRingProximal,
            LeftRingDistal => LeftRingIntermediate,
            LeftLittleIntermediate => LeftLittleProximal,
            LeftLittleDistal => LeftLittleIntermediate,

            RightThumbMetacarpal | RightIndexProximal | RightMiddleProximal
            | RightRingProximal | RightLittleProximal => RightHand,
            RightThumbProximal => RightThumbMetacarpal,
            RightThumbDistal => RightThumbProximal,
            RightIndexIntermediate => RightIndexProximal,
            RightIndexDistal => RightIndexIntermediate,
            RightMiddleIntermediate => RightMiddleProximal,
            RightMiddleDistal => RightMiddleIntermediate,
            RightRingIntermediate => RightRingProximal,
            RightRingDistal => RightRingIntermediate,
            RightLittleIntermediate => RightLittleProximal,
            RightLittleDistal => RightLittleIntermediate,
        };
        Some(parent)
    }
}

impl fmt::Display for BoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoneName {
    type Err = MimicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoneName::from_id(s).ok_or_else(|| MimicError::UnknownBone(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_id_roundtrip() {
        for bone in BoneName::ALL {
            let parsed: BoneName = bone.as_str().parse().unwrap();
            assert_eq!(*bone, parsed);
        }
    }

    #[test]
    fn test_taxonomy_size() {
        assert_eq!(BoneName::count(), 55);
        assert_eq!(BoneName::ALL.iter().filter(|b| b.is_finger()).count(), 30);
    }

    #[test]
    fn test_unknown_bone_is_error() {
        let err = "mixamorigHips".parse::<BoneName>().unwrap_err();
        assert!(matches!(err, MimicError::UnknownBone(name) if name == "mixamorigHips"));
    }

    #[test]
    fn test_parents_precede_children() {
        for (idx, bone) in BoneName::ALL.iter().enumerate() {
            if let Some(parent) = bone.parent() {
                let parent_idx = BoneName::ALL.iter().position(|b| *b == parent).unwrap();
                assert!(parent_idx < idx, "{bone} listed before its parent {parent}");
            }
        }
    }

    #[test]
    fn test_mirrored_bones() {
        assert_eq!(BoneName::LeftUpperArm.mirrored(), BoneName::RightUpperArm);
        assert_eq!(BoneName::RightLittleDistal.mirrored(), BoneName::LeftLittleDistal);
        assert_eq!(BoneName::Neck.mirrored(), BoneName::Neck);
        assert_eq!(BoneName::LeftHand.side(), Some(Side::Left));
        assert_eq!(BoneName::Chest.side(), None);
    }
}
