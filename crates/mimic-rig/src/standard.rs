//! Standard normalized humanoid
//!
//! A complete rig with every taxonomy bone, identity bind rotations and
//! adult proportions (metres, Y up, facing +Z, left side on +X). Useful as a
//! retarget target when no asset is available and for tests and demos.

use glam::{Quat, Vec3};
use mimic_core::{BoneName, MimicResult, Side};

use crate::{ExpressionManager, LookAtConfig, Rig, RigBuilder};

/// Parent-relative bind offset of a bone on the standard humanoid
pub fn standard_offset(bone: BoneName) -> Vec3 {
    use BoneName::*;

    if bone.side() == Some(Side::Right) {
        let left = standard_offset(bone.mirrored());
        return Vec3::new(-left.x, left.y, left.z);
    }

    match bone {
        Hips => Vec3::new(0.0, 0.95, 0.0),
        Spine => Vec3::new(0.0, 0.10, 0.0),
        Chest => Vec3::new(0.0, 0.12, 0.0),
        UpperChest => Vec3::new(0.0, 0.12, 0.0),
        Neck => Vec3::new(0.0, 0.12, 0.0),
        Head => Vec3::new(0.0, 0.08, 0.0),
        LeftEye => Vec3::new(0.03, 0.06, 0.07),
        Jaw => Vec3::new(0.0, -0.02, 0.03),

        LeftUpperLeg => Vec3::new(0.09, -0.05, 0.0),
        LeftLowerLeg => Vec3::new(0.0, -0.42, 0.0),
        LeftFoot => Vec3::new(0.0, -0.42, 0.0),
        LeftToes => Vec3::new(0.0, -0.06, 0.12),

        LeftShoulder => Vec3::new(0.04, 0.10, 0.0),
        LeftUpperArm => Vec3::new(0.10, 0.0, 0.0),
        LeftLowerArm => Vec3::new(0.26, 0.0, 0.0),
        LeftHand => Vec3::new(0.24, 0.0, 0.0),

        LeftThumbMetacarpal => Vec3::new(0.02, -0.01, 0.03),
        LeftThumbProximal => Vec3::new(0.03, 0.0, 0.02),
        LeftThumbDistal => Vec3::new(0.03, 0.0, 0.01),
        LeftIndexProximal => Vec3::new(0.08, 0.0, 0.03),
        LeftMiddleProximal => Vec3::new(0.085, 0.0, 0.01),
        LeftRingProximal => Vec3::new(0.08, 0.0, -0.01),
        LeftLittleProximal => Vec3::new(0.07, 0.0, -0.03),
        LeftIndexIntermediate | LeftMiddleIntermediate | LeftRingIntermediate
        | LeftLittleIntermediate => Vec3::new(0.035, 0.0, 0.0),
        LeftIndexDistal | LeftMiddleDistal | LeftRingDistal | LeftLittleDistal => {
            Vec3::new(0.025, 0.0, 0.0)
        }

        // Right side handled above
        _ => Vec3::ZERO,
    }
}

/// Builder preloaded with the full standard humanoid. Node names equal the
/// bone identifiers and hang off a `root` node.
pub fn standard_humanoid_builder() -> RigBuilder {
    let mut builder = RigBuilder::new().node("root", None, Quat::IDENTITY, Vec3::ZERO);
    for bone in BoneName::ALL {
        let parent = bone.parent().map(|p| p.as_str()).unwrap_or("root");
        builder = builder
            .node(bone.as_str(), Some(parent), Quat::IDENTITY, standard_offset(*bone))
            .humanoid_bone(*bone, bone.as_str());
    }
    builder
}

/// Standard humanoid with every expression preset and look-at enabled
pub fn standard_humanoid() -> MimicResult<Rig> {
    standard_humanoid_builder()
        .expressions(ExpressionManager::with_presets())
        .look_at(LookAtConfig::default())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_humanoid_is_complete() {
        let rig = standard_humanoid().unwrap();
        assert_eq!(rig.humanoid().len(), BoneName::count());
        assert!(rig.humanoid().missing().is_empty());
        assert_eq!(rig.len(), BoneName::count() + 1);
        assert!((rig.rest_hips_height().unwrap() - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_standard_humanoid_is_symmetric() {
        let rig = standard_humanoid().unwrap();
        let left = rig.rest_world_position(rig.bone_index(BoneName::LeftHand).unwrap());
        let right = rig.rest_world_position(rig.bone_index(BoneName::RightHand).unwrap());
        assert!((left.x + right.x).abs() < 1e-6);
        assert!((left.y - right.y).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_moves_eyes() {
        let mut rig = standard_humanoid().unwrap();
        let head = rig.bone_index(BoneName::Head).unwrap();
        let head_pos = rig.world_position(head);

        rig.set_look_at_target(head_pos + Vec3::new(1.0, 0.0, 1.0));
        rig.update(1.0 / 60.0);

        let eye = rig.bone_rotation(BoneName::LeftEye).unwrap();
        assert!(!eye.abs_diff_eq(Quat::IDENTITY, 1e-4));
        assert_eq!(
            rig.bone_rotation(BoneName::LeftEye),
            rig.bone_rotation(BoneName::RightEye)
        );
    }
}
