//! Angle helpers shared by the solvers
//!
//! Angles come out as fractions of π in [-1, 1] unless noted; the solvers
//! scale them back to radians where the rig expects radians.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

/// Wrap radians into (-π, π] and express as a fraction of π
pub fn normalize_angle(radians: f32) -> f32 {
    let mut angle = radians % TAU;
    if angle > PI {
        angle -= TAU;
    } else if angle < -PI {
        angle += TAU;
    }
    angle / PI
}

/// Fold an angle in [0, π] so that both straight (π) and fully folded (0)
/// ends map near 0, expressed as a fraction of π
pub fn normalize_radians(mut radians: f32) -> f32 {
    if radians >= FRAC_PI_2 {
        radians -= TAU;
    }
    if radians <= -FRAC_PI_2 {
        radians += TAU;
        radians = PI - radians;
    }
    radians / PI
}

/// Angle of the segment from (cx, cy) to (ex, ey)
#[inline]
pub fn find_2d_angle(cx: f32, cy: f32, ex: f32, ey: f32) -> f32 {
    (ey - cy).atan2(ex - cx)
}

/// Per-plane angles of the segment from `a` to `b` (x: zx, y: zy, z: xy)
pub fn find_rotation(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(
        normalize_angle(find_2d_angle(a.z, a.x, b.z, b.x)),
        normalize_angle(find_2d_angle(a.z, a.y, b.z, b.y)),
        normalize_angle(find_2d_angle(a.x, a.y, b.x, b.y)),
    )
}

/// Roll, pitch and yaw of the segment from `a` to `b`
pub fn segment_roll_pitch_yaw(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(
        normalize_angle(find_2d_angle(a.z, a.y, b.z, b.y)),
        normalize_angle(find_2d_angle(a.z, a.x, b.z, b.x)),
        normalize_angle(find_2d_angle(a.x, a.y, b.x, b.y)),
    )
}

/// Roll, pitch and yaw of the plane through `a`, `b` and `c`, with `a -> b`
/// as its X axis
pub fn plane_roll_pitch_yaw(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let qb = b - a;
    let qc = c - a;
    let unit_z = qb.cross(qc).normalize_or_zero();
    let unit_x = qb.normalize_or_zero();
    let unit_y = unit_z.cross(unit_x);

    let beta = finite_or_zero(unit_z.x.clamp(-1.0, 1.0).asin());
    let alpha = finite_or_zero((-unit_z.y).atan2(unit_z.z));
    let gamma = finite_or_zero((-unit_y.x).atan2(unit_x.x));

    Vec3::new(normalize_angle(alpha), normalize_angle(beta), normalize_angle(gamma))
}

/// Angle at `b` between `b -> a` and `b -> c`, folded by [`normalize_radians`]
pub fn angle_between(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let v1 = (a - b).normalize_or_zero();
    let v2 = (c - b).normalize_or_zero();
    let angle = v1.dot(v2).clamp(-1.0, 1.0).acos();
    normalize_radians(angle)
}

/// Distance in the image plane, ignoring depth
#[inline]
pub fn distance_2d(a: Vec3, b: Vec3) -> f32 {
    a.truncate().distance(b.truncate())
}

#[inline]
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
