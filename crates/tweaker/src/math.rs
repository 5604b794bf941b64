//! Geometry helpers on top of glam.
//!
//! Plane distance/mirroring, guarded matrix inversion, look rotations and a
//! few scalar helpers shared by the editing passes.

use glam::{Mat3, Mat4, Quat, Vec3, Vec4, Vec4Swizzles};
use serde::{Deserialize, Serialize};

/// Determinant magnitude below which a transform is treated as singular
const SINGULAR_EPSILON: f32 = 1e-12;

/// A plane `dot(normal, p) = distance` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Plane through the origin. The normal is normalized.
    pub fn through_origin(normal: Vec3) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            distance: 0.0,
        }
    }

    /// Plane through `point` with the given normal.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    /// Signed distance, positive on the side the normal points to.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }

    /// Reflect a point across the plane.
    pub fn mirror_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * (self.signed_distance(point) * 2.0)
    }

    /// Reflect a direction across the plane orientation.
    pub fn mirror_vector(&self, v: Vec3) -> Vec3 {
        v - self.normal * (self.normal.dot(v) * 2.0)
    }

    /// Closest point on the plane.
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }
}

/// Invert a transform, or `None` if it is singular or non-finite.
pub fn try_inverse(m: Mat4) -> Option<Mat4> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return None;
    }
    Some(m.inverse())
}

/// Rotation whose +Z axis points along `forward` and whose +Y axis is as close
/// to `up` as possible. Falls back to identity for degenerate input.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let z = forward.normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut x = up.cross(z).normalize_or_zero();
    if x == Vec3::ZERO {
        // forward is parallel to up; pick any perpendicular axis
        x = z.any_orthonormal_vector();
    }
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

pub fn near_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

/// Angle between two directions in degrees, NaN if either is zero-length.
pub fn angle_between_deg(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom <= 0.0 {
        return f32::NAN;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Transform the xyz direction of a tangent, keeping its handedness in w.
pub fn transform_tangent(m: Mat4, t: Vec4) -> Vec4 {
    m.transform_vector3(t.xyz()).extend(t.w)
}

/// Additive saturating selection write.
pub fn add_selection(weight: &mut f32, delta: f32) {
    *weight = clamp01(*weight + delta);
}
