//! Ray-triangle intersection.
//!
//! This module provides ray-triangle intersection using the Moller-Trumbore
//! algorithm over two layouts of the same triangle set:
//! - indexed positions + triangle indices, as stored by the host
//! - [`TriangleSoa`], nine flat coordinate arrays built once per call when the
//!   same triangles are queried by many rays
//!
//! Both layouts scan triangles in order with the same arithmetic, so they pick
//! the same triangle for the same ray.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

impl TriangleHit {
    /// Interpolate a per-corner attribute at the hit point.
    pub fn interpolate<T>(&self, a0: T, a1: T, a2: T) -> T
    where
        T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
    {
        a0 * (1.0 - self.u - self.v) + a1 * self.u + a2 * self.v
    }
}

/// Nearest hit against a triangle set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// Index of the hit triangle
    pub triangle: usize,
    /// Intersection details (distance and barycentrics)
    pub hit: TriangleHit,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// # Arguments
/// * `ray_origin` - Origin point of the ray
/// * `ray_dir` - Direction of the ray (should be normalized for consistent t values)
/// * `v0`, `v1`, `v2` - Triangle vertices
///
/// # Returns
/// `Some(TriangleHit)` if ray intersects, `None` for misses, hits behind the
/// origin, and rays parallel to (or triangles degenerate in) the plane.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray lies in the plane of the triangle, or the triangle is degenerate
    if !(det.abs() >= EPSILON) {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Interpolate a Vec3 attribute using barycentric coordinates.
pub fn interpolate_vec3(v0: Vec3, v1: Vec3, v2: Vec3, u: f32, v: f32) -> Vec3 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Interpolate a Vec2 attribute (like UVs) using barycentric coordinates.
pub fn interpolate_vec2(v0: Vec2, v1: Vec2, v2: Vec2, u: f32, v: f32) -> Vec2 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Barycentric weights (w0, w1, w2) of a point with respect to a triangle.
///
/// The point is projected onto the triangle plane first. Degenerate triangles
/// give all weight to the first corner.
pub fn barycentric(p: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let e0 = v1 - v0;
    let e1 = v2 - v0;
    let ep = p - v0;
    let d00 = e0.dot(e0);
    let d01 = e0.dot(e1);
    let d11 = e1.dot(e1);
    let d20 = ep.dot(e0);
    let d21 = ep.dot(e1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f32::EPSILON {
        return Vec3::X;
    }
    let u = (d11 * d20 - d01 * d21) / denom;
    let v = (d00 * d21 - d01 * d20) / denom;
    Vec3::new(1.0 - u - v, u, v)
}

/// Interpolate a Vec4 attribute (like tangents) at a point on a triangle.
pub fn interpolate_vec4_at(p: Vec3, v: [Vec3; 3], a: [Vec4; 3]) -> Vec4 {
    let w = barycentric(p, v[0], v[1], v[2]);
    a[0] * w.x + a[1] * w.y + a[2] * w.z
}

/// Cast a ray against an indexed triangle list and return the closest hit.
///
/// Triangles are scanned in index order; a later triangle replaces the current
/// best only when strictly closer.
pub fn raycast_indexed(
    ray_origin: Vec3,
    ray_dir: Vec3,
    positions: &[Vec3],
    indices: &[u32],
) -> Option<MeshHit> {
    let mut closest: Option<MeshHit> = None;

    for (triangle, tri) in indices.chunks_exact(3).enumerate() {
        let v0 = positions[tri[0] as usize];
        let v1 = positions[tri[1] as usize];
        let v2 = positions[tri[2] as usize];

        if let Some(hit) = ray_triangle_intersection(ray_origin, ray_dir, v0, v1, v2) {
            let dominated = match &closest {
                Some(prev) => hit.t >= prev.hit.t,
                None => false,
            };
            if !dominated {
                closest = Some(MeshHit { triangle, hit });
            }
        }
    }

    closest
}

/// Flattened structure-of-arrays copy of a triangle set.
///
/// `x[c][i]` is the x coordinate of corner `c` of triangle `i`, and likewise
/// for `y` and `z`.
#[derive(Debug, Clone, Default)]
pub struct TriangleSoa {
    x: [Vec<f32>; 3],
    y: [Vec<f32>; 3],
    z: [Vec<f32>; 3],
}

impl TriangleSoa {
    /// Flatten an indexed triangle list, transforming every corner by `transform`.
    pub fn from_indexed(positions: &[Vec3], indices: &[u32], transform: Mat4) -> Self {
        let triangle_count = indices.len() / 3;
        let mut soa = Self {
            x: std::array::from_fn(|_| Vec::with_capacity(triangle_count)),
            y: std::array::from_fn(|_| Vec::with_capacity(triangle_count)),
            z: std::array::from_fn(|_| Vec::with_capacity(triangle_count)),
        };

        for tri in indices.chunks_exact(3) {
            for corner in 0..3 {
                let p = transform.transform_point3(positions[tri[corner] as usize]);
                soa.x[corner].push(p.x);
                soa.y[corner].push(p.y);
                soa.z[corner].push(p.z);
            }
        }

        soa
    }

    /// Number of triangles
    pub fn len(&self) -> usize {
        self.x[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Corner positions of a triangle
    pub fn corners(&self, triangle: usize) -> [Vec3; 3] {
        std::array::from_fn(|c| {
            Vec3::new(self.x[c][triangle], self.y[c][triangle], self.z[c][triangle])
        })
    }

    /// Cast a ray and return the closest hit, with the same tie rules as
    /// [`raycast_indexed`].
    pub fn raycast(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<MeshHit> {
        let mut closest: Option<MeshHit> = None;

        for triangle in 0..self.len() {
            let [v0, v1, v2] = self.corners(triangle);
            if let Some(hit) = ray_triangle_intersection(ray_origin, ray_dir, v0, v1, v2) {
                let dominated = match &closest {
                    Some(prev) => hit.t >= prev.hit.t,
                    None => false,
                };
                if !dominated {
                    closest = Some(MeshHit { triangle, hit });
                }
            }
        }

        closest
    }
}
