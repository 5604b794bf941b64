//! Attribute transfer by raycasting onto another mesh.
//!
//! Each working vertex casts a ray (forward, backward or both) against the
//! target's triangles and, on a hit, blends its position, normal and tangent
//! toward the values interpolated at the hit point. The target triangles are
//! flattened once per call into a [`TriangleSoa`] expressed in the working
//! mesh's local space.
//!
//! Ray directions come from a [`RaySource`]. Hosts pick one with
//! [`RayDirections`]; the choice is resolved once per call and the per-vertex
//! pass is monomorphized for it.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{ensure_len, Result, TweakerError};
use crate::mesh::MeshView;
use crate::raycast::{MeshHit, TriangleSoa};
use crate::types::{AttributeMask, ProjectionMode};

/// Source of per-vertex ray directions, in the working mesh's local space.
pub trait RaySource: Sync {
    fn direction(&self, vertex: usize, position: Vec3, normal: Vec3) -> Vec3;
}

/// Flip `dir` so it agrees with `normal`.
fn orient(dir: Vec3, normal: Vec3) -> Vec3 {
    if dir.dot(normal) > 0.0 { dir } else { -dir }
}

/// One caller-supplied direction per vertex.
#[derive(Debug, Clone, Copy)]
pub struct PerVertexRays<'r> {
    directions: &'r [Vec3],
}

impl<'r> PerVertexRays<'r> {
    pub fn new(directions: &'r [Vec3]) -> Self {
        Self { directions }
    }
}

impl RaySource for PerVertexRays<'_> {
    fn direction(&self, vertex: usize, _position: Vec3, _normal: Vec3) -> Vec3 {
        self.directions[vertex]
    }
}

/// The same direction for every vertex.
#[derive(Debug, Clone, Copy)]
pub struct SharedRay {
    direction: Vec3,
}

impl SharedRay {
    pub fn new(direction: Vec3) -> Self {
        Self { direction }
    }
}

impl RaySource for SharedRay {
    fn direction(&self, _vertex: usize, _position: Vec3, _normal: Vec3) -> Vec3 {
        self.direction
    }
}

/// Rays from a center point through each vertex, flipped to agree with the
/// vertex normal.
#[derive(Debug, Clone, Copy)]
pub struct RadialRays {
    center: Vec3,
}

impl RadialRays {
    pub fn new(center: Vec3) -> Self {
        Self { center }
    }
}

impl RaySource for RadialRays {
    fn direction(&self, _vertex: usize, position: Vec3, normal: Vec3) -> Vec3 {
        orient((position - self.center).normalize_or_zero(), normal)
    }
}

/// One direction, flipped per vertex to agree with the vertex normal.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalRays {
    direction: Vec3,
}

impl DirectionalRays {
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
        }
    }
}

impl RaySource for DirectionalRays {
    fn direction(&self, _vertex: usize, _position: Vec3, normal: Vec3) -> Vec3 {
        orient(self.direction, normal)
    }
}

/// Host-facing choice of ray source.
#[derive(Debug, Clone, Copy)]
pub enum RayDirections<'r> {
    /// One local-space direction per vertex
    PerVertex(&'r [Vec3]),
    /// One local-space direction for all vertices
    Shared(Vec3),
    /// Rays radiating from a world-space center
    Radial(Vec3),
    /// A single world-space direction, oriented per vertex
    Directional(Vec3),
}

impl RayDirections<'_> {
    /// Whether the source orients rays by vertex normals
    pub fn needs_normals(&self) -> bool {
        matches!(self, Self::Radial(_) | Self::Directional(_))
    }

    pub(crate) fn validate(&self, vertex_count: usize, has_normals: bool) -> Result<()> {
        if let Self::PerVertex(directions) = self {
            ensure_len("ray directions", directions.len(), vertex_count)?;
        }
        if self.needs_normals() && !has_normals {
            return Err(TweakerError::MissingAttribute("normals"));
        }
        Ok(())
    }

    /// Resolve to a concrete source in local space and run `pass` with it.
    pub(crate) fn dispatch<P: RayPass>(self, world_to_local: Mat4, pass: P) -> P::Output {
        match self {
            Self::PerVertex(directions) => pass.run(&PerVertexRays::new(directions)),
            Self::Shared(direction) => pass.run(&SharedRay::new(direction)),
            Self::Radial(center) => pass.run(&RadialRays::new(world_to_local.transform_point3(center))),
            Self::Directional(direction) => {
                pass.run(&DirectionalRays::new(world_to_local.transform_vector3(direction)))
            }
        }
    }
}

/// A per-vertex pass generic over its ray source.
pub(crate) trait RayPass {
    type Output;
    fn run<R: RaySource>(self, rays: &R) -> Self::Output;
}

/// Attribute values found on the target at a ray hit, in the working mesh's
/// local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ProjectedSample {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub tangent: Option<Vec4>,
}

/// Target triangles and attributes prepared for many ray queries.
pub(crate) struct ProjectionTarget<'t> {
    soa: TriangleSoa,
    triangles: &'t [u32],
    normals: Option<&'t [Vec3]>,
    tangents: Option<&'t [Vec4]>,
    to_local: Mat4,
}

impl<'t> ProjectionTarget<'t> {
    /// Flatten `target` into the space given by `world_to_local`.
    pub(crate) fn new(target: &'t MeshView<'_>, world_to_local: Mat4) -> Self {
        let to_local = world_to_local * target.local_to_world;
        let triangles = target.triangles();
        Self {
            soa: TriangleSoa::from_indexed(target.positions(), triangles, to_local),
            triangles,
            normals: target.normals().ok(),
            tangents: target.tangents.as_deref(),
            to_local,
        }
    }

    pub(crate) fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    fn sample(&self, origin: Vec3, dir: Vec3, hit: MeshHit) -> ProjectedSample {
        let base = hit.triangle * 3;
        let [i0, i1, i2] = [
            self.triangles[base] as usize,
            self.triangles[base + 1] as usize,
            self.triangles[base + 2] as usize,
        ];
        let normal = self.normals.map(|n| {
            let n = hit.hit.interpolate(n[i0], n[i1], n[i2]);
            self.to_local.transform_vector3(n).normalize_or_zero()
        });
        let tangent = self.tangents.map(|t| {
            let t = hit.hit.interpolate(t[i0], t[i1], t[i2]);
            self.to_local.transform_vector3(t.xyz()).normalize_or_zero().extend(t.w)
        });
        ProjectedSample {
            position: origin + dir * hit.hit.t,
            normal,
            tangent,
        }
    }

    /// Cast from `origin` along `dir` (and/or its reverse) and return the
    /// nearest hit closer than `max_distance`.
    pub(crate) fn cast(
        &self,
        origin: Vec3,
        dir: Vec3,
        mode: ProjectionMode,
        max_distance: f32,
    ) -> Option<ProjectedSample> {
        let mut best: Option<(Vec3, MeshHit)> = None;

        if mode.casts_forward() {
            if let Some(hit) = self.soa.raycast(origin, dir) {
                if hit.hit.t < max_distance {
                    best = Some((dir, hit));
                }
            }
        }
        if mode.casts_backward() {
            if let Some(hit) = self.soa.raycast(origin, -dir) {
                let closer = best.is_none_or(|(_, prev)| hit.hit.t < prev.hit.t);
                if hit.hit.t < max_distance && closer {
                    best = Some((-dir, hit));
                }
            }
        }

        best.map(|(dir, hit)| self.sample(origin, dir, hit))
    }
}

struct ProjectPass<'p, 't> {
    positions: &'p [Vec3],
    normals: Option<&'p [Vec3]>,
    weights: Option<&'p [f32]>,
    target: &'p ProjectionTarget<'t>,
    mode: ProjectionMode,
    max_distance: f32,
}

impl RayPass for ProjectPass<'_, '_> {
    type Output = Vec<Option<ProjectedSample>>;

    fn run<R: RaySource>(self, rays: &R) -> Self::Output {
        self.positions
            .par_iter()
            .enumerate()
            .map(|(vertex, &p)| {
                if self.weights.is_some_and(|w| w[vertex] == 0.0) {
                    return None;
                }
                let normal = self.normals.map_or(Vec3::ZERO, |n| n[vertex]);
                let dir = rays.direction(vertex, p, normal).normalize_or_zero();
                if dir == Vec3::ZERO {
                    return None;
                }
                self.target.cast(p, dir, self.mode, self.max_distance)
            })
            .collect()
    }
}

/// Project attributes of `target` onto `mesh`.
///
/// Hits must be strictly closer than `max_distance`. `attributes` selects
/// which of position, normal and tangent are written; tangent handedness is
/// kept. Returns the number of vertices that hit the target.
pub fn project_vertices(
    mesh: &mut MeshView<'_>,
    target: &MeshView<'_>,
    rays: RayDirections<'_>,
    mode: ProjectionMode,
    max_distance: f32,
    attributes: AttributeMask,
    use_mask: bool,
) -> Result<usize> {
    mesh.validate()?;
    target.validate()?;
    let n = mesh.vertex_count;
    rays.validate(n, mesh.normals.is_some())?;
    if attributes.contains(AttributeMask::NORMAL) {
        mesh.normals()?;
        target.normals()?;
    }
    if attributes.contains(AttributeMask::TANGENT) && (mesh.tangents.is_none() || target.tangents.is_none()) {
        return Err(TweakerError::MissingAttribute("tangents"));
    }

    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("project_vertices: mesh transform is singular, skipping");
        return Ok(0);
    };

    let projection_target = ProjectionTarget::new(target, world_to_local);
    let samples = rays.dispatch(
        world_to_local,
        ProjectPass {
            positions: mesh.positions(),
            normals: mesh.normals().ok(),
            weights: if use_mask { mesh.selection() } else { None },
            target: &projection_target,
            mode,
            max_distance,
        },
    );

    let mut hits = 0;
    for (vertex, sample) in samples.into_iter().enumerate() {
        let Some(sample) = sample else {
            continue;
        };
        hits += 1;
        let s = mesh.mask_weight(vertex, use_mask);

        if attributes.contains(AttributeMask::POSITION) {
            let p = &mut mesh.positions[vertex];
            *p = p.lerp(sample.position, s);
        }
        if let (true, Some(normals), Some(rn)) = (
            attributes.contains(AttributeMask::NORMAL),
            mesh.normals.as_deref_mut(),
            sample.normal,
        ) {
            normals[vertex] = normals[vertex].lerp(rn, s).normalize_or_zero();
        }
        if let (true, Some(tangents), Some(rt)) = (
            attributes.contains(AttributeMask::TANGENT),
            mesh.tangents.as_deref_mut(),
            sample.tangent,
        ) {
            let t = tangents[vertex];
            tangents[vertex] = t.xyz().lerp(rt.xyz(), s).normalize_or_zero().extend(t.w);
        }
    }

    debug!("project_vertices: {} of {} vertices hit", hits, n);
    Ok(hits)
}

/// Project normals of `target` onto `mesh` along forward rays with no
/// distance limit.
pub fn project_normals(
    mesh: &mut MeshView<'_>,
    target: &MeshView<'_>,
    rays: RayDirections<'_>,
    use_mask: bool,
) -> Result<usize> {
    project_vertices(
        mesh,
        target,
        rays,
        ProjectionMode::Forward,
        f32::INFINITY,
        AttributeMask::NORMAL,
        use_mask,
    )
}
