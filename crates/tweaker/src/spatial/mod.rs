//! Spatial queries against a mesh view.
//!
//! This module provides:
//! - World and local-space raycasts against the mesh's own triangles
//! - Brush-radius vertex queries, serial and block-parallel
//! - Furthest-vertex and surface-normal lookups used for gizmo placement
//!
//! Screen-space picking lives in [`pick`].

pub mod pick;

use glam::{Mat4, Vec3};
use rayon::prelude::*;
use tracing::{trace, warn};

use crate::error::{Result, TweakerError};
use crate::mesh::MeshView;
use crate::raycast::{raycast_indexed, MeshHit};

pub use pick::{pick_nearest, pick_vertex, ScreenRect};

/// Nearest triangle hit by a world-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Index of the hit triangle
    pub triangle: usize,
    /// Distance from the ray origin to the hit, in the ray's space
    pub distance: f32,
}

/// A vertex found inside a brush radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushHit {
    /// Vertex index
    pub index: usize,
    /// World-space distance from the brush center
    pub distance: f32,
    /// World-space vertex position
    pub world_position: Vec3,
}

/// Cast a world-space ray against the mesh.
///
/// The ray is moved into local space with the inverse of `local_to_world`;
/// the reported distance is measured back in world units. A singular
/// transform or a zero direction never hits.
pub fn raycast(mesh: &MeshView<'_>, origin: Vec3, direction: Vec3) -> Result<Option<RaycastHit>> {
    mesh.validate()?;
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("raycast: mesh transform is singular, skipping");
        return Ok(None);
    };

    let local_origin = world_to_local.transform_point3(origin);
    let local_dir = world_to_local.transform_vector3(direction).normalize_or_zero();
    if local_dir == Vec3::ZERO {
        return Ok(None);
    }

    let Some(hit) = raycast_indexed(local_origin, local_dir, mesh.positions(), mesh.triangles()) else {
        return Ok(None);
    };
    let local_hit = local_origin + local_dir * hit.hit.t;
    let distance = mesh.local_to_world.transform_point3(local_hit).distance(origin);

    Ok(Some(RaycastHit {
        triangle: hit.triangle,
        distance,
    }))
}

/// Cast a ray that is already in the mesh's local space.
///
/// Used inside per-vertex loops that have done the inversion once; the view
/// must already have passed [`MeshView::validate`].
pub fn raycast_local(mesh: &MeshView<'_>, origin: Vec3, direction: Vec3) -> Option<MeshHit> {
    raycast_indexed(origin, direction, mesh.positions(), mesh.triangles())
}

/// Visit every vertex within `radius` of `center` (world space).
///
/// Returns the number of vertices visited.
pub fn select_inside<F>(
    positions: &[Vec3],
    local_to_world: Mat4,
    center: Vec3,
    radius: f32,
    mut visitor: F,
) -> usize
where
    F: FnMut(BrushHit),
{
    let radius_sq = radius * radius;
    let mut count = 0;

    for (index, &p) in positions.iter().enumerate() {
        let world_position = local_to_world.transform_point3(p);
        let distance_sq = world_position.distance_squared(center);
        if distance_sq <= radius_sq {
            visitor(BrushHit {
                index,
                distance: distance_sq.sqrt(),
                world_position,
            });
            count += 1;
        }
    }

    count
}

/// Parallel form of [`select_inside`].
///
/// Vertices are split into contiguous blocks of `block_size`; each block is
/// processed independently and may only write the slots of its own vertices,
/// passed to the visitor as `&mut slots[index]`. Visit order across blocks is
/// unspecified but every vertex is visited at most once.
pub fn select_inside_par<T, F>(
    positions: &[Vec3],
    local_to_world: Mat4,
    center: Vec3,
    radius: f32,
    block_size: usize,
    slots: &mut [T],
    visitor: F,
) -> usize
where
    T: Send,
    F: Fn(&mut T, BrushHit) + Sync,
{
    let radius_sq = radius * radius;
    let block_size = block_size.max(1);
    let n = positions.len().min(slots.len());

    slots[..n]
        .par_chunks_mut(block_size)
        .zip(positions[..n].par_chunks(block_size))
        .enumerate()
        .map(|(block, (slot_block, position_block))| {
            let base = block * block_size;
            let mut count = 0;
            for (offset, (slot, &p)) in slot_block.iter_mut().zip(position_block).enumerate() {
                let world_position = local_to_world.transform_point3(p);
                let distance_sq = world_position.distance_squared(center);
                if distance_sq <= radius_sq {
                    visitor(
                        slot,
                        BrushHit {
                            index: base + offset,
                            distance: distance_sq.sqrt(),
                            world_position,
                        },
                    );
                    count += 1;
                }
            }
            count
        })
        .sum()
}

/// Find the vertex furthest from a world-space point.
///
/// With `use_mask`, only vertices with a selection weight above zero are
/// considered. Returns the vertex index and its world distance, or `None` if
/// no candidate lies away from the point.
pub fn furthest_vertex(mesh: &MeshView<'_>, point: Vec3, use_mask: bool) -> Result<Option<(usize, f32)>> {
    mesh.validate()?;
    let selection = mesh.selection();
    let mut furthest: Option<(usize, f32)> = None;

    for (vertex, &p) in mesh.positions().iter().enumerate() {
        if use_mask && selection.is_some_and(|s| s[vertex] <= 0.0) {
            continue;
        }
        let distance_sq = mesh.local_to_world.transform_point3(p).distance_squared(point);
        let best = furthest.map_or(0.0, |(_, d)| d);
        if distance_sq > best {
            furthest = Some((vertex, distance_sq));
        }
    }

    trace!("furthest_vertex: {:?}", furthest);
    Ok(furthest.map(|(vertex, distance_sq)| (vertex, distance_sq.sqrt())))
}

/// Interpolated world-space normal of a triangle at a world-space point.
pub fn pick_normal(mesh: &MeshView<'_>, point: Vec3, triangle: usize) -> Result<Vec3> {
    mesh.validate()?;
    if triangle >= mesh.triangle_count {
        return Err(TweakerError::TriangleOutOfRange {
            triangle,
            triangle_count: mesh.triangle_count,
        });
    }
    let normals = mesh.normals()?;
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("pick_normal: mesh transform is singular");
        return Ok(Vec3::ZERO);
    };

    let [i0, i1, i2] = mesh.triangle(triangle);
    let positions = mesh.positions();
    let local_point = world_to_local.transform_point3(point);
    let w = crate::raycast::barycentric(local_point, positions[i0], positions[i1], positions[i2]);
    let n = normals[i0] * w.x + normals[i1] * w.y + normals[i2] * w.z;

    Ok(mesh.local_to_world.transform_vector3(n).normalize_or_zero())
}
