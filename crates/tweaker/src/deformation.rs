//! Rigid vertex edits under the selection mask.
//!
//! Each edit computes a target position per vertex and blends toward it by
//! the vertex's selection weight (or fully when the mask is off). Vertices
//! with weight zero are left untouched. Pivot frames and deltas are given in
//! world space and mapped into the mesh's local space once per call.

use glam::{Mat4, Quat, Vec3};
use rayon::prelude::*;
use tracing::{debug, warn};
use tweaker_config::TweakerConfig;

use crate::error::Result;
use crate::math::try_inverse;
use crate::mesh::MeshView;
use crate::types::AxisMask;

/// Blend every live position toward `target(p)` by its mask weight.
///
/// Returns the number of vertices with a non-zero weight.
fn blend_positions<F>(mesh: &mut MeshView<'_>, use_mask: bool, target: F) -> usize
where
    F: Fn(Vec3) -> Vec3 + Sync,
{
    let n = mesh.vertex_count;
    let weights = if use_mask {
        mesh.selection.as_deref().map(|s| &s[..n])
    } else {
        None
    };
    let positions = &mut mesh.positions[..n];

    positions
        .par_iter_mut()
        .enumerate()
        .map(|(vertex, p)| {
            let s = weights.map_or(1.0, |w| w[vertex]);
            if s == 0.0 {
                return 0;
            }
            *p = p.lerp(target(*p), s);
            1
        })
        .sum()
}

/// Composite local-space transform applying `op` in a world-space pivot frame.
fn pivot_transform(local_to_world: Mat4, pivot_pos: Vec3, pivot_rot: Quat, op: Mat4) -> Option<Mat4> {
    let world_to_local = try_inverse(local_to_world)?;
    let pivot = Mat4::from_rotation_translation(pivot_rot, pivot_pos);
    let pivot_inv = try_inverse(pivot)?;
    Some(world_to_local * pivot * op * pivot_inv * local_to_world)
}

/// Overwrite selected axes of each vertex, measured in the `space` frame.
///
/// `space` maps local positions into the frame the values are expressed in.
pub fn assign_vertices(mesh: &mut MeshView<'_>, value: Vec3, space: Mat4, axes: AxisMask, use_mask: bool) -> Result<usize> {
    mesh.validate()?;
    let Some(space_inv) = try_inverse(space) else {
        warn!("assign_vertices: space transform is singular, skipping");
        return Ok(0);
    };

    let count = blend_positions(mesh, use_mask, |p| {
        let mut v = space.transform_point3(p);
        if axes.contains(AxisMask::X) {
            v.x = value.x;
        }
        if axes.contains(AxisMask::Y) {
            v.y = value.y;
        }
        if axes.contains(AxisMask::Z) {
            v.z = value.z;
        }
        space_inv.transform_point3(v)
    });
    debug!("assign_vertices: {} vertices", count);
    Ok(count)
}

/// Translate vertices by a world-space delta.
pub fn move_vertices(mesh: &mut MeshView<'_>, world_delta: Vec3, use_mask: bool) -> Result<usize> {
    mesh.validate()?;
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("move_vertices: mesh transform is singular, skipping");
        return Ok(0);
    };
    let delta = world_to_local.transform_vector3(world_delta);
    let count = blend_positions(mesh, use_mask, |p| p + delta);
    debug!("move_vertices: {} vertices", count);
    Ok(count)
}

/// Rotate vertices about a world-space pivot frame.
///
/// Rotations with an angle below `config.min_rotation_angle` (or NaN) are
/// skipped.
pub fn rotate_vertices(
    mesh: &mut MeshView<'_>,
    rotation: Quat,
    pivot_pos: Vec3,
    pivot_rot: Quat,
    use_mask: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    mesh.validate()?;
    let (_, angle) = rotation.to_axis_angle();
    if !(angle.abs() >= config.min_rotation_angle) {
        return Ok(0);
    }
    let Some(m) = pivot_transform(mesh.local_to_world, pivot_pos, pivot_rot, Mat4::from_quat(rotation)) else {
        warn!("rotate_vertices: singular transform, skipping");
        return Ok(0);
    };
    let count = blend_positions(mesh, use_mask, |p| m.transform_point3(p));
    debug!("rotate_vertices: {} vertices", count);
    Ok(count)
}

/// Scale vertices along the axes of a world-space pivot frame.
pub fn scale_vertices(mesh: &mut MeshView<'_>, scale: Vec3, pivot_pos: Vec3, pivot_rot: Quat, use_mask: bool) -> Result<usize> {
    mesh.validate()?;
    let Some(m) = pivot_transform(mesh.local_to_world, pivot_pos, pivot_rot, Mat4::from_scale(scale)) else {
        warn!("scale_vertices: singular transform, skipping");
        return Ok(0);
    };
    let count = blend_positions(mesh, use_mask, |p| m.transform_point3(p));
    debug!("scale_vertices: {} vertices", count);
    Ok(count)
}
