//! Normal sculpting.
//!
//! Brush edits visit every vertex inside the brush sphere, weight the edit
//! by the brush curve (and the selection when masked) and rewrite the vertex
//! normal. A negative brush strength inverts the edit where that makes sense.

use glam::Vec3;
use rayon::prelude::*;
use tracing::{debug, warn};
use tweaker_config::TweakerConfig;

use crate::brush::BrushCurve;
use crate::error::{ensure_len, Result, TweakerError};
use crate::math::clamp01;
use crate::mesh::MeshView;
use crate::projection::{ProjectionTarget, RayDirections, RayPass, RaySource};
use crate::spatial::{select_inside, select_inside_par, BrushHit};
use crate::types::ProjectionMode;

/// A single brush dab.
#[derive(Debug, Clone, Copy)]
pub struct Brush<'c> {
    /// Brush center in world space
    pub center: Vec3,
    /// Brush radius in world units
    pub radius: f32,
    /// Signed strength; the sign selects the edit direction
    pub strength: f32,
    /// Falloff from center to edge
    pub curve: BrushCurve<'c>,
}

impl<'c> Brush<'c> {
    pub fn new(center: Vec3, radius: f32, strength: f32, curve: BrushCurve<'c>) -> Self {
        Self {
            center,
            radius,
            strength,
            curve,
        }
    }

    fn sign(&self) -> f32 {
        if self.strength < 0.0 { -1.0 } else { 1.0 }
    }

    /// Unsigned strength at a distance from the center
    fn falloff(&self, distance: f32) -> f32 {
        self.curve.sample(distance, self.radius) * self.strength.abs()
    }
}

/// Borrow positions, mask weights and normals of a view at once.
fn split_normals<'m>(
    mesh: &'m mut MeshView<'_>,
    use_mask: bool,
) -> Result<(&'m [Vec3], Option<&'m [f32]>, &'m mut [Vec3])> {
    let n = mesh.vertex_count;
    let normals = mesh
        .normals
        .as_deref_mut()
        .ok_or(TweakerError::MissingAttribute("normals"))?;
    let weights = if use_mask {
        mesh.selection.as_deref().map(|s| &s[..n])
    } else {
        None
    };
    Ok((&mesh.positions[..n], weights, &mut normals[..n]))
}

/// Run a per-normal brush visitor over the vertices inside the brush.
fn brush_normals<F>(mesh: &mut MeshView<'_>, brush: &Brush<'_>, use_mask: bool, config: &TweakerConfig, visit: F) -> Result<usize>
where
    F: Fn(&mut Vec3, BrushHit, f32) + Sync,
{
    let local_to_world = mesh.local_to_world;
    let (positions, weights, normals) = split_normals(mesh, use_mask)?;
    let count = select_inside_par(
        positions,
        local_to_world,
        brush.center,
        brush.radius,
        config.vertex_block_size,
        normals,
        |normal, hit| {
            let mask = weights.map_or(1.0, |w| w[hit.index]);
            visit(normal, hit, mask);
        },
    );
    Ok(count)
}

/// Smooth each normal toward the average of normals within `radius`.
///
/// Neighbours are weighted by their selection when a selection buffer is
/// present. The average is taken from a snapshot, so the result does not
/// depend on processing order.
pub fn smooth_normals(mesh: &mut MeshView<'_>, radius: f32, strength: f32, use_mask: bool) -> Result<usize> {
    mesh.validate()?;
    let world = mesh.world_positions();
    let selection: Option<Vec<f32>> = mesh.selection().map(<[f32]>::to_vec);
    let snapshot = mesh.normals()?.to_vec();
    let radius_sq = radius * radius;

    let normals = mesh.normals.as_deref_mut().ok_or(TweakerError::MissingAttribute("normals"))?;
    let count = normals[..world.len()]
        .par_iter_mut()
        .enumerate()
        .map(|(vertex, normal)| {
            let s = match (&selection, use_mask) {
                (Some(sel), true) => sel[vertex],
                _ => 1.0,
            };
            if s == 0.0 {
                return 0;
            }
            let p = world[vertex];
            let mut average = Vec3::ZERO;
            for (i, q) in world.iter().enumerate() {
                if q.distance_squared(p) <= radius_sq {
                    average += snapshot[i] * selection.as_ref().map_or(1.0, |sel| sel[i]);
                }
            }
            *normal = (*normal + average.normalize_or_zero() * (strength * s)).normalize_or_zero();
            1
        })
        .sum();

    debug!("smooth_normals: {} vertices", count);
    Ok(count)
}

/// Push normals toward a fixed local-space direction.
pub fn brush_replace(
    mesh: &mut MeshView<'_>,
    brush: &Brush<'_>,
    value: Vec3,
    use_mask: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    mesh.validate()?;
    let sign = brush.sign();
    let count = brush_normals(mesh, brush, use_mask, config, |n, hit, mask| {
        let s = brush.falloff(hit.distance) * mask;
        *n = (*n + value * (s * sign)).normalize_or_zero();
    })?;
    debug!("brush_replace: {} vertices", count);
    Ok(count)
}

/// Paint normals toward a direction, tilting them along the brush slope.
///
/// Where the falloff curve changes, normals are pulled sideways (away from
/// the brush center for a curve rising toward the center) in proportion to
/// the slope, which shapes the painted area like a bump. `normal` is given in
/// the mesh's local space.
pub fn brush_paint(
    mesh: &mut MeshView<'_>,
    brush: &Brush<'_>,
    normal: Vec3,
    use_mask: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    mesh.validate()?;
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("brush_paint: mesh transform is singular, skipping");
        return Ok(0);
    };
    let sign = brush.sign();
    let paint = mesh.local_to_world.transform_vector3(normal).normalize_or_zero();
    let flatten = |p: Vec3| p - paint * paint.dot(p);
    let center_on_plane = flatten(brush.center);
    let samples = brush.curve.samples();

    let count = brush_normals(mesh, brush, use_mask, config, |n, hit, mask| {
        let index = brush.curve.sample_index(hit.distance, brush.radius);
        let s = clamp01(samples[index] * brush.strength.abs() * 2.0) * mask;

        let mut slope = brush.curve.slope_toward_center(index);
        let mut t = (flatten(hit.world_position) - center_on_plane).normalize_or_zero();
        if slope < 0.0 {
            t = -t;
            slope = -slope;
        }

        let r = paint.lerp(t * sign, clamp01(slope * 0.5));
        let r = world_to_local.transform_vector3(r).normalize_or_zero();
        let r = n.lerp(r, s);
        *n = (*n + r * s).normalize_or_zero();
    })?;
    debug!("brush_paint: {} vertices", count);
    Ok(count)
}

/// Blend between two caller-supplied normal sets.
///
/// Positive strength moves toward `n0`, negative toward `-n0`, starting from
/// `n1` each time.
pub fn brush_lerp(
    mesh: &mut MeshView<'_>,
    brush: &Brush<'_>,
    n0: &[Vec3],
    n1: &[Vec3],
    use_mask: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    mesh.validate()?;
    ensure_len("n0", n0.len(), mesh.vertex_count)?;
    ensure_len("n1", n1.len(), mesh.vertex_count)?;
    let sign = brush.sign();
    let count = brush_normals(mesh, brush, use_mask, config, |n, hit, mask| {
        let s = brush.falloff(hit.distance) * mask;
        *n = n1[hit.index].lerp(n0[hit.index] * sign, s).normalize_or_zero();
    })?;
    debug!("brush_lerp: {} vertices", count);
    Ok(count)
}

/// Smooth normals inside the brush toward their common average.
///
/// The strength sign is ignored.
pub fn brush_smooth(mesh: &mut MeshView<'_>, brush: &Brush<'_>, use_mask: bool) -> Result<usize> {
    mesh.validate()?;
    let local_to_world = mesh.local_to_world;
    let (positions, weights, normals) = split_normals(mesh, use_mask)?;

    let mut inside = Vec::new();
    select_inside(positions, local_to_world, brush.center, brush.radius, |hit| {
        inside.push((hit.index, hit.distance))
    });

    let average = inside
        .iter()
        .fold(Vec3::ZERO, |acc, &(vertex, _)| acc + normals[vertex])
        .normalize_or_zero();

    for &(vertex, distance) in &inside {
        let s = brush.falloff(distance) * weights.map_or(1.0, |w| w[vertex]);
        normals[vertex] = (normals[vertex] + average * s).normalize_or_zero();
    }

    debug!("brush_smooth: {} vertices", inside.len());
    Ok(inside.len())
}

struct BrushProjectionPass<'p, 'm, 't> {
    mesh: &'p mut MeshView<'m>,
    brush: &'p Brush<'p>,
    source: &'p ProjectionTarget<'t>,
    use_mask: bool,
    config: &'p TweakerConfig,
}

impl RayPass for BrushProjectionPass<'_, '_, '_> {
    type Output = Result<usize>;

    fn run<R: RaySource>(self, rays: &R) -> Self::Output {
        let brush = self.brush;
        let source = self.source;
        let sign = brush.sign();
        let local_to_world = self.mesh.local_to_world;
        let (positions, weights, normals) = split_normals(self.mesh, self.use_mask)?;

        let count = select_inside_par(
            positions,
            local_to_world,
            brush.center,
            brush.radius,
            self.config.vertex_block_size,
            normals,
            |n, hit| {
                let p = positions[hit.index];
                let dir = rays.direction(hit.index, p, *n).normalize_or_zero();
                if dir == Vec3::ZERO {
                    return;
                }
                let Some(projected) = source
                    .cast(p, dir, ProjectionMode::Forward, f32::INFINITY)
                    .and_then(|sample| sample.normal)
                else {
                    return;
                };
                let s = brush.falloff(hit.distance) * weights.map_or(1.0, |w| w[hit.index]);
                *n = n.lerp(projected * sign, s).normalize_or_zero();
            },
        );
        Ok(count)
    }
}

/// Blend normals inside the brush toward the normals of a source mesh, found
/// by casting rays from each vertex.
pub fn brush_projection(
    mesh: &mut MeshView<'_>,
    brush: &Brush<'_>,
    source: &MeshView<'_>,
    rays: RayDirections<'_>,
    use_mask: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    mesh.validate()?;
    source.validate()?;
    rays.validate(mesh.vertex_count, mesh.normals.is_some())?;
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("brush_projection: mesh transform is singular, skipping");
        return Ok(0);
    };

    let target = ProjectionTarget::new(source, world_to_local);
    if !target.has_normals() {
        return Err(TweakerError::MissingAttribute("normals"));
    }
    let count = rays.dispatch(
        world_to_local,
        BrushProjectionPass {
            mesh,
            brush,
            source: &target,
            use_mask,
            config,
        },
    )?;
    debug!("brush_projection: {} vertices", count);
    Ok(count)
}
