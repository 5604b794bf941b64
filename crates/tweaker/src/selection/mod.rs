//! Soft per-vertex selection.
//!
//! Every operation adds to the selection weight and saturates to [0, 1].
//! Topological selections (edge, hole, connected) first capture their target
//! set, then optionally clear the selection, then write. All operations return
//! the number of vertices written; zero is a normal outcome.

pub mod topology;

use std::collections::VecDeque;

use glam::{Mat4, Quat, Vec2, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tweaker_config::TweakerConfig;

use crate::brush::BrushCurve;
use crate::error::{Result, TweakerError};
use crate::math::{add_selection, look_rotation};
use crate::mesh::MeshView;
use crate::spatial::pick::{FrontFaceTest, ScreenProjector};
use crate::spatial::{pick_nearest, raycast, select_inside_par, ScreenRect};

/// Add `strength` to the three vertices of the triangle hit by a world ray.
pub fn select_triangle(
    mesh: &mut MeshView<'_>,
    origin: Vec3,
    direction: Vec3,
    strength: f32,
) -> Result<usize> {
    mesh.validate()?;
    mesh.selection_mut()?;
    let Some(hit) = raycast(mesh, origin, direction)? else {
        return Ok(0);
    };
    let corners = mesh.triangle(hit.triangle);
    let selection = mesh.selection_mut()?;
    for vertex in corners {
        add_selection(&mut selection[vertex], strength);
    }
    debug!("select_triangle: hit triangle {}", hit.triangle);
    Ok(1)
}

/// Add `strength` to the vertex nearest the center of a screen rect.
pub fn select_single(
    mesh: &mut MeshView<'_>,
    view_projection: Mat4,
    rect: ScreenRect,
    camera_position: Vec3,
    strength: f32,
    front_face_only: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    mesh.validate()?;
    mesh.selection_mut()?;
    let Some(vertex) =
        pick_nearest(mesh, view_projection, rect, camera_position, front_face_only, config)?
    else {
        return Ok(0);
    };
    add_selection(&mut mesh.selection_mut()?[vertex], strength);
    Ok(1)
}

/// Add `strength` to every vertex whose projection falls inside `rect`.
pub fn select_rect(
    mesh: &mut MeshView<'_>,
    view_projection: Mat4,
    rect: ScreenRect,
    camera_position: Vec3,
    strength: f32,
    front_face_only: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    let count = select_projected(
        mesh,
        view_projection,
        camera_position,
        strength,
        front_face_only,
        config,
        |p| rect.contains(p),
    )?;
    debug!("select_rect: {} vertices", count);
    Ok(count)
}

/// Add `strength` to every vertex whose projection falls inside a lasso
/// polygon (even-odd rule). Fewer than three points select nothing.
pub fn select_lasso(
    mesh: &mut MeshView<'_>,
    view_projection: Mat4,
    lasso: &[Vec2],
    camera_position: Vec3,
    strength: f32,
    front_face_only: bool,
    config: &TweakerConfig,
) -> Result<usize> {
    let Some(polygon) = Lasso::new(lasso) else {
        return Ok(0);
    };
    let count = select_projected(
        mesh,
        view_projection,
        camera_position,
        strength,
        front_face_only,
        config,
        |p| polygon.contains(p),
    )?;
    debug!("select_lasso: {} vertices", count);
    Ok(count)
}

/// Screen-space selection pass shared by rect and lasso.
fn select_projected<F>(
    mesh: &mut MeshView<'_>,
    view_projection: Mat4,
    camera_position: Vec3,
    strength: f32,
    front_face_only: bool,
    config: &TweakerConfig,
    inside: F,
) -> Result<usize>
where
    F: Fn(Vec2) -> bool + Sync,
{
    mesh.validate()?;
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("select_projected: mesh transform is singular, skipping");
        return Ok(0);
    };
    let projector = ScreenProjector::new(view_projection, mesh.local_to_world);
    let camera = world_to_local.transform_point3(camera_position);
    let triangles = mesh.triangles();
    let block_size = config.vertex_block_size.max(1);
    let (positions, selection) = mesh.positions_and_selection_mut()?;
    let visibility = FrontFaceTest::new(positions, triangles, camera, config.front_face_tolerance);

    let count = selection
        .par_chunks_mut(block_size)
        .zip(positions.par_chunks(block_size))
        .map(|(weights, points)| {
            let mut count = 0;
            for (weight, &p) in weights.iter_mut().zip(points) {
                let Some(screen) = projector.project(p) else {
                    continue;
                };
                if !inside(screen) || (front_face_only && !visibility.is_visible(p)) {
                    continue;
                }
                add_selection(weight, strength);
                count += 1;
            }
            count
        })
        .sum();

    Ok(count)
}

/// Closed screen-space polygon with a bounding-box prefilter.
#[derive(Debug, Clone)]
struct Lasso<'p> {
    points: &'p [Vec2],
    min: Vec2,
    max: Vec2,
}

impl<'p> Lasso<'p> {
    fn new(points: &'p [Vec2]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let (min, max) = points
            .iter()
            .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            });
        Some(Self { points, min, max })
    }

    fn contains(&self, p: Vec2) -> bool {
        if p.x < self.min.x || p.x > self.max.x || p.y < self.min.y || p.y > self.max.y {
            return false;
        }
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let (a, b) = (self.points[i], self.points[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Add `curve.sample(d, radius) * strength` to every vertex within `radius`
/// of a world-space center.
pub fn select_brush(
    mesh: &mut MeshView<'_>,
    center: Vec3,
    radius: f32,
    strength: f32,
    curve: &BrushCurve<'_>,
    config: &TweakerConfig,
) -> Result<usize> {
    mesh.validate()?;
    let local_to_world = mesh.local_to_world;
    let (positions, selection) = mesh.positions_and_selection_mut()?;
    let count = select_inside_par(
        positions,
        local_to_world,
        center,
        radius,
        config.vertex_block_size,
        selection,
        |weight, hit| add_selection(weight, curve.sample(hit.distance, radius) * strength),
    );
    debug!("select_brush: {} vertices", count);
    Ok(count)
}

/// Capture the target set, then clear the selection if asked.
fn take_targets(selection: &mut [f32], clear: bool, use_mask: bool) -> Vec<bool> {
    let targets = selection.iter().map(|&w| !use_mask || w > 0.0).collect();
    if clear {
        selection.fill(0.0);
    }
    targets
}

/// Select target vertices that lie on a boundary edge.
pub fn select_edge(mesh: &mut MeshView<'_>, strength: f32, clear: bool, use_mask: bool) -> Result<usize> {
    mesh.validate()?;
    let triangles = mesh.triangles();
    let selection = mesh.selection_mut()?;
    let targets = take_targets(selection, clear, use_mask);

    let mut on_boundary = vec![false; selection.len()];
    for edge in topology::boundary_edges(triangles) {
        on_boundary[edge.0 as usize] = true;
        on_boundary[edge.1 as usize] = true;
    }

    let mut count = 0;
    for (vertex, weight) in selection.iter_mut().enumerate() {
        if on_boundary[vertex] && targets[vertex] {
            add_selection(weight, strength);
            count += 1;
        }
    }
    debug!("select_edge: {} vertices", count);
    Ok(count)
}

/// Select every hole loop touched by a target vertex.
pub fn select_hole(mesh: &mut MeshView<'_>, strength: f32, clear: bool, use_mask: bool) -> Result<usize> {
    mesh.validate()?;
    let triangles = mesh.triangles();
    let (positions, selection) = mesh.positions_and_selection_mut()?;
    let targets = take_targets(selection, clear, use_mask);

    let mut count = 0;
    for hole in topology::hole_loops(triangles, positions) {
        if !hole.vertices.iter().any(|&v| targets[v as usize]) {
            continue;
        }
        for &vertex in &hole.vertices {
            add_selection(&mut selection[vertex as usize], strength);
            count += 1;
        }
    }
    debug!("select_hole: {} vertices", count);
    Ok(count)
}

/// Flood-fill the selection along triangle edges.
///
/// Every vertex reachable from a currently selected vertex, seeds included,
/// receives `strength`.
pub fn select_connected(mesh: &mut MeshView<'_>, strength: f32, clear: bool) -> Result<usize> {
    mesh.validate()?;
    let triangles = mesh.triangles();
    let selection = mesh.selection_mut()?;
    let seeds = take_targets(selection, clear, true);
    let adjacency = topology::vertex_adjacency(triangles, selection.len());

    let mut reached = seeds.clone();
    let mut queue: VecDeque<usize> = (0..seeds.len()).filter(|&v| seeds[v]).collect();
    while let Some(vertex) = queue.pop_front() {
        for &next in &adjacency[vertex] {
            let next = next as usize;
            if !reached[next] {
                reached[next] = true;
                queue.push_back(next);
            }
        }
    }

    let mut count = 0;
    for (weight, _) in selection.iter_mut().zip(&reached).filter(|(_, r)| **r) {
        add_selection(weight, strength);
        count += 1;
    }
    debug!("select_connected: {} vertices", count);
    Ok(count)
}

/// Weighted centroid and orientation of the current selection, in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Number of vertices with a weight above zero
    pub count: usize,
    pub position: Vec3,
    pub normal: Vec3,
    pub rotation: Quat,
}

impl Default for SelectionSummary {
    fn default() -> Self {
        Self {
            count: 0,
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Summarize the selection for gizmo placement.
///
/// Positions and normals are averaged by selection weight. Without normals
/// the summary normal is zero and the rotation falls back to identity.
pub fn selection_summary(mesh: &MeshView<'_>) -> Result<SelectionSummary> {
    mesh.validate()?;
    let selection = mesh.selection().ok_or(TweakerError::MissingAttribute("selection"))?;
    let normals = mesh.normals().ok();

    let mut summary = SelectionSummary::default();
    let mut total = 0.0;
    let mut position = Vec3::ZERO;
    let mut normal = Vec3::ZERO;
    for (vertex, &w) in selection.iter().enumerate() {
        if w > 0.0 {
            position += mesh.positions[vertex] * w;
            if let Some(normals) = normals {
                normal += normals[vertex] * w;
            }
            total += w;
            summary.count += 1;
        }
    }

    if summary.count > 0 {
        summary.position = mesh.local_to_world.transform_point3(position / total);
        summary.normal = mesh.local_to_world.transform_vector3(normal).normalize_or_zero();
        summary.rotation = look_rotation(summary.normal, Vec3::Y);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::FalloffCurve;
    use crate::fixtures::{grid, grid_with_hole, icosphere, top_down, TestMesh};

    /// Upper 3x3 grid at y = 1 stacked over a smaller one at y = 0; the
    /// lower center vertex (13) is hidden behind the upper one (4).
    fn stacked_grids() -> TestMesh {
        let mut upper = grid(2, 1.0, 1.0);
        let lower = grid(2, 0.5, 0.0);
        let offset = upper.positions.len() as u32;
        upper.positions.extend(&lower.positions);
        upper.normals.extend(&lower.normals);
        upper.indices.extend(lower.indices.iter().map(|i| i + offset));
        TestMesh::new(upper.positions, upper.normals, upper.indices)
    }

    fn in_unit_range(selection: &[f32]) -> bool {
        selection.iter().all(|w| (0.0..=1.0).contains(w))
    }

    #[test]
    fn test_select_triangle() {
        let mut mesh = grid(1, 1.0, 0.0);
        let mut view = mesh.view();
        let count = select_triangle(&mut view, Vec3::new(-0.5, 1.0, 0.5), -Vec3::Y, 0.7).unwrap();
        assert_eq!(count, 1);
        assert_eq!(select_triangle(&mut view, Vec3::new(3.0, 1.0, 0.0), -Vec3::Y, 0.7).unwrap(), 0);
        drop(view);
        // Triangle (0, 2, 3) contains the hit point
        assert_eq!(mesh.selection, vec![0.7, 0.0, 0.7, 0.7]);
    }

    #[test]
    fn test_select_requires_selection_buffer() {
        let mut positions = vec![Vec3::ZERO, Vec3::X, Vec3::Z];
        let indices = [0, 1, 2];
        let mut view = MeshView::new(&mut positions, &indices);
        assert!(select_edge(&mut view, 1.0, false, false).is_err());
    }

    #[test]
    fn test_select_single_saturates() {
        let mut mesh = grid(2, 1.0, 0.0);
        mesh.selection[4] = 0.8;
        let (vp, eye) = top_down();
        let rect = ScreenRect::new(Vec2::splat(-0.1), Vec2::splat(0.1));
        let mut view = mesh.view();
        let count = select_single(&mut view, vp, rect, eye, 0.5, true, &TweakerConfig::default()).unwrap();
        assert_eq!(count, 1);
        drop(view);
        assert_eq!(mesh.selection[4], 1.0);
    }

    #[test]
    fn test_select_rect_and_negative_strength() {
        let mut mesh = grid(2, 1.0, 0.0);
        let (vp, eye) = top_down();
        let config = TweakerConfig::default();
        let rect = ScreenRect::new(Vec2::splat(-1.0), Vec2::splat(1.0));

        let mut view = mesh.view();
        assert_eq!(select_rect(&mut view, vp, rect, eye, 0.6, false, &config).unwrap(), 9);
        assert_eq!(select_rect(&mut view, vp, rect, eye, -1.0, false, &config).unwrap(), 9);
        drop(view);
        assert!(mesh.selection.iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_select_rect_small_blocks() {
        let mut mesh = grid(8, 1.0, 0.0);
        let (vp, eye) = top_down();
        let config = TweakerConfig {
            vertex_block_size: 5,
            ..TweakerConfig::default()
        };
        let rect = ScreenRect::new(Vec2::splat(-1.0), Vec2::splat(1.0));
        let mut view = mesh.view();
        assert_eq!(select_rect(&mut view, vp, rect, eye, 2.0, false, &config).unwrap(), 81);
        drop(view);
        assert!(mesh.selection.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_select_lasso() {
        let mut mesh = grid(2, 1.0, 0.0);
        let (vp, eye) = top_down();
        let config = TweakerConfig::default();

        // Triangle around the screen center only
        let lasso = [Vec2::new(-0.05, -0.05), Vec2::new(0.05, -0.05), Vec2::new(0.0, 0.05)];
        let mut view = mesh.view();
        assert_eq!(select_lasso(&mut view, vp, &lasso, eye, 1.0, false, &config).unwrap(), 1);
        assert_eq!(select_lasso(&mut view, vp, &lasso[..2], eye, 1.0, false, &config).unwrap(), 0);
        drop(view);
        assert_eq!(mesh.selection[4], 1.0);
        assert_eq!(mesh.selection.iter().filter(|&&w| w > 0.0).count(), 1);
    }

    #[test]
    fn test_lasso_even_odd() {
        // Concave "U" shape; the notch is outside
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(3.0, 3.0),
            Vec2::new(2.0, 3.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(0.0, 3.0),
        ];
        let lasso = Lasso::new(&points).unwrap();
        assert!(lasso.contains(Vec2::new(0.5, 2.0)));
        assert!(lasso.contains(Vec2::new(1.5, 0.5)));
        assert!(!lasso.contains(Vec2::new(1.5, 2.0)));
        assert!(!lasso.contains(Vec2::new(4.0, 1.0)));
    }

    #[test]
    fn test_select_brush_icosphere() {
        let mut mesh = icosphere();
        let samples = FalloffCurve::Constant.bake(8);
        let curve = BrushCurve::new(&samples).unwrap();
        let mut view = mesh.view();
        let count = select_brush(&mut view, Vec3::ZERO, 1.01, 1.5, &curve, &TweakerConfig::default()).unwrap();
        assert_eq!(count, 12);
        drop(view);
        assert!(mesh.selection.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_select_brush_falloff() {
        let mut mesh = grid(2, 1.0, 0.0);
        let samples = [1.0, 0.5, 0.0];
        let curve = BrushCurve::new(&samples).unwrap();
        let mut view = mesh.view();
        let count = select_brush(&mut view, Vec3::ZERO, 1.0, 0.5, &curve, &TweakerConfig::default()).unwrap();
        // Center plus the four edge midpoints at distance == radius
        assert_eq!(count, 5);
        drop(view);
        assert_eq!(mesh.selection[4], 0.5);
        assert_eq!(mesh.selection[1], 0.0);
        assert!(in_unit_range(&mesh.selection));
    }

    #[test]
    fn test_select_edge() {
        let mut mesh = grid(2, 1.0, 0.0);
        let mut view = mesh.view();
        assert_eq!(select_edge(&mut view, 1.0, false, false).unwrap(), 8);
        drop(view);
        assert_eq!(mesh.selection[4], 0.0);

        // With the mask, only already-selected boundary vertices are written
        mesh.selection = vec![0.0; 9];
        mesh.selection[0] = 0.2;
        mesh.selection[4] = 0.2;
        let mut view = mesh.view();
        assert_eq!(select_edge(&mut view, 0.5, true, true).unwrap(), 1);
        drop(view);
        assert_eq!(mesh.selection[0], 0.5);
        assert_eq!(mesh.selection[4], 0.0);
    }

    #[test]
    fn test_select_hole() {
        let mut mesh = grid_with_hole();
        mesh.selection[5] = 0.1;
        let mut view = mesh.view();
        assert_eq!(select_hole(&mut view, 1.0, true, true).unwrap(), 4);
        drop(view);
        for vertex in [5, 6, 9, 10] {
            assert_eq!(mesh.selection[vertex], 1.0);
        }
        assert_eq!(mesh.selection.iter().filter(|&&w| w > 0.0).count(), 4);

        // An outer-rim vertex touches no hole
        mesh.selection = vec![0.0; 16];
        mesh.selection[0] = 1.0;
        let mut view = mesh.view();
        assert_eq!(select_hole(&mut view, 1.0, false, true).unwrap(), 0);
    }

    #[test]
    fn test_select_connected() {
        // Two separate triangles
        let positions = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Z,
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(6.0, 0.0, 0.0),
            Vec3::new(5.0, 0.0, 1.0),
        ];
        let normals = vec![Vec3::Y; 6];
        let mut mesh = crate::fixtures::TestMesh::new(positions, normals, vec![0, 1, 2, 3, 4, 5]);
        mesh.selection[1] = 0.25;

        let mut view = mesh.view();
        assert_eq!(select_connected(&mut view, 0.5, true).unwrap(), 3);
        drop(view);
        assert_eq!(mesh.selection, vec![0.5, 0.5, 0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_selection_summary() {
        let mut mesh = grid(2, 1.0, 0.0);
        mesh.transform = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        mesh.selection[0] = 1.0;
        mesh.selection[8] = 1.0;
        let view = mesh.view();

        let summary = selection_summary(&view).unwrap();
        assert_eq!(summary.count, 2);
        assert!((summary.position - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
        assert!((summary.normal - Vec3::Y).length() < 1e-5);
        assert!((summary.rotation * Vec3::Z - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_selection_summary_empty() {
        let mut mesh = grid(1, 1.0, 0.0);
        let view = mesh.view();
        assert_eq!(selection_summary(&view).unwrap(), SelectionSummary::default());
    }

    #[test]
    fn test_select_rect_front_face_only() {
        let (vp, eye) = top_down();
        let config = TweakerConfig::default();
        let rect = ScreenRect::new(Vec2::splat(-0.01), Vec2::splat(0.01));

        let mut mesh = stacked_grids();
        let mut view = mesh.view();
        assert_eq!(select_rect(&mut view, vp, rect, eye, 1.0, false, &config).unwrap(), 2);
        drop(view);
        assert_eq!((mesh.selection[4], mesh.selection[13]), (1.0, 1.0));

        let mut mesh = stacked_grids();
        let mut view = mesh.view();
        assert_eq!(select_rect(&mut view, vp, rect, eye, 1.0, true, &config).unwrap(), 1);
        drop(view);
        assert_eq!((mesh.selection[4], mesh.selection[13]), (1.0, 0.0));
    }

    #[test]
    fn test_select_lasso_front_face_only() {
        let (vp, eye) = top_down();
        let config = TweakerConfig::default();
        let lasso = [Vec2::new(-0.05, -0.05), Vec2::new(0.05, -0.05), Vec2::new(0.0, 0.05)];

        let mut mesh = stacked_grids();
        let mut view = mesh.view();
        assert_eq!(select_lasso(&mut view, vp, &lasso, eye, 1.0, false, &config).unwrap(), 2);
        drop(view);

        let mut mesh = stacked_grids();
        let mut view = mesh.view();
        assert_eq!(select_lasso(&mut view, vp, &lasso, eye, 1.0, true, &config).unwrap(), 1);
        drop(view);
        assert_eq!(mesh.selection[4], 1.0);
        assert_eq!(mesh.selection[13], 0.0);
    }

    #[test]
    fn test_select_hole_vertex_shared_by_two_holes() {
        // 4x4 cells with cells (1, 1) and (2, 2) removed; the gaps meet at vertex 12
        let mut mesh = grid(4, 2.0, 0.0);
        mesh.indices = mesh
            .indices
            .chunks_exact(6)
            .enumerate()
            .filter(|(cell, _)| *cell != 5 && *cell != 10)
            .flat_map(|(_, quad)| quad.iter().copied())
            .collect();
        mesh.selection[12] = 0.5;

        let mut view = mesh.view();
        // Both gaps form one loop through the shared vertex; each vertex is written once
        assert_eq!(select_hole(&mut view, 1.0, true, true).unwrap(), 7);
        drop(view);
        let selected: Vec<usize> = (0..mesh.selection.len()).filter(|&v| mesh.selection[v] > 0.0).collect();
        assert_eq!(selected, vec![6, 7, 11, 12, 13, 17, 18]);
        assert!(selected.iter().all(|&v| mesh.selection[v] == 1.0));
    }

    #[test]
    fn test_select_edge_bad_index_keeps_selection() {
        let mut positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        let mut selection = vec![1.0; 3];
        let indices = [0, 1, 5];
        let mut view = MeshView::new(&mut positions, &indices).with_selection(&mut selection);
        assert_eq!(
            select_edge(&mut view, 1.0, true, true),
            Err(TweakerError::IndexOutOfRange {
                triangle: 0,
                index: 5,
                vertex_count: 3
            })
        );
        drop(view);
        assert_eq!(selection, vec![1.0; 3]);
    }

    #[test]
    fn test_selection_ops_reject_short_buffers() {
        let config = TweakerConfig::default();
        let (vp, eye) = top_down();
        let mut mesh = grid(2, 1.0, 0.0);
        mesh.normals.truncate(5);
        let mut view = mesh.view();
        let short_normals = Err(TweakerError::BufferTooShort {
            name: "normals",
            len: 5,
            required: 9,
        });
        let rect = ScreenRect::new(Vec2::splat(-1.0), Vec2::splat(1.0));
        assert_eq!(select_rect(&mut view, vp, rect, eye, 1.0, false, &config), short_normals);
        assert_eq!(select_hole(&mut view, 1.0, true, false), short_normals);
        assert_eq!(select_connected(&mut view, 1.0, true), short_normals);
        assert_eq!(select_triangle(&mut view, Vec3::Y, -Vec3::Y, 1.0), short_normals);
        assert!(selection_summary(&view).is_err());
        drop(view);
        assert!(mesh.selection.iter().all(|&w| w == 0.0));
    }
}
