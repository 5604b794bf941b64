//! Screen-space vertex picking.
//!
//! Vertices are projected with `view_projection * local_to_world` and
//! compared in normalized device coordinates. An optional front-face test
//! casts a ray from the camera toward each candidate and keeps it only if the
//! first surface hit lands on the vertex itself.

use glam::{Mat4, Vec2, Vec3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use tweaker_config::TweakerConfig;

use crate::error::Result;
use crate::math::near_equal;
use crate::mesh::MeshView;
use crate::raycast::raycast_indexed;

/// Axis-aligned rectangle in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

/// Projects local-space vertices to normalized device coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScreenProjector {
    mvp: Mat4,
}

impl ScreenProjector {
    pub(crate) fn new(view_projection: Mat4, local_to_world: Mat4) -> Self {
        Self {
            mvp: view_projection * local_to_world,
        }
    }

    /// Screen position of a local-space point, `None` behind the camera.
    pub(crate) fn project(&self, p: Vec3) -> Option<Vec2> {
        let clip = self.mvp * p.extend(1.0);
        if !(clip.z > 0.0) {
            return None;
        }
        Some(Vec2::new(clip.x, clip.y) / clip.w)
    }
}

/// Camera visibility test against the mesh's own triangles, in local space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrontFaceTest<'m> {
    positions: &'m [Vec3],
    indices: &'m [u32],
    camera: Vec3,
    tolerance: f32,
}

impl<'m> FrontFaceTest<'m> {
    pub(crate) fn new(positions: &'m [Vec3], indices: &'m [u32], camera: Vec3, tolerance: f32) -> Self {
        Self {
            positions,
            indices,
            camera,
            tolerance,
        }
    }

    /// True if the first surface the camera sees toward `p` is at `p`.
    pub(crate) fn is_visible(&self, p: Vec3) -> bool {
        let dir = (p - self.camera).normalize_or_zero();
        if dir == Vec3::ZERO {
            return false;
        }
        match raycast_indexed(self.camera, dir, self.positions, self.indices) {
            Some(hit) => {
                let hit_position = self.camera + dir * hit.hit.t;
                p.distance(hit_position) < self.tolerance
            }
            None => false,
        }
    }

    /// Direction from the camera to a local-space point
    pub(crate) fn view_dir(&self, p: Vec3) -> Vec3 {
        (p - self.camera).normalize_or_zero()
    }
}

/// Find the vertex nearest to the center of a screen rect.
///
/// Candidates are vertices in front of the camera whose projection falls in
/// `rect`, optionally filtered by the front-face test. At most
/// `config.pick_candidate_cap` candidates are considered, taken in vertex
/// order; the rest are dropped.
///
/// Among candidates within `config.pick_tie_epsilon` of the same screen
/// distance, the one with the smallest `dot(normal, view_dir)` wins, where
/// `view_dir` points from the camera to the vertex. That is the vertex whose
/// normal faces the camera most directly, not the most tangential one.
pub fn pick_nearest(
    mesh: &MeshView<'_>,
    view_projection: Mat4,
    rect: ScreenRect,
    camera_position: Vec3,
    front_face_only: bool,
    config: &TweakerConfig,
) -> Result<Option<usize>> {
    mesh.validate()?;
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("pick_nearest: mesh transform is singular, skipping");
        return Ok(None);
    };

    let positions = mesh.positions();
    let projector = ScreenProjector::new(view_projection, mesh.local_to_world);
    let visibility = FrontFaceTest::new(
        positions,
        mesh.triangles(),
        world_to_local.transform_point3(camera_position),
        config.front_face_tolerance,
    );
    let center = rect.center();

    let mut candidates: Vec<(usize, f32)> = positions
        .par_iter()
        .enumerate()
        .filter_map(|(vertex, &p)| {
            let screen = projector.project(p)?;
            if !rect.contains(screen) {
                return None;
            }
            if front_face_only && !visibility.is_visible(p) {
                return None;
            }
            Some((vertex, screen.distance(center)))
        })
        .collect();

    if candidates.len() > config.pick_candidate_cap {
        trace!(
            "pick_nearest: dropping {} candidates over the cap",
            candidates.len() - config.pick_candidate_cap
        );
        candidates.truncate(config.pick_candidate_cap);
    }

    let normals = mesh.normals().ok();
    let facing = |vertex: usize| {
        normals.map_or(0.0, |n| n[vertex].dot(visibility.view_dir(positions[vertex])))
    };

    let mut nearest: Option<usize> = None;
    let mut nearest_distance = f32::MAX;
    let mut nearest_facing = 1.0;

    for (vertex, distance) in candidates {
        if near_equal(distance, nearest_distance, config.pick_tie_epsilon) {
            let f = facing(vertex);
            if f < nearest_facing {
                nearest = Some(vertex);
                nearest_distance = distance;
                nearest_facing = f;
            }
        } else if distance < nearest_distance {
            nearest = Some(vertex);
            nearest_distance = distance;
            nearest_facing = facing(vertex);
        }
    }

    debug!("pick_nearest: {:?}", nearest);
    Ok(nearest)
}

/// Pick a vertex and report its world-space position.
pub fn pick_vertex(
    mesh: &MeshView<'_>,
    view_projection: Mat4,
    rect: ScreenRect,
    camera_position: Vec3,
    front_face_only: bool,
    config: &TweakerConfig,
) -> Result<Option<(usize, Vec3)>> {
    let picked = pick_nearest(mesh, view_projection, rect, camera_position, front_face_only, config)?;
    Ok(picked.map(|vertex| (vertex, mesh.world_position(vertex))))
}
