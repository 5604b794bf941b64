//! Normal welding.
//!
//! Welding unifies the normals of vertices that share a position (split
//! vertices along UV seams or hard edges, or vertices on the border between
//! two meshes) so shading is continuous across them. Positions are never
//! moved.

use glam::{Mat4, Vec3};
use tracing::{debug, warn};

use crate::error::{Result, TweakerError};
use crate::math::angle_between_deg;
use crate::mesh::MeshView;
use crate::types::WeldMode;

/// Weld normals of coincident vertices within one mesh.
///
/// Vertices are visited in index order. Each unprocessed seed collects every
/// later-unprocessed vertex closer than `epsilon` whose normal is within
/// `weld_angle_deg` of the seed's (running) normal; the seed and its matches
/// are then marked processed. Grouping is first-found, so chains of nearly
/// coincident vertices are not merged transitively.
///
/// The group normal is the seed normal, or the normalized sum of all group
/// normals with `smoothing`. Returns the number of groups written.
pub fn weld(mesh: &mut MeshView<'_>, smoothing: bool, weld_angle_deg: f32, use_mask: bool, epsilon: f32) -> Result<usize> {
    mesh.validate()?;
    let n = mesh.vertex_count;
    let weights = if use_mask {
        mesh.selection.as_deref().map(|s| &s[..n])
    } else {
        None
    };
    let positions = &mesh.positions[..n];
    let normals = mesh
        .normals
        .as_deref_mut()
        .ok_or(TweakerError::MissingAttribute("normals"))?;
    let normals = &mut normals[..n];

    let mut processed = vec![false; n];
    let mut shared = Vec::new();
    let mut groups = 0;

    for seed in 0..n {
        if processed[seed] || weights.is_some_and(|w| w[seed] == 0.0) {
            continue;
        }
        processed[seed] = true;

        let p = positions[seed];
        let mut normal = normals[seed];
        for other in 0..n {
            if processed[other]
                || positions[other].distance(p) >= epsilon
                || !(angle_between_deg(normal, normals[other]) <= weld_angle_deg)
            {
                continue;
            }
            if smoothing {
                normal += normals[other];
            }
            shared.push(other);
            processed[other] = true;
        }

        if !shared.is_empty() {
            let normal = normal.normalize_or_zero();
            normals[seed] = normal;
            for &other in &shared {
                normals[other] = normal;
            }
            shared.clear();
            groups += 1;
        }
    }

    debug!("weld: {} groups", groups);
    Ok(groups)
}

/// A working-mesh vertex matched to a target vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WeldPair {
    vertex: usize,
    target_vertex: usize,
}

fn world_normals(mesh: &MeshView<'_>) -> Result<Vec<Vec3>> {
    let m = mesh.local_to_world;
    Ok(mesh.normals()?.iter().map(|&n| m.transform_vector3(n)).collect())
}

/// Weld normals of the working mesh with coincident vertices of other meshes.
///
/// Matching happens in world space: a working vertex (with non-zero weight
/// when masked) pairs with every target vertex closer than `epsilon` whose
/// world normal is within `weld_angle_deg`. `mode` decides which side is
/// written. Written normals are mapped back into the receiving mesh's local
/// space and normalized. Returns the number of matched pairs over all targets.
pub fn weld_across(
    mesh: &mut MeshView<'_>,
    targets: &mut [MeshView<'_>],
    mode: WeldMode,
    weld_angle_deg: f32,
    use_mask: bool,
    epsilon: f32,
) -> Result<usize> {
    mesh.validate()?;
    for target in targets.iter() {
        target.validate()?;
    }
    let Some(world_to_local) = mesh.world_to_local() else {
        warn!("weld_across: mesh transform is singular, skipping");
        return Ok(0);
    };
    let mesh_positions = mesh.world_positions();
    let mesh_normals = world_normals(mesh)?;

    // Per target: inverse transform, world normals, matched pairs
    let mut welds: Vec<(Mat4, Vec<Vec3>, Vec<WeldPair>)> = Vec::with_capacity(targets.len());
    for (index, target) in targets.iter().enumerate() {
        let target_normals = world_normals(target)?;
        let Some(target_to_local) = target.world_to_local() else {
            warn!("weld_across: target {} transform is singular, skipping it", index);
            welds.push((Mat4::IDENTITY, target_normals, Vec::new()));
            continue;
        };
        let target_positions = target.world_positions();

        let mut pairs = Vec::new();
        for (vertex, (&p, &normal)) in mesh_positions.iter().zip(&mesh_normals).enumerate() {
            if mesh.mask_weight(vertex, use_mask) == 0.0 {
                continue;
            }
            for (target_vertex, &q) in target_positions.iter().enumerate() {
                if q.distance(p) < epsilon && angle_between_deg(normal, target_normals[target_vertex]) <= weld_angle_deg {
                    pairs.push(WeldPair { vertex, target_vertex });
                }
            }
        }
        welds.push((target_to_local, target_normals, pairs));
    }

    let matched: usize = welds.iter().map(|(_, _, pairs)| pairs.len()).sum();
    if matched == 0 {
        debug!("weld_across: no coincident vertices");
        return Ok(0);
    }

    match mode {
        WeldMode::CopyToTargets => {
            for (target, (to_local, _, pairs)) in targets.iter_mut().zip(&welds) {
                let normals = target.normals.as_deref_mut().ok_or(TweakerError::MissingAttribute("normals"))?;
                for pair in pairs {
                    normals[pair.target_vertex] =
                        to_local.transform_vector3(mesh_normals[pair.vertex]).normalize_or_zero();
                }
            }
        }
        WeldMode::CopyFromTargets => {
            let normals = mesh.normals.as_deref_mut().ok_or(TweakerError::MissingAttribute("normals"))?;
            for (_, target_normals, pairs) in &welds {
                for pair in pairs {
                    normals[pair.vertex] =
                        world_to_local.transform_vector3(target_normals[pair.target_vertex]).normalize_or_zero();
                }
            }
        }
        WeldMode::Average => {
            let mut averaged = mesh_normals;
            for (_, target_normals, pairs) in &welds {
                for pair in pairs {
                    averaged[pair.vertex] += target_normals[pair.target_vertex];
                }
            }
            for n in &mut averaged {
                *n = n.normalize_or_zero();
            }

            let normals = mesh.normals.as_deref_mut().ok_or(TweakerError::MissingAttribute("normals"))?;
            for (target, (to_local, _, pairs)) in targets.iter_mut().zip(&welds) {
                let target_normals = target
                    .normals
                    .as_deref_mut()
                    .ok_or(TweakerError::MissingAttribute("normals"))?;
                for pair in pairs {
                    let world = averaged[pair.vertex];
                    normals[pair.vertex] = world_to_local.transform_vector3(world).normalize_or_zero();
                    target_normals[pair.target_vertex] = to_local.transform_vector3(world).normalize_or_zero();
                }
            }
        }
    }

    debug!("weld_across: {} pairs ({:?})", matched, mode);
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{grid, TestMesh};
    use tweaker_config::TweakerConfig;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn seam() -> TestMesh {
        // Two pairs of coincident vertices and one loner
        let positions = vec![Vec3::ZERO, Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Y];
        let normals = vec![
            Vec3::Y,
            Vec3::X,
            Vec3::Y,
            Vec3::new(0.0, 1.0, 1.0).normalize(),
            Vec3::Z,
        ];
        TestMesh::new(positions, normals, Vec::new())
    }

    #[test]
    fn test_weld_identical_normals_end_equal() {
        let mut mesh = seam();
        mesh.normals[1] = Vec3::Y;
        let eps = TweakerConfig::default().weld_epsilon;
        let mut view = mesh.view();
        assert_eq!(weld(&mut view, false, 0.0, false, eps).unwrap(), 1);
        drop(view);
        assert_eq!(mesh.normals[0], mesh.normals[1]);
    }

    #[test]
    fn test_weld_angle_threshold() {
        let mut mesh = seam();
        let eps = TweakerConfig::default().weld_epsilon;
        let mut view = mesh.view();
        // 90 degrees apart at the origin, 45 at X
        assert_eq!(weld(&mut view, false, 60.0, false, eps).unwrap(), 1);
        drop(view);
        assert_eq!(mesh.normals[0], Vec3::Y);
        assert_eq!(mesh.normals[1], Vec3::X);
        assert_eq!(mesh.normals[2], Vec3::Y);
        assert_eq!(mesh.normals[3], Vec3::Y);
    }

    #[test]
    fn test_weld_smoothing_averages() {
        let mut mesh = seam();
        let eps = TweakerConfig::default().weld_epsilon;
        let mut view = mesh.view();
        assert_eq!(weld(&mut view, true, 180.0, false, eps).unwrap(), 2);
        drop(view);
        let origin = (Vec3::Y + Vec3::X).normalize();
        assert!(approx(mesh.normals[0], origin));
        assert!(approx(mesh.normals[1], origin));
        assert!(approx(mesh.normals[2], mesh.normals[3]));
        assert_eq!(mesh.normals[4], Vec3::Z);
    }

    #[test]
    fn test_weld_never_merges_distant_vertices() {
        let mut mesh = grid(1, 1.0, 0.0);
        mesh.normals = vec![Vec3::X, Vec3::Y, Vec3::Z, -Vec3::X];
        let before = mesh.normals.clone();
        let mut view = mesh.view();
        assert_eq!(weld(&mut view, true, 180.0, false, 1e-7).unwrap(), 0);
        drop(view);
        assert_eq!(mesh.normals, before);
    }

    #[test]
    fn test_weld_mask_skips_unselected_seeds() {
        let mut mesh = seam();
        mesh.normals[1] = Vec3::Y;
        mesh.selection = vec![0.0, 0.0, 1.0, 0.0, 0.0];
        let mut view = mesh.view();
        // Only the seed at index 2 may start a group
        assert_eq!(weld(&mut view, true, 180.0, true, 1e-7).unwrap(), 1);
        drop(view);
        assert!(approx(mesh.normals[2], mesh.normals[3]));
    }

    fn pair() -> (TestMesh, TestMesh) {
        let a = TestMesh::new(vec![Vec3::ZERO, Vec3::X], vec![Vec3::Y, Vec3::Y], Vec::new());
        // Target sits one unit along Z in its own space, moved back by its transform
        let mut b = TestMesh::new(
            vec![Vec3::new(0.0, 0.0, 1.0), Vec3::new(5.0, 0.0, 1.0)],
            vec![Vec3::X, Vec3::X],
            Vec::new(),
        );
        b.transform = Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0));
        (a, b)
    }

    #[test]
    fn test_weld_across_copy_to_targets() {
        let (mut a, mut b) = pair();
        let mut view = a.view();
        let mut targets = [b.view()];
        let pairs = weld_across(&mut view, &mut targets, WeldMode::CopyToTargets, 180.0, false, 1e-5).unwrap();
        assert_eq!(pairs, 1);
        drop(targets);
        drop(view);
        assert_eq!(b.normals[0], Vec3::Y);
        assert_eq!(b.normals[1], Vec3::X);
        assert_eq!(a.normals[0], Vec3::Y);
    }

    #[test]
    fn test_weld_across_copy_from_targets() {
        let (mut a, mut b) = pair();
        let mut view = a.view();
        let mut targets = [b.view()];
        weld_across(&mut view, &mut targets, WeldMode::CopyFromTargets, 180.0, false, 1e-5).unwrap();
        drop(targets);
        drop(view);
        assert_eq!(a.normals[0], Vec3::X);
        assert_eq!(a.normals[1], Vec3::Y);
    }

    #[test]
    fn test_weld_across_average() {
        let (mut a, mut b) = pair();
        let mut view = a.view();
        let mut targets = [b.view()];
        weld_across(&mut view, &mut targets, WeldMode::Average, 180.0, false, 1e-5).unwrap();
        drop(targets);
        drop(view);
        let expected = (Vec3::X + Vec3::Y).normalize();
        assert!(approx(a.normals[0], expected));
        assert!(approx(b.normals[0], expected));
        assert_eq!(b.normals[1], Vec3::X);
    }

    #[test]
    fn test_weld_across_angle_rejects() {
        let (mut a, mut b) = pair();
        let mut view = a.view();
        let mut targets = [b.view()];
        let pairs = weld_across(&mut view, &mut targets, WeldMode::Average, 45.0, false, 1e-5).unwrap();
        assert_eq!(pairs, 0);
    }

    #[test]
    fn test_weld_rejects_bad_buffers() {
        let mut mesh = seam();
        mesh.normals.truncate(3);
        let mut view = mesh.view();
        assert_eq!(
            weld(&mut view, true, 180.0, false, 1e-5),
            Err(TweakerError::BufferTooShort {
                name: "normals",
                len: 3,
                required: 5
            })
        );

        let (mut a, mut b) = pair();
        b.indices = vec![0, 1, 2];
        let mut view = a.view();
        let mut targets = [b.view()];
        assert_eq!(
            weld_across(&mut view, &mut targets, WeldMode::Average, 180.0, false, 1e-5),
            Err(TweakerError::IndexOutOfRange {
                triangle: 0,
                index: 2,
                vertex_count: 2
            })
        );
        drop(targets);
        drop(view);
        assert_eq!(a.normals, vec![Vec3::Y; 2]);
        assert_eq!(b.normals, vec![Vec3::X; 2]);
    }
}
