//! Derived vertex attributes.
//!
//! Normals and tangents are rebuilt from triangle geometry, and terrain
//! meshes are generated from heightmaps. Outputs go to caller-sized buffers.

use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ensure_len, Result, TweakerError};
use crate::mesh::MeshView;

/// Squared length below which an accumulated tangent is treated as missing
const MIN_TANGENT_LENGTH_SQ: f32 = 1e-10;
/// UV determinant below which a triangle's UV mapping is degenerate
const MIN_UV_DETERMINANT: f32 = 1e-8;

fn check_indices(indices: &[u32], vertex_count: usize) -> Result<()> {
    for (triangle, tri) in indices.chunks_exact(3).enumerate() {
        if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(TweakerError::IndexOutOfRange {
                triangle,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

/// Area-weighted vertex normals.
///
/// Each triangle adds its unnormalized face normal (length = twice its area)
/// to its three corners; the sums are then normalized. Vertices used by no
/// triangle get a zero normal.
pub fn generate_normals(positions: &[Vec3], indices: &[u32], out: &mut [Vec3]) -> Result<()> {
    let n = positions.len();
    ensure_len("normals", out.len(), n)?;
    check_indices(indices, n)?;

    let out = &mut out[..n];
    out.fill(Vec3::ZERO);
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        out[a] += face;
        out[b] += face;
        out[c] += face;
    }
    out.par_iter_mut().for_each(|normal| *normal = normal.normalize_or_zero());

    debug!("generate_normals: {} vertices, {} triangles", n, indices.len() / 3);
    Ok(())
}

/// Perpendicular fallback tangent for vertices without usable UVs.
fn fallback_tangent(normal: Vec3) -> Vec4 {
    let abs = normal.abs();
    let axis = if abs.x >= abs.y && abs.x >= abs.z { Vec3::Y } else { Vec3::X };
    (axis - normal * normal.dot(axis)).normalize_or_zero().extend(1.0)
}

/// Tangents from UV gradients.
///
/// Per-triangle tangent and bitangent directions are accumulated at shared
/// vertices, then the tangent is orthogonalized against the vertex normal.
/// The handedness in `w` is -1 when the bitangent opposes `normal x tangent`.
pub fn generate_tangents(
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    indices: &[u32],
    out: &mut [Vec4],
) -> Result<()> {
    let n = positions.len();
    ensure_len("uvs", uvs.len(), n)?;
    ensure_len("normals", normals.len(), n)?;
    ensure_len("tangents", out.len(), n)?;
    check_indices(indices, n)?;

    let mut tangents = vec![Vec3::ZERO; n];
    let mut bitangents = vec![Vec3::ZERO; n];
    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let dp1 = positions[i1] - positions[i0];
        let dp2 = positions[i2] - positions[i0];
        let duv1 = uvs[i1] - uvs[i0];
        let duv2 = uvs[i2] - uvs[i0];

        let det = duv1.x * duv2.y - duv1.y * duv2.x;
        if det.abs() < MIN_UV_DETERMINANT {
            continue;
        }
        let inv_det = 1.0 / det;
        let t = (dp1 * duv2.y - dp2 * duv1.y) * inv_det;
        let b = (dp2 * duv1.x - dp1 * duv2.x) * inv_det;
        for i in [i0, i1, i2] {
            tangents[i] += t;
            bitangents[i] += b;
        }
    }

    out[..n].par_iter_mut().enumerate().for_each(|(i, out)| {
        let normal = normals[i];
        let t = tangents[i];
        if t.length_squared() < MIN_TANGENT_LENGTH_SQ {
            *out = fallback_tangent(normal);
            return;
        }
        let ortho = (t - normal * normal.dot(t)).normalize_or_zero();
        if ortho == Vec3::ZERO {
            *out = fallback_tangent(normal);
            return;
        }
        let w = if normal.cross(ortho).dot(bitangents[i]) < 0.0 { -1.0 } else { 1.0 };
        *out = ortho.extend(w);
    });

    debug!("generate_tangents: {} vertices", n);
    Ok(())
}

/// Rebuild the normals of a mesh view in place.
pub fn generate_mesh_normals(mesh: &mut MeshView<'_>) -> Result<()> {
    mesh.validate()?;
    let n = mesh.vertex_count;
    let indices = mesh.triangles();
    let normals = mesh
        .normals
        .as_deref_mut()
        .ok_or(TweakerError::MissingAttribute("normals"))?;
    generate_normals(&mesh.positions[..n], indices, normals)
}

/// Rebuild the tangents of a mesh view in place from its UVs and normals.
pub fn generate_mesh_tangents(mesh: &mut MeshView<'_>) -> Result<()> {
    mesh.validate()?;
    let n = mesh.vertex_count;
    let indices = mesh.triangles();
    let uvs = mesh.uvs.ok_or(TweakerError::MissingAttribute("uvs"))?;
    let normals = mesh.normals.as_deref().ok_or(TweakerError::MissingAttribute("normals"))?;
    let tangents = mesh
        .tangents
        .as_deref_mut()
        .ok_or(TweakerError::MissingAttribute("tangents"))?;
    generate_tangents(&mesh.positions[..n], uvs, normals, indices, tangents)
}

/// Output buffers for [`generate_terrain`].
///
/// Required sizes: `width * height` vertices and
/// `(width - 1) * (height - 1) * 6` indices.
#[derive(Debug)]
pub struct TerrainBuffers<'a> {
    pub positions: &'a mut [Vec3],
    pub normals: &'a mut [Vec3],
    pub uvs: &'a mut [Vec2],
    pub indices: &'a mut [u32],
}

/// Build a grid mesh from a row-major heightmap.
///
/// Vertex `(ix, iy)` sits at `(ix / (w - 1) * size.x, h * size.y,
/// iy / (h - 1) * size.z)` with UV `(ix / (w - 1), iy / (h - 1))`. Each cell
/// becomes two triangles wound so a flat terrain faces +Y.
pub fn generate_terrain(heightmap: &[f32], width: usize, height: usize, size: Vec3, out: TerrainBuffers<'_>) -> Result<()> {
    if width < 2 || height < 2 {
        return Err(TweakerError::InvalidDimensions(format!(
            "terrain needs at least 2x2 samples, got {}x{}",
            width, height
        )));
    }
    let vertex_count = width * height;
    let index_count = (width - 1) * (height - 1) * 6;
    ensure_len("heightmap", heightmap.len(), vertex_count)?;
    ensure_len("positions", out.positions.len(), vertex_count)?;
    ensure_len("normals", out.normals.len(), vertex_count)?;
    ensure_len("uvs", out.uvs.len(), vertex_count)?;
    ensure_len("indices", out.indices.len(), index_count)?;

    let uv_unit = Vec2::new(1.0 / (width - 1) as f32, 1.0 / (height - 1) as f32);
    let size_unit = Vec3::new(uv_unit.x, 1.0, uv_unit.y) * size;

    let TerrainBuffers {
        positions,
        normals,
        uvs,
        indices,
    } = out;
    let positions = &mut positions[..vertex_count];
    let indices = &mut indices[..index_count];

    rayon::join(
        || {
            positions
                .par_chunks_mut(width)
                .zip(uvs[..vertex_count].par_chunks_mut(width))
                .enumerate()
                .for_each(|(iy, (position_row, uv_row))| {
                    for (ix, (p, uv)) in position_row.iter_mut().zip(uv_row).enumerate() {
                        let h = heightmap[iy * width + ix];
                        *p = Vec3::new(ix as f32, h, iy as f32) * size_unit;
                        *uv = Vec2::new(ix as f32, iy as f32) * uv_unit;
                    }
                });
        },
        || {
            let w = width as u32;
            indices
                .par_chunks_mut((width - 1) * 6)
                .enumerate()
                .for_each(|(iy, row)| {
                    let iy = iy as u32;
                    for (ix, cell) in row.chunks_exact_mut(6).enumerate() {
                        let ix = ix as u32;
                        let a = w * iy + ix;
                        let b = a + 1;
                        let c = a + w;
                        let d = c + 1;
                        cell.copy_from_slice(&[a, c, d, a, d, b]);
                    }
                });
        },
    );

    generate_normals(positions, indices, normals)?;
    debug!("generate_terrain: {}x{} samples", width, height);
    Ok(())
}
