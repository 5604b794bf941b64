//! Small owned meshes for unit tests.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::mesh::MeshView;

/// Owned buffers that can lend a [`MeshView`].
#[derive(Debug, Clone)]
pub struct TestMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub uvs: Vec<Vec2>,
    pub selection: Vec<f32>,
    pub indices: Vec<u32>,
    pub transform: Mat4,
}

impl TestMesh {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let n = positions.len();
        Self {
            positions,
            normals,
            tangents: vec![Vec4::new(1.0, 0.0, 0.0, 1.0); n],
            uvs: vec![Vec2::ZERO; n],
            selection: vec![0.0; n],
            indices,
            transform: Mat4::IDENTITY,
        }
    }

    pub fn view(&mut self) -> MeshView<'_> {
        MeshView::new(&mut self.positions, &self.indices)
            .with_normals(&mut self.normals)
            .with_tangents(&mut self.tangents)
            .with_uvs(&self.uvs)
            .with_selection(&mut self.selection)
            .with_transform(self.transform)
    }
}

/// Flat grid in the XZ plane facing +Y, `cells` x `cells` quads spanning
/// [-half, half] and lifted to `height`.
pub fn grid(cells: u32, half: f32, height: f32) -> TestMesh {
    let side = cells + 1;
    let mut positions = Vec::new();
    for iz in 0..side {
        for ix in 0..side {
            let x = -half + 2.0 * half * ix as f32 / cells as f32;
            let z = -half + 2.0 * half * iz as f32 / cells as f32;
            positions.push(Vec3::new(x, height, z));
        }
    }
    let mut indices = Vec::new();
    for iz in 0..cells {
        for ix in 0..cells {
            let a = iz * side + ix;
            let b = a + 1;
            let c = a + side;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, d, a, d, b]);
        }
    }
    let n = positions.len();
    TestMesh::new(positions, vec![Vec3::Y; n], indices)
}

/// 3x3 quad grid with unit spacing and the center quad removed.
pub fn grid_with_hole() -> TestMesh {
    let mut mesh = grid(3, 1.5, 0.0);
    // Each cell contributes six indices; cell (1, 1) is the fifth
    mesh.indices = mesh
        .indices
        .chunks_exact(6)
        .enumerate()
        .filter(|(cell, _)| *cell != 4)
        .flat_map(|(_, quad)| quad.iter().copied())
        .collect();
    mesh
}

/// Unit icosphere (12 vertices, 20 faces, outward winding).
pub fn icosphere() -> TestMesh {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let raw = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ];
    let positions: Vec<Vec3> = raw.iter().map(|p| p.normalize()).collect();
    let indices = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, //
        1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1, 8, //
        3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, //
        4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
    ];
    let normals = positions.clone();
    TestMesh::new(positions, normals, indices)
}

/// View-projection and eye of a camera 5 units above the origin looking down -Y.
pub fn top_down() -> (Mat4, Vec3) {
    let eye = Vec3::new(0.0, 5.0, 0.0);
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, -Vec3::Z);
    let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
    (proj * view, eye)
}
