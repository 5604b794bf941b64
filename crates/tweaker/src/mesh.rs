//! Non-owning view over host mesh buffers.
//!
//! The host owns positions, normals, tangents, UVs, selection weights and
//! triangle indices. A [`MeshView`] borrows them for the duration of one
//! operation together with the mesh's local-to-world transform.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::error::{ensure_len, Result, TweakerError};
use crate::math::try_inverse;

/// Borrowed mesh buffers plus a local-to-world transform.
///
/// Mutable slices are exclusive for the lifetime of the view, so two
/// operations can never run against the same buffers at once.
///
/// Accessors slice the buffers directly and panic on an inconsistent view;
/// every public operation calls [`MeshView::validate`] first.
#[derive(Debug)]
pub struct MeshView<'a> {
    /// Triangle list, three vertex indices per triangle
    pub indices: &'a [u32],
    /// Vertex positions in local space
    pub positions: &'a mut [Vec3],
    /// Vertex normals in local space
    pub normals: Option<&'a mut [Vec3]>,
    /// Vertex tangents (xyz = direction, w = handedness)
    pub tangents: Option<&'a mut [Vec4]>,
    /// Vertex UVs
    pub uvs: Option<&'a [Vec2]>,
    /// Per-vertex selection weights in [0, 1]
    pub selection: Option<&'a mut [f32]>,
    /// Number of vertices covered by the view
    pub vertex_count: usize,
    /// Number of triangles covered by the view
    pub triangle_count: usize,
    /// Local-to-world transform
    pub local_to_world: Mat4,
}

impl<'a> MeshView<'a> {
    /// Create a view over positions and indices.
    ///
    /// Counts are taken from the slice lengths; use [`MeshView::with_counts`]
    /// when the host buffers are larger than the live mesh.
    pub fn new(positions: &'a mut [Vec3], indices: &'a [u32]) -> Self {
        let vertex_count = positions.len();
        let triangle_count = indices.len() / 3;
        Self {
            indices,
            positions,
            normals: None,
            tangents: None,
            uvs: None,
            selection: None,
            vertex_count,
            triangle_count,
            local_to_world: Mat4::IDENTITY,
        }
    }

    /// Create a view from flat `f32` position data (xyz per vertex).
    pub fn from_flat(positions: &'a mut [f32], indices: &'a [u32]) -> Result<Self> {
        let positions = cast_flat_mut::<Vec3>("positions", "Vec3", positions)?;
        Ok(Self::new(positions, indices))
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: &'a mut [Vec3]) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attach flat `f32` normal data (xyz per vertex).
    pub fn with_flat_normals(mut self, normals: &'a mut [f32]) -> Result<Self> {
        self.normals = Some(cast_flat_mut::<Vec3>("normals", "Vec3", normals)?);
        Ok(self)
    }

    /// Attach per-vertex tangents, handedness in w.
    pub fn with_tangents(mut self, tangents: &'a mut [Vec4]) -> Self {
        self.tangents = Some(tangents);
        self
    }

    /// Attach per-vertex UVs.
    pub fn with_uvs(mut self, uvs: &'a [Vec2]) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Attach per-vertex selection weights.
    pub fn with_selection(mut self, selection: &'a mut [f32]) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Set the local-to-world transform.
    pub fn with_transform(mut self, local_to_world: Mat4) -> Self {
        self.local_to_world = local_to_world;
        self
    }

    /// Restrict the view to the first `vertex_count` vertices and
    /// `triangle_count` triangles of the borrowed buffers.
    pub fn with_counts(mut self, vertex_count: usize, triangle_count: usize) -> Self {
        self.vertex_count = vertex_count;
        self.triangle_count = triangle_count;
        self
    }

    /// Check buffer sizes and index ranges.
    ///
    /// Fails with [`TweakerError::BufferTooShort`] or
    /// [`TweakerError::IndexOutOfRange`] before anything is written.
    pub fn validate(&self) -> Result<()> {
        let n = self.vertex_count;
        ensure_len("positions", self.positions.len(), n)?;
        ensure_len("indices", self.indices.len(), self.triangle_count * 3)?;
        if let Some(normals) = self.normals.as_deref() {
            ensure_len("normals", normals.len(), n)?;
        }
        if let Some(tangents) = self.tangents.as_deref() {
            ensure_len("tangents", tangents.len(), n)?;
        }
        if let Some(uvs) = self.uvs {
            ensure_len("uvs", uvs.len(), n)?;
        }
        if let Some(selection) = self.selection.as_deref() {
            ensure_len("selection", selection.len(), n)?;
        }
        for (triangle, tri) in self.triangles().chunks_exact(3).enumerate() {
            for &index in tri {
                if index as usize >= n {
                    return Err(TweakerError::IndexOutOfRange {
                        triangle,
                        index,
                        vertex_count: n,
                    });
                }
            }
        }
        Ok(())
    }

    /// Live triangle indices
    pub fn triangles(&self) -> &'a [u32] {
        &self.indices[..self.triangle_count * 3]
    }

    /// Vertex indices of one triangle
    pub fn triangle(&self, triangle: usize) -> [usize; 3] {
        let base = triangle * 3;
        [
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        ]
    }

    /// Live positions
    pub fn positions(&self) -> &[Vec3] {
        &self.positions[..self.vertex_count]
    }

    /// Live normals, or an error naming the missing attribute
    pub fn normals(&self) -> Result<&[Vec3]> {
        self.normals
            .as_deref()
            .map(|n| &n[..self.vertex_count])
            .ok_or(TweakerError::MissingAttribute("normals"))
    }

    /// Live selection weights, if the view carries them
    pub fn selection(&self) -> Option<&[f32]> {
        self.selection.as_deref().map(|s| &s[..self.vertex_count])
    }

    /// Live selection weights for writing, or an error naming the missing attribute
    pub fn selection_mut(&mut self) -> Result<&mut [f32]> {
        let n = self.vertex_count;
        self.selection
            .as_deref_mut()
            .map(|s| &mut s[..n])
            .ok_or(TweakerError::MissingAttribute("selection"))
    }

    /// Live positions for reading alongside live selection weights for writing.
    pub fn positions_and_selection_mut(&mut self) -> Result<(&[Vec3], &mut [f32])> {
        let n = self.vertex_count;
        let selection = self
            .selection
            .as_deref_mut()
            .ok_or(TweakerError::MissingAttribute("selection"))?;
        Ok((&self.positions[..n], &mut selection[..n]))
    }

    /// Weight of a vertex when the selection is used as a mask.
    ///
    /// Without a mask (or without a selection buffer) every vertex has full weight.
    pub fn mask_weight(&self, vertex: usize, use_mask: bool) -> f32 {
        match (use_mask, self.selection.as_deref()) {
            (true, Some(selection)) => selection[vertex],
            _ => 1.0,
        }
    }

    /// Inverse of the local-to-world transform, `None` if it is singular.
    pub fn world_to_local(&self) -> Option<Mat4> {
        try_inverse(self.local_to_world)
    }

    /// Position of a vertex in world space
    pub fn world_position(&self, vertex: usize) -> Vec3 {
        self.local_to_world.transform_point3(self.positions[vertex])
    }

    /// World-space copy of all live positions.
    pub fn world_positions(&self) -> Vec<Vec3> {
        let m = self.local_to_world;
        self.positions().iter().map(|&p| m.transform_point3(p)).collect()
    }
}

/// Reinterpret a flat `f32` buffer as a slice of glam vectors.
pub fn cast_flat_mut<'b, T: bytemuck::Pod>(
    name: &'static str,
    element: &'static str,
    data: &'b mut [f32],
) -> Result<&'b mut [T]> {
    bytemuck::try_cast_slice_mut(data).map_err(|e| TweakerError::BufferCast {
        name,
        element,
        reason: e.to_string(),
    })
}
