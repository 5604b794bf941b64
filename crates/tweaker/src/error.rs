//! Error type for precondition violations at the API boundary.
//!
//! "Nothing matched" is never an error: operations report it as a zero count
//! or `None`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TweakerError {
    #[error("Buffer `{name}` has {len} elements, expected at least {required}")]
    BufferTooShort {
        name: &'static str,
        len: usize,
        required: usize,
    },
    #[error("Triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("Triangle {triangle} is out of range for a mesh with {triangle_count} triangles")]
    TriangleOutOfRange {
        triangle: usize,
        triangle_count: usize,
    },
    #[error("Operation requires the `{0}` attribute")]
    MissingAttribute(&'static str),
    #[error("Brush curve must contain at least one sample")]
    EmptyBrushCurve,
    #[error("Vertex {vertex} references bone {bone}, but the skin has {bone_count} bones")]
    BoneIndexOutOfRange {
        vertex: usize,
        bone: u32,
        bone_count: usize,
    },
    #[error("Skin has {bones} bones but {bindposes} bind poses")]
    BindPoseMismatch { bones: usize, bindposes: usize },
    #[error("Flat buffer `{name}` cannot be viewed as {element}: {reason}")]
    BufferCast {
        name: &'static str,
        element: &'static str,
        reason: String,
    },
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

pub type Result<T> = std::result::Result<T, TweakerError>;

/// Fail with [`TweakerError::BufferTooShort`] unless `len >= required`.
pub(crate) fn ensure_len(name: &'static str, len: usize, required: usize) -> Result<()> {
    if len < required {
        return Err(TweakerError::BufferTooShort {
            name,
            len,
            required,
        });
    }
    Ok(())
}
