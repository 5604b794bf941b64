//! Small parameter types shared across operations.
//!
//! These mirror the plain enum/bitmask arguments hosts pass across the API,
//! with `repr(u8)` discriminants matching the values hosts already use.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Which way projection rays are cast from each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ProjectionMode {
    /// Cast along the ray direction only
    #[default]
    Forward = 0,
    /// Cast against the ray direction only
    Backward = 1,
    /// Cast both ways and keep the closer hit
    ForwardAndBackward = 2,
}

impl ProjectionMode {
    pub fn casts_forward(self) -> bool {
        matches!(self, Self::Forward | Self::ForwardAndBackward)
    }

    pub fn casts_backward(self) -> bool {
        matches!(self, Self::Backward | Self::ForwardAndBackward)
    }
}

/// How normals flow between the working mesh and weld targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum WeldMode {
    /// Working mesh normals overwrite matched target normals
    #[default]
    CopyToTargets = 0,
    /// Matched target normals overwrite working mesh normals
    CopyFromTargets = 1,
    /// Matched normals are averaged and written to both sides
    Average = 2,
}

bitflags! {
    /// Vertex attributes a projection writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AttributeMask: u8 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const TANGENT = 1 << 2;
    }
}

impl Default for AttributeMask {
    fn default() -> Self {
        Self::NORMAL
    }
}

bitflags! {
    /// Coordinate axes replaced by an assign operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AxisMask: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
        const XYZ = Self::X.bits() | Self::Y.bits() | Self::Z.bits();
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::XYZ
    }
}
