//! Vertex tweaking core.
//!
//! This crate implements the computational side of a normal/vertex editing
//! tool that works directly on caller-owned mesh buffers:
//! - Spatial queries (raycast, brush radius, screen-space picking)
//! - Soft per-vertex selection (pick, rect, lasso, brush, edge, hole, connected)
//! - Mutation under the selection mask (move, rotate, scale, normal sculpting)
//! - Normal welding and mirroring across a symmetry plane
//! - Attribute projection from another mesh
//! - Linear blend skinning and its inverse
//! - Normal/tangent regeneration and heightmap terrain generation
//!
//! # Architecture
//!
//! Every operation is a stateless function over a [`MeshView`], a
//! non-owning descriptor bundling the host's buffers with a local-to-world
//! transform. Per-vertex passes run as fork-join loops on rayon where each
//! task only writes the vertex slots it owns, so no locking is needed.
//!
//! Operations validate their views up front and return [`TweakerError`]
//! for bad indices or short buffers before touching host data.
//!
//! Tolerances and capacities come from [`TweakerConfig`].

pub mod brush;
pub mod deformation;
pub mod error;
pub mod generate;
pub mod input;
pub mod math;
pub mod mesh;
pub mod mirror;
pub mod projection;
pub mod raycast;
pub mod sculpt;
pub mod selection;
pub mod skinning;
pub mod spatial;
pub mod types;
pub mod weld;

#[cfg(test)]
pub(crate) mod fixtures;

pub use brush::{BrushCurve, FalloffCurve};
pub use error::{Result, TweakerError};
pub use mesh::MeshView;
pub use mirror::{MirrorPartner, MirroringRelation};
pub use projection::{RayDirections, RaySource};
pub use skinning::{BoneWeights, BoneWeights4, SkinInput, SkinOutput, SkinView};
pub use tweaker_config::TweakerConfig;
pub use types::{AttributeMask, AxisMask, ProjectionMode, WeldMode};
