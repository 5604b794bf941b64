//! Shared configuration for the vertex tweaker
//!
//! This crate provides the single source of truth for the tolerances and
//! fixed capacities used by the editing core (block sizes for parallel
//! passes, pick candidate cap, coincidence epsilons). Hosts can keep the
//! defaults or load overrides from JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of vertices processed per parallel block
pub const DEFAULT_VERTEX_BLOCK_SIZE: usize = 1024;

/// Default cap on candidates gathered by a screen-space pick
pub const DEFAULT_PICK_CANDIDATE_CAP: usize = 64;

/// Default distance a front-face raycast may land from the vertex it tests
pub const DEFAULT_FRONT_FACE_TOLERANCE: f32 = 0.01;

/// Default epsilon for screen-distance ties during picking
pub const DEFAULT_PICK_TIE_EPSILON: f32 = 1e-7;

/// Default coincidence distance for welding
pub const DEFAULT_WELD_EPSILON: f32 = 1e-7;

/// Default minimum dot product between a vertex normal and its mirrored partner's
pub const DEFAULT_MIRROR_NORMAL_AGREEMENT: f32 = 0.99;

/// Default distance below which a vertex counts as lying on the mirror plane
pub const DEFAULT_ON_PLANE_TOLERANCE: f32 = 1e-5;

/// Default rotation angle (radians) below which a rotation is skipped
pub const DEFAULT_MIN_ROTATION_ANGLE: f32 = 1e-6;

/// Errors produced while loading or validating a [`TweakerConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tolerances and capacities for the editing core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweakerConfig {
    /// Vertices per contiguous block in parallel per-vertex passes
    pub vertex_block_size: usize,
    /// Maximum candidates kept by a screen-space pick; extra ones are dropped
    pub pick_candidate_cap: usize,
    /// How close a camera ray hit must land to a vertex for it to count as visible
    pub front_face_tolerance: f32,
    /// Screen distances closer than this are treated as a tie
    pub pick_tie_epsilon: f32,
    /// Weld coincidence distance (world units)
    pub weld_epsilon: f32,
    /// Minimum normal agreement for a mirroring partner
    pub mirror_normal_agreement: f32,
    /// Plane distance treated as lying on the mirror plane
    pub on_plane_tolerance: f32,
    /// Rotations with a smaller angle (radians) are skipped
    pub min_rotation_angle: f32,
}

impl Default for TweakerConfig {
    fn default() -> Self {
        Self {
            vertex_block_size: DEFAULT_VERTEX_BLOCK_SIZE,
            pick_candidate_cap: DEFAULT_PICK_CANDIDATE_CAP,
            front_face_tolerance: DEFAULT_FRONT_FACE_TOLERANCE,
            pick_tie_epsilon: DEFAULT_PICK_TIE_EPSILON,
            weld_epsilon: DEFAULT_WELD_EPSILON,
            mirror_normal_agreement: DEFAULT_MIRROR_NORMAL_AGREEMENT,
            on_plane_tolerance: DEFAULT_ON_PLANE_TOLERANCE,
            min_rotation_angle: DEFAULT_MIN_ROTATION_ANGLE,
        }
    }
}

impl TweakerConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every field is usable by the core.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vertex_block_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "vertex_block_size",
                reason: "must be at least 1",
            });
        }
        if self.pick_candidate_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pick_candidate_cap",
                reason: "must be at least 1",
            });
        }
        let non_negative = [
            ("front_face_tolerance", self.front_face_tolerance),
            ("pick_tie_epsilon", self.pick_tie_epsilon),
            ("weld_epsilon", self.weld_epsilon),
            ("on_plane_tolerance", self.on_plane_tolerance),
            ("min_rotation_angle", self.min_rotation_angle),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be a non-negative number",
                });
            }
        }
        if !(-1.0..=1.0).contains(&self.mirror_normal_agreement) {
            return Err(ConfigError::InvalidValue {
                field: "mirror_normal_agreement",
                reason: "must be a dot product in [-1, 1]",
            });
        }
        Ok(())
    }
}
