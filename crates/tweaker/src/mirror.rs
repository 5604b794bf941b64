//! Symmetry across a mirror plane.
//!
//! [`build_mirroring_relation`] pairs each vertex on the negative side of the
//! plane with its mirror image on the positive side; [`apply_mirroring`] then
//! copies edits from the negative half onto the positive half. The relation
//! is built once and reused for every edit while symmetry is on.

use glam::{Vec3, Vec4, Vec4Swizzles};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tweaker_config::TweakerConfig;

use crate::error::{ensure_len, Result, TweakerError};
use crate::math::Plane;
use crate::mesh::MeshView;

/// Host encoding of a vertex with no partner
const RAW_NONE: i32 = -1;
/// Host encoding of a vertex lying on the plane
const RAW_ON_PLANE: i32 = -2;

/// Mirror role of a single vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MirrorPartner {
    #[default]
    None,
    OnPlane,
    /// Index of the positive-side vertex mirroring this one
    Partner(u32),
}

impl MirrorPartner {
    /// Decode the host's signed encoding (-1 none, -2 on plane, >= 0 partner).
    /// Other negative values decode as `None`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            RAW_ON_PLANE => Self::OnPlane,
            r if r >= 0 => Self::Partner(r as u32),
            _ => Self::None,
        }
    }

    pub fn to_raw(self) -> i32 {
        match self {
            Self::None => RAW_NONE,
            Self::OnPlane => RAW_ON_PLANE,
            Self::Partner(index) => index as i32,
        }
    }
}

/// One [`MirrorPartner`] per vertex.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MirroringRelation {
    pub partners: Vec<MirrorPartner>,
}

impl MirroringRelation {
    pub fn from_raw(raw: &[i32]) -> Self {
        Self {
            partners: raw.iter().map(|&r| MirrorPartner::from_raw(r)).collect(),
        }
    }

    /// Write the host encoding into `out`.
    pub fn write_raw(&self, out: &mut [i32]) -> Result<()> {
        ensure_len("relation", out.len(), self.partners.len())?;
        for (slot, partner) in out.iter_mut().zip(&self.partners) {
            *slot = partner.to_raw();
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.partners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }

    /// Number of vertices with a partner
    pub fn partner_count(&self) -> usize {
        self.partners
            .iter()
            .filter(|p| matches!(p, MirrorPartner::Partner(_)))
            .count()
    }
}

/// Pair negative-side vertices with their mirror images.
///
/// Vertices within `config.on_plane_tolerance` of the plane are `OnPlane`.
/// A vertex on the negative side takes the first vertex (by index) on the
/// positive side whose mirrored position lies within `epsilon` and whose
/// mirrored normal agrees with its own by at least
/// `config.mirror_normal_agreement`. Everything else is `None`.
///
/// Positions and the plane are both in the mesh's local space. Returns the
/// relation and the number of partners found.
pub fn build_mirroring_relation(
    mesh: &MeshView<'_>,
    plane: Plane,
    epsilon: f32,
    config: &TweakerConfig,
) -> Result<(MirroringRelation, usize)> {
    mesh.validate()?;
    let positions = mesh.positions();
    let normals = mesh.normals()?;
    let on_plane = config.on_plane_tolerance;
    let agreement = config.mirror_normal_agreement;

    let distances: Vec<f32> = positions.par_iter().map(|&p| plane.signed_distance(p)).collect();

    let partners: Vec<MirrorPartner> = (0..positions.len())
        .into_par_iter()
        .with_min_len(config.vertex_block_size.max(1))
        .map(|vertex| {
            let d = distances[vertex];
            if d.abs() <= on_plane {
                return MirrorPartner::OnPlane;
            }
            if d > 0.0 {
                return MirrorPartner::None;
            }
            let p = positions[vertex];
            let n = normals[vertex];
            distances
                .iter()
                .enumerate()
                .find(|&(other, &d2)| {
                    d2 > on_plane
                        && plane.mirror_point(positions[other]).distance(p) < epsilon
                        && n.dot(plane.mirror_vector(normals[other])) >= agreement
                })
                .map_or(MirrorPartner::None, |(other, _)| MirrorPartner::Partner(other as u32))
        })
        .collect();

    let relation = MirroringRelation { partners };
    let count = relation.partner_count();
    debug!("build_mirroring_relation: {} partners", count);
    Ok((relation, count))
}

fn check_partner(partner: u32, len: usize) -> Result<()> {
    let index = partner as usize;
    if index >= len {
        return Err(TweakerError::BufferTooShort {
            name: "mirror partner",
            len,
            required: index + 1,
        });
    }
    Ok(())
}

/// Copy negative-side attributes onto their partners, mirrored.
///
/// Positions of on-plane vertices are projected onto the plane. Each buffer
/// is optional; tangent handedness (w) of partners is left as is. Buffer
/// lengths and partner indices are all checked before the first write, so an
/// error leaves every buffer untouched.
pub fn apply_mirroring(
    relation: &MirroringRelation,
    plane: Plane,
    positions: Option<&mut [Vec3]>,
    normals: Option<&mut [Vec3]>,
    tangents: Option<&mut [Vec4]>,
) -> Result<()> {
    let partners = &relation.partners;
    let n = partners.len();

    if let Some(positions) = positions.as_deref() {
        ensure_len("positions", positions.len(), n)?;
    }
    if let Some(normals) = normals.as_deref() {
        ensure_len("normals", normals.len(), n)?;
    }
    if let Some(tangents) = tangents.as_deref() {
        ensure_len("tangents", tangents.len(), n)?;
    }
    for partner in partners {
        if let MirrorPartner::Partner(other) = *partner {
            check_partner(other, n)?;
        }
    }

    if let Some(positions) = positions {
        for (vertex, partner) in partners.iter().enumerate() {
            match *partner {
                MirrorPartner::Partner(other) => {
                    positions[other as usize] = plane.mirror_point(positions[vertex]);
                }
                MirrorPartner::OnPlane => positions[vertex] = plane.project_point(positions[vertex]),
                MirrorPartner::None => {}
            }
        }
    }

    if let Some(normals) = normals {
        for (vertex, partner) in partners.iter().enumerate() {
            if let MirrorPartner::Partner(other) = *partner {
                normals[other as usize] = plane.mirror_vector(normals[vertex]);
            }
        }
    }

    if let Some(tangents) = tangents {
        for (vertex, partner) in partners.iter().enumerate() {
            if let MirrorPartner::Partner(other) = *partner {
                let other = other as usize;
                let mirrored = plane.mirror_vector(tangents[vertex].xyz());
                tangents[other] = mirrored.extend(tangents[other].w);
            }
        }
    }

    Ok(())
}
