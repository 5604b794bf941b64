//! Linear blend skinning.
//!
//! A vertex is transformed by each of its influencing bones' pose matrices
//! and the results are summed by weight. Weights are used as given and are
//! not renormalized. Reverse skinning applies the inverted poses, taking a
//! posed mesh back to its bind shape.
//!
//! Positions, normals and tangents are independent streams and are computed
//! concurrently.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{ensure_len, Result, TweakerError};
use crate::math::try_inverse;

/// Up to `N` bone influences of one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeights<const N: usize> {
    pub indices: [u32; N],
    pub weights: [f32; N],
}

/// The common four-influence layout
pub type BoneWeights4 = BoneWeights<4>;

impl<const N: usize> Default for BoneWeights<N> {
    fn default() -> Self {
        Self {
            indices: [0; N],
            weights: [0.0; N],
        }
    }
}

impl<const N: usize> BoneWeights<N> {
    /// Fully bound to a single bone.
    pub fn single(bone: u32) -> Self {
        let mut weights = Self::default();
        if N > 0 {
            weights.indices[0] = bone;
            weights.weights[0] = 1.0;
        }
        weights
    }

    fn blend(&self, poses: &[Mat4], f: impl Fn(&Mat4) -> Vec3) -> Vec3 {
        self.indices
            .iter()
            .zip(&self.weights)
            .fold(Vec3::ZERO, |acc, (&bone, &w)| acc + f(&poses[bone as usize]) * w)
    }
}

/// Borrowed skin description.
#[derive(Debug, Clone, Copy)]
pub struct SkinView<'a, const N: usize = 4> {
    /// Bone influences, one entry per vertex
    pub weights: &'a [BoneWeights<N>],
    /// Current bone transforms
    pub bones: &'a [Mat4],
    /// Inverse bind matrices, one per bone
    pub bindposes: &'a [Mat4],
    /// Transform of the skinned object's root
    pub root: Mat4,
}

impl<'a, const N: usize> SkinView<'a, N> {
    pub fn new(weights: &'a [BoneWeights<N>], bones: &'a [Mat4], bindposes: &'a [Mat4]) -> Self {
        Self {
            weights,
            bones,
            bindposes,
            root: Mat4::IDENTITY,
        }
    }

    pub fn with_root(mut self, root: Mat4) -> Self {
        self.root = root;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.weights.len()
    }

    /// Check bone and bind pose counts and every bone index.
    pub fn validate(&self) -> Result<()> {
        if self.bones.len() != self.bindposes.len() {
            return Err(TweakerError::BindPoseMismatch {
                bones: self.bones.len(),
                bindposes: self.bindposes.len(),
            });
        }
        for (vertex, w) in self.weights.iter().enumerate() {
            if let Some(&bone) = w.indices.iter().find(|&&b| b as usize >= self.bones.len()) {
                return Err(TweakerError::BoneIndexOutOfRange {
                    vertex,
                    bone,
                    bone_count: self.bones.len(),
                });
            }
        }
        Ok(())
    }

    /// Per-bone skinning matrices, or `None` if a transform can't be inverted.
    fn poses(&self, reverse: bool) -> Option<Vec<Mat4>> {
        let root_inv = try_inverse(self.root)?;
        self.bones
            .iter()
            .zip(self.bindposes)
            .map(|(&bone, &bindpose)| {
                let pose = root_inv * bone * bindpose;
                if reverse { try_inverse(pose) } else { Some(pose) }
            })
            .collect()
    }
}

/// Attribute streams read by a skinning pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinInput<'i> {
    pub positions: Option<&'i [Vec3]>,
    pub normals: Option<&'i [Vec3]>,
    pub tangents: Option<&'i [Vec4]>,
}

/// Attribute streams written by a skinning pass.
///
/// A stream is only computed when both its input and output are present.
#[derive(Debug, Default)]
pub struct SkinOutput<'o> {
    pub positions: Option<&'o mut [Vec3]>,
    pub normals: Option<&'o mut [Vec3]>,
    pub tangents: Option<&'o mut [Vec4]>,
}

fn check_stream<I, O>(name: &'static str, input: Option<&[I]>, output: &Option<&mut [O]>, n: usize) -> Result<()> {
    if let (Some(input), Some(output)) = (input, output.as_deref()) {
        ensure_len(name, input.len(), n)?;
        ensure_len(name, output.len(), n)?;
    }
    Ok(())
}

fn run_skinning<const N: usize>(skin: &SkinView<'_, N>, input: SkinInput<'_>, output: SkinOutput<'_>, reverse: bool) -> Result<()> {
    skin.validate()?;
    let n = skin.vertex_count();
    check_stream("positions", input.positions, &output.positions, n)?;
    check_stream("normals", input.normals, &output.normals, n)?;
    check_stream("tangents", input.tangents, &output.tangents, n)?;

    let Some(poses) = skin.poses(reverse) else {
        warn!("skinning: singular root or pose transform, skipping");
        return Ok(());
    };
    let poses = poses.as_slice();
    let weights = skin.weights;

    let positions = || {
        if let (Some(src), Some(dst)) = (input.positions, output.positions) {
            dst[..n].par_iter_mut().enumerate().for_each(|(v, out)| {
                *out = weights[v].blend(poses, |m| m.transform_point3(src[v]));
            });
        }
    };
    let normals = || {
        if let (Some(src), Some(dst)) = (input.normals, output.normals) {
            dst[..n].par_iter_mut().enumerate().for_each(|(v, out)| {
                *out = weights[v].blend(poses, |m| m.transform_vector3(src[v])).normalize_or_zero();
            });
        }
    };
    let tangents = || {
        if let (Some(src), Some(dst)) = (input.tangents, output.tangents) {
            dst[..n].par_iter_mut().enumerate().for_each(|(v, out)| {
                let t = src[v];
                let xyz = weights[v].blend(poses, |m| m.transform_vector3(t.xyz()));
                *out = xyz.normalize_or_zero().extend(t.w);
            });
        }
    };
    rayon::join(positions, || rayon::join(normals, tangents));

    debug!("skinning: {} vertices, {} bones (reverse: {})", n, poses.len(), reverse);
    Ok(())
}

/// Deform bind-shape attributes into the current pose.
pub fn apply_skinning<const N: usize>(skin: &SkinView<'_, N>, input: SkinInput<'_>, output: SkinOutput<'_>) -> Result<()> {
    run_skinning(skin, input, output, false)
}

/// Take posed attributes back to the bind shape with the inverted poses.
///
/// Exact for vertices bound to a single bone; blended vertices are
/// approximated.
pub fn apply_reverse_skinning<const N: usize>(
    skin: &SkinView<'_, N>,
    input: SkinInput<'_>,
    output: SkinOutput<'_>,
) -> Result<()> {
    run_skinning(skin, input, output, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn sample_positions() -> Vec<Vec3> {
        vec![Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Vec3::new(-2.0, 0.5, 1.0)]
    }

    #[test]
    fn test_identity_pose_keeps_positions() {
        let positions = sample_positions();
        let weights = vec![
            BoneWeights4 {
                indices: [0, 1, 0, 0],
                weights: [0.5, 0.5, 0.0, 0.0],
            };
            3
        ];
        let bones = [Mat4::IDENTITY; 2];
        let bindposes = [Mat4::IDENTITY; 2];
        let skin = SkinView::new(&weights, &bones, &bindposes);

        let mut out = vec![Vec3::splat(9.0); 3];
        let input = SkinInput {
            positions: Some(&positions),
            ..Default::default()
        };
        let output = SkinOutput {
            positions: Some(&mut out),
            ..Default::default()
        };
        apply_skinning(&skin, input, output).unwrap();
        assert_eq!(out, positions);
    }

    #[test]
    fn test_translated_bone() {
        let positions = sample_positions();
        let weights = vec![BoneWeights4::single(0); 3];
        let bones = [Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0))];
        let bindposes = [Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))];
        let root = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let skin = SkinView::new(&weights, &bones, &bindposes).with_root(root);

        let mut out = vec![Vec3::ZERO; 3];
        let input = SkinInput {
            positions: Some(&positions),
            ..Default::default()
        };
        let output = SkinOutput {
            positions: Some(&mut out),
            ..Default::default()
        };
        apply_skinning(&skin, input, output).unwrap();
        for (p, q) in positions.iter().zip(&out) {
            assert!(approx(*q, *p + Vec3::new(-1.0, 2.0, 0.0)));
        }
    }

    #[test]
    fn test_forward_then_reverse_round_trips() {
        let positions = sample_positions();
        let normals = vec![Vec3::Y, Vec3::X, Vec3::new(0.0, 1.0, 1.0).normalize()];
        let tangents = vec![Vec4::new(1.0, 0.0, 0.0, -1.0); 3];
        let weights = vec![BoneWeights4::single(0), BoneWeights4::single(1), BoneWeights4::single(1)];
        let bones = [
            Mat4::from_rotation_translation(Quat::from_rotation_y(0.7), Vec3::new(1.0, 2.0, 3.0)),
            Mat4::from_scale_rotation_translation(Vec3::splat(2.0), Quat::from_rotation_x(-0.3), Vec3::Z),
        ];
        let bindposes = [Mat4::IDENTITY, Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))];
        let skin = SkinView::new(&weights, &bones, &bindposes).with_root(Mat4::from_rotation_z(0.2));

        let (mut p1, mut n1, mut t1) = (vec![Vec3::ZERO; 3], vec![Vec3::ZERO; 3], vec![Vec4::ZERO; 3]);
        apply_skinning(
            &skin,
            SkinInput {
                positions: Some(&positions),
                normals: Some(&normals),
                tangents: Some(&tangents),
            },
            SkinOutput {
                positions: Some(&mut p1),
                normals: Some(&mut n1),
                tangents: Some(&mut t1),
            },
        )
        .unwrap();
        assert!(n1.iter().all(|n| (n.length() - 1.0).abs() < 1e-4));
        assert!(t1.iter().all(|t| t.w == -1.0));

        let (mut p2, mut n2, mut t2) = (vec![Vec3::ZERO; 3], vec![Vec3::ZERO; 3], vec![Vec4::ZERO; 3]);
        apply_reverse_skinning(
            &skin,
            SkinInput {
                positions: Some(&p1),
                normals: Some(&n1),
                tangents: Some(&t1),
            },
            SkinOutput {
                positions: Some(&mut p2),
                normals: Some(&mut n2),
                tangents: Some(&mut t2),
            },
        )
        .unwrap();

        for v in 0..3 {
            assert!(approx(p2[v], positions[v]));
            assert!(approx(n2[v], normals[v]));
            assert!(approx(t2[v].xyz(), tangents[v].xyz()));
        }
    }

    #[test]
    fn test_validation_errors() {
        let weights = vec![BoneWeights4::single(2)];
        let bones = [Mat4::IDENTITY; 2];
        let bindposes = [Mat4::IDENTITY; 2];
        let skin = SkinView::new(&weights, &bones, &bindposes);
        assert_eq!(
            skin.validate(),
            Err(TweakerError::BoneIndexOutOfRange {
                vertex: 0,
                bone: 2,
                bone_count: 2
            })
        );

        let skin = SkinView::new(&weights, &bones, &bindposes[..1]);
        assert_eq!(skin.validate(), Err(TweakerError::BindPoseMismatch { bones: 2, bindposes: 1 }));

        let weights = vec![BoneWeights4::single(0); 2];
        let skin = SkinView::new(&weights, &bones, &bindposes);
        let positions = [Vec3::ZERO];
        let mut out = [Vec3::ZERO; 2];
        let result = apply_skinning(
            &skin,
            SkinInput {
                positions: Some(&positions),
                ..Default::default()
            },
            SkinOutput {
                positions: Some(&mut out),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TweakerError::BufferTooShort { name: "positions", .. })));
    }

    #[test]
    fn test_singular_root_is_noop() {
        let weights = vec![BoneWeights4::single(0)];
        let bones = [Mat4::IDENTITY];
        let skin = SkinView::new(&weights, &bones, &bones).with_root(Mat4::ZERO);
        let positions = [Vec3::X];
        let mut out = [Vec3::splat(7.0)];
        apply_skinning(
            &skin,
            SkinInput {
                positions: Some(&positions),
                ..Default::default()
            },
            SkinOutput {
                positions: Some(&mut out),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out[0], Vec3::splat(7.0));
    }
}
