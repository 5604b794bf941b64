//! Brush falloff model.
//!
//! Brush strength is looked up from a caller-supplied curve sampled uniformly
//! over normalized distance from the brush center (index 0 = center, last
//! index = edge). Lookup picks the nearest lower bucket without
//! interpolation. [`FalloffCurve`] provides analytic presets that can be baked
//! into a sampled curve for hosts that don't author their own.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TweakerError};
use crate::math::clamp01;

/// Borrowed brush falloff samples.
#[derive(Debug, Clone, Copy)]
pub struct BrushCurve<'a> {
    samples: &'a [f32],
}

impl<'a> BrushCurve<'a> {
    /// Wrap a sampled curve. At least one sample is required.
    pub fn new(samples: &'a [f32]) -> Result<Self> {
        if samples.is_empty() {
            return Err(TweakerError::EmptyBrushCurve);
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Bucket for a distance from the brush center.
    ///
    /// `distance == 0` maps to the first bucket and `distance >= radius` to
    /// the last one.
    pub fn sample_index(&self, distance: f32, radius: f32) -> usize {
        let last = self.samples.len() - 1;
        let index = (clamp01(distance / radius) * last as f32) as usize;
        index.min(last)
    }

    /// Falloff value for a distance from the brush center.
    pub fn sample(&self, distance: f32, radius: f32) -> f32 {
        self.samples[self.sample_index(distance, radius)]
    }

    /// Rate of change of the curve toward the brush center at a bucket,
    /// per unit of normalized distance.
    ///
    /// Uses a central difference inside the curve and one-sided differences
    /// at both ends. A single-sample curve is flat.
    pub fn slope_toward_center(&self, index: usize) -> f32 {
        let n = self.samples.len();
        if n < 2 {
            return 0.0;
        }
        let s = self.samples;
        let step = 1.0 / (n - 1) as f32;
        let along_distance = if index == 0 {
            (s[1] - s[0]) / step
        } else if index >= n - 1 {
            (s[n - 1] - s[n - 2]) / step
        } else {
            (s[index + 1] - s[index - 1]) / (step * 2.0)
        };
        -along_distance
    }
}

/// Falloff curve for brush influence.
///
/// Determines how brush strength decreases from center to edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FalloffCurve {
    /// Linear falloff: strength = 1 - distance/radius
    #[default]
    Linear = 0,
    /// Smooth falloff: hermite interpolation
    Smooth = 1,
    /// Sharp falloff: quadratic decay
    Sharp = 2,
    /// Constant: full strength within radius
    Constant = 3,
    /// Sphere: spherical falloff (sqrt-based)
    Sphere = 4,
}

impl FalloffCurve {
    /// Calculate falloff strength at a given normalized distance (0.0 = center, 1.0 = edge).
    pub fn evaluate(&self, normalized_distance: f32) -> f32 {
        let d = normalized_distance.clamp(0.0, 1.0);
        match self {
            FalloffCurve::Linear => 1.0 - d,
            FalloffCurve::Smooth => {
                let t = 1.0 - d;
                t * t * (3.0 - 2.0 * t)
            }
            FalloffCurve::Sharp => {
                let t = 1.0 - d;
                t * t
            }
            FalloffCurve::Constant => 1.0,
            FalloffCurve::Sphere => (1.0 - d * d).max(0.0).sqrt(),
        }
    }

    /// Sample the curve into `count` uniform buckets, center first.
    pub fn bake(&self, count: usize) -> Vec<f32> {
        match count {
            0 => Vec::new(),
            1 => vec![self.evaluate(0.0)],
            _ => (0..count)
                .map(|i| self.evaluate(i as f32 / (count - 1) as f32))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_curve_rejected() {
        assert_eq!(BrushCurve::new(&[]).err(), Some(TweakerError::EmptyBrushCurve));
    }

    #[test]
    fn test_center_and_edge_samples() {
        let samples = [1.0, 0.75, 0.5, 0.25, 0.1];
        let curve = BrushCurve::new(&samples).unwrap();
        assert_eq!(curve.sample(0.0, 2.0), 1.0);
        assert_eq!(curve.sample(2.0, 2.0), 0.1);
        // Beyond the radius clamps to the edge
        assert_eq!(curve.sample(5.0, 2.0), 0.1);
        // Nearest lower bucket, not interpolated
        assert_eq!(curve.sample(0.9, 2.0), 0.75);
    }

    #[test]
    fn test_single_sample_curve() {
        let curve = BrushCurve::new(&[0.6]).unwrap();
        assert_eq!(curve.sample(0.0, 1.0), 0.6);
        assert_eq!(curve.sample(1.0, 1.0), 0.6);
        assert_eq!(curve.slope_toward_center(0), 0.0);
    }

    #[test]
    fn test_slope_toward_center() {
        // Linear falloff rises by 1 toward the center over the whole radius
        let samples = FalloffCurve::Linear.bake(5);
        let curve = BrushCurve::new(&samples).unwrap();
        for i in 0..5 {
            assert!((curve.slope_toward_center(i) - 1.0).abs() < 1e-5);
        }

        // Curve rising toward the edge has a negative slope
        let rising = [0.0, 0.5, 1.0];
        let curve = BrushCurve::new(&rising).unwrap();
        assert!((curve.slope_toward_center(1) + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_falloff_curves() {
        assert!((FalloffCurve::Linear.evaluate(0.0) - 1.0).abs() < 0.001);
        assert!((FalloffCurve::Smooth.evaluate(0.0) - 1.0).abs() < 0.001);
        assert!((FalloffCurve::Sharp.evaluate(0.0) - 1.0).abs() < 0.001);
        assert!((FalloffCurve::Constant.evaluate(0.0) - 1.0).abs() < 0.001);
        assert!((FalloffCurve::Sphere.evaluate(0.0) - 1.0).abs() < 0.001);

        assert!(FalloffCurve::Linear.evaluate(1.0).abs() < 0.001);
        assert!(FalloffCurve::Smooth.evaluate(1.0).abs() < 0.001);
        assert!(FalloffCurve::Sharp.evaluate(1.0).abs() < 0.001);
        assert!((FalloffCurve::Constant.evaluate(1.0) - 1.0).abs() < 0.001);
        assert!(FalloffCurve::Sphere.evaluate(1.0).abs() < 0.001);
    }

    #[test]
    fn test_bake_orders_center_first() {
        let baked = FalloffCurve::Sharp.bake(3);
        assert_eq!(baked.len(), 3);
        assert_eq!(baked[0], 1.0);
        assert!((baked[1] - 0.25).abs() < 1e-6);
        assert_eq!(baked[2], 0.0);
        assert!(FalloffCurve::Linear.bake(0).is_empty());
    }
}
