// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Blending of noise fields.

use ndarray::{Axis, Zip};

use crate::error::{NoiseError, NoiseResult};
use crate::field::NoiseField;

/// Interpolates between two fields of identical shape.
pub trait Blend: Send + Sync {
    fn blend(&self, a: &NoiseField, b: &NoiseField, t: f64) -> NoiseResult<NoiseField>;
}

/// Spherical linear interpolation applied per batch item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slerp {
    /// Items whose normalised dot product exceeds this fall back to a lerp.
    pub parallel_threshold: f64,
}

impl Default for Slerp {
    fn default() -> Self {
        Self {
            parallel_threshold: 0.9995,
        }
    }
}

impl Blend for Slerp {
    fn blend(&self, a: &NoiseField, b: &NoiseField, t: f64) -> NoiseResult<NoiseField> {
        if !(0.0..=1.0).contains(&t) {
            return Err(NoiseError::invalid(
                "variation_strength",
                format!("blend factor must lie in [0, 1], got {t}"),
            ));
        }
        if a.shape() != b.shape() {
            return Err(NoiseError::shape_mismatch(format!(
                "cannot blend {} with {}",
                a.shape(),
                b.shape()
            )));
        }
        if t == 0.0 {
            return Ok(a.clone());
        }
        if t == 1.0 {
            return Ok(b.clone().to_device(a.device()).quantized(a.precision()));
        }

        let mut out = a.values().clone();
        for (mut item, rhs) in out
            .axis_iter_mut(Axis(0))
            .zip(b.values().axis_iter(Axis(0)))
        {
            let norm_a = item.iter().map(|v| v * v).sum::<f64>().sqrt();
            let norm_b = rhs.iter().map(|v| v * v).sum::<f64>().sqrt();
            let dot = if norm_a > 0.0 && norm_b > 0.0 {
                Zip::from(&item)
                    .and(&rhs)
                    .fold(0.0, |acc, &x, &y| acc + x * y)
                    / (norm_a * norm_b)
            } else {
                1.0
            };
            let (wa, wb) = if dot.abs() > self.parallel_threshold {
                (1.0 - t, t)
            } else {
                let theta = dot.clamp(-1.0, 1.0).acos();
                let sin = theta.sin();
                (((1.0 - t) * theta).sin() / sin, (t * theta).sin() / sin)
            };
            Zip::from(&mut item)
                .and(&rhs)
                .for_each(|x, &y| *x = wa * *x + wb * y);
        }
        NoiseField::new(out, *a.spec()).map(|field| field.quantized(a.precision()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::FieldSpec;
    use ndarray::{ArrayD, IxDyn};

    fn field(dims: &[usize], f: impl Fn(usize) -> f64) -> NoiseField {
        let spec = FieldSpec::from_dims(dims).unwrap();
        let mut n = 0;
        let values = ArrayD::from_shape_simple_fn(IxDyn(dims), || {
            n += 1;
            f(n)
        });
        NoiseField::new(values, spec).unwrap()
    }

    #[test]
    fn endpoints_are_exact() {
        let a = field(&[2, 1, 2, 2], |n| n as f64);
        let b = field(&[2, 1, 2, 2], |n| -(n as f64) * 0.5 + 1.0);
        let slerp = Slerp::default();
        assert_eq!(slerp.blend(&a, &b, 0.0).unwrap(), a);
        assert_eq!(slerp.blend(&a, &b, 1.0).unwrap().values(), b.values());
    }

    #[test]
    fn orthogonal_items_keep_their_norm() {
        let a = field(&[1, 1, 1, 2], |n| if n == 1 { 1.0 } else { 0.0 });
        let b = field(&[1, 1, 1, 2], |n| if n == 2 { 1.0 } else { 0.0 });
        let mid = Slerp::default().blend(&a, &b, 0.5).unwrap();
        let half = core::f64::consts::FRAC_1_SQRT_2;
        assert!((mid.values()[[0, 0, 0, 0]] - half).abs() < 1e-6);
        assert!((mid.values()[[0, 0, 0, 1]] - half).abs() < 1e-6);
    }

    #[test]
    fn parallel_items_fall_back_to_lerp() {
        let a = field(&[1, 1, 1, 2], |n| n as f64);
        let b = field(&[1, 1, 1, 2], |n| 2.0 * n as f64);
        let mid = Slerp::default().blend(&a, &b, 0.5).unwrap();
        assert!((mid.values()[[0, 0, 0, 0]] - 1.5).abs() < 1e-6);
        assert!((mid.values()[[0, 0, 0, 1]] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_inputs() {
        let a = field(&[1, 1, 2, 2], |n| n as f64);
        let b = field(&[1, 1, 2, 4], |n| n as f64);
        let slerp = Slerp::default();
        assert!(matches!(
            slerp.blend(&a, &b, 0.5),
            Err(NoiseError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            slerp.blend(&a, &a, 1.5),
            Err(NoiseError::InvalidParameter { .. })
        ));
    }
}
