// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Brownian-motion increments sampled from a seeded Brownian tree.
//!
//! A [`BrownianTreeSampler`] fixes one Brownian path `W` over
//! `[sigma_min, sigma_max]` per seed. Values at arbitrary times are found by
//! bisection: every midpoint is a Brownian bridge draw whose seed depends only
//! on the tree seed and the node position, so querying the same interval twice
//! (in any order) yields the same increment.

use std::sync::Arc;

use ndarray::{ArrayD, Zip};

use crate::error::{NoiseError, NoiseResult};
use crate::field::NoiseField;
use crate::rng::RngContext;
use crate::shape::{Device, FieldSpec};

/// Bisection stops once an interval is narrower than this.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
/// Hard cap on bisection depth.
pub const MAX_TREE_DEPTH: u32 = 48;

/// Everything a sampler needs to set up its path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrownianBounds {
    pub spec: FieldSpec,
    pub sigma_min: f64,
    pub sigma_max: f64,
    pub seed: u64,
    /// Draw on the host even when the field targets an accelerator.
    pub cpu: bool,
}

/// Normalised Brownian increment between two noise levels.
pub trait BrownianSampler: Send {
    /// Returns `(W(sigma_next) - W(sigma)) / sqrt(|sigma_next - sigma|)`.
    fn sample(&mut self, sigma: f64, sigma_next: f64) -> NoiseResult<NoiseField>;
}

/// Builds a sampler for one generator invocation.
pub type BrownianFactory =
    Arc<dyn Fn(BrownianBounds) -> NoiseResult<Box<dyn BrownianSampler>> + Send + Sync>;

/// Factory producing [`BrownianTreeSampler`]s.
pub fn default_brownian_factory() -> BrownianFactory {
    Arc::new(|bounds| {
        let sampler = BrownianTreeSampler::new(bounds)?;
        Ok(Box::new(sampler) as Box<dyn BrownianSampler>)
    })
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeded Brownian tree over `[sigma_min, sigma_max]`.
#[derive(Clone, Debug)]
pub struct BrownianTreeSampler {
    bounds: BrownianBounds,
    device: Device,
    tolerance: f64,
    max_depth: u32,
    dims: Vec<usize>,
    w_end: ArrayD<f64>,
}

impl BrownianTreeSampler {
    pub fn new(bounds: BrownianBounds) -> NoiseResult<Self> {
        let BrownianBounds {
            sigma_min,
            sigma_max,
            ..
        } = bounds;
        if !(sigma_min.is_finite() && sigma_max.is_finite()) || sigma_min >= sigma_max {
            return Err(NoiseError::invalid(
                "sigma_min",
                format!("brownian tree needs sigma_min < sigma_max, got {sigma_min}..{sigma_max}"),
            ));
        }
        let device = if bounds.cpu {
            Device::Cpu
        } else {
            bounds.spec.device
        };
        let dims = bounds.spec.shape.dims();
        let mut root = RngContext::new(splitmix64(bounds.seed), device);
        let mut w_end = root.standard_normal(&dims);
        let scale = (sigma_max - sigma_min).sqrt();
        w_end.mapv_inplace(|v| v * scale);
        Ok(Self {
            bounds,
            device,
            tolerance: DEFAULT_TOLERANCE,
            max_depth: MAX_TREE_DEPTH,
            dims,
            w_end,
        })
    }

    /// Overrides the bisection tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(f64::EPSILON);
        self
    }

    pub fn bounds(&self) -> &BrownianBounds {
        &self.bounds
    }

    fn node_draw(&self, node: u64) -> ArrayD<f64> {
        let seed = splitmix64(self.bounds.seed ^ splitmix64(node));
        RngContext::new(seed, self.device).standard_normal(&self.dims)
    }

    /// Path value `W(t)` relative to `W(sigma_min) = 0`.
    fn value_at(&self, t: f64) -> ArrayD<f64> {
        let (mut a, mut b) = (self.bounds.sigma_min, self.bounds.sigma_max);
        let mut wa = ArrayD::<f64>::zeros(self.w_end.raw_dim());
        let mut wb = self.w_end.clone();
        let mut node = 1u64;
        let mut depth = 0;
        loop {
            if t <= a {
                return wa;
            }
            if t >= b {
                return wb;
            }
            if b - a <= self.tolerance || depth >= self.max_depth {
                let frac = (t - a) / (b - a);
                Zip::from(&mut wa)
                    .and(&wb)
                    .for_each(|lo, &hi| *lo += (hi - *lo) * frac);
                return wa;
            }
            let mid = 0.5 * (a + b);
            let bridge_std = (0.25 * (b - a)).sqrt();
            let mut wm = self.node_draw(node);
            Zip::from(&mut wm)
                .and(&wa)
                .and(&wb)
                .for_each(|m, &lo, &hi| *m = 0.5 * (lo + hi) + bridge_std * *m);
            if t < mid {
                b = mid;
                wb = wm;
                node *= 2;
            } else {
                a = mid;
                wa = wm;
                node = node * 2 + 1;
            }
            depth += 1;
        }
    }

    fn check_level(&self, name: &'static str, value: f64) -> NoiseResult<()> {
        let span = self.bounds.sigma_max - self.bounds.sigma_min;
        let slack = span * 1e-9;
        if !value.is_finite()
            || value < self.bounds.sigma_min - slack
            || value > self.bounds.sigma_max + slack
        {
            return Err(NoiseError::invalid(
                name,
                format!(
                    "{value} lies outside the tree range {}..{}",
                    self.bounds.sigma_min, self.bounds.sigma_max
                ),
            ));
        }
        Ok(())
    }
}

impl BrownianSampler for BrownianTreeSampler {
    fn sample(&mut self, sigma: f64, sigma_next: f64) -> NoiseResult<NoiseField> {
        self.check_level("sigma", sigma)?;
        self.check_level("sigma_next", sigma_next)?;
        if sigma == sigma_next {
            return Err(NoiseError::invalid(
                "sigma_next",
                "brownian increment needs two distinct noise levels",
            ));
        }
        let (lo, hi, sign) = if sigma < sigma_next {
            (sigma, sigma_next, 1.0)
        } else {
            (sigma_next, sigma, -1.0)
        };
        let w_lo = self.value_at(lo);
        let mut w_hi = self.value_at(hi);
        let norm = sign / (hi - lo).sqrt();
        Zip::from(&mut w_hi)
            .and(&w_lo)
            .for_each(|h, &l| *h = (*h - l) * norm);
        NoiseField::new(w_hi, self.bounds.spec)
    }
}
