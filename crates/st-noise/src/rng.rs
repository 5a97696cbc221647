// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Seeded random context shared by every generator.
//!
//! `RngContext` mirrors the usual "generator object" contract of tensor
//! runtimes: it remembers the seed it was last seeded with, can be re-seeded in
//! place, and fills arrays deterministically in row-major order. Multi-stage
//! algorithms that need an independent stream call [`RngContext::scoped`]
//! instead of touching any process-wide state.

use ndarray::{ArrayD, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Normal, StandardNormal};

use crate::error::{NoiseError, NoiseResult};
use crate::shape::Device;

/// Deterministic random source bound to a device.
#[derive(Clone, Debug)]
pub struct RngContext {
    initial_seed: u64,
    device: Device,
    rng: ChaCha20Rng,
}

impl RngContext {
    pub fn new(seed: u64, device: Device) -> Self {
        Self {
            initial_seed: seed,
            device,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Seed most recently installed via [`RngContext::new`] or
    /// [`RngContext::manual_seed`].
    pub fn initial_seed(&self) -> u64 {
        self.initial_seed
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Restarts the stream from `seed`.
    pub fn manual_seed(&mut self, seed: u64) {
        self.initial_seed = seed;
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    /// Fresh context seeded from this context's initial seed. The parent's
    /// stream position is left untouched.
    pub fn scoped(&self) -> RngContext {
        RngContext::new(self.initial_seed, self.device)
    }

    /// Standard normal samples of the given shape.
    pub fn standard_normal(&mut self, dims: &[usize]) -> ArrayD<f64> {
        self.sample(dims, StandardNormal)
    }

    /// Normal samples with the provided mean and standard deviation.
    pub fn normal(&mut self, dims: &[usize], mean: f64, std: f64) -> NoiseResult<ArrayD<f64>> {
        if !std.is_finite() || std < 0.0 {
            return Err(NoiseError::invalid(
                "std",
                format!("expected non-negative finite std, got {std}"),
            ));
        }
        let normal = Normal::new(mean, std)
            .map_err(|err| NoiseError::invalid("std", err.to_string()))?;
        Ok(self.sample(dims, normal))
    }

    /// Uniform samples in `[0, 1)`.
    pub fn uniform(&mut self, dims: &[usize]) -> ArrayD<f64> {
        self.sample(dims, Uniform::new(0.0, 1.0))
    }

    /// Single uniform draw in `[0, 1)`.
    pub fn uniform_scalar(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Samples any distribution over `f64` into a row-major array.
    pub fn sample<D: Distribution<f64>>(&mut self, dims: &[usize], distribution: D) -> ArrayD<f64> {
        let rng = &mut self.rng;
        ArrayD::from_shape_simple_fn(IxDyn(dims), || distribution.sample(&mut *rng))
    }
}
