// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Preparation entry point: turns a latent descriptor, a seed and a noise
//! type name into the initial noise for a sampling run.

use std::sync::Arc;

use st_noise_config::PrecisionPolicy;
use tracing::debug;

use crate::blend::{Blend, Slerp};
use crate::brownian::{default_brownian_factory, BrownianFactory};
use crate::error::{NoiseError, NoiseResult};
use crate::field::NoiseField;
use crate::generator::{GeneratorBuilder, NoiseGenerator, NoiseSource};
use crate::params::{GeneratorConfig, NoiseOverrides};
use crate::registry::NoiseRegistry;
use crate::shape::{FieldSpec, Precision};
#[cfg(feature = "simplex")]
use crate::simplex::{default_simplex_factory, SimplexFactory};
use crate::telemetry;

/// Only this name receives the `alpha`/`k` options.
const FRACTAL_NAME: &str = "fractal";

/// Knobs of [`prepare_noise`].
#[derive(Clone, Debug, PartialEq)]
pub struct PrepareOptions {
    /// Batch positions to synthesise; repeated entries share a field.
    pub sample_indices: Option<Vec<usize>>,
    pub alpha: f64,
    pub k: f64,
    pub variation_seed: Option<u64>,
    /// Blend factor towards the variation noise, in `[0, 1]`.
    pub variation_strength: f64,
    /// Overrides the configured sigma range.
    pub sigma_min: Option<f64>,
    pub sigma_max: Option<f64>,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            sample_indices: None,
            alpha: 1.0,
            k: 1.0,
            variation_seed: None,
            variation_strength: 0.0,
            sigma_min: None,
            sigma_max: None,
        }
    }
}

impl PrepareOptions {
    pub fn with_indices(mut self, indices: Vec<usize>) -> Self {
        self.sample_indices = Some(indices);
        self
    }

    pub fn with_variation(mut self, seed: u64, strength: f64) -> Self {
        self.variation_seed = Some(seed);
        self.variation_strength = strength;
        self
    }

    fn variation(&self) -> Option<(u64, f64)> {
        match self.variation_seed {
            Some(seed) if self.variation_strength > 0.0 => Some((seed, self.variation_strength)),
            _ => None,
        }
    }
}

/// Preparation pipeline with replaceable collaborators.
#[derive(Clone)]
pub struct NoisePreparer {
    registries: Vec<&'static NoiseRegistry>,
    blend: Arc<dyn Blend>,
    brownian: BrownianFactory,
    #[cfg(feature = "simplex")]
    simplex: SimplexFactory,
}

impl Default for NoisePreparer {
    fn default() -> Self {
        Self {
            registries: vec![NoiseRegistry::full(), NoiseRegistry::simple()],
            blend: Arc::new(Slerp::default()),
            brownian: default_brownian_factory(),
            #[cfg(feature = "simplex")]
            simplex: default_simplex_factory(),
        }
    }
}

/// Resolved per-call settings shared by every generator of one preparation.
struct Plan<'a> {
    config: GeneratorConfig,
    tuned: Option<NoiseOverrides>,
    sigma_min: f64,
    sigma_max: f64,
    preparer: &'a NoisePreparer,
}

impl Plan<'_> {
    fn generator(&self, seed: u64, spec: &FieldSpec) -> NoiseResult<NoiseGenerator> {
        let builder = GeneratorBuilder::new(self.config)
            .like(spec)
            .seed(seed)
            .sigma_range(self.sigma_min, self.sigma_max)
            .brownian_factory(self.preparer.brownian.clone());
        #[cfg(feature = "simplex")]
        let builder = builder.simplex_factory(self.preparer.simplex.clone());
        let mut generator = builder.build()?;
        if let Some(tuned) = &self.tuned {
            generator.update(tuned);
        }
        Ok(generator)
    }

    /// Overrides passed to every produce call.
    fn call(&self) -> NoiseOverrides {
        NoiseOverrides::new().with_sigmas(self.sigma_max, self.sigma_min)
    }
}

impl NoisePreparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registries searched in order.
    pub fn with_registries(mut self, registries: Vec<&'static NoiseRegistry>) -> Self {
        self.registries = registries;
        self
    }

    pub fn with_blend(mut self, blend: Arc<dyn Blend>) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_brownian_factory(mut self, factory: BrownianFactory) -> Self {
        self.brownian = factory;
        self
    }

    #[cfg(feature = "simplex")]
    pub fn with_simplex_factory(mut self, factory: SimplexFactory) -> Self {
        self.simplex = factory;
        self
    }

    fn resolve(&self, name: &str) -> NoiseResult<GeneratorConfig> {
        self.registries
            .iter()
            .find_map(|registry| registry.get(name).ok())
            .ok_or_else(|| NoiseError::UnknownNoiseType(name.to_string()))
    }

    /// Produces noise shaped like `latent`.
    pub fn prepare(
        &self,
        latent: &FieldSpec,
        seed: u64,
        noise_type: &str,
        options: &PrepareOptions,
    ) -> NoiseResult<NoiseField> {
        let config = self.resolve(noise_type)?;
        let runtime = st_noise_config::config();
        let precision = match runtime.precision {
            PrecisionPolicy::Inherit => latent.precision,
            PrecisionPolicy::Fp16 => Precision::F16,
            PrecisionPolicy::Fp32 => Precision::F32,
            PrecisionPolicy::Fp64 => Precision::F64,
        };
        let spec = latent.with_precision(precision);
        let _span = telemetry::prepare_span(noise_type, seed, &spec.shape).entered();
        let tuned = (noise_type == FRACTAL_NAME)
            .then(|| NoiseOverrides::new().with_fractal(options.alpha, options.k));
        let plan = Plan {
            config,
            tuned,
            sigma_min: options.sigma_min.unwrap_or(runtime.sigma_min),
            sigma_max: options.sigma_max.unwrap_or(runtime.sigma_max),
            preparer: self,
        };
        debug!(
            noise_type,
            seed,
            shape = %spec.shape,
            indices = options.sample_indices.as_ref().map_or(0, Vec::len),
            variation = options.variation_seed.is_some(),
            "preparing noise"
        );

        match &options.sample_indices {
            None => self.prepare_batch(&plan, &spec, seed, options),
            Some(indices) => self.prepare_indexed(&plan, &spec, seed, indices, options),
        }
    }

    fn prepare_batch(
        &self,
        plan: &Plan<'_>,
        spec: &FieldSpec,
        seed: u64,
        options: &PrepareOptions,
    ) -> NoiseResult<NoiseField> {
        let base = plan.generator(seed, spec)?.produce(&plan.call())?;
        let Some((variation_seed, strength)) = options.variation() else {
            return Ok(base);
        };
        let item_spec = spec.with_shape(spec.shape.with_batch(1)?);
        let parts = (0..spec.shape.batch())
            .map(|i| {
                plan.generator(variation_seed.wrapping_add(i as u64), &item_spec)?
                    .produce(&plan.call())
            })
            .collect::<NoiseResult<Vec<_>>>()?;
        let variation = NoiseField::concat_batch(&parts)?;
        self.blend.blend(&base, &variation, strength)
    }

    fn prepare_indexed(
        &self,
        plan: &Plan<'_>,
        spec: &FieldSpec,
        seed: u64,
        indices: &[usize],
        options: &PrepareOptions,
    ) -> NoiseResult<NoiseField> {
        let mut unique = indices.to_vec();
        unique.sort_unstable();
        unique.dedup();
        let Some(&max) = unique.last() else {
            return Err(NoiseError::invalid(
                "sample_indices",
                "index list must not be empty",
            ));
        };
        let inverse: Vec<usize> = indices
            .iter()
            .map(|i| unique.partition_point(|u| u < i))
            .collect();

        let item_shape = spec.shape.with_batch(1)?;
        let per_item = plan.call().with_shape(item_shape);
        let mut generator = plan.generator(seed, spec)?;
        let mut kept = Vec::with_capacity(unique.len());
        for index in 0..=max {
            let field = generator.produce(&per_item)?;
            if unique.binary_search(&index).is_ok() {
                kept.push(field);
            }
        }
        let noises = remap(&kept, &inverse)?;

        let Some((variation_seed, strength)) = options.variation() else {
            return Ok(noises);
        };
        let variations = unique
            .iter()
            .map(|&u| {
                plan.generator(variation_seed.wrapping_add(u as u64), spec)?
                    .produce(&per_item)
            })
            .collect::<NoiseResult<Vec<_>>>()?;
        let variations = remap(&variations, &inverse)?;
        self.blend.blend(&noises, &variations, strength)
    }
}

fn remap(fields: &[NoiseField], inverse: &[usize]) -> NoiseResult<NoiseField> {
    let ordered: Vec<NoiseField> = inverse.iter().map(|&j| fields[j].clone()).collect();
    NoiseField::concat_batch(&ordered)
}

/// Prepares noise with the default registries, blend and factories.
///
/// `noise_type` is looked up in [`NoiseRegistry::full`] and then in
/// [`NoiseRegistry::simple`]. Every generator call receives
/// `sigma = sigma_max` and `sigma_next = sigma_min`, taken from the runtime
/// configuration unless `options` overrides them.
pub fn prepare_noise(
    latent: &FieldSpec,
    seed: u64,
    noise_type: &str,
    options: &PrepareOptions,
) -> NoiseResult<NoiseField> {
    NoisePreparer::default().prepare(latent, seed, noise_type, options)
}
