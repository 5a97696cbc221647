// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Generator state, the produce contract and the builder.

use tracing::debug;

use crate::brownian::{default_brownian_factory, BrownianFactory};
use crate::error::{NoiseError, NoiseResult};
use crate::families::{fractal, gaussian, heavy_tail, pyramid, structured};
use crate::field::NoiseField;
use crate::params::{GeneratorConfig, NoiseOverrides, ParamValue};
use crate::rng::RngContext;
use crate::shape::{Device, FieldSpec, Layout, NoiseShape, Precision};
#[cfg(feature = "simplex")]
use crate::simplex::{default_simplex_factory, SimplexBackend, SimplexFactory};
use crate::telemetry;

/// Anything that can hand out noise fields.
pub trait NoiseSource {
    fn name(&self) -> &str;

    /// Merges `overrides`, advances the invocation counter and returns a
    /// field of the configured shape.
    fn produce(&mut self, overrides: &NoiseOverrides) -> NoiseResult<NoiseField> {
        let _ = overrides;
        Err(NoiseError::Unimplemented {
            generator: self.name().to_string(),
        })
    }
}

/// State shared by every generator: field descriptor, seeds, random context
/// and optional sigma bounds. On its own it has no synthesis routine.
#[derive(Clone, Debug)]
pub struct GeneratorCore {
    pub(crate) spec: FieldSpec,
    pub(crate) seed: u64,
    pub(crate) last_seed: u64,
    pub(crate) rng: RngContext,
    pub(crate) sigma_min: Option<f64>,
    pub(crate) sigma_max: Option<f64>,
}

impl GeneratorCore {
    pub fn new(spec: FieldSpec, seed: u64) -> Self {
        Self {
            spec,
            seed,
            last_seed: seed,
            rng: RngContext::new(seed, spec.device),
            sigma_min: None,
            sigma_max: None,
        }
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn shape(&self) -> &NoiseShape {
        &self.spec.shape
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Invocation counter; starts at the seed.
    pub fn last_seed(&self) -> u64 {
        self.last_seed
    }

    pub fn rng(&self) -> &RngContext {
        &self.rng
    }

    pub fn sigma_range(&self) -> (Option<f64>, Option<f64>) {
        (self.sigma_min, self.sigma_max)
    }

    pub(crate) fn dims(&self) -> Vec<usize> {
        self.spec.shape.dims()
    }

    pub(crate) fn advance(&mut self) {
        self.last_seed = self.last_seed.wrapping_add(1);
    }

    /// Re-seeds the primary context to `initial_seed + 1`.
    pub(crate) fn reseed_forward(&mut self) {
        let next = self.rng.initial_seed().wrapping_add(1);
        self.rng.manual_seed(next);
    }

    fn apply_overrides(&mut self, overrides: &NoiseOverrides) {
        if let Some(shape) = overrides.shape {
            self.spec.shape = shape;
        }
        if let Some(precision) = overrides.precision {
            self.spec.precision = precision;
        }
        if let Some(device) = overrides.device {
            self.spec.device = device;
        }
    }
}

impl NoiseSource for GeneratorCore {
    fn name(&self) -> &str {
        "noise-generator"
    }
}

/// A configured noise generator.
pub struct NoiseGenerator {
    core: GeneratorCore,
    config: GeneratorConfig,
    brownian: BrownianFactory,
    #[cfg(feature = "simplex")]
    simplex_factory: SimplexFactory,
    #[cfg(feature = "simplex")]
    simplex: Box<dyn SimplexBackend>,
}

impl core::fmt::Debug for NoiseGenerator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NoiseGenerator")
            .field("core", &self.core)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NoiseGenerator {
    pub fn builder(config: GeneratorConfig) -> GeneratorBuilder {
        GeneratorBuilder::new(config)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn core(&self) -> &GeneratorCore {
        &self.core
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.core.spec
    }

    pub fn seed(&self) -> u64 {
        self.core.seed
    }

    pub fn last_seed(&self) -> u64 {
        self.core.last_seed
    }

    /// Replaces the parameter record with the merged one and returns the
    /// current value of every parameter.
    pub fn update(&mut self, overrides: &NoiseOverrides) -> Vec<(&'static str, ParamValue)> {
        self.config = self.config.with_overrides(overrides);
        self.core.apply_overrides(overrides);
        self.config.params()
    }

    /// [`NoiseSource::produce`] without overrides.
    pub fn generate(&mut self) -> NoiseResult<NoiseField> {
        self.produce(&NoiseOverrides::default())
    }

    fn synthesize(&mut self, overrides: &NoiseOverrides) -> NoiseResult<NoiseField> {
        let core = &mut self.core;
        let values = match self.config {
            GeneratorConfig::Gaussian(c) => gaussian::gaussian(core, &c)?,
            GeneratorConfig::GaussianBackwards(c) => gaussian::gaussian_backwards(core, &c)?,
            GeneratorConfig::Uniform(c) => gaussian::uniform(core, &c)?,
            GeneratorConfig::Laplace(c) => heavy_tail::laplace(core, &c)?,
            GeneratorConfig::StudentT(c) => heavy_tail::student_t(core, &c)?,
            GeneratorConfig::Fractal(c) => fractal::fractal(core, &c)?,
            GeneratorConfig::Wavelet(c) => fractal::wavelet(core, &c)?,
            GeneratorConfig::Pyramid(c) => pyramid::pyramid(core, &c)?,
            GeneratorConfig::HiresPyramid(c) => pyramid::hires(core, &c, false)?,
            GeneratorConfig::InterpolatedPyramid(c) => pyramid::hires(core, &c, true)?,
            GeneratorConfig::CascadeB(c) => pyramid::cascade_b(core, &c)?,
            GeneratorConfig::Perlin(c) => structured::perlin(core, &c)?,
            GeneratorConfig::Brownian(_) => {
                return structured::brownian(core, &self.brownian, overrides)
                    .map(|field| field.to_device(core.spec.device));
            }
            #[cfg(feature = "simplex")]
            GeneratorConfig::Simplex(c) => {
                let values = structured::simplex(core, &c, self.simplex.as_ref())?;
                let next = self.simplex.seed().wrapping_add(1);
                self.simplex = (self.simplex_factory)(next);
                values
            }
        };
        NoiseField::new(values, self.core.spec)
    }
}

impl NoiseSource for NoiseGenerator {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn produce(&mut self, overrides: &NoiseOverrides) -> NoiseResult<NoiseField> {
        self.update(overrides);
        self.core.advance();
        let _span = telemetry::produce_span(
            self.config.name(),
            &self.core.spec.shape,
            self.core.last_seed,
        )
        .entered();
        let field = self.synthesize(overrides)?;
        let precision = self.core.spec.precision;
        debug!(
            generator = self.config.name(),
            shape = %self.core.spec.shape,
            device = %self.core.spec.device,
            seed = self.core.seed,
            counter = self.core.last_seed,
            "produced noise field"
        );
        Ok(field.quantized(precision))
    }
}

/// Assembles a [`NoiseGenerator`].
#[must_use]
pub struct GeneratorBuilder {
    config: GeneratorConfig,
    like: Option<FieldSpec>,
    shape: Option<NoiseShape>,
    precision: Option<Precision>,
    device: Option<Device>,
    layout: Option<Layout>,
    seed: Option<u64>,
    rng: Option<RngContext>,
    sigma_range: Option<(f64, f64)>,
    brownian: Option<BrownianFactory>,
    #[cfg(feature = "simplex")]
    simplex: Option<SimplexFactory>,
}

impl GeneratorBuilder {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            like: None,
            shape: None,
            precision: None,
            device: None,
            layout: None,
            seed: None,
            rng: None,
            sigma_range: None,
            brownian: None,
            #[cfg(feature = "simplex")]
            simplex: None,
        }
    }

    /// Inherits shape, precision, device and layout from a reference field.
    pub fn like(mut self, reference: &FieldSpec) -> Self {
        self.like = Some(*reference);
        self
    }

    pub fn shape(mut self, shape: NoiseShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Uses an existing random context instead of seeding a fresh one.
    pub fn rng(mut self, rng: RngContext) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn sigma_range(mut self, sigma_min: f64, sigma_max: f64) -> Self {
        self.sigma_range = Some((sigma_min, sigma_max));
        self
    }

    pub fn brownian_factory(mut self, factory: BrownianFactory) -> Self {
        self.brownian = Some(factory);
        self
    }

    #[cfg(feature = "simplex")]
    pub fn simplex_factory(mut self, factory: SimplexFactory) -> Self {
        self.simplex = Some(factory);
        self
    }

    pub fn build(self) -> NoiseResult<NoiseGenerator> {
        let like = self.like;
        let shape = self
            .shape
            .or(like.map(|spec| spec.shape))
            .ok_or(NoiseError::InvalidShape { dims: Vec::new() })?;
        let spec = FieldSpec {
            shape,
            precision: self
                .precision
                .or(like.map(|spec| spec.precision))
                .unwrap_or_default(),
            device: self
                .device
                .or(like.map(|spec| spec.device))
                .unwrap_or_default(),
            layout: self
                .layout
                .or(like.map(|spec| spec.layout))
                .unwrap_or_default(),
        };
        let seed = self
            .seed
            .unwrap_or_else(|| st_noise_config::config().default_seed);

        let mut core = GeneratorCore::new(spec, seed);
        if let Some(rng) = self.rng {
            core.rng = rng;
        }
        if let Some((sigma_min, sigma_max)) = self.sigma_range {
            core.sigma_min = Some(sigma_min);
            core.sigma_max = Some(sigma_max);
        }

        #[cfg(feature = "simplex")]
        let simplex_factory = self.simplex.unwrap_or_else(default_simplex_factory);
        Ok(NoiseGenerator {
            core,
            config: self.config,
            brownian: self.brownian.unwrap_or_else(default_brownian_factory),
            #[cfg(feature = "simplex")]
            simplex: simplex_factory(seed),
            #[cfg(feature = "simplex")]
            simplex_factory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FractalConfig, GaussianConfig, PerlinConfig, StudentTConfig};

    fn spec(dims: &[usize]) -> FieldSpec {
        FieldSpec::from_dims(dims).unwrap()
    }

    #[test]
    fn base_core_is_unimplemented() {
        let mut core = GeneratorCore::new(spec(&[1, 1, 4, 4]), 0);
        assert!(matches!(
            core.produce(&NoiseOverrides::default()),
            Err(NoiseError::Unimplemented { .. })
        ));
    }

    #[test]
    fn builder_requires_a_shape() {
        let err = NoiseGenerator::builder(GeneratorConfig::Gaussian(GaussianConfig::default()))
            .build()
            .unwrap_err();
        assert!(matches!(err, NoiseError::InvalidShape { .. }));
    }

    #[test]
    fn explicit_settings_beat_inherited_ones() {
        let reference = spec(&[2, 4, 8, 8])
            .with_device(Device::Cuda(1))
            .with_precision(Precision::F64)
            .with_layout(Layout::Strided);
        let generator = NoiseGenerator::builder(GeneratorConfig::Gaussian(GaussianConfig::default()))
            .like(&reference)
            .precision(Precision::F32)
            .layout(Layout::Strided)
            .seed(3)
            .build()
            .unwrap();
        assert_eq!(generator.spec().shape, reference.shape);
        assert_eq!(generator.spec().device, Device::Cuda(1));
        assert_eq!(generator.spec().precision, Precision::F32);
        assert_eq!(generator.spec().layout, Layout::Strided);
        assert_eq!(generator.core().rng().device(), Device::Cuda(1));
    }

    #[test]
    fn produce_advances_the_counter() {
        let mut generator = NoiseGenerator::builder(GeneratorConfig::Gaussian(GaussianConfig::default()))
            .shape(NoiseShape::spatial(1, 2, 8, 8).unwrap())
            .seed(10)
            .build()
            .unwrap();
        assert_eq!(generator.last_seed(), 10);
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert_eq!(generator.last_seed(), 12);
        assert_ne!(a, b);
    }

    #[test]
    fn heavy_tails_advance_twice() {
        let mut generator = NoiseGenerator::builder(GeneratorConfig::StudentT(StudentTConfig::default()))
            .shape(NoiseShape::spatial(1, 2, 8, 8).unwrap())
            .seed(0)
            .build()
            .unwrap();
        generator.generate().unwrap();
        assert_eq!(generator.last_seed(), 2);
    }

    #[test]
    fn update_merges_and_reports() {
        let mut generator = NoiseGenerator::builder(GeneratorConfig::Fractal(FractalConfig::default()))
            .shape(NoiseShape::spatial(1, 1, 4, 4).unwrap())
            .build()
            .unwrap();
        let params = generator.update(&NoiseOverrides {
            alpha: Some(2.0),
            ..NoiseOverrides::default()
        });
        assert_eq!(
            params,
            vec![
                ("alpha", ParamValue::Float(2.0)),
                ("k", ParamValue::Float(1.0)),
                ("scale", ParamValue::Float(0.1)),
            ]
        );
        let params = generator.update(&NoiseOverrides::default());
        assert_eq!(params[0], ("alpha", ParamValue::Float(2.0)));
    }

    #[test]
    fn shape_override_resizes_output() {
        let mut generator = NoiseGenerator::builder(GeneratorConfig::Perlin(PerlinConfig::default()))
            .shape(NoiseShape::spatial(1, 2, 8, 8).unwrap())
            .build()
            .unwrap();
        let field = generator
            .produce(&NoiseOverrides::new().with_shape(NoiseShape::spatial(2, 2, 4, 4).unwrap()))
            .unwrap();
        assert_eq!(field.shape().dims(), vec![2, 2, 4, 4]);
    }

    #[test]
    fn output_is_quantised_to_the_declared_precision() {
        let mut generator = NoiseGenerator::builder(GeneratorConfig::Gaussian(GaussianConfig::default()))
            .shape(NoiseShape::spatial(1, 1, 4, 4).unwrap())
            .build()
            .unwrap();
        let field = generator.generate().unwrap();
        assert_eq!(field.precision(), Precision::F32);
        assert!(field.values().iter().all(|&v| v == v as f32 as f64));
    }

    #[test]
    fn half_precision_output_is_representable_in_binary16() {
        let mut generator = NoiseGenerator::builder(GeneratorConfig::Gaussian(GaussianConfig::default()))
            .shape(NoiseShape::spatial(1, 1, 8, 8).unwrap())
            .precision(Precision::F16)
            .build()
            .unwrap();
        let field = generator.generate().unwrap();
        assert_eq!(field.precision(), Precision::F16);
        assert!(field
            .values()
            .iter()
            .all(|&v| half::f16::from_f64(v).to_f64() == v));
    }
}
