// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Named generator presets.
//!
//! Two tables exist: the full table used by [`crate::prepare_noise`] and the
//! simple table that adds the colour aliases of the fractal family. Both are
//! built once per process and never change afterwards.

use std::sync::OnceLock;

use crate::error::{NoiseError, NoiseResult};
use crate::generator::GeneratorBuilder;
use crate::params::{
    BrownianConfig, CascadeBConfig, FractalConfig, GaussianConfig, GeneratorConfig,
    HiresPyramidConfig, LaplaceConfig, PerlinConfig, PyramidConfig, StudentTConfig,
    UniformConfig, WaveletConfig,
};
#[cfg(feature = "simplex")]
use crate::params::SimplexConfig;
use crate::resample::InterpolationMode;

/// Ordered name → preset table.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseRegistry {
    entries: Vec<(&'static str, GeneratorConfig)>,
}

static FULL: OnceLock<NoiseRegistry> = OnceLock::new();
static SIMPLE: OnceLock<NoiseRegistry> = OnceLock::new();

fn gaussian() -> GeneratorConfig {
    GeneratorConfig::Gaussian(GaussianConfig::default())
}

fn fractal(alpha: f64) -> GeneratorConfig {
    GeneratorConfig::Fractal(FractalConfig::with_alpha(alpha))
}

fn pyramid(mode: InterpolationMode) -> GeneratorConfig {
    GeneratorConfig::Pyramid(PyramidConfig::with_mode(mode))
}

fn hires(mode: InterpolationMode) -> GeneratorConfig {
    GeneratorConfig::HiresPyramid(HiresPyramidConfig::with_mode(mode))
}

impl NoiseRegistry {
    /// Table consulted first by the preparation entry point.
    pub fn full() -> &'static NoiseRegistry {
        FULL.get_or_init(|| {
            use InterpolationMode::{Cubic, Linear, Nearest};
            #[allow(unused_mut)]
            let mut entries = vec![
                ("fractal", GeneratorConfig::Fractal(FractalConfig::default())),
                ("gaussian", gaussian()),
                (
                    "gaussian_backwards",
                    GeneratorConfig::GaussianBackwards(GaussianConfig::default()),
                ),
                ("uniform", GeneratorConfig::Uniform(UniformConfig::default())),
                (
                    "pyramid-cascade_B",
                    GeneratorConfig::CascadeB(CascadeBConfig::default()),
                ),
                (
                    "pyramid-interpolated",
                    GeneratorConfig::InterpolatedPyramid(HiresPyramidConfig::default()),
                ),
                ("pyramid-bilinear", pyramid(Linear)),
                ("pyramid-bicubic", pyramid(Cubic)),
                ("pyramid-nearest", pyramid(Nearest)),
                ("hires-pyramid-bilinear", hires(Linear)),
                ("hires-pyramid-bicubic", hires(Cubic)),
                ("hires-pyramid-nearest", hires(Nearest)),
                ("brownian", GeneratorConfig::Brownian(BrownianConfig::default())),
                ("laplacian", GeneratorConfig::Laplace(LaplaceConfig::default())),
                ("studentt", GeneratorConfig::StudentT(StudentTConfig::default())),
                ("wavelet", GeneratorConfig::Wavelet(WaveletConfig::default())),
                ("perlin", GeneratorConfig::Perlin(PerlinConfig::default())),
            ];
            #[cfg(feature = "simplex")]
            entries.push(("simplex", GeneratorConfig::Simplex(SimplexConfig::default())));
            NoiseRegistry { entries }
        })
    }

    /// Table with colour aliases (`pink`, `brown`, ...) and the `none` alias.
    pub fn simple() -> &'static NoiseRegistry {
        SIMPLE.get_or_init(|| {
            use InterpolationMode::{Cubic, Linear, Nearest};
            let entries = vec![
                ("none", gaussian()),
                ("brownian", GeneratorConfig::Brownian(BrownianConfig::default())),
                ("gaussian", gaussian()),
                (
                    "gaussian_backwards",
                    GeneratorConfig::GaussianBackwards(GaussianConfig::default()),
                ),
                ("laplacian", GeneratorConfig::Laplace(LaplaceConfig::default())),
                ("perlin", GeneratorConfig::Perlin(PerlinConfig::default())),
                ("studentt", GeneratorConfig::StudentT(StudentTConfig::default())),
                ("uniform", GeneratorConfig::Uniform(UniformConfig::default())),
                ("wavelet", GeneratorConfig::Wavelet(WaveletConfig::default())),
                ("brown", fractal(2.0)),
                ("pink", fractal(1.0)),
                ("white", fractal(0.0)),
                ("blue", fractal(-1.0)),
                ("violet", fractal(-2.0)),
                ("ultraviolet_A", fractal(-3.0)),
                ("ultraviolet_B", fractal(-4.0)),
                ("ultraviolet_C", fractal(-5.0)),
                ("hires-pyramid-bicubic", hires(Cubic)),
                ("hires-pyramid-bilinear", hires(Linear)),
                ("hires-pyramid-nearest", hires(Nearest)),
                ("pyramid-bicubic", pyramid(Cubic)),
                ("pyramid-bilinear", pyramid(Linear)),
                ("pyramid-nearest", pyramid(Nearest)),
                (
                    "pyramid-interpolated",
                    GeneratorConfig::InterpolatedPyramid(HiresPyramidConfig::default()),
                ),
                (
                    "pyramid-cascade_B",
                    GeneratorConfig::CascadeB(CascadeBConfig::default()),
                ),
            ];
            NoiseRegistry { entries }
        })
    }

    /// Looks `name` up in the full table, then in the simple one.
    pub fn resolve(name: &str) -> NoiseResult<GeneratorConfig> {
        Self::full()
            .get(name)
            .or_else(|_| Self::simple().get(name))
    }

    pub fn get(&self, name: &str) -> NoiseResult<GeneratorConfig> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, config)| *config)
            .ok_or_else(|| NoiseError::UnknownNoiseType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| *key == name)
    }

    /// Registered names in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builder preloaded with the preset registered under `name`.
    pub fn builder(&self, name: &str) -> NoiseResult<GeneratorBuilder> {
        self.get(name).map(GeneratorBuilder::new)
    }
}
