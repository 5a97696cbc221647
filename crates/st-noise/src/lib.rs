// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Seeded structured noise for diffusion sampling.
//!
//! Generators fill `(B, C, H, W)` image batches or `(B, C, T, H, W)` clip
//! batches with noise whose structure differs from white Gaussian noise:
//! power-law spectra, multi-octave pyramids, wavelet pass-through, Perlin
//! lattices, heavy-tailed marginals, Brownian increments and (behind the
//! `simplex` feature) simplex noise. Every family is a [`GeneratorConfig`]
//! variant driven by a [`NoiseGenerator`]; named presets live in the
//! [`NoiseRegistry`] and [`prepare_noise`] turns a latent descriptor plus a
//! seed into the initial noise of a sampling run.
//!
//! ```no_run
//! use st_noise::{prepare_noise, FieldSpec, PrepareOptions};
//!
//! let latent = FieldSpec::from_dims(&[2, 4, 64, 64])?;
//! let noise = prepare_noise(&latent, 42, "pink", &PrepareOptions::default())?;
//! assert_eq!(noise.shape().dims(), vec![2, 4, 64, 64]);
//! # Ok::<(), st_noise::NoiseError>(())
//! ```

pub mod blend;
pub mod brownian;
pub mod error;
mod families;
pub mod field;
pub mod generator;
pub mod params;
pub mod perlin;
pub mod prepare;
pub mod registry;
pub mod resample;
pub mod rng;
pub mod shape;
#[cfg(feature = "simplex")]
pub mod simplex;
pub mod spectral;
pub mod telemetry;
pub mod wavelet;

pub use blend::{Blend, Slerp};
pub use brownian::{
    default_brownian_factory, BrownianBounds, BrownianFactory, BrownianSampler,
    BrownianTreeSampler,
};
pub use error::{NoiseError, NoiseResult};
pub use field::NoiseField;
pub use generator::{GeneratorBuilder, GeneratorCore, NoiseGenerator, NoiseSource};
pub use params::{
    BrownianConfig, CascadeBConfig, FractalConfig, GaussianConfig, GeneratorConfig,
    HiresPyramidConfig, LaplaceConfig, NoiseOverrides, ParamValue, PerlinConfig, PyramidConfig,
    SizeRange, StudentTConfig, UniformConfig, WaveletConfig,
};
#[cfg(feature = "simplex")]
pub use params::SimplexConfig;
pub use perlin::perlin_noise;
pub use prepare::{prepare_noise, NoisePreparer, PrepareOptions};
pub use registry::NoiseRegistry;
pub use resample::InterpolationMode;
pub use rng::RngContext;
pub use shape::{Device, FieldSpec, Layout, NoiseShape, Precision};
pub use telemetry::TracingState;
#[cfg(feature = "simplex")]
pub use simplex::{default_simplex_factory, SimplexBackend, SimplexFactory, SimplexLattice};
pub use wavelet::{Wavelet, WaveletPyramid};
