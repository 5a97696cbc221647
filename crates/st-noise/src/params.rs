// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Parameter records for every generator family.
//!
//! Each family owns a small `Copy` config struct. [`GeneratorConfig`] closes
//! over all of them; generators never mutate a record in place; they replace it
//! with [`GeneratorConfig::with_overrides`], which keeps every field the
//! overrides leave unset.

use serde::{Deserialize, Serialize};

use crate::resample::InterpolationMode;
use crate::shape::{Device, NoiseShape, Precision};
use crate::wavelet::Wavelet;

/// Band of octave sizes accepted by the cascade pyramid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeRange {
    Unbounded,
    Between(usize, usize),
}

impl SizeRange {
    /// Whether an octave of `height x width` passes the band check: either
    /// side inside the inclusive range suffices.
    pub fn admits(&self, height: usize, width: usize) -> bool {
        match *self {
            SizeRange::Unbounded => true,
            SizeRange::Between(lo, hi) => {
                (lo..=hi).contains(&height) || (lo..=hi).contains(&width)
            }
        }
    }
}

/// Partial parameter update. `None` keeps the current value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoiseOverrides {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub scale: Option<f64>,
    pub loc: Option<f64>,
    pub df: Option<f64>,
    pub alpha: Option<f64>,
    pub k: Option<f64>,
    pub discount: Option<f64>,
    pub mode: Option<InterpolationMode>,
    pub levels: Option<usize>,
    pub size_range: Option<SizeRange>,
    pub wavelet: Option<Wavelet>,
    pub level: Option<usize>,
    pub detail: Option<f64>,
    pub sigma: Option<f64>,
    pub sigma_next: Option<f64>,
    pub shape: Option<NoiseShape>,
    pub precision: Option<Precision>,
    pub device: Option<Device>,
}

impl NoiseOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Noise levels used by the Brownian family.
    pub fn with_sigmas(mut self, sigma: f64, sigma_next: f64) -> Self {
        self.sigma = Some(sigma);
        self.sigma_next = Some(sigma_next);
        self
    }

    /// Spectral exponent and amplitude of the fractal family.
    pub fn with_fractal(mut self, alpha: f64, k: f64) -> Self {
        self.alpha = Some(alpha);
        self.k = Some(k);
        self
    }

    pub fn with_shape(mut self, shape: NoiseShape) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Current value of a named parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Float(f64),
    Count(usize),
    Level(Option<usize>),
    Mode(InterpolationMode),
    Wavelet(Wavelet),
    SizeRange(SizeRange),
}

#[inline]
fn merge<T: Copy>(current: T, update: Option<T>) -> T {
    update.unwrap_or(current)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianConfig {
    pub mean: f64,
    pub std: f64,
}

impl Default for GaussianConfig {
    fn default() -> Self {
        Self { mean: 0.0, std: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformConfig {
    pub mean: f64,
    pub scale: f64,
}

impl Default for UniformConfig {
    fn default() -> Self {
        Self {
            mean: 0.0,
            scale: 1.73,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaplaceConfig {
    pub loc: f64,
    pub scale: f64,
}

impl Default for LaplaceConfig {
    fn default() -> Self {
        Self {
            loc: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentTConfig {
    pub loc: f64,
    pub scale: f64,
    /// Degrees of freedom.
    pub df: f64,
}

impl Default for StudentTConfig {
    fn default() -> Self {
        Self {
            loc: 0.0,
            scale: 0.2,
            df: 1.0,
        }
    }
}

/// Power-law spectrum `k / f^(alpha * scale)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    pub alpha: f64,
    pub k: f64,
    pub scale: f64,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            k: 1.0,
            scale: 0.1,
        }
    }
}

impl FractalConfig {
    pub fn with_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveletConfig {
    pub wavelet: Wavelet,
    /// `None` selects the deepest admissible level.
    pub level: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidConfig {
    pub discount: f64,
    pub mode: InterpolationMode,
    pub levels: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            discount: 0.8,
            mode: InterpolationMode::NearestExact,
            levels: 5,
        }
    }
}

impl PyramidConfig {
    pub fn with_mode(mode: InterpolationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// Shared by the hi-res and interpolated pyramids.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiresPyramidConfig {
    pub discount: f64,
    pub mode: InterpolationMode,
}

impl Default for HiresPyramidConfig {
    fn default() -> Self {
        Self {
            discount: 0.7,
            mode: InterpolationMode::NearestExact,
        }
    }
}

impl HiresPyramidConfig {
    pub fn with_mode(mode: InterpolationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeBConfig {
    pub levels: usize,
    pub mode: InterpolationMode,
    pub size_range: SizeRange,
}

impl Default for CascadeBConfig {
    fn default() -> Self {
        Self {
            levels: 10,
            mode: InterpolationMode::Nearest,
            size_range: SizeRange::Between(1, 16),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerlinConfig {
    /// Retained for parameter read-back; the lattice ignores it.
    pub detail: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrownianConfig {}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplexConfig {
    /// Retained for parameter read-back; sampling uses integer coordinates.
    pub scale: f64,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self { scale: 0.01 }
    }
}

/// Closed set of generator algorithms with their parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorConfig {
    Gaussian(GaussianConfig),
    GaussianBackwards(GaussianConfig),
    Uniform(UniformConfig),
    Laplace(LaplaceConfig),
    StudentT(StudentTConfig),
    Fractal(FractalConfig),
    Wavelet(WaveletConfig),
    Pyramid(PyramidConfig),
    HiresPyramid(HiresPyramidConfig),
    InterpolatedPyramid(HiresPyramidConfig),
    CascadeB(CascadeBConfig),
    Perlin(PerlinConfig),
    Brownian(BrownianConfig),
    #[cfg(feature = "simplex")]
    Simplex(SimplexConfig),
}

impl GeneratorConfig {
    /// Algorithm name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorConfig::Gaussian(_) => "gaussian",
            GeneratorConfig::GaussianBackwards(_) => "gaussian_backwards",
            GeneratorConfig::Uniform(_) => "uniform",
            GeneratorConfig::Laplace(_) => "laplacian",
            GeneratorConfig::StudentT(_) => "studentt",
            GeneratorConfig::Fractal(_) => "fractal",
            GeneratorConfig::Wavelet(_) => "wavelet",
            GeneratorConfig::Pyramid(_) => "pyramid",
            GeneratorConfig::HiresPyramid(_) => "hires-pyramid",
            GeneratorConfig::InterpolatedPyramid(_) => "pyramid-interpolated",
            GeneratorConfig::CascadeB(_) => "pyramid-cascade_B",
            GeneratorConfig::Perlin(_) => "perlin",
            GeneratorConfig::Brownian(_) => "brownian",
            #[cfg(feature = "simplex")]
            GeneratorConfig::Simplex(_) => "simplex",
        }
    }

    /// Copy of `self` with every set override applied. Overrides naming a
    /// parameter the family does not have are ignored.
    pub fn with_overrides(&self, o: &NoiseOverrides) -> Self {
        match *self {
            GeneratorConfig::Gaussian(c) => GeneratorConfig::Gaussian(GaussianConfig {
                mean: merge(c.mean, o.mean),
                std: merge(c.std, o.std),
            }),
            GeneratorConfig::GaussianBackwards(c) => {
                GeneratorConfig::GaussianBackwards(GaussianConfig {
                    mean: merge(c.mean, o.mean),
                    std: merge(c.std, o.std),
                })
            }
            GeneratorConfig::Uniform(c) => GeneratorConfig::Uniform(UniformConfig {
                mean: merge(c.mean, o.mean),
                scale: merge(c.scale, o.scale),
            }),
            GeneratorConfig::Laplace(c) => GeneratorConfig::Laplace(LaplaceConfig {
                loc: merge(c.loc, o.loc),
                scale: merge(c.scale, o.scale),
            }),
            GeneratorConfig::StudentT(c) => GeneratorConfig::StudentT(StudentTConfig {
                loc: merge(c.loc, o.loc),
                scale: merge(c.scale, o.scale),
                df: merge(c.df, o.df),
            }),
            GeneratorConfig::Fractal(c) => GeneratorConfig::Fractal(FractalConfig {
                alpha: merge(c.alpha, o.alpha),
                k: merge(c.k, o.k),
                scale: merge(c.scale, o.scale),
            }),
            GeneratorConfig::Wavelet(c) => GeneratorConfig::Wavelet(WaveletConfig {
                wavelet: merge(c.wavelet, o.wavelet),
                level: o.level.or(c.level),
            }),
            GeneratorConfig::Pyramid(c) => GeneratorConfig::Pyramid(PyramidConfig {
                discount: merge(c.discount, o.discount),
                mode: merge(c.mode, o.mode),
                levels: merge(c.levels, o.levels),
            }),
            GeneratorConfig::HiresPyramid(c) => {
                GeneratorConfig::HiresPyramid(merge_hires(c, o))
            }
            GeneratorConfig::InterpolatedPyramid(c) => {
                GeneratorConfig::InterpolatedPyramid(merge_hires(c, o))
            }
            GeneratorConfig::CascadeB(c) => GeneratorConfig::CascadeB(CascadeBConfig {
                levels: merge(c.levels, o.levels),
                mode: merge(c.mode, o.mode),
                size_range: merge(c.size_range, o.size_range),
            }),
            GeneratorConfig::Perlin(c) => GeneratorConfig::Perlin(PerlinConfig {
                detail: merge(c.detail, o.detail),
            }),
            GeneratorConfig::Brownian(c) => GeneratorConfig::Brownian(c),
            #[cfg(feature = "simplex")]
            GeneratorConfig::Simplex(c) => GeneratorConfig::Simplex(SimplexConfig {
                scale: merge(c.scale, o.scale),
            }),
        }
    }

    /// Every named parameter of the family with its current value.
    pub fn params(&self) -> Vec<(&'static str, ParamValue)> {
        use ParamValue::{Count, Float, Level, Mode, SizeRange as Range};
        match *self {
            GeneratorConfig::Gaussian(c) | GeneratorConfig::GaussianBackwards(c) => {
                vec![("mean", Float(c.mean)), ("std", Float(c.std))]
            }
            GeneratorConfig::Uniform(c) => {
                vec![("mean", Float(c.mean)), ("scale", Float(c.scale))]
            }
            GeneratorConfig::Laplace(c) => {
                vec![("loc", Float(c.loc)), ("scale", Float(c.scale))]
            }
            GeneratorConfig::StudentT(c) => vec![
                ("loc", Float(c.loc)),
                ("scale", Float(c.scale)),
                ("df", Float(c.df)),
            ],
            GeneratorConfig::Fractal(c) => vec![
                ("alpha", Float(c.alpha)),
                ("k", Float(c.k)),
                ("scale", Float(c.scale)),
            ],
            GeneratorConfig::Wavelet(c) => vec![
                ("wavelet", ParamValue::Wavelet(c.wavelet)),
                ("level", Level(c.level)),
            ],
            GeneratorConfig::Pyramid(c) => vec![
                ("discount", Float(c.discount)),
                ("mode", Mode(c.mode)),
                ("levels", Count(c.levels)),
            ],
            GeneratorConfig::HiresPyramid(c) | GeneratorConfig::InterpolatedPyramid(c) => {
                vec![("discount", Float(c.discount)), ("mode", Mode(c.mode))]
            }
            GeneratorConfig::CascadeB(c) => vec![
                ("levels", Count(c.levels)),
                ("mode", Mode(c.mode)),
                ("size_range", Range(c.size_range)),
            ],
            GeneratorConfig::Perlin(c) => vec![("detail", Float(c.detail))],
            GeneratorConfig::Brownian(_) => Vec::new(),
            #[cfg(feature = "simplex")]
            GeneratorConfig::Simplex(c) => vec![("scale", Float(c.scale))],
        }
    }
}

fn merge_hires(c: HiresPyramidConfig, o: &NoiseOverrides) -> HiresPyramidConfig {
    HiresPyramidConfig {
        discount: merge(c.discount, o.discount),
        mode: merge(c.mode, o.mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_overrides_keep_current_values() {
        let config = GeneratorConfig::StudentT(StudentTConfig::default());
        let updated = config.with_overrides(&NoiseOverrides {
            df: Some(3.0),
            ..NoiseOverrides::default()
        });
        assert_eq!(
            updated,
            GeneratorConfig::StudentT(StudentTConfig {
                loc: 0.0,
                scale: 0.2,
                df: 3.0,
            })
        );
        assert_eq!(updated.with_overrides(&NoiseOverrides::new()), updated);
    }

    #[test]
    fn foreign_overrides_are_ignored() {
        let config = GeneratorConfig::Perlin(PerlinConfig::default());
        let updated = config.with_overrides(&NoiseOverrides {
            alpha: Some(2.0),
            mode: Some(InterpolationMode::Cubic),
            ..NoiseOverrides::default()
        });
        assert_eq!(updated, config);
    }

    #[test]
    fn params_report_every_field() {
        let config = GeneratorConfig::CascadeB(CascadeBConfig::default());
        let names: Vec<_> = config.params().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["levels", "mode", "size_range"]);
        let wavelet = GeneratorConfig::Wavelet(WaveletConfig::default()).params();
        assert_eq!(wavelet[1], ("level", ParamValue::Level(None)));
    }

    #[test]
    fn size_range_band_check_uses_either_side() {
        let band = SizeRange::Between(1, 16);
        assert!(band.admits(32, 8));
        assert!(band.admits(16, 64));
        assert!(!band.admits(32, 17));
        assert!(SizeRange::Unbounded.admits(1024, 1024));
    }

    #[test]
    fn configs_round_trip_through_json() {
        let config = GeneratorConfig::Pyramid(PyramidConfig::with_mode(InterpolationMode::Cubic));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"pyramid\""));
        assert!(json.contains("\"bicubic\""));
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: GeneratorConfig =
            serde_json::from_str(r#"{"kind":"fractal","alpha":2.0}"#).unwrap();
        assert_eq!(partial, GeneratorConfig::Fractal(FractalConfig::with_alpha(2.0)));
    }
}
