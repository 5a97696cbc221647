// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Spectral families: power-law filtered Gaussian fields and wavelet
//! pass-through noise.

use ndarray::ArrayD;
use tracing::warn;

use crate::error::NoiseResult;
use crate::field::{rescale_std, standardize, NoiseField};
use crate::generator::GeneratorCore;
use crate::params::{FractalConfig, WaveletConfig};
use crate::shape::Device;
use crate::spectral::{radial_frequency_grid, shape_spectrum, spectral_density};
use crate::wavelet::WaveletPyramid;

/// Gaussian noise filtered by `k / f^(alpha * scale)` over the structured
/// axes, then scaled to unit std.
pub(crate) fn fractal(core: &mut GeneratorCore, config: &FractalConfig) -> NoiseResult<ArrayD<f64>> {
    let dims = core.dims();
    let noise = core.rng.standard_normal(&dims);
    let freq = radial_frequency_grid(&core.spec.shape.field_dims());
    let density = spectral_density(&freq, config.k, config.alpha * config.scale);
    let shaped = shape_spectrum(&noise, &density)?;
    Ok(rescale_std(shaped))
}

/// Gaussian noise decomposed into a wavelet pyramid on the host and
/// reconstructed from it.
pub(crate) fn wavelet(core: &mut GeneratorCore, config: &WaveletConfig) -> NoiseResult<ArrayD<f64>> {
    let dims = core.dims();
    let noise = core.rng.standard_normal(&dims);
    let staged = NoiseField::new(noise, core.spec)?.to_device(Device::Cpu);

    let axes = core.spec.shape.field_rank();
    let field_dims = core.spec.shape.field_dims();
    let max = WaveletPyramid::max_level(&field_dims, config.wavelet);
    let level = match config.level {
        Some(requested) if requested > max => {
            warn!(
                wavelet = %config.wavelet,
                requested,
                max,
                "wavelet level exceeds the field size; clamping"
            );
            max
        }
        Some(requested) => requested,
        None => max,
    };

    let pyramid = WaveletPyramid::decompose(staged.values(), axes, config.wavelet, Some(level))?;
    let restored = NoiseField::new(pyramid.reconstruct(), *staged.spec())?.to_device(core.spec.device);
    Ok(standardize(restored.into_values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::FieldSpec;
    use crate::wavelet::Wavelet;

    fn core(dims: &[usize]) -> GeneratorCore {
        GeneratorCore::new(FieldSpec::from_dims(dims).unwrap(), 42)
    }

    fn std(values: &ArrayD<f64>) -> f64 {
        let n = values.len() as f64;
        let mean = values.sum() / n;
        (values.fold(0.0, |acc, v| acc + (v - mean) * (v - mean)) / (n - 1.0)).sqrt()
    }

    #[test]
    fn fractal_colours_are_unit_std() {
        for alpha in [-2.0, 0.0, 1.0, 2.0] {
            let config = FractalConfig::with_alpha(alpha);
            let values = fractal(&mut core(&[1, 4, 16, 16]), &config).unwrap();
            assert!((std(&values) - 1.0).abs() < 1e-9, "alpha {alpha}");
        }
    }

    #[test]
    fn fractal_removes_each_plane_mean() {
        let values = fractal(&mut core(&[1, 2, 8, 8]), &FractalConfig::default()).unwrap();
        for plane in values.outer_iter() {
            for channel in plane.outer_iter() {
                assert!(channel.sum().abs() < 1e-9);
            }
        }
    }

    #[test]
    fn fractal_covers_clips() {
        let values = fractal(&mut core(&[1, 2, 4, 8, 8]), &FractalConfig::with_alpha(1.0)).unwrap();
        assert_eq!(values.shape(), &[1, 2, 4, 8, 8]);
    }

    #[test]
    fn wavelet_pass_through_keeps_the_draw() {
        let config = WaveletConfig {
            wavelet: Wavelet::Db2,
            level: None,
        };
        let mut c = core(&[1, 2, 16, 16]);
        let values = wavelet(&mut c, &config).unwrap();
        let mut replay = core(&[1, 2, 16, 16]);
        let dims = replay.dims();
        let expected = standardize(replay.rng.standard_normal(&dims));
        for (a, b) in values.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn wavelet_clamps_excessive_levels() {
        let config = WaveletConfig {
            wavelet: Wavelet::Haar,
            level: Some(12),
        };
        let values = wavelet(&mut core(&[1, 1, 8, 8]), &config).unwrap();
        assert!((std(&values) - 1.0).abs() < 1e-9);
    }
}
