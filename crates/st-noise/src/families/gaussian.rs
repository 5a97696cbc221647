// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use ndarray::ArrayD;

use crate::error::NoiseResult;
use crate::field::standardize;
use crate::generator::GeneratorCore;
use crate::params::{GaussianConfig, UniformConfig};

/// Standard normal draw, centred and scaled to unit std. `mean`/`std` only
/// travel with the record.
pub(crate) fn gaussian(core: &mut GeneratorCore, _config: &GaussianConfig) -> NoiseResult<ArrayD<f64>> {
    let dims = core.dims();
    Ok(standardize(core.rng.standard_normal(&dims)))
}

/// Steps the context back one seed before every draw.
pub(crate) fn gaussian_backwards(
    core: &mut GeneratorCore,
    config: &GaussianConfig,
) -> NoiseResult<ArrayD<f64>> {
    let previous = core.rng.initial_seed().wrapping_sub(1);
    core.rng.manual_seed(previous);
    gaussian(core, config)
}

/// `scale * 2 * (u - 0.5) + mean`, left unnormalised.
pub(crate) fn uniform(core: &mut GeneratorCore, config: &UniformConfig) -> NoiseResult<ArrayD<f64>> {
    let dims = core.dims();
    let UniformConfig { mean, scale } = *config;
    Ok(core.rng.uniform(&dims).mapv(|u| scale * 2.0 * (u - 0.5) + mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::FieldSpec;

    fn core(seed: u64) -> GeneratorCore {
        GeneratorCore::new(FieldSpec::from_dims(&[2, 4, 16, 16]).unwrap(), seed)
    }

    #[test]
    fn gaussian_is_standardised() {
        let values = gaussian(&mut core(1), &GaussianConfig::default()).unwrap();
        let n = values.len() as f64;
        let mean = values.sum() / n;
        let var = values.fold(0.0, |acc, v| acc + (v - mean) * (v - mean)) / (n - 1.0);
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-9);
    }

    #[test]
    fn backwards_walks_the_seed_down() {
        let mut c = core(10);
        gaussian_backwards(&mut c, &GaussianConfig::default()).unwrap();
        assert_eq!(c.rng.initial_seed(), 9);
        let second = gaussian_backwards(&mut c, &GaussianConfig::default()).unwrap();
        assert_eq!(c.rng.initial_seed(), 8);
        let replay = gaussian(&mut core(8), &GaussianConfig::default()).unwrap();
        assert_eq!(second, replay);
    }

    #[test]
    fn uniform_stays_in_its_range() {
        let config = UniformConfig {
            mean: 1.0,
            scale: 0.5,
        };
        let values = uniform(&mut core(2), &config).unwrap();
        assert!(values.iter().all(|&v| (0.5..1.5).contains(&v)));
    }
}
