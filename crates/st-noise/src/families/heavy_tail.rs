// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Heavy-tailed families. Both draw their tail component from a scoped copy of
//! the primary context, then push the primary one seed forward.

use ndarray::{ArrayD, Axis, Zip};
use rand_distr::{Exp1, StudentT};

use crate::error::{NoiseError, NoiseResult};
use crate::field::{rescale_std, standardize};
use crate::generator::GeneratorCore;
use crate::params::{LaplaceConfig, StudentTConfig};

const TAIL_QUANTILE: f64 = 0.75;

fn positive(name: &'static str, value: f64) -> NoiseResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(NoiseError::invalid(name, format!("must be positive, got {value}")))
    }
}

/// Gaussian base at a quarter scale plus a Laplace(loc, scale) layer.
pub(crate) fn laplace(core: &mut GeneratorCore, config: &LaplaceConfig) -> NoiseResult<ArrayD<f64>> {
    positive("scale", config.scale)?;
    let dims = core.dims();
    let mut noise = core.rng.standard_normal(&dims);
    noise.mapv_inplace(|v| v / 4.0);

    let mut tail = core.rng.scoped();
    let rise = tail.sample(&dims, Exp1);
    let fall = tail.sample(&dims, Exp1);
    let LaplaceConfig { loc, scale } = *config;
    Zip::from(&mut noise)
        .and(&rise)
        .and(&fall)
        .for_each(|n, &a, &b| *n += loc + scale * (a - b));

    core.reseed_forward();
    core.advance();
    Ok(rescale_std(noise))
}

/// Student-t draw clamped per batch item to its 75th percentile magnitude and
/// compressed with a signed square root.
pub(crate) fn student_t(
    core: &mut GeneratorCore,
    config: &StudentTConfig,
) -> NoiseResult<ArrayD<f64>> {
    positive("scale", config.scale)?;
    positive("df", config.df)?;
    let dims = core.dims();
    let dist = StudentT::new(config.df).map_err(|err| NoiseError::invalid("df", err.to_string()))?;

    let mut tail = core.rng.scoped();
    let StudentTConfig { loc, scale, .. } = *config;
    let mut noise = tail.sample(&dims, dist);
    noise.mapv_inplace(|v| loc + scale * v);
    core.advance();

    for mut item in noise.axis_iter_mut(Axis(0)) {
        let mut magnitudes: Vec<f64> = item.iter().map(|v| v.abs()).collect();
        let limit = quantile(&mut magnitudes, TAIL_QUANTILE);
        item.mapv_inplace(|v| {
            let clamped = v.clamp(-limit, limit);
            clamped.signum() * clamped.abs().sqrt()
        });
    }

    core.reseed_forward();
    Ok(standardize(noise))
}

/// Linearly interpolated quantile; sorts `values` in place.
fn quantile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::FieldSpec;

    fn core(seed: u64) -> GeneratorCore {
        GeneratorCore::new(FieldSpec::from_dims(&[2, 4, 16, 16]).unwrap(), seed)
    }

    fn std(values: &ArrayD<f64>) -> f64 {
        let n = values.len() as f64;
        let mean = values.sum() / n;
        (values.fold(0.0, |acc, v| acc + (v - mean) * (v - mean)) / (n - 1.0)).sqrt()
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert!((quantile(&mut values, 0.75) - 3.25).abs() < 1e-12);
        assert_eq!(quantile(&mut [7.0], 0.75), 7.0);
    }

    #[test]
    fn laplace_is_unit_std_and_reseeds() {
        let mut c = core(5);
        let values = laplace(&mut c, &LaplaceConfig::default()).unwrap();
        assert!((std(&values) - 1.0).abs() < 1e-9);
        assert_eq!(c.rng.initial_seed(), 6);
        assert_eq!(c.last_seed(), 6);
    }

    #[test]
    fn student_t_is_bounded_per_item() {
        let mut c = core(5);
        let values = student_t(&mut c, &StudentTConfig::default()).unwrap();
        assert!((std(&values) - 1.0).abs() < 1e-9);
        assert!(values.iter().all(|v| v.is_finite()));
        assert_eq!(c.rng.initial_seed(), 6);
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let bad_scale = LaplaceConfig {
            loc: 0.0,
            scale: 0.0,
        };
        assert!(matches!(
            laplace(&mut core(0), &bad_scale),
            Err(NoiseError::InvalidParameter { name: "scale", .. })
        ));
        let bad_df = StudentTConfig {
            df: -1.0,
            ..StudentTConfig::default()
        };
        assert!(matches!(
            student_t(&mut core(0), &bad_df),
            Err(NoiseError::InvalidParameter { name: "df", .. })
        ));
    }
}
