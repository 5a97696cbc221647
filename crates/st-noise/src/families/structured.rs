// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Structured fields: Perlin lattices, Brownian increments and simplex noise.

use ndarray::{ArrayD, Axis};

use crate::brownian::{BrownianBounds, BrownianFactory};
use crate::error::{NoiseError, NoiseResult};
use crate::field::{rescale_std, NoiseField};
use crate::generator::GeneratorCore;
use crate::params::{NoiseOverrides, PerlinConfig};
use crate::perlin::perlin_noise;
#[cfg(feature = "simplex")]
use crate::params::SimplexConfig;
#[cfg(feature = "simplex")]
use crate::simplex::SimplexBackend;

const PERLIN_OCTAVES: usize = 2;

/// Half-scale Gaussian base plus two per-channel Perlin planes shared by the
/// whole batch (and by every frame of a clip).
pub(crate) fn perlin(core: &mut GeneratorCore, _config: &PerlinConfig) -> NoiseResult<ArrayD<f64>> {
    let shape = core.spec.shape;
    let dims = core.dims();
    let (height, width) = (shape.height(), shape.width());
    let mut noise = core.rng.standard_normal(&dims);
    noise.mapv_inplace(|v| v / 2.0);
    for _ in 0..PERLIN_OCTAVES {
        let plane = perlin_noise(&mut core.rng, (height, width), (height, width), shape.channels())?;
        if shape.is_spatiotemporal() {
            noise += &plane.insert_axis(Axis(1));
        } else {
            noise += &plane;
        }
    }
    Ok(rescale_std(noise))
}

/// Normalised Brownian increment between the override noise levels. The
/// sampler is rebuilt on every call from the generator's sigma bounds.
pub(crate) fn brownian(
    core: &mut GeneratorCore,
    factory: &BrownianFactory,
    overrides: &NoiseOverrides,
) -> NoiseResult<NoiseField> {
    let (sigma_min, sigma_max) = match (core.sigma_min, core.sigma_max) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            return Err(NoiseError::invalid(
                "sigma_min",
                "brownian noise needs sigma bounds on the generator",
            ))
        }
    };
    let sigma = overrides
        .sigma
        .ok_or_else(|| NoiseError::invalid("sigma", "brownian noise needs the current sigma"))?;
    let sigma_next = overrides
        .sigma_next
        .ok_or_else(|| NoiseError::invalid("sigma_next", "brownian noise needs the next sigma"))?;
    if sigma == sigma_next {
        return Err(NoiseError::invalid(
            "sigma_next",
            format!("must differ from sigma ({sigma})"),
        ));
    }

    let bounds = BrownianBounds {
        spec: core.spec,
        sigma_min,
        sigma_max,
        seed: core.seed,
        cpu: core.spec.device.is_cpu(),
    };
    let mut sampler = factory(bounds)?;
    let field = sampler.sample(sigma, sigma_next)?;
    if field.shape() != &core.spec.shape {
        return Err(NoiseError::shape_mismatch(format!(
            "brownian sampler returned {} for a {} generator",
            field.shape(),
            core.spec.shape
        )));
    }
    Ok(field)
}

/// Simplex noise sampled on the integer grid `x < W`, `y < H`,
/// `z < B * C * T`, reshaped into the field and scaled to unit std.
#[cfg(feature = "simplex")]
pub(crate) fn simplex(
    core: &mut GeneratorCore,
    _config: &SimplexConfig,
    backend: &dyn SimplexBackend,
) -> NoiseResult<ArrayD<f64>> {
    let shape = core.spec.shape;
    let depth = shape.batch() * shape.channels() * shape.frames();
    let axis = |n: usize| (0..n).map(|v| v as f64).collect::<Vec<_>>();
    let grid = backend.noise3_array(&axis(shape.width()), &axis(shape.height()), &axis(depth));
    let expected = (depth, shape.height(), shape.width());
    if grid.dim() != expected {
        return Err(NoiseError::shape_mismatch(format!(
            "simplex backend returned {:?}, expected {expected:?}",
            grid.dim()
        )));
    }
    let values = grid
        .into_dyn()
        .into_shape(core.dims())
        .map_err(|err| NoiseError::shape_mismatch(err.to_string()))?;
    Ok(rescale_std(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brownian::default_brownian_factory;
    use crate::shape::FieldSpec;

    fn core(dims: &[usize]) -> GeneratorCore {
        GeneratorCore::new(FieldSpec::from_dims(dims).unwrap(), 42)
    }

    #[test]
    fn perlin_is_unit_std_for_images_and_clips() {
        for dims in [&[2, 3, 8, 8][..], &[1, 2, 3, 8, 8][..]] {
            let values = perlin(&mut core(dims), &PerlinConfig::default()).unwrap();
            assert_eq!(values.shape(), dims);
            let field = NoiseField::new(values, FieldSpec::from_dims(dims).unwrap()).unwrap();
            assert!((field.std() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn brownian_requires_sigmas_and_bounds() {
        let factory = default_brownian_factory();
        let mut c = core(&[1, 1, 4, 4]);
        let with_sigmas = NoiseOverrides::new().with_sigmas(2.0, 1.0);
        assert!(matches!(
            brownian(&mut c, &factory, &with_sigmas),
            Err(NoiseError::InvalidParameter { name: "sigma_min", .. })
        ));
        c.sigma_min = Some(0.5);
        c.sigma_max = Some(10.0);
        assert!(matches!(
            brownian(&mut c, &factory, &NoiseOverrides::new()),
            Err(NoiseError::InvalidParameter { name: "sigma", .. })
        ));
        assert!(matches!(
            brownian(&mut c, &factory, &NoiseOverrides::new().with_sigmas(2.0, 2.0)),
            Err(NoiseError::InvalidParameter { name: "sigma_next", .. })
        ));
        let field = brownian(&mut c, &factory, &with_sigmas).unwrap();
        assert_eq!(field.shape(), c.shape());
    }

    #[test]
    fn brownian_is_stable_for_a_seed() {
        let factory = default_brownian_factory();
        let mut c = core(&[1, 2, 8, 8]);
        c.sigma_min = Some(0.03);
        c.sigma_max = Some(14.6);
        let o = NoiseOverrides::new().with_sigmas(14.6, 0.03);
        let a = brownian(&mut c, &factory, &o).unwrap();
        let b = brownian(&mut c, &factory, &o).unwrap();
        assert_eq!(a, b);
    }

    #[cfg(feature = "simplex")]
    #[test]
    fn simplex_fills_the_whole_field() {
        use crate::simplex::SimplexLattice;
        let backend = SimplexLattice::new(3);
        let values = simplex(
            &mut core(&[2, 2, 8, 8]),
            &SimplexConfig::default(),
            &backend,
        )
        .unwrap();
        assert_eq!(values.shape(), &[2, 2, 8, 8]);
        let field = NoiseField::new(values, FieldSpec::from_dims(&[2, 2, 8, 8]).unwrap()).unwrap();
        assert!((field.std() - 1.0).abs() < 1e-9);
    }
}
