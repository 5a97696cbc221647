// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Multi-octave pyramids. Octaves are drawn at a different resolution,
//! resampled to the field's structured axes and accumulated with geometric
//! weights.

use ndarray::{ArrayD, IxDyn};

use crate::error::{NoiseError, NoiseResult};
use crate::field::rescale_std;
use crate::generator::GeneratorCore;
use crate::params::{CascadeBConfig, HiresPyramidConfig, PyramidConfig};
use crate::resample::resize_trailing;

const HIRES_GROWTH_CAP: usize = 15;
const HIRES_OCTAVES: i32 = 4;
const UNIFORM_SPREAD: f64 = 1.73;
const CASCADE_DECAY: f64 = 0.75;

fn octave_dims(core: &GeneratorCore, field: &[usize]) -> Vec<usize> {
    let shape = core.spec.shape;
    let mut dims = vec![shape.batch(), shape.channels()];
    dims.extend_from_slice(field);
    dims
}

/// Octave `i` is drawn from `N(0, 0.5^i)` at `2^(i+1)` times the field
/// resolution, resized down and weighted by `discount^i`.
pub(crate) fn pyramid(core: &mut GeneratorCore, config: &PyramidConfig) -> NoiseResult<ArrayD<f64>> {
    let field = core.spec.shape.field_dims();
    let mut noise = ArrayD::<f64>::zeros(IxDyn(&core.dims()));
    for i in 0..config.levels {
        let grown: Option<Vec<usize>> = u32::try_from(i + 1)
            .ok()
            .and_then(|exp| 2usize.checked_pow(exp))
            .and_then(|factor| field.iter().map(|&d| d.checked_mul(factor)).collect());
        let grown = grown.ok_or_else(|| {
            NoiseError::invalid("levels", format!("octave {i} overflows the field size"))
        })?;
        let octave_shape = octave_dims(core, &grown);
        let octave = core.rng.normal(&octave_shape, 0.0, 0.5f64.powi(i as i32))?;
        let resized = resize_trailing(&octave, &field, config.mode)?;
        noise.scaled_add(config.discount.powi(i as i32), &resized);
    }
    Ok(rescale_std(noise))
}

/// Uniform base plus up to four Gaussian octaves drawn at randomly growing
/// resolutions (capped at fifteen times the field). With `interpolated` the
/// sum is first divided by the root of the summed squared weights.
pub(crate) fn hires(
    core: &mut GeneratorCore,
    config: &HiresPyramidConfig,
    interpolated: bool,
) -> NoiseResult<ArrayD<f64>> {
    let dims = core.dims();
    let field = core.spec.shape.field_dims();
    let caps: Vec<usize> = field.iter().map(|&d| d * HIRES_GROWTH_CAP).collect();
    let mut noise = core
        .rng
        .uniform(&dims)
        .mapv(|u| (u - 0.5) * 2.0 * UNIFORM_SPREAD);

    let mut current = field.clone();
    let mut weight_sq = 1.0;
    for i in 0..HIRES_OCTAVES {
        let r = core.rng.uniform_scalar() * 2.0 + 2.0;
        let growth = r.powi(i);
        for (d, &cap) in current.iter_mut().zip(caps.iter()) {
            *d = cap.min((*d as f64 * growth).floor() as usize);
        }
        let octave_shape = octave_dims(core, &current);
        let octave = core.rng.standard_normal(&octave_shape);
        let resized = resize_trailing(&octave, &field, config.mode)?;
        let weight = config.discount.powi(i);
        noise.scaled_add(weight, &resized);
        weight_sq += weight * weight;
        if current.iter().zip(caps.iter()).any(|(d, cap)| d >= cap) {
            break;
        }
    }

    if interpolated {
        let norm = weight_sq.sqrt();
        noise.mapv_inplace(|v| v / norm);
    }
    Ok(rescale_std(noise))
}

/// Full-resolution Gaussian with coarse offsets of side `H / 2^i` (the height
/// is used for both axes) blended in with weights `0.75^i`. Only octaves whose
/// side passes the size band contribute. The result is divided by the root of
/// the summed squared weights.
pub(crate) fn cascade_b(core: &mut GeneratorCore, config: &CascadeBConfig) -> NoiseResult<ArrayD<f64>> {
    let shape = core.spec.shape;
    if shape.is_spatiotemporal() {
        return Err(NoiseError::Unsupported {
            generator: "pyramid-cascade_B",
            rank: shape.rank(),
        });
    }
    let (height, width) = (shape.height(), shape.width());
    let dims = core.dims();
    let mut epsilon = core.rng.standard_normal(&dims);
    let mut weight_sq = 1.0;
    for i in 1..config.levels {
        let m = CASCADE_DECAY.powi(i as i32);
        let side = u32::try_from(i)
            .ok()
            .and_then(|shift| height.checked_shr(shift))
            .unwrap_or(0);
        let (h, w) = (side, side);
        if h > 0 && w > 0 && config.size_range.admits(h, w) {
            let offset_shape = octave_dims(core, &[h, w]);
            let offset = core.rng.standard_normal(&offset_shape);
            let resized = resize_trailing(&offset, &[height, width], config.mode)?;
            epsilon.scaled_add(m, &resized);
            weight_sq += m * m;
        }
        if h <= 1 || w <= 1 {
            break;
        }
    }
    let norm = weight_sq.sqrt();
    epsilon.mapv_inplace(|v| v / norm);
    Ok(epsilon)
}
