// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Fourier-domain helpers for colored noise.
//!
//! Transforms run along the trailing axes with `rustfft`, one lane at a time.
//! Forward transforms are unnormalised and inverse transforms are scaled by
//! `1/n` per axis so that `inverse(forward(x)) == x`.

use ndarray::{ArrayD, Axis, IxDyn};
use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::error::{NoiseError, NoiseResult};

/// Floor applied to the radial frequency so the density never divides by zero.
pub const FREQUENCY_FLOOR: f64 = 1e-10;

/// Sample frequencies of an `n`-point transform in cycles per signal length:
/// `[0, 1, ..., ceil(n/2) - 1, -floor(n/2), ..., -1]`.
pub fn fft_frequencies(n: usize) -> Vec<f64> {
    let positive = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < positive {
                k as f64
            } else {
                k as f64 - n as f64
            }
        })
        .collect()
}

/// Euclidean norm of the per-axis frequencies over a grid of `dims`, floored
/// at [`FREQUENCY_FLOOR`].
pub fn radial_frequency_grid(dims: &[usize]) -> ArrayD<f64> {
    let axes: Vec<Vec<f64>> = dims.iter().map(|&n| fft_frequencies(n)).collect();
    ArrayD::from_shape_fn(IxDyn(dims), |ix| {
        let sq: f64 = (0..dims.len()).map(|a| axes[a][ix[a]].powi(2)).sum();
        sq.sqrt().max(FREQUENCY_FLOOR)
    })
}

/// `k / freq^exponent` with the zero-frequency bin forced to exactly zero.
pub fn spectral_density(freq: &ArrayD<f64>, k: f64, exponent: f64) -> ArrayD<f64> {
    let mut density = freq.mapv(|f| k / f.powf(exponent));
    if let Some(dc) = density.iter_mut().next() {
        *dc = 0.0;
    }
    density
}

/// In-place FFT over the last `axes` axes.
pub fn fft_trailing(
    values: &mut ArrayD<Complex64>,
    axes: usize,
    inverse: bool,
) -> NoiseResult<()> {
    let ndim = values.ndim();
    if axes > ndim {
        return Err(NoiseError::shape_mismatch(format!(
            "cannot transform {axes} axes of a rank-{ndim} array"
        )));
    }
    let mut planner = FftPlanner::<f64>::new();
    for axis in ndim - axes..ndim {
        let n = values.len_of(Axis(axis));
        if n < 2 {
            continue;
        }
        let fft = if inverse {
            planner.plan_fft_inverse(n)
        } else {
            planner.plan_fft_forward(n)
        };
        // rustfft leaves the inverse unnormalised
        let scale = if inverse { 1.0 / n as f64 } else { 1.0 };
        let mut buf = vec![Complex64::new(0.0, 0.0); n];
        for mut lane in values.lanes_mut(Axis(axis)) {
            for (slot, v) in buf.iter_mut().zip(lane.iter()) {
                *slot = *v;
            }
            fft.process(&mut buf);
            for (dst, v) in lane.iter_mut().zip(buf.iter()) {
                *dst = *v * scale;
            }
        }
    }
    Ok(())
}

/// Filters `values` by `density` in the Fourier domain of its trailing axes and
/// returns the real part of the result. `density` must span exactly those axes.
pub fn shape_spectrum(values: &ArrayD<f64>, density: &ArrayD<f64>) -> NoiseResult<ArrayD<f64>> {
    let axes = density.ndim();
    let trailing = &values.shape()[values.ndim().saturating_sub(axes)..];
    if axes > values.ndim() || trailing != density.shape() {
        return Err(NoiseError::shape_mismatch(format!(
            "density {:?} does not cover the trailing axes of {:?}",
            density.shape(),
            values.shape()
        )));
    }
    let mut spectrum = values.mapv(|v| Complex64::new(v, 0.0));
    fft_trailing(&mut spectrum, axes, false)?;
    spectrum.zip_mut_with(density, |s, &d| *s *= d);
    fft_trailing(&mut spectrum, axes, true)?;
    Ok(spectrum.mapv(|c| c.re))
}
