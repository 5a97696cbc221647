// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Gradient (Perlin) noise on a regular lattice.

use core::f64::consts::PI;

use ndarray::Array3;

use crate::error::{NoiseError, NoiseResult};
use crate::rng::RngContext;

#[inline]
fn smooth_step(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Draws `batch` independent Perlin planes of size `out` from a lattice of
/// `grid` cells.
///
/// Each lattice corner carries a unit gradient with a uniform angle in
/// `[0, 2π)`; the `(batch, gh + 1, gw + 1)` angle tensor is drawn from `rng`
/// in row-major order. Samples sit at cell-centred offsets `(i + 0.5) / b`
/// and blend the four corner dot products with a smoothstep. `out` must be an
/// exact multiple of `grid` along both axes.
pub fn perlin_noise(
    rng: &mut RngContext,
    grid: (usize, usize),
    out: (usize, usize),
    batch: usize,
) -> NoiseResult<Array3<f64>> {
    let (gh, gw) = grid;
    let (oh, ow) = out;
    if gh == 0 || gw == 0 {
        return Err(NoiseError::shape_mismatch(format!(
            "perlin grid {gh}x{gw} must be non-empty"
        )));
    }
    if oh % gh != 0 {
        return Err(NoiseError::shape_mismatch(format!(
            "output height {oh} must be divisible by grid height {gh}"
        )));
    }
    if ow % gw != 0 {
        return Err(NoiseError::shape_mismatch(format!(
            "output width {ow} must be divisible by grid width {gw}"
        )));
    }
    let (bh, bw) = (oh / gh, ow / gw);

    let angles = rng.uniform(&[batch, gh + 1, gw + 1]);
    let gradient = |b: usize, y: usize, x: usize| {
        let theta = angles[[b, y, x]] * 2.0 * PI;
        (theta.cos(), theta.sin())
    };

    let mut noise = Array3::<f64>::zeros((batch, oh, ow));
    for b in 0..batch {
        for cy in 0..gh {
            for cx in 0..gw {
                let corners = [
                    gradient(b, cy, cx),
                    gradient(b, cy, cx + 1),
                    gradient(b, cy + 1, cx),
                    gradient(b, cy + 1, cx + 1),
                ];
                for iy in 0..bh {
                    let py = (iy as f64 + 0.5) / bh as f64;
                    let sy = smooth_step(py);
                    for ix in 0..bw {
                        let px = (ix as f64 + 0.5) / bw as f64;
                        let sx = smooth_step(px);
                        let dot = |g: (f64, f64), dx: f64, dy: f64| g.0 * dx + g.1 * dy;
                        let top = lerp(
                            dot(corners[0], px, py),
                            dot(corners[1], px - 1.0, py),
                            sx,
                        );
                        let bottom = lerp(
                            dot(corners[2], px, py - 1.0),
                            dot(corners[3], px - 1.0, py - 1.0),
                            sx,
                        );
                        noise[[b, cy * bh + iy, cx * bw + ix]] = lerp(top, bottom, sy);
                    }
                }
            }
        }
    }
    Ok(noise)
}
