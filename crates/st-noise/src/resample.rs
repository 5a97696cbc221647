// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Separable resampling over the trailing axes of a dense array.
//!
//! Every mode maps destination index `i` of an axis resized from `n_in` to
//! `n_out` through the scale `n_in / n_out`; the linear and cubic kernels use
//! half-pixel centres (`align_corners = false`). Applying the 1-D kernel axis by
//! axis gives bilinear/bicubic behaviour in 2-D and the trilinear/tricubic
//! analogue for clips.

use core::fmt;
use core::str::FromStr;

use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, NoiseResult};

const CUBIC_A: f64 = -0.75;

/// Interpolation kernel used when resizing noise octaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpolationMode {
    #[serde(rename = "nearest")]
    Nearest,
    #[serde(rename = "nearest-exact")]
    NearestExact,
    #[serde(rename = "bilinear", alias = "linear", alias = "trilinear")]
    Linear,
    #[serde(rename = "bicubic", alias = "cubic")]
    Cubic,
}

impl InterpolationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpolationMode::Nearest => "nearest",
            InterpolationMode::NearestExact => "nearest-exact",
            InterpolationMode::Linear => "bilinear",
            InterpolationMode::Cubic => "bicubic",
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMode {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(InterpolationMode::Nearest),
            "nearest-exact" => Ok(InterpolationMode::NearestExact),
            "bilinear" | "linear" | "trilinear" => Ok(InterpolationMode::Linear),
            "bicubic" | "cubic" => Ok(InterpolationMode::Cubic),
            other => Err(NoiseError::invalid(
                "mode",
                format!("unknown interpolation mode `{other}`"),
            )),
        }
    }
}

/// Resizes the last `target.len()` axes of `values` to `target`.
pub fn resize_trailing(
    values: &ArrayD<f64>,
    target: &[usize],
    mode: InterpolationMode,
) -> NoiseResult<ArrayD<f64>> {
    let ndim = values.ndim();
    if target.len() > ndim {
        return Err(NoiseError::shape_mismatch(format!(
            "cannot resize {} trailing axes of a rank-{ndim} array",
            target.len()
        )));
    }
    if target.iter().any(|&d| d == 0) {
        return Err(NoiseError::shape_mismatch(format!(
            "resize target {target:?} contains an empty axis"
        )));
    }
    let first = ndim - target.len();
    let mut current = values.clone();
    for (offset, &len_out) in target.iter().enumerate() {
        let axis = first + offset;
        if current.len_of(Axis(axis)) != len_out {
            current = resize_axis(&current, axis, len_out, mode);
        }
    }
    Ok(current)
}

fn resize_axis(
    values: &ArrayD<f64>,
    axis: usize,
    len_out: usize,
    mode: InterpolationMode,
) -> ArrayD<f64> {
    let len_in = values.len_of(Axis(axis));
    let mut dims = values.shape().to_vec();
    dims[axis] = len_out;
    let mut out = ArrayD::zeros(IxDyn(&dims));
    let taps = kernel_taps(len_in, len_out, mode);
    let mut lane_buf = vec![0.0; len_in];
    for (src, mut dst) in values
        .lanes(Axis(axis))
        .into_iter()
        .zip(out.lanes_mut(Axis(axis)))
    {
        for (slot, v) in lane_buf.iter_mut().zip(src.iter()) {
            *slot = *v;
        }
        for (dst_value, row) in dst.iter_mut().zip(taps.iter()) {
            *dst_value = row.iter().map(|&(idx, w)| lane_buf[idx] * w).sum();
        }
    }
    out
}

/// Source indices and weights for each destination sample.
fn kernel_taps(len_in: usize, len_out: usize, mode: InterpolationMode) -> Vec<Vec<(usize, f64)>> {
    let scale = len_in as f64 / len_out as f64;
    let last = len_in - 1;
    (0..len_out)
        .map(|i| match mode {
            InterpolationMode::Nearest => {
                let src = ((i as f64) * scale).floor() as usize;
                vec![(src.min(last), 1.0)]
            }
            InterpolationMode::NearestExact => {
                let src = ((i as f64 + 0.5) * scale).floor() as usize;
                vec![(src.min(last), 1.0)]
            }
            InterpolationMode::Linear => {
                let x = ((i as f64 + 0.5) * scale - 0.5).max(0.0);
                let i0 = (x.floor() as usize).min(last);
                let i1 = (i0 + 1).min(last);
                let lambda = x - i0 as f64;
                vec![(i0, 1.0 - lambda), (i1, lambda)]
            }
            InterpolationMode::Cubic => {
                let x = (i as f64 + 0.5) * scale - 0.5;
                let base = x.floor();
                let t = x - base;
                let weights = cubic_weights(t);
                (0..4)
                    .map(|k| {
                        let idx = (base as i64 - 1 + k as i64).clamp(0, last as i64) as usize;
                        (idx, weights[k])
                    })
                    .collect()
            }
        })
        .collect()
}

fn cubic_weights(t: f64) -> [f64; 4] {
    let near = |x: f64| ((CUBIC_A + 2.0) * x - (CUBIC_A + 3.0)) * x * x + 1.0;
    let far = |x: f64| ((CUBIC_A * x - 5.0 * CUBIC_A) * x + 8.0 * CUBIC_A) * x - 4.0 * CUBIC_A;
    [far(t + 1.0), near(t), near(1.0 - t), far(2.0 - t)]
}
