// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Periodised orthogonal wavelet pyramids over the trailing axes of an array.
//!
//! Coefficients are stored Mallat-style in a single array with the input's
//! shape: after each level the approximation band occupies the leading half of
//! every transformed axis and the detail bands the trailing half. Boundaries
//! wrap around, so analysis followed by synthesis reproduces the input up to
//! rounding.

use core::fmt;
use core::str::FromStr;

use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, NoiseResult};

const HAAR: [f64; 2] = [core::f64::consts::FRAC_1_SQRT_2, core::f64::consts::FRAC_1_SQRT_2];

const DB2: [f64; 4] = [
    0.482_962_913_144_690_25,
    0.836_516_303_737_468_99,
    0.224_143_868_041_857_35,
    -0.129_409_522_550_921_45,
];

const DB3: [f64; 6] = [
    0.332_670_552_950_956_88,
    0.806_891_509_313_338_75,
    0.459_877_502_119_331_32,
    -0.135_011_020_010_390_84,
    -0.085_441_273_882_241_486,
    0.035_226_291_882_100_656,
];

const DB4: [f64; 8] = [
    0.230_377_813_308_855_23,
    0.714_846_570_552_541_53,
    0.630_880_767_929_590_36,
    -0.027_983_769_416_983_849,
    -0.187_034_811_718_881_14,
    0.030_841_381_835_986_965,
    0.032_883_011_666_982_945,
    -0.010_597_401_784_997_278,
];

/// Orthogonal wavelet family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wavelet {
    #[default]
    #[serde(rename = "haar", alias = "db1")]
    Haar,
    #[serde(rename = "db2")]
    Db2,
    #[serde(rename = "db3")]
    Db3,
    #[serde(rename = "db4")]
    Db4,
}

impl Wavelet {
    /// Orthonormal scaling (low-pass) filter.
    pub fn lowpass(&self) -> &'static [f64] {
        match self {
            Wavelet::Haar => &HAAR,
            Wavelet::Db2 => &DB2,
            Wavelet::Db3 => &DB3,
            Wavelet::Db4 => &DB4,
        }
    }

    /// Quadrature mirror of [`Wavelet::lowpass`].
    pub fn highpass(&self) -> Vec<f64> {
        let lo = self.lowpass();
        let len = lo.len();
        (0..len)
            .map(|j| {
                let v = lo[len - 1 - j];
                if j % 2 == 0 {
                    v
                } else {
                    -v
                }
            })
            .collect()
    }

    pub fn filter_len(&self) -> usize {
        self.lowpass().len()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Wavelet::Haar => "haar",
            Wavelet::Db2 => "db2",
            Wavelet::Db3 => "db3",
            Wavelet::Db4 => "db4",
        }
    }

    /// Deepest level an axis of `len` samples supports: every level needs an
    /// even extent that still spans the filter, capped at
    /// `floor(log2(len / (filter_len - 1)))`.
    pub fn max_level(&self, len: usize) -> usize {
        let flen = self.filter_len();
        let cap = ((len as f64) / (flen - 1) as f64).log2().floor().max(0.0) as usize;
        let mut level = 0;
        let mut n = len;
        while level < cap && n % 2 == 0 && n >= flen {
            n /= 2;
            level += 1;
        }
        level
    }
}

impl fmt::Display for Wavelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Wavelet {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "haar" | "db1" => Ok(Wavelet::Haar),
            "db2" => Ok(Wavelet::Db2),
            "db3" => Ok(Wavelet::Db3),
            "db4" => Ok(Wavelet::Db4),
            other => Err(NoiseError::invalid(
                "wavelet",
                format!("unsupported wavelet family `{other}`"),
            )),
        }
    }
}

/// Multi-level wavelet coefficients of an array.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveletPyramid {
    packed: ArrayD<f64>,
    axes: usize,
    levels: usize,
    wavelet: Wavelet,
}

impl WaveletPyramid {
    /// Deepest level shared by every transformed axis.
    pub fn max_level(dims: &[usize], wavelet: Wavelet) -> usize {
        dims.iter()
            .map(|&n| wavelet.max_level(n))
            .min()
            .unwrap_or(0)
    }

    /// Decomposes the last `axes` axes of `values`. `level = None` selects the
    /// deepest admissible level; deeper requests are rejected.
    pub fn decompose(
        values: &ArrayD<f64>,
        axes: usize,
        wavelet: Wavelet,
        level: Option<usize>,
    ) -> NoiseResult<Self> {
        let ndim = values.ndim();
        if axes == 0 || axes > ndim {
            return Err(NoiseError::shape_mismatch(format!(
                "cannot run a {axes}-axis wavelet transform on a rank-{ndim} array"
            )));
        }
        let first = ndim - axes;
        let dims = values.shape()[first..].to_vec();
        let max = Self::max_level(&dims, wavelet);
        let levels = level.unwrap_or(max);
        if levels > max {
            return Err(NoiseError::invalid(
                "level",
                format!("{wavelet} supports at most {max} levels over {dims:?}, got {levels}"),
            ));
        }

        let lo = wavelet.lowpass();
        let hi = wavelet.highpass();
        let mut packed = values.clone();
        for level in 0..levels {
            let extents: Vec<usize> = dims.iter().map(|&n| n >> level).collect();
            for axis in first..ndim {
                let mut block = packed.slice_each_axis_mut(|desc| {
                    let index = desc.axis.index();
                    if index >= first {
                        Slice::from(0..extents[index - first])
                    } else {
                        Slice::from(..)
                    }
                });
                let n = extents[axis - first];
                let mut buf = vec![0.0; n];
                for mut lane in block.lanes_mut(Axis(axis)) {
                    for (slot, v) in buf.iter_mut().zip(lane.iter()) {
                        *slot = *v;
                    }
                    let half = n / 2;
                    for k in 0..half {
                        let mut approx = 0.0;
                        let mut detail = 0.0;
                        for (j, (&l, &h)) in lo.iter().zip(hi.iter()).enumerate() {
                            let x = buf[(2 * k + j) % n];
                            approx += l * x;
                            detail += h * x;
                        }
                        lane[k] = approx;
                        lane[half + k] = detail;
                    }
                }
            }
        }

        Ok(Self {
            packed,
            axes,
            levels,
            wavelet,
        })
    }

    /// Inverts [`WaveletPyramid::decompose`].
    pub fn reconstruct(&self) -> ArrayD<f64> {
        let ndim = self.packed.ndim();
        let first = ndim - self.axes;
        let dims = self.packed.shape()[first..].to_vec();
        let lo = self.wavelet.lowpass();
        let hi = self.wavelet.highpass();
        let mut values = self.packed.clone();
        for level in (0..self.levels).rev() {
            let extents: Vec<usize> = dims.iter().map(|&n| n >> level).collect();
            for axis in (first..ndim).rev() {
                let mut block = values.slice_each_axis_mut(|desc| {
                    let index = desc.axis.index();
                    if index >= first {
                        Slice::from(0..extents[index - first])
                    } else {
                        Slice::from(..)
                    }
                });
                let n = extents[axis - first];
                let half = n / 2;
                let mut buf = vec![0.0; n];
                for mut lane in block.lanes_mut(Axis(axis)) {
                    buf.iter_mut().for_each(|v| *v = 0.0);
                    for k in 0..half {
                        let approx = lane[k];
                        let detail = lane[half + k];
                        for (j, (&l, &h)) in lo.iter().zip(hi.iter()).enumerate() {
                            buf[(2 * k + j) % n] += l * approx + h * detail;
                        }
                    }
                    for (dst, v) in lane.iter_mut().zip(buf.iter()) {
                        *dst = *v;
                    }
                }
            }
        }
        values
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn wavelet(&self) -> Wavelet {
        self.wavelet
    }

    /// Packed coefficient array.
    pub fn coefficients(&self) -> &ArrayD<f64> {
        &self.packed
    }

    /// Coarsest approximation band.
    pub fn approximation(&self) -> ArrayViewD<'_, f64> {
        let first = self.packed.ndim() - self.axes;
        let levels = self.levels;
        self.packed.slice_each_axis(|desc| {
            let index = desc.axis.index();
            if index >= first {
                Slice::from(0..desc.len >> levels)
            } else {
                Slice::from(..)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Dimension, IxDyn};

    fn sample(dims: &[usize]) -> ArrayD<f64> {
        ArrayD::from_shape_fn(IxDyn(dims), |ix| {
            let seed: usize = ix.slice().iter().enumerate().map(|(a, i)| (a + 3) * i * i).sum();
            ((seed % 17) as f64 - 8.0) * 0.25
        })
    }

    #[test]
    fn filters_are_orthonormal() {
        for wavelet in [Wavelet::Haar, Wavelet::Db2, Wavelet::Db3, Wavelet::Db4] {
            let lo = wavelet.lowpass();
            let hi = wavelet.highpass();
            assert_relative_eq!(lo.iter().map(|v| v * v).sum::<f64>(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(lo.iter().sum::<f64>(), 2f64.sqrt(), epsilon = 1e-9);
            let cross: f64 = lo.iter().zip(hi.iter()).map(|(a, b)| a * b).sum();
            assert_relative_eq!(cross, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn max_level_respects_even_extents() {
        assert_eq!(Wavelet::Haar.max_level(8), 3);
        assert_eq!(Wavelet::Haar.max_level(12), 2);
        assert_eq!(Wavelet::Db2.max_level(8), 1);
        assert_eq!(Wavelet::Db4.max_level(6), 0);
        assert_eq!(WaveletPyramid::max_level(&[16, 8], Wavelet::Haar), 3);
    }

    #[test]
    fn round_trip_recovers_input() {
        for wavelet in [Wavelet::Haar, Wavelet::Db2, Wavelet::Db3, Wavelet::Db4] {
            let x = sample(&[2, 3, 16, 32]);
            let pyramid = WaveletPyramid::decompose(&x, 2, wavelet, None).unwrap();
            assert!(pyramid.levels() >= 1);
            let y = pyramid.reconstruct();
            for (a, b) in x.iter().zip(y.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn round_trip_over_three_axes() {
        let x = sample(&[1, 2, 4, 8, 8]);
        let pyramid = WaveletPyramid::decompose(&x, 3, Wavelet::Haar, Some(2)).unwrap();
        assert_eq!(pyramid.approximation().shape(), &[1, 2, 1, 2, 2]);
        let y = pyramid.reconstruct();
        for (a, b) in x.iter().zip(y.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn haar_concentrates_constants_in_the_approximation() {
        let x = ArrayD::from_elem(IxDyn(&[1, 1, 4, 4]), 1.0);
        let pyramid = WaveletPyramid::decompose(&x, 2, Wavelet::Haar, None).unwrap();
        assert_eq!(pyramid.levels(), 2);
        let coeffs = pyramid.coefficients();
        assert_relative_eq!(coeffs[[0, 0, 0, 0]], 4.0, epsilon = 1e-12);
        let energy: f64 = coeffs.iter().skip(1).map(|v| v * v).sum();
        assert!(energy < 1e-20);
    }

    #[test]
    fn rejects_too_deep_levels() {
        let x = sample(&[1, 1, 8, 8]);
        assert!(matches!(
            WaveletPyramid::decompose(&x, 2, Wavelet::Haar, Some(4)),
            Err(NoiseError::InvalidParameter { name: "level", .. })
        ));
    }

    #[test]
    fn parses_family_names() {
        assert_eq!("db1".parse::<Wavelet>().unwrap(), Wavelet::Haar);
        assert_eq!("db4".parse::<Wavelet>().unwrap(), Wavelet::Db4);
        assert!("sym8".parse::<Wavelet>().is_err());
    }
}
