// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Shape, device, precision, and layout descriptors for noise fields.

use core::fmt;

use half::f16;
use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, NoiseResult};

/// Batch of images `(B, C, H, W)` or clips `(B, C, T, H, W)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseShape {
    Spatial {
        batch: usize,
        channels: usize,
        height: usize,
        width: usize,
    },
    Spatiotemporal {
        batch: usize,
        channels: usize,
        frames: usize,
        height: usize,
        width: usize,
    },
}

impl NoiseShape {
    /// Image shape `(B, C, H, W)`.
    pub fn spatial(batch: usize, channels: usize, height: usize, width: usize) -> NoiseResult<Self> {
        Self::from_dims(&[batch, channels, height, width])
    }

    /// Clip shape `(B, C, T, H, W)`.
    pub fn spatiotemporal(
        batch: usize,
        channels: usize,
        frames: usize,
        height: usize,
        width: usize,
    ) -> NoiseResult<Self> {
        Self::from_dims(&[batch, channels, frames, height, width])
    }

    /// Parses a dimension list. Only rank 4 and rank 5 are accepted and every
    /// axis must be non-empty.
    pub fn from_dims(dims: &[usize]) -> NoiseResult<Self> {
        if dims.iter().any(|&d| d == 0) {
            return Err(NoiseError::InvalidShape {
                dims: dims.to_vec(),
            });
        }
        match *dims {
            [batch, channels, height, width] => Ok(NoiseShape::Spatial {
                batch,
                channels,
                height,
                width,
            }),
            [batch, channels, frames, height, width] => Ok(NoiseShape::Spatiotemporal {
                batch,
                channels,
                frames,
                height,
                width,
            }),
            _ => Err(NoiseError::InvalidShape {
                dims: dims.to_vec(),
            }),
        }
    }

    /// Dimensions in row-major order.
    pub fn dims(&self) -> Vec<usize> {
        match *self {
            NoiseShape::Spatial {
                batch,
                channels,
                height,
                width,
            } => vec![batch, channels, height, width],
            NoiseShape::Spatiotemporal {
                batch,
                channels,
                frames,
                height,
                width,
            } => vec![batch, channels, frames, height, width],
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            NoiseShape::Spatial { .. } => 4,
            NoiseShape::Spatiotemporal { .. } => 5,
        }
    }

    pub fn is_spatiotemporal(&self) -> bool {
        matches!(self, NoiseShape::Spatiotemporal { .. })
    }

    pub fn batch(&self) -> usize {
        match *self {
            NoiseShape::Spatial { batch, .. } | NoiseShape::Spatiotemporal { batch, .. } => batch,
        }
    }

    pub fn channels(&self) -> usize {
        match *self {
            NoiseShape::Spatial { channels, .. }
            | NoiseShape::Spatiotemporal { channels, .. } => channels,
        }
    }

    /// Number of frames; `1` for image shapes.
    pub fn frames(&self) -> usize {
        match *self {
            NoiseShape::Spatial { .. } => 1,
            NoiseShape::Spatiotemporal { frames, .. } => frames,
        }
    }

    pub fn height(&self) -> usize {
        match *self {
            NoiseShape::Spatial { height, .. } | NoiseShape::Spatiotemporal { height, .. } => {
                height
            }
        }
    }

    pub fn width(&self) -> usize {
        match *self {
            NoiseShape::Spatial { width, .. } | NoiseShape::Spatiotemporal { width, .. } => width,
        }
    }

    /// Trailing axes that carry spatial (and temporal) structure: `[H, W]` or
    /// `[T, H, W]`.
    pub fn field_dims(&self) -> Vec<usize> {
        let dims = self.dims();
        dims[2..].to_vec()
    }

    /// Number of trailing structured axes (2 or 3).
    pub fn field_rank(&self) -> usize {
        self.rank() - 2
    }

    /// Same shape with a different leading batch size.
    pub fn with_batch(&self, batch: usize) -> NoiseResult<Self> {
        let mut dims = self.dims();
        dims[0] = batch;
        Self::from_dims(&dims)
    }


}

impl fmt::Display for NoiseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self
            .dims()
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("x");
        f.write_str(&dims)
    }
}

/// Where the host expects the field to live. Synthesis itself always runs on
/// the host CPU; the descriptor travels with the field so the caller can upload
/// it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    #[default]
    Cpu,
    Cuda(usize),
    Mps,
}

impl Device {
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
            Device::Mps => f.write_str("mps"),
        }
    }
}

/// Floating-point precision of the produced field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    F16,
    #[default]
    F32,
    F64,
}

impl Precision {
    /// Rounds a working value to this precision.
    #[inline]
    pub fn quantize(self, value: f64) -> f64 {
        match self {
            Precision::F16 => f16::from_f64(value).to_f64(),
            Precision::F32 => value as f32 as f64,
            Precision::F64 => value,
        }
    }
}

/// Memory layout of the produced field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Layout {
    #[default]
    Strided,
}

/// Complete description of a field: shape plus device/precision/layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSpec {
    pub shape: NoiseShape,
    pub precision: Precision,
    pub device: Device,
    pub layout: Layout,
}

impl FieldSpec {
    /// Host-resident single precision field of the given shape.
    pub fn new(shape: NoiseShape) -> Self {
        Self {
            shape,
            precision: Precision::default(),
            device: Device::default(),
            layout: Layout::default(),
        }
    }

    /// Convenience constructor from raw dimensions.
    pub fn from_dims(dims: &[usize]) -> NoiseResult<Self> {
        Ok(Self::new(NoiseShape::from_dims(dims)?))
    }

    pub fn with_shape(mut self, shape: NoiseShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_image_and_clip_shapes() {
        let image = NoiseShape::from_dims(&[2, 4, 8, 16]).unwrap();
        assert_eq!(image.rank(), 4);
        assert_eq!(image.field_dims(), vec![8, 16]);
        assert_eq!(image.frames(), 1);

        let clip = NoiseShape::from_dims(&[1, 4, 3, 8, 8]).unwrap();
        assert!(clip.is_spatiotemporal());
        assert_eq!(clip.field_dims(), vec![3, 8, 8]);
        assert_eq!(clip.to_string(), "1x4x3x8x8");
    }

    #[test]
    fn rejects_bad_rank_and_empty_axes() {
        assert!(matches!(
            NoiseShape::from_dims(&[4, 8, 8]),
            Err(NoiseError::InvalidShape { .. })
        ));
        assert!(matches!(
            NoiseShape::from_dims(&[1, 0, 8, 8]),
            Err(NoiseError::InvalidShape { .. })
        ));
    }

    #[test]
    fn rebatching_keeps_structure() {
        let clip = NoiseShape::spatiotemporal(3, 4, 2, 8, 8).unwrap();
        let single = clip.with_batch(1).unwrap();
        assert_eq!(single.dims(), vec![1, 4, 2, 8, 8]);
        assert!(clip.with_batch(0).is_err());
    }

    #[test]
    fn precision_quantizes_to_single() {
        let value = 0.1_f64;
        assert_eq!(Precision::F64.quantize(value), value);
        assert_eq!(Precision::F32.quantize(value), 0.1_f32 as f64);
        // 0.1 rounds to 0.0999755859375 in binary16
        assert_eq!(Precision::F16.quantize(value), 0.099_975_585_937_5);
        assert_eq!(Precision::F16.quantize(1.0), 1.0);
        assert!(Precision::F16.quantize(1e6).is_infinite());
    }
}
