// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Noise fields: dense `f64` arrays bound to a [`FieldSpec`].
//!
//! Synthesis always runs in double precision on the host; the declared
//! precision is applied once when a generator hands the field back.

use ndarray::{concatenate, ArrayD, ArrayViewD, Axis};

use crate::error::{NoiseError, NoiseResult};
use crate::shape::{Device, FieldSpec, NoiseShape, Precision};

/// Dense noise tensor with its shape/device/precision descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseField {
    values: ArrayD<f64>,
    spec: FieldSpec,
}

impl NoiseField {
    /// Binds `values` to `spec`. The array dimensions must match the shape.
    pub fn new(values: ArrayD<f64>, spec: FieldSpec) -> NoiseResult<Self> {
        let dims = spec.shape.dims();
        if values.shape() != dims.as_slice() {
            return Err(NoiseError::shape_mismatch(format!(
                "array {:?} does not match field shape {}",
                values.shape(),
                spec.shape
            )));
        }
        Ok(Self { values, spec })
    }


    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn shape(&self) -> &NoiseShape {
        &self.spec.shape
    }

    pub fn device(&self) -> Device {
        self.spec.device
    }

    pub fn precision(&self) -> Precision {
        self.spec.precision
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn into_values(self) -> ArrayD<f64> {
        self.values
    }


    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        mean(&self.values.view())
    }

    /// Unbiased (`n - 1`) standard deviation over every element.
    pub fn std(&self) -> f64 {
        std_unbiased(&self.values.view())
    }

    pub fn item_mean(&self, index: usize) -> NoiseResult<f64> {
        Ok(mean(&self.item_view(index)?))
    }

    /// Unbiased standard deviation of one batch item.
    pub fn item_std(&self, index: usize) -> NoiseResult<f64> {
        Ok(std_unbiased(&self.item_view(index)?))
    }

    fn item_view(&self, index: usize) -> NoiseResult<ArrayViewD<'_, f64>> {
        if index >= self.spec.shape.batch() {
            return Err(NoiseError::shape_mismatch(format!(
                "batch index {index} out of range for shape {}",
                self.spec.shape
            )));
        }
        Ok(self.values.index_axis(Axis(0), index))
    }

    /// Batch item `index` as a batch-1 field.
    pub fn item(&self, index: usize) -> NoiseResult<NoiseField> {
        self.item_view(index)?;
        let values = self
            .values
            .slice_axis(Axis(0), (index..index + 1).into())
            .to_owned();
        let spec = self.spec.with_shape(self.spec.shape.with_batch(1)?);
        Ok(Self { values, spec })
    }

    /// Concatenates fields along the batch axis. Every part must share the
    /// non-batch dimensions; the first part's device/precision is kept.
    pub fn concat_batch(parts: &[NoiseField]) -> NoiseResult<NoiseField> {
        let first = parts
            .first()
            .ok_or_else(|| NoiseError::invalid("parts", "cannot concatenate an empty list"))?;
        let tail = &first.spec.shape.dims()[1..];
        for part in parts {
            if &part.spec.shape.dims()[1..] != tail {
                return Err(NoiseError::shape_mismatch(format!(
                    "cannot concatenate {} with {}",
                    first.spec.shape, part.spec.shape
                )));
            }
        }
        let views: Vec<_> = parts.iter().map(|p| p.values.view()).collect();
        let values = concatenate(Axis(0), &views)
            .map_err(|err| NoiseError::shape_mismatch(err.to_string()))?;
        let batch = parts.iter().map(|p| p.spec.shape.batch()).sum();
        let spec = first.spec.with_shape(first.spec.shape.with_batch(batch)?);
        Ok(Self { values, spec })
    }

    /// Moves the field descriptor to another device.
    pub fn to_device(mut self, device: Device) -> Self {
        self.spec.device = device;
        self
    }

    /// Rounds every element to `precision` and records it.
    pub fn quantized(mut self, precision: Precision) -> Self {
        if precision != Precision::F64 {
            self.values.mapv_inplace(|v| precision.quantize(v));
        }
        self.spec.precision = precision;
        self
    }
}

pub(crate) fn mean(values: &ArrayViewD<'_, f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sum() / values.len() as f64
}

pub(crate) fn std_unbiased(values: &ArrayViewD<'_, f64>) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let ss = values.fold(0.0, |acc, &v| acc + (v - mu) * (v - mu));
    (ss / (n - 1) as f64).sqrt()
}

/// `x / std(x)`. Degenerate (constant) arrays are returned untouched.
pub(crate) fn rescale_std(mut values: ArrayD<f64>) -> ArrayD<f64> {
    let sd = std_unbiased(&values.view());
    if sd > 0.0 && sd.is_finite() {
        values.mapv_inplace(|v| v / sd);
    }
    values
}

/// `(x - mean(x)) / std(x)`. Constant arrays come back centred.
pub(crate) fn standardize(mut values: ArrayD<f64>) -> ArrayD<f64> {
    let mu = mean(&values.view());
    let sd = std_unbiased(&values.view());
    if sd > 0.0 && sd.is_finite() {
        values.mapv_inplace(|v| (v - mu) / sd);
    } else {
        values.mapv_inplace(|v| v - mu);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array, IxDyn};

    fn ramp(dims: &[usize]) -> NoiseField {
        let spec = FieldSpec::from_dims(dims).unwrap();
        let n: usize = dims.iter().product();
        let values = Array::from_iter((0..n).map(|v| v as f64))
            .into_shape(IxDyn(dims))
            .unwrap();
        NoiseField::new(values, spec).unwrap()
    }

    #[test]
    fn rejects_mismatched_arrays() {
        let spec = FieldSpec::from_dims(&[1, 1, 2, 2]).unwrap();
        let err = NoiseField::new(ArrayD::zeros(IxDyn(&[1, 1, 2, 3])), spec).unwrap_err();
        assert!(matches!(err, NoiseError::ShapeMismatch { .. }));
    }

    #[test]
    fn standardize_yields_unit_statistics() {
        let values = standardize(ramp(&[2, 2, 4, 4]).into_values());
        assert_relative_eq!(mean(&values.view()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(std_unbiased(&values.view()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_fields_do_not_produce_nan() {
        let values = ArrayD::from_elem(IxDyn(&[1, 1, 2, 2]), 3.0);
        assert!(standardize(values.clone()).iter().all(|v| *v == 0.0));
        assert!(rescale_std(values).iter().all(|v| *v == 3.0));
    }

    #[test]
    fn item_and_concat_round_batch_axis() {
        let field = ramp(&[3, 1, 2, 2]);
        let middle = field.item(1).unwrap();
        assert_eq!(middle.shape().dims(), vec![1, 1, 2, 2]);
        assert_eq!(middle.values()[[0, 0, 0, 0]], 4.0);

        let joined = NoiseField::concat_batch(&[middle.clone(), field.item(0).unwrap()]).unwrap();
        assert_eq!(joined.shape().batch(), 2);
        assert_eq!(joined.item(0).unwrap(), middle);
        assert!(field.item(3).is_err());
    }

    #[test]
    fn concat_rejects_mismatched_tails() {
        let a = ramp(&[1, 1, 2, 2]);
        let b = ramp(&[1, 2, 2, 2]);
        assert!(matches!(
            NoiseField::concat_batch(&[a, b]),
            Err(NoiseError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn quantization_records_precision() {
        let field = ramp(&[1, 1, 1, 2]).quantized(Precision::F64);
        assert_eq!(field.precision(), Precision::F64);
        let single = field.quantized(Precision::F32);
        assert_eq!(single.precision(), Precision::F32);
        // 2049 is the first integer binary16 cannot hold
        let wide = ramp(&[1, 1, 1, 2050]).quantized(Precision::F16);
        assert_eq!(wide.precision(), Precision::F16);
        assert_eq!(wide.values()[[0, 0, 0, 2048]], 2048.0);
        assert_eq!(wide.values()[[0, 0, 0, 2049]], 2048.0);
    }
}
