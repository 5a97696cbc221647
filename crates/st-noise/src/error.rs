// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use thiserror::Error;

/// Result alias used across the noise crate.
pub type NoiseResult<T> = Result<T, NoiseError>;

/// Errors emitted while configuring or running noise generators.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NoiseError {
    /// A generator without a synthesis routine was asked to produce a field.
    #[error("{generator} does not implement noise synthesis")]
    Unimplemented { generator: String },
    /// The algorithm cannot run on a field of the requested rank.
    #[error("{generator} does not support rank-{rank} fields")]
    Unsupported { generator: &'static str, rank: usize },
    /// Two shapes that must agree (grid vs output, blend operands, ...) do not.
    #[error("shape mismatch: {message}")]
    ShapeMismatch { message: String },
    /// Shape descriptors must hold 4 or 5 positive dimensions.
    #[error("invalid noise shape {dims:?}; expected 4 or 5 positive dimensions")]
    InvalidShape { dims: Vec<usize> },
    /// A parameter is outside its admissible domain or missing.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    /// The registry has no generator under this name.
    #[error("unknown noise type `{0}`")]
    UnknownNoiseType(String),
}

impl NoiseError {
    pub(crate) fn shape_mismatch(message: impl Into<String>) -> Self {
        NoiseError::ShapeMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        NoiseError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
