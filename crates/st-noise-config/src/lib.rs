// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Process-wide configuration for the SpiralTorch noise stack.
//!
//! [`runtime`] snapshots the `SPIRAL_NOISE_*` environment once per process and
//! [`tracing`] installs the global subscriber used by the noise generators.

pub mod runtime;
pub mod tracing;

pub use runtime::{config, configure, NoiseRuntimeConfig, PrecisionPolicy};
