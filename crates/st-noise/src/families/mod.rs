// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Synthesis routines grouped by family. Every routine draws from the
//! generator core's random context and returns raw values shaped like the
//! core's field; quantisation happens in the generator.

pub(crate) mod fractal;
pub(crate) mod gaussian;
pub(crate) mod heavy_tail;
pub(crate) mod pyramid;
pub(crate) mod structured;
