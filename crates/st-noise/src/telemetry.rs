// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.


//! Tracing hooks for noise synthesis: the one-time subscriber bootstrap and
//! the spans wrapped around generator and preparation calls.

use std::sync::OnceLock;

use st_noise_config::tracing::{self as config_tracing, InitError};
use tracing::{debug, debug_span, warn, Span};

use crate::shape::NoiseShape;

/// Who owns the global subscriber after [`init_tracing`] ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingState {
    /// The `SPIRAL_NOISE_LOG` subscriber from `st-noise-config` is active.
    Installed,
    /// A host subscriber was already in place and was left alone.
    External,
    /// Installation failed; events are dropped.
    Unavailable,
}

static STATE: OnceLock<TracingState> = OnceLock::new();

/// Installs the noise subscriber on first use and reports who owns the
/// global subscriber. Later calls return the recorded state.
pub fn init_tracing() -> TracingState {
    *STATE.get_or_init(|| match config_tracing::init_tracing() {
        Ok(()) => {
            debug!(filter_env = "SPIRAL_NOISE_LOG", "noise subscriber installed");
            TracingState::Installed
        }
        Err(InitError::AlreadyInitialised | InitError::Subscriber(_)) => TracingState::External,
        Err(err) => {
            warn!(error = %err, "noise subscriber unavailable");
            TracingState::Unavailable
        }
    })
}

/// State recorded by [`init_tracing`], if it has run.
pub fn tracing_state() -> Option<TracingState> {
    STATE.get().copied()
}

pub(crate) fn produce_span(generator: &str, shape: &NoiseShape, counter: u64) -> Span {
    debug_span!("noise.produce", generator, shape = %shape, counter)
}

pub(crate) fn prepare_span(noise_type: &str, seed: u64, shape: &NoiseShape) -> Span {
    debug_span!("noise.prepare", noise_type, seed, shape = %shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_recorded_once() {
        let first = init_tracing();
        assert_eq!(init_tracing(), first);
        assert_eq!(tracing_state(), Some(first));
        assert_ne!(first, TracingState::Unavailable);
    }

    #[test]
    fn spans_can_be_entered_without_a_subscriber() {
        let shape = NoiseShape::spatial(1, 4, 8, 8).unwrap();
        let _produce = produce_span("gaussian", &shape, 3).entered();
        let _prepare = prepare_span("pink", 42, &shape).entered();
    }
}
