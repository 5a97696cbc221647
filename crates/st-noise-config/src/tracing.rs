// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();
static CHROME_GUARD: OnceLock<Mutex<Option<tracing_chrome::FlushGuard>>> = OnceLock::new();

/// Filter used when neither `SPIRAL_NOISE_LOG` nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "st_noise=info";

/// Configures the global tracing subscriber for noise synthesis.
///
/// The filter is taken from `SPIRAL_NOISE_LOG`, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`]. Setting `SPIRAL_NOISE_TRACE_CHROME` to a path adds a
/// Chrome trace layer whose flush guard lives until process exit.
pub fn init_tracing() -> Result<(), InitError> {
    INITIALISED
        .set(())
        .map_err(|_| InitError::AlreadyInitialised)?;

    let ansi = std::io::stderr().is_terminal();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(ansi);

    match chrome_trace_path()? {
        Some(path) => {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(path)
                .include_args(true)
                .build();
            let slot = CHROME_GUARD.get_or_init(|| Mutex::new(None));
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(guard);
            }
            Registry::default()
                .with(env_filter())
                .with(fmt_layer)
                .with(chrome_layer)
                .try_init()?;
        }
        None => {
            Registry::default()
                .with(env_filter())
                .with(fmt_layer)
                .try_init()?;
        }
    }

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("SPIRAL_NOISE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn chrome_trace_path() -> Result<Option<PathBuf>, InitError> {
    match std::env::var("SPIRAL_NOISE_TRACE_CHROME") {
        Ok(raw) if !raw.trim().is_empty() => Ok(Some(PathBuf::from(raw))),
        Ok(_) => Ok(None),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(InitError::Env(err)),
    }
}

/// Errors emitted when configuring the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("tracing has already been initialised")]
    AlreadyInitialised,
    #[error("failed to read SPIRAL_NOISE_TRACE_CHROME: {0}")]
    Env(std::env::VarError),
    #[error("another global subscriber is already installed: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
