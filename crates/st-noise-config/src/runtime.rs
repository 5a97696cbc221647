// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::sync::OnceLock;

/// Lower end of the SDXL noise schedule.
pub const SDXL_SIGMA_MIN: f64 = 0.029_167_5;
/// Upper end of the SDXL noise schedule.
pub const SDXL_SIGMA_MAX: f64 = 14.614_642;

/// Output precision applied by the preparation entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PrecisionPolicy {
    /// Keep whatever precision the reference latent declares.
    #[default]
    Inherit,
    /// Force half precision output.
    Fp16,
    /// Force single precision output.
    Fp32,
    /// Force double precision output.
    Fp64,
}

impl PrecisionPolicy {
    /// Parses the textual form used by `SPIRAL_NOISE_PRECISION`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "inherit" | "native" => Some(Self::Inherit),
            "fp16" | "f16" | "float16" | "half" => Some(Self::Fp16),
            "fp32" | "f32" | "float32" => Some(Self::Fp32),
            "fp64" | "f64" | "float64" => Some(Self::Fp64),
            _ => None,
        }
    }
}

/// Snapshot of the noise runtime knobs.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseRuntimeConfig {
    /// Sigma bound handed to schedule-aware generators.
    pub sigma_min: f64,
    /// Sigma bound handed to schedule-aware generators.
    pub sigma_max: f64,
    /// Output precision policy for prepared noise.
    pub precision: PrecisionPolicy,
    /// Seed used by builders that were not given one explicitly.
    pub default_seed: u64,
}

impl Default for NoiseRuntimeConfig {
    fn default() -> Self {
        Self {
            sigma_min: SDXL_SIGMA_MIN,
            sigma_max: SDXL_SIGMA_MAX,
            precision: PrecisionPolicy::Inherit,
            default_seed: 42,
        }
    }
}

impl NoiseRuntimeConfig {
    /// Builds a configuration snapshot from environment variables.
    fn from_env() -> Self {
        let defaults = Self::default();

        let sigma_min = read_f64("SPIRAL_NOISE_SIGMA_MIN").unwrap_or(defaults.sigma_min);
        let sigma_max = read_f64("SPIRAL_NOISE_SIGMA_MAX").unwrap_or(defaults.sigma_max);
        // inverted ranges fall back to the defaults
        let (sigma_min, sigma_max) = if sigma_min < sigma_max {
            (sigma_min, sigma_max)
        } else {
            (defaults.sigma_min, defaults.sigma_max)
        };

        let precision = std::env::var("SPIRAL_NOISE_PRECISION")
            .ok()
            .and_then(|v| PrecisionPolicy::parse(&v))
            .unwrap_or(defaults.precision);

        let default_seed = std::env::var("SPIRAL_NOISE_DEFAULT_SEED")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(defaults.default_seed);

        Self {
            sigma_min,
            sigma_max,
            precision,
            default_seed,
        }
    }
}

fn read_f64(key: &str) -> Option<f64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

static CONFIG: OnceLock<NoiseRuntimeConfig> = OnceLock::new();

/// Returns the lazily initialised runtime configuration.
pub fn config() -> &'static NoiseRuntimeConfig {
    CONFIG.get_or_init(NoiseRuntimeConfig::from_env)
}

/// Installs an explicit configuration. Only the first call (or the first
/// [`config`] read) wins; later calls return the active snapshot.
pub fn configure(cfg: NoiseRuntimeConfig) -> &'static NoiseRuntimeConfig {
    CONFIG.get_or_init(|| cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
    use std::sync::{Mutex, OnceLock};

    fn with_env(vars: &[(&str, Option<&str>)], test: impl FnOnce()) {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        let _lock = GUARD.get_or_init(|| Mutex::new(())).lock().unwrap();

        let snapshot: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                match value {
                    Some(val) => std::env::set_var(key, val),
                    None => std::env::remove_var(key),
                }
                ((*key).to_string(), previous)
            })
            .collect();

        let result = catch_unwind(AssertUnwindSafe(test));

        for (key, value) in snapshot {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }

        if let Err(err) = result {
            resume_unwind(err);
        }
    }

    #[test]
    fn defaults_use_sdxl_schedule() {
        with_env(
            &[
                ("SPIRAL_NOISE_SIGMA_MIN", None),
                ("SPIRAL_NOISE_SIGMA_MAX", None),
                ("SPIRAL_NOISE_PRECISION", None),
                ("SPIRAL_NOISE_DEFAULT_SEED", None),
            ],
            || {
                let cfg = NoiseRuntimeConfig::from_env();
                assert_eq!(cfg, NoiseRuntimeConfig::default());
                assert_eq!(cfg.sigma_min, SDXL_SIGMA_MIN);
                assert_eq!(cfg.sigma_max, SDXL_SIGMA_MAX);
            },
        );
    }

    #[test]
    fn environment_overrides_defaults() {
        with_env(
            &[
                ("SPIRAL_NOISE_SIGMA_MIN", Some("0.002")),
                ("SPIRAL_NOISE_SIGMA_MAX", Some("80.0")),
                ("SPIRAL_NOISE_PRECISION", Some("FP64")),
                ("SPIRAL_NOISE_DEFAULT_SEED", Some("1337")),
            ],
            || {
                let cfg = NoiseRuntimeConfig::from_env();
                assert_eq!(cfg.sigma_min, 0.002);
                assert_eq!(cfg.sigma_max, 80.0);
                assert_eq!(cfg.precision, PrecisionPolicy::Fp64);
                assert_eq!(cfg.default_seed, 1337);
            },
        );
    }

    #[test]
    fn inverted_sigma_range_falls_back() {
        with_env(
            &[
                ("SPIRAL_NOISE_SIGMA_MIN", Some("10.0")),
                ("SPIRAL_NOISE_SIGMA_MAX", Some("1.0")),
            ],
            || {
                let cfg = NoiseRuntimeConfig::from_env();
                assert_eq!(cfg.sigma_min, SDXL_SIGMA_MIN);
                assert_eq!(cfg.sigma_max, SDXL_SIGMA_MAX);
            },
        );
    }

    #[test]
    fn unknown_precision_keeps_default() {
        assert_eq!(PrecisionPolicy::parse("bf16"), None);
        assert_eq!(PrecisionPolicy::parse(" f32 "), Some(PrecisionPolicy::Fp32));
        assert_eq!(PrecisionPolicy::parse("FP16"), Some(PrecisionPolicy::Fp16));
        with_env(&[("SPIRAL_NOISE_PRECISION", Some("bf16"))], || {
            let cfg = NoiseRuntimeConfig::from_env();
            assert_eq!(cfg.precision, PrecisionPolicy::Inherit);
        });
    }
}
