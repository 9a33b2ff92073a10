use std::time::Duration;

use facematch_core::{DetectorOptions, PerformanceMode, VerifierConfig};

/// Build a [`VerifierConfig`] from `FACEMATCH_*` environment variables,
/// falling back to the library defaults for anything unset or unparseable.
pub fn from_env() -> VerifierConfig {
    let defaults = VerifierConfig::default();
    let default_options = DetectorOptions::default();

    let performance_mode = match std::env::var("FACEMATCH_PERFORMANCE_MODE") {
        Ok(v) if v.eq_ignore_ascii_case("accurate") => PerformanceMode::Accurate,
        Ok(v) if v.eq_ignore_ascii_case("fast") => PerformanceMode::Fast,
        _ => default_options.performance_mode,
    };

    VerifierConfig {
        max_dimension: env_u32("FACEMATCH_MAX_DIMENSION", defaults.max_dimension),
        fallback_size: env_u32("FACEMATCH_FALLBACK_SIZE", defaults.fallback_size),
        region_padding: env_f32("FACEMATCH_REGION_PADDING", defaults.region_padding),
        face_scale: env_f32("FACEMATCH_FACE_SCALE", defaults.face_scale),
        fallback_scale: env_f32("FACEMATCH_FALLBACK_SCALE", defaults.fallback_scale),
        face_threshold: env_f32("FACEMATCH_FACE_THRESHOLD", defaults.face_threshold),
        fallback_threshold: env_f32(
            "FACEMATCH_FALLBACK_THRESHOLD",
            defaults.fallback_threshold,
        ),
        cache_capacity: env_usize("FACEMATCH_CACHE_CAPACITY", defaults.cache_capacity),
        detect_timeout: Duration::from_secs(env_u64(
            "FACEMATCH_DETECT_TIMEOUT_SECS",
            defaults.detect_timeout.as_secs(),
        )),
        detector_options: DetectorOptions {
            performance_mode,
            min_face_fraction: env_f32(
                "FACEMATCH_MIN_FACE_FRACTION",
                default_options.min_face_fraction,
            ),
        },
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
