use std::time::Duration;

use crate::types::DetectorOptions;

/// Tunables for one [`Verifier`](crate::verify::Verifier).
///
/// The calibration pairs (scale + threshold per mode) are empirical; they are
/// kept here rather than hardcoded so retuning against labeled data is a
/// config change.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Larger image dimension is reduced to stay near this bound (pixels).
    pub max_dimension: u32,
    /// Square side used for the full-image fallback resize (pixels).
    pub fallback_size: u32,
    /// Padding added around a detected face box, as a fraction of the box's
    /// larger side.
    pub region_padding: f32,
    /// Distance normalization scale for face-region comparisons.
    pub face_scale: f32,
    /// Distance normalization scale for full-image fallback comparisons.
    /// Smaller than `face_scale`: whole images differ more for reasons
    /// unrelated to identity, so distances saturate sooner.
    pub fallback_scale: f32,
    /// Match threshold (confidence %) for face-region comparisons.
    pub face_threshold: f32,
    /// Match threshold (confidence %) for fallback comparisons. Stricter,
    /// for the same reason `fallback_scale` is smaller.
    pub fallback_threshold: f32,
    /// Feature cache capacity (entries).
    pub cache_capacity: usize,
    /// Upper bound on one detector call.
    pub detect_timeout: Duration,
    pub detector_options: DetectorOptions,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1024,
            fallback_size: 300,
            region_padding: 0.3,
            face_scale: 5.0,
            fallback_scale: 3.5,
            face_threshold: 70.0,
            fallback_threshold: 85.0,
            cache_capacity: 8,
            detect_timeout: Duration::from_secs(10),
            detector_options: DetectorOptions::default(),
        }
    }
}
