//! Similarity scoring and the match decision policy.

use crate::config::VerifierConfig;
use crate::error::FaceMatchError;
use crate::features::FeatureVector;
use crate::types::{FeatureMode, VerificationResult};

/// Euclidean distance between two feature vectors of the same mode, mapped
/// to a confidence in [0, 100].
///
/// Pairing vectors of different modes or lengths is a hard error, never a
/// silent truncation: a truncated distance would quietly compare
/// incompatible layouts and mask the real defect upstream.
pub fn score(
    a: &FeatureVector,
    b: &FeatureVector,
    config: &VerifierConfig,
) -> Result<f32, FaceMatchError> {
    if a.mode != b.mode {
        return Err(FaceMatchError::Comparison(format!(
            "mode mismatch: {:?} vs {:?}",
            a.mode, b.mode
        )));
    }
    if a.len() != b.len() {
        return Err(FaceMatchError::Comparison(format!(
            "length mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let distance = euclidean_distance(&a.values, &b.values);
    let scale = match a.mode {
        FeatureMode::FaceRegion => config.face_scale,
        FeatureMode::FullImage => config.fallback_scale,
    };

    let normalized = (distance / scale).min(1.0);
    let confidence = ((1.0 - normalized) * 100.0).clamp(0.0, 100.0);

    tracing::debug!(distance, scale, confidence, mode = ?a.mode, "scored pair");
    Ok(confidence)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}

/// Apply the match policy: threshold by mode, fixed message templates.
pub fn decide(confidence: f32, used_fallback: bool, config: &VerifierConfig) -> VerificationResult {
    let threshold = if used_fallback {
        config.fallback_threshold
    } else {
        config.face_threshold
    };
    let is_match = confidence >= threshold;

    let suffix = if used_fallback { " (fallback mode)" } else { "" };
    let message = if is_match {
        format!("Face verified successfully!{suffix}")
    } else {
        format!("Face does not match. Confidence: {confidence:.1}%{suffix}")
    };

    VerificationResult {
        is_match,
        confidence,
        message,
        used_fallback,
    }
}
