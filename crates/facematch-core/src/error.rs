use thiserror::Error;

/// Error taxonomy for one face comparison.
///
/// "No face detected" is deliberately absent — it is a valid outcome that
/// routes the comparison through the full-image fallback path, not a fault.
#[derive(Error, Debug)]
pub enum FaceMatchError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The detector faulted or timed out. Distinct from returning zero faces.
    #[error("face detection failed: {0}")]
    Detection(String),

    /// The padded crop rectangle collapsed to zero width or height.
    #[error("face region extraction failed: {0}")]
    Extraction(String),

    /// Feature vectors of different lengths or modes were paired. This is a
    /// defect guard: correct mode pairing can never trigger it.
    #[error("feature vectors are not comparable: {0}")]
    Comparison(String),
}

impl From<crate::detector::DetectError> for FaceMatchError {
    fn from(err: crate::detector::DetectError) -> Self {
        FaceMatchError::Detection(err.to_string())
    }
}
