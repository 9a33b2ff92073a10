//! facematch-core — face-region feature extraction and similarity scoring.
//!
//! Pipeline: load -> locate -> extract region -> extract features -> score
//! -> decide. Two images flow through independently and converge at the
//! scorer. Detection is pluggable via the [`FaceDetector`] trait; when no
//! face is found on either side, the comparison falls back to whole-image
//! features with a stricter match threshold.

pub mod cache;
pub mod config;
pub mod detector;
pub mod error;
pub mod features;
pub mod loader;
pub mod region;
pub mod scorer;
pub mod types;
pub mod verify;

pub use cache::{FeatureCache, RegionKey};
pub use config::VerifierConfig;
pub use detector::{FaceDetector, SkinBlobDetector, StubDetector};
pub use error::FaceMatchError;
pub use features::{FeatureVector, FEATURE_LEN};
pub use types::{
    BoundingBox, DetectorOptions, FeatureMode, PerformanceMode, VerificationResult,
};
pub use verify::Verifier;
