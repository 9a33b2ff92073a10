//! The comparison pipeline: two images in, one verdict out.
//!
//! Each image runs load -> detect independently; the two sides join before
//! region extraction because the comparison mode (face-region vs full-image
//! fallback) must be decided jointly — if either image has no detectable
//! face, both sides fall back to full-image features so the scorer compares
//! like with like.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;

use crate::cache::{FeatureCache, RegionKey};
use crate::config::VerifierConfig;
use crate::detector::{largest_face, FaceDetector, SkinBlobDetector};
use crate::error::FaceMatchError;
use crate::features::{extract_features, FeatureVector};
use crate::loader::{bound_dimensions, load_image};
use crate::region::extract_region;
use crate::scorer::{decide, score};
use crate::types::{BoundingBox, FeatureMode, VerificationResult};

/// Face comparison engine. One instance owns its detector backend and a
/// feature cache scoped to the instance's lifetime — there is no global
/// state, so concurrent comparisons only share the cache lock.
pub struct Verifier {
    detector: Arc<dyn FaceDetector>,
    cache: Arc<FeatureCache>,
    config: Arc<VerifierConfig>,
}

impl Verifier {
    /// Verifier with the built-in heuristic detector and default calibration.
    pub fn new() -> Self {
        Self::with_detector(Arc::new(SkinBlobDetector), VerifierConfig::default())
    }

    /// Verifier with a custom detection backend.
    pub fn with_detector(detector: Arc<dyn FaceDetector>, config: VerifierConfig) -> Self {
        let cache = Arc::new(FeatureCache::new(config.cache_capacity));
        tracing::debug!(detector = detector.name(), "verifier created");
        Self {
            detector,
            cache,
            config: Arc::new(config),
        }
    }

    /// Compare two image files. The single entry point for path-based callers.
    pub async fn compare_paths(
        &self,
        path_a: &Path,
        path_b: &Path,
    ) -> Result<VerificationResult, FaceMatchError> {
        let (a, b) = tokio::try_join!(self.load(path_a), self.load(path_b))?;
        self.compare_images(a, b).await
    }

    /// Compare two already-decoded pixel grids.
    pub async fn compare_images(
        &self,
        grid_a: RgbImage,
        grid_b: RgbImage,
    ) -> Result<VerificationResult, FaceMatchError> {
        let grid_a = bound_dimensions(grid_a, self.config.max_dimension);
        let grid_b = bound_dimensions(grid_b, self.config.max_dimension);

        // Locate faces on both sides concurrently, then join: the fallback
        // decision needs both answers.
        let ((grid_a, face_a), (grid_b, face_b)) =
            tokio::try_join!(self.locate(grid_a), self.locate(grid_b))?;

        let used_fallback = face_a.is_none() || face_b.is_none();
        if used_fallback {
            tracing::info!(
                face_a = face_a.is_some(),
                face_b = face_b.is_some(),
                "no face on at least one side; falling back to full-image comparison"
            );
        }

        let (vec_a, vec_b) = tokio::try_join!(
            self.featurize(grid_a, if used_fallback { None } else { face_a }),
            self.featurize(grid_b, if used_fallback { None } else { face_b }),
        )?;

        debug_assert_eq!(vec_a.mode, vec_b.mode);
        let confidence = score(&vec_a, &vec_b, &self.config)?;
        let result = decide(confidence, used_fallback, &self.config);

        tracing::info!(
            is_match = result.is_match,
            confidence = result.confidence,
            used_fallback = result.used_fallback,
            "comparison complete"
        );
        Ok(result)
    }

    /// Decode one image off the async executor.
    async fn load(&self, path: &Path) -> Result<RgbImage, FaceMatchError> {
        let path: PathBuf = path.to_owned();
        let max_dimension = self.config.max_dimension;
        tokio::task::spawn_blocking(move || load_image(&path, max_dimension))
            .await
            .map_err(|e| FaceMatchError::Decode(format!("load task failed: {e}")))?
    }

    /// Run detection with a timeout and pick the dominant face.
    ///
    /// The grid travels through the blocking task and back so no copy is
    /// made; a timeout abandons the task's result and surfaces as a
    /// detection error, never as "no face".
    async fn locate(
        &self,
        grid: RgbImage,
    ) -> Result<(RgbImage, Option<BoundingBox>), FaceMatchError> {
        let detector = Arc::clone(&self.detector);
        let options = self.config.detector_options.clone();

        let task = tokio::task::spawn_blocking(move || {
            let faces = detector.detect(&grid, &options);
            (grid, faces)
        });

        let (grid, faces) = tokio::time::timeout(self.config.detect_timeout, task)
            .await
            .map_err(|_| {
                FaceMatchError::Detection(format!(
                    "detection timed out after {:?}",
                    self.config.detect_timeout
                ))
            })?
            .map_err(|e| FaceMatchError::Detection(format!("detection task failed: {e}")))?;

        let faces = faces?;
        let face = largest_face(&faces).cloned();
        tracing::debug!(candidates = faces.len(), selected = ?face, "detection done");
        Ok((grid, face))
    }

    /// Crop (or fall back), then compute features, consulting the cache.
    /// The grid is consumed here: buffers never outlive the comparison.
    async fn featurize(
        &self,
        grid: RgbImage,
        face: Option<BoundingBox>,
    ) -> Result<FeatureVector, FaceMatchError> {
        let cache = Arc::clone(&self.cache);
        let config = Arc::clone(&self.config);

        tokio::task::spawn_blocking(move || {
            let (region, mode) = extract_region(&grid, face.as_ref(), &config)?;
            drop(grid);

            let key = RegionKey::fingerprint(&region);
            if let Some(hit) = cache.get(&key) {
                if hit.mode == mode {
                    tracing::debug!("feature cache hit");
                    return Ok(hit);
                }
            }

            let vector = extract_features(&region, mode);
            cache.put(key, vector.clone());
            Ok(vector)
        })
        .await
        .map_err(|e| FaceMatchError::Extraction(format!("feature task failed: {e}")))?
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}
