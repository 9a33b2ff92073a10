//! Face location: a pluggable detection capability plus face selection.
//!
//! The pipeline is polymorphic over [`FaceDetector`] so any detection engine
//! (ONNX, a platform SDK, a remote service) can be plugged in. Two backends
//! ship with the crate: [`StubDetector`] for deterministic tests and
//! [`SkinBlobDetector`], a dependency-free heuristic default.

use image::RgbImage;
use thiserror::Error;

use crate::features::is_skin_tone;
use crate::types::{BoundingBox, DetectorOptions, PerformanceMode};

/// A detection fault. Returning zero faces is NOT an error — backends return
/// `Ok(vec![])` for "no face found" and reserve `Err` for actual failures.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("detector backend fault: {0}")]
    Backend(String),
}

/// Capability interface for face-detection backends.
pub trait FaceDetector: Send + Sync {
    /// Find candidate face regions in the grid. May be slow; the pipeline
    /// runs it off the async executor and bounds it with a timeout.
    fn detect(
        &self,
        grid: &RgbImage,
        options: &DetectorOptions,
    ) -> Result<Vec<BoundingBox>, DetectError>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Select the dominant face: largest box area, ties broken by first seen.
pub fn largest_face(faces: &[BoundingBox]) -> Option<&BoundingBox> {
    let mut best: Option<&BoundingBox> = None;
    for face in faces {
        match best {
            Some(b) if face.area() <= b.area() => {}
            _ => best = Some(face),
        }
    }
    best
}

/// Deterministic test backend returning a fixed answer.
pub struct StubDetector {
    faces: Vec<BoundingBox>,
    fail: bool,
}

impl StubDetector {
    /// A stub that reports the given faces in every image.
    pub fn with_faces(faces: Vec<BoundingBox>) -> Self {
        Self { faces, fail: false }
    }

    /// A stub that never finds a face.
    pub fn finding_nothing() -> Self {
        Self { faces: Vec::new(), fail: false }
    }

    /// A stub that faults on every call.
    pub fn failing() -> Self {
        Self { faces: Vec::new(), fail: true }
    }
}

impl FaceDetector for StubDetector {
    fn detect(
        &self,
        _grid: &RgbImage,
        _options: &DetectorOptions,
    ) -> Result<Vec<BoundingBox>, DetectError> {
        if self.fail {
            return Err(DetectError::Backend("stub detector failure".into()));
        }
        Ok(self.faces.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Heuristic skin-blob backend: the bounding box of skin-classified pixels.
///
/// Not a real face detector — it reports the dominant skin region, which for
/// portrait-style photos is a usable face candidate. It exists so the crate
/// works end to end without an ML runtime; production callers plug in a
/// proper backend via [`FaceDetector`].
#[derive(Default)]
pub struct SkinBlobDetector;

/// Minimum skin coverage (fraction of sampled pixels) for a blob to count as
/// a face candidate at all.
const MIN_SKIN_COVERAGE: f32 = 0.02;

impl FaceDetector for SkinBlobDetector {
    fn detect(
        &self,
        grid: &RgbImage,
        options: &DetectorOptions,
    ) -> Result<Vec<BoundingBox>, DetectError> {
        let (w, h) = (grid.width(), grid.height());
        if w == 0 || h == 0 {
            return Ok(Vec::new());
        }

        // Fast mode subsamples; accurate mode visits every pixel. The stride
        // depends only on dimensions, so results are reproducible.
        let stride = match options.performance_mode {
            PerformanceMode::Fast => (w.max(h) / 256).max(1),
            PerformanceMode::Accurate => 1,
        };

        let mut min_x = w;
        let mut min_y = h;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        let mut skin = 0u64;
        let mut sampled = 0u64;

        let mut y = 0;
        while y < h {
            let mut x = 0;
            while x < w {
                let p = grid.get_pixel(x, y).0;
                sampled += 1;
                if is_skin_tone(p[0], p[1], p[2]) {
                    skin += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
                x += stride;
            }
            y += stride;
        }

        let coverage = skin as f32 / sampled as f32;
        if coverage < MIN_SKIN_COVERAGE || max_x < min_x || max_y < min_y {
            tracing::debug!(coverage, "no skin blob found");
            return Ok(Vec::new());
        }

        let blob = BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);

        // Too small a blob relative to the image is noise, not a face.
        let min_side = (w.max(h) as f32 * options.min_face_fraction) as u32;
        if blob.width.max(blob.height) < min_side {
            tracing::debug!(?blob, min_side, "skin blob below minimum face size");
            return Ok(Vec::new());
        }

        tracing::debug!(?blob, coverage, "skin blob detected");
        Ok(vec![blob])
    }

    fn name(&self) -> &'static str {
        "skin-blob"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const SKIN: Rgb<u8> = Rgb([200, 150, 120]);

    #[test]
    fn largest_face_picks_biggest_area() {
        let faces = vec![
            BoundingBox::new(0, 0, 10, 10),
            BoundingBox::new(5, 5, 30, 20),
            BoundingBox::new(2, 2, 15, 15),
        ];
        assert_eq!(largest_face(&faces), Some(&faces[1]));
    }

    #[test]
    fn largest_face_tie_keeps_first() {
        let faces = vec![
            BoundingBox::new(0, 0, 10, 10),
            BoundingBox::new(50, 50, 10, 10),
        ];
        assert_eq!(largest_face(&faces), Some(&faces[0]));
    }

    #[test]
    fn largest_face_empty_is_none() {
        assert!(largest_face(&[]).is_none());
    }

    #[test]
    fn stub_detector_reports_configured_faces() {
        let face = BoundingBox::new(10, 10, 40, 40);
        let stub = StubDetector::with_faces(vec![face.clone()]);
        let grid = RgbImage::new(100, 100);
        let found = stub.detect(&grid, &DetectorOptions::default()).unwrap();
        assert_eq!(found, vec![face]);
    }

    #[test]
    fn stub_detector_failure_is_backend_error() {
        let stub = StubDetector::failing();
        let grid = RgbImage::new(10, 10);
        assert!(stub.detect(&grid, &DetectorOptions::default()).is_err());
    }

    #[test]
    fn skin_blob_finds_skin_patch() {
        // Dark background with a skin-toned square in the middle
        let mut grid = RgbImage::from_pixel(200, 200, Rgb([20, 20, 60]));
        for y in 60..140 {
            for x in 50..150 {
                grid.put_pixel(x, y, SKIN);
            }
        }
        let found = SkinBlobDetector
            .detect(&grid, &DetectorOptions::default())
            .unwrap();
        assert_eq!(found.len(), 1);
        let blob = &found[0];
        assert!(blob.left >= 48 && blob.left <= 52, "left={}", blob.left);
        assert!(blob.top >= 58 && blob.top <= 62, "top={}", blob.top);
        assert!(blob.fits_within(200, 200));
    }

    #[test]
    fn skin_blob_ignores_skinless_image() {
        let grid = RgbImage::from_pixel(100, 100, Rgb([0, 0, 255]));
        let found = SkinBlobDetector
            .detect(&grid, &DetectorOptions::default())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn skin_blob_rejects_tiny_blob() {
        // 4x4 skin speck in a 400x400 image is under the 10% minimum
        let mut grid = RgbImage::from_pixel(400, 400, Rgb([20, 20, 60]));
        for y in 100..104 {
            for x in 100..104 {
                grid.put_pixel(x, y, SKIN);
            }
        }
        let found = SkinBlobDetector
            .detect(&grid, &DetectorOptions::default())
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn skin_blob_deterministic_across_runs() {
        let mut grid = RgbImage::from_pixel(300, 300, Rgb([10, 10, 10]));
        for y in 80..220 {
            for x in 90..210 {
                grid.put_pixel(x, y, SKIN);
            }
        }
        let opts = DetectorOptions::default();
        let a = SkinBlobDetector.detect(&grid, &opts).unwrap();
        let b = SkinBlobDetector.detect(&grid, &opts).unwrap();
        assert_eq!(a, b);
    }
}
