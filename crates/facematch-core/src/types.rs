use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, in pixel coordinates of its source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self { left, top, width, height }
    }

    /// Box area in pixels. Used to pick the dominant face among candidates.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the box lies fully inside an image of the given dimensions.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.left.checked_add(self.width).is_some_and(|r| r <= image_width)
            && self.top.checked_add(self.height).is_some_and(|b| b <= image_height)
    }
}

/// Which extraction path produced a feature vector.
///
/// Vectors from different modes are never comparable: fallback vectors
/// describe whole images (background, clothing) while face-region vectors
/// describe a padded crop, and the two use different score calibrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureMode {
    /// Features computed over a padded face crop.
    FaceRegion,
    /// No face was found; features computed over a fixed-size resize of the
    /// whole image.
    FullImage,
}

/// Detector tuning handed to a [`FaceDetector`](crate::detector::FaceDetector)
/// backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorOptions {
    pub performance_mode: PerformanceMode,
    /// Smallest face worth reporting, as a fraction of the image's larger
    /// dimension.
    pub min_face_fraction: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            performance_mode: PerformanceMode::Fast,
            min_face_fraction: 0.1,
        }
    }
}

/// Speed/accuracy trade-off hint for detector backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceMode {
    Fast,
    Accurate,
}

/// Outcome of one face comparison, returned to the calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_match: bool,
    /// Similarity confidence, clamped to [0, 100].
    pub confidence: f32,
    pub message: String,
    /// True when either image went through the full-image fallback path.
    pub used_fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_area() {
        assert_eq!(BoundingBox::new(0, 0, 10, 20).area(), 200);
        assert_eq!(BoundingBox::new(5, 5, 0, 20).area(), 0);
    }

    #[test]
    fn bbox_fits_within_bounds() {
        let b = BoundingBox::new(10, 10, 30, 40);
        assert!(b.fits_within(40, 50));
        assert!(!b.fits_within(39, 50));
        assert!(!b.fits_within(40, 49));
    }

    #[test]
    fn bbox_zero_size_never_fits() {
        assert!(!BoundingBox::new(0, 0, 0, 10).fits_within(100, 100));
        assert!(!BoundingBox::new(0, 0, 10, 0).fits_within(100, 100));
    }

    #[test]
    fn bbox_overflow_does_not_panic() {
        let b = BoundingBox::new(u32::MAX, 0, 2, 2);
        assert!(!b.fits_within(u32::MAX, u32::MAX));
    }
}
