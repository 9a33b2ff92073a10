//! Region extraction: padded face crop, or full-image fallback.

use image::imageops::FilterType;
use image::RgbImage;

use crate::config::VerifierConfig;
use crate::error::FaceMatchError;
use crate::types::{BoundingBox, FeatureMode};

/// Extract the comparison region for one image.
///
/// With a box: pad it on all sides by `region_padding` of its larger side,
/// clip to the image bounds, and crop. Without a box: resize the whole image
/// to a `fallback_size` square. The returned grid is always an independent
/// buffer; the source can be dropped immediately after.
pub fn extract_region(
    grid: &RgbImage,
    face: Option<&BoundingBox>,
    config: &VerifierConfig,
) -> Result<(RgbImage, FeatureMode), FaceMatchError> {
    match face {
        Some(face) => Ok((crop_padded(grid, face, config.region_padding)?, FeatureMode::FaceRegion)),
        None => {
            let square = image::imageops::resize(
                grid,
                config.fallback_size,
                config.fallback_size,
                FilterType::Triangle,
            );
            Ok((square, FeatureMode::FullImage))
        }
    }
}

fn crop_padded(
    grid: &RgbImage,
    face: &BoundingBox,
    padding_fraction: f32,
) -> Result<RgbImage, FaceMatchError> {
    let padding = (face.width.max(face.height) as f32 * padding_fraction) as u32;

    let left = face.left.saturating_sub(padding);
    let top = face.top.saturating_sub(padding);
    let right = face
        .left
        .saturating_add(face.width)
        .saturating_add(padding)
        .min(grid.width());
    let bottom = face
        .top
        .saturating_add(face.height)
        .saturating_add(padding)
        .min(grid.height());

    if right <= left || bottom <= top {
        return Err(FaceMatchError::Extraction(format!(
            "padded box {face:?} clips to an empty region in {}x{}",
            grid.width(),
            grid.height()
        )));
    }

    tracing::debug!(
        left, top,
        width = right - left,
        height = bottom - top,
        "extracting face region"
    );
    Ok(image::imageops::crop_imm(grid, left, top, right - left, bottom - top).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn config() -> VerifierConfig {
        VerifierConfig::default()
    }

    #[test]
    fn crop_adds_30_percent_padding() {
        let grid = RgbImage::from_pixel(500, 500, Rgb([100, 100, 100]));
        let face = BoundingBox::new(200, 200, 100, 100);
        let (region, mode) = extract_region(&grid, Some(&face), &config()).unwrap();
        // padding = 30, so 100 + 2*30 on each axis
        assert_eq!((region.width(), region.height()), (160, 160));
        assert_eq!(mode, FeatureMode::FaceRegion);
    }

    #[test]
    fn crop_at_image_edge_clips_padding() {
        let grid = RgbImage::from_pixel(200, 200, Rgb([100, 100, 100]));
        // Box touching x=0, y=0: padding extends past the origin and must clip
        let face = BoundingBox::new(0, 0, 100, 100);
        let (region, _) = extract_region(&grid, Some(&face), &config()).unwrap();
        assert_eq!((region.width(), region.height()), (130, 130));
    }

    #[test]
    fn crop_at_far_edge_clips_to_bounds() {
        let grid = RgbImage::from_pixel(200, 200, Rgb([100, 100, 100]));
        let face = BoundingBox::new(150, 150, 50, 50);
        let (region, _) = extract_region(&grid, Some(&face), &config()).unwrap();
        // Left/top padded by 15, right/bottom clipped at 200
        assert_eq!((region.width(), region.height()), (65, 65));
    }

    #[test]
    fn degenerate_box_is_extraction_error() {
        let grid = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        // Entirely outside the grid: clipping collapses the rect
        let face = BoundingBox::new(100, 100, 0, 0);
        let err = extract_region(&grid, Some(&face), &config()).unwrap_err();
        assert!(matches!(err, FaceMatchError::Extraction(_)));
    }

    #[test]
    fn no_box_resizes_to_fallback_square() {
        let grid = RgbImage::from_pixel(640, 480, Rgb([50, 60, 70]));
        let (region, mode) = extract_region(&grid, None, &config()).unwrap();
        assert_eq!((region.width(), region.height()), (300, 300));
        assert_eq!(mode, FeatureMode::FullImage);
    }

    #[test]
    fn region_is_independent_buffer() {
        let mut grid = RgbImage::from_pixel(100, 100, Rgb([10, 10, 10]));
        let face = BoundingBox::new(20, 20, 40, 40);
        let (region, _) = extract_region(&grid, Some(&face), &config()).unwrap();
        let before = *region.get_pixel(0, 0);

        // Mutating the source must not affect the extracted region
        grid.put_pixel(20, 20, Rgb([255, 255, 255]));
        assert_eq!(*region.get_pixel(0, 0), before);
    }
}
