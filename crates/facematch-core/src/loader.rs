//! Image loading: decode, EXIF orientation, bounded downsample.
//!
//! Everything downstream (detection, cropping, feature extraction) assumes a
//! right-side-up image whose larger dimension is bounded, so orientation and
//! downsampling both happen here, before any face location.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::error::FaceMatchError;

/// Load an image file into an RGB pixel grid.
///
/// The returned grid has EXIF orientation applied and its larger dimension
/// reduced by an integer factor so it stays at or just above `max_dimension`.
pub fn load_image(path: &Path, max_dimension: u32) -> Result<RgbImage, FaceMatchError> {
    let bytes = std::fs::read(path)
        .map_err(|_| FaceMatchError::NotFound(path.display().to_string()))?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| FaceMatchError::Decode(format!("{}: {e}", path.display())))?;

    let orientation = read_exif_orientation(&bytes);
    let oriented = apply_orientation(decoded, orientation);

    let grid = bound_dimensions(oriented.to_rgb8(), max_dimension);
    tracing::debug!(
        path = %path.display(),
        orientation,
        width = grid.width(),
        height = grid.height(),
        "image loaded"
    );
    Ok(grid)
}

/// Read EXIF orientation (tag 0x0112) from raw file bytes.
/// Returns 1 (normal) when there is no EXIF data or no orientation tag.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply an EXIF orientation transform.
///
/// Values: 1 = normal, 2 = mirrored, 3 = 180°, 4 = flipped vertically,
/// 5 = mirrored + 90° CW, 6 = 90° CW, 7 = mirrored + 270° CW, 8 = 270° CW.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        1 => img,
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Downsample a grid whose larger dimension exceeds `max_dimension`.
///
/// The reduction factor is the largest integer that keeps the scaled larger
/// dimension at or above `max_dimension`, matching what a decoder's
/// sample-size hint would do. Images already within bounds pass through
/// untouched.
pub fn bound_dimensions(grid: RgbImage, max_dimension: u32) -> RgbImage {
    let largest = grid.width().max(grid.height());
    if max_dimension == 0 || largest <= max_dimension {
        return grid;
    }

    let factor = largest / max_dimension;
    debug_assert!(factor >= 1);
    let new_w = (grid.width() / factor).max(1);
    let new_h = (grid.height() / factor).max(1);

    tracing::debug!(
        from = format!("{}x{}", grid.width(), grid.height()),
        to = format!("{new_w}x{new_h}"),
        factor,
        "downsampling oversized image"
    );
    image::imageops::resize(&grid, new_w, new_h, FilterType::Triangle)
}
