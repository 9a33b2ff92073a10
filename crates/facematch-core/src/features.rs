//! Feature extraction: a fixed-length numeric signature of one region.
//!
//! The vector concatenates five sub-vectors, always in this order:
//!
//! | section            | length | offset |
//! |--------------------|--------|--------|
//! | skin-tone stats    | 7      | 0      |
//! | 4x4 spatial grid   | 48     | 7      |
//! | 16-bin RGB histogram | 48   | 55     |
//! | 4-bit texture patterns | 16 | 103    |
//! | edge magnitude bins | 16    | 119    |
//!
//! Total 135 values, all in [0, 1]. Extraction is fully deterministic:
//! the sampling stride is a pure function of the region's dimensions, and
//! there is no randomness anywhere, so identical regions always produce
//! bit-identical vectors.

use image::RgbImage;

use crate::types::FeatureMode;

/// Skin-tone section: mean R/G/B, stddev R/G/B, skin-pixel fraction.
pub const SKIN_LEN: usize = 7;
/// Spatial grid is `SPATIAL_GRID` x `SPATIAL_GRID` cells, 3 channels each.
pub const SPATIAL_GRID: usize = 4;
pub const SPATIAL_LEN: usize = SPATIAL_GRID * SPATIAL_GRID * 3;
/// Color histogram bins per channel (equal-width over 0..=255).
pub const HIST_BINS: usize = 16;
pub const HIST_LEN: usize = HIST_BINS * 3;
/// Texture patterns: 4 neighbor comparisons form a 4-bit code.
pub const TEXTURE_LEN: usize = 16;
/// Edge magnitude histogram bins.
pub const EDGE_LEN: usize = 16;

pub const SPATIAL_OFFSET: usize = SKIN_LEN;
pub const HIST_OFFSET: usize = SPATIAL_OFFSET + SPATIAL_LEN;
pub const TEXTURE_OFFSET: usize = HIST_OFFSET + HIST_LEN;
pub const EDGE_OFFSET: usize = TEXTURE_OFFSET + TEXTURE_LEN;

/// Total vector length, identical for both modes.
pub const FEATURE_LEN: usize = EDGE_OFFSET + EDGE_LEN;

/// A fixed-length feature vector tagged with the mode that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub mode: FeatureMode,
    pub values: Vec<f32>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Fixed skin classification rule (RGB space).
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i16, g as i16, b as i16);
    r > 95
        && g > 40
        && b > 20
        && r > g
        && r > b
        && (r - g).abs() > 15
        && r - g.min(b) > 15
}

/// Grayscale value via the fixed luma weights.
fn grayscale(p: &[u8; 3]) -> f32 {
    0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32
}

/// Sampling stride for a region of the given dimensions. Deterministic:
/// depends only on the dimensions, never on content or randomness.
fn sample_stride(width: u32, height: u32) -> u32 {
    (width.max(height) / 256).max(1)
}

/// Compute the full feature vector for a region.
pub fn extract_features(region: &RgbImage, mode: FeatureMode) -> FeatureVector {
    let mut values = vec![0.0f32; FEATURE_LEN];

    skin_tone_stats(region, &mut values[..SKIN_LEN]);
    spatial_color_grid(region, &mut values[SPATIAL_OFFSET..HIST_OFFSET]);
    color_histogram(region, &mut values[HIST_OFFSET..TEXTURE_OFFSET]);
    texture_patterns(region, &mut values[TEXTURE_OFFSET..EDGE_OFFSET]);
    edge_histogram(region, &mut values[EDGE_OFFSET..]);

    FeatureVector { mode, values }
}

/// Per-channel mean and stddev over skin-classified pixels, plus the skin
/// fraction of all sampled pixels. All zeros when no pixel classifies as skin.
fn skin_tone_stats(region: &RgbImage, out: &mut [f32]) {
    let (w, h) = (region.width(), region.height());
    if w == 0 || h == 0 {
        return;
    }
    let stride = sample_stride(w, h);

    let mut sum = [0.0f64; 3];
    let mut sum_sq = [0.0f64; 3];
    let mut skin = 0u64;
    let mut sampled = 0u64;

    let mut y = 0;
    while y < h {
        let mut x = 0;
        while x < w {
            let p = region.get_pixel(x, y).0;
            sampled += 1;
            if is_skin_tone(p[0], p[1], p[2]) {
                skin += 1;
                for c in 0..3 {
                    let v = p[c] as f64;
                    sum[c] += v;
                    sum_sq[c] += v * v;
                }
            }
            x += stride;
        }
        y += stride;
    }

    if skin > 0 {
        for c in 0..3 {
            let mean = sum[c] / skin as f64;
            let var = (sum_sq[c] / skin as f64 - mean * mean).max(0.0);
            out[c] = (mean / 255.0) as f32;
            out[c + 3] = (var.sqrt() / 255.0) as f32;
        }
    }
    out[6] = skin as f32 / sampled as f32;
}

/// Mean R, G, B per cell of a `SPATIAL_GRID` x `SPATIAL_GRID` partition.
fn spatial_color_grid(region: &RgbImage, out: &mut [f32]) {
    let (w, h) = (region.width(), region.height());
    if w == 0 || h == 0 {
        return;
    }
    let stride = sample_stride(w, h);
    let grid = SPATIAL_GRID as u32;

    for gy in 0..grid {
        for gx in 0..grid {
            // Cell bounds: integer partition, last cell absorbs the remainder
            let x0 = gx * w / grid;
            let x1 = if gx == grid - 1 { w } else { (gx + 1) * w / grid };
            let y0 = gy * h / grid;
            let y1 = if gy == grid - 1 { h } else { (gy + 1) * h / grid };

            let mut sum = [0.0f64; 3];
            let mut count = 0u64;

            let mut y = y0;
            while y < y1 {
                let mut x = x0;
                while x < x1 {
                    let p = region.get_pixel(x, y).0;
                    for c in 0..3 {
                        sum[c] += p[c] as f64;
                    }
                    count += 1;
                    x += stride;
                }
                y += stride;
            }

            let idx = ((gy * grid + gx) * 3) as usize;
            if count > 0 {
                for c in 0..3 {
                    out[idx + c] = (sum[c] / (count as f64 * 255.0)) as f32;
                }
            }
        }
    }
}

/// Per-channel 16-bin histogram, each bin a fraction of sampled pixels.
fn color_histogram(region: &RgbImage, out: &mut [f32]) {
    let (w, h) = (region.width(), region.height());
    if w == 0 || h == 0 {
        return;
    }
    let stride = sample_stride(w, h);
    let bin_width = 256 / HIST_BINS;

    let mut counts = [[0u64; HIST_BINS]; 3];
    let mut sampled = 0u64;

    let mut y = 0;
    while y < h {
        let mut x = 0;
        while x < w {
            let p = region.get_pixel(x, y).0;
            for c in 0..3 {
                counts[c][p[c] as usize / bin_width] += 1;
            }
            sampled += 1;
            x += stride;
        }
        y += stride;
    }

    for c in 0..3 {
        for bin in 0..HIST_BINS {
            out[c * HIST_BINS + bin] = counts[c][bin] as f32 / sampled as f32;
        }
    }
}

/// Neighbor offsets for the texture code: NW, N, NE, E of the center pixel.
const TEXTURE_NEIGHBORS: [(i64, i64); 4] = [(-1, -1), (0, -1), (1, -1), (1, 0)];

/// LBP-style 4-bit texture codes over interior pixels, as a normalized
/// histogram. Each neighbor with grayscale >= center sets one bit.
fn texture_patterns(region: &RgbImage, out: &mut [f32]) {
    let (w, h) = (region.width() as i64, region.height() as i64);
    if w < 3 || h < 3 {
        return;
    }
    let stride = sample_stride(region.width(), region.height()) as i64;

    let mut counts = [0u64; TEXTURE_LEN];
    let mut sampled = 0u64;

    let mut y = 1;
    while y < h - 1 {
        let mut x = 1;
        while x < w - 1 {
            let center = grayscale(&region.get_pixel(x as u32, y as u32).0);
            let mut pattern = 0usize;
            for (bit, (dx, dy)) in TEXTURE_NEIGHBORS.iter().enumerate() {
                let neighbor =
                    grayscale(&region.get_pixel((x + dx) as u32, (y + dy) as u32).0);
                if neighbor >= center {
                    pattern |= 1 << bit;
                }
            }
            counts[pattern] += 1;
            sampled += 1;
            x += stride;
        }
        y += stride;
    }

    if sampled > 0 {
        for (slot, &count) in out.iter_mut().zip(counts.iter()) {
            *slot = count as f32 / sampled as f32;
        }
    }
}

/// Sobel gradient magnitude histogram over interior pixels.
fn edge_histogram(region: &RgbImage, out: &mut [f32]) {
    let (w, h) = (region.width() as i64, region.height() as i64);
    if w < 3 || h < 3 {
        return;
    }
    let stride = sample_stride(region.width(), region.height()) as i64;

    let gray = |x: i64, y: i64| grayscale(&region.get_pixel(x as u32, y as u32).0);

    let mut counts = [0u64; EDGE_LEN];
    let mut sampled = 0u64;

    let mut y = 1;
    while y < h - 1 {
        let mut x = 1;
        while x < w - 1 {
            let gx = -gray(x - 1, y - 1) + gray(x + 1, y - 1)
                - 2.0 * gray(x - 1, y) + 2.0 * gray(x + 1, y)
                - gray(x - 1, y + 1) + gray(x + 1, y + 1);
            let gy = -gray(x - 1, y - 1) - 2.0 * gray(x, y - 1) - gray(x + 1, y - 1)
                + gray(x - 1, y + 1) + 2.0 * gray(x, y + 1) + gray(x + 1, y + 1);

            let magnitude = (gx * gx + gy * gy).sqrt();
            let bin = ((magnitude as usize) / 16).min(EDGE_LEN - 1);
            counts[bin] += 1;
            sampled += 1;
            x += stride;
        }
        y += stride;
    }

    if sampled > 0 {
        for (slot, &count) in out.iter_mut().zip(counts.iter()) {
            *slot = count as f32 / sampled as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const SKIN: [u8; 3] = [200, 150, 120];

    #[test]
    fn layout_offsets_are_consistent() {
        assert_eq!(FEATURE_LEN, 135);
        assert_eq!(SPATIAL_OFFSET, 7);
        assert_eq!(HIST_OFFSET, 55);
        assert_eq!(TEXTURE_OFFSET, 103);
        assert_eq!(EDGE_OFFSET, 119);
    }

    #[test]
    fn vector_length_is_fixed_across_dimensions() {
        for (w, h) in [(300, 300), (64, 128), (17, 31), (1024, 768)] {
            let region = RgbImage::from_pixel(w, h, Rgb([80, 90, 100]));
            let v = extract_features(&region, FeatureMode::FullImage);
            assert_eq!(v.len(), FEATURE_LEN, "dims {w}x{h}");
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut region = RgbImage::new(120, 90);
        for (x, y, p) in region.enumerate_pixels_mut() {
            *p = Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8]);
        }
        let a = extract_features(&region, FeatureMode::FaceRegion);
        let b = extract_features(&region, FeatureMode::FaceRegion);
        assert_eq!(a, b);
    }

    #[test]
    fn skin_rule_matches_reference_cases() {
        assert!(is_skin_tone(200, 150, 120));
        assert!(is_skin_tone(120, 80, 60));
        assert!(!is_skin_tone(80, 80, 80)); // gray: R not dominant
        assert!(!is_skin_tone(0, 0, 255)); // blue
        assert!(!is_skin_tone(100, 95, 90)); // |R-G| too small
    }

    #[test]
    fn skinless_image_has_zero_skin_section() {
        let region = RgbImage::from_pixel(100, 100, Rgb([0, 0, 255]));
        let v = extract_features(&region, FeatureMode::FullImage);
        assert!(v.values[..SKIN_LEN].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn all_skin_image_reports_full_fraction_and_means() {
        let region = RgbImage::from_pixel(64, 64, Rgb(SKIN));
        let v = extract_features(&region, FeatureMode::FaceRegion);
        assert!((v.values[0] - 200.0 / 255.0).abs() < 1e-5);
        assert!((v.values[1] - 150.0 / 255.0).abs() < 1e-5);
        assert!((v.values[2] - 120.0 / 255.0).abs() < 1e-5);
        // Uniform color: zero variance, full skin fraction
        assert!(v.values[3].abs() < 1e-5);
        assert!((v.values[6] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_image_histogram_concentrates_in_one_bin() {
        let region = RgbImage::from_pixel(80, 80, Rgb([40, 100, 250]));
        let v = extract_features(&region, FeatureMode::FullImage);
        let hist = &v.values[HIST_OFFSET..TEXTURE_OFFSET];
        // 40/16 = bin 2, 100/16 = bin 6, 250/16 = bin 15
        assert!((hist[2] - 1.0).abs() < 1e-6);
        assert!((hist[HIST_BINS + 6] - 1.0).abs() < 1e-6);
        assert!((hist[2 * HIST_BINS + 15] - 1.0).abs() < 1e-6);
        let total: f32 = hist.iter().sum();
        assert!((total - 3.0).abs() < 1e-4);
    }

    #[test]
    fn uniform_image_texture_is_all_ones_pattern() {
        // Every neighbor equals the center, so all 4 bits set -> pattern 15
        let region = RgbImage::from_pixel(50, 50, Rgb([128, 128, 128]));
        let v = extract_features(&region, FeatureMode::FullImage);
        let texture = &v.values[TEXTURE_OFFSET..EDGE_OFFSET];
        assert!((texture[15] - 1.0).abs() < 1e-6);
        assert!(texture[..15].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn uniform_image_has_zero_magnitude_edges() {
        let region = RgbImage::from_pixel(50, 50, Rgb([128, 128, 128]));
        let v = extract_features(&region, FeatureMode::FullImage);
        let edges = &v.values[EDGE_OFFSET..];
        assert!((edges[0] - 1.0).abs() < 1e-6);
        assert!(edges[1..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn spatial_grid_reflects_cell_colors() {
        // Left half red, right half blue
        let mut region = RgbImage::new(80, 80);
        for (x, _, p) in region.enumerate_pixels_mut() {
            *p = if x < 40 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) };
        }
        let v = extract_features(&region, FeatureMode::FullImage);
        let spatial = &v.values[SPATIAL_OFFSET..HIST_OFFSET];

        // Cell (0,0): pure red
        assert!((spatial[0] - 1.0).abs() < 1e-5);
        assert!(spatial[1].abs() < 1e-5);
        // Cell (0,3) (top-right): pure blue
        let idx = 3 * 3;
        assert!(spatial[idx].abs() < 1e-5);
        assert!((spatial[idx + 2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn all_values_stay_in_unit_range() {
        let mut region = RgbImage::new(200, 150);
        for (x, y, p) in region.enumerate_pixels_mut() {
            *p = Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8]);
        }
        let v = extract_features(&region, FeatureMode::FaceRegion);
        for (i, &val) in v.values.iter().enumerate() {
            assert!((0.0..=1.0).contains(&val), "value {i} = {val}");
        }
    }

    #[test]
    fn tiny_region_extracts_without_panicking() {
        // Below the 3x3 interior minimum for texture/edge sections
        let region = RgbImage::from_pixel(2, 2, Rgb(SKIN));
        let v = extract_features(&region, FeatureMode::FaceRegion);
        assert_eq!(v.len(), FEATURE_LEN);
        assert!(v.values[TEXTURE_OFFSET..].iter().all(|&x| x == 0.0));
    }
}
