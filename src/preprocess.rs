//! Image decoding and denoising ahead of detection.
//!
//! Pipeline: decode → 8-bit luma → local contrast equalization → Gaussian blur
//! → 5×5 median.
//!
//! Equalization is contrast-limited and tile based (CLAHE). It sharpens faint
//! limbs for the detector but remaps the intensities the laws are fitted to,
//! so it can be switched off for photometric work.

use std::path::Path;

use image::imageops::crop_imm;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::stats::histogram;

use crate::error::AppError;

/// Gaussian sigma roughly matching a 5×5 kernel.
pub const BLUR_SIGMA: f32 = 1.1;
/// Median filter radius (2 → 5×5 window).
pub const MEDIAN_RADIUS: u32 = 2;

/// Extensions the request layer accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Apply contrast-limited local equalization before smoothing.
    pub equalize: bool,
    /// Histogram clip limit, as a multiple of the mean bin count.
    pub clip_limit: f64,
    /// Tiles per axis.
    pub tile_grid: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            equalize: true,
            clip_limit: 2.0,
            tile_grid: 8,
        }
    }
}

/// Reject anything that is not a PNG/JPEG by extension, before touching the core.
pub fn check_extension(path: &Path) -> Result<(), AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(AppError::input(format!(
            "Unsupported file type for '{}'. Please upload a PNG or JPG image.",
            path.display()
        )))
    }
}

/// Decode raw image bytes and run the preprocessing chain.
pub fn decode_and_preprocess(bytes: &[u8], config: &PreprocessConfig) -> Result<GrayImage, AppError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AppError::io(format!("Could not decode image bytes: {e}")))?;
    Ok(preprocess(&decoded, config))
}

/// Grayscale, equalize, smooth and despeckle an already decoded image.
pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return gray;
    }
    let gray = if config.equalize {
        equalize_local(&gray, config.clip_limit, config.tile_grid)
    } else {
        gray
    };
    let smoothed = gaussian_blur_f32(&gray, BLUR_SIGMA);
    median_filter(&smoothed, MEDIAN_RADIUS, MEDIAN_RADIUS)
}

/// Contrast-limited adaptive histogram equalization.
///
/// Each tile gets its own clipped-histogram lookup table; every pixel blends
/// the tables of the four nearest tile centers bilinearly, so no seams appear
/// at tile borders.
pub fn equalize_local(image: &GrayImage, clip_limit: f64, tile_grid: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let tile_w = width.div_ceil(tile_grid.clamp(1, width));
    let tile_h = height.div_ceil(tile_grid.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, y0) = (tx * tile_w, ty * tile_h);
            let tile = crop_imm(image, x0, y0, tile_w.min(width - x0), tile_h.min(height - y0)).to_image();
            luts.push(clipped_lut(&tile, clip_limit));
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let v = image.get_pixel(x, y)[0] as usize;
        let (x0, x1, wx) = tile_neighbours(x, tile_w, tiles_x);
        let (y0, y1, wy) = tile_neighbours(y, tile_h, tiles_y);
        let at = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][v];

        let top = at(x0, y0) * (1.0 - wx) + at(x1, y0) * wx;
        let bottom = at(x0, y1) * (1.0 - wx) + at(x1, y1) * wx;
        Luma([(top * (1.0 - wy) + bottom * wy).round().clamp(0.0, 255.0) as u8])
    })
}

/// Equalization table of one tile after clipping and redistributing its histogram.
fn clipped_lut(tile: &GrayImage, clip_limit: f64) -> [f32; 256] {
    let mut hist = histogram(tile).channels[0];
    let area = tile.width() * tile.height();

    let limit = ((clip_limit * area as f64 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for count in hist.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    let share = excess / 256;
    let mut rest = excess % 256;
    for count in hist.iter_mut() {
        *count += share;
    }
    if rest > 0 {
        let step = (256 / rest as usize).max(1);
        for count in hist.iter_mut().step_by(step) {
            if rest == 0 {
                break;
            }
            *count += 1;
            rest -= 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0f32; 256];
    let mut cumulative = 0u32;
    for (out, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count;
        *out = cumulative as f32 * scale;
    }
    lut
}

/// Two nearest tile indices along one axis and the weight of the second.
fn tile_neighbours(p: u32, tile: u32, count: u32) -> (u32, u32, f32) {
    let f = (p as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let lo = f.floor() as u32;
    if lo + 1 >= count {
        return (count - 1, count - 1, 0.0);
    }
    (lo, lo + 1, f - lo as f32)
}
