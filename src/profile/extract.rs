//! Per-radius binning, sigma clipping and the `r → μ` projection.
//!
//! Steps:
//! 1. keep pixels with distance `r <= radius` from the center
//! 2. bin by `floor(r)` over `[0, floor(max r)]`
//! 3. per bin: drop members with `|v - mean| >= k·std`, re-average survivors;
//!    a bin with no survivors is dropped, never zero-filled
//! 4. `r_norm = bin / radius` clamped to `[0, 1]`, `μ = sqrt(1 - r_norm²)`
//! 5. divide by the mean of the innermost bins as the `I(1)` estimate
//! 6. sort ascending by `μ`

use image::GrayImage;

use crate::domain::{Disk, RadialProfile};
use crate::error::AppError;
use crate::math::{mean, std_dev};

/// Extraction knobs.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Clip multiplier `k` in `|v - mean| >= k·std`.
    pub clip_sigma: f64,
    /// Number of innermost valid bins averaged into the `I(1)` anchor.
    pub anchor_bins: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            clip_sigma: 3.0,
            anchor_bins: 11,
        }
    }
}

/// One surviving radius bin before projection.
#[derive(Debug, Clone, Copy)]
struct RadialBin {
    radius_px: usize,
    mean: f64,
}

/// Extract the normalized `(μ, I)` profile for a located disk.
pub fn extract_radial_profile(
    image: &GrayImage,
    disk: &Disk,
    config: &ProfileConfig,
) -> Result<RadialProfile, AppError> {
    extract_profile_at(image, disk.center_x, disk.center_y, disk.radius, config)
}

/// Same as [`extract_radial_profile`] with the geometry passed explicitly.
pub fn extract_profile_at(
    image: &GrayImage,
    center_x: f64,
    center_y: f64,
    radius: f64,
    config: &ProfileConfig,
) -> Result<RadialProfile, AppError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(AppError::profile(format!("Invalid disk radius {radius}.")));
    }
    if !(center_x.is_finite() && center_y.is_finite()) {
        return Err(AppError::profile("Invalid disk center."));
    }

    let members = collect_bin_members(image, center_x, center_y, radius);
    if members.is_empty() {
        return Err(AppError::profile("No pixels fall inside the detected disk."));
    }

    let bins: Vec<RadialBin> = members
        .iter()
        .enumerate()
        .filter_map(|(radius_px, values)| {
            clipped_mean(values, config.clip_sigma).map(|mean| RadialBin { radius_px, mean })
        })
        .collect();

    if bins.is_empty() {
        return Err(AppError::profile("No valid radial bins remain after sigma clipping."));
    }

    // Bins are in radius-ascending order here, so the innermost come first.
    let n_anchor = config.anchor_bins.max(1).min(bins.len());
    let anchor_values: Vec<f64> = bins[..n_anchor].iter().map(|b| b.mean).collect();
    let anchor = match mean(&anchor_values) {
        Some(a) if a > 0.0 => a,
        _ => 1.0,
    };

    let mut samples: Vec<(f64, f64)> = bins
        .iter()
        .map(|b| {
            let r_norm = (b.radius_px as f64 / radius).clamp(0.0, 1.0);
            let mu = (1.0 - r_norm * r_norm).max(0.0).sqrt();
            (mu, b.mean / anchor)
        })
        .collect();

    // Radius-ascending is μ-descending; sort explicitly rather than reversing.
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (mu, intensity): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();

    tracing::debug!(
        bins = mu.len(),
        dropped = members.iter().filter(|m| !m.is_empty()).count() - mu.len(),
        anchor,
        "radial profile extracted"
    );

    RadialProfile::new(mu, intensity)
}

/// Group in-disk pixel values by `floor(r)`. Index = integer radius.
///
/// Only pixels in the disk's bounding box are visited. An empty result means no
/// pixel fell inside the disk.
fn collect_bin_members(image: &GrayImage, cx: f64, cy: f64, radius: f64) -> Vec<Vec<f64>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil().max(0.0) as u32).min(width - 1);
    let y1 = ((cy + radius).ceil().max(0.0) as u32).min(height - 1);

    let mut members: Vec<Vec<f64>> = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let r = (dx * dx + dy * dy).sqrt();
            if r > radius {
                continue;
            }
            let bin = r.floor() as usize;
            if members.len() <= bin {
                members.resize_with(bin + 1, Vec::new);
            }
            members[bin].push(image.get_pixel(x, y)[0] as f64);
        }
    }
    members
}

/// Sigma-clipped mean of one bin; `None` if the bin is empty or nothing survives.
///
/// A bin with zero spread has no deviating members and is kept whole.
fn clipped_mean(values: &[f64], clip_sigma: f64) -> Option<f64> {
    let m = mean(values)?;
    let sd = std_dev(values)?;
    if sd == 0.0 {
        return Some(m);
    }
    let limit = clip_sigma * sd;
    let survivors: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| (v - m).abs() < limit)
        .collect();
    mean(&survivors)
}
