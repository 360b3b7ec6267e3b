//! Disk localization.
//!
//! Two strategies, tried in order:
//!
//! - `hough`: gradient-directed circle voting over Canny edges. Tolerates noise and
//!   partial occlusion but can miss low-contrast disks.
//! - `contour`: Otsu threshold, largest external boundary, minimum enclosing
//!   circle. Recovers soft-edged disks at lower geometric precision.
//!
//! The fallback only runs when voting produces no candidate at all.

pub mod contour;
pub mod hough;

use image::GrayImage;

use crate::domain::{DetectionMethod, Disk};
use crate::error::AppError;

pub use contour::*;
pub use hough::*;

/// Detector knobs. Search ranges are derived from the image height.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Canny hysteresis low threshold.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,
    /// Minimum votes for a center, and minimum supporting edge pixels for a radius.
    pub accumulator_threshold: u32,
    /// Minimum fraction of the circumference that must be backed by edge pixels.
    pub min_edge_coverage: f64,
    /// Contour fallback: smallest acceptable enclosing radius, in pixels.
    pub min_fallback_radius: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            canny_low: 25.0,
            canny_high: 50.0,
            accumulator_threshold: 30,
            min_edge_coverage: 0.25,
            min_fallback_radius: 10.0,
        }
    }
}

/// Candidate circle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Locate the stellar disk.
///
/// Among all voting candidates the largest radius wins: the real disk is the
/// dominant large feature, smaller detections are artifacts.
pub fn locate_disk(image: &GrayImage, config: &DetectorConfig) -> Result<Disk, AppError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(AppError::detection("Image is empty."));
    }

    let candidates = hough_circles(image, config);
    if let Some(best) = candidates
        .iter()
        .copied()
        .max_by(|a, b| a.radius.total_cmp(&b.radius))
    {
        tracing::info!(
            cx = best.x,
            cy = best.y,
            radius = best.radius,
            candidates = candidates.len(),
            "disk located by circle voting"
        );
        return Ok(Disk {
            center_x: best.x,
            center_y: best.y,
            radius: best.radius,
            method: DetectionMethod::Hough,
        });
    }

    tracing::info!("circle voting found no candidates, falling back to contour detection");
    let circle = contour_disk(image, config)?;
    tracing::info!(
        cx = circle.x,
        cy = circle.y,
        radius = circle.radius,
        "disk located by contour fallback"
    );
    Ok(Disk {
        center_x: circle.x,
        center_y: circle.y,
        radius: circle.radius,
        method: DetectionMethod::Contour,
    })
}
