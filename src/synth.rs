//! Synthetic limb-darkened disk images.
//!
//! Used by `ldark synth` to produce demo inputs and by the test-suite to get
//! images with known geometry and a known law. Rendering is deterministic for a
//! given seed.

use image::{GrayImage, Luma};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;
use crate::models::LimbLaw;

/// Everything needed to render one disk.
#[derive(Debug, Clone)]
pub struct DiskScene {
    pub width: u32,
    pub height: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
    pub law: LimbLaw,
    /// Pixel value at disk center before noise.
    pub peak: f64,
    /// Sky level outside the disk.
    pub background: f64,
    /// Gaussian read-noise sigma, in pixel units. `0` disables noise.
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for DiskScene {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            center_x: 128.0,
            center_y: 128.0,
            radius: 90.0,
            law: LimbLaw::Quadratic { a: 0.4, b: 0.2 },
            peak: 220.0,
            background: 12.0,
            noise_sigma: 0.0,
            seed: 42,
        }
    }
}

impl DiskScene {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.width == 0 || self.height == 0 {
            return Err(AppError::input("Image dimensions must be > 0."));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(AppError::input("Disk radius must be > 0."));
        }
        if !(self.noise_sigma.is_finite() && self.noise_sigma >= 0.0) {
            return Err(AppError::input("Noise sigma must be >= 0."));
        }
        if !(self.peak.is_finite() && self.background.is_finite()) {
            return Err(AppError::input("Peak and background must be finite."));
        }
        Ok(())
    }
}

/// Render a scene. Pixels with `r <= radius` get `peak · I(μ)`, the rest `background`.
///
/// Values are rounded and clamped to the 8-bit range.
pub fn render_disk(scene: &DiskScene) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(scene.seed);
    // Normal::new only fails for a non-finite or negative sigma.
    let normal = Normal::new(0.0, scene.noise_sigma.max(0.0)).ok();

    GrayImage::from_fn(scene.width, scene.height, |x, y| {
        let dx = x as f64 - scene.center_x;
        let dy = y as f64 - scene.center_y;
        let r = (dx * dx + dy * dy).sqrt();

        let clean = if r <= scene.radius {
            let r_norm = (r / scene.radius).min(1.0);
            let mu = (1.0 - r_norm * r_norm).max(0.0).sqrt();
            scene.peak * scene.law.intensity(mu)
        } else {
            scene.background
        };

        let noisy = match &normal {
            Some(n) if scene.noise_sigma > 0.0 => clean + n.sample(&mut rng),
            _ => clean,
        };
        Luma([noisy.round().clamp(0.0, 255.0) as u8])
    })
}
