//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during extraction and fitting
//! - cached per source image
//! - exported to JSON/CSV

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::detect::DetectorConfig;
use crate::error::AppError;
use crate::math::LmConfig;
use crate::preprocess::PreprocessConfig;
use crate::profile::ProfileConfig;

/// Which locator produced a disk estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Gradient-voting circle transform.
    Hough,
    /// Otsu threshold + largest contour + minimum enclosing circle.
    Contour,
}

/// Located disk geometry in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub center_x: f64,
    pub center_y: f64,
    /// Always `> 0`.
    pub radius: f64,
    pub method: DetectionMethod,
}

/// Radially averaged intensity samples, ordered by ascending `μ`.
///
/// Construction goes through [`RadialProfile::new`], which enforces:
/// - `mu.len() == intensity.len()`
/// - every `μ` is finite and inside `[0, 1]`
/// - `μ` is non-decreasing
/// - every intensity is finite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialProfile {
    mu: Vec<f64>,
    intensity: Vec<f64>,
}

impl RadialProfile {
    pub fn new(mu: Vec<f64>, intensity: Vec<f64>) -> Result<Self, AppError> {
        if mu.len() != intensity.len() {
            return Err(AppError::profile(format!(
                "Profile length mismatch: {} mu samples vs {} intensity samples.",
                mu.len(),
                intensity.len()
            )));
        }
        if mu.iter().any(|m| !(m.is_finite() && (0.0..=1.0).contains(m))) {
            return Err(AppError::profile("Profile contains mu values outside [0, 1]."));
        }
        if mu.windows(2).any(|w| w[1] < w[0]) {
            return Err(AppError::profile("Profile mu values are not sorted ascending."));
        }
        if intensity.iter().any(|v| !v.is_finite()) {
            return Err(AppError::profile("Profile contains non-finite intensities."));
        }
        Ok(Self { mu, intensity })
    }

    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }

    /// `(μ, I)` pairs in ascending `μ` order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mu.iter().copied().zip(self.intensity.iter().copied())
    }
}

/// Concrete limb-darkening law in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    Linear,
    Quadratic,
    SquareRoot,
    Logarithmic,
    Claret,
}

impl ModelKind {
    /// Catalog order. Compare mode fits in this order before ranking.
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Linear,
        ModelKind::Quadratic,
        ModelKind::SquareRoot,
        ModelKind::Logarithmic,
        ModelKind::Claret,
    ];

    /// Wire identifier (`square-root`, `claret`, ...).
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Quadratic => "quadratic",
            ModelKind::SquareRoot => "square-root",
            ModelKind::Logarithmic => "logarithmic",
            ModelKind::Claret => "claret",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear",
            ModelKind::Quadratic => "Quadratic",
            ModelKind::SquareRoot => "Square-root",
            ModelKind::Logarithmic => "Logarithmic",
            ModelKind::Claret => "Claret (4-param)",
        }
    }

    /// Number of free coefficients.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Linear => 1,
            ModelKind::Quadratic | ModelKind::SquareRoot | ModelKind::Logarithmic => 2,
            ModelKind::Claret => 4,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| AppError::fitting(format!("Unknown model type: {s}")))
    }
}

/// What a request asks for: one model, or all of them ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModelSelector {
    Linear,
    Quadratic,
    SquareRoot,
    Logarithmic,
    Claret,
    Compare,
}

impl ModelSelector {
    /// The single model requested, or `None` for compare mode.
    pub fn single(self) -> Option<ModelKind> {
        match self {
            ModelSelector::Linear => Some(ModelKind::Linear),
            ModelSelector::Quadratic => Some(ModelKind::Quadratic),
            ModelSelector::SquareRoot => Some(ModelKind::SquareRoot),
            ModelSelector::Logarithmic => Some(ModelKind::Logarithmic),
            ModelSelector::Claret => Some(ModelKind::Claret),
            ModelSelector::Compare => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self.single() {
            Some(kind) => kind.name(),
            None => "compare",
        }
    }
}

impl FromStr for ModelSelector {
    type Err = AppError;

    /// Parse a request-layer selector. Anything outside the catalog plus
    /// `compare` is rejected as an input error, before the core runs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "compare" {
            return Ok(ModelSelector::Compare);
        }
        match wanted.parse::<ModelKind>() {
            Ok(ModelKind::Linear) => Ok(ModelSelector::Linear),
            Ok(ModelKind::Quadratic) => Ok(ModelSelector::Quadratic),
            Ok(ModelKind::SquareRoot) => Ok(ModelSelector::SquareRoot),
            Ok(ModelKind::Logarithmic) => Ok(ModelSelector::Logarithmic),
            Ok(ModelKind::Claret) => Ok(ModelSelector::Claret),
            Err(_) => Err(AppError::input(format!(
                "Invalid model_type '{s}'. Must be one of linear, quadratic, square-root, logarithmic, claret, compare."
            ))),
        }
    }
}

/// Fit output for a single model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: ModelKind,
    /// LaTeX display formula.
    pub formula: String,
    pub coefficients: Vec<f64>,
    /// `+inf` when the covariance could not be estimated (`null` in JSON).
    #[serde(deserialize_with = "null_as_infinity")]
    pub standard_errors: Vec<f64>,
    pub r_squared: f64,
    pub reduced_chi_square: f64,
    /// Model evaluated at each profile `μ` (same order and length).
    pub fitted_curve: Vec<f64>,
    /// `observed - fitted`, aligned with the profile.
    pub residuals: Vec<f64>,
}

/// JSON has no infinity; serde_json writes it as `null`. Read it back as `+inf`.
fn null_as_infinity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::INFINITY)).collect())
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub preprocess: PreprocessConfig,
    pub detector: DetectorConfig,
    pub profile: ProfileConfig,
    pub solver: LmConfig,
}
