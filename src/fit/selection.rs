//! Compare mode: fit every catalog law and rank the survivors.
//!
//! The five fits are independent pure functions of the same profile, so they
//! run in parallel. Each fit yields an explicit success/failure outcome; the
//! outcomes are then split into:
//! - `ranked`: successful fits sorted by R² descending
//! - `skipped`: failed models with their error message
//!
//! A failing model never aborts its siblings.

use rayon::prelude::*;

use crate::domain::{FitResult, ModelKind};
use crate::error::AppError;
use crate::fit::fitter::fit_kind;
use crate::math::LmConfig;

/// Output of compare mode.
#[derive(Debug, Clone)]
pub struct ModelComparison {
    /// Successful fits, best R² first.
    pub ranked: Vec<FitResult>,
    /// Models that failed to fit and why (for diagnostics).
    pub skipped: Vec<(ModelKind, String)>,
}

impl ModelComparison {
    pub fn best(&self) -> Option<&FitResult> {
        self.ranked.first()
    }
}

/// Fit all catalog models independently and rank the successes by R².
pub fn fit_all_models(mu: &[f64], intensity: &[f64], config: &LmConfig) -> ModelComparison {
    let outcomes: Vec<(ModelKind, Result<FitResult, AppError>)> = ModelKind::ALL
        .par_iter()
        .map(|&kind| (kind, fit_kind(kind, mu, intensity, config)))
        .collect();

    let mut ranked = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(fit) => ranked.push(fit),
            Err(err) => {
                tracing::warn!(model = kind.name(), error = %err, "model excluded from comparison");
                skipped.push((kind, err.message().to_string()));
            }
        }
    }

    rank_by_r_squared(&mut ranked);

    ModelComparison { ranked, skipped }
}

/// Sort by R² descending. The sort is stable, so ties keep catalog order.
pub fn rank_by_r_squared(fits: &mut [FitResult]) {
    fits.sort_by(|a, b| b.r_squared.total_cmp(&a.r_squared));
}
