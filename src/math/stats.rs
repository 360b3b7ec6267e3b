//! Goodness-of-fit statistics and small descriptive helpers.
//!
//! All functions here are pure: identical inputs give bit-identical outputs.

/// Variance used when the residuals have no spread at all.
pub const VARIANCE_FLOOR: f64 = 1e-10;

/// Goodness-of-fit summary for one fitted curve.
#[derive(Debug, Clone, PartialEq)]
pub struct FitStatistics {
    pub r_squared: f64,
    pub reduced_chi_square: f64,
    /// `observed - fitted`
    pub residuals: Vec<f64>,
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`); `None` for an empty slice.
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / values.len() as f64)
}

/// Population standard deviation; `None` for an empty slice.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Defined as `0` when `SS_tot == 0` (constant observations).
pub fn r_squared(observed: &[f64], fitted: &[f64]) -> f64 {
    let Some(m) = mean(observed) else {
        return 0.0;
    };
    let ss_res: f64 = observed
        .iter()
        .zip(fitted)
        .map(|(o, f)| (o - f) * (o - f))
        .sum();
    let ss_tot: f64 = observed.iter().map(|o| (o - m) * (o - m)).sum();
    if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Reduced chi-square with the residual variance as the per-sample error.
///
/// There are no per-pixel error bars, so the variance is estimated from the
/// residuals themselves (population variance, floored at [`VARIANCE_FLOOR`]
/// when it is exactly zero). Degrees of freedom are `max(1, n - param_count)`.
pub fn reduced_chi_square(observed: &[f64], fitted: &[f64], param_count: usize) -> f64 {
    let residuals: Vec<f64> = observed.iter().zip(fitted).map(|(o, f)| o - f).collect();
    reduced_chi_square_from_residuals(&residuals, param_count)
}

fn reduced_chi_square_from_residuals(residuals: &[f64], param_count: usize) -> f64 {
    let dof = residuals.len().saturating_sub(param_count).max(1);
    let var = match variance(residuals) {
        Some(v) if v > 0.0 => v,
        _ => VARIANCE_FLOOR,
    };
    let chi_square: f64 = residuals.iter().map(|r| r * r / var).sum();
    chi_square / dof as f64
}

/// Compute R², reduced χ² and residuals in one pass over the inputs.
pub fn fit_statistics(observed: &[f64], fitted: &[f64], param_count: usize) -> FitStatistics {
    let residuals: Vec<f64> = observed.iter().zip(fitted).map(|(o, f)| o - f).collect();
    FitStatistics {
        r_squared: r_squared(observed, fitted),
        reduced_chi_square: reduced_chi_square_from_residuals(&residuals, param_count),
        residuals,
    }
}
