//! Low-level fitting routine for a single model kind.
//!
//! Given:
//! - profile samples `μ_i`
//! - normalized intensities `I_i`
//! - a model kind from the catalog
//!
//! we minimize `Σ (I_i - model(μ_i; p))²` with Levenberg–Marquardt, seeded from
//! the model's fixed initial guess, and derive:
//! - coefficient standard errors from the estimated covariance
//! - R², reduced χ², the fitted curve and the residuals

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitResult, ModelKind};
use crate::error::AppError;
use crate::math::{LeastSquaresProblem, LmConfig, fit_statistics, minimize, normal_inverse};
use crate::models::{fill_basis_row, predict, spec};

/// Binds one catalog law to the observed samples.
struct LawProblem<'a> {
    model: ModelKind,
    mu: &'a [f64],
    observed: &'a [f64],
}

impl LeastSquaresProblem for LawProblem<'_> {
    fn n_params(&self) -> usize {
        self.model.param_count()
    }

    fn n_samples(&self) -> usize {
        self.mu.len()
    }

    fn residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>) {
        let params = params.as_slice();
        for (i, (&mu, &y)) in self.mu.iter().zip(self.observed).enumerate() {
            out[i] = y - predict(self.model, mu, params);
        }
    }

    fn jacobian(&self, _params: &DVector<f64>, out: &mut DMatrix<f64>) {
        // Every law is 1 - Σ p_k g_k(μ), so ∂I/∂p_k = -g_k(μ).
        let p = self.model.param_count();
        let mut row = [0.0; 4];
        for (i, &mu) in self.mu.iter().enumerate() {
            fill_basis_row(self.model, mu, &mut row[..p]);
            for k in 0..p {
                out[(i, k)] = -row[k];
            }
        }
    }
}

/// Fit a model by name (`linear`, `quadratic`, `square-root`, `logarithmic`, `claret`).
///
/// Unknown names are a fitting error.
pub fn fit_model(
    mu: &[f64],
    intensity: &[f64],
    model: &str,
    config: &LmConfig,
) -> Result<FitResult, AppError> {
    let kind: ModelKind = model.parse()?;
    fit_kind(kind, mu, intensity, config)
}

/// Fit a single model kind.
pub fn fit_kind(
    model: ModelKind,
    mu: &[f64],
    intensity: &[f64],
    config: &LmConfig,
) -> Result<FitResult, AppError> {
    validate_inputs(model, mu, intensity)?;

    let entry = spec(model);
    let p = entry.param_count();
    let n = mu.len();

    let problem = LawProblem {
        model,
        mu,
        observed: intensity,
    };
    let outcome = minimize(&problem, DVector::from_row_slice(entry.initial_guess), config);

    if !outcome.converged {
        return Err(AppError::fitting(format!(
            "Curve fitting failed for {}: no convergence after {} function evaluations.",
            model.name(),
            outcome.evaluations
        )));
    }
    if outcome.params.iter().any(|v| !v.is_finite()) {
        return Err(AppError::fitting(format!(
            "Curve fitting failed for {}: non-finite coefficients.",
            model.name()
        )));
    }

    let coefficients: Vec<f64> = outcome.params.iter().copied().collect();
    let fitted_curve: Vec<f64> = mu.iter().map(|&m| predict(model, m, &coefficients)).collect();
    let stats = fit_statistics(intensity, &fitted_curve, p);
    let ss_res: f64 = stats.residuals.iter().map(|r| r * r).sum();
    let standard_errors = standard_errors(&outcome.jacobian, ss_res, n, p);

    tracing::debug!(
        model = model.name(),
        evaluations = outcome.evaluations,
        iterations = outcome.iterations,
        r_squared = stats.r_squared,
        "fit converged"
    );

    Ok(FitResult {
        model,
        formula: entry.formula_latex.to_string(),
        coefficients,
        standard_errors,
        r_squared: stats.r_squared,
        reduced_chi_square: stats.reduced_chi_square,
        fitted_curve,
        residuals: stats.residuals,
    })
}

fn validate_inputs(model: ModelKind, mu: &[f64], intensity: &[f64]) -> Result<(), AppError> {
    if mu.len() != intensity.len() {
        return Err(AppError::fitting(format!(
            "Curve fitting failed for {}: {} mu samples vs {} intensity samples.",
            model.name(),
            mu.len(),
            intensity.len()
        )));
    }
    if mu.is_empty() {
        return Err(AppError::fitting(format!(
            "Curve fitting failed for {}: no data points to fit.",
            model.name()
        )));
    }
    let p = model.param_count();
    if mu.len() < p {
        return Err(AppError::fitting(format!(
            "Curve fitting failed for {}: {} samples cannot constrain {p} parameters.",
            model.name(),
            mu.len()
        )));
    }
    if mu.iter().chain(intensity).any(|v| !v.is_finite()) {
        return Err(AppError::fitting(format!(
            "Curve fitting failed for {}: input contains non-finite values.",
            model.name()
        )));
    }
    Ok(())
}

/// `sqrt(diag((JᵀJ)⁻¹ · SS_res / (n - p)))`.
///
/// With no spare degrees of freedom, or a singular Jacobian, the covariance
/// cannot be estimated and every error is `+inf`.
fn standard_errors(jacobian: &DMatrix<f64>, ss_res: f64, n: usize, p: usize) -> Vec<f64> {
    if n <= p {
        return vec![f64::INFINITY; p];
    }
    let Some(cov) = normal_inverse(jacobian) else {
        return vec![f64::INFINITY; p];
    };
    let scale = ss_res / (n - p) as f64;
    (0..p).map(|k| (cov[(k, k)] * scale).max(0.0).sqrt()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::{mu_grid, synthetic_profile};

    #[test]
    fn fit_recovers_quadratic_coefficients_without_noise() {
        let mu = mu_grid(60);
        let intensity = synthetic_profile(ModelKind::Quadratic, &[0.45, 0.18], &mu, 0.0, 1);

        let fit = fit_kind(ModelKind::Quadratic, &mu, &intensity, &LmConfig::default()).unwrap();
        assert!((fit.coefficients[0] - 0.45).abs() < 1e-8, "a={}", fit.coefficients[0]);
        assert!((fit.coefficients[1] - 0.18).abs() < 1e-8, "b={}", fit.coefficients[1]);
        assert!(fit.r_squared > 1.0 - 1e-12);
        assert_eq!(fit.fitted_curve.len(), mu.len());
        assert_eq!(fit.residuals.len(), mu.len());
        assert_eq!(fit.standard_errors.len(), 2);
    }

    #[test]
    fn every_law_recovers_its_own_coefficients() {
        let mu = mu_grid(80);
        let cases: [(ModelKind, &[f64]); 5] = [
            (ModelKind::Linear, &[0.62]),
            (ModelKind::Quadratic, &[0.35, 0.27]),
            (ModelKind::SquareRoot, &[0.15, 0.55]),
            (ModelKind::Logarithmic, &[0.7, 0.2]),
            (ModelKind::Claret, &[0.6, -0.2, 0.5, -0.15]),
        ];
        for (kind, truth) in cases {
            let intensity = synthetic_profile(kind, truth, &mu, 0.0, 7);
            let fit = fit_kind(kind, &mu, &intensity, &LmConfig::default()).unwrap();
            for (got, want) in fit.coefficients.iter().zip(truth) {
                assert!((got - want).abs() < 1e-6, "{kind}: got {got}, want {want}");
            }
        }
    }

    #[test]
    fn parameter_error_shrinks_with_noise() {
        let mu = mu_grid(120);
        let truth = [0.4, 0.25];
        let err_at = |sigma: f64| {
            let intensity = synthetic_profile(ModelKind::Quadratic, &truth, &mu, sigma, 11);
            let fit = fit_kind(ModelKind::Quadratic, &mu, &intensity, &LmConfig::default()).unwrap();
            let err = fit
                .coefficients
                .iter()
                .zip(&truth)
                .map(|(g, w)| (g - w).abs())
                .fold(0.0, f64::max);
            (err, fit.r_squared)
        };

        let (err_hi, r2_hi) = err_at(0.02);
        let (err_lo, r2_lo) = err_at(0.0005);
        assert!(err_hi < 0.1, "err_hi={err_hi}");
        assert!(err_lo < 0.003, "err_lo={err_lo}");
        assert!(err_lo < err_hi);
        assert!(r2_lo > r2_hi);
        assert!(r2_lo > 0.999, "r2_lo={r2_lo}");
    }

    #[test]
    fn constant_profile_gives_zero_coefficients_and_zero_r_squared() {
        let mu = mu_grid(40);
        let intensity = vec![1.0; mu.len()];
        for kind in ModelKind::ALL {
            let fit = fit_kind(kind, &mu, &intensity, &LmConfig::default()).unwrap();
            for c in &fit.coefficients {
                assert!(c.abs() < 1e-6, "{kind}: coefficient {c}");
            }
            assert_eq!(fit.r_squared, 0.0);
            assert!(fit.reduced_chi_square.is_finite());
        }
    }

    #[test]
    fn unknown_model_name_is_rejected() {
        let mu = mu_grid(10);
        let intensity = vec![1.0; 10];
        let err = fit_model(&mu, &intensity, "power-2", &LmConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fitting);
    }

    #[test]
    fn fit_by_name_matches_fit_by_kind() {
        let mu = mu_grid(30);
        let intensity = synthetic_profile(ModelKind::Linear, &[0.6], &mu, 0.0, 3);
        let a = fit_model(&mu, &intensity, "linear", &LmConfig::default()).unwrap();
        let b = fit_kind(ModelKind::Linear, &mu, &intensity, &LmConfig::default()).unwrap();
        assert_eq!(a, b);
        assert!(a.formula.contains(r"\mu"));
    }

    #[test]
    fn too_few_samples_is_a_fitting_error() {
        let mu = [0.2, 0.6, 1.0];
        let intensity = [0.5, 0.8, 1.0];
        let err = fit_kind(ModelKind::Claret, &mu, &intensity, &LmConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fitting);
    }

    #[test]
    fn exhausted_budget_is_a_fitting_error() {
        let mu = mu_grid(30);
        let intensity = synthetic_profile(ModelKind::Claret, &[0.6, -0.2, 0.5, -0.15], &mu, 0.01, 5);
        let config = LmConfig {
            max_evaluations: 2,
            ..LmConfig::default()
        };
        let err = fit_kind(ModelKind::Claret, &mu, &intensity, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fitting);
    }

    #[test]
    fn exactly_determined_fit_reports_infinite_errors() {
        let mu = [0.3, 0.9];
        let intensity = [0.6, 0.95];
        let fit = fit_kind(ModelKind::Quadratic, &mu, &intensity, &LmConfig::default()).unwrap();
        assert!(fit.standard_errors.iter().all(|e| e.is_infinite()));
    }
}
