//! Levenberg–Marquardt solver for small nonlinear least-squares problems.
//!
//! Minimizes `Σ r_i(p)^2` where `r_i = y_i - f(x_i; p)`. Problems supply the
//! residuals and the *model* Jacobian `∂f/∂p`; the step solves
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = Jᵀ r
//! ```
//!
//! Work is bounded by a function-evaluation budget: every residual evaluation
//! and every Jacobian evaluation counts as one.

use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

/// Floor applied to diagonal entries before damping, so flat directions still move.
const DIAG_FLOOR: f64 = 1e-12;

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum residual + Jacobian evaluations before giving up.
    pub max_evaluations: usize,
    /// Initial damping parameter.
    pub initial_lambda: f64,
    /// Factor applied to lambda after a rejected step.
    pub lambda_up: f64,
    /// Factor applied to lambda after an accepted step.
    pub lambda_down: f64,
    /// Damping ceiling; exceeding it ends the run.
    pub max_lambda: f64,
    /// Relative cost reduction below which an accepted step counts as converged.
    pub ftol: f64,
    /// Relative step size below which the iterate counts as converged.
    pub xtol: f64,
    /// Gradient infinity-norm below which the iterate counts as converged.
    pub gtol: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e12,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-10,
        }
    }
}

/// A least-squares problem the solver can drive.
pub trait LeastSquaresProblem {
    fn n_params(&self) -> usize;

    fn n_samples(&self) -> usize;

    /// Fill `out[i] = y_i - f(x_i; params)`.
    fn residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>);

    /// Fill `out[(i, k)] = ∂f(x_i; params)/∂p_k`.
    fn jacobian(&self, params: &DVector<f64>, out: &mut DMatrix<f64>);
}

/// Result of a solver run.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: DVector<f64>,
    /// Final `Σ r_i^2`.
    pub cost: f64,
    /// Model Jacobian at `params`.
    pub jacobian: DMatrix<f64>,
    pub evaluations: usize,
    pub iterations: usize,
    pub converged: bool,
}

/// Run Levenberg–Marquardt from `initial`.
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    config: &LmConfig,
) -> LmOutcome {
    let n = problem.n_samples();
    let p = problem.n_params();

    let mut params = initial;
    let mut residuals = DVector::<f64>::zeros(n);
    let mut trial_residuals = DVector::<f64>::zeros(n);
    let mut jacobian = DMatrix::<f64>::zeros(n, p);

    problem.residuals(&params, &mut residuals);
    let mut evaluations = 1usize;
    let mut cost = residuals.norm_squared();

    let mut lambda = config.initial_lambda;
    let mut converged = false;
    let mut iterations = 0usize;
    let mut jacobian_stale = true;

    if !cost.is_finite() {
        problem.jacobian(&params, &mut jacobian);
        return LmOutcome {
            params,
            cost,
            jacobian,
            evaluations: evaluations + 1,
            iterations,
            converged,
        };
    }

    while evaluations < config.max_evaluations {
        if cost == 0.0 {
            converged = true;
            break;
        }
        if jacobian_stale {
            problem.jacobian(&params, &mut jacobian);
            evaluations += 1;
            jacobian_stale = false;
        }
        iterations += 1;

        let jt = jacobian.transpose();
        let hessian = &jt * &jacobian;
        let gradient = &jt * &residuals;

        if gradient.amax() <= config.gtol {
            converged = true;
            break;
        }

        let mut damped = hessian.clone();
        for i in 0..p {
            let d = hessian[(i, i)];
            damped[(i, i)] = d + lambda * d.max(DIAG_FLOOR);
        }

        let Some(delta) = solve_least_squares(&damped, &gradient) else {
            lambda *= config.lambda_up;
            if lambda > config.max_lambda {
                break;
            }
            continue;
        };

        if delta.amax() <= config.xtol * (params.amax() + config.xtol) {
            converged = true;
            break;
        }

        let trial = &params + &delta;
        problem.residuals(&trial, &mut trial_residuals);
        evaluations += 1;
        let trial_cost = trial_residuals.norm_squared();

        if trial_cost.is_finite() && trial_cost <= cost {
            let reduction = cost - trial_cost;
            let previous = cost;

            params = trial;
            std::mem::swap(&mut residuals, &mut trial_residuals);
            cost = trial_cost;
            jacobian_stale = true;
            lambda = (lambda * config.lambda_down).max(f64::MIN_POSITIVE);

            if reduction <= config.ftol * previous {
                converged = true;
                break;
            }
        } else {
            lambda *= config.lambda_up;
            if lambda > config.max_lambda {
                break;
            }
        }
    }

    if jacobian_stale {
        problem.jacobian(&params, &mut jacobian);
    }

    LmOutcome {
        params,
        cost,
        jacobian,
        evaluations,
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = a · exp(b · x)
    struct ExpDecay {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for ExpDecay {
        fn n_params(&self) -> usize {
            2
        }

        fn n_samples(&self) -> usize {
            self.x.len()
        }

        fn residuals(&self, params: &DVector<f64>, out: &mut DVector<f64>) {
            for (i, (&x, &y)) in self.x.iter().zip(&self.y).enumerate() {
                out[i] = y - params[0] * (params[1] * x).exp();
            }
        }

        fn jacobian(&self, params: &DVector<f64>, out: &mut DMatrix<f64>) {
            for (i, &x) in self.x.iter().enumerate() {
                let e = (params[1] * x).exp();
                out[(i, 0)] = e;
                out[(i, 1)] = params[0] * x * e;
            }
        }
    }

    #[test]
    fn recovers_exponential_parameters() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|&x| 2.5 * (-1.3 * x).exp()).collect();
        let problem = ExpDecay { x, y };

        let out = minimize(&problem, DVector::from_row_slice(&[1.0, -0.5]), &LmConfig::default());
        assert!(out.converged);
        assert!((out.params[0] - 2.5).abs() < 1e-6, "a={}", out.params[0]);
        assert!((out.params[1] + 1.3).abs() < 1e-6, "b={}", out.params[1]);
        assert!(out.cost < 1e-12);
    }

    #[test]
    fn respects_evaluation_budget() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|&x| 2.5 * (-1.3 * x).exp()).collect();
        let problem = ExpDecay { x, y };

        let config = LmConfig {
            max_evaluations: 3,
            ..LmConfig::default()
        };
        let out = minimize(&problem, DVector::from_row_slice(&[1.0, -0.5]), &config);
        assert!(!out.converged);
        assert!(out.evaluations <= 3);
    }
}
