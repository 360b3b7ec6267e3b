//! Model catalog and evaluation for the five limb-darkening laws.
//!
//! Every law has the form
//!
//! ```text
//! I(μ)/I(1) = 1 - Σ_k p_k · g_k(μ)
//! ```
//!
//! so the solver relies on two primitive operations:
//! - fill the basis row `g_k(μ)` for a given `μ` (the Jacobian is `-g_k`)
//! - predict `I(μ)` given the coefficients
//!
//! These are implemented here for each model kind.

use serde::{Deserialize, Serialize};

use crate::domain::{FitResult, ModelKind};

/// Lower clamp for `μ` in the logarithmic law (`ln 0` is undefined).
pub const LOG_MU_FLOOR: f64 = 1e-10;

/// Static registry entry for one law.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub kind: ModelKind,
    pub param_names: &'static [&'static str],
    /// Fixed starting point for the solver. Changing these changes convergence paths.
    pub initial_guess: &'static [f64],
    /// Plain-text formula for terminal output.
    pub formula: &'static str,
    /// LaTeX formula carried on fit results.
    pub formula_latex: &'static str,
}

impl ModelSpec {
    pub fn param_count(&self) -> usize {
        self.initial_guess.len()
    }
}

pub const CATALOG: [ModelSpec; 5] = [
    ModelSpec {
        kind: ModelKind::Linear,
        param_names: &["u"],
        initial_guess: &[0.5],
        formula: "1 - u(1 - mu)",
        formula_latex: r"\frac{I(\mu)}{I(1)} = 1 - u(1 - \mu)",
    },
    ModelSpec {
        kind: ModelKind::Quadratic,
        param_names: &["a", "b"],
        initial_guess: &[0.4, 0.2],
        formula: "1 - a(1 - mu) - b(1 - mu)^2",
        formula_latex: r"\frac{I(\mu)}{I(1)} = 1 - a(1 - \mu) - b(1 - \mu)^2",
    },
    ModelSpec {
        kind: ModelKind::SquareRoot,
        param_names: &["c", "d"],
        initial_guess: &[0.4, 0.2],
        formula: "1 - c(1 - mu) - d(1 - sqrt(mu))",
        formula_latex: r"\frac{I(\mu)}{I(1)} = 1 - c(1 - \mu) - d(1 - \sqrt{\mu})",
    },
    ModelSpec {
        kind: ModelKind::Logarithmic,
        param_names: &["e", "f"],
        initial_guess: &[0.5, 0.1],
        formula: "1 - e(1 - mu) - f mu ln(mu)",
        formula_latex: r"\frac{I(\mu)}{I(1)} = 1 - e(1 - \mu) - f \mu \ln(\mu)",
    },
    ModelSpec {
        kind: ModelKind::Claret,
        param_names: &["a1", "a2", "a3", "a4"],
        initial_guess: &[0.5, -0.1, 0.4, -0.2],
        formula: "1 - sum_k a_k(1 - mu^(k/2)), k=1..4",
        formula_latex: r"\frac{I(\mu)}{I(1)} = 1 - \sum_{k=1}^{4} a_k (1 - \mu^{k/2})",
    },
];

/// Registry lookup. The catalog covers every `ModelKind`.
pub fn spec(kind: ModelKind) -> &'static ModelSpec {
    match kind {
        ModelKind::Linear => &CATALOG[0],
        ModelKind::Quadratic => &CATALOG[1],
        ModelKind::SquareRoot => &CATALOG[2],
        ModelKind::Logarithmic => &CATALOG[3],
        ModelKind::Claret => &CATALOG[4],
    }
}

/// Fill the basis row `g_k(μ)` for the given model kind.
///
/// # Panics
/// Panics if `out` does not have length `model.param_count()`.
pub fn fill_basis_row(model: ModelKind, mu: f64, out: &mut [f64]) {
    let mu = mu.max(0.0);
    match model {
        ModelKind::Linear => {
            out[0] = 1.0 - mu;
        }
        ModelKind::Quadratic => {
            let x = 1.0 - mu;
            out[0] = x;
            out[1] = x * x;
        }
        ModelKind::SquareRoot => {
            out[0] = 1.0 - mu;
            out[1] = 1.0 - mu.sqrt();
        }
        ModelKind::Logarithmic => {
            let m = mu.clamp(LOG_MU_FLOOR, 1.0);
            out[0] = 1.0 - m;
            out[1] = m * m.ln();
        }
        ModelKind::Claret => {
            let s = mu.sqrt();
            out[0] = 1.0 - s;
            out[1] = 1.0 - mu;
            out[2] = 1.0 - mu * s;
            out[3] = 1.0 - mu * mu;
        }
    }
}

/// Predict the normalized intensity `I(μ)/I(1)`.
pub fn predict(model: ModelKind, mu: f64, params: &[f64]) -> f64 {
    let mut row = [0.0; 4];
    let row = &mut row[..model.param_count()];
    fill_basis_row(model, mu, row);
    1.0 - row.iter().zip(params).map(|(g, p)| g * p).sum::<f64>()
}

/// A law with its coefficients bound, one variant per catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum LimbLaw {
    Linear { u: f64 },
    Quadratic { a: f64, b: f64 },
    SquareRoot { c: f64, d: f64 },
    Logarithmic { e: f64, f: f64 },
    Claret { a: [f64; 4] },
}

impl LimbLaw {
    /// Bind coefficients to a kind; `None` on a length mismatch.
    pub fn from_coefficients(kind: ModelKind, coefficients: &[f64]) -> Option<Self> {
        if coefficients.len() != kind.param_count() {
            return None;
        }
        let c = coefficients;
        Some(match kind {
            ModelKind::Linear => LimbLaw::Linear { u: c[0] },
            ModelKind::Quadratic => LimbLaw::Quadratic { a: c[0], b: c[1] },
            ModelKind::SquareRoot => LimbLaw::SquareRoot { c: c[0], d: c[1] },
            ModelKind::Logarithmic => LimbLaw::Logarithmic { e: c[0], f: c[1] },
            ModelKind::Claret => LimbLaw::Claret {
                a: [c[0], c[1], c[2], c[3]],
            },
        })
    }

    pub fn from_fit(fit: &FitResult) -> Option<Self> {
        Self::from_coefficients(fit.model, &fit.coefficients)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            LimbLaw::Linear { .. } => ModelKind::Linear,
            LimbLaw::Quadratic { .. } => ModelKind::Quadratic,
            LimbLaw::SquareRoot { .. } => ModelKind::SquareRoot,
            LimbLaw::Logarithmic { .. } => ModelKind::Logarithmic,
            LimbLaw::Claret { .. } => ModelKind::Claret,
        }
    }

    pub fn coefficients(&self) -> Vec<f64> {
        match *self {
            LimbLaw::Linear { u } => vec![u],
            LimbLaw::Quadratic { a, b } => vec![a, b],
            LimbLaw::SquareRoot { c, d } => vec![c, d],
            LimbLaw::Logarithmic { e, f } => vec![e, f],
            LimbLaw::Claret { a } => a.to_vec(),
        }
    }

    pub fn intensity(&self, mu: f64) -> f64 {
        predict(self.kind(), mu, &self.coefficients())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_param_counts() {
        for kind in ModelKind::ALL {
            let s = spec(kind);
            assert_eq!(s.kind, kind);
            assert_eq!(s.param_count(), kind.param_count());
            assert_eq!(s.param_names.len(), kind.param_count());
        }
    }

    #[test]
    fn every_law_is_one_at_disk_center() {
        for kind in ModelKind::ALL {
            let y = predict(kind, 1.0, spec(kind).initial_guess);
            assert!((y - 1.0).abs() < 1e-12, "{kind} at mu=1 gave {y}");
        }
    }

    #[test]
    fn closed_forms_at_the_limb() {
        // At mu = 0 the linear law is 1 - u and the quadratic law 1 - a - b.
        assert!((predict(ModelKind::Linear, 0.0, &[0.6]) - 0.4).abs() < 1e-12);
        assert!((predict(ModelKind::Quadratic, 0.0, &[0.4, 0.2]) - 0.4).abs() < 1e-12);
        assert!((predict(ModelKind::SquareRoot, 0.0, &[0.4, 0.2]) - 0.4).abs() < 1e-12);
        // Claret at mu = 0: 1 - (a1 + a2 + a3 + a4).
        let y = predict(ModelKind::Claret, 0.0, &[0.5, -0.1, 0.4, -0.2]);
        assert!((y - 0.4).abs() < 1e-12);
    }

    #[test]
    fn logarithmic_law_is_finite_at_mu_zero() {
        let y = predict(ModelKind::Logarithmic, 0.0, &[0.5, 0.1]);
        assert!(y.is_finite());
        assert!((y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tagged_law_matches_flat_prediction() {
        let law = LimbLaw::from_coefficients(ModelKind::Quadratic, &[0.3, 0.25]).unwrap();
        assert_eq!(law, LimbLaw::Quadratic { a: 0.3, b: 0.25 });
        let mu = 0.37;
        assert_eq!(law.intensity(mu), predict(ModelKind::Quadratic, mu, &[0.3, 0.25]));
        assert!(LimbLaw::from_coefficients(ModelKind::Claret, &[0.1]).is_none());
    }
}
