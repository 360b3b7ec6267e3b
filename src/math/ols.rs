//! Linear least squares and covariance helpers.
//!
//! Two small dense problems show up repeatedly:
//!
//! ```text
//! minimize ||A x - b||^2
//! ```
//!
//! - the damped normal equations of each Levenberg–Marquardt step (square, 1–4 columns)
//! - the algebraic circle fit in the disk locator (tall, 3 columns)
//!
//! Implementation choices:
//! - We use SVD so the same routine handles square and tall systems.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Parameter dimensions are tiny, so SVD cost is irrelevant next to model evaluation.

use nalgebra::{DMatrix, DVector};

/// Minimum-norm solution of `a · x ≈ b` via SVD.
///
/// `None` means no finite solution exists at any of the singular-value cutoffs.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = a.clone().svd(true, true);

    // Strictest cutoff first.
    [1e-10, 1e-8, 1e-6]
        .into_iter()
        .filter_map(|eps| svd.solve(b, eps).ok())
        .find(|x| x.iter().all(|v| v.is_finite()))
}

/// Unscaled parameter covariance `(JᵀJ)⁻¹` from a Jacobian.
///
/// Singular values at or below `eps · max(n, p) · s_max` mark the problem as
/// rank deficient, in which case no covariance can be estimated and `None` is
/// returned.
pub fn normal_inverse(jacobian: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    let (n, p) = jacobian.shape();
    if n < p || p == 0 {
        return None;
    }

    let svd = jacobian.clone().svd(false, true);
    let v_t = svd.v_t?;
    let s = &svd.singular_values;
    let s_max = s.amax();
    if !(s_max.is_finite() && s_max > 0.0) {
        return None;
    }
    let threshold = f64::EPSILON * n.max(p) as f64 * s_max;
    if s.iter().any(|&v| v <= threshold) {
        return None;
    }

    let inv_s2 = DMatrix::from_diagonal(&s.map(|v| 1.0 / (v * v)));
    let cov = v_t.transpose() * inv_s2 * v_t;
    cov.iter().all(|v| v.is_finite()).then_some(cov)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tall_circle_system_recovers_center_and_radius() {
        // u² + v² = D·u + E·v + F on a circle centered (3, -2) with r = 5.
        let n = 12;
        let mut a = DMatrix::<f64>::zeros(n, 3);
        let mut b = DVector::<f64>::zeros(n);
        for i in 0..n {
            let t = i as f64 * std::f64::consts::TAU / n as f64;
            let (u, v) = (3.0 + 5.0 * t.cos(), -2.0 + 5.0 * t.sin());
            a[(i, 0)] = u;
            a[(i, 1)] = v;
            a[(i, 2)] = 1.0;
            b[i] = u * u + v * v;
        }

        let sol = solve_least_squares(&a, &b).unwrap();
        let (cx, cy) = (sol[0] / 2.0, sol[1] / 2.0);
        let r = (sol[2] + cx * cx + cy * cy).sqrt();
        assert!((cx - 3.0).abs() < 1e-9, "cx={cx}");
        assert!((cy + 2.0).abs() < 1e-9, "cy={cy}");
        assert!((r - 5.0).abs() < 1e-9, "r={r}");
    }

    #[test]
    fn rank_deficient_system_gives_minimum_norm_answer() {
        // Every row identical: rank 1, still finite.
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let b = DVector::from_row_slice(&[2.0, 2.0, 2.0]);
        let x = solve_least_squares(&a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9 && (x[1] - 1.0).abs() < 1e-9, "{x}");
    }

    #[test]
    fn normal_inverse_matches_closed_form() {
        // J = [[1,0],[0,2],[0,0]] -> JᵀJ = diag(1, 4)
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        let cov = normal_inverse(&j).unwrap();
        assert!((cov[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((cov[(1, 1)] - 0.25).abs() < 1e-12);
        assert!(cov[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn normal_inverse_rejects_rank_deficient_jacobian() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(normal_inverse(&j).is_none());
        let zero = DMatrix::<f64>::zeros(4, 1);
        assert!(normal_inverse(&zero).is_none());
    }
}
