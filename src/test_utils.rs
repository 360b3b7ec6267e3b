//! Shared fixtures for unit tests.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use crate::domain::ModelKind;
use crate::models::predict;

/// `n` evenly spaced `μ` values covering `[0, 1]`, ascending.
pub fn mu_grid(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

/// Evaluate a law on `mu` and add `sigma · N(0, 1)` noise.
///
/// For a fixed seed the noise vector is the same draw scaled by `sigma`, so
/// lowering `sigma` shrinks every deviation proportionally.
pub fn synthetic_profile(kind: ModelKind, coeffs: &[f64], mu: &[f64], sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    mu.iter()
        .map(|&m| {
            let z: f64 = StandardNormal.sample(&mut rng);
            predict(kind, m, coeffs) + sigma * z
        })
        .collect()
}
