//! Nonnegative matrix factorization by multiplicative updates (Lee & Seung).
//!
//! Approximates a nonnegative `n × m` matrix `X` by `W · H` with `W` of shape
//! `n × k` and `H` of shape `k × m`, minimizing the Frobenius error. Factors
//! start from a seeded uniform draw scaled to the mean of `X`.

use crate::{Error, Result};
use ndarray::Array2;
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DIVISION_GUARD: f64 = 1e-12;

/// NMF configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NmfConfig {
    /// Latent dimension `k`.
    pub n_components: usize,
    /// Multiplicative-update rounds at most.
    pub max_iterations: usize,
    /// Stop when the error drop since the last iteration, relative to the
    /// initial error, falls below this.
    pub tolerance: f64,
    /// Seed of the factor initialization.
    pub seed: u64,
}

impl Default for NmfConfig {
    fn default() -> Self {
        Self {
            n_components: 10,
            max_iterations: 200,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

impl NmfConfig {
    pub fn with_n_components(mut self, n_components: usize) -> Self {
        self.n_components = n_components;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// `X ≈ W · H`.
#[derive(Debug, Clone)]
pub struct Factorization {
    pub w: Array2<f64>,
    pub h: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
    /// Frobenius norm of `X - W·H` at the end.
    pub reconstruction_error: f64,
}

fn frobenius_error(x: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let approx = w.dot(h);
    x.iter()
        .zip(approx.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Factorize `x`. Fails on a zero latent dimension or negative entries.
pub fn factorize(x: &Array2<f64>, config: &NmfConfig) -> Result<Factorization> {
    let k = config.n_components;
    if k == 0 {
        return Err(Error::InvalidConfig("n_components must be positive".into()));
    }
    if x.iter().any(|&v| v < 0.0 || !v.is_finite()) {
        return Err(Error::InvalidConfig(
            "nmf input must be finite and nonnegative".into(),
        ));
    }

    let (n, m) = x.dim();
    let mean = if x.is_empty() { 0.0 } else { x.mean().unwrap_or(0.0) };
    let scale = if mean > 0.0 { (mean / k as f64).sqrt() } else { 1.0 };
    let mut rng = XorShiftRng::seed_from_u64(config.seed);
    let mut w = Array2::from_shape_fn((n, k), |_| rng.random::<f64>() * scale);
    let mut h = Array2::from_shape_fn((k, m), |_| rng.random::<f64>() * scale);

    let initial = frobenius_error(x, &w, &h);
    let mut previous = initial;
    let mut converged = initial == 0.0;
    let mut iterations = 0;

    while !converged && iterations < config.max_iterations {
        // H <- H * (Wᵀ X) / (Wᵀ W H)
        let numerator = w.t().dot(x);
        let denominator = w.t().dot(&w).dot(&h);
        h.zip_mut_with(&numerator, |v, &num| *v *= num);
        h.zip_mut_with(&denominator, |v, &den| *v /= den + DIVISION_GUARD);

        // W <- W * (X Hᵀ) / (W H Hᵀ)
        let numerator = x.dot(&h.t());
        let denominator = w.dot(&h).dot(&h.t());
        w.zip_mut_with(&numerator, |v, &num| *v *= num);
        w.zip_mut_with(&denominator, |v, &den| *v /= den + DIVISION_GUARD);

        iterations += 1;
        let error = frobenius_error(x, &w, &h);
        if (previous - error) / initial < config.tolerance {
            converged = true;
        }
        previous = error;
    }

    debug!(
        iterations,
        converged,
        error = previous,
        "nmf finished"
    );
    Ok(Factorization {
        w,
        h,
        iterations,
        converged,
        reconstruction_error: previous,
    })
}
