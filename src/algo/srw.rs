//! Supervised random walk (Backstrom & Leskovec, WSDM 2011).
//!
//! Each directed edge `e` gets a strength `A_e = sigmoid(psi_e · w)` from its
//! feature row `psi_e`. Row-normalizing the strengths gives the transition
//! matrix `Q0`; a walk restarting at the root with probability `alpha` has the
//! stationary distribution `P`. Training minimizes
//!
//! ```text
//! ||w||² + λ · Σ_(neg, pos) sigmoid((P[neg] - P[pos]) / width)
//! ```
//!
//! whose gradient needs `dP/dw_m` for every feature dimension `m`. Those come
//! from the fixed point
//!
//! ```text
//! dP_m = (1 - alpha) · dP_m · Q0 + P · dQ0_m
//! ```
//!
//! iterated the same way as `P` itself, one independent solve per dimension.
//! The solves run in order on the calling thread unless
//! [`SrwParams::parallel`] spreads them over the rayon pool.
//!
//! All matrices share the sparsity pattern of the adjacency matrix, so only
//! their value arrays are materialized.

use super::walk::{max_abs_delta, stationary_distribution, Convergence, Transition};
use crate::sparse::CsrMatrix;
use crate::{Error, Result};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do when an inner fixed-point solve hits `max_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvergencePolicy {
    /// Log a warning and continue with the last iterate.
    #[default]
    Warn,
    /// Fail with [`Error::NotConverged`].
    Abort,
}

/// Walk and loss parameters of one SRW objective.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SrwParams {
    /// Restart probability at the root.
    pub alpha: f64,
    /// Iteration cap of every fixed-point solve.
    pub max_steps: usize,
    /// Max-absolute change below which a fixed point counts as converged.
    pub epsilon: f64,
    /// Weight of the ranking loss against the `||w||²` regularizer.
    pub lambda: f64,
    /// Temperature of the pairwise sigmoid loss.
    pub loss_width: f64,
    /// Clip edge scores `psi · w` to `±strength_clip` before the sigmoid.
    pub strength_clip: Option<f64>,
    /// Whether a solve hitting `max_steps` warns or fails.
    pub policy: ConvergencePolicy,
    /// Solve the per-dimension derivatives on the rayon pool.
    pub parallel: bool,
}

impl Default for SrwParams {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            max_steps: 100,
            epsilon: 0.01,
            lambda: 0.01,
            loss_width: 1.0,
            strength_clip: Some(30.0),
            policy: ConvergencePolicy::Warn,
            parallel: false,
        }
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Apply the convergence policy to one solve.
pub(crate) fn check_convergence(
    convergence: &Convergence,
    quantity: &str,
    policy: ConvergencePolicy,
) -> Result<()> {
    if convergence.converged {
        return Ok(());
    }
    match policy {
        ConvergencePolicy::Warn => {
            warn!(
                quantity,
                steps = convergence.steps,
                delta = convergence.delta,
                "fixed point did not converge"
            );
            Ok(())
        }
        ConvergencePolicy::Abort => Err(Error::NotConverged {
            quantity: quantity.to_string(),
            steps: convergence.steps,
            delta: convergence.delta,
        }),
    }
}

/// The SRW objective for one root and one set of ranking pairs.
///
/// `psi` has one row per stored entry of `pattern`, in CSR storage order.
pub struct SrwObjective<'a> {
    pattern: &'a CsrMatrix,
    psi: &'a Array2<f64>,
    root: usize,
    pairs: Vec<(usize, usize)>,
    params: SrwParams,
}

impl<'a> SrwObjective<'a> {
    /// Pairs are every `(negative, positive)` combination.
    pub fn new(
        pattern: &'a CsrMatrix,
        psi: &'a Array2<f64>,
        root: usize,
        negatives: &[usize],
        positives: &[usize],
        params: SrwParams,
    ) -> Result<Self> {
        if psi.nrows() != pattern.nnz() {
            return Err(Error::DimensionMismatch {
                expected: pattern.nnz(),
                got: psi.nrows(),
            });
        }
        if root >= pattern.rows() {
            return Err(Error::InvalidConfig(format!(
                "root {} outside a graph of {} nodes",
                root,
                pattern.rows()
            )));
        }
        if !(0.0..=1.0).contains(&params.alpha) {
            return Err(Error::InvalidConfig(format!(
                "alpha must lie in [0, 1], got {}",
                params.alpha
            )));
        }
        if params.loss_width <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "loss_width must be positive, got {}",
                params.loss_width
            )));
        }
        let pairs = negatives
            .iter()
            .flat_map(|&n| positives.iter().map(move |&p| (n, p)))
            .collect();
        Ok(Self {
            pattern,
            psi,
            root,
            pairs,
            params,
        })
    }

    pub fn feature_count(&self) -> usize {
        self.psi.ncols()
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Edge strengths `A` and their slopes `dA/dS` (0 where the score is clipped).
    fn strengths(&self, w: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let clip = self.params.strength_clip;
        self.psi
            .rows()
            .into_iter()
            .map(|row| {
                let s: f64 = row.iter().zip(w).map(|(x, y)| x * y).sum();
                match clip {
                    Some(c) if s.abs() > c => (sigmoid(s.signum() * c), 0.0),
                    _ => {
                        let a = sigmoid(s);
                        (a, a * (1.0 - a))
                    }
                }
            })
            .unzip()
    }

    /// Row-normalized edge strengths `Q0` for weights `w`.
    pub fn transition(&self, w: &[f64]) -> Transition {
        let (a, _) = self.strengths(w);
        Transition::new(&self.pattern.with_data(a))
    }

    fn solve_stationary(&self, transition: &Transition) -> Result<Vec<f64>> {
        let (p, convergence) = stationary_distribution(
            transition,
            self.root,
            self.params.alpha,
            self.params.max_steps,
            self.params.epsilon,
        );
        check_convergence(&convergence, "stationary distribution", self.params.policy)?;
        Ok(p)
    }

    /// Stationary distribution of the walk under weights `w`.
    pub fn stationary(&self, w: &[f64]) -> Result<Vec<f64>> {
        self.solve_stationary(&self.transition(w))
    }

    /// Objective value only.
    pub fn objective(&self, w: &[f64]) -> Result<f64> {
        let p = self.stationary(w)?;
        Ok(self.loss(w, &p))
    }

    fn loss(&self, w: &[f64], p: &[f64]) -> f64 {
        let ranking: f64 = self
            .pairs
            .iter()
            .map(|&(n, q)| sigmoid((p[n] - p[q]) / self.params.loss_width))
            .sum();
        w.iter().map(|x| x * x).sum::<f64>() + self.params.lambda * ranking
    }

    /// Objective value and its analytic gradient at `w`.
    pub fn evaluate(&self, w: &[f64]) -> Result<(f64, Vec<f64>)> {
        if w.len() != self.feature_count() {
            return Err(Error::DimensionMismatch {
                expected: self.feature_count(),
                got: w.len(),
            });
        }
        let (a, slope) = self.strengths(w);
        let transition = Transition::new(&self.pattern.with_data(a.clone()));
        let p = self.solve_stationary(&transition)?;
        let row_sums = self.pattern.with_data(a.clone()).row_sums();

        let derivative =
            |m: usize| self.stationary_derivative(m, &a, &slope, &row_sums, &p, &transition);
        let derivatives: Vec<Vec<f64>> = if self.params.parallel {
            (0..self.feature_count())
                .into_par_iter()
                .map(derivative)
                .collect::<Result<_>>()?
        } else {
            (0..self.feature_count())
                .map(derivative)
                .collect::<Result<_>>()?
        };

        let width = self.params.loss_width;
        let mut gradient: Vec<f64> = w.iter().map(|x| 2.0 * x).collect();
        for &(n, q) in &self.pairs {
            let s = sigmoid((p[n] - p[q]) / width);
            let coef = self.params.lambda * s * (1.0 - s) / width;
            for (m, dp) in derivatives.iter().enumerate() {
                gradient[m] += coef * (dp[n] - dp[q]);
            }
        }

        Ok((self.loss(w, &p), gradient))
    }

    /// `dP/dw_m` by fixed-point iteration.
    fn stationary_derivative(
        &self,
        m: usize,
        a: &[f64],
        slope: &[f64],
        row_sums: &[f64],
        p: &[f64],
        transition: &Transition,
    ) -> Result<Vec<f64>> {
        let alpha = self.params.alpha;
        let indptr = self.pattern.indptr();
        let da: Vec<f64> = slope
            .iter()
            .zip(self.psi.column(m))
            .map(|(s, x)| s * x)
            .collect();

        // quotient rule on each row of F / rowsum(F)
        let mut dq = vec![0.0; a.len()];
        for r in 0..self.pattern.rows() {
            let norm = row_sums[r];
            if norm == 0.0 {
                continue;
            }
            let range = indptr[r]..indptr[r + 1];
            let norm_d: f64 = da[range.clone()].iter().sum();
            let scale = (1.0 - alpha) / (norm * norm);
            for e in range {
                dq[e] = scale * (da[e] * norm - a[e] * norm_d);
            }
        }
        let p_dq = self.pattern.with_data(dq).vec_mul(p);

        let mut dp = vec![0.0; p.len()];
        let mut convergence = Convergence {
            converged: false,
            steps: 0,
            delta: f64::INFINITY,
        };
        for step in 1..=self.params.max_steps {
            let total: f64 = dp.iter().sum();
            let mut next = transition.propagate(&dp, self.root);
            for (x, y) in next.iter_mut().zip(&p_dq) {
                *x = (1.0 - alpha) * *x + y;
            }
            next[self.root] += alpha * total;

            convergence.delta = max_abs_delta(&dp, &next);
            convergence.steps = step;
            dp = next;
            if convergence.delta < self.params.epsilon {
                convergence.converged = true;
                break;
            }
        }
        if !convergence.converged {
            let quantity = format!("stationary distribution derivative (m={})", m);
            check_convergence(&convergence, &quantity, self.params.policy)?;
        }
        Ok(dp)
    }
}
