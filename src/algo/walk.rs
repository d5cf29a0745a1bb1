//! Personalized random walks with restart.
//!
//! A walk over a row-stochastic [`Transition`] restarts at a root node: at each
//! step, `restart` of the mass jumps back to the root and the rest follows the
//! edges. Nodes without outgoing edges send their mass to the root, so the
//! iterate stays a probability distribution.

use crate::sparse::CsrMatrix;

/// Outcome of a fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    pub converged: bool,
    /// Iterations performed.
    pub steps: usize,
    /// Max-absolute change of the last iteration.
    pub delta: f64,
}

/// `max_i |a_i - b_i|`.
pub fn max_abs_delta(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// A row-normalized weight matrix plus the list of dangling rows.
#[derive(Debug, Clone)]
pub struct Transition {
    matrix: CsrMatrix,
    dangling: Vec<usize>,
}

impl Transition {
    /// Row-normalize `weights`. Rows summing to zero are dangling.
    pub fn new(weights: &CsrMatrix) -> Self {
        let dangling = weights
            .row_sums()
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == 0.0)
            .map(|(i, _)| i)
            .collect();
        Self {
            matrix: weights.normalize_rows_l1(),
            dangling,
        }
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    pub fn dangling(&self) -> &[usize] {
        &self.dangling
    }

    pub fn node_count(&self) -> usize {
        self.matrix.rows()
    }

    /// One step of the walk without restart: `v · Q`, with the mass of dangling
    /// rows moved to `root`. Linear in `v`.
    pub fn propagate(&self, v: &[f64], root: usize) -> Vec<f64> {
        let mut out = self.matrix.vec_mul(v);
        let stranded: f64 = self.dangling.iter().map(|&i| v[i]).sum();
        out[root] += stranded;
        out
    }
}

/// Visiting probabilities of a walk restarting at `root` with probability
/// `restart`, by power iteration from the unit vector at `root`.
///
/// Stops once the max-absolute change drops below `epsilon` or after
/// `max_steps` iterations; the last iterate is returned either way.
pub fn stationary_distribution(
    transition: &Transition,
    root: usize,
    restart: f64,
    max_steps: usize,
    epsilon: f64,
) -> (Vec<f64>, Convergence) {
    let mut p = vec![0.0; transition.node_count()];
    p[root] = 1.0;

    let mut convergence = Convergence {
        converged: false,
        steps: 0,
        delta: f64::INFINITY,
    };
    for step in 1..=max_steps {
        let mut next = transition.propagate(&p, root);
        for x in &mut next {
            *x *= 1.0 - restart;
        }
        next[root] += restart;

        convergence.delta = max_abs_delta(&p, &next);
        convergence.steps = step;
        p = next;
        if convergence.delta < epsilon {
            convergence.converged = true;
            break;
        }
    }
    (p, convergence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle() -> CsrMatrix {
        // 0 -> 1 -> 2 -> 0, plus 0 -> 2
        CsrMatrix::from_triplets(
            3,
            3,
            [(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0), (0, 2, 1.0)],
        )
    }

    #[test]
    fn test_transition_rows_sum_to_one() {
        let t = Transition::new(&cycle());
        for s in t.matrix().row_sums() {
            assert!((s - 1.0).abs() < 1e-12);
        }
        assert!(t.dangling().is_empty());
    }

    #[test]
    fn test_stationary_sums_to_one() {
        let t = Transition::new(&cycle());
        let (p, conv) = stationary_distribution(&t, 0, 0.15, 200, 1e-12);
        assert!(conv.converged);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p.iter().all(|&x| x >= 0.0));
        assert!(p[0] > p[1]);
    }

    #[test]
    fn test_dangling_mass_returns_to_root() {
        // 0 -> 1, node 1 has no out-edges
        let w = CsrMatrix::from_triplets(2, 2, [(0, 1, 1.0)]);
        let t = Transition::new(&w);
        assert_eq!(t.dangling(), &[1]);
        let (p, _) = stationary_distribution(&t, 0, 0.5, 100, 1e-12);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // p0 = 0.5 + 0.5 * p1, p1 = 0.5 * p0
        assert!((p[0] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_step_cap_reports_non_convergence() {
        let t = Transition::new(&cycle());
        let (p, conv) = stationary_distribution(&t, 0, 0.15, 2, 1e-12);
        assert!(!conv.converged);
        assert_eq!(conv.steps, 2);
        assert!(conv.delta > 0.0);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
