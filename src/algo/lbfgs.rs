//! Limited-memory BFGS with optional box constraints.
//!
//! The search direction comes from the classic two-loop recursion over the
//! last `memory` curvature pairs; iterates are projected onto the box and the
//! step is chosen by backtracking until the Armijo condition holds. Free
//! variables are those not pinned at a bound with the gradient pushing
//! outward.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const ARMIJO: f64 = 1e-4;

/// L-BFGS configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LbfgsConfig {
    /// Number of stored curvature pairs.
    pub memory: usize,
    /// Outer iteration cap; reaching it is a normal termination.
    pub max_iterations: usize,
    /// Stop when the largest projected gradient component is below this.
    pub gradient_tolerance: f64,
    /// Stop when the relative objective reduction is below this.
    pub reduction_tolerance: f64,
    /// Backtracking halvings allowed per iteration.
    pub max_line_search: usize,
    /// Common `(lower, upper)` bound for every coordinate.
    pub bounds: Option<(f64, f64)>,
}

impl Default for LbfgsConfig {
    fn default() -> Self {
        Self {
            memory: 10,
            max_iterations: 100,
            gradient_tolerance: 1e-5,
            reduction_tolerance: 2.22e-9,
            max_line_search: 30,
            bounds: None,
        }
    }
}

impl LbfgsConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.bounds = Some((lower, upper));
        self
    }

    fn validate(&self) -> Result<()> {
        if self.memory == 0 {
            return Err(Error::InvalidConfig("lbfgs memory must be positive".into()));
        }
        if let Some((lo, hi)) = self.bounds {
            if lo > hi {
                return Err(Error::InvalidConfig(format!(
                    "empty lbfgs bounds [{}, {}]",
                    lo, hi
                )));
            }
        }
        Ok(())
    }
}

/// Why the minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    GradientTolerance,
    ReductionTolerance,
    MaxIterations,
    LineSearchFailed,
}

/// Best point found.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub gradient: Vec<f64>,
    pub iterations: usize,
    pub evaluations: usize,
    pub termination: Termination,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn project(x: &mut [f64], bounds: Option<(f64, f64)>) {
    if let Some((lo, hi)) = bounds {
        for v in x {
            *v = v.clamp(lo, hi);
        }
    }
}

/// Coordinates held at a bound by a gradient pointing outward.
fn pinned(x: &[f64], g: &[f64], bounds: Option<(f64, f64)>) -> Vec<bool> {
    match bounds {
        None => vec![false; x.len()],
        Some((lo, hi)) => x
            .iter()
            .zip(g)
            .map(|(&xi, &gi)| (xi <= lo && gi > 0.0) || (xi >= hi && gi < 0.0))
            .collect(),
    }
}

/// `-H · g` from the stored `(s, y)` pairs.
fn two_loop(g: &[f64], history: &VecDeque<(Vec<f64>, Vec<f64>, f64)>) -> Vec<f64> {
    let mut q = g.to_vec();
    let mut alphas = Vec::with_capacity(history.len());
    for (s, y, rho) in history.iter().rev() {
        let a = rho * dot(s, &q);
        for (qi, yi) in q.iter_mut().zip(y) {
            *qi -= a * yi;
        }
        alphas.push(a);
    }
    if let Some((s, y, _)) = history.back() {
        let gamma = dot(s, y) / dot(y, y);
        for qi in &mut q {
            *qi *= gamma;
        }
    }
    for ((s, y, rho), a) in history.iter().zip(alphas.into_iter().rev()) {
        let b = rho * dot(y, &q);
        for (qi, si) in q.iter_mut().zip(s) {
            *qi += (a - b) * si;
        }
    }
    q.iter().map(|v| -v).collect()
}

/// Minimize `f` from `x0`. `f` returns the objective value and its gradient.
pub fn minimize<F>(mut f: F, x0: Vec<f64>, config: &LbfgsConfig) -> Result<Minimum>
where
    F: FnMut(&[f64]) -> Result<(f64, Vec<f64>)>,
{
    config.validate()?;
    let bounds = config.bounds;

    let mut x = x0;
    project(&mut x, bounds);
    let (mut value, mut gradient) = f(&x)?;
    let mut evaluations = 1;
    if gradient.len() != x.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            got: gradient.len(),
        });
    }

    let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(config.memory);
    let finish = |x, value, gradient, iterations, evaluations, termination| Minimum {
        x,
        value,
        gradient,
        iterations,
        evaluations,
        termination,
    };

    for iteration in 0..config.max_iterations {
        let fixed = pinned(&x, &gradient, bounds);
        let pg: Vec<f64> = gradient
            .iter()
            .zip(&fixed)
            .map(|(&g, &p)| if p { 0.0 } else { g })
            .collect();
        let pg_norm = pg.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        if pg_norm <= config.gradient_tolerance {
            return Ok(finish(
                x,
                value,
                gradient,
                iteration,
                evaluations,
                Termination::GradientTolerance,
            ));
        }

        let mut direction = two_loop(&pg, &history);
        for (d, &p) in direction.iter_mut().zip(&fixed) {
            if p {
                *d = 0.0;
            }
        }
        if dot(&direction, &pg) >= 0.0 {
            history.clear();
            direction = pg.iter().map(|v| -v).collect();
        }
        // the first step has no curvature information to scale it
        let mut step = if history.is_empty() {
            (1.0 / pg_norm).min(1.0)
        } else {
            1.0
        };

        let mut accepted = None;
        for _ in 0..config.max_line_search {
            let mut candidate: Vec<f64> = x
                .iter()
                .zip(&direction)
                .map(|(xi, di)| xi + step * di)
                .collect();
            project(&mut candidate, bounds);
            let moved: Vec<f64> = candidate.iter().zip(&x).map(|(a, b)| a - b).collect();
            if moved.iter().all(|&v| v == 0.0) {
                break;
            }
            let (next_value, next_gradient) = f(&candidate)?;
            evaluations += 1;
            let decrease = dot(&gradient, &moved).min(0.0);
            if next_value.is_finite() && next_value <= value + ARMIJO * decrease {
                accepted = Some((candidate, next_value, next_gradient, moved));
                break;
            }
            step *= 0.5;
        }

        let Some((next_x, next_value, next_gradient, s)) = accepted else {
            return Ok(finish(
                x,
                value,
                gradient,
                iteration,
                evaluations,
                Termination::LineSearchFailed,
            ));
        };

        let y: Vec<f64> = next_gradient
            .iter()
            .zip(&gradient)
            .map(|(a, b)| a - b)
            .collect();
        let sy = dot(&s, &y);
        if sy > 1e-10 {
            if history.len() == config.memory {
                history.pop_front();
            }
            history.push_back((s, y, 1.0 / sy));
        }

        let reduction = (value - next_value) / value.abs().max(next_value.abs()).max(1.0);
        x = next_x;
        value = next_value;
        gradient = next_gradient;
        if reduction <= config.reduction_tolerance {
            return Ok(finish(
                x,
                value,
                gradient,
                iteration + 1,
                evaluations,
                Termination::ReductionTolerance,
            ));
        }
    }

    Ok(finish(
        x,
        value,
        gradient,
        config.max_iterations,
        evaluations,
        Termination::MaxIterations,
    ))
}
