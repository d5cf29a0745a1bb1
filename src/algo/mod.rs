//! Numerical building blocks for the recommenders.
//!
//! This module contains the random-walk solvers, the supervised random walk
//! objective with its analytic gradient, and the optimizers behind them.

/// Transition matrices and personalized stationary distributions.
pub mod walk;

/// Supervised random walk objective and gradient.
pub mod srw;

/// Bound-constrained L-BFGS minimizer.
pub mod lbfgs;

/// Nonnegative matrix factorization.
pub mod nmf;

pub use lbfgs::{minimize, LbfgsConfig, Minimum, Termination};
pub use nmf::{factorize, Factorization, NmfConfig};
pub use srw::{ConvergencePolicy, SrwObjective, SrwParams};
pub use walk::{max_abs_delta, stationary_distribution, Convergence, Transition};
