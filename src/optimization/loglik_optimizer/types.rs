//! loglik_optimizer::types — numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Keep the `ndarray` and Argmin generics in one place so the rest of the
//! optimizer (and the choice model on top of it) speaks in terms of
//! `Theta`, `Grad`, `Hessian` and `Cost` only.
//!
//! Conventions
//! -----------
//! - `Theta` is the unconstrained free-parameter vector. For the choice
//!   model its length equals the number of parameters that are not held
//!   fixed; mapping to named model parameters happens in
//!   `choice::core::view`.
//! - `Cost` is the scalar the solvers minimize, `c(θ) = -ℓ(θ)`.
//! - `Hessian` is dense and square, `theta.len() × theta.len()`.
//!
//! Testing notes
//! -------------
//! - Aliases only; exercised through the builder and runner tests.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Unconstrained parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient vector, same shape as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense `n × n` second-derivative matrix.
pub type Hessian = Array2<f64>;

/// Scalar objective value seen by the solvers.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Default edge length of the initial Nelder–Mead simplex, in `θ` units.
pub const DEFAULT_SIMPLEX_STEP: f64 = 0.5;

/// Hager–Zhang line search over the crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search over the crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS wired to Hager–Zhang.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS wired to More–Thuente.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Derivative-free simplex search, used when the likelihood is noisy or
/// piecewise constant (Monte Carlo choice probabilities).
pub type NelderMeadSolver = NelderMead<Theta, Cost>;
