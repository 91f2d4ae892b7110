//! loglik_optimizer — argmin-backed maximizer for log-likelihoods.
//!
//! Purpose
//! -------
//! Give model code a single trait, [`LogLikelihood`], and two entry points:
//! [`maximize`] for smooth likelihoods (L-BFGS with a selectable line
//! search) and [`maximize_nelder_mead`] for likelihoods that are only
//! piecewise smooth, such as simulated choice frequencies.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the argmin cost
//!   `c(θ) = -ℓ(θ)` and supplies a finite-difference gradient when the model
//!   has none.
//! - [`builders`] construct the solvers from [`MLEOptions`]; [`run`] drives
//!   the executor with the iteration cap and wall-clock budget and folds the
//!   terminal state into an [`OptimOutcome`].
//! - [`finite_diff`] also exposes the central-difference gradient and
//!   Hessian helpers used for post-estimation curvature.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ` is unconstrained. Bounds and fixed parameters are handled by the
//!   caller's reparameterization (see `choice::core::view`).
//! - Model errors are values ([`OptError`]), never panics. An error raised
//!   inside a likelihood evaluation aborts the run and is returned as is.
//! - [`OptimOutcome::converged`] is `true` only when the solver met its own
//!   tolerance; exhausting a budget still returns the incumbent.
//!
//! Conventions
//! -----------
//! - All reported values (outcomes, logs) are in `ℓ` units, not cost units.
//! - Analytic gradients are `∇ℓ`; the adapter flips the sign.
//!
//! Downstream usage
//! ----------------
//! - `choice::models::estimate` implements [`LogLikelihood`] for the DFT
//!   objective and dispatches to [`maximize`] or [`maximize_nelder_mead`]
//!   per restart.
//! - `inference` uses [`finite_diff::hessian_of`] at the optimum.
//!
//! Testing notes
//! -------------
//! - Each submodule has unit tests; [`api`] runs both solvers on quadratic
//!   toy likelihoods. The choice-model integration tests exercise the full
//!   path.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{maximize, maximize_nelder_mead};
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, DEFAULT_SIMPLEX_STEP, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use dft_choice::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::{maximize, maximize_nelder_mead};
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
