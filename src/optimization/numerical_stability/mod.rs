//! numerical_stability — stable transforms and shared tolerances.
//!
//! Purpose
//! -------
//! Keep the overflow-safe scalar maps and the box reparameterization used
//! by the estimator in one place, together with the small tolerances shared
//! by the optimizer and inference layers.
//!
//! Key behaviors
//! -------------
//! - `safe_softplus`, `safe_softplus_inv`, `safe_logistic` and `logit`
//!   evaluate on the branch that cannot overflow.
//! - `from_unconstrained` / `to_unconstrained` map between the solver's
//!   real line and a parameter's `[lower, upper]` box.
//!
//! Conventions
//! -----------
//! - Pure `f64` functions; no logging, no allocation.
//! - Bounds are `Option<f64>` per side; validation of `lower ≤ upper`
//!   happens where bounds are configured (`choice::core::bounds`).
//!
//! Downstream usage
//! ----------------
//! - `choice::core::view` maps free parameters through the box maps.
//! - `inference::hessian` uses `EIGEN_EPS` for its definiteness check.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    BOUND_NUDGE, EIGEN_EPS, LOGIT_EPS, from_unconstrained, logit, safe_logistic,
    safe_softplus, safe_softplus_inv, to_unconstrained,
};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::transformations::{
        EIGEN_EPS, from_unconstrained, safe_logistic, safe_softplus, to_unconstrained,
    };
}
