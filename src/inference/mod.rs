//! inference — curvature-based uncertainty for fitted models.
//!
//! Purpose
//! -------
//! Provide post-estimation standard errors from the observed information
//! of an average log-likelihood at its maximum.
//!
//! Key behaviors
//! -------------
//! - [`calc_covariance`] builds the finite-difference Hessian, checks that
//!   the observed information is positive definite, and inverts it through
//!   a symmetric eigendecomposition.
//! - [`InferenceError`] / [`InferenceResult`] report why standard errors
//!   could not be produced. Model layers treat these as "unavailable", not
//!   as failed fits.
//!
//! Conventions
//! -----------
//! - Pure functions: no logging, no global state, no `unsafe`.
//! - Downstream code can `use dft_choice::inference::prelude::*;`.

pub mod errors;
pub mod hessian;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};
pub use self::hessian::{Covariance, calc_covariance};

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::hessian::{Covariance, calc_covariance};
}
