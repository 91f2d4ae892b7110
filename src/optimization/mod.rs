//! optimization — maximum-likelihood machinery independent of any model.
//!
//! Purpose
//! -------
//! Bundle the argmin-backed maximizer (`loglik_optimizer`), the stable
//! reparameterization helpers (`numerical_stability`), and one error type
//! (`errors::OptError`) for everything that can go wrong while configuring
//! or running a solver.
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers see an unconstrained `θ`; the choice model owns the mapping to
//!   named, bounded parameters.
//! - Failures are `OptResult<T>` values; model-layer errors raised during
//!   an evaluation cross this boundary as `OptError::Model` or, when they
//!   originated here, unchanged.
//!
//! Conventions
//! -----------
//! - Everything is phrased as maximizing `ℓ(θ)`; the `c(θ) = -ℓ(θ)` flip is
//!   internal to the adapter.
//! - No logging here. Restart-level and run-level logging lives in
//!   `choice::models::estimate`; per-iteration solver output is available
//!   through the `obs_slog` feature.
//!
//! Testing notes
//! -------------
//! - Unit tests per submodule; the full path is covered by the choice-model
//!   integration tests.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use dft_choice::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
