//! choice — Decision Field Theory model of multi-attribute choice.
//!
//! Purpose
//! -------
//! Model how a participant picks one of `K` alternatives described by a few
//! attributes: preference for each alternative starts at a bias and grows
//! over a number of deliberation steps, one attended attribute at a time,
//! with Gaussian noise. The alternative ahead at the end is chosen. The
//! module turns that process into choice probabilities, a log-likelihood
//! over a batch of observed trials, and maximum-likelihood estimates of the
//! free parameters.
//!
//! Key behaviors
//! -------------
//! - [`core`]: attribute clamp, trial records, configuration, parameters,
//!   fixed sets, bounds, options, seeds, validation, free-parameter view.
//! - [`accumulator`]: per-trial choice probabilities (Monte Carlo or
//!   moment-matched Gaussian).
//! - [`likelihood`]: floored log-likelihood of a batch, with diagnostics.
//! - [`models`]: estimation with restarts, result packaging, the
//!   [`DftModel`](models::DftModel) façade.
//! - [`simulate`]: synthetic choices from the process model.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every call receives its full configuration; there is no global state.
//! - All randomness is derived from `(seed, unit, replicate)`, so results
//!   are reproducible under any thread count.
//!
//! Conventions
//! -----------
//! - Errors are [`DftError`](errors::DftError); trial indices are 0-based,
//!   alternative ids 1-based.
//! - Downstream code can `use dft_choice::choice::prelude::*;`.

pub mod accumulator;
pub mod core;
pub mod errors;
pub mod likelihood;
pub mod models;
pub mod simulate;

pub mod prelude {
    pub use super::accumulator::accumulate;
    pub use super::core::prelude::*;
    pub use super::errors::{ConfigError, DftError, DftResult, TrialIssue, TrialProblem};
    pub use super::likelihood::{LikelihoodDiagnostics, aggregate, aggregate_with_diagnostics};
    pub use super::models::{
        DftModel, EstimationResult, FitStatus, SeUnavailable, StandardErrors, estimate,
    };
    pub use super::simulate::{sample_from_probabilities, simulate_choices};
}
