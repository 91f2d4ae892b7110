//! models — estimation, reporting, and the model façade.
//!
//! - [`estimate`] runs validation, restarts and the optimizer, and
//!   returns an [`EstimationResult`].
//! - [`report`](report::report) packages the winning outcome with
//!   diagnostics and standard errors.
//! - [`DftModel`] keeps configuration, options and the last fit together
//!   for prediction; [`DftObjective`] is its `LogLikelihood`.

pub mod dft;
pub mod estimate;
pub mod report;

pub use self::dft::{DftModel, DftObjective};
pub use self::estimate::estimate;
pub use self::report::{
    EstimationResult, FitStatus, RestartOutcome, RestartSummary, SeUnavailable, StandardErrors,
};
