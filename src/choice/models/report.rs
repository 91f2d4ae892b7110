//! Packaging of a finished fit.
//!
//! Purpose
//! -------
//! Turn the winning optimizer outcome into an [`EstimationResult`]: the full
//! fitted parameter vector (fixed values included), the log-likelihood on
//! the summed scale, an explicit convergence status, restart summaries,
//! likelihood diagnostics and, when the surface allows it, standard errors.
//!
//! Key behaviors
//! -------------
//! - A fit that stopped on its iteration or time budget is reported as
//!   [`FitStatus::NonConvergence`], never as converged.
//! - Standard errors come from `inference::calc_covariance` on the natural
//!   scale of the free parameters. They are [`StandardErrors::Unavailable`]
//!   with a reason when disabled, when nothing is free, when the likelihood
//!   is simulated (piecewise constant), or when the observed information is
//!   not positive definite.
use crate::{
    choice::{
        core::{
            data::TrialRecord,
            options::Strategy,
            params::{ParamName, ParameterVector},
        },
        likelihood::{LikelihoodDiagnostics, LikelihoodEvaluation},
        models::dft::DftObjective,
    },
    inference::{InferenceError, calc_covariance},
    optimization::{
        errors::OptResult,
        loglik_optimizer::{FnEvalMap, OptimOutcome},
    },
};
use ndarray::Array1;
use serde::Serialize;
use tracing::warn;

/// Whether the optimizer met its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FitStatus {
    Converged,
    /// Iteration or time budget exhausted; the incumbent is still reported.
    NonConvergence,
}

/// Why standard errors were not computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SeUnavailable {
    /// Switched off in the options.
    Disabled,
    /// Every parameter was fixed.
    NoFreeParameters,
    /// Monte Carlo likelihood: flat almost everywhere under common random
    /// numbers.
    NotSmooth,
    NotPositiveDefinite { min_eigenvalue: f64 },
    HessianFailed { text: String },
}

impl From<InferenceError> for SeUnavailable {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::NotPositiveDefinite { min_eigenvalue } => {
                SeUnavailable::NotPositiveDefinite { min_eigenvalue }
            }
            other => SeUnavailable::HessianFailed { text: other.to_string() },
        }
    }
}

/// Standard errors of the free parameters, or the reason there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StandardErrors {
    Available {
        /// Free parameter names, in `θ` order.
        names: Vec<String>,
        values: Vec<f64>,
        covariance: Vec<Vec<f64>>,
    },
    Unavailable(SeUnavailable),
}

impl StandardErrors {
    pub fn is_available(&self) -> bool {
        matches!(self, StandardErrors::Available { .. })
    }

    /// Standard error of `name`, if available and free.
    pub fn get(&self, name: &str) -> Option<f64> {
        match self {
            StandardErrors::Available { names, values, .. } => {
                names.iter().position(|n| n == name).map(|i| values[i])
            }
            StandardErrors::Unavailable(_) => None,
        }
    }
}

/// What happened to one restart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RestartOutcome {
    Finished { log_likelihood: f64, converged: bool, termination: String, iterations: usize },
    Failed { reason: String },
    /// Not started because the wall-clock budget was already spent.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestartSummary {
    /// 0 is the caller's starting point; others are perturbed copies.
    pub index: usize,
    pub outcome: RestartOutcome,
}

/// Everything a caller gets back from an estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    /// Fitted values, fixed parameters included.
    pub params: ParameterVector,
    /// Summed log-likelihood at `params`.
    pub log_likelihood: f64,
    pub status: FitStatus,
    /// Termination reason as reported by the solver.
    pub termination: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub n_trials: usize,
    /// Names of the estimated parameters.
    pub free: Vec<String>,
    pub best_restart: usize,
    pub restarts: Vec<RestartSummary>,
    pub diagnostics: LikelihoodDiagnostics,
    pub standard_errors: StandardErrors,
}

impl EstimationResult {
    pub fn converged(&self) -> bool {
        self.status == FitStatus::Converged
    }

    /// Log-likelihood per trial.
    pub fn average_log_likelihood(&self) -> f64 {
        if self.n_trials == 0 { 0.0 } else { self.log_likelihood / self.n_trials as f64 }
    }

    /// Fitted `(name, value)` pairs in canonical order
    /// (`asc_1 … b_* … phi1, phi2, error_sd, timesteps`).
    pub fn to_named(&self) -> Vec<(String, f64)> {
        self.params.to_named()
    }

    pub fn with_restarts(mut self, restarts: Vec<RestartSummary>, best_restart: usize) -> Self {
        self.restarts = restarts;
        self.best_restart = best_restart;
        self
    }
}

/// Assemble the result for the winning outcome.
///
/// `params` must be the parameter vector of `outcome.theta_hat` and
/// `evaluation` the likelihood evaluated there.
pub fn report(
    outcome: &OptimOutcome, params: ParameterVector, evaluation: &LikelihoodEvaluation,
    free: &[ParamName], standard_errors: StandardErrors,
) -> EstimationResult {
    let status = if outcome.converged { FitStatus::Converged } else { FitStatus::NonConvergence };
    EstimationResult {
        params,
        log_likelihood: evaluation.log_likelihood,
        status,
        termination: outcome.status.clone(),
        iterations: outcome.iterations,
        fn_evals: outcome.fn_evals.clone(),
        n_trials: evaluation.diagnostics.n_trials,
        free: free.iter().map(|n| n.to_string()).collect(),
        best_restart: 0,
        restarts: Vec::new(),
        diagnostics: evaluation.diagnostics,
        standard_errors,
    }
}

/// Standard errors of the free parameters of `objective` at `params`.
pub fn standard_errors(
    objective: &DftObjective, trials: &[TrialRecord], params: &ParameterVector,
) -> StandardErrors {
    if !objective.options.standard_errors {
        return StandardErrors::Unavailable(SeUnavailable::Disabled);
    }
    if objective.view.is_empty() {
        return StandardErrors::Unavailable(SeUnavailable::NoFreeParameters);
    }
    if let Strategy::MonteCarlo { .. } = objective.options.strategy {
        return StandardErrors::Unavailable(SeUnavailable::NotSmooth);
    }

    let natural = objective.view.natural_of(params);
    let f = |x: &Array1<f64>| -> OptResult<f64> { Ok(objective.average_natural(x, trials)?) };
    match calc_covariance(&f, &natural, trials.len()) {
        Ok(cov) => StandardErrors::Available {
            names: objective.view.free_names().iter().map(|n| n.to_string()).collect(),
            values: cov.standard_errors.to_vec(),
            covariance: cov.matrix.outer_iter().map(|row| row.to_vec()).collect(),
        },
        Err(err) => {
            warn!(error = %err, "standard errors unavailable");
            StandardErrors::Unavailable(err.into())
        }
    }
}
