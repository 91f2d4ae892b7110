//! Log-likelihood of a batch of trials.
//!
//! Purpose
//! -------
//! Sum `ln p(chosen)` over trials for one parameter vector, where each
//! probability comes from the accumulator, and report how often the
//! probability floor or exact symmetry was involved.
//!
//! Key behaviors
//! -------------
//! - Trials are evaluated in parallel with rayon; trial `t` always uses its
//!   own random stream (`derive_seed(seed, t, ·)`), so the sum is identical
//!   whatever the thread count.
//! - With a floor `ε` (default `1e-9`) each contribution is
//!   `ln max(p, ε)` of the floored, renormalized probability: always finite.
//!   With the floor disabled the raw probability is used and the sum may be
//!   `−∞` (never `+∞`).
//! - Panel grouping does not change the likelihood: it is a flat sum over
//!   trials either way. [`LikelihoodEvaluation::by_group`] exposes the
//!   per-participant subtotals for reporting.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each trial must name an available chosen alternative; otherwise the
//!   evaluation fails with [`DftError::InvalidTrialData`] for that trial.
//!   Full-batch validation (`validate_trials`) is the caller's job.
use crate::choice::{
    accumulator::{accumulate_raw, floor_probabilities},
    core::{data::TrialRecord, options::EstimationOptions, params::ParameterVector},
    errors::{DftError, DftResult, TrialIssue, TrialProblem},
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Spread below which a trial's available probabilities count as equal.
pub const SYMMETRY_TOL: f64 = 1e-9;

/// How often the floor or exact symmetry determined a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LikelihoodDiagnostics {
    pub n_trials: usize,
    /// Trials whose chosen-alternative probability was below the floor.
    pub floored: usize,
    /// Trials whose available alternatives had (numerically) equal
    /// probabilities.
    pub symmetric: usize,
    /// More than half the trials were floored, or more than half symmetric.
    pub pervasive: bool,
}

impl LikelihoodDiagnostics {
    fn from_counts(n_trials: usize, floored: usize, symmetric: usize) -> LikelihoodDiagnostics {
        let pervasive = n_trials > 0 && (2 * floored > n_trials || 2 * symmetric > n_trials);
        LikelihoodDiagnostics { n_trials, floored, symmetric, pervasive }
    }
}

/// Total log-likelihood, per-trial contributions and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct LikelihoodEvaluation {
    pub log_likelihood: f64,
    pub contributions: Vec<f64>,
    pub diagnostics: LikelihoodDiagnostics,
    groups: Vec<String>,
}

impl LikelihoodEvaluation {
    /// Subtotals by panel group (participant unless a panel key is set).
    pub fn by_group(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for (group, ll) in self.groups.iter().zip(&self.contributions) {
            *out.entry(group.clone()).or_insert(0.0) += ll;
        }
        out
    }
}

struct Contribution {
    log_p: f64,
    floored: bool,
    symmetric: bool,
}

/// `Σ_t ln p_t(chosen)`.
///
/// # Errors
/// - [`DftError::InvalidTrialData`] for a trial without an available choice
///   or with malformed attributes.
/// - Strategy errors from the accumulator.
pub fn aggregate(
    trials: &[TrialRecord], params: &ParameterVector, options: &EstimationOptions,
) -> DftResult<f64> {
    Ok(aggregate_with_diagnostics(trials, params, options)?.log_likelihood)
}

/// [`aggregate`] plus per-trial contributions and floor/symmetry counts.
///
/// # Errors
/// As for [`aggregate`].
pub fn aggregate_with_diagnostics(
    trials: &[TrialRecord], params: &ParameterVector, options: &EstimationOptions,
) -> DftResult<LikelihoodEvaluation> {
    let parts: Vec<Contribution> = trials
        .par_iter()
        .enumerate()
        .map(|(t, trial)| contribution(t, trial, params, options))
        .collect::<DftResult<_>>()?;

    let floored = parts.iter().filter(|c| c.floored).count();
    let symmetric = parts.iter().filter(|c| c.symmetric).count();
    let contributions: Vec<f64> = parts.iter().map(|c| c.log_p).collect();
    Ok(LikelihoodEvaluation {
        log_likelihood: contributions.iter().sum(),
        contributions,
        diagnostics: LikelihoodDiagnostics::from_counts(trials.len(), floored, symmetric),
        groups: trials.iter().map(|t| t.group().to_string()).collect(),
    })
}

fn contribution(
    t: usize, trial: &TrialRecord, params: &ParameterVector, options: &EstimationOptions,
) -> DftResult<Contribution> {
    let issue = |problem| DftError::InvalidTrialData {
        issues: vec![TrialIssue::new(t, "choice", problem)],
    };
    let chosen_id = trial.chosen.ok_or_else(|| issue(TrialProblem::MissingChoice))?;
    let c = trial
        .chosen_index()
        .ok_or_else(|| issue(TrialProblem::UnknownChoice { choice: chosen_id }))?;
    if !trial.alternatives[c].available {
        return Err(issue(TrialProblem::ChosenUnavailable { choice: chosen_id }));
    }

    let raw = accumulate_raw(trial, params, options, t)?;
    let available: Vec<usize> =
        trial.alternatives.iter().enumerate().filter(|(_, a)| a.available).map(|(i, _)| i).collect();
    let symmetric = available.len() > 1 && {
        let (lo, hi) = available
            .iter()
            .map(|&i| raw[i])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p), hi.max(p)));
        hi - lo <= SYMMETRY_TOL
    };

    let (log_p, floored) = match options.prob_floor {
        Some(eps) => {
            let p = floor_probabilities(&raw, &available, eps)[c];
            (p.max(eps).ln(), raw[c] < eps)
        }
        None => (raw[c].ln(), false),
    };
    Ok(Contribution { log_p, floored, symmetric })
}
