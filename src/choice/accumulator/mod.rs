//! accumulator — choice probabilities of the DFT evidence-accumulation
//! process for one trial.
//!
//! Purpose
//! -------
//! Turn one [`TrialRecord`] and one [`ParameterVector`] into a probability
//! vector over the trial's alternatives: the probability that each
//! alternative has the largest accumulated preference at the end of
//! deliberation.
//!
//! Key behaviors
//! -------------
//! - [`TrialInputs::new`] clamps attribute values into `[0.01, 1]`, scales
//!   them by the weights `exp(b_j)`, and records which alternatives are
//!   available.
//! - Two strategies ([`Strategy`]):
//!   - `MonteCarlo { replicates }`: empirical win frequencies
//!     ([`monte_carlo`]), seeded per `(seed, trial, replicate)`.
//!   - `Gaussian`: exact integration of a moment-matched normal
//!     approximation ([`gaussian`]); at most three available alternatives.
//! - [`accumulate`] floors every available entry at the probability floor
//!   and renormalizes, so available alternatives have strictly positive
//!   probability and unavailable ones exactly zero.
//!
//! Invariants & assumptions
//! ------------------------
//! - The output has one entry per alternative in trial order and sums to 1
//!   over the available alternatives (when at least one is available).
//! - Missing or non-finite attribute values are reported as
//!   [`DftError::InvalidTrialData`], never silently imputed.
//!
//! Conventions
//! -----------
//! - The Monte Carlo path length is `round(T_c)` (at least one); the
//!   Gaussian moments use `T_c` itself, with the attention-correlation sum
//!   interpolated between neighbouring integer horizons.
//!
//! Testing notes
//! -------------
//! - Submodules test their own pieces; the tests below check the
//!   behavioral properties of the full accumulator (symmetry, monotonicity,
//!   binary degeneration, the concrete energy scenario, agreement of the two
//!   strategies, and the floor).

pub mod attention;
pub mod bvn;
pub mod gaussian;
pub mod monte_carlo;

use crate::choice::{
    core::{
        attributes::clamp_attribute,
        data::TrialRecord,
        options::{EstimationOptions, Strategy},
        params::ParameterVector,
    },
    errors::{ConfigError, DftError, DftResult, TrialIssue, TrialProblem},
};
use ndarray::Array2;

/// Per-trial quantities the strategies consume.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialInputs {
    /// Positions (0-based) of the available alternatives.
    pub available: Vec<usize>,
    /// Start bias of every alternative.
    pub start: Vec<f64>,
    /// `K × J` matrix of `exp(b_j)·clamp(v_ij)`.
    pub evidence: Array2<f64>,
}

impl TrialInputs {
    /// # Errors
    /// [`DftError::InvalidTrialData`] (trial index 0) when the alternative
    /// count differs from the parameter layout or an attribute is missing
    /// or non-finite.
    pub fn new(trial: &TrialRecord, params: &ParameterVector) -> DftResult<TrialInputs> {
        let k = params.n_alternatives();
        if trial.alternatives.len() != k {
            return Err(DftError::InvalidTrialData {
                issues: vec![TrialIssue::new(
                    0,
                    "alternatives",
                    TrialProblem::AlternativeCount { expected: k, found: trial.alternatives.len() },
                )],
            });
        }
        let weights = params.attribute_weights();
        let attributes = params.attributes();
        let mut evidence = Array2::zeros((k, attributes.len()));
        let mut issues = Vec::new();
        for (i, alt) in trial.alternatives.iter().enumerate() {
            for (j, attribute) in attributes.iter().enumerate() {
                let field = || format!("robot{}{}", alt.id, attribute);
                match alt.profile.get(*attribute) {
                    Some(v) if v.is_finite() => evidence[[i, j]] = weights[j] * clamp_attribute(v),
                    Some(value) => {
                        issues.push(TrialIssue::new(0, field(), TrialProblem::NonFiniteAttribute { value }))
                    }
                    None => issues.push(TrialIssue::new(0, field(), TrialProblem::MissingAttribute)),
                }
            }
        }
        if !issues.is_empty() {
            return Err(DftError::InvalidTrialData { issues });
        }
        let available =
            trial.alternatives.iter().enumerate().filter(|(_, a)| a.available).map(|(i, _)| i).collect();
        Ok(TrialInputs { available, start: params.asc.clone(), evidence })
    }

    pub fn n_alternatives(&self) -> usize {
        self.start.len()
    }
}

/// Floored, renormalized choice probabilities for one trial.
///
/// `trial_index` selects the trial's random stream under Monte Carlo and
/// labels errors.
///
/// # Errors
/// - [`DftError::InvalidTrialData`] for malformed trials.
/// - [`ConfigError::InvalidReplicates`] for zero replicates.
/// - [`ConfigError::UnsupportedStrategy`] for Gaussian with more than three
///   available alternatives.
pub fn accumulate(
    trial: &TrialRecord, params: &ParameterVector, options: &EstimationOptions, trial_index: usize,
) -> DftResult<Vec<f64>> {
    let raw = accumulate_raw(trial, params, options, trial_index)?;
    let available: Vec<usize> =
        trial.alternatives.iter().enumerate().filter(|(_, a)| a.available).map(|(i, _)| i).collect();
    Ok(floor_probabilities(&raw, &available, options.eval_floor()))
}

/// Choice probabilities before the floor (entries may be 0).
///
/// # Errors
/// As for [`accumulate`].
pub fn accumulate_raw(
    trial: &TrialRecord, params: &ParameterVector, options: &EstimationOptions, trial_index: usize,
) -> DftResult<Vec<f64>> {
    let inputs = TrialInputs::new(trial, params).map_err(|e| at_trial(e, trial_index))?;
    match options.strategy {
        Strategy::MonteCarlo { replicates: 0 } => {
            Err(ConfigError::InvalidReplicates { replicates: 0 }.into())
        }
        Strategy::MonteCarlo { replicates } => Ok(monte_carlo::win_frequencies(
            &inputs,
            params,
            replicates,
            options.seed,
            trial_index as u64,
        )),
        Strategy::Gaussian => gaussian::win_probabilities(&inputs, params),
    }
}

/// Raise every available entry to at least `floor` and renormalize over the
/// available alternatives; unavailable entries become exactly 0.
pub fn floor_probabilities(raw: &[f64], available: &[usize], floor: f64) -> Vec<f64> {
    let mut out = vec![0.0; raw.len()];
    for &i in available {
        out[i] = raw[i].max(floor);
    }
    let total: f64 = available.iter().map(|&i| out[i]).sum();
    if total > 0.0 {
        for &i in available {
            out[i] /= total;
        }
    }
    out
}

/// Relabel trial issues raised for a single trial with its batch index.
pub(crate) fn at_trial(err: DftError, trial_index: usize) -> DftError {
    match err {
        DftError::InvalidTrialData { issues } => DftError::InvalidTrialData {
            issues: issues.into_iter().map(|issue| TrialIssue { trial: trial_index, ..issue }).collect(),
        },
        other => other,
    }
}
