//! Validation of trial batches, configurations, and options.
//!
//! Purpose
//! -------
//! Catch everything that would make a fit meaningless before the first
//! likelihood evaluation, and report it with enough structure to fix the
//! input: which trial, which field, what is wrong.
//!
//! Key behaviors
//! -------------
//! - [`validate_trials`] scans the **whole** batch and returns every issue
//!   at once in a single [`DftError::InvalidTrialData`]. No partial fits.
//! - [`validate_config`] checks that the options, parameters, fixed set and
//!   bounds are mutually consistent with the model configuration.
//! - [`validate_options`] checks the numeric options on their own.
//!
//! Invariants & assumptions
//! ------------------------
//! - After [`validate_trials`] succeeds, every trial has exactly `K`
//!   alternatives with ids `1..=K` in order, every configured attribute is
//!   present and finite on every alternative, and the choice names an
//!   available alternative. Downstream code relies on this and does not
//!   re-check.
//! - Attribute values outside `[0.01, 1]` are *valid*; they are clamped
//!   later.
use crate::choice::{
    core::{
        bounds::Bounds,
        config::ModelConfiguration,
        data::TrialRecord,
        options::{EstimationOptions, Strategy},
        params::{FixedParameterSet, ParameterVector},
    },
    errors::{ConfigError, DftError, DftResult, TrialIssue, TrialProblem},
};

/// Largest alternative count the Gaussian accumulator integrates exactly.
pub const GAUSSIAN_MAX_ALTERNATIVES: usize = 3;

/// Check every trial; fail with all issues if any.
///
/// # Errors
/// [`DftError::InvalidTrialData`] listing every offending trial and field,
/// in batch order.
pub fn validate_trials(trials: &[TrialRecord], config: &ModelConfiguration) -> DftResult<()> {
    let mut issues = Vec::new();
    for (t, trial) in trials.iter().enumerate() {
        collect_trial_issues(t, trial, config, &mut issues);
    }
    if issues.is_empty() { Ok(()) } else { Err(DftError::InvalidTrialData { issues }) }
}

/// Check a single trial (used for prediction on new trials).
///
/// # Errors
/// [`DftError::InvalidTrialData`] with the trial's issues, indexed 0. A
/// missing choice is not an issue here.
pub fn validate_prediction_trial(trial: &TrialRecord, config: &ModelConfiguration) -> DftResult<()> {
    let mut issues = Vec::new();
    let probe = trial.clone().with_choice(trial.chosen.or_else(|| first_available_id(trial)));
    collect_trial_issues(0, &probe, config, &mut issues);
    if issues.is_empty() { Ok(()) } else { Err(DftError::InvalidTrialData { issues }) }
}

/// Numeric options on their own.
///
/// # Errors
/// - [`ConfigError::InvalidReplicates`] for zero Monte Carlo replicates.
/// - [`ConfigError::InvalidProbabilityFloor`] for a floor outside `(0, 1)`.
/// - [`ConfigError::InvalidRestarts`] for zero restarts.
/// - [`ConfigError::InvalidPerturbation`] for a negative or non-finite scale.
/// - [`ConfigError::InvalidSimplexStep`] for a zero or non-finite step.
pub fn validate_options(options: &EstimationOptions) -> DftResult<()> {
    if let Strategy::MonteCarlo { replicates } = options.strategy {
        if replicates == 0 {
            return Err(ConfigError::InvalidReplicates { replicates }.into());
        }
    }
    if let Some(floor) = options.prob_floor {
        if !(floor.is_finite() && floor > 0.0 && floor < 1.0) {
            return Err(ConfigError::InvalidProbabilityFloor { value: floor }.into());
        }
    }
    if options.restarts == 0 {
        return Err(ConfigError::InvalidRestarts { restarts: 0 }.into());
    }
    if !(options.perturbation.is_finite() && options.perturbation >= 0.0) {
        return Err(ConfigError::InvalidPerturbation { scale: options.perturbation }.into());
    }
    if !options.simplex_step.is_finite() || options.simplex_step == 0.0 {
        return Err(ConfigError::InvalidSimplexStep { step: options.simplex_step }.into());
    }
    Ok(())
}

/// Options, starting parameters, fixed set and bounds against `config`.
///
/// # Errors
/// - Everything [`validate_options`] reports.
/// - [`ConfigError::UnsupportedStrategy`] for the Gaussian accumulator with
///   more than three alternatives.
/// - [`ConfigError::ParameterLengthMismatch`] when `initial` was built for
///   another configuration.
/// - [`ConfigError::UnknownParameter`] for fixed names outside the layout.
/// - [`ConfigError::InvalidBounds`] from [`Bounds::validate`].
pub fn validate_config(
    config: &ModelConfiguration, options: &EstimationOptions, initial: &ParameterVector,
    fixed: &FixedParameterSet, bounds: &Bounds,
) -> DftResult<()> {
    validate_options(options)?;
    validate_strategy(config, options.strategy)?;
    if !initial.matches(config) {
        return Err(ConfigError::ParameterLengthMismatch {
            expected: config.parameter_names().len(),
            found: initial.names().len(),
        }
        .into());
    }
    for name in fixed.iter() {
        if !config.has_parameter(name) {
            return Err(ConfigError::UnknownParameter { name: name.to_string() }.into());
        }
    }
    bounds.validate(config)
}

/// Whether `strategy` can evaluate trials of `config`.
///
/// # Errors
/// [`ConfigError::UnsupportedStrategy`].
pub fn validate_strategy(config: &ModelConfiguration, strategy: Strategy) -> DftResult<()> {
    if strategy == Strategy::Gaussian && config.n_alternatives() > GAUSSIAN_MAX_ALTERNATIVES {
        return Err(ConfigError::UnsupportedStrategy {
            strategy: strategy.to_string(),
            reason: "the Gaussian accumulator supports at most three alternatives",
        }
        .into());
    }
    Ok(())
}

// ---- Helper methods ----

fn first_available_id(trial: &TrialRecord) -> Option<usize> {
    trial.alternatives.iter().find(|a| a.available).map(|a| a.id)
}

fn collect_trial_issues(
    t: usize, trial: &TrialRecord, config: &ModelConfiguration, issues: &mut Vec<TrialIssue>,
) {
    let k = config.n_alternatives();
    if trial.alternatives.len() != k {
        issues.push(TrialIssue::new(
            t,
            "alternatives",
            TrialProblem::AlternativeCount { expected: k, found: trial.alternatives.len() },
        ));
    } else if trial.alternatives.iter().enumerate().any(|(i, a)| a.id != i + 1) {
        issues.push(TrialIssue::new(t, "alternatives", TrialProblem::AlternativeIds));
    }
    for alt in &trial.alternatives {
        for attribute in config.attributes() {
            let field = format!("robot{}{}", alt.id, attribute);
            match alt.profile.get(*attribute) {
                None => issues.push(TrialIssue::new(t, field, TrialProblem::MissingAttribute)),
                Some(value) if !value.is_finite() => {
                    issues.push(TrialIssue::new(t, field, TrialProblem::NonFiniteAttribute { value }))
                }
                Some(_) => {}
            }
        }
    }
    match trial.chosen {
        None => issues.push(TrialIssue::new(t, "choice", TrialProblem::MissingChoice)),
        Some(choice) => match trial.alternatives.iter().find(|a| a.id == choice) {
            None => issues.push(TrialIssue::new(t, "choice", TrialProblem::UnknownChoice { choice })),
            Some(alt) if !alt.available => {
                issues.push(TrialIssue::new(t, "choice", TrialProblem::ChosenUnavailable { choice }))
            }
            Some(_) => {}
        },
    }
}
