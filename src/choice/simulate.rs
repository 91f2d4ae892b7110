//! Synthetic choices drawn from the process model.
//!
//! [`simulate_choices`] runs one deliberation path per trial (the same path
//! model the Monte Carlo accumulator averages over) and records the winner
//! as the trial's choice. Trial `t` draws from `rng_for(seed, t,
//! SIMULATION_STREAM)`, so the output is reproducible and independent of
//! the estimation streams. Used for parameter-recovery checks and for
//! planning studies.
use crate::choice::{
    accumulator::{
        TrialInputs, at_trial,
        attention::AttentionChain,
        monte_carlo::{draw_winner, simulate_path, simulated_steps},
    },
    core::{
        config::ModelConfiguration,
        data::TrialRecord,
        params::ParameterVector,
        seeds::{SIMULATION_STREAM, rng_for},
    },
    errors::{ConfigError, DftResult},
};
use rand::Rng;
use rayon::prelude::*;

/// Copies of `trials` with the choice replaced by a simulated one.
///
/// Existing choices are ignored. Trials with no available alternative keep
/// `chosen = None`.
///
/// # Errors
/// - [`ConfigError::ParameterLengthMismatch`] when `params` does not match
///   `config`.
/// - [`DftError::InvalidTrialData`](crate::choice::errors::DftError::InvalidTrialData)
///   for malformed trials.
pub fn simulate_choices(
    trials: &[TrialRecord], config: &ModelConfiguration, params: &ParameterVector, seed: u64,
) -> DftResult<Vec<TrialRecord>> {
    if !params.matches(config) {
        return Err(ConfigError::ParameterLengthMismatch {
            expected: config.parameter_names().len(),
            found: params.names().len(),
        }
        .into());
    }
    let chain = AttentionChain::new(config.n_attributes(), params.phi1, params.phi2);
    let steps = simulated_steps(params.horizon());
    let sigma = params.noise_sd();

    trials
        .par_iter()
        .enumerate()
        .map(|(t, trial)| {
            let inputs = TrialInputs::new(trial, params).map_err(|e| at_trial(e, t))?;
            let mut rng = rng_for(seed, t as u64, SIMULATION_STREAM);
            let prefs = simulate_path(&inputs, &chain, steps, sigma, &mut rng);
            let winner = draw_winner(&prefs, &inputs.available, &mut rng);
            Ok(trial.clone().with_choice(winner.map(|i| trial.alternatives[i].id)))
        })
        .collect()
}

/// Draw a 0-based index from `probs` (entries need not sum exactly to 1;
/// they are rescaled). `None` when every entry is zero or the vector is
/// empty.
pub fn sample_from_probabilities<R: Rng + ?Sized>(probs: &[f64], rng: &mut R) -> Option<usize> {
    let total: f64 = probs.iter().filter(|p| p.is_finite() && **p > 0.0).sum();
    if total <= 0.0 {
        return None;
    }
    let target = rng.r#gen::<f64>() * total;
    let mut acc = 0.0;
    let mut last = None;
    for (i, p) in probs.iter().enumerate() {
        if !(p.is_finite() && *p > 0.0) {
            continue;
        }
        acc += p;
        last = Some(i);
        if target < acc {
            return Some(i);
        }
    }
    last
}
