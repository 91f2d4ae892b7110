//! Monte Carlo win frequencies of the accumulation process.
//!
//! Each replicate simulates one deliberation path over `round(T_c)` steps
//! (at least one): preferences start at `asc_i`; at every step one attribute
//! is attended via the attention chain and each available alternative adds
//! `w_a·v_ia + σ·ε` with independent standard normal `ε`. The alternative
//! with the largest final preference wins; exact ties split the win evenly.
//!
//! Replicate `r` of trial `t` draws from `rng_for(seed, t, r)`, so the
//! frequencies do not depend on how rayon schedules replicates, and the same
//! random numbers are reused at every parameter vector (common random
//! numbers). The resulting likelihood is piecewise constant in the
//! parameters.
use crate::choice::{
    accumulator::{TrialInputs, attention::AttentionChain},
    core::{params::ParameterVector, seeds::rng_for},
};
use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

/// Number of simulated steps for horizon `tc`.
pub fn simulated_steps(tc: f64) -> usize {
    tc.round().max(1.0) as usize
}

/// Win share of each alternative over `replicates` simulated paths (0 for
/// unavailable alternatives). Not floored.
pub fn win_frequencies(
    inputs: &TrialInputs, params: &ParameterVector, replicates: usize, seed: u64, trial_index: u64,
) -> Vec<f64> {
    let k = inputs.n_alternatives();
    if replicates == 0 || inputs.available.is_empty() {
        return vec![0.0; k];
    }
    let chain = AttentionChain::new(inputs.evidence.ncols(), params.phi1, params.phi2);
    let steps = simulated_steps(params.horizon());
    let sigma = params.noise_sd();

    let wins = (0..replicates)
        .into_par_iter()
        .fold(
            || vec![0.0; k],
            |mut acc, r| {
                let mut rng = rng_for(seed, trial_index, r as u64);
                let prefs = simulate_path(inputs, &chain, steps, sigma, &mut rng);
                credit_winners(&prefs, &inputs.available, &mut acc);
                acc
            },
        )
        .reduce(
            || vec![0.0; k],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                a
            },
        );
    wins.into_iter().map(|w| w / replicates as f64).collect()
}

/// Final preferences of one path (all alternatives; unavailable entries are
/// simulated but never compared).
pub fn simulate_path<R: Rng + ?Sized>(
    inputs: &TrialInputs, chain: &AttentionChain, steps: usize, sigma: f64, rng: &mut R,
) -> Vec<f64> {
    let mut prefs = inputs.start.clone();
    let mut attended = chain.start(rng);
    for t in 0..steps {
        if t > 0 {
            attended = chain.step(attended, rng);
        }
        for (i, p) in prefs.iter_mut().enumerate() {
            let eps: f64 = rng.sample(StandardNormal);
            *p += inputs.evidence[[i, attended]] + sigma * eps;
        }
    }
    prefs
}

/// Index of the winning alternative among `available` (ties broken
/// uniformly at random).
pub fn draw_winner<R: Rng + ?Sized>(prefs: &[f64], available: &[usize], rng: &mut R) -> Option<usize> {
    let best = available.iter().map(|&i| prefs[i]).fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = available.iter().copied().filter(|&i| prefs[i] == best).collect();
    match tied.len() {
        0 => None,
        1 => Some(tied[0]),
        n => Some(tied[rng.gen_range(0..n)]),
    }
}

fn credit_winners(prefs: &[f64], available: &[usize], acc: &mut [f64]) {
    let best = available.iter().map(|&i| prefs[i]).fold(f64::NEG_INFINITY, f64::max);
    let tied = available.iter().filter(|&&i| prefs[i] == best).count();
    if tied == 0 {
        return;
    }
    let share = 1.0 / tied as f64;
    for &i in available.iter().filter(|&&i| prefs[i] == best) {
        acc[i] += share;
    }
}
