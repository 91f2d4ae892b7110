//! Maximum-likelihood estimation with restarts.
//!
//! Purpose
//! -------
//! Search the free-parameter subspace for the maximum of the trial-batch
//! log-likelihood, holding fixed parameters at their starting values and
//! keeping every candidate inside its box.
//!
//! Key behaviors
//! -------------
//! - Validation first: options, configuration, fixed set, bounds, and the
//!   whole trial batch are checked before any likelihood is evaluated.
//! - Restart 0 starts at the caller's values; restart `r > 0` adds
//!   `N(0, perturbation²)` noise to each unconstrained coordinate, drawn
//!   from `rng_for(seed, r, RESTART_STREAM)`.
//! - Restarts run in parallel (rayon). The best finite log-likelihood wins;
//!   ties go to the lowest restart index, so the result does not depend on
//!   scheduling.
//! - Gaussian fits default to L-BFGS, Monte Carlo fits to Nelder–Mead
//!   (common random numbers make the simulated surface piecewise constant).
//! - A wall-clock budget covers the whole estimation: each restart gets
//!   what is left, restarts after the first are skipped once it is spent,
//!   and the incumbent comes back tagged as non-converged.
//! - A failing restart is logged and recorded; the fit fails only when every
//!   restart failed.
//!
//! Invariants & assumptions
//! ------------------------
//! - The reported log-likelihood is re-evaluated at the winning parameters
//!   on the summed scale, with the same options the search used.
use crate::{
    choice::{
        core::{
            bounds::Bounds,
            config::ModelConfiguration,
            data::TrialRecord,
            options::{EstimationOptions, SearchMethod},
            params::{FixedParameterSet, ParameterVector},
            seeds::{RESTART_STREAM, rng_for},
            validation::{validate_config, validate_trials},
            view::FreeView,
        },
        errors::{DftError, DftResult},
        likelihood::aggregate_with_diagnostics,
        models::{
            dft::DftObjective,
            report::{
                EstimationResult, RestartOutcome, RestartSummary, SeUnavailable, StandardErrors,
                report, standard_errors,
            },
        },
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{FnEvalMap, OptimOutcome, Theta, maximize, maximize_nelder_mead},
    },
};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Fit the model to `trials`.
///
/// # Errors
/// - [`DftError::Configuration`] for inconsistent options, parameters,
///   fixed names or bounds.
/// - [`DftError::InvalidTrialData`] listing every malformed trial.
/// - [`DftError::Optimization`] when every restart failed.
///
/// Running out of iterations or time is *not* an error: the result carries
/// [`FitStatus::NonConvergence`](crate::choice::models::report::FitStatus::NonConvergence).
pub fn estimate(
    trials: &[TrialRecord], config: &ModelConfiguration, initial: &ParameterVector,
    fixed: &FixedParameterSet, bounds: &Bounds, options: &EstimationOptions,
) -> DftResult<EstimationResult> {
    validate_config(config, options, initial, fixed, bounds)?;
    validate_trials(trials, config)?;
    if trials.is_empty() {
        return Err(OptError::Model { text: "no trials to fit".to_string() }.into());
    }

    let view = FreeView::new(config, initial, fixed, bounds)?;
    let objective = DftObjective::new(view, options.clone());
    let method = options.search_method();
    info!(
        n_trials = trials.len(),
        n_free = objective.view.len(),
        restarts = options.restarts,
        strategy = %options.strategy,
        search = %method,
        "starting DFT estimation"
    );

    if objective.view.is_empty() {
        return fixed_only(&objective, trials);
    }

    let deadline = options.mle_opts.timeout.map(|budget| Instant::now() + budget);
    let starts = restart_points(&objective.view, options);
    let runs: Vec<Option<OptResult<OptimOutcome>>> = starts
        .into_par_iter()
        .enumerate()
        .map(|(r, theta0)| run_restart(&objective, trials, theta0, r, method, deadline))
        .collect();

    let mut summaries = Vec::with_capacity(runs.len());
    let mut best: Option<(usize, OptimOutcome)> = None;
    let mut first_error: Option<OptError> = None;
    for (index, run) in runs.into_iter().enumerate() {
        let outcome = match run {
            None => {
                warn!(restart = index, "restart skipped: time budget spent");
                RestartOutcome::Skipped
            }
            Some(Err(err)) => {
                warn!(restart = index, error = %err, "restart failed");
                let reason = err.to_string();
                first_error.get_or_insert(err);
                RestartOutcome::Failed { reason }
            }
            Some(Ok(out)) => {
                debug!(
                    restart = index,
                    log_likelihood = out.value,
                    converged = out.converged,
                    iterations = out.iterations,
                    "restart finished"
                );
                let summary = RestartOutcome::Finished {
                    log_likelihood: out.value,
                    converged: out.converged,
                    termination: out.status.clone(),
                    iterations: out.iterations,
                };
                if best.as_ref().is_none_or(|(_, b)| out.value > b.value) {
                    best = Some((index, out));
                }
                summary
            }
        };
        summaries.push(RestartSummary { index, outcome });
    }

    let Some((best_index, outcome)) = best else {
        return Err(DftError::Optimization(first_error.unwrap_or(OptError::UnknownError)));
    };
    let params = objective.view.to_params(&outcome.theta_hat)?;
    let evaluation = aggregate_with_diagnostics(trials, &params, options)?;
    if evaluation.diagnostics.pervasive {
        warn!(
            floored = evaluation.diagnostics.floored,
            symmetric = evaluation.diagnostics.symmetric,
            n_trials = evaluation.diagnostics.n_trials,
            "degenerate likelihood in most trials"
        );
    }
    let se = standard_errors(&objective, trials, &params);
    let result = report(&outcome, params, &evaluation, objective.view.free_names(), se)
        .with_restarts(summaries, best_index);
    info!(
        best_restart = best_index,
        log_likelihood = result.log_likelihood,
        status = ?result.status,
        iterations = result.iterations,
        "DFT estimation finished"
    );
    Ok(result)
}

/// Unconstrained starting points for every restart.
pub fn restart_points(view: &FreeView, options: &EstimationOptions) -> Vec<Theta> {
    let theta0 = view.to_theta();
    let noise = Normal::new(0.0, options.perturbation).ok();
    (0..options.restarts)
        .map(|r| match (&noise, r) {
            (Some(dist), r) if r > 0 => {
                let mut rng = rng_for(options.seed, r as u64, RESTART_STREAM);
                theta0.mapv(|t| t + dist.sample(&mut rng))
            }
            _ => theta0.clone(),
        })
        .collect()
}

/// One optimizer run under whatever is left of the budget, or `None` when
/// the budget was spent before it could start. Restart 0 always runs, so
/// there is an incumbent to report.
fn run_restart(
    objective: &DftObjective, data: &[TrialRecord], theta0: Theta, r: usize, method: SearchMethod,
    deadline: Option<Instant>,
) -> Option<OptResult<OptimOutcome>> {
    let mut opts = objective.options.mle_opts.clone();
    if let Some(deadline) = deadline {
        opts.timeout = Some(run_budget(deadline, Instant::now(), r)?);
    }
    Some(match method {
        SearchMethod::Lbfgs => maximize(objective, theta0, data, &opts),
        SearchMethod::NelderMead => {
            maximize_nelder_mead(objective, theta0, data, &opts, objective.options.simplex_step)
        }
    })
}

/// Time left for restart `r` at `now`; `None` skips the restart. Restart 0
/// gets a (possibly zero) budget instead of being skipped.
fn run_budget(deadline: Instant, now: Instant, r: usize) -> Option<Duration> {
    let remaining = deadline.saturating_duration_since(now);
    if remaining.is_zero() && r > 0 { None } else { Some(remaining) }
}

/// Everything fixed: evaluate once and report.
fn fixed_only(objective: &DftObjective, trials: &[TrialRecord]) -> DftResult<EstimationResult> {
    let params = objective.view.base().clone();
    let evaluation = aggregate_with_diagnostics(trials, &params, &objective.options)?;
    let outcome = OptimOutcome {
        theta_hat: Theta::zeros(0),
        value: evaluation.log_likelihood / trials.len() as f64,
        converged: true,
        status: "No free parameters".to_string(),
        iterations: 0,
        fn_evals: FnEvalMap::new(),
        grad_norm: None,
    };
    let se = StandardErrors::Unavailable(SeUnavailable::NoFreeParameters);
    Ok(report(&outcome, params, &evaluation, &[], se).with_restarts(
        vec![RestartSummary {
            index: 0,
            outcome: RestartOutcome::Finished {
                log_likelihood: outcome.value,
                converged: true,
                termination: outcome.status.clone(),
                iterations: 0,
            },
        }],
        0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{
        core::{attributes::Attribute, options::Strategy},
        models::report::FitStatus,
        simulate::simulate_choices,
    };

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Validation before estimation.
    // - Restart starting points and best-of-restarts selection.
    // - The all-fixed shortcut and the time budget, including the share
    //   each restart receives.
    //
    // They intentionally DO NOT cover:
    // - Full-scale parameter recovery (see the integration tests).
    // -------------------------------------------------------------------------

    fn binary_config() -> ModelConfiguration {
        ModelConfiguration::new(vec![Attribute::Energy], 2, false).expect("valid")
    }

    fn binary_trials(n: usize, truth: &ParameterVector, config: &ModelConfiguration) -> Vec<TrialRecord> {
        let profiles: Vec<TrialRecord> = (0..n)
            .map(|t| {
                let x = 0.05 + 0.9 * ((t * 7 % 19) as f64 / 18.0);
                TrialRecord::from_profiles("p", &[Attribute::Energy], &[vec![x], vec![0.5]], None)
            })
            .collect();
        simulate_choices(&profiles, config, truth, 11).expect("valid simulation")
    }

    fn only_free(config: &ModelConfiguration, free: &[&str]) -> FixedParameterSet {
        let names: Vec<String> = config
            .parameter_names()
            .into_iter()
            .map(|n| n.to_string())
            .filter(|n| !free.contains(&n.as_str()))
            .collect();
        FixedParameterSet::from_names(config, &names).expect("known names")
    }

    #[test]
    // Purpose
    // -------
    // Bad input is rejected before any optimization.
    //
    // Given
    // -----
    // - One trial with no choice; a fixed set naming an unknown parameter
    //   (built by hand); zero restarts.
    //
    // Expect
    // ------
    // - `InvalidTrialData`, `Configuration(UnknownParameter)`,
    //   `Configuration(InvalidRestarts)`.
    fn invalid_input_is_rejected_up_front() {
        // Arrange
        let config = binary_config();
        let params = ParameterVector::new(&config);
        let bounds = Bounds::default_for(&config);
        let trial = TrialRecord::from_profiles("p", &[Attribute::Energy], &[vec![0.4], vec![0.6]], None);
        let mut unknown = FixedParameterSet::new();
        unknown.insert(crate::choice::core::params::ParamName::Asc(7));
        let options = EstimationOptions::default();

        // Act
        let bad_trial = estimate(&[trial.clone()], &config, &params, &FixedParameterSet::new(), &bounds, &options);
        let good_trial = trial.with_choice(Some(1));
        let bad_fixed = estimate(&[good_trial.clone()], &config, &params, &unknown, &bounds, &options);
        let bad_restarts = estimate(
            &[good_trial],
            &config,
            &params,
            &FixedParameterSet::new(),
            &bounds,
            &options.with_restarts(0, 0.5),
        );

        // Assert
        assert!(matches!(bad_trial, Err(DftError::InvalidTrialData { .. })));
        assert!(matches!(
            bad_fixed,
            Err(DftError::Configuration(crate::choice::errors::ConfigError::UnknownParameter { .. }))
        ));
        assert!(matches!(
            bad_restarts,
            Err(DftError::Configuration(crate::choice::errors::ConfigError::InvalidRestarts { .. }))
        ));
    }

    #[test]
    // Purpose
    // -------
    // Restart 0 is the caller's start; others are reproducible
    // perturbations of it.
    //
    // Given
    // -----
    // - Three restarts, perturbation 0.5, evaluated twice; then scale 0.
    //
    // Expect
    // ------
    // - Point 0 equals `to_theta()`; points 1 and 2 differ from it and from
    //   each other; identical across calls; scale 0 gives copies.
    fn restart_points_are_reproducible() {
        // Arrange
        let config = binary_config();
        let view = FreeView::new(
            &config,
            &ParameterVector::new(&config),
            &FixedParameterSet::new(),
            &Bounds::default_for(&config),
        )
        .expect("valid view");
        let options = EstimationOptions::default().with_restarts(3, 0.5);

        // Act
        let a = restart_points(&view, &options);
        let b = restart_points(&view, &options);
        let flat = restart_points(&view, &options.clone().with_restarts(3, 0.0));

        // Assert
        assert_eq!(a, b);
        assert_eq!(a[0], view.to_theta());
        assert_ne!(a[1], a[0]);
        assert_ne!(a[2], a[1]);
        assert!(flat.iter().all(|t| *t == view.to_theta()));
    }

    #[test]
    // Purpose
    // -------
    // With several restarts the winner has the largest log-likelihood and
    // every restart is summarized.
    //
    // Given
    // -----
    // - 300 simulated binary trials; `asc_1` and `b_energy` free; three
    //   restarts with a large perturbation.
    //
    // Expect
    // ------
    // - Three summaries; the best restart's value is the maximum among
    //   finished ones; the reported log-likelihood is finite.
    fn best_restart_wins() {
        // Arrange
        let config = binary_config();
        let truth = ParameterVector::new(&config).with("b_energy", 1.5).expect("known name");
        let trials = binary_trials(300, &truth, &config);
        let fixed = only_free(&config, &["asc_1", "b_energy"]);
        let options = EstimationOptions::default().with_restarts(3, 1.0);

        // Act
        let result = estimate(
            &trials,
            &config,
            &ParameterVector::new(&config),
            &fixed,
            &Bounds::default_for(&config),
            &options,
        )
        .expect("estimation succeeds");

        // Assert
        assert_eq!(result.restarts.len(), 3);
        let finished: Vec<f64> = result
            .restarts
            .iter()
            .filter_map(|s| match s.outcome {
                RestartOutcome::Finished { log_likelihood, .. } => Some(log_likelihood),
                _ => None,
            })
            .collect();
        let max = finished.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        match &result.restarts[result.best_restart].outcome {
            RestartOutcome::Finished { log_likelihood, .. } => assert_eq!(*log_likelihood, max),
            other => panic!("best restart did not finish: {other:?}"),
        }
        assert!(result.log_likelihood.is_finite());
        assert_eq!(result.free, vec!["asc_1".to_string(), "b_energy".to_string()]);
    }

    #[test]
    // Purpose
    // -------
    // With every parameter fixed the fit is a single evaluation.
    //
    // Given
    // -----
    // - 20 trials, all parameters fixed.
    //
    // Expect
    // ------
    // - Converged, zero iterations, params equal to the start, SEs
    //   unavailable for lack of free parameters.
    fn all_fixed_evaluates_once() {
        // Arrange
        let config = binary_config();
        let params = ParameterVector::new(&config);
        let trials = binary_trials(20, &params, &config);
        let fixed = only_free(&config, &[]);

        // Act
        let result = estimate(&trials, &config, &params, &fixed, &Bounds::default_for(&config), &EstimationOptions::default())
            .expect("evaluation succeeds");

        // Assert
        assert!(result.converged());
        assert_eq!(result.iterations, 0);
        assert_eq!(result.params, params);
        assert_eq!(result.standard_errors, StandardErrors::Unavailable(SeUnavailable::NoFreeParameters));
    }

    #[test]
    // Purpose
    // -------
    // A spent time budget is reported as non-convergence, not as an error,
    // and later restarts are skipped.
    //
    // Given
    // -----
    // - A 1 ns budget, Monte Carlo with Nelder–Mead, two restarts.
    //
    // Expect
    // ------
    // - `Ok` with `NonConvergence`; restart 1 skipped.
    fn time_budget_yields_non_convergence() {
        // Arrange
        let config = binary_config();
        let truth = ParameterVector::new(&config);
        let trials = binary_trials(50, &truth, &config);
        let fixed = only_free(&config, &["asc_1", "b_energy"]);
        let options = EstimationOptions::default()
            .with_strategy(Strategy::MonteCarlo { replicates: 200 })
            .with_restarts(2, 0.5)
            .with_timeout(Some(Duration::from_nanos(1)));

        // Act
        let result = estimate(&trials, &config, &truth, &fixed, &Bounds::default_for(&config), &options)
            .expect("incumbent is returned");

        // Assert
        assert_eq!(result.status, FitStatus::NonConvergence);
        assert_eq!(result.restarts[1].outcome, RestartOutcome::Skipped);
        assert_eq!(result.best_restart, 0);
    }

    #[test]
    // Purpose
    // -------
    // Every restart, the first included, runs on what is left of the
    // budget; only later restarts are skipped once it is spent.
    //
    // Given
    // -----
    // - A deadline 5 s after `t0`, queried at `t0 + 3 s` and `t0 + 6 s`.
    //
    // Expect
    // ------
    // - At 3 s: restarts 0 and 1 both get 2 s.
    // - At 6 s: restart 0 gets a zero budget; restart 1 is skipped.
    fn each_restart_gets_the_remaining_budget() {
        // Arrange
        let t0 = Instant::now();
        let deadline = t0 + Duration::from_secs(5);

        // Act
        let at_3s = t0 + Duration::from_secs(3);
        let at_6s = t0 + Duration::from_secs(6);
        let early = (run_budget(deadline, at_3s, 0), run_budget(deadline, at_3s, 1));
        let late = (run_budget(deadline, at_6s, 0), run_budget(deadline, at_6s, 1));

        // Assert
        assert_eq!(early, (Some(Duration::from_secs(2)), Some(Duration::from_secs(2))));
        assert_eq!(late, (Some(Duration::ZERO), None));
    }

    #[test]
    // Purpose
    // -------
    // Equal lower and upper bounds pin a parameter for the fit instead of
    // failing it.
    //
    // Given
    // -----
    // - 300 simulated binary trials; `asc_1`, `b_energy` and `error_sd`
    //   not in the fixed set; `error_sd ∈ [1, 1]`; Gaussian strategy.
    //
    // Expect
    // ------
    // - `Ok`; `error_sd` is not reported as free and comes back as 1.
    fn equal_bounds_pin_the_parameter() {
        // Arrange
        let config = binary_config();
        let truth = ParameterVector::new(&config).with("b_energy", 1.0).expect("known name");
        let trials = binary_trials(300, &truth, &config);
        let fixed = only_free(&config, &["asc_1", "b_energy", "error_sd"]);
        let mut bounds = Bounds::default_for(&config);
        bounds
            .set(&config, crate::choice::core::params::ParamName::ErrorSd, Some(1.0), Some(1.0))
            .expect("equal bounds are valid");
        let options = EstimationOptions::default().with_strategy(Strategy::Gaussian);

        // Act
        let result = estimate(&trials, &config, &truth, &fixed, &bounds, &options)
            .expect("a pinned parameter does not break the fit");

        // Assert
        assert_eq!(result.free, vec!["asc_1".to_string(), "b_energy".to_string()]);
        assert_eq!(result.params.error_sd, 1.0);
        assert!(result.log_likelihood.is_finite());
    }
}
