//! Integration tests for the DFT choice pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path a caller takes: wide rows from the front
//!   end, conversion to trial records, choice probabilities, likelihood,
//!   maximum-likelihood fitting with standard errors, and prediction.
//! - Exercise realistic regimes (batch sizes in the thousands, both
//!   accumulation strategies) through the public API only.
//!
//! Coverage
//! --------
//! - `choice::core`: `WideRow` deserialization from JSON and
//!   `trials_from_wide_rows`, including availability columns.
//! - `choice::simulate`: synthetic choices from a known parameter vector.
//! - `choice::models::DftModel`: `fit`, `predict`, `predict_with`,
//!   `log_likelihood`, and the not-fitted error path.
//! - `optimization::loglik_optimizer`: L-BFGS via `MLEOptions` and
//!   `Tolerances`; Nelder–Mead under Monte Carlo.
//!
//! Exclusions
//! ----------
//! - Fine-grained checks of the accumulator, attention chain, floor and
//!   validation routines; these are covered by unit tests.
//! - Python bindings.
use dft_choice::{
    choice::{core::data::trials_from_wide_rows, prelude::*},
    optimization::loglik_optimizer::{LineSearcher, MLEOptions, Tolerances},
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

/// Route estimation logs to the test harness; filter with `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Purpose
/// -------
/// One-attribute, three-alternative layout in which the Gaussian
/// accumulator is exact: attention cannot move, so the final preferences
/// are a start bias plus a drift plus Gaussian noise.
///
/// Returns
/// -------
/// - `(config, truth)` with `asc_1 = 0.3`, `b_energy = 1` (weight `e`),
///   `error_sd = 1` and `timesteps = ln 3` (horizon `T_c = 4`).
fn exact_gaussian_setup() -> (ModelConfiguration, ParameterVector) {
    let config = ModelConfiguration::new(vec![Attribute::Energy], 3, true)
        .expect("one attribute and three alternatives is a valid layout");
    let mut truth = ParameterVector::new(&config);
    truth.asc = vec![0.3, 0.0, 0.0];
    truth.b = vec![1.0];
    truth.error_sd = 1.0;
    truth.timesteps = 3f64.ln();
    (config, truth)
}

/// Purpose
/// -------
/// Draw `n` unlabelled trials with energy values uniform on `[0.01, 1]`,
/// spread over ten participants.
fn random_energy_trials(n: usize, seed: u64) -> Vec<TrialRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|t| {
            let profiles: Vec<Vec<f64>> =
                (0..3).map(|_| vec![rng.gen_range(0.01..=1.0)]).collect();
            TrialRecord::from_profiles(format!("p{}", t % 10), &[Attribute::Energy], &profiles, None)
                .with_trial(t as u32 + 1)
        })
        .collect()
}

/// Purpose
/// -------
/// Baseline options for the recovery test: Gaussian strategy, L-BFGS with
/// More–Thuente, a single restart, standard errors on.
fn recovery_options() -> EstimationOptions {
    let tols = Tolerances::new(Some(1e-6), Some(1e-9), Some(200))
        .expect("Tolerances::new should accept positive tolerances");
    let mle_opts = MLEOptions::new(tols, LineSearcher::MoreThuente, None)
        .expect("MLEOptions::new should succeed with reasonable tolerances");
    EstimationOptions::default()
        .with_strategy(Strategy::Gaussian)
        .with_mle_opts(mle_opts)
        .with_restarts(1, 0.5)
        .with_standard_errors(true)
}

#[test]
// Purpose
// -------
// Recover known parameters end to end, repeatedly: simulate choices from
// the process model, fit from a perturbed start, and compare.
//
// Given
// -----
// - Five independent batches of 2 000 trials from `exact_gaussian_setup`,
//   each with its own profile seed and simulation seed.
// - `asc_1` and `b_energy` free; everything else fixed at the truth.
// - Start `asc_1 = 0`, `b_energy = 0`.
//
// Expect
// ------
// - On every batch, `b_energy` within 0.1 of 1 and `asc_1` within 0.15
//   of 0.3.
// - Standard errors available, finite and positive for both.
// - The fitted log-likelihood is at least the one at the truth.
fn gaussian_fit_recovers_simulated_parameters() {
    // Arrange
    init_tracing();
    let (config, truth) = exact_gaussian_setup();
    let fixed = FixedParameterSet::from_names(
        &config,
        &["asc_2", "asc_3", "phi1", "phi2", "error_sd", "timesteps"],
    )
    .expect("all names belong to the layout");
    let initial = truth.clone().with("asc_1", 0.0).and_then(|p| p.with("b_energy", 0.0));
    let initial = initial.expect("asc_1 and b_energy are known names");

    for seed in 0..5u64 {
        let trials = simulate_choices(
            &random_energy_trials(2_000, 100 + seed),
            &config,
            &truth,
            200 + seed,
        )
        .expect("simulation should succeed for valid trials");
        let mut model =
            DftModel::new(config.clone(), recovery_options()).with_fixed(fixed.clone());

        // Act
        let result =
            model.fit(&trials, &initial).expect("fit should succeed on simulated data").clone();
        let ll_truth = model.log_likelihood(&trials, &truth).expect("valid trials");

        // Assert
        assert_eq!(result.free, vec!["asc_1".to_string(), "b_energy".to_string()]);
        let b_hat = result.params.b[0];
        let asc_hat = result.params.asc[0];
        assert!((b_hat - 1.0).abs() < 0.1, "seed {seed}: b_energy = {b_hat}");
        assert!((asc_hat - 0.3).abs() < 0.15, "seed {seed}: asc_1 = {asc_hat}");
        assert_eq!(result.params.asc[1], 0.0);
        assert_eq!(result.params.timesteps, truth.timesteps);
        for name in ["asc_1", "b_energy"] {
            let se = result.standard_errors.get(name).expect("standard errors should be available");
            assert!(se.is_finite() && se > 0.0, "seed {seed}, {name}: {se}");
        }
        assert!(result.log_likelihood >= ll_truth - 1e-6, "seed {seed}");
        assert_eq!(result.n_trials, 2_000);
    }
}

#[test]
// Purpose
// -------
// Rows posted as JSON by the front end feed the model directly, with
// unused columns ignored and availability columns honored.
//
// Given
// -----
// - Three JSON rows over energy and safety, one with `avail3 = 0` and
//   one with string-typed numbers and extra columns.
//
// Expect
// ------
// - Three trial records with the right participants and choices.
// - The unavailable alternative has probability exactly 0 and the other
//   two sum to 1 (binary degeneration).
// - The log-likelihood at the default parameters is finite and negative.
fn json_rows_feed_the_model() {
    // Arrange
    let json = r#"[
        {"participantid": "a1", "trial": 1, "choice": 1, "staketype": "high",
         "robot1energy": 0.9, "robot1safety": 0.4,
         "robot2energy": 0.2, "robot2safety": 0.5,
         "robot3energy": 0.3, "robot3safety": 0.6},
        {"participantid": "a1", "trial": 2, "choice": 2, "avail3": 0,
         "robot1energy": 0.5, "robot1safety": 0.5,
         "robot2energy": 0.6, "robot2safety": 0.7,
         "robot3energy": 1.0, "robot3safety": 1.0},
        {"participantid": "b7", "trial": 1, "choice": 3, "timeSpent": 12.5,
         "robot1energy": "0.1", "robot1safety": 0.2,
         "robot2energy": 0.3, "robot2safety": 0.4,
         "robot3energy": 0.8, "robot3safety": 0.9}
    ]"#;
    let rows: Vec<WideRow> = serde_json::from_str(json).expect("rows should deserialize");
    let config = ModelConfiguration::new(vec![Attribute::Energy, Attribute::Safety], 3, true)
        .expect("valid layout");
    let model = DftModel::new(config.clone(), EstimationOptions::default());
    let params = ParameterVector::new(&config);

    // Act
    let trials = trials_from_wide_rows(&rows, &config).expect("rows should convert");
    let binary = model.predict_with(&trials[1], &params).expect("valid trial");
    let ll = model.log_likelihood(&trials, &params).expect("valid trials");

    // Assert
    assert_eq!(trials.len(), 3);
    assert_eq!(trials[2].participant, "b7");
    assert_eq!(trials.iter().map(|t| t.chosen).collect::<Vec<_>>(), vec![Some(1), Some(2), Some(3)]);
    assert_eq!(trials[2].alternatives[0].profile.get(Attribute::Energy), Some(0.1));
    assert_eq!(binary[2], 0.0);
    assert!((binary[0] + binary[1] - 1.0).abs() < 1e-12);
    assert!(ll.is_finite() && ll < 0.0);
}

#[test]
// Purpose
// -------
// The energy-dominance scenario holds through the public model surface.
//
// Given
// -----
// - Study layout; alternative 1 has energy 0.9, the others 0.5; all other
//   attributes equal; `b_energy = 3`, other weights and biases 0;
//   attention resampled every step; Monte Carlo with 5 000 replicates and
//   seed 2024.
//
// Expect
// ------
// - P(alternative 1) > 0.6; the others are (nearly) equal.
fn energy_dominance_through_the_model() {
    // Arrange
    let config = ModelConfiguration::study();
    let mut params = ParameterVector::new(&config);
    params.b = vec![3.0, 0.0, 0.0, 0.0, 0.0];
    params.phi1 = 0.0;
    params.phi2 = 0.0;
    params.timesteps = 2.0;
    let options = EstimationOptions::default()
        .with_strategy(Strategy::MonteCarlo { replicates: 5_000 })
        .with_seed(2024);
    let model = DftModel::new(config, options);
    let trial = TrialRecord::from_profiles(
        "p",
        &Attribute::ALL,
        &[vec![0.9, 0.5, 0.5, 0.5, 0.5], vec![0.5; 5], vec![0.5; 5]],
        None,
    );

    // Act
    let p = model.predict_with(&trial, &params).expect("valid trial");

    // Assert
    assert!(p[0] > 0.6, "{p:?}");
    assert!((p[1] - p[2]).abs() < 0.05, "{p:?}");
}

#[test]
// Purpose
// -------
// A Monte Carlo fit runs end to end with the simplex search, reports a
// finite likelihood, and declines standard errors.
//
// Given
// -----
// - 80 trials simulated from the exact Gaussian setup; `b_energy` free;
//   Monte Carlo with 300 replicates; at most 40 iterations.
//
// Expect
// ------
// - A result with finite log-likelihood, the restart summary for restart
//   0, and standard errors `Unavailable(NotSmooth)`.
// - `predict` after the fit returns probabilities summing to 1.
fn monte_carlo_fit_runs_end_to_end() {
    // Arrange
    init_tracing();
    let (config, truth) = exact_gaussian_setup();
    let trials = simulate_choices(&random_energy_trials(80, 3), &config, &truth, 5)
        .expect("simulation should succeed for valid trials");
    let names: Vec<String> = config
        .parameter_names()
        .iter()
        .map(|n| n.to_string())
        .filter(|n| n != "b_energy")
        .collect();
    let fixed = FixedParameterSet::from_names(&config, &names).expect("known names");
    let tols = Tolerances::new(None, Some(1e-6), Some(40)).expect("valid tolerances");
    let mle_opts = MLEOptions::new(tols, LineSearcher::MoreThuente, None).expect("valid options");
    let options = EstimationOptions::default()
        .with_strategy(Strategy::MonteCarlo { replicates: 300 })
        .with_mle_opts(mle_opts);
    let mut model = DftModel::new(config, options).with_fixed(fixed);

    // Act
    let result = model.fit(&trials, &truth).expect("fit should return a result").clone();
    let p = model.predict(&trials[0]).expect("model is fitted");

    // Assert
    assert!(result.log_likelihood.is_finite());
    assert_eq!(result.free, vec!["b_energy".to_string()]);
    assert_eq!(result.restarts.len(), 1);
    assert_eq!(result.best_restart, 0);
    assert_eq!(
        result.standard_errors,
        StandardErrors::Unavailable(SeUnavailable::NotSmooth)
    );
    assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
// Purpose
// -------
// Prediction is refused before a fit and malformed batches are rejected
// before any optimization.
//
// Given
// -----
// - A fresh study model; a batch whose second trial lacks a choice.
//
// Expect
// ------
// - `predict` returns `ModelNotFitted`.
// - `fit` returns `InvalidTrialData` naming trial 1, and leaves the model
//   unfitted.
fn unfitted_and_invalid_inputs_are_reported() {
    // Arrange
    let config = ModelConfiguration::study();
    let mut model = DftModel::new(config.clone(), EstimationOptions::default())
        .with_fixed(FixedParameterSet::study());
    let trial = TrialRecord::from_profiles("p", &Attribute::ALL, &vec![vec![0.5; 5]; 3], Some(1));
    let batch = vec![trial.clone(), trial.clone().with_choice(None)];

    // Act
    let before = model.predict(&trial);
    let fitted = model.fit(&batch, &ParameterVector::new(&config)).map(|r| r.clone());

    // Assert
    assert_eq!(before, Err(DftError::ModelNotFitted));
    match fitted {
        Err(DftError::InvalidTrialData { issues }) => {
            assert!(issues.iter().any(|i| i.trial == 1), "{issues:?}");
        }
        other => panic!("expected InvalidTrialData, got {other:?}"),
    }
    assert!(model.results.is_none());
}
