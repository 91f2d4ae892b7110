//! DFT model: likelihood objective and fit/predict façade.
//!
//! [`DftObjective`] wires the choice likelihood to the [`LogLikelihood`]
//! trait. It maps the optimizer's unconstrained `θ` through a [`FreeView`]
//! to a full [`ParameterVector`] and returns the **per-trial average**
//! log-likelihood, so tolerances mean the same thing for 50 or 5 000
//! trials. No analytic gradient is supplied; L-BFGS runs on the adapter's
//! finite differences, which is adequate for the smooth Gaussian
//! accumulator.
//!
//! [`DftModel`] holds a configuration and options, fits by
//! [`estimate`](crate::choice::models::estimate::estimate), and keeps the
//! last [`EstimationResult`] for prediction.
use crate::{
    choice::{
        accumulator::accumulate,
        core::{
            bounds::Bounds,
            config::ModelConfiguration,
            data::TrialRecord,
            options::EstimationOptions,
            params::{FixedParameterSet, ParameterVector},
            validation::{validate_prediction_trial, validate_strategy},
            view::FreeView,
        },
        errors::{DftError, DftResult},
        likelihood::aggregate,
        models::{estimate::estimate, report::EstimationResult},
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{LogLikelihood, Theta},
    },
};
use ndarray::Array1;

/// Average log-likelihood of a trial batch as a function of the free
/// parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DftObjective {
    pub view: FreeView,
    pub options: EstimationOptions,
}

impl DftObjective {
    pub fn new(view: FreeView, options: EstimationOptions) -> DftObjective {
        DftObjective { view, options }
    }

    /// Average log-likelihood with the free parameters given in model units
    /// (no bound transform). Used for curvature at the optimum.
    ///
    /// # Errors
    /// Length mismatches and accumulator errors.
    pub fn average_natural(&self, natural: &Array1<f64>, trials: &[TrialRecord]) -> DftResult<f64> {
        let params = self.view.params_from_natural(natural)?;
        average(trials, &params, &self.options)
    }
}

fn average(trials: &[TrialRecord], params: &ParameterVector, options: &EstimationOptions) -> DftResult<f64> {
    Ok(aggregate(trials, params, options)? / trials.len().max(1) as f64)
}

impl LogLikelihood for DftObjective {
    type Data = [TrialRecord];

    /// `ℓ̄(θ) = (1/n)·Σ_t ln p_t(chosen)` at the parameters `θ` maps to.
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        let params = self.view.to_params(theta)?;
        Ok(average(data, &params, &self.options)?)
    }

    /// `θ` must have one finite entry per free parameter and the batch must
    /// be non-empty.
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        if theta.len() != self.view.len() {
            return Err(OptError::GradientDimMismatch { expected: self.view.len(), found: theta.len() });
        }
        if let Some((index, value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::InvalidThetaHat {
                index,
                value: *value,
                reason: "Starting values must be finite.",
            });
        }
        if data.is_empty() {
            return Err(OptError::Model { text: "no trials to fit".to_string() });
        }
        Ok(())
    }
}

/// DFT choice model with its configuration, options and fit results.
#[derive(Debug, Clone, PartialEq)]
pub struct DftModel {
    pub config: ModelConfiguration,
    pub options: EstimationOptions,
    /// Parameters held at their starting values during `fit`.
    pub fixed: FixedParameterSet,
    pub bounds: Bounds,
    /// Populated by a successful `fit`.
    pub results: Option<EstimationResult>,
}

impl DftModel {
    /// Model with nothing fixed and the default bounds for `config`.
    pub fn new(config: ModelConfiguration, options: EstimationOptions) -> DftModel {
        let bounds = Bounds::default_for(&config);
        DftModel { config, options, fixed: FixedParameterSet::new(), bounds, results: None }
    }

    pub fn with_fixed(mut self, fixed: FixedParameterSet) -> DftModel {
        self.fixed = fixed;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> DftModel {
        self.bounds = bounds;
        self
    }

    /// Fit by maximum likelihood from `initial` and cache the result.
    ///
    /// # Errors
    /// As for [`estimate`]. On error, earlier results are left untouched.
    pub fn fit(&mut self, trials: &[TrialRecord], initial: &ParameterVector) -> DftResult<&EstimationResult> {
        let result = estimate(trials, &self.config, initial, &self.fixed, &self.bounds, &self.options)?;
        Ok(self.results.insert(result))
    }

    /// # Errors
    /// [`DftError::ModelNotFitted`] before a successful fit.
    pub fn fitted_params(&self) -> DftResult<&ParameterVector> {
        self.results.as_ref().map(|r| &r.params).ok_or(DftError::ModelNotFitted)
    }

    /// Choice probabilities of `trial` under the fitted parameters.
    ///
    /// # Errors
    /// - [`DftError::ModelNotFitted`] before a successful fit.
    /// - As for [`DftModel::predict_with`].
    pub fn predict(&self, trial: &TrialRecord) -> DftResult<Vec<f64>> {
        let params = self.fitted_params()?;
        self.predict_with(trial, params)
    }

    /// Choice probabilities of `trial` under `params` (floored and
    /// renormalized, zero for unavailable alternatives). The chosen field
    /// of `trial` is ignored.
    ///
    /// # Errors
    /// - [`DftError::InvalidTrialData`] for a malformed trial.
    /// - [`ConfigError`](crate::choice::errors::ConfigError) when the
    ///   strategy cannot handle the configuration or `params` has the wrong
    ///   layout.
    pub fn predict_with(&self, trial: &TrialRecord, params: &ParameterVector) -> DftResult<Vec<f64>> {
        validate_strategy(&self.config, self.options.strategy)?;
        validate_prediction_trial(trial, &self.config)?;
        accumulate(trial, params, &self.options, 0)
    }

    /// Summed log-likelihood of `trials` under `params`.
    ///
    /// # Errors
    /// As for [`aggregate`].
    pub fn log_likelihood(&self, trials: &[TrialRecord], params: &ParameterVector) -> DftResult<f64> {
        aggregate(trials, params, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::core::{attributes::Attribute, options::Strategy};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The objective's value scale and `check` failures.
    // - `predict` before and after a fit; `predict_with` on new trials.
    //
    // They intentionally DO NOT cover:
    // - Parameter recovery (see the integration tests).
    // -------------------------------------------------------------------------

    fn study_trial(x: f64, chosen: usize) -> TrialRecord {
        TrialRecord::from_profiles(
            "p",
            &Attribute::ALL,
            &[vec![x; 5], vec![0.5; 5], vec![1.0 - x; 5]],
            Some(chosen),
        )
    }

    #[test]
    // Purpose
    // -------
    // The objective is the mean of the per-trial contributions, and `check`
    // rejects a wrong-length or non-finite θ and an empty batch.
    //
    // Given
    // -----
    // - The study configuration with the study fixed set, four trials.
    //
    // Expect
    // ------
    // - value(θ₀) = aggregate / 4; the three `check` failures.
    fn objective_averages_and_checks() {
        // Arrange
        let config = ModelConfiguration::study();
        let params = ParameterVector::new(&config);
        let view = FreeView::new(&config, &params, &FixedParameterSet::study(), &Bounds::default_for(&config))
            .expect("valid view");
        let options = EstimationOptions::default();
        let objective = DftObjective::new(view, options.clone());
        let trials: Vec<TrialRecord> =
            vec![study_trial(0.9, 1), study_trial(0.2, 3), study_trial(0.6, 2), study_trial(0.4, 1)];
        let theta0 = objective.view.to_theta();

        // Act
        let value = objective.value(&theta0, &trials).expect("valid evaluation");
        let expected = aggregate(&trials, &objective.view.to_params(&theta0).expect("valid"), &options)
            .expect("valid trials")
            / 4.0;

        // Assert
        assert!((value - expected).abs() < 1e-12);
        assert!(matches!(
            objective.check(&Theta::zeros(1), &trials),
            Err(OptError::GradientDimMismatch { .. })
        ));
        let mut bad = theta0.clone();
        bad[0] = f64::NAN;
        assert!(matches!(objective.check(&bad, &trials), Err(OptError::InvalidThetaHat { index: 0, .. })));
        assert!(matches!(objective.check(&theta0, &[]), Err(OptError::Model { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Prediction needs a fit; `predict_with` works without one and ignores
    // the recorded choice.
    //
    // Given
    // -----
    // - An unfitted study model and a trial without a choice.
    //
    // Expect
    // ------
    // - `ModelNotFitted` from `predict`; a probability vector summing to 1
    //   from `predict_with`.
    fn predict_requires_fit() {
        // Arrange
        let model = DftModel::new(ModelConfiguration::study(), EstimationOptions::default());
        let trial = study_trial(0.7, 1).with_choice(None);
        let params = ParameterVector::new(&model.config);

        // Act
        let unfitted = model.predict(&trial);
        let probs = model.predict_with(&trial, &params).expect("valid trial");

        // Assert
        assert_eq!(unfitted, Err(DftError::ModelNotFitted));
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // A fitted model predicts with its fitted parameters.
    //
    // Given
    // -----
    // - 40 binary trials, everything fixed except `asc_1`, Gaussian.
    //
    // Expect
    // ------
    // - `fit` succeeds; `predict` equals `predict_with(fitted params)`.
    fn fitted_model_predicts() {
        // Arrange
        let config = ModelConfiguration::new(vec![Attribute::Energy], 2, false).expect("valid");
        let fixed = FixedParameterSet::from_names(
            &config,
            &["asc_2", "b_energy", "phi1", "phi2", "error_sd", "timesteps"],
        )
        .expect("known names");
        let options = EstimationOptions::default().with_strategy(Strategy::Gaussian);
        let mut model = DftModel::new(config.clone(), options).with_fixed(fixed);
        let trials: Vec<TrialRecord> = (0..40)
            .map(|t| {
                TrialRecord::from_profiles(
                    "p",
                    &[Attribute::Energy],
                    &[vec![0.5], vec![0.5]],
                    Some(if t % 4 == 0 { 2 } else { 1 }),
                )
            })
            .collect();
        let initial = ParameterVector::new(&config);

        // Act
        let fitted = model.fit(&trials, &initial).expect("fit succeeds").params.clone();
        let p = model.predict(&trials[0]).expect("fitted");

        // Assert
        assert_eq!(p, model.predict_with(&trials[0], &fitted).expect("valid"));
        assert!(fitted.asc[0] > 0.0);
        assert!((p[0] - 0.75).abs() < 0.02);
    }
}
