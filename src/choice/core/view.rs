//! Tagged free-parameter view over a full [`ParameterVector`].
//!
//! Purpose
//! -------
//! Give the optimizer a plain unconstrained vector `θ` regardless of which
//! parameters are held fixed. A [`FreeView`] remembers the base vector
//! (supplying fixed values), the ordered list of free names, and each free
//! parameter's box; it maps `θ ↔ ParameterVector` in both directions.
//!
//! Key behaviors
//! -------------
//! - Free parameters appear in `θ` in canonical order
//!   ([`ModelConfiguration::parameter_names`]) with fixed names skipped.
//! - Each coordinate goes through `from_unconstrained` with its bounds, so
//!   every `θ` maps to an in-box parameter vector.
//! - Fixed parameters are copied from the base on every mapping; they never
//!   move.
//! - A parameter whose box collapses to a point (`lower == upper`) is
//!   treated as fixed at that point.
//!
//! Invariants & assumptions
//! ------------------------
//! - `to_params(to_theta())` reproduces the base vector, except that free
//!   starting values on or outside a bound come back nudged inside it.
//!
//! Conventions
//! -----------
//! - "Natural" values are the free parameters in model units (the scale
//!   standard errors are reported on).
use crate::{
    choice::{
        core::{
            bounds::{Bound, Bounds},
            config::ModelConfiguration,
            params::{FixedParameterSet, ParamName, ParameterVector},
        },
        errors::{ConfigError, DftResult},
    },
    optimization::{
        loglik_optimizer::Theta,
        numerical_stability::{from_unconstrained, to_unconstrained},
    },
};
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct FreeView {
    base: ParameterVector,
    free: Vec<ParamName>,
    bounds: Vec<Bound>,
}

impl FreeView {
    /// View over `base` with every name not in `fixed` free.
    ///
    /// # Errors
    /// - [`ConfigError::ParameterLengthMismatch`] when `base` does not match
    ///   `config`.
    /// - [`ConfigError::UnknownParameter`] for fixed names outside the
    ///   layout.
    /// - Bound errors from [`Bounds::validate`].
    ///
    /// Names with a degenerate box are held at the bound, whatever `base`
    /// says for them.
    pub fn new(
        config: &ModelConfiguration, base: &ParameterVector, fixed: &FixedParameterSet,
        bounds: &Bounds,
    ) -> DftResult<FreeView> {
        if !base.matches(config) {
            return Err(ConfigError::ParameterLengthMismatch {
                expected: config.parameter_names().len(),
                found: base.names().len(),
            }
            .into());
        }
        if let Some(name) = fixed.iter().find(|n| !config.has_parameter(*n)) {
            return Err(ConfigError::UnknownParameter { name: name.to_string() }.into());
        }
        bounds.validate(config)?;
        let mut base = base.clone();
        let mut free = Vec::new();
        for name in config.parameter_names() {
            if fixed.contains(name) {
                continue;
            }
            match pinned_value(&bounds.get(name)) {
                Some(value) => base.set(name, value)?,
                None => free.push(name),
            }
        }
        let bounds = free.iter().map(|n| bounds.get(*n)).collect();
        Ok(FreeView { base, free, bounds })
    }

    /// Number of free parameters (`θ` length).
    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    pub fn free_names(&self) -> &[ParamName] {
        &self.free
    }

    /// The vector fixed values are taken from.
    pub fn base(&self) -> &ParameterVector {
        &self.base
    }

    /// Unconstrained starting point for the base vector.
    pub fn to_theta(&self) -> Theta {
        self.theta_for(&self.base)
    }

    /// Unconstrained image of the free part of `params`.
    pub fn theta_for(&self, params: &ParameterVector) -> Theta {
        self.free
            .iter()
            .zip(&self.bounds)
            .map(|(name, b)| {
                let x = params.get(*name).unwrap_or_default();
                to_unconstrained(x, b.lower, b.upper)
            })
            .collect()
    }

    /// Free part of `params` in model units.
    pub fn natural_of(&self, params: &ParameterVector) -> Array1<f64> {
        self.free.iter().map(|name| params.get(*name).unwrap_or_default()).collect()
    }

    /// Full parameter vector for `theta`.
    ///
    /// # Errors
    /// [`ConfigError::ParameterLengthMismatch`] when `theta` has the wrong
    /// length.
    pub fn to_params(&self, theta: &Theta) -> DftResult<ParameterVector> {
        let natural = self.natural_values(theta)?;
        self.params_from_natural(&natural)
    }

    /// Free parameters of `theta` in model units.
    ///
    /// # Errors
    /// [`ConfigError::ParameterLengthMismatch`].
    pub fn natural_values(&self, theta: &Theta) -> DftResult<Array1<f64>> {
        self.check_len(theta.len())?;
        Ok(theta
            .iter()
            .zip(&self.bounds)
            .map(|(t, b)| from_unconstrained(*t, b.lower, b.upper))
            .collect())
    }

    /// Full parameter vector with the free parameters set to `natural`
    /// (model units, taken as given).
    ///
    /// # Errors
    /// [`ConfigError::ParameterLengthMismatch`].
    pub fn params_from_natural(&self, natural: &Array1<f64>) -> DftResult<ParameterVector> {
        self.check_len(natural.len())?;
        let mut params = self.base.clone();
        for (name, value) in self.free.iter().zip(natural.iter()) {
            params.set(*name, *value)?;
        }
        Ok(params)
    }

    fn check_len(&self, found: usize) -> DftResult<()> {
        if found != self.free.len() {
            return Err(ConfigError::ParameterLengthMismatch { expected: self.free.len(), found }.into());
        }
        Ok(())
    }
}

/// The single admissible value of a box with `lower == upper`.
fn pinned_value(bound: &Bound) -> Option<f64> {
    match (bound.lower, bound.upper) {
        (Some(lo), Some(hi)) if lo == hi => Some(lo),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::{core::attributes::Attribute, errors::DftError};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Free-name selection and ordering.
    // - θ round trips, fixed pass-through, and in-box mapping of extreme θ.
    // - Length and name errors.
    // - Degenerate boxes acting as fixed values.
    // -------------------------------------------------------------------------

    fn study_view() -> (ParameterVector, FreeView) {
        let config = ModelConfiguration::study();
        let base = ParameterVector::new(&config).with("asc_3", 0.7).expect("known name");
        let view = FreeView::new(
            &config,
            &base,
            &FixedParameterSet::study(),
            &Bounds::default_for(&config),
        )
        .expect("valid view");
        (base, view)
    }

    #[test]
    // Purpose
    // -------
    // The study convention leaves ten free parameters in canonical order.
    //
    // Given
    // -----
    // - Study configuration with `asc_3` and `b_reliability` fixed.
    //
    // Expect
    // ------
    // - `asc_1, asc_2, b_energy, b_pace, b_safety, b_intelligence, phi1,
    //   phi2, error_sd, timesteps`.
    fn free_names_skip_fixed_in_canonical_order() {
        // Act
        let (_, view) = study_view();

        // Assert
        let names: Vec<String> = view.free_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            [
                "asc_1",
                "asc_2",
                "b_energy",
                "b_pace",
                "b_safety",
                "b_intelligence",
                "phi1",
                "phi2",
                "error_sd",
                "timesteps"
            ]
        );
    }

    #[test]
    // Purpose
    // -------
    // θ maps back to the base, fixed values never move, and extreme θ stays
    // inside the boxes.
    //
    // Given
    // -----
    // - The study view (phi1 = 1 starts on its upper bound); θ from
    //   `to_theta`, then θ filled with ±50.
    //
    // Expect
    // ------
    // - Round trip within 1e-3 (phi1 nudged by 1e-4); asc_3 = 0.7 always;
    //   phi's in [0, 1], error_sd ≥ 0.1, timesteps ≤ 5 for extreme θ.
    fn theta_round_trip_and_box_mapping() {
        // Arrange
        let (base, view) = study_view();

        // Act
        let back = view.to_params(&view.to_theta()).expect("length matches");
        let hi = view.to_params(&Array1::from_elem(view.len(), 50.0)).expect("length matches");
        let lo = view.to_params(&Array1::from_elem(view.len(), -50.0)).expect("length matches");

        // Assert
        for (a, b) in back.values().iter().zip(base.values()) {
            assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        }
        assert!(back.phi1 < 1.0);
        for p in [&hi, &lo] {
            assert_eq!(p.asc[2], 0.7);
            assert_eq!(p.get(ParamName::Weight(Attribute::Reliability)), Ok(0.0));
            assert!((0.0..=1.0).contains(&p.phi1) && (0.0..=1.0).contains(&p.phi2));
            assert!(p.error_sd >= 0.1);
            assert!(p.timesteps <= 5.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // Wrong θ length and unknown fixed names are configuration errors.
    //
    // Given
    // -----
    // - A θ of length 3 for the study view; a fixed `asc_5` for the study
    //   layout.
    //
    // Expect
    // ------
    // - `ParameterLengthMismatch` and `UnknownParameter`.
    fn rejects_bad_lengths_and_names() {
        // Arrange
        let (base, view) = study_view();
        let config = ModelConfiguration::study();
        let mut fixed = FixedParameterSet::new();
        fixed.insert(ParamName::Asc(5));

        // Act
        let short = view.to_params(&array![0.0, 0.0, 0.0]);
        let unknown = FreeView::new(&config, &base, &fixed, &Bounds::unbounded());

        // Assert
        assert!(matches!(
            short,
            Err(DftError::Configuration(ConfigError::ParameterLengthMismatch { expected: 10, found: 3 }))
        ));
        assert!(matches!(unknown, Err(DftError::Configuration(ConfigError::UnknownParameter { .. }))));
    }

    #[test]
    // Purpose
    // -------
    // A box with equal bounds pins its parameter instead of producing a
    // NaN coordinate.
    //
    // Given
    // -----
    // - Study view with `error_sd ∈ [1, 1]` and a base of `error_sd = 0.4`.
    //
    // Expect
    // ------
    // - `error_sd` is not free; nine free names remain.
    // - `to_theta` is finite and maps back to `error_sd = 1`.
    fn degenerate_box_pins_the_parameter() {
        // Arrange
        let config = ModelConfiguration::study();
        let base = ParameterVector::new(&config).with("error_sd", 0.4).expect("known name");
        let mut bounds = Bounds::default_for(&config);
        bounds.set(&config, ParamName::ErrorSd, Some(1.0), Some(1.0)).expect("equal bounds are valid");

        // Act
        let view = FreeView::new(&config, &base, &FixedParameterSet::study(), &bounds)
            .expect("valid view");
        let theta = view.to_theta();
        let params = view.to_params(&theta).expect("length matches");

        // Assert
        assert!(!view.free_names().contains(&ParamName::ErrorSd));
        assert_eq!(view.len(), 9);
        assert!(theta.iter().all(|t| t.is_finite()));
        assert_eq!(params.error_sd, 1.0);
        assert_eq!(view.base().error_sd, 1.0);
    }
}
