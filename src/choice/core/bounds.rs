//! Box constraints on model parameters.
//!
//! Bounds are enforced by reparameterization (see
//! `optimization::numerical_stability::to_unconstrained`), so every
//! candidate the optimizer proposes is inside its box by construction.
use crate::choice::{
    core::{
        config::ModelConfiguration,
        params::{ERROR_SD_MIN, ParamName, TIMESTEPS_CAP},
    },
    errors::{ConfigError, DftResult},
};
use std::collections::BTreeMap;

/// Optional lower and upper bound of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bound {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bound {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Bound {
        Bound { lower, upper }
    }

    pub fn unbounded() -> Bound {
        Bound { lower: None, upper: None }
    }

    /// Whether `x` lies inside the box (inclusive).
    pub fn contains(&self, x: f64) -> bool {
        self.lower.is_none_or(|lo| x >= lo) && self.upper.is_none_or(|hi| x <= hi)
    }
}

/// Per-parameter box constraints. Parameters without an entry are
/// unbounded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bounds {
    entries: BTreeMap<ParamName, Bound>,
}

impl Bounds {
    /// No constraints at all.
    pub fn unbounded() -> Bounds {
        Bounds { entries: BTreeMap::new() }
    }

    /// Defaults for `config`:
    /// - `error_sd ≥ 0.1` (below it the noise floor makes ℓ flat),
    /// - `phi1, phi2 ∈ [0, 1]`,
    /// - `timesteps ≤ 5` (beyond it the horizon no longer changes).
    ///
    /// Start biases and weight exponents stay unbounded.
    pub fn default_for(_config: &ModelConfiguration) -> Bounds {
        let mut entries = BTreeMap::new();
        entries.insert(ParamName::ErrorSd, Bound::new(Some(ERROR_SD_MIN), None));
        entries.insert(ParamName::Phi1, Bound::new(Some(0.0), Some(1.0)));
        entries.insert(ParamName::Phi2, Bound::new(Some(0.0), Some(1.0)));
        entries.insert(ParamName::Timesteps, Bound::new(None, Some(TIMESTEPS_CAP)));
        Bounds { entries }
    }

    /// Set (or replace) the bound of `name`.
    ///
    /// # Errors
    /// - [`ConfigError::UnknownParameter`] when `name` is not in `config`.
    /// - [`ConfigError::InvalidBounds`] for NaN bounds or `lower > upper`.
    pub fn set(
        &mut self, config: &ModelConfiguration, name: ParamName, lower: Option<f64>,
        upper: Option<f64>,
    ) -> DftResult<()> {
        if !config.has_parameter(name) {
            return Err(ConfigError::UnknownParameter { name: name.to_string() }.into());
        }
        let bound = Bound::new(lower, upper);
        check_bound(name, &bound)?;
        self.entries.insert(name, bound);
        Ok(())
    }

    /// Bound for `name` (unbounded when absent).
    pub fn get(&self, name: ParamName) -> Bound {
        self.entries.get(&name).copied().unwrap_or_default()
    }

    /// Re-check every entry; used when bounds were assembled elsewhere.
    ///
    /// # Errors
    /// As for [`Bounds::set`].
    pub fn validate(&self, config: &ModelConfiguration) -> DftResult<()> {
        for (name, bound) in &self.entries {
            if !config.has_parameter(*name) {
                return Err(ConfigError::UnknownParameter { name: name.to_string() }.into());
            }
            check_bound(*name, bound)?;
        }
        Ok(())
    }
}

fn check_bound(name: ParamName, bound: &Bound) -> DftResult<()> {
    let lower = bound.lower.unwrap_or(f64::NEG_INFINITY);
    let upper = bound.upper.unwrap_or(f64::INFINITY);
    if lower.is_nan() || upper.is_nan() || lower > upper {
        return Err(ConfigError::InvalidBounds { name: name.to_string(), lower, upper }.into());
    }
    Ok(())
}
