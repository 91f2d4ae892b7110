//! Named model parameters, the full parameter vector, and the set of
//! parameters held fixed during a fit.
//!
//! Purpose
//! -------
//! Represent the DFT parameter vector in model units together with the
//! derived quantities the accumulator consumes, and give every parameter a
//! stable textual name (`asc_2`, `b_safety`, `phi1`, …) for configuration,
//! reporting and the Python layer.
//!
//! Key behaviors
//! -------------
//! - [`ParamName`] parses and prints the canonical names.
//! - [`ParameterVector::new`] starts from the study's initial values
//!   (`asc = 0`, `b_energy = b_safety = b_intelligence = 1`, other `b = 0`,
//!   `phi1 = 1`, `phi2 = 0`, `error_sd = 1`, `timesteps = 1`).
//! - Derived quantities are computed on demand and are always in range:
//!   weights `exp(b)`, noise `max(0.1, error_sd)`, horizon
//!   `1 + exp(min(5, timesteps))`, attention probabilities clamped to
//!   `[0, 1]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `asc.len()` equals the configured alternative count and `b` is aligned
//!   with the configured attribute list; both are fixed at construction.
//! - Raw fields may hold any finite value; only derived quantities feed the
//!   process model.
//!
//! Conventions
//! -----------
//! - `Asc(i)` is 1-based, matching alternative ids.
//! - The flat order used by [`ParameterVector::values`] is
//!   [`ModelConfiguration::parameter_names`].
use crate::choice::{
    core::{attributes::Attribute, config::ModelConfiguration},
    errors::{ConfigError, DftResult},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

/// Smallest per-step noise standard deviation the process uses.
pub const ERROR_SD_MIN: f64 = 0.1;

/// Raw `timesteps` values above this no longer lengthen the horizon.
pub const TIMESTEPS_CAP: f64 = 5.0;

/// Name of one model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamName {
    /// Start bias of alternative `i` (1-based).
    Asc(usize),
    /// Log attention weight of an attribute.
    Weight(Attribute),
    Phi1,
    Phi2,
    ErrorSd,
    Timesteps,
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamName::Asc(i) => write!(f, "asc_{i}"),
            ParamName::Weight(a) => write!(f, "b_{a}"),
            ParamName::Phi1 => write!(f, "phi1"),
            ParamName::Phi2 => write!(f, "phi2"),
            ParamName::ErrorSd => write!(f, "error_sd"),
            ParamName::Timesteps => write!(f, "timesteps"),
        }
    }
}

impl FromStr for ParamName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownParameter { name: s.to_string() };
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "phi1" => return Ok(ParamName::Phi1),
            "phi2" => return Ok(ParamName::Phi2),
            "error_sd" => return Ok(ParamName::ErrorSd),
            "timesteps" => return Ok(ParamName::Timesteps),
            _ => {}
        }
        if let Some(idx) = lower.strip_prefix("asc_") {
            return match idx.parse::<usize>() {
                Ok(i) if i >= 1 => Ok(ParamName::Asc(i)),
                _ => Err(unknown()),
            };
        }
        if let Some(attr) = lower.strip_prefix("b_") {
            return attr.parse::<Attribute>().map(ParamName::Weight).map_err(|_| unknown());
        }
        Err(unknown())
    }
}

/// Full DFT parameter vector in model units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    /// Start biases, one per alternative.
    pub asc: Vec<f64>,
    /// Log attention weights, aligned with `attributes`.
    pub b: Vec<f64>,
    attributes: Vec<Attribute>,
    /// Probability of staying on the attended attribute.
    pub phi1: f64,
    /// Probability of a uniform switch to another attribute.
    pub phi2: f64,
    /// Per-step noise standard deviation (floored at [`ERROR_SD_MIN`]).
    pub error_sd: f64,
    /// Raw deliberation horizon (see [`ParameterVector::horizon`]).
    pub timesteps: f64,
}

impl ParameterVector {
    /// Study starting values for `config`.
    pub fn new(config: &ModelConfiguration) -> ParameterVector {
        let b = config
            .attributes()
            .iter()
            .map(|a| match a {
                Attribute::Energy | Attribute::Safety | Attribute::Intelligence => 1.0,
                Attribute::Pace | Attribute::Reliability => 0.0,
            })
            .collect();
        ParameterVector {
            asc: vec![0.0; config.n_alternatives()],
            b,
            attributes: config.attributes().to_vec(),
            phi1: 1.0,
            phi2: 0.0,
            error_sd: 1.0,
            timesteps: 1.0,
        }
    }

    /// Parameters from a flat vector in canonical order.
    ///
    /// # Errors
    /// [`ConfigError::ParameterLengthMismatch`] when `values` has the wrong
    /// length for `config`.
    pub fn from_values(config: &ModelConfiguration, values: &[f64]) -> DftResult<ParameterVector> {
        let names = config.parameter_names();
        if values.len() != names.len() {
            return Err(ConfigError::ParameterLengthMismatch {
                expected: names.len(),
                found: values.len(),
            }
            .into());
        }
        let mut params = ParameterVector::new(config);
        for (name, value) in names.into_iter().zip(values) {
            params.set(name, *value)?;
        }
        Ok(params)
    }

    /// Attributes the weights are aligned with.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn n_alternatives(&self) -> usize {
        self.asc.len()
    }

    /// Canonical parameter order for this vector.
    pub fn names(&self) -> Vec<ParamName> {
        let mut names: Vec<ParamName> = (1..=self.asc.len()).map(ParamName::Asc).collect();
        names.extend(self.attributes.iter().map(|a| ParamName::Weight(*a)));
        names.extend([ParamName::Phi1, ParamName::Phi2, ParamName::ErrorSd, ParamName::Timesteps]);
        names
    }

    /// Values in canonical order.
    pub fn values(&self) -> Vec<f64> {
        let mut out = self.asc.clone();
        out.extend_from_slice(&self.b);
        out.extend([self.phi1, self.phi2, self.error_sd, self.timesteps]);
        out
    }

    /// `(name, value)` pairs in canonical order, as reported to callers.
    pub fn to_named(&self) -> Vec<(String, f64)> {
        self.names().iter().map(|n| n.to_string()).zip(self.values()).collect()
    }

    /// # Errors
    /// [`ConfigError::UnknownParameter`] when `name` is not in this layout.
    pub fn get(&self, name: ParamName) -> DftResult<f64> {
        match name {
            ParamName::Asc(i) if i >= 1 && i <= self.asc.len() => Ok(self.asc[i - 1]),
            ParamName::Weight(a) => match self.weight_index(a) {
                Some(j) => Ok(self.b[j]),
                None => Err(unknown(name)),
            },
            ParamName::Phi1 => Ok(self.phi1),
            ParamName::Phi2 => Ok(self.phi2),
            ParamName::ErrorSd => Ok(self.error_sd),
            ParamName::Timesteps => Ok(self.timesteps),
            ParamName::Asc(_) => Err(unknown(name)),
        }
    }

    /// # Errors
    /// [`ConfigError::UnknownParameter`] when `name` is not in this layout.
    pub fn set(&mut self, name: ParamName, value: f64) -> DftResult<()> {
        let slot = match name {
            ParamName::Asc(i) if i >= 1 && i <= self.asc.len() => &mut self.asc[i - 1],
            ParamName::Weight(a) => match self.weight_index(a) {
                Some(j) => &mut self.b[j],
                None => return Err(unknown(name)),
            },
            ParamName::Phi1 => &mut self.phi1,
            ParamName::Phi2 => &mut self.phi2,
            ParamName::ErrorSd => &mut self.error_sd,
            ParamName::Timesteps => &mut self.timesteps,
            ParamName::Asc(_) => return Err(unknown(name)),
        };
        *slot = value;
        Ok(())
    }

    /// Builder form of [`ParameterVector::set`] taking a textual name.
    ///
    /// # Errors
    /// [`ConfigError::UnknownParameter`].
    pub fn with(mut self, name: &str, value: f64) -> DftResult<ParameterVector> {
        self.set(name.parse()?, value)?;
        Ok(self)
    }

    /// Attention weights `exp(b_j)`, aligned with [`Self::attributes`].
    pub fn attribute_weights(&self) -> Vec<f64> {
        self.b.iter().map(|b| b.exp()).collect()
    }

    /// Noise standard deviation used by the process, `max(0.1, error_sd)`.
    pub fn noise_sd(&self) -> f64 {
        self.error_sd.max(ERROR_SD_MIN)
    }

    /// Deliberation horizon `1 + exp(min(5, timesteps))`, in `(1, 1 + e⁵]`.
    pub fn horizon(&self) -> f64 {
        1.0 + self.timesteps.min(TIMESTEPS_CAP).exp()
    }

    /// `(phi1, phi2)` clamped to `[0, 1]`.
    pub fn attention(&self) -> (f64, f64) {
        (self.phi1.clamp(0.0, 1.0), self.phi2.clamp(0.0, 1.0))
    }

    /// Whether this vector's layout matches `config`.
    pub fn matches(&self, config: &ModelConfiguration) -> bool {
        self.asc.len() == config.n_alternatives() && self.attributes == config.attributes()
    }

    fn weight_index(&self, attribute: Attribute) -> Option<usize> {
        self.attributes.iter().position(|a| *a == attribute)
    }
}

/// Parameters excluded from optimization and held at their starting values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedParameterSet {
    names: BTreeSet<ParamName>,
}

impl FixedParameterSet {
    /// Nothing fixed.
    pub fn new() -> FixedParameterSet {
        FixedParameterSet { names: BTreeSet::new() }
    }

    /// The study convention: `asc_3` and `b_reliability`.
    pub fn study() -> FixedParameterSet {
        FixedParameterSet {
            names: [ParamName::Asc(3), ParamName::Weight(Attribute::Reliability)]
                .into_iter()
                .collect(),
        }
    }

    /// Parse and check names against `config`.
    ///
    /// # Errors
    /// [`ConfigError::UnknownParameter`] for a name that does not parse or
    /// is not part of `config`'s layout.
    pub fn from_names<S: AsRef<str>>(
        config: &ModelConfiguration, names: &[S],
    ) -> DftResult<FixedParameterSet> {
        let mut set = FixedParameterSet::new();
        for raw in names {
            let name: ParamName = raw.as_ref().parse()?;
            if !config.has_parameter(name) {
                return Err(ConfigError::UnknownParameter { name: raw.as_ref().to_string() }.into());
            }
            set.names.insert(name);
        }
        Ok(set)
    }

    pub fn insert(&mut self, name: ParamName) {
        self.names.insert(name);
    }

    pub fn contains(&self, name: ParamName) -> bool {
        self.names.contains(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = ParamName> + '_ {
        self.names.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn unknown(name: ParamName) -> crate::choice::errors::DftError {
    ConfigError::UnknownParameter { name: name.to_string() }.into()
}
