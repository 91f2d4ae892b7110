//! Model configuration: which attributes enter the process, how many
//! alternatives each trial carries, and the panel flag.
//!
//! The parameter layout of a model follows from its configuration (see
//! [`ModelConfiguration::parameter_names`]), so two fits with different
//! attribute lists never share a `ParameterVector` by accident.
use crate::choice::{
    core::{attributes::Attribute, params::ParamName},
    errors::{ConfigError, DftResult},
};
use serde::{Deserialize, Serialize};

/// Alternatives per trial in the robot-allocation study.
pub const STUDY_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfiguration {
    attributes: Vec<Attribute>,
    n_alternatives: usize,
    /// Trials grouped by participant. Recorded for callers; the likelihood
    /// is a flat sum over trials either way.
    pub panel_data: bool,
}

impl ModelConfiguration {
    /// Validated configuration.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyAttributeSet`] for an empty attribute list.
    /// - [`ConfigError::DuplicateAttribute`] when an attribute repeats.
    /// - [`ConfigError::InvalidAlternativeCount`] for fewer than two
    ///   alternatives.
    pub fn new(
        attributes: Vec<Attribute>, n_alternatives: usize, panel_data: bool,
    ) -> DftResult<ModelConfiguration> {
        if attributes.is_empty() {
            return Err(ConfigError::EmptyAttributeSet.into());
        }
        for (i, a) in attributes.iter().enumerate() {
            if attributes[..i].contains(a) {
                return Err(ConfigError::DuplicateAttribute { name: a.to_string() }.into());
            }
        }
        if n_alternatives < 2 {
            return Err(ConfigError::InvalidAlternativeCount { count: n_alternatives }.into());
        }
        Ok(ModelConfiguration { attributes, n_alternatives, panel_data })
    }

    /// Five attributes, three alternatives, trials grouped by participant.
    pub fn study() -> ModelConfiguration {
        ModelConfiguration {
            attributes: Attribute::ALL.to_vec(),
            n_alternatives: STUDY_ALTERNATIVES,
            panel_data: true,
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn n_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn n_alternatives(&self) -> usize {
        self.n_alternatives
    }

    /// Position of `attribute` in the configured list.
    pub fn attribute_index(&self, attribute: Attribute) -> Option<usize> {
        self.attributes.iter().position(|a| *a == attribute)
    }

    /// Canonical parameter order: `asc_1..asc_K`, `b_<attr>` in attribute
    /// order, then `phi1`, `phi2`, `error_sd`, `timesteps`.
    pub fn parameter_names(&self) -> Vec<ParamName> {
        let mut names: Vec<ParamName> = (1..=self.n_alternatives).map(ParamName::Asc).collect();
        names.extend(self.attributes.iter().map(|a| ParamName::Weight(*a)));
        names.extend([ParamName::Phi1, ParamName::Phi2, ParamName::ErrorSd, ParamName::Timesteps]);
        names
    }

    /// Whether `name` belongs to this configuration's layout.
    pub fn has_parameter(&self, name: ParamName) -> bool {
        match name {
            ParamName::Asc(i) => (1..=self.n_alternatives).contains(&i),
            ParamName::Weight(a) => self.attribute_index(a).is_some(),
            _ => true,
        }
    }
}

impl Default for ModelConfiguration {
    fn default() -> Self {
        ModelConfiguration::study()
    }
}
