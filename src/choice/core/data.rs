//! Trial records and conversion from the front end's wide rows.
//!
//! Purpose
//! -------
//! Hold one observed choice: the participant, the alternatives on offer
//! (each with an attribute profile and an availability flag), and the id
//! of the alternative chosen. Records are immutable once built; the model
//! only reads them.
//!
//! Key behaviors
//! -------------
//! - [`TrialRecord::new`] stores raw values; nothing is clamped or checked
//!   until `core::validation::validate_trials` runs on the whole batch.
//! - [`TrialRecord::from_wide_row`] converts the flat row the collecting
//!   front end posts (`participantid`, `trial`, `choice`, `avail{N}`,
//!   `robot{N}{attribute}`) into a record. Missing attribute columns become
//!   missing attributes so validation can name them.
//!
//! Invariants & assumptions
//! ------------------------
//! - Alternative ids are 1-based; validated batches have ids `1..=K` in
//!   order, so alternative `id` sits at position `id − 1`.
//!
//! Conventions
//! -----------
//! - Wide-row defaults follow the front end: participant `"anonymous"`,
//!   trial number 1, every alternative available.
//! - Columns the model does not use (`staketype`, `timeSpent`, …) are
//!   accepted and ignored.
use crate::choice::{
    core::{
        attributes::{Attribute, AttributeProfile},
        config::ModelConfiguration,
    },
    errors::{ConfigError, DftResult},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Participant id used when a row carries none.
pub const ANONYMOUS_PARTICIPANT: &str = "anonymous";

/// One alternative on offer in a trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// 1-based alternative id.
    pub id: usize,
    pub profile: AttributeProfile,
    pub available: bool,
}

impl Alternative {
    pub fn new(id: usize, profile: AttributeProfile, available: bool) -> Alternative {
        Alternative { id, profile, available }
    }
}

/// One observed choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant: String,
    /// Trial number within the participant's session.
    pub trial: u32,
    pub alternatives: Vec<Alternative>,
    /// Id of the chosen alternative; `None` when the row had no choice.
    pub chosen: Option<usize>,
    /// Panel grouping key; defaults to the participant when absent.
    pub panel_key: Option<String>,
}

impl TrialRecord {
    pub fn new(
        participant: impl Into<String>, alternatives: Vec<Alternative>, chosen: Option<usize>,
    ) -> TrialRecord {
        TrialRecord { participant: participant.into(), trial: 1, alternatives, chosen, panel_key: None }
    }

    /// All alternatives available, attribute values given per alternative
    /// in the order of `attributes`.
    pub fn from_profiles(
        participant: impl Into<String>, attributes: &[Attribute], profiles: &[Vec<f64>],
        chosen: Option<usize>,
    ) -> TrialRecord {
        let alternatives = profiles
            .iter()
            .enumerate()
            .map(|(k, values)| {
                let profile =
                    AttributeProfile::from_pairs(attributes.iter().copied().zip(values.iter().copied()));
                Alternative::new(k + 1, profile, true)
            })
            .collect();
        TrialRecord::new(participant, alternatives, chosen)
    }

    pub fn with_trial(mut self, trial: u32) -> TrialRecord {
        self.trial = trial;
        self
    }

    pub fn with_panel_key(mut self, key: impl Into<String>) -> TrialRecord {
        self.panel_key = Some(key.into());
        self
    }

    /// Copy with alternative `id` marked unavailable (no-op for unknown ids).
    pub fn with_unavailable(mut self, id: usize) -> TrialRecord {
        if let Some(alt) = self.alternatives.iter_mut().find(|a| a.id == id) {
            alt.available = false;
        }
        self
    }

    /// Copy with a different chosen alternative.
    pub fn with_choice(mut self, chosen: Option<usize>) -> TrialRecord {
        self.chosen = chosen;
        self
    }

    /// Grouping key: explicit panel key, else the participant id.
    pub fn group(&self) -> &str {
        self.panel_key.as_deref().unwrap_or(&self.participant)
    }

    /// 0-based position of the chosen alternative.
    pub fn chosen_index(&self) -> Option<usize> {
        let id = self.chosen?;
        self.alternatives.iter().position(|a| a.id == id)
    }

    /// Availability flags in alternative order.
    pub fn availability(&self) -> Vec<bool> {
        self.alternatives.iter().map(|a| a.available).collect()
    }

    /// Convert a wide-format row.
    ///
    /// `row_index` is only used in error messages.
    ///
    /// # Errors
    /// [`ConfigError::InvalidWideRow`] when `choice` is not a positive
    /// integer or `trial` is negative or fractional.
    pub fn from_wide_row(
        row: &WideRow, config: &ModelConfiguration, row_index: usize,
    ) -> DftResult<TrialRecord> {
        let invalid = |reason: String| ConfigError::InvalidWideRow { row: row_index, reason };
        let chosen = match row.choice {
            None => None,
            Some(c) if c.fract() == 0.0 && c >= 1.0 => Some(c as usize),
            Some(c) => return Err(invalid(format!("choice {c} is not a positive integer")).into()),
        };
        let trial = match row.trial {
            None => 1,
            Some(t) if t.fract() == 0.0 && t >= 0.0 && t <= u32::MAX as f64 => t as u32,
            Some(t) => return Err(invalid(format!("trial {t} is not a non-negative integer")).into()),
        };
        let alternatives = (1..=config.n_alternatives())
            .map(|n| {
                let mut profile = AttributeProfile::new();
                for attribute in config.attributes() {
                    if let Some(v) = row.number(&format!("robot{n}{attribute}")) {
                        profile.set(*attribute, v);
                    }
                }
                let available = row.flag(&format!("avail{n}")).unwrap_or(true);
                Alternative::new(n, profile, available)
            })
            .collect();
        let participant =
            row.participantid.clone().unwrap_or_else(|| ANONYMOUS_PARTICIPANT.to_string());
        Ok(TrialRecord { participant, trial, alternatives, chosen, panel_key: None })
    }
}

/// A cell of a wide row: number, text or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WideValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

/// One flat row as posted by the front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    #[serde(default)]
    pub participantid: Option<String>,
    #[serde(default)]
    pub trial: Option<f64>,
    #[serde(default)]
    pub choice: Option<f64>,
    /// Every other column (`robot1energy`, `avail2`, `staketype`, …).
    #[serde(flatten)]
    pub columns: BTreeMap<String, WideValue>,
}

impl WideRow {
    pub fn new() -> WideRow {
        WideRow::default()
    }

    /// Set a numeric column.
    pub fn set(&mut self, column: impl Into<String>, value: f64) {
        self.columns.insert(column.into(), WideValue::Number(value));
    }

    /// Numeric value of a column; numeric text is parsed, anything else is
    /// treated as absent.
    pub fn number(&self, column: &str) -> Option<f64> {
        match self.columns.get(column)? {
            WideValue::Number(v) => Some(*v),
            WideValue::Text(s) => s.trim().parse().ok(),
            WideValue::Flag(_) => None,
        }
    }

    /// Availability-style flag: booleans, or numbers where non-zero is true.
    pub fn flag(&self, column: &str) -> Option<bool> {
        match self.columns.get(column)? {
            WideValue::Flag(b) => Some(*b),
            WideValue::Number(v) => Some(*v != 0.0),
            WideValue::Text(_) => None,
        }
    }
}

/// Convert a batch of wide rows, failing on the first malformed row.
///
/// # Errors
/// As for [`TrialRecord::from_wide_row`].
pub fn trials_from_wide_rows(
    rows: &[WideRow], config: &ModelConfiguration,
) -> DftResult<Vec<TrialRecord>> {
    rows.iter().enumerate().map(|(i, row)| TrialRecord::from_wide_row(row, config, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::errors::DftError;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Wide-row conversion, defaults, and availability columns.
    // - Chosen-index lookup.
    // - Rejection of malformed choice values.
    //
    // They intentionally DO NOT cover:
    // - Validation of attribute values (see `core::validation`).
    // -------------------------------------------------------------------------

    fn full_row(choice: f64) -> WideRow {
        let mut row = WideRow::new();
        row.choice = Some(choice);
        for n in 1..=3 {
            for a in Attribute::ALL {
                row.set(format!("robot{n}{a}"), 0.1 * n as f64);
            }
        }
        row
    }

    #[test]
    // Purpose
    // -------
    // A complete row converts with front-end defaults.
    //
    // Given
    // -----
    // - A row without participant/trial, choice 2, and `avail3 = 0`.
    //
    // Expect
    // ------
    // - Participant "anonymous", trial 1, chosen id 2 at index 1,
    //   alternative 3 unavailable, values carried through unclamped.
    fn wide_row_converts_with_defaults() {
        // Arrange
        let mut row = full_row(2.0);
        row.set("avail3", 0.0);
        let config = ModelConfiguration::study();

        // Act
        let trial = TrialRecord::from_wide_row(&row, &config, 0).expect("row should convert");

        // Assert
        assert_eq!(trial.participant, ANONYMOUS_PARTICIPANT);
        assert_eq!(trial.trial, 1);
        assert_eq!(trial.chosen_index(), Some(1));
        assert_eq!(trial.availability(), vec![true, true, false]);
        let pace = trial.alternatives[2].profile.get(Attribute::Pace).expect("pace present");
        assert!((pace - 0.3).abs() < 1e-12);
        assert_eq!(trial.group(), ANONYMOUS_PARTICIPANT);
    }

    #[test]
    // Purpose
    // -------
    // Missing columns become missing attributes; bad choices are errors.
    //
    // Given
    // -----
    // - A row without `robot2safety`, and a row with choice 1.5.
    //
    // Expect
    // ------
    // - The first converts with `Safety` absent on alternative 2; the
    //   second yields `InvalidWideRow`.
    fn missing_columns_and_bad_choices() {
        // Arrange
        let config = ModelConfiguration::study();
        let mut gap = full_row(1.0);
        gap.columns.remove("robot2safety");

        // Act
        let converted = TrialRecord::from_wide_row(&gap, &config, 0).expect("converts");
        let bad = TrialRecord::from_wide_row(&full_row(1.5), &config, 7);

        // Assert
        assert_eq!(converted.alternatives[1].profile.get(Attribute::Safety), None);
        assert!(matches!(
            bad,
            Err(DftError::Configuration(ConfigError::InvalidWideRow { row: 7, .. }))
        ));
    }
}
