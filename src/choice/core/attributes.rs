//! Attribute names, attribute profiles, and the clamp applied before any
//! value reaches the accumulator.
//!
//! Every attribute value the process model sees lies in
//! `[ATTRIBUTE_MIN, ATTRIBUTE_MAX] = [0.01, 1.0]`; [`normalize`] is pure and
//! idempotent. NaN is not repaired here (`f64::clamp` keeps it NaN); trial
//! validation rejects it before normalization matters.
use crate::choice::errors::{ConfigError, DftResult};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Lower clamp for attribute values.
pub const ATTRIBUTE_MIN: f64 = 0.01;
/// Upper clamp for attribute values.
pub const ATTRIBUTE_MAX: f64 = 1.0;

/// Robot attributes rated in the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Energy,
    Pace,
    Safety,
    Reliability,
    Intelligence,
}

impl Attribute {
    /// All attributes in the study's column order.
    pub const ALL: [Attribute; 5] = [
        Attribute::Energy,
        Attribute::Pace,
        Attribute::Safety,
        Attribute::Reliability,
        Attribute::Intelligence,
    ];

    /// Lower-case name used in column and parameter names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Energy => "energy",
            Attribute::Pace => "pace",
            Attribute::Safety => "safety",
            Attribute::Reliability => "reliability",
            Attribute::Intelligence => "intelligence",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownAttribute { name: s.to_string() })
    }
}

/// Mapping from attribute to its (raw or normalized) value.
///
/// Missing attributes are representable so that validation can report
/// them; the accumulator only ever sees validated, normalized profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeProfile {
    values: BTreeMap<Attribute, f64>,
}

impl AttributeProfile {
    pub fn new() -> AttributeProfile {
        AttributeProfile { values: BTreeMap::new() }
    }

    /// Build from `(attribute, value)` pairs; later pairs overwrite earlier ones.
    pub fn from_pairs<I>(pairs: I) -> AttributeProfile
    where
        I: IntoIterator<Item = (Attribute, f64)>,
    {
        AttributeProfile { values: pairs.into_iter().collect() }
    }

    /// Build from string keys, e.g. parsed JSON.
    ///
    /// # Errors
    /// [`ConfigError::UnknownAttribute`] for an unrecognised key.
    pub fn from_named<'a, I>(pairs: I) -> DftResult<AttributeProfile>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in pairs {
            values.insert(name.parse::<Attribute>()?, value);
        }
        Ok(AttributeProfile { values })
    }

    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        self.values.get(&attribute).copied()
    }

    pub fn set(&mut self, attribute: Attribute, value: f64) {
        self.values.insert(attribute, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, f64)> + '_ {
        self.values.iter().map(|(a, v)| (*a, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy with every value clamped into `[ATTRIBUTE_MIN, ATTRIBUTE_MAX]`.
    pub fn normalized(&self) -> AttributeProfile {
        normalize(self)
    }
}

/// `max(0.01, min(1.0, x))`.
pub fn clamp_attribute(x: f64) -> f64 {
    x.clamp(ATTRIBUTE_MIN, ATTRIBUTE_MAX)
}

/// Clamp every value of `raw` into `[ATTRIBUTE_MIN, ATTRIBUTE_MAX]`.
pub fn normalize(raw: &AttributeProfile) -> AttributeProfile {
    AttributeProfile { values: raw.values.iter().map(|(a, v)| (*a, clamp_attribute(*v))).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Range and idempotence of the clamp over a wide grid.
    // - Attribute name parsing.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Normalized values always lie in range and normalizing twice changes
    // nothing.
    //
    // Given
    // -----
    // - Values from −1e6 to 1e6 including 0, 0.01, 1 and ±∞.
    //
    // Expect
    // ------
    // - Every output in `[0.01, 1.0]`; `normalize ∘ normalize == normalize`.
    fn normalize_is_bounded_and_idempotent() {
        // Arrange
        let grid = [-1e6, -1.0, 0.0, 0.005, 0.01, 0.5, 1.0, 1.5, 1e6, f64::INFINITY, f64::NEG_INFINITY];
        let raw = AttributeProfile::from_pairs(
            grid.iter().zip(Attribute::ALL.iter().cycle()).map(|(v, a)| (*a, *v)).take(5),
        );

        // Act / Assert
        for &x in &grid {
            let y = clamp_attribute(x);
            assert!((ATTRIBUTE_MIN..=ATTRIBUTE_MAX).contains(&y), "x={x} y={y}");
            assert_eq!(clamp_attribute(y), y);
        }
        let once = normalize(&raw);
        assert_eq!(normalize(&once), once);
        assert_eq!(raw.normalized(), once);
    }

    #[test]
    // Purpose
    // -------
    // Attribute names parse case-insensitively and unknown names are named
    // in the error.
    //
    // Given
    // -----
    // - "Energy", " safety " and "color".
    //
    // Expect
    // ------
    // - Two parses and `UnknownAttribute { name: "color" }`.
    fn attribute_names_parse_case_insensitively() {
        // Act / Assert
        assert_eq!("Energy".parse::<Attribute>(), Ok(Attribute::Energy));
        assert_eq!(" safety ".parse::<Attribute>(), Ok(Attribute::Safety));
        assert_eq!(
            "color".parse::<Attribute>(),
            Err(ConfigError::UnknownAttribute { name: "color".to_string() })
        );
    }
}
