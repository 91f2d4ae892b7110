//! core — shared DFT data, parameters, options, and validation.
//!
//! Purpose
//! -------
//! Collect the building blocks every other part of the choice model uses:
//! attribute profiles and their clamp, trial records, the model
//! configuration, the named parameter vector with its fixed set and bounds,
//! run-time options, per-unit seeding, validation, and the free-parameter
//! view the optimizer works through.
//!
//! Key behaviors
//! -------------
//! - Keep raw trial data exactly as supplied ([`TrialRecord`]); values are
//!   clamped by [`normalize`] only where the accumulator reads them.
//! - Give every parameter a stable name ([`ParamName`]) so fixed sets,
//!   bounds and reports are keyed by name, not by position.
//! - Reject bad input in one pass: [`validate_trials`] lists every offending
//!   trial and field, [`validate_config`] catches inconsistent options.
//! - Map between the optimizer's unconstrained `θ` and full parameter
//!   vectors through a single [`FreeView`], whatever subset is fixed.
//!
//! Invariants & assumptions
//! ------------------------
//! - Alternative ids are 1-based; trial indices in errors are 0-based.
//! - Randomness never comes from global state: generators are built from
//!   [`derive_seed`] for each unit of work.
//!
//! Conventions
//! -----------
//! - This module performs no logging and no I/O.
//!
//! Testing notes
//! -------------
//! - Each submodule carries its own unit tests; the accumulator, likelihood
//!   and estimation layers exercise these types end to end.

pub mod attributes;
pub mod bounds;
pub mod config;
pub mod data;
pub mod options;
pub mod params;
pub mod seeds;
pub mod validation;
pub mod view;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::attributes::{Attribute, AttributeProfile, clamp_attribute, normalize};
pub use self::bounds::{Bound, Bounds};
pub use self::config::ModelConfiguration;
pub use self::data::{Alternative, TrialRecord, WideRow, WideValue, trials_from_wide_rows};
pub use self::options::{EstimationOptions, SearchMethod, Strategy};
pub use self::params::{FixedParameterSet, ParamName, ParameterVector};
pub use self::seeds::{derive_seed, rng_for};
pub use self::validation::{validate_config, validate_options, validate_trials};
pub use self::view::FreeView;

pub mod prelude {
    pub use super::attributes::{Attribute, AttributeProfile, normalize};
    pub use super::bounds::Bounds;
    pub use super::config::ModelConfiguration;
    pub use super::data::{Alternative, TrialRecord, WideRow};
    pub use super::options::{EstimationOptions, SearchMethod, Strategy};
    pub use super::params::{FixedParameterSet, ParamName, ParameterVector};
}
