//! Errors for the DFT choice model (trial validation, configuration checks,
//! optimizer failures).
//!
//! [`DftError`] is the model-level error; [`ConfigError`] enumerates the
//! configuration mistakes it can wrap, and [`TrialIssue`] records one
//! problem with one trial so a rejected batch can list every offender.
//! Numerical trouble that still yields an estimate (probabilities hitting
//! the floor, budgets running out) is *not* an error here; it travels on
//! the estimation result as diagnostics and status.
//!
//! ## Conventions
//! - Trial indices are **0-based** positions in the submitted batch.
//! - Alternative identifiers are the **1-based** ids used by the front end.
use crate::optimization::errors::OptError;
use std::fmt;

/// Crate-wide result alias for choice-model operations.
pub type DftResult<T> = Result<T, DftError>;

/// Unified error type for the choice model.
#[derive(Debug, Clone, PartialEq)]
pub enum DftError {
    /// One or more trials failed validation; nothing was fitted.
    InvalidTrialData { issues: Vec<TrialIssue> },

    /// Configuration, bounds or options are inconsistent.
    Configuration(ConfigError),

    /// Every optimizer restart failed.
    Optimization(OptError),

    /// Prediction or reporting requested before a successful fit.
    ModelNotFitted,
}

/// Configuration mistakes detected before any likelihood is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A parameter name that the model configuration does not define.
    UnknownParameter { name: String },

    /// `lower > upper`, or a bound that is NaN.
    InvalidBounds { name: String, lower: f64, upper: f64 },

    /// Fewer than two alternatives per trial.
    InvalidAlternativeCount { count: usize },

    /// No attributes configured.
    EmptyAttributeSet,

    /// The same attribute listed twice.
    DuplicateAttribute { name: String },

    /// A value vector whose length does not match the parameter layout.
    ParameterLengthMismatch { expected: usize, found: usize },

    /// The requested accumulator cannot handle this configuration.
    UnsupportedStrategy { strategy: String, reason: &'static str },

    /// Monte Carlo replicate count must be at least one.
    InvalidReplicates { replicates: usize },

    /// The probability floor must be finite and in `(0, 1)`.
    InvalidProbabilityFloor { value: f64 },

    /// At least one restart is required.
    InvalidRestarts { restarts: usize },

    /// Restart perturbation scale must be finite and non-negative.
    InvalidPerturbation { scale: f64 },

    /// Nelder–Mead step must be finite and non-zero.
    InvalidSimplexStep { step: f64 },

    /// Attribute name not recognised.
    UnknownAttribute { name: String },

    /// Accumulator strategy name not recognised.
    UnknownStrategy { name: String },

    /// Search method name not recognised.
    UnknownSearchMethod { name: String },

    /// A wide-format row that cannot be turned into a trial.
    InvalidWideRow { row: usize, reason: String },
}

/// One validation problem with one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialIssue {
    /// 0-based position of the trial in the batch.
    pub trial: usize,
    /// Field that failed, e.g. `"robot2safety"` or `"choice"`.
    pub field: String,
    /// What is wrong with it.
    pub problem: TrialProblem,
}

/// Kinds of per-trial validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialProblem {
    /// An attribute the configuration uses has no value.
    MissingAttribute,
    /// An attribute value is NaN or infinite.
    NonFiniteAttribute { value: f64 },
    /// No chosen alternative recorded.
    MissingChoice,
    /// The chosen id is not one of the trial's alternatives.
    UnknownChoice { choice: usize },
    /// The chosen alternative is marked unavailable.
    ChosenUnavailable { choice: usize },
    /// The trial does not carry the configured number of alternatives.
    AlternativeCount { expected: usize, found: usize },
    /// Alternative ids are not exactly `1..=K` in order.
    AlternativeIds,
}

impl TrialIssue {
    pub fn new(trial: usize, field: impl Into<String>, problem: TrialProblem) -> TrialIssue {
        TrialIssue { trial, field: field.into(), problem }
    }
}

impl std::error::Error for DftError {}

impl fmt::Display for DftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DftError::InvalidTrialData { issues } => {
                let mut trials: Vec<usize> = issues.iter().map(|i| i.trial).collect();
                trials.dedup();
                write!(f, "Invalid trial data in {} trial(s) {:?}", trials.len(), trials)?;
                for issue in issues {
                    write!(f, "; {issue}")?;
                }
                Ok(())
            }
            DftError::Configuration(err) => write!(f, "Configuration error: {err}"),
            DftError::Optimization(err) => write!(f, "Optimization failed: {err}"),
            DftError::ModelNotFitted => write!(f, "Model has not been fitted"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownParameter { name } => write!(f, "Unknown parameter '{name}'"),
            ConfigError::InvalidBounds { name, lower, upper } => {
                write!(f, "Invalid bounds for '{name}': lower {lower} > upper {upper}")
            }
            ConfigError::InvalidAlternativeCount { count } => {
                write!(f, "Need at least two alternatives, got {count}")
            }
            ConfigError::EmptyAttributeSet => write!(f, "No attributes configured"),
            ConfigError::DuplicateAttribute { name } => {
                write!(f, "Attribute '{name}' listed more than once")
            }
            ConfigError::ParameterLengthMismatch { expected, found } => {
                write!(f, "Parameter length mismatch: expected {expected}, found {found}")
            }
            ConfigError::UnsupportedStrategy { strategy, reason } => {
                write!(f, "Strategy '{strategy}' unsupported: {reason}")
            }
            ConfigError::InvalidReplicates { replicates } => {
                write!(f, "Invalid replicate count {replicates}: must be at least 1")
            }
            ConfigError::InvalidProbabilityFloor { value } => {
                write!(f, "Invalid probability floor {value}: must be finite and in (0, 1)")
            }
            ConfigError::InvalidRestarts { restarts } => {
                write!(f, "Invalid restart count {restarts}: must be at least 1")
            }
            ConfigError::InvalidPerturbation { scale } => {
                write!(f, "Invalid restart perturbation {scale}: must be finite and >= 0")
            }
            ConfigError::InvalidSimplexStep { step } => {
                write!(f, "Invalid simplex step {step}: must be finite and non-zero")
            }
            ConfigError::UnknownAttribute { name } => write!(f, "Unknown attribute '{name}'"),
            ConfigError::UnknownStrategy { name } => write!(
                f,
                "Unknown strategy '{name}': valid options are 'MonteCarlo' or 'Gaussian'"
            ),
            ConfigError::UnknownSearchMethod { name } => write!(
                f,
                "Unknown search method '{name}': valid options are 'LBFGS' or 'NelderMead'"
            ),
            ConfigError::InvalidWideRow { row, reason } => {
                write!(f, "Invalid wide row {row}: {reason}")
            }
        }
    }
}

impl fmt::Display for TrialIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trial {} field '{}': ", self.trial, self.field)?;
        match &self.problem {
            TrialProblem::MissingAttribute => write!(f, "missing attribute value"),
            TrialProblem::NonFiniteAttribute { value } => {
                write!(f, "attribute value {value} is not finite")
            }
            TrialProblem::MissingChoice => write!(f, "no chosen alternative"),
            TrialProblem::UnknownChoice { choice } => {
                write!(f, "chosen alternative {choice} does not exist")
            }
            TrialProblem::ChosenUnavailable { choice } => {
                write!(f, "chosen alternative {choice} is unavailable")
            }
            TrialProblem::AlternativeCount { expected, found } => {
                write!(f, "expected {expected} alternatives, found {found}")
            }
            TrialProblem::AlternativeIds => write!(f, "alternative ids must be 1..=K in order"),
        }
    }
}

impl From<ConfigError> for DftError {
    fn from(err: ConfigError) -> Self {
        DftError::Configuration(err)
    }
}

impl From<OptError> for DftError {
    fn from(err: OptError) -> Self {
        DftError::Optimization(err)
    }
}

#[cfg(feature = "python-bindings")]
impl std::convert::From<DftError> for pyo3::PyErr {
    fn from(err: DftError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
