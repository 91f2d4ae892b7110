//! Errors raised while turning curvature into a covariance matrix.
//!
//! `InferenceError` covers the two ways standard errors can fail at an
//! otherwise valid estimate: the finite-difference Hessian could not be
//! built, or the observed information is not positive definite. Model
//! layers convert it into a "standard errors unavailable" marker on the
//! result instead of failing the fit.
use crate::optimization::errors::OptError;

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Curvature ----
    /// Smallest eigenvalue of the observed information is not positive.
    NotPositiveDefinite { min_eigenvalue: f64 },

    /// The finite-difference Hessian failed (non-finite entries, model
    /// error at a probe point).
    Hessian(OptError),

    // ---- Shape ----
    /// No parameters to differentiate.
    EmptyParameterVector,

    /// Observation count must be positive to scale the information.
    NoObservations,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Hessian(err)
    }
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Curvature ----
            InferenceError::NotPositiveDefinite { min_eigenvalue } => write!(
                f,
                "Inference Error: observed information not positive definite (min eigenvalue = {})",
                min_eigenvalue
            ),
            InferenceError::Hessian(err) => write!(f, "Inference Error: Hessian failed: {}", err),

            // ---- Shape ----
            InferenceError::EmptyParameterVector => {
                write!(f, "Inference Error: no parameters to differentiate")
            }
            InferenceError::NoObservations => {
                write!(f, "Inference Error: observation count must be positive")
            }
        }
    }
}
