//! inference::hessian — observed-information covariance and standard errors.
//!
//! Purpose
//! -------
//! Turn the curvature of an average log-likelihood at its maximum into a
//! covariance matrix and standard errors for the estimated parameters.
//!
//! Key behaviors
//! -------------
//! - Build the Hessian `H̄(θ̂)` of the **average** log-likelihood with
//!   [`hessian_of`] (central gradient fed through a central Hessian).
//! - Copy `J̄ = −H̄` into a `nalgebra::DMatrix` (`fill_dmatrix`) and take its
//!   symmetric eigendecomposition `J̄ = Q Λ Qᵀ`.
//! - Refuse when the smallest eigenvalue is at most [`EIGEN_EPS`]: a
//!   covariance from a non-maximum (or a flat direction) would be
//!   meaningless, so the caller gets
//!   [`InferenceError::NotPositiveDefinite`] rather than a pseudoinverse.
//! - Otherwise `Cov(θ̂) = (n·J̄)⁻¹ = Q diag(1/(n·λ)) Qᵀ` and
//!   `SE_i = sqrt(Cov_ii)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `θ̂` is on the scale the standard errors should be reported on; no
//!   delta-method correction is applied here.
//! - The log-likelihood must be smooth near `θ̂`. Simulated likelihoods
//!   under common random numbers are piecewise constant and give a zero
//!   Hessian; callers should not route them here.
//!
//! Conventions
//! -----------
//! - `n` is the number of observations the average runs over, so the
//!   covariance corresponds to the **summed** log-likelihood.
//! - No explicit matrix inverse is formed.
use crate::{
    inference::errors::{InferenceError, InferenceResult},
    optimization::{
        errors::OptResult,
        loglik_optimizer::finite_diff::{CENTRAL_REL_STEP, hessian_of},
        numerical_stability::transformations::EIGEN_EPS,
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Covariance matrix of an estimate and the matching standard errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    pub matrix: Array2<f64>,
    pub standard_errors: Array1<f64>,
    /// Smallest eigenvalue of the per-observation information.
    pub min_eigenvalue: f64,
}

/// calc_covariance — `(n·J̄)⁻¹` from an average log-likelihood.
///
/// Parameters
/// ----------
/// - `f`: average log-likelihood `θ ↦ ℓ̄(θ)`, fallible.
/// - `theta_hat`: point at which the curvature is evaluated.
/// - `n_obs`: number of observations averaged in `f`.
///
/// Errors
/// ------
/// - [`InferenceError::EmptyParameterVector`] / [`InferenceError::NoObservations`].
/// - [`InferenceError::Hessian`] when `f` fails at a probe point or the
///   Hessian is not finite.
/// - [`InferenceError::NotPositiveDefinite`] when `J̄` has an eigenvalue at
///   most [`EIGEN_EPS`].
pub fn calc_covariance<F>(f: &F, theta_hat: &Array1<f64>, n_obs: usize) -> InferenceResult<Covariance>
where
    F: Fn(&Array1<f64>) -> OptResult<f64>,
{
    if theta_hat.is_empty() {
        return Err(InferenceError::EmptyParameterVector);
    }
    if n_obs == 0 {
        return Err(InferenceError::NoObservations);
    }
    let hess = hessian_of(f, theta_hat, CENTRAL_REL_STEP)?;
    let mut obs_info = DMatrix::<f64>::zeros(hess.nrows(), hess.ncols());
    fill_dmatrix(&hess.mapv(|h| -h), &mut obs_info);
    covariance_from_information(obs_info, n_obs as f64)
}

// ---- Helper methods ----

/// Copy an `ndarray` matrix into a preallocated `DMatrix` of the same
/// shape, column by column.
fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    let n = src.ncols();
    for j in 0..n {
        for i in 0..src.nrows() {
            dst[(i, j)] = src[[i, j]];
        }
    }
}

/// Invert `n·J̄` through its eigendecomposition, refusing non-PD input.
fn covariance_from_information(obs_info: DMatrix<f64>, n: f64) -> InferenceResult<Covariance> {
    let p = obs_info.nrows();
    let eigen = obs_info.symmetric_eigen();
    let min_eigenvalue = eigen.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    if !(min_eigenvalue > EIGEN_EPS) {
        return Err(InferenceError::NotPositiveDefinite { min_eigenvalue });
    }
    let q = eigen.eigenvectors;
    let lambdas = eigen.eigenvalues;
    let mut matrix = Array2::<f64>::zeros((p, p));
    for i in 0..p {
        for j in i..p {
            let v: f64 = lambdas.iter().enumerate().map(|(k, l)| q[(i, k)] * q[(j, k)] / (n * l)).sum();
            matrix[[i, j]] = v;
            matrix[[j, i]] = v;
        }
    }
    let standard_errors = matrix.diag().mapv(f64::sqrt);
    Ok(Covariance { matrix, standard_errors, min_eigenvalue })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Covariance and SEs for quadratic objectives with known information.
    // - Scaling by the observation count.
    // - Refusal of indefinite or flat curvature.
    //
    // They intentionally DO NOT cover:
    // - The choice-model likelihood (see `choice::models` tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Classical SEs match the analytic inverse for a correlated quadratic.
    //
    // Given
    // -----
    // - ℓ̄(θ) = −½ θᵀAθ with A = [[2, 0.5], [0.5, 1]], n = 10.
    //
    // Expect
    // ------
    // - Cov = (10·A)⁻¹ within 1e-5 entrywise.
    fn quadratic_covariance_matches_inverse() {
        // Arrange
        let a = array![[2.0, 0.5], [0.5, 1.0]];
        let f = |t: &Array1<f64>| -> OptResult<f64> { Ok(-0.5 * t.dot(&a.dot(t))) };
        let det = 2.0 * 1.0 - 0.25;
        let inv = array![[1.0 / det, -0.5 / det], [-0.5 / det, 2.0 / det]] / 10.0;

        // Act
        let cov = calc_covariance(&f, &array![0.3, -0.2], 10).expect("positive definite");

        // Assert
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(cov.matrix[[i, j]], inv[[i, j]], epsilon = 1e-5);
            }
            assert_relative_eq!(cov.standard_errors[i], inv[[i, i]].sqrt(), epsilon = 1e-5);
        }
    }

    #[test]
    // Purpose
    // -------
    // A saddle or a flat direction is reported, not inverted.
    //
    // Given
    // -----
    // - J̄ = diag(1, −1) and J̄ = diag(1, 0) passed straight to the
    //   eigen step.
    //
    // Expect
    // ------
    // - `NotPositiveDefinite` carrying the smallest eigenvalue.
    fn non_positive_definite_information_is_refused() {
        // Arrange
        let saddle = DMatrix::<f64>::from_diagonal(&DVector::from_vec(vec![1.0, -1.0]));
        let flat = DMatrix::<f64>::from_diagonal(&DVector::from_vec(vec![1.0, 0.0]));

        // Act
        let r_saddle = covariance_from_information(saddle, 1.0);
        let r_flat = covariance_from_information(flat, 1.0);

        // Assert
        assert_eq!(r_saddle, Err(InferenceError::NotPositiveDefinite { min_eigenvalue: -1.0 }));
        assert!(matches!(r_flat, Err(InferenceError::NotPositiveDefinite { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Failures inside the objective surface as `Hessian` errors; empty
    // inputs are rejected.
    //
    // Given
    // -----
    // - An objective that always errors; an empty θ; n = 0.
    //
    // Expect
    // ------
    // - `Hessian(_)`, `EmptyParameterVector`, `NoObservations`.
    fn failures_are_typed() {
        // Arrange
        let failing = |_: &Array1<f64>| -> OptResult<f64> {
            Err(crate::optimization::errors::OptError::Model { text: "boom".into() })
        };
        let ok = |t: &Array1<f64>| -> OptResult<f64> { Ok(-t.dot(t)) };

        // Act / Assert
        assert!(matches!(calc_covariance(&failing, &array![0.0], 5), Err(InferenceError::Hessian(_))));
        assert_eq!(
            calc_covariance(&ok, &Array1::zeros(0), 5),
            Err(InferenceError::EmptyParameterVector)
        );
        assert_eq!(calc_covariance(&ok, &array![0.0], 0), Err(InferenceError::NoObservations));
    }
}
