//! loglik_optimizer::finite_diff — finite-difference gradient and Hessian helpers.
//!
//! Purpose
//! -------
//! Derivatives around a parameter vector for models without analytic
//! derivatives: the fallback gradient used inside the solvers, a
//! fixed-step central gradient for post-estimation curvature, and a
//! validated, symmetrized Hessian built from any gradient map.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: forward differences through `finitediff`, with the
//!   first error raised by the objective captured and re-raised.
//! - [`central_gradient`]: central differences with a caller-chosen
//!   relative step. Used where the objective is smooth but only accurate to
//!   a few ulps per term (sums over thousands of trials), so the
//!   `sqrt(ε)` steps of `finitediff` would amplify round-off.
//! - [`compute_hessian`]: central-difference Jacobian of a gradient map,
//!   forward-difference fallback, then in-place symmetrization.
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything returned here satisfies [`validate_grad`] /
//!   [`validate_hessian`]; failures are `OptError`s, never panics.
//! - Differences are taken in whatever coordinates the caller passes;
//!   reparameterization is a higher-layer concern.
//!
//! Testing notes
//! -------------
//! - Unit tests cover error capture, validation failures, accuracy on
//!   quadratics, and symmetrization.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Default relative step for [`central_gradient`].
pub const CENTRAL_REL_STEP: f64 = 1e-4;

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// The closure cannot return `Result`, so evaluation errors are parked in
/// `closure_err` (the closure returns `NaN`). This clears the cell, runs
/// `forward_diff`, re-raises a captured error, and validates the result.
///
/// # Errors
/// - The first error captured while evaluating `func`.
/// - [`OptError::InvalidGradient`] / [`OptError::GradientDimMismatch`] from
///   validation.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// central_gradient — fixed-relative-step central differences.
///
/// Parameters
/// ----------
/// - `f`: `&F`
///   Fallible scalar function.
/// - `theta`: `&Theta`
///   Evaluation point.
/// - `rel_step`: `f64`
///   Step for coordinate `k` is `rel_step · max(1, |θ_k|)`.
///
/// Returns
/// -------
/// `OptResult<Grad>` with `(f(θ + h e_k) − f(θ − h e_k)) / 2h` per entry.
///
/// Errors
/// ------
/// - Any error returned by `f`.
/// - [`OptError::InvalidGradient`] when a difference is not finite.
pub fn central_gradient<F>(f: &F, theta: &Theta, rel_step: f64) -> OptResult<Grad>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let mut grad = Grad::zeros(theta.len());
    let mut probe = theta.clone();
    for k in 0..theta.len() {
        let h = rel_step * theta[k].abs().max(1.0);
        probe[k] = theta[k] + h;
        let up = f(&probe)?;
        probe[k] = theta[k] - h;
        let down = f(&probe)?;
        probe[k] = theta[k];
        grad[k] = (up - down) / (2.0 * h);
    }
    validate_grad(&grad, theta.len())?;
    Ok(grad)
}

/// compute_hessian — validated, symmetric Jacobian of a gradient map.
///
/// Uses `finitediff`'s central Hessian first; if that is not finite, falls
/// back to forward differences.
///
/// # Errors
/// - [`OptError::InvalidHessian`] / [`OptError::HessianDimMismatch`] when
///   the forward fallback also fails validation.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut cent_hess = theta.central_hessian(f);
    match validate_hessian(&cent_hess, dim) {
        Ok(_) => {
            symmetrize_hess(&mut cent_hess);
            Ok(cent_hess)
        }
        Err(_) => {
            let mut forward_hess = theta.forward_hessian(f);
            validate_hessian(&forward_hess, dim)?;
            symmetrize_hess(&mut forward_hess);
            Ok(forward_hess)
        }
    }
}

/// Hessian of a fallible scalar function: [`central_gradient`] fed through
/// [`compute_hessian`].
///
/// Gradient errors inside the Hessian sweep are captured like in
/// [`run_fd_diff`] and re-raised after the sweep.
///
/// # Errors
/// - The first error raised by `f`.
/// - Validation errors from [`compute_hessian`].
pub fn hessian_of<F>(f: &F, theta: &Theta, rel_step: f64) -> OptResult<Hessian>
where
    F: Fn(&Theta) -> OptResult<f64>,
{
    let captured: RefCell<Option<OptError>> = RefCell::new(None);
    let grad_map = |x: &Theta| -> Grad {
        match central_gradient(f, x, rel_step) {
            Ok(g) => g,
            Err(e) => {
                let mut slot = captured.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                Grad::from_elem(x.len(), f64::NAN)
            }
        }
    };
    let hess = compute_hessian(&grad_map, theta);
    if let Some(err) = captured.take() {
        return Err(err);
    }
    hess
}

// ---- Helper methods ----

fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
