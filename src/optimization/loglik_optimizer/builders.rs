//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin's generic wiring behind small builders that apply the
//! crate-level [`MLEOptions`]: L-BFGS with either line search, and a
//! Nelder–Mead simplex seeded around the starting point.
//!
//! Key behaviors
//! -------------
//! - L-BFGS memory comes from `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`].
//! - `tol_grad` / `tol_cost` are applied via Argmin's `with_tolerance_*`;
//!   for Nelder–Mead, `tol_cost` becomes the simplex standard-deviation
//!   tolerance.
//! - Initial parameters, iteration caps and wall-clock budgets are runtime
//!   concerns applied by the runner, not here.
//!
//! Invariants & assumptions
//! ------------------------
//! - Argmin rejections of a tolerance surface as [`OptError`] via
//!   `From<argmin::core::Error>`; nothing here panics.
//! - A simplex needs at least one free parameter and a finite, non-zero
//!   step.
//!
//! Testing notes
//! -------------
//! - Unit tests check construction for both line searches, tolerance
//!   wiring, and the simplex geometry and its validation.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, NelderMeadSolver, Theta,
        },
    },
};

/// Construct L-BFGS with Hager–Zhang line search.
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects one
///   of the configured tolerances.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects one
///   of the configured tolerances.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional gradient and cost-change tolerances to an L-BFGS solver,
/// whatever its line search. A `None` tolerance leaves Argmin's default.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// build_optimizer_nelder_mead — construct a Nelder–Mead simplex around `theta0`.
///
/// Parameters
/// ----------
/// - `theta0`: `&Theta`
///   Starting point; becomes the first vertex.
/// - `step`: `f64`
///   Edge length along each coordinate axis. Vertex `k + 1` is
///   `theta0 + step · e_k`.
/// - `opts`: `&MLEOptions`
///   `opts.tols.tol_cost`, when present, is the simplex standard-deviation
///   tolerance.
///
/// Errors
/// ------
/// - `OptError::EmptyTheta` when `theta0` is empty.
/// - `OptError::InvalidSimplexStep` for a zero or non-finite step.
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects the
///   tolerance.
pub fn build_optimizer_nelder_mead(
    theta0: &Theta, step: f64, opts: &MLEOptions,
) -> OptResult<NelderMeadSolver> {
    let simplex = initial_simplex(theta0, step)?;
    let mut solver = NelderMeadSolver::new(simplex);
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_sd_tolerance(c)?;
    }
    Ok(solver)
}

// ---- Helper methods ----

fn initial_simplex(theta0: &Theta, step: f64) -> OptResult<Vec<Theta>> {
    if theta0.is_empty() {
        return Err(OptError::EmptyTheta);
    }
    if !step.is_finite() {
        return Err(OptError::InvalidSimplexStep { step, reason: "Step must be finite." });
    }
    if step == 0.0 {
        return Err(OptError::InvalidSimplexStep { step, reason: "Step must be non-zero." });
    }
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for k in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[k] += step;
        vertices.push(vertex);
    }
    Ok(vertices)
}
