//! High-level entry points for maximizing a user-provided `LogLikelihood`.
//!
//! [`maximize`] runs L-BFGS with either Hager–Zhang or More–Thuente line
//! search; [`maximize_nelder_mead`] runs a derivative-free simplex search for
//! objectives whose finite-difference gradients are meaningless (simulated
//! likelihoods under common random numbers). Both wrap the model in an
//! `ArgMinAdapter` (which *minimizes* `-ℓ(θ)`).
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{
            build_optimizer_hager_zhang, build_optimizer_more_thuente, build_optimizer_nelder_mead,
        },
        run::{run_lbfgs, run_nelder_mead},
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize a log-likelihood `ℓ(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Builds an L-BFGS solver based on `opts.line_searcher`.
/// - Calls `run_lbfgs`, which applies the iteration cap and wall-clock
///   budget and returns an `OptimOutcome`.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_optimizer_*`.
/// - Propagates runtime errors from `run_lbfgs` (e.g., line search failures).
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use dft_choice::optimization::{
///     errors::OptResult,
///     loglik_optimizer::{maximize, LogLikelihood, MLEOptions, Theta, Tolerances},
///     loglik_optimizer::traits::LineSearcher,
/// };
///
/// struct Quadratic;
/// impl LogLikelihood for Quadratic {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let tols = Tolerances::new(Some(1e-6), None, Some(200))?;
/// let opts = MLEOptions::new(tols, LineSearcher::HagerZhang, None)?;
/// let out = maximize(&Quadratic, array![0.1, -0.2, 0.3], &(), &opts)?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), dft_choice::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

/// Maximize a log-likelihood `ℓ(θ)` with the Nelder–Mead simplex method.
///
/// # Behavior
/// - Validates the initial guess via `f.check(theta0, data)`.
/// - Builds a simplex with vertices `theta0` and `theta0 + step · e_k`.
/// - `opts.tols.tol_cost` is the simplex standard-deviation tolerance;
///   `tol_grad`, `line_searcher` and `lbfgs_mem` are ignored.
///
/// # Errors
/// - Propagates any error from `f.check` or the simplex builder.
/// - Propagates runtime errors raised while evaluating the likelihood.
pub fn maximize_nelder_mead<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions, step: f64,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let solver = build_optimizer_nelder_mead(&theta0, step, opts)?;
    let problem = ArgMinAdapter::new(f, data);
    run_nelder_mead(theta0, opts, problem, solver)
}
