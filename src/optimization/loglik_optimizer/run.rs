//! Execution helpers that run an `argmin` solver on a log-likelihood problem
//! and return a crate-friendly [`OptimOutcome`].
//!
//! Both runners share [`execute`], which wires the initial point, the
//! iteration cap, the wall-clock budget and (behind `obs_slog`) a terminal
//! observer into the executor. When a budget runs out argmin stops with
//! `MaxItersReached` / `Timeout`, the incumbent is still returned, and
//! [`OptimOutcome::converged`] is `false`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::CostFunction;
use argmin::core::{Executor, IterState, Solver, State};

/// Solver state shape shared by the crate's runners; `G` is the gradient
/// type (`Grad` for L-BFGS, `()` for Nelder–Mead).
pub type RunState<G> = IterState<Theta, G, (), (), (), f64>;

/// Run a gradient-based solver (L-BFGS) and collect the outcome.
///
/// # Errors
/// - Propagates any `argmin` runtime error (solver errors, line-search
///   failures, errors raised by the likelihood) as `OptError`.
/// - Propagates validation errors from [`OptimOutcome::new`].
///
/// # Examples
/// ```ignore
/// let problem = ArgMinAdapter::new(&model, &data);
/// let solver  = build_optimizer_hager_zhang(&opts)?;
/// let out     = run_lbfgs(theta0.clone(), &opts, problem, solver)?;
/// println!("done in {} iters, status: {}", out.iterations, out.status);
/// ```
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, RunState<Grad>>,
{
    let mut result = execute(theta0, opts, problem, solver)?;
    let grad = result.take_gradient();
    into_outcome(result, grad)
}

/// Run the derivative-free simplex solver and collect the outcome.
///
/// The simplex already carries its starting vertices; `theta0` is still set
/// on the state so observers and the fallback best-parameter logic see it.
///
/// # Errors
/// Same as [`run_lbfgs`].
pub fn run_nelder_mead<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, RunState<()>>,
{
    let result = execute(theta0, opts, problem, solver)?;
    into_outcome(result, None)
}

/// Configure and run the executor, returning the terminal solver state.
pub fn execute<'a, F, S, G>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<RunState<G>>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, RunState<G>>,
    G: Clone,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }
    if let Some(budget) = opts.timeout {
        optimizer = optimizer.timeout(budget);
    }
    Ok(optimizer.run()?.state().clone())
}

// ---- Helper Methods ----

fn into_outcome<G>(mut state: RunState<G>, grad: Option<Grad>) -> OptResult<OptimOutcome>
where
    G: Clone,
{
    let iterations = state.get_iter();
    let function_counts = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    let best_cost = state.get_best_cost();
    OptimOutcome::new(
        state.take_best_param(),
        -best_cost,
        termination,
        iterations,
        function_counts,
        grad,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(theta0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: LogLikelihood,
{
    let ll0 = -problem.cost(theta0)?;
    tracing::info!(ll0, "initial log-likelihood");
    Ok(())
}
