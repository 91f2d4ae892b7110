//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their model.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by [`maximize`] and
//!   [`maximize_nelder_mead`].
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. If an analytic gradient is provided, it should be the gradient
//! of the log-likelihood (`∇ℓ(θ)`); the adapter flips the sign as needed.
//!
//! [`maximize`]: crate::optimization::loglik_optimizer::maximize
//! [`maximize_nelder_mead`]: crate::optimization::loglik_optimizer::maximize_nelder_mead
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use std::{str::FromStr, time::Duration};

/// User-implemented log-likelihood interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-likelihood `∇ℓ(θ)` (the adapter flips the sign to match the cost).
///
/// - `type Data`: per-model data carried into `value`/`grad`/`check`; may be
///   unsized (a slice), since it is only ever borrowed.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
///   - Errors: return a descriptive `OptError` for invalid inputs or model failures.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook to reject
///   obviously invalid `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, robust finite differences are used automatically.
pub trait LogLikelihood {
    type Data: ?Sized + 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`); unknown
/// names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
/// - `lbfgs_mem: Option<usize>` — L-BFGS history size (default 7).
/// - `timeout: Option<Duration>` — wall-clock budget for a single run; when
///   it expires the executor stops and the incumbent is returned with a
///   non-converged status.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 300`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
/// - `timeout`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
    pub timeout: Option<Duration>,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// Numeric tolerances are validated inside [`Tolerances::new`]; this
    /// constructor only checks the L-BFGS memory.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose: false, lbfgs_mem, timeout: None })
    }

    /// Return a copy with the wall-clock budget set.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return a copy with solver progress logging toggled.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
            timeout: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold
///   (for Nelder–Mead: when the spread of simplex costs falls below it).
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by the maximizers.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ)` (not the cost).
/// - `converged`: `true` only if the solver met its own tolerance
///   (`SolverConverged`) or a target cost. Budget exhaustion (iterations,
///   wall clock), interrupts and solver exits all report `false`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`
///   (e.g. `cost_count`, `gradient_count`).
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (finite).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = classify_termination(&termination);
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}

/// Map an argmin termination status to `(converged, status)`.
///
/// Only `SolverConverged` and `TargetCostReached` count as convergence.
pub fn classify_termination(termination: &TerminationStatus) -> (bool, String) {
    match termination {
        TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
        TerminationStatus::Terminated(reason) => {
            let converged = matches!(
                reason,
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached
            );
            (converged, reason.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Tolerance and option validation.
    // - Line-search parsing.
    // - Termination classification and `OptimOutcome` construction.
    //
    // They intentionally DO NOT cover:
    // - Running a solver (see `api` and the integration tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure that an all-`None` tolerance set is rejected.
    //
    // Given
    // -----
    // - `Tolerances::new(None, None, None)`.
    //
    // Expect
    // ------
    // - `OptError::NoTolerancesProvided`.
    fn tolerances_require_at_least_one_rule() {
        // Act
        let result = Tolerances::new(None, None, None);

        // Assert
        assert_eq!(result, Err(OptError::NoTolerancesProvided));
    }

    #[test]
    // Purpose
    // -------
    // Reject non-positive tolerances and a zero iteration budget.
    //
    // Given
    // -----
    // - A negative gradient tolerance, a NaN cost tolerance, and `max_iter = 0`.
    //
    // Expect
    // ------
    // - The matching `InvalidTol*` / `InvalidMaxIter` variants.
    fn tolerances_reject_invalid_values() {
        // Act / Assert
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, Some(f64::NAN), None),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Check that zero L-BFGS memory is refused and that the builder helpers
    // set the optional fields.
    //
    // Given
    // -----
    // - Valid tolerances with `lbfgs_mem = Some(0)` and `Some(5)`.
    //
    // Expect
    // ------
    // - `InvalidLBFGSMem` for zero; the timeout and verbosity are stored.
    fn mle_options_validate_memory_and_store_budget() {
        // Arrange
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).expect("valid tolerances");

        // Act
        let bad = MLEOptions::new(tols, LineSearcher::HagerZhang, Some(0));
        let good = MLEOptions::new(tols, LineSearcher::HagerZhang, Some(5))
            .expect("valid options")
            .with_timeout(Some(Duration::from_secs(3)))
            .with_verbose(true);

        // Assert
        assert!(matches!(bad, Err(OptError::InvalidLBFGSMem { mem: 0, .. })));
        assert_eq!(good.timeout, Some(Duration::from_secs(3)));
        assert!(good.verbose);
    }

    #[test]
    // Purpose
    // -------
    // Parse line-search names case-insensitively.
    //
    // Given
    // -----
    // - "hagerzhang", "MORETHUENTE" and "armijo".
    //
    // Expect
    // ------
    // - The first two parse; the last returns `InvalidLineSearch`.
    fn line_searcher_parses_case_insensitively() {
        // Act / Assert
        assert_eq!("hagerzhang".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert_eq!("MORETHUENTE".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert!(matches!(
            "armijo".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Budget exhaustion must not be reported as convergence.
    //
    // Given
    // -----
    // - Terminations by `MaxItersReached`, `Timeout` and `SolverConverged`.
    //
    // Expect
    // ------
    // - Only `SolverConverged` classifies as converged.
    fn classify_termination_only_accepts_solver_convergence() {
        // Arrange
        let max_iters = TerminationStatus::Terminated(TerminationReason::MaxItersReached);
        let timeout = TerminationStatus::Terminated(TerminationReason::Timeout);
        let solved = TerminationStatus::Terminated(TerminationReason::SolverConverged);

        // Act
        let (c_iters, _) = classify_termination(&max_iters);
        let (c_timeout, _) = classify_termination(&timeout);
        let (c_solved, _) = classify_termination(&solved);

        // Assert
        assert!(!c_iters);
        assert!(!c_timeout);
        assert!(c_solved);
    }

    #[test]
    // Purpose
    // -------
    // `OptimOutcome::new` validates its inputs.
    //
    // Given
    // -----
    // - A missing theta and a non-finite value.
    //
    // Expect
    // ------
    // - `MissingThetaHat` and `NonFiniteCost` respectively.
    fn outcome_rejects_missing_theta_and_non_finite_value() {
        // Arrange
        let status = TerminationStatus::Terminated(TerminationReason::SolverConverged);

        // Act
        let missing =
            OptimOutcome::new(None, -1.0, status.clone(), 3, FnEvalMap::new(), None);
        let non_finite = OptimOutcome::new(
            Some(array![0.0]),
            f64::NEG_INFINITY,
            status,
            3,
            FnEvalMap::new(),
            None,
        );

        // Assert
        assert_eq!(missing, Err(OptError::MissingThetaHat));
        assert!(matches!(non_finite, Err(OptError::NonFiniteCost { .. })));
    }
}
