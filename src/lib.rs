//! dft_choice — Decision Field Theory choice modelling with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that exposes
//! the DFT choice model to Python via the `_dft_choice` extension module. When
//! the `python-bindings` feature is enabled, this module defines the
//! Python-facing classes and submodules used by the `dft_choice` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`choice`, `optimization`, `inference`)
//!   as the public crate surface.
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_dft_choice` Python extension.
//! - Register the `models` submodule under `dft_choice` so that dot-notation
//!   imports work as expected.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner Rust modules; this file performs
//!   only FFI glue, input conversion, and error mapping.
//! - Every call receives its full configuration; no state is shared between
//!   model instances.
//!
//! Conventions
//! -----------
//! - Trials cross the boundary as wide rows (`participantid`, `trial`,
//!   `choice`, `avail{N}`, `robot{N}{attribute}`), either as a list of dicts
//!   or a pandas DataFrame.
//! - Errors from core Rust code are propagated as rich error types internally
//!   and converted to `PyValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code should depend on [`choice`] directly (see
//!   `choice::prelude`) and can ignore the PyO3 items guarded by the
//!   `python-bindings` feature.

pub mod choice;
pub mod inference;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    choice::{
        core::{data::trials_from_wide_rows, params::FixedParameterSet},
        errors::DftError,
        models::{DftModel, EstimationResult, FitStatus, RestartOutcome, StandardErrors},
    },
    utils::{
        extract_config, extract_initial, extract_mle_opts, extract_options, extract_wide_rows,
    },
};

/// DFT — Python-facing wrapper around [`DftModel`].
///
/// Purpose
/// -------
/// Build a DFT choice model from keyword arguments, fit it to wide-format
/// trials, and expose the fitted parameters, likelihood, status and
/// standard errors.
///
/// Parameters
/// ----------
/// Constructed from Python via `DFT(attributes=None, n_alternatives=3, ...)`:
/// - `attributes`: attribute names; defaults to the five study attributes.
/// - `strategy`: `"gaussian"` (default) or `"montecarlo"`; `replicates`
///   overrides the Monte Carlo draw count.
/// - `fixed`: parameter names held at their starting values during `fit`.
/// - `no_floor=True` disables the probability floor.
/// - Optimizer keywords (`tol_grad`, `tol_cost`, `max_iter`,
///   `line_searcher`, `lbfgs_mem`, `search`, `timeout_secs`) and restart
///   keywords (`restarts`, `perturbation`, `seed`).
///
/// Notes
/// -----
/// - Native Rust callers should use [`DftModel`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "dft_choice.models")]
pub struct DFT {
    /// Underlying Rust model.
    pub inner: DftModel,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl DFT {
    #[new]
    #[pyo3(
        signature = (
            attributes = None,
            n_alternatives = None,
            panel_data = None,
            strategy = None,
            replicates = None,
            prob_floor = None,
            no_floor = false,
            seed = None,
            restarts = None,
            perturbation = None,
            search = None,
            fixed = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            timeout_secs = None,
            standard_errors = None,
        ),
        text_signature = "(attributes=None, n_alternatives=3, panel_data=True, \
                          strategy='gaussian', replicates=None, prob_floor=1e-9, \
                          no_floor=False, seed=42, restarts=1, perturbation=0.5, \
                          search=None, fixed=None, tol_grad=None, tol_cost=None, \
                          max_iter=None, line_searcher='morethuente', lbfgs_mem=None, \
                          timeout_secs=None, standard_errors=True)"
    )]
    pub fn new(
        attributes: Option<Vec<String>>, n_alternatives: Option<usize>, panel_data: Option<bool>,
        strategy: Option<&str>, replicates: Option<usize>, prob_floor: Option<f64>,
        no_floor: bool, seed: Option<u64>, restarts: Option<usize>, perturbation: Option<f64>,
        search: Option<&str>, fixed: Option<Vec<String>>, tol_grad: Option<f64>,
        tol_cost: Option<f64>, max_iter: Option<usize>, line_searcher: Option<&str>,
        lbfgs_mem: Option<usize>, timeout_secs: Option<f64>, standard_errors: Option<bool>,
    ) -> PyResult<Self> {
        let config = extract_config(attributes, n_alternatives, panel_data)?;
        let mle_opts = extract_mle_opts(tol_grad, tol_cost, max_iter, line_searcher, lbfgs_mem)?;
        let options = extract_options(
            strategy,
            replicates,
            prob_floor,
            no_floor,
            seed,
            restarts,
            perturbation,
            search,
            mle_opts,
            timeout_secs,
            standard_errors,
        )?;
        let fixed = match fixed {
            Some(names) => FixedParameterSet::from_names(&config, &names)?,
            None => FixedParameterSet::new(),
        };
        Ok(DFT { inner: DftModel::new(config, options).with_fixed(fixed) })
    }

    #[pyo3(signature = (rows, initial = None), text_signature = "(self, rows, /, initial=None)")]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, rows: &Bound<'py, PyAny>, initial: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<()> {
        let wide = extract_wide_rows(rows)?;
        let trials = trials_from_wide_rows(&wide, &self.inner.config)?;
        let initial = extract_initial(py, &self.inner.config, initial)?;
        let model = &mut self.inner;
        py.allow_threads(|| model.fit(&trials, &initial).map(|_| ()))?;
        Ok(())
    }

    /// Choice probabilities (one list per row) under the fitted parameters.
    #[pyo3(text_signature = "(self, rows, /)")]
    pub fn predict<'py>(&self, rows: &Bound<'py, PyAny>) -> PyResult<Vec<Vec<f64>>> {
        let wide = extract_wide_rows(rows)?;
        let trials = trials_from_wide_rows(&wide, &self.inner.config)?;
        let probs = trials.iter().map(|t| self.inner.predict(t)).collect::<Result<Vec<_>, _>>()?;
        Ok(probs)
    }

    #[getter]
    pub fn results(&self) -> PyResult<DFTFitResult> {
        Ok(DFTFitResult { inner: self.fitted()?.clone() })
    }

    /// Fitted `(name, value)` pairs in canonical order.
    #[getter]
    pub fn params(&self) -> PyResult<Vec<(String, f64)>> {
        Ok(self.fitted()?.to_named())
    }

    #[getter]
    pub fn log_likelihood(&self) -> PyResult<f64> {
        Ok(self.fitted()?.log_likelihood)
    }

    #[getter]
    pub fn status(&self) -> PyResult<String> {
        Ok(status_name(self.fitted()?.status))
    }

    /// `(name, se)` pairs of the free parameters, or `None` when standard
    /// errors could not be computed.
    #[getter]
    pub fn standard_errors(&self) -> PyResult<Option<Vec<(String, f64)>>> {
        match &self.fitted()?.standard_errors {
            StandardErrors::Available { names, values, .. } => {
                Ok(Some(names.iter().cloned().zip(values.iter().copied()).collect()))
            }
            StandardErrors::Unavailable(_) => Ok(None),
        }
    }

    /// Covariance of the free parameters (row-major, `θ` order).
    pub fn covariance_matrix(&self) -> PyResult<Vec<Vec<f64>>> {
        match &self.fitted()?.standard_errors {
            StandardErrors::Available { covariance, .. } => Ok(covariance.clone()),
            StandardErrors::Unavailable(reason) => Err(PyValueError::new_err(format!(
                "standard errors unavailable: {reason:?}"
            ))),
        }
    }
}

#[cfg(feature = "python-bindings")]
impl DFT {
    fn fitted(&self) -> PyResult<&EstimationResult> {
        self.inner.results.as_ref().ok_or_else(|| DftError::ModelNotFitted.into())
    }
}

#[cfg(feature = "python-bindings")]
fn status_name(status: FitStatus) -> String {
    match status {
        FitStatus::Converged => "converged".to_string(),
        FitStatus::NonConvergence => "non_convergence".to_string(),
    }
}

/// DFTFitResult — estimation summary exposed to Python.
///
/// Notes
/// -----
/// - Part of the Python FFI surface; Rust code should use
///   [`EstimationResult`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "dft_choice.models")]
pub struct DFTFitResult {
    pub inner: EstimationResult,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl DFTFitResult {
    #[getter]
    pub fn log_likelihood(&self) -> f64 {
        self.inner.log_likelihood
    }

    #[getter]
    pub fn average_log_likelihood(&self) -> f64 {
        self.inner.average_log_likelihood()
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged()
    }

    #[getter]
    pub fn status(&self) -> String {
        status_name(self.inner.status)
    }

    #[getter]
    pub fn termination(&self) -> String {
        self.inner.termination.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn fn_evals(&self) -> Vec<(String, u64)> {
        self.inner.fn_evals.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[getter]
    pub fn n_trials(&self) -> usize {
        self.inner.n_trials
    }

    #[getter]
    pub fn free(&self) -> Vec<String> {
        self.inner.free.clone()
    }

    #[getter]
    pub fn best_restart(&self) -> usize {
        self.inner.best_restart
    }

    /// `(index, outcome, log_likelihood)` per restart; the likelihood is
    /// `None` for failed or skipped restarts.
    #[getter]
    pub fn restarts(&self) -> Vec<(usize, String, Option<f64>)> {
        self.inner
            .restarts
            .iter()
            .map(|r| match &r.outcome {
                RestartOutcome::Finished { log_likelihood, termination, .. } => {
                    (r.index, termination.clone(), Some(*log_likelihood))
                }
                RestartOutcome::Failed { reason } => (r.index, format!("failed: {reason}"), None),
                RestartOutcome::Skipped => (r.index, "skipped".to_string(), None),
            })
            .collect()
    }

    /// Trials whose chosen probability hit the floor.
    #[getter]
    pub fn floored(&self) -> usize {
        self.inner.diagnostics.floored
    }

    /// Trials with equal probabilities across available alternatives.
    #[getter]
    pub fn symmetric(&self) -> usize {
        self.inner.diagnostics.symmetric
    }
}

/// _dft_choice — PyO3 module initializer for the Python extension.
///
/// Purpose
/// -------
/// Define the `_dft_choice` Python module and register the `models`
/// submodule used by the public `dft_choice` package.
///
/// Errors
/// ------
/// - `PyErr`
///   If creating the submodule or manipulating `sys.modules` fails.
///
/// Notes
/// -----
/// - Invoked by Python when importing the compiled extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _dft_choice<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let models_mod = PyModule::new(_py, "models")?;
    models(_py, m, &models_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    _py.import("sys")?.getattr("modules")?.set_item("dft_choice.models", models_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn models<'py>(
    _py: Python, dft_choice: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<DFT>()?;
    m.add_class::<DFTFitResult>()?;
    dft_choice.add_submodule(m)?;
    Ok(())
}
