//! Conversion helpers for the PyO3 boundary.
//!
//! Everything here turns loosely-typed Python inputs (sequences, dicts,
//! DataFrames, keyword strings) into the validated Rust types the `choice`
//! module works with. Errors become `PyErr` through the `From` impls on
//! [`DftError`](crate::choice::errors::DftError).
#[cfg(feature = "python-bindings")]
use std::{str::FromStr, time::Duration};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyBool, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    choice::{
        core::{
            attributes::Attribute,
            config::ModelConfiguration,
            data::{WideRow, WideValue},
            options::{EstimationOptions, SearchMethod, Strategy},
            params::ParameterVector,
        },
        errors::DftError,
    },
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Model layout from the constructor keywords; attribute names default to
/// the five study attributes.
#[cfg(feature = "python-bindings")]
pub fn extract_config(
    attributes: Option<Vec<String>>, n_alternatives: Option<usize>, panel_data: Option<bool>,
) -> PyResult<ModelConfiguration> {
    let attributes = match attributes {
        Some(names) => names
            .iter()
            .map(|n| Attribute::from_str(n).map_err(DftError::from))
            .collect::<Result<Vec<_>, _>>()?,
        None => Attribute::ALL.to_vec(),
    };
    let config = ModelConfiguration::new(
        attributes,
        n_alternatives.unwrap_or(3),
        panel_data.unwrap_or(true),
    )?;
    Ok(config)
}

/// Run-time options from the constructor keywords. Unset keywords keep
/// the [`EstimationOptions::default`] values.
#[cfg(feature = "python-bindings")]
pub fn extract_options(
    strategy: Option<&str>, replicates: Option<usize>, prob_floor: Option<f64>,
    no_floor: bool, seed: Option<u64>, restarts: Option<usize>, perturbation: Option<f64>,
    search: Option<&str>, mle_opts: MLEOptions, timeout_secs: Option<f64>,
    standard_errors: Option<bool>,
) -> PyResult<EstimationOptions> {
    let defaults = EstimationOptions::default();

    let mut strategy = match strategy {
        Some(name) => Strategy::from_str(name).map_err(DftError::from)?,
        None => defaults.strategy,
    };
    if let (Strategy::MonteCarlo { .. }, Some(r)) = (strategy, replicates) {
        strategy = Strategy::MonteCarlo { replicates: r };
    }

    let search = search.map(|s| SearchMethod::from_str(s).map_err(DftError::from)).transpose()?;

    let timeout = match timeout_secs {
        Some(s) if s.is_finite() && s > 0.0 => Some(Duration::from_secs_f64(s)),
        Some(s) => {
            return Err(PyValueError::new_err(format!(
                "timeout_secs must be positive and finite, got {s}"
            )));
        }
        None => None,
    };

    let floor = if no_floor { None } else { prob_floor.or(defaults.prob_floor) };

    Ok(defaults
        .clone()
        .with_strategy(strategy)
        .with_prob_floor(floor)
        .with_seed(seed.unwrap_or(defaults.seed))
        .with_restarts(
            restarts.unwrap_or(defaults.restarts),
            perturbation.unwrap_or(defaults.perturbation),
        )
        .with_search(search)
        .with_mle_opts(mle_opts)
        .with_timeout(timeout)
        .with_standard_errors(standard_errors.unwrap_or(defaults.standard_errors)))
}

#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    let defaults = EstimationOptions::default().mle_opts;

    // Tolerances::new -> OptResult<Tolerances> -> DftError -> PyErr
    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        tol_cost.or(defaults.tols.tol_cost),
        max_iter.or(defaults.tols.max_iter),
    )
    .map_err(DftError::from)?;

    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(DftError::from)?,
        None => defaults.line_searcher,
    };

    let opts = MLEOptions::new(tols, ls, lbfgs_mem).map_err(DftError::from)?;
    Ok(opts)
}

/// Starting parameters: a `{name: value}` dict over the defaults, or a full
/// vector in canonical order.
#[cfg(feature = "python-bindings")]
pub fn extract_initial<'py>(
    py: Python<'py>, config: &ModelConfiguration, initial: Option<&Bound<'py, PyAny>>,
) -> PyResult<ParameterVector> {
    let Some(initial) = initial else {
        return Ok(ParameterVector::new(config));
    };
    if let Ok(dict) = initial.downcast::<PyDict>() {
        let mut params = ParameterVector::new(config);
        for (key, value) in dict.iter() {
            let name: String = key.extract()?;
            params = params.with(&name, value.extract::<f64>()?)?;
        }
        return Ok(params);
    }
    let arr = extract_f64_array(py, initial)?;
    let values = arr.as_slice().map_err(|_| {
        PyValueError::new_err("initial must be a dict or a 1-D contiguous float64 sequence")
    })?;
    Ok(ParameterVector::from_values(config, values)?)
}

/// Wide rows from a list of dicts or a pandas DataFrame.
#[cfg(feature = "python-bindings")]
pub fn extract_wide_rows<'py>(rows: &Bound<'py, PyAny>) -> PyResult<Vec<WideRow>> {
    let records = match rows.call_method1("to_dict", ("records",)) {
        Ok(records) => records,
        Err(_) => rows.clone(),
    };
    let dicts: Vec<Bound<'py, PyDict>> = records.extract().map_err(|_| {
        PyTypeError::new_err("expected a pandas.DataFrame or a sequence of dicts")
    })?;
    dicts.iter().map(extract_wide_row).collect()
}

/// One wide row from a dict; `None` cells are dropped.
#[cfg(feature = "python-bindings")]
pub fn extract_wide_row(dict: &Bound<'_, PyDict>) -> PyResult<WideRow> {
    let mut row = WideRow::new();
    for (key, value) in dict.iter() {
        let column: String = key.extract()?;
        if value.is_none() {
            continue;
        }
        match column.as_str() {
            "participantid" => {
                let id = match value.extract::<String>() {
                    Ok(s) => s,
                    Err(_) => value.str()?.to_string(),
                };
                row.participantid = Some(id);
            }
            "trial" => row.trial = Some(value.extract()?),
            "choice" => row.choice = Some(value.extract()?),
            _ => {
                let cell = if value.is_instance_of::<PyBool>() {
                    WideValue::Flag(value.extract()?)
                } else if let Ok(v) = value.extract::<f64>() {
                    WideValue::Number(v)
                } else {
                    WideValue::Text(value.str()?.to_string())
                };
                row.columns.insert(column, cell);
            }
        }
    }
    Ok(row)
}
