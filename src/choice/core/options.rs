//! Run-time options for probability evaluation and estimation.
//!
//! Purpose
//! -------
//! Collect every knob a fit needs into one value passed explicitly to each
//! call: the accumulator strategy, the probability floor, the global seed,
//! restart settings, the search method and its [`MLEOptions`], and whether
//! standard errors are computed.
//!
//! Key behaviors
//! -------------
//! - [`EstimationOptions::default`] gives a ready-to-use configuration:
//!   Gaussian accumulator, floor `1e-9`, seed 42, one restart with
//!   perturbation scale 0.5, tolerances `tol_grad = 1e-6`,
//!   `tol_cost = 1e-9`, `max_iter = 500`, simplex step 0.5, standard
//!   errors on.
//! - `with_*` methods return modified copies.
//! - When no search method is set, Gaussian fits use L-BFGS and Monte Carlo
//!   fits use Nelder–Mead ([`EstimationOptions::search_method`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Values are checked by `core::validation::validate_options` at the
//!   start of every estimation, not here, so options can be assembled
//!   piecemeal.
//!
//! Conventions
//! -----------
//! - `tol_cost` is applied to the **per-trial average** log-likelihood,
//!   making it a relative criterion across batch sizes. For Nelder–Mead it
//!   is the spread of simplex values at which the search stops.
use crate::{
    choice::errors::ConfigError,
    optimization::loglik_optimizer::{
        DEFAULT_SIMPLEX_STEP, LineSearcher, MLEOptions, Tolerances,
    },
};
use std::{fmt, str::FromStr, time::Duration};

/// Default Monte Carlo replicate count per trial evaluation.
pub const DEFAULT_REPLICATES: usize = 2_000;

/// Default probability floor applied before taking logs.
pub const DEFAULT_PROB_FLOOR: f64 = 1e-9;

/// Default global seed.
pub const DEFAULT_SEED: u64 = 42;

/// Default restart perturbation scale (unconstrained units).
pub const DEFAULT_PERTURBATION: f64 = 0.5;

/// How win probabilities of the accumulation process are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Empirical win frequencies over simulated paths.
    MonteCarlo { replicates: usize },
    /// Moment-matched multivariate normal for the final preferences.
    /// Supports up to three available alternatives.
    Gaussian,
}

impl Strategy {
    /// Monte Carlo with [`DEFAULT_REPLICATES`].
    pub fn monte_carlo() -> Strategy {
        Strategy::MonteCarlo { replicates: DEFAULT_REPLICATES }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::MonteCarlo { replicates } => write!(f, "MonteCarlo({replicates})"),
            Strategy::Gaussian => write!(f, "Gaussian"),
        }
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    /// `"gaussian"` or `"montecarlo"` (also `"monte_carlo"`, `"mc"`),
    /// case-insensitive; Monte Carlo gets [`DEFAULT_REPLICATES`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "gaussian" => Ok(Strategy::Gaussian),
            "montecarlo" | "mc" => Ok(Strategy::monte_carlo()),
            _ => Err(ConfigError::UnknownStrategy { name: s.to_string() }),
        }
    }
}

/// Optimizer family used for each restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMethod {
    /// L-BFGS with the line search from [`MLEOptions::line_searcher`].
    Lbfgs,
    /// Derivative-free simplex search.
    NelderMead,
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMethod::Lbfgs => write!(f, "LBFGS"),
            SearchMethod::NelderMead => write!(f, "NelderMead"),
        }
    }
}

impl FromStr for SearchMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "lbfgs" => Ok(SearchMethod::Lbfgs),
            "neldermead" | "simplex" => Ok(SearchMethod::NelderMead),
            _ => Err(ConfigError::UnknownSearchMethod { name: s.to_string() }),
        }
    }
}

/// Complete run-time configuration for evaluation and estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationOptions {
    pub strategy: Strategy,
    /// Floor applied to chosen-alternative probabilities before the log;
    /// `None` disables it (ℓ may then be `−∞`).
    pub prob_floor: Option<f64>,
    pub seed: u64,
    pub restarts: usize,
    /// Standard deviation of the restart perturbation, unconstrained units.
    pub perturbation: f64,
    /// Explicit search method; `None` picks by strategy.
    pub search: Option<SearchMethod>,
    pub mle_opts: MLEOptions,
    /// Initial simplex edge for Nelder–Mead, unconstrained units.
    pub simplex_step: f64,
    pub standard_errors: bool,
}

impl EstimationOptions {
    /// Search method actually used.
    pub fn search_method(&self) -> SearchMethod {
        self.search.unwrap_or(match self.strategy {
            Strategy::Gaussian => SearchMethod::Lbfgs,
            Strategy::MonteCarlo { .. } => SearchMethod::NelderMead,
        })
    }

    /// Floor used when evaluating probabilities: the configured floor, or
    /// the smallest positive normal `f64` when the floor is disabled.
    pub fn eval_floor(&self) -> f64 {
        self.prob_floor.unwrap_or(f64::MIN_POSITIVE)
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_prob_floor(mut self, prob_floor: Option<f64>) -> Self {
        self.prob_floor = prob_floor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_restarts(mut self, restarts: usize, perturbation: f64) -> Self {
        self.restarts = restarts;
        self.perturbation = perturbation;
        self
    }

    pub fn with_search(mut self, search: Option<SearchMethod>) -> Self {
        self.search = search;
        self
    }

    pub fn with_mle_opts(mut self, mle_opts: MLEOptions) -> Self {
        self.mle_opts = mle_opts;
        self
    }

    pub fn with_simplex_step(mut self, step: f64) -> Self {
        self.simplex_step = step;
        self
    }

    pub fn with_standard_errors(mut self, standard_errors: bool) -> Self {
        self.standard_errors = standard_errors;
        self
    }

    /// Wall-clock budget for the whole estimation (all restarts).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.mle_opts.timeout = timeout;
        self
    }
}

impl Default for EstimationOptions {
    fn default() -> Self {
        let tols = Tolerances { tol_grad: Some(1e-6), tol_cost: Some(1e-9), max_iter: Some(500) };
        EstimationOptions {
            strategy: Strategy::Gaussian,
            prob_floor: Some(DEFAULT_PROB_FLOOR),
            seed: DEFAULT_SEED,
            restarts: 1,
            perturbation: DEFAULT_PERTURBATION,
            search: None,
            mle_opts: MLEOptions {
                tols,
                line_searcher: LineSearcher::MoreThuente,
                verbose: false,
                lbfgs_mem: None,
                timeout: None,
            },
            simplex_step: DEFAULT_SIMPLEX_STEP,
            standard_errors: true,
        }
    }
}
