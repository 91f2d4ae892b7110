//! Moment-matched Gaussian win probabilities.
//!
//! Purpose
//! -------
//! Replace replicate simulation with an exact integral of a Gaussian
//! approximation to the final preference state, giving a likelihood that is
//! smooth in the parameters (suitable for L-BFGS and for standard errors).
//!
//! Key behaviors
//! -------------
//! With evidence `x_ij = w_j·v_ij`, attribute mean `m_i = (1/J)·Σ_j x_ij`,
//! attribute covariance `C_ik = (1/J)·Σ_j x_ij·x_kj − m_i·m_k`, horizon
//! `T_c`, attention correlation `ρ` and noise `σ`, the final preferences are
//! approximated as `P ~ N(μ, Σ)` with
//!
//! - `μ_i = asc_i + T_c·m_i`,
//! - `Σ_ik = g(ρ, T_c)·C_ik + T_c·σ²·δ_ik`,
//!
//! where `g` is [`horizon_gain`]. These are the exact first two moments of
//! the accumulated evidence when the attention chain starts from its
//! stationary (uniform) distribution.
//!
//! Win probabilities over the available alternatives:
//! - one available: it wins with probability 1;
//! - two: `Φ(E[D]/sd(D))` for the difference `D`;
//! - three: the positive orthant of the two differences against the other
//!   alternatives, via [`bvn_upper`].
//!
//! More than three available alternatives is refused.
use crate::choice::{
    accumulator::{
        TrialInputs,
        attention::{AttentionChain, horizon_gain},
        bvn::{bvn_upper, norm_cdf},
    },
    core::{options::Strategy, params::ParameterVector},
    errors::{ConfigError, DftResult},
};
use ndarray::Array2;

/// Mean vector and covariance matrix of the final preferences of the
/// available alternatives (in `inputs.available` order).
pub fn preference_moments(inputs: &TrialInputs, params: &ParameterVector) -> (Vec<f64>, Array2<f64>) {
    let j = inputs.evidence.ncols();
    let jf = j as f64;
    let avail = &inputs.available;
    let n = avail.len();

    let chain = AttentionChain::new(j, params.phi1, params.phi2);
    let tc = params.horizon();
    let gain = horizon_gain(chain.correlation(), tc);
    let noise_var = tc * params.noise_sd().powi(2);

    let means: Vec<f64> =
        avail.iter().map(|&i| inputs.evidence.row(i).sum() / jf).collect();
    let mu = avail.iter().zip(&means).map(|(&i, m)| inputs.start[i] + tc * m).collect();

    let mut sigma = Array2::zeros((n, n));
    for a in 0..n {
        for b in a..n {
            let (ra, rb) = (inputs.evidence.row(avail[a]), inputs.evidence.row(avail[b]));
            let cross = ra.dot(&rb) / jf - means[a] * means[b];
            let mut value = gain * cross;
            if a == b {
                value += noise_var;
            }
            sigma[[a, b]] = value;
            sigma[[b, a]] = value;
        }
    }
    (mu, sigma)
}

/// Win probability of every alternative (0 for unavailable ones). Not
/// floored.
///
/// # Errors
/// [`ConfigError::UnsupportedStrategy`] with more than three available
/// alternatives.
pub fn win_probabilities(inputs: &TrialInputs, params: &ParameterVector) -> DftResult<Vec<f64>> {
    let avail = &inputs.available;
    let mut probs = vec![0.0; inputs.n_alternatives()];
    match avail.len() {
        0 => return Ok(probs),
        1 => {
            probs[avail[0]] = 1.0;
            return Ok(probs);
        }
        2 | 3 => {}
        _ => {
            return Err(ConfigError::UnsupportedStrategy {
                strategy: Strategy::Gaussian.to_string(),
                reason: "the Gaussian accumulator supports at most three alternatives",
            }
            .into());
        }
    }

    let (mu, sigma) = preference_moments(inputs, params);
    let n = avail.len();
    // Moments of P_i − P_k.
    let diff_var = |i: usize, k: usize| sigma[[i, i]] + sigma[[k, k]] - 2.0 * sigma[[i, k]];

    if n == 2 {
        let sd = diff_var(0, 1).max(f64::MIN_POSITIVE).sqrt();
        let p0 = norm_cdf((mu[0] - mu[1]) / sd);
        probs[avail[0]] = p0;
        probs[avail[1]] = 1.0 - p0;
        return Ok(probs);
    }

    for i in 0..n {
        let (k, l) = match i {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let s_k = diff_var(i, k).max(f64::MIN_POSITIVE).sqrt();
        let s_l = diff_var(i, l).max(f64::MIN_POSITIVE).sqrt();
        let cov = sigma[[i, i]] - sigma[[i, l]] - sigma[[i, k]] + sigma[[k, l]];
        let r = (cov / (s_k * s_l)).clamp(-1.0, 1.0);
        let h = -(mu[i] - mu[k]) / s_k;
        let g = -(mu[i] - mu[l]) / s_l;
        probs[avail[i]] = bvn_upper(h, g, r);
    }
    let total: f64 = avail.iter().map(|&i| probs[i]).sum();
    if total > 0.0 {
        for &i in avail {
            probs[i] /= total;
        }
    }
    Ok(probs)
}
