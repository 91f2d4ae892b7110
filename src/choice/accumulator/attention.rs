//! Attention-switching chain over the attribute set.
//!
//! Purpose
//! -------
//! Decide which attribute is attended at each deliberation step. The first
//! step attends uniformly at random. Afterwards, with
//! `phi1 = p₁`, `phi2 = p₂` and `J` attributes:
//!
//! 1. with probability `p₁` attention stays where it is;
//! 2. otherwise, with probability `p₂` it switches uniformly to one of the
//!    `J − 1` *other* attributes;
//! 3. otherwise it is resampled uniformly from all `J` attributes.
//!
//! Key behaviors
//! -------------
//! - The transition matrix is `ρ·I + (1 − ρ)·U` with `U = 11ᵀ/J` and
//!   `ρ = p₁ − (1 − p₁)·p₂/(J − 1)` ([`AttentionChain::correlation`]), so the
//!   uniform start is stationary and
//!   `P(A_{t+d} = a | A_t = a′) = ρ^d·δ + (1 − ρ^d)/J`.
//! - [`AttentionChain::step`] consumes exactly three uniforms per call, so
//!   a path uses a fixed number of draws whatever the parameters are.
//!
//! Conventions
//! -----------
//! - `J = 1` is degenerate: attention never moves and `ρ = 1`.
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttentionChain {
    n_attributes: usize,
    stay: f64,
    switch: f64,
}

impl AttentionChain {
    /// Chain over `n_attributes` attributes; `stay`/`switch` are clamped to
    /// `[0, 1]`.
    pub fn new(n_attributes: usize, stay: f64, switch: f64) -> AttentionChain {
        AttentionChain {
            n_attributes: n_attributes.max(1),
            stay: stay.clamp(0.0, 1.0),
            switch: switch.clamp(0.0, 1.0),
        }
    }

    pub fn n_attributes(&self) -> usize {
        self.n_attributes
    }

    /// Lag-one autocorrelation `ρ` of attention indicators.
    pub fn correlation(&self) -> f64 {
        if self.n_attributes == 1 {
            return 1.0;
        }
        self.stay - (1.0 - self.stay) * self.switch / (self.n_attributes - 1) as f64
    }

    /// Uniform first attribute.
    pub fn start<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        uniform_index(rng.r#gen::<f64>(), self.n_attributes)
    }

    /// Next attended attribute after `current`.
    pub fn step<R: Rng + ?Sized>(&self, current: usize, rng: &mut R) -> usize {
        let (u_stay, u_switch, u_pick) = (rng.r#gen::<f64>(), rng.r#gen::<f64>(), rng.r#gen::<f64>());
        let j = self.n_attributes;
        if j == 1 || u_stay < self.stay {
            current
        } else if u_switch < self.switch {
            let other = uniform_index(u_pick, j - 1);
            if other >= current { other + 1 } else { other }
        } else {
            uniform_index(u_pick, j)
        }
    }
}

/// Sum `Σ_{t,s=1..T} ρ^{|t−s|}` of attention correlations over a horizon of
/// `t` steps, linearly interpolated between `⌊t⌋` and `⌊t⌋ + 1` for
/// non-integer horizons.
pub fn horizon_gain(rho: f64, t: f64) -> f64 {
    let lo = t.floor().max(1.0);
    let frac = (t - lo).clamp(0.0, 1.0);
    let g_lo = integer_gain(rho, lo as usize);
    if frac == 0.0 {
        return g_lo;
    }
    let g_hi = integer_gain(rho, lo as usize + 1);
    g_lo + frac * (g_hi - g_lo)
}

fn integer_gain(rho: f64, n: usize) -> f64 {
    // T + 2·Σ_{d=1}^{T−1} (T − d)·ρ^d
    let mut total = n as f64;
    let mut power = 1.0;
    for d in 1..n {
        power *= rho;
        total += 2.0 * (n - d) as f64 * power;
    }
    total
}

fn uniform_index(u: f64, n: usize) -> usize {
    ((u * n as f64) as usize).min(n - 1)
}
