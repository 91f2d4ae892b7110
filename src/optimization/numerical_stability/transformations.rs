//! Numerically stable scalar transforms and box reparameterization.
//!
//! The optimizer works on an unconstrained vector; bounded model parameters
//! are reached through these maps:
//!
//! | bounds        | natural value `x`            | inverse                   |
//! |---------------|------------------------------|---------------------------|
//! | `[lo, hi]`    | `lo + (hi − lo)·σ(t)`        | `logit((x − lo)/(hi − lo))` |
//! | `[lo, ∞)`     | `lo + softplus(t)`           | `softplus⁻¹(x − lo)`      |
//! | `(−∞, hi]`    | `hi − softplus(t)`           | `softplus⁻¹(hi − x)`      |
//! | none          | `t`                          | `x`                       |
//!
//! A starting value sitting exactly on a bound has no finite preimage, so
//! [`to_unconstrained`] first moves it [`BOUND_NUDGE`] inside the box.

/// Distance a starting value is moved inside its bounds before inversion.
pub const BOUND_NUDGE: f64 = 1e-4;

/// Clamp used by [`logit`] to keep its argument off `{0, 1}`.
pub const LOGIT_EPS: f64 = 1e-12;

/// Smallest eigenvalue accepted as positive when testing definiteness.
pub const EIGEN_EPS: f64 = 1e-10;

/// `ln(1 + eˣ)` without overflow for large `x`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Inverse of [`safe_softplus`] on `(0, ∞)`: `ln(eˣ − 1)`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Logistic `1 / (1 + e⁻ˣ)`, evaluated on the side that cannot overflow.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse logistic, with `p` clamped to `[LOGIT_EPS, 1 − LOGIT_EPS]`.
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    (p / (1.0 - p)).ln()
}

/// Map an unconstrained `t` to the box `[lo, hi]` (either side optional).
pub fn from_unconstrained(t: f64, lower: Option<f64>, upper: Option<f64>) -> f64 {
    match (lower, upper) {
        (Some(lo), Some(hi)) => lo + (hi - lo) * safe_logistic(t),
        (Some(lo), None) => lo + safe_softplus(t),
        (None, Some(hi)) => hi - safe_softplus(t),
        (None, None) => t,
    }
}

/// Preimage of `x` under [`from_unconstrained`].
///
/// Values on or outside a bound are first moved [`BOUND_NUDGE`] inside it
/// (or to the midpoint when the box is narrower than two nudges). A box
/// with no width maps to `0`.
pub fn to_unconstrained(x: f64, lower: Option<f64>, upper: Option<f64>) -> f64 {
    match (lower, upper) {
        (Some(lo), Some(hi)) if hi <= lo => 0.0,
        (Some(lo), Some(hi)) => {
            let width = hi - lo;
            let nudge = BOUND_NUDGE.min(0.5 * width);
            let inside = x.clamp(lo + nudge, hi - nudge);
            logit((inside - lo) / width)
        }
        (Some(lo), None) => safe_softplus_inv((x - lo).max(BOUND_NUDGE)),
        (None, Some(hi)) => safe_softplus_inv((hi - x).max(BOUND_NUDGE)),
        (None, None) => x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of the guarded transforms with naïve formulas.
    // - Range and inversion of the box maps, including on-bound starts.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Guarded softplus/logistic match the textbook formulas where those are
    // safe, and stay finite in the tails.
    //
    // Given
    // -----
    // - A grid on [-10, 10] plus ±800.
    //
    // Expect
    // ------
    // - Agreement within 1e-12 on the grid; finite tails.
    fn scalar_transforms_match_naive_formulas() {
        // Arrange
        let grid: Vec<f64> = (-20..=20).map(|k| k as f64 * 0.5).collect();

        // Act / Assert
        for &x in &grid {
            assert!((safe_softplus(x) - (1.0 + x.exp()).ln()).abs() < 1e-12);
            assert!((safe_logistic(x) - 1.0 / (1.0 + (-x).exp())).abs() < 1e-12);
            assert!((logit(safe_logistic(x)) - x).abs() < 1e-8);
        }
        assert!(safe_logistic(-800.0) >= 0.0 && safe_logistic(800.0) <= 1.0);
        assert!(safe_softplus(800.0).is_finite());
    }

    #[test]
    // Purpose
    // -------
    // Each bound combination round-trips interior values and maps every
    // real into the box.
    //
    // Given
    // -----
    // - Interior points for `[0, 1]`, `[0.1, ∞)`, `(−∞, 5]`, and no bounds.
    //
    // Expect
    // ------
    // - `from(to(x)) ≈ x`; images of ±30 remain inside the bounds.
    fn box_maps_round_trip_and_respect_bounds() {
        // Arrange
        let cases = [
            (0.3, Some(0.0), Some(1.0)),
            (2.0, Some(0.1), None),
            (-1.0, None, Some(5.0)),
            (-7.5, None, None),
        ];

        for (x, lo, hi) in cases {
            // Act
            let t = to_unconstrained(x, lo, hi);
            let back = from_unconstrained(t, lo, hi);

            // Assert
            assert!((back - x).abs() < 1e-9, "x={x} lo={lo:?} hi={hi:?} back={back}");
            for edge in [-30.0, 30.0] {
                let y = from_unconstrained(edge, lo, hi);
                assert!(lo.map_or(true, |l| y >= l) && hi.map_or(true, |h| y <= h));
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Starting values on a bound get a finite preimage just inside it.
    //
    // Given
    // -----
    // - `x = 1` with bounds `[0, 1]`; `x = 0.1` with lower bound 0.1.
    //
    // Expect
    // ------
    // - Finite preimages mapping back to within `BOUND_NUDGE` of the bound.
    fn on_bound_starts_are_nudged_inside() {
        // Act
        let t_hi = to_unconstrained(1.0, Some(0.0), Some(1.0));
        let t_lo = to_unconstrained(0.1, Some(0.1), None);

        // Assert
        assert!(t_hi.is_finite() && t_lo.is_finite());
        let x_hi = from_unconstrained(t_hi, Some(0.0), Some(1.0));
        let x_lo = from_unconstrained(t_lo, Some(0.1), None);
        assert!(x_hi < 1.0 && (1.0 - x_hi - BOUND_NUDGE).abs() < 1e-9);
        assert!(x_lo > 0.1 && (x_lo - 0.1 - BOUND_NUDGE).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // A zero-width box has a finite preimage and maps back onto its point.
    //
    // Given
    // -----
    // - Bounds `[1, 1]` and starting values 1 and 0.4.
    //
    // Expect
    // ------
    // - Preimage 0 for both; `from_unconstrained` returns exactly 1.
    fn zero_width_box_maps_to_its_point() {
        // Act
        let t_on = to_unconstrained(1.0, Some(1.0), Some(1.0));
        let t_off = to_unconstrained(0.4, Some(1.0), Some(1.0));

        // Assert
        assert_eq!(t_on, 0.0);
        assert_eq!(t_off, 0.0);
        assert_eq!(from_unconstrained(t_on, Some(1.0), Some(1.0)), 1.0);
    }
}
