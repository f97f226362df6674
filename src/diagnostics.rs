//! Local convergence diagnostic for the starting point of a run.

use serde::{Deserialize, Serialize};

use crate::expression::ScalarFunction;

/// Step used by the central-difference derivative.
pub const DERIVATIVE_STEP: f64 = 1e-5;

/// Estimate of `g'(x0)`, which governs whether iteration near `x0` contracts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractionEstimate {
    /// Point the derivative was taken at.
    pub at: f64,
    /// Central-difference approximation of `g'(at)`.
    pub derivative: f64,
}

impl ContractionEstimate {
    /// True when `|g'(x0)| > 1`, in which case the iteration may not converge.
    pub fn may_diverge(&self) -> bool {
        self.derivative.abs() > 1.0
    }
}

/// Approximates `g'(x0)` as `(g(x0 + h) - g(x0 - h)) / 2h`.
///
/// Returns `None` when either evaluation fails or the quotient is not finite.
pub fn estimate_contraction<G>(g: &G, x0: f64) -> Option<ContractionEstimate>
where
    G: ScalarFunction + ?Sized,
{
    let forward = g.evaluate(x0 + DERIVATIVE_STEP).ok()?;
    let backward = g.evaluate(x0 - DERIVATIVE_STEP).ok()?;
    let derivative = (forward - backward) / (2.0 * DERIVATIVE_STEP);
    if !derivative.is_finite() {
        return None;
    }

    let estimate = ContractionEstimate { at: x0, derivative };
    if estimate.may_diverge() {
        log::warn!(
            "|g'({x0})| = {:.4} > 1; fixed-point iteration may not converge",
            derivative.abs()
        );
    }
    Some(estimate)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::expression::Expression;

    #[test]
    fn cosine_contracts_near_its_fixed_point() {
        let g = Expression::parse("cos(x)").unwrap();
        let estimate = estimate_contraction(&g, 0.5).unwrap();
        assert_relative_eq!(estimate.derivative, -(0.5_f64.sin()), epsilon = 1e-8);
        assert!(!estimate.may_diverge());
    }

    #[test]
    fn steep_parabola_is_flagged() {
        let g = |x: f64| x * x - 2.0;
        let estimate = estimate_contraction(&g, 3.0).unwrap();
        assert_relative_eq!(estimate.derivative, 6.0, epsilon = 1e-6);
        assert!(estimate.may_diverge());
    }

    #[test]
    fn failed_evaluation_gives_no_estimate() {
        let g = Expression::parse("sqrt(x)").unwrap();
        assert_eq!(estimate_contraction(&g, 0.0), None);
    }
}
