//! Aitken Δ² extrapolation of linearly convergent sequences.

/// Second differences smaller than this are treated as zero.
pub const AITKEN_DENOMINATOR_FLOOR: f64 = 1e-10;

/// Estimates the limit of a sequence from three consecutive terms
/// `x0, x1, x2` with Aitken's Δ² formula
///
/// ```text
/// x̂ = x0 - (x1 - x0)² / (x2 - 2·x1 + x0)
/// ```
///
/// When the second difference is below [`AITKEN_DENOMINATOR_FLOOR`] in
/// magnitude the extrapolation is unstable and `x2` is returned unchanged.
/// NaN inputs propagate; the function never fails.
pub fn aitken_delta_squared(x0: f64, x1: f64, x2: f64) -> f64 {
    let denominator = x2 - 2.0 * x1 + x0;
    if denominator.abs() < AITKEN_DENOMINATOR_FLOOR {
        return x2;
    }
    let delta = x1 - x0;
    x0 - delta * delta / denominator
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn geometric_sequence_is_extrapolated_to_its_limit() {
        // x_n = 2 + 0.5^n has limit 2 and Aitken recovers it exactly.
        let value = aitken_delta_squared(3.0, 2.5, 2.25);
        assert_relative_eq!(value, 2.0, epsilon = 1e-15);
    }

    #[test]
    fn flat_second_difference_returns_latest_term() {
        // Arithmetic progression: second difference is exactly zero.
        assert_eq!(aitken_delta_squared(1.0, 2.0, 3.0), 3.0);
        assert_eq!(aitken_delta_squared(1.0, 1.0 + 1e-12, 1.0 + 2.5e-12), 1.0 + 2.5e-12);
    }

    #[test]
    fn nan_propagates() {
        assert!(aitken_delta_squared(f64::NAN, 1.0, 2.0).is_nan());
    }
}
