//! Fixed-point iteration with convergence diagnosis and Aitken Δ² acceleration.
//!
//! Given a scalar function `g` and a starting point `x0`, this crate iterates
//! `x_{n+1} = g(x_n)` and records every step, stopping when the error drops
//! below a tolerance, when the iterates blow up, when the iteration budget is
//! spent, or when `g` cannot be evaluated. It offers tools to
//!
//! - build `g` from text over a small allow-list of functions (`expression` module),
//! - configure and validate a run (`options` module),
//! - run the iteration and inspect its trace (`iteration` module),
//! - extrapolate iterates with Aitken's Δ² method (`acceleration` module), and
//! - estimate `g'(x0)` to anticipate divergence (`diagnostics` module).
//!
//! # Quick start
//!
//! ```
//! use fixpoint::{build_function, run_fixed_point_iteration, Configuration, StoppingCriterion};
//!
//! let g = build_function("cos(x)").expect("valid expression");
//! let config = Configuration::builder()
//!     .initial_guess(0.5)
//!     .tolerance(1e-6)
//!     .max_iterations(100)
//!     .stopping_criterion(StoppingCriterion::Residual)
//!     .build()
//!     .expect("valid configuration");
//!
//! let outcome = run_fixed_point_iteration(&g, &config);
//! assert!(outcome.converged);
//! println!("{}: x = {:?}", outcome.message, outcome.final_value());
//! ```
//!
//! Any `Fn(f64) -> f64` closure can stand in for a parsed expression.

pub mod acceleration;
pub mod diagnostics;
pub mod error;
pub mod expression;
pub mod iteration;
pub mod options;
mod parser;

pub use acceleration::aitken_delta_squared;
pub use diagnostics::{estimate_contraction, ContractionEstimate};
pub use error::{FixedPointError, Result};
pub use expression::{AngleUnit, Expression, ScalarFunction};
pub use iteration::{
    run_fixed_point_iteration, sweep_initial_guesses, IterationRecord, IterationTrace,
    RunOutcome, TerminationReason,
};
pub use options::{Configuration, ConfigurationBuilder, ErrorMeasure, StoppingCriterion};
pub use parser::{MAX_EXPRESSION_LEN, MAX_NESTING_DEPTH};

/// Builds `g` from expression text in the variable `x`, with trigonometric
/// functions in radians.
///
/// Fails with [`FixedPointError::Syntax`] for malformed text and
/// [`FixedPointError::UndefinedSymbol`] for names outside the allow-list.
pub fn build_function(text: &str) -> Result<Expression> {
    Expression::parse(text)
}

/// Like [`build_function`], with trigonometric functions in `angle_unit`.
pub fn build_function_with_unit(text: &str, angle_unit: AngleUnit) -> Result<Expression> {
    Expression::parse_with_unit(text, angle_unit)
}
