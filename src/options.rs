//! Run configuration for the fixed-point iteration and its validating builder.

use serde::{Deserialize, Serialize};

use crate::error::{FixedPointError, Result};

/// How the per-step error is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppingCriterion {
    /// Change between successive iterates, `|x_n - x_{n-1}|`.
    #[default]
    Delta,
    /// Distance from satisfying the fixed-point equation, `|g(x_n) - x_n|`.
    Residual,
}

/// Whether the error is reported as is or relative to the current iterate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMeasure {
    #[default]
    Absolute,
    /// Divides the error by `|x_n|` unless the iterate is within
    /// [`RELATIVE_ERROR_FLOOR`] of zero, where the absolute error is kept.
    Relative,
}

/// Iterates smaller than this in magnitude fall back to the absolute error.
pub const RELATIVE_ERROR_FLOOR: f64 = 1e-10;

impl ErrorMeasure {
    pub(crate) fn scale(self, error: f64, iterate: f64) -> f64 {
        match self {
            ErrorMeasure::Relative if iterate.abs() > RELATIVE_ERROR_FLOOR => {
                error / iterate.abs()
            }
            _ => error,
        }
    }
}

/// Validated parameters of one fixed-point run.
///
/// Construct with [`Configuration::builder`] or take the [`Default`]; an
/// invalid configuration cannot be represented.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigurationBuilder", into = "ConfigurationBuilder")]
pub struct Configuration {
    initial_guess: f64,
    tolerance: f64,
    max_iterations: usize,
    stopping_criterion: StoppingCriterion,
    error_measure: ErrorMeasure,
    use_aitken: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            initial_guess: 0.5,
            tolerance: 1e-6,
            max_iterations: 100,
            stopping_criterion: StoppingCriterion::Delta,
            error_measure: ErrorMeasure::Absolute,
            use_aitken: false,
        }
    }
}

impl Configuration {
    /// Starts a builder seeded with the defaults.
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Starting point `x0`.
    pub fn initial_guess(&self) -> f64 {
        self.initial_guess
    }

    /// Convergence threshold; a step converges when its error is strictly below it.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Number of steps allowed after step 0.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn stopping_criterion(&self) -> StoppingCriterion {
        self.stopping_criterion
    }

    pub fn error_measure(&self) -> ErrorMeasure {
        self.error_measure
    }

    /// Whether Aitken Δ² estimates are attached to the trace.
    pub fn use_aitken(&self) -> bool {
        self.use_aitken
    }

    /// Returns a copy of this configuration starting from `initial_guess`.
    pub fn with_initial_guess(&self, initial_guess: f64) -> Result<Self> {
        validate_initial_guess(initial_guess)?;
        Ok(Self {
            initial_guess,
            ..self.clone()
        })
    }
}

fn validate_initial_guess(initial_guess: f64) -> Result<()> {
    if !initial_guess.is_finite() {
        return Err(FixedPointError::invalid("initial guess", "must be finite"));
    }
    Ok(())
}

/// Builder that validates parameters before constructing a [`Configuration`].
///
/// Also the serialized form of a configuration: missing fields take their
/// defaults, and deserializing a `Configuration` runs [`build`](Self::build).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationBuilder {
    initial_guess: f64,
    tolerance: f64,
    max_iterations: usize,
    stopping_criterion: StoppingCriterion,
    error_measure: ErrorMeasure,
    use_aitken: bool,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Configuration::default().into()
    }
}

impl ConfigurationBuilder {
    pub fn initial_guess(mut self, initial_guess: f64) -> Self {
        self.initial_guess = initial_guess;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn stopping_criterion(mut self, criterion: StoppingCriterion) -> Self {
        self.stopping_criterion = criterion;
        self
    }

    pub fn error_measure(mut self, measure: ErrorMeasure) -> Self {
        self.error_measure = measure;
        self
    }

    /// Enable or disable Aitken Δ² estimates.
    pub fn use_aitken(mut self, use_aitken: bool) -> Self {
        self.use_aitken = use_aitken;
        self
    }

    /// Finalizes construction after validating every parameter.
    pub fn build(self) -> Result<Configuration> {
        validate_initial_guess(self.initial_guess)?;
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(FixedPointError::invalid(
                "tolerance",
                "must be positive and finite",
            ));
        }
        if self.max_iterations == 0 {
            return Err(FixedPointError::invalid(
                "max iterations",
                "must be at least 1",
            ));
        }

        Ok(Configuration {
            initial_guess: self.initial_guess,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            stopping_criterion: self.stopping_criterion,
            error_measure: self.error_measure,
            use_aitken: self.use_aitken,
        })
    }
}

impl From<Configuration> for ConfigurationBuilder {
    fn from(config: Configuration) -> Self {
        Self {
            initial_guess: config.initial_guess,
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            stopping_criterion: config.stopping_criterion,
            error_measure: config.error_measure,
            use_aitken: config.use_aitken,
        }
    }
}

impl TryFrom<ConfigurationBuilder> for Configuration {
    type Error = FixedPointError;

    fn try_from(builder: ConfigurationBuilder) -> Result<Self> {
        builder.build()
    }
}
