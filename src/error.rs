use thiserror::Error;

/// Unified error type for `fixpoint` operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FixedPointError {
    /// Raised when expression text is not a well-formed expression.
    #[error("syntax error at offset {position}: {message}")]
    Syntax {
        /// Byte offset into the expression text where parsing failed.
        position: usize,
        /// Human-readable description of what was expected.
        message: String,
    },

    /// Raised when an expression references a name outside the allow-list.
    #[error("undefined symbol `{name}`")]
    UndefinedSymbol { name: String },

    /// Raised when a function or operator is applied outside its domain.
    #[error("math domain error in {operation} for argument {argument}")]
    Domain {
        /// Operator or function name, e.g. `sqrt` or `division`.
        operation: &'static str,
        /// The offending input value.
        argument: f64,
    },

    /// Raised when g(x) evaluates to NaN or infinity.
    #[error("g({input}) produced a non-finite value ({value})")]
    NonFinite { input: f64, value: f64 },

    /// Raised when a deserialized trace is not numbered in step order.
    #[error("trace record at position {index} has step index {found}")]
    TraceOutOfOrder { index: usize, found: usize },

    /// Raised when a configuration parameter is out of range.
    #[error("invalid configuration: {parameter} {reason}")]
    InvalidConfiguration {
        parameter: &'static str,
        reason: &'static str,
    },
}

impl FixedPointError {
    /// Helper to build a [`Syntax`](FixedPointError::Syntax) error.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Helper for out-of-domain evaluations.
    pub fn domain(operation: &'static str, argument: f64) -> Self {
        Self::Domain {
            operation,
            argument,
        }
    }

    /// Helper for rejected configuration parameters.
    pub fn invalid(parameter: &'static str, reason: &'static str) -> Self {
        Self::InvalidConfiguration { parameter, reason }
    }

    /// True for failures that come from evaluating g rather than from building it
    /// or configuring a run.
    pub fn is_evaluation_failure(&self) -> bool {
        matches!(self, Self::Domain { .. } | Self::NonFinite { .. })
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, FixedPointError>;
