//! The fixed-point iteration engine: the recurrence `x_{n+1} = g(x_n)`, its
//! per-step error, and the classification of how a run ends.

use std::ops::Index;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::acceleration::aitken_delta_squared;
use crate::error::{FixedPointError, Result};
use crate::expression::ScalarFunction;
use crate::options::{Configuration, StoppingCriterion};

/// Iterates larger than this in magnitude mean the run has diverged.
pub const DIVERGENCE_THRESHOLD: f64 = 1e10;

/// One step of a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Step index; 0 is the initial guess.
    pub n: usize,
    /// Current iterate `x_n`.
    pub xn: f64,
    /// `g(x_n)`, the next iterate.
    pub gxn: f64,
    /// Error under the configured criterion. Step 0 always holds the residual.
    pub error: f64,
    /// Aitken Δ² estimate from this iterate and the two before it.
    pub aitken_value: Option<f64>,
}

/// Ordered records of a run, where `trace[i].n == i`.
///
/// Only the engine appends to a trace, and deserialization rejects records
/// that are out of step order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<IterationRecord>", into = "Vec<IterationRecord>")]
pub struct IterationTrace {
    records: Vec<IterationRecord>,
}

impl IterationTrace {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, record: IterationRecord) {
        debug_assert_eq!(record.n, self.records.len());
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IterationRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[IterationRecord] {
        &self.records
    }
}

impl TryFrom<Vec<IterationRecord>> for IterationTrace {
    type Error = FixedPointError;

    fn try_from(records: Vec<IterationRecord>) -> Result<Self> {
        if let Some((index, record)) = records
            .iter()
            .enumerate()
            .find(|(index, record)| record.n != *index)
        {
            return Err(FixedPointError::TraceOutOfOrder {
                index,
                found: record.n,
            });
        }
        Ok(Self { records })
    }
}

impl From<IterationTrace> for Vec<IterationRecord> {
    fn from(trace: IterationTrace) -> Self {
        trace.records
    }
}

impl Index<usize> for IterationTrace {
    type Output = IterationRecord;

    fn index(&self, index: usize) -> &IterationRecord {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a IterationTrace {
    type Item = &'a IterationRecord;
    type IntoIter = std::slice::Iter<'a, IterationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A step's error fell below the tolerance.
    Converged,
    /// An iterate exceeded [`DIVERGENCE_THRESHOLD`] in magnitude.
    Diverged,
    /// The iteration budget ran out.
    Exhausted,
    /// g failed or returned a non-finite value.
    EvaluationError,
}

/// Result of one fixed-point run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Every step produced before the run stopped.
    pub trace: IterationTrace,
    /// True exactly when `termination_reason` is `Converged`.
    pub converged: bool,
    pub termination_reason: TerminationReason,
    /// Human-readable status for display.
    pub message: String,
}

impl RunOutcome {
    fn finish(trace: IterationTrace, reason: TerminationReason, message: String) -> Self {
        log::debug!(
            "fixed-point run stopped after {} records: {message}",
            trace.len()
        );
        Self {
            trace,
            converged: reason == TerminationReason::Converged,
            termination_reason: reason,
            message,
        }
    }

    /// Last iterate, if any step was recorded.
    pub fn final_value(&self) -> Option<f64> {
        self.trace.last().map(|record| record.xn)
    }

    /// Error of the last recorded step.
    pub fn final_error(&self) -> Option<f64> {
        self.trace.last().map(|record| record.error)
    }

    /// Number of recorded steps, including step 0.
    pub fn iterations(&self) -> usize {
        self.trace.len()
    }
}

/// Evaluates `g(x)`, treating a non-finite value as a failure.
fn evaluate_finite<G>(g: &G, x: f64) -> Result<f64>
where
    G: ScalarFunction + ?Sized,
{
    let value = g.evaluate(x)?;
    if !value.is_finite() {
        return Err(FixedPointError::NonFinite { input: x, value });
    }
    Ok(value)
}

fn evaluation_failed(trace: IterationTrace, err: FixedPointError) -> RunOutcome {
    log::warn!("evaluation of g(x) failed: {err}");
    RunOutcome::finish(
        trace,
        TerminationReason::EvaluationError,
        format!("evaluation of g(x) failed: {err}"),
    )
}

/// Runs the fixed-point iteration `x_{n+1} = g(x_n)` from the configured
/// initial guess.
///
/// Step 0 records `g(x0)` and the residual `|g(x0) - x0|`. Each later step
/// advances to the previous g-value, measures its error under the configured
/// criterion, and then stops if the error is below the tolerance (checked
/// first) or the iterate exceeds [`DIVERGENCE_THRESHOLD`]. A failing or
/// non-finite evaluation ends the run with the records produced so far.
pub fn run_fixed_point_iteration<G>(g: &G, config: &Configuration) -> RunOutcome
where
    G: ScalarFunction + ?Sized,
{
    let max_iterations = config.max_iterations();
    let mut trace = IterationTrace::with_capacity(max_iterations.saturating_add(1).min(1_024));

    let mut x = config.initial_guess();
    let mut gx = match evaluate_finite(g, x) {
        Ok(value) => value,
        Err(err) => return evaluation_failed(trace, err),
    };
    trace.push(IterationRecord {
        n: 0,
        xn: x,
        gxn: gx,
        error: (gx - x).abs(),
        aitken_value: None,
    });

    for n in 1..=max_iterations {
        let x_prev = x;
        x = gx;
        gx = match evaluate_finite(g, x) {
            Ok(value) => value,
            Err(err) => return evaluation_failed(trace, err),
        };

        let raw_error = match config.stopping_criterion() {
            StoppingCriterion::Delta => (x - x_prev).abs(),
            StoppingCriterion::Residual => (gx - x).abs(),
        };
        let error = config.error_measure().scale(raw_error, x);

        let aitken_value = if config.use_aitken() && n >= 2 {
            Some(aitken_delta_squared(trace[n - 2].xn, trace[n - 1].xn, x))
        } else {
            None
        };

        log::debug!("step {n}: x = {x:e}, g(x) = {gx:e}, error = {error:e}");
        trace.push(IterationRecord {
            n,
            xn: x,
            gxn: gx,
            error,
            aitken_value,
        });

        if error < config.tolerance() {
            return RunOutcome::finish(
                trace,
                TerminationReason::Converged,
                format!("converged in {n} iterations"),
            );
        }
        if x.abs() > DIVERGENCE_THRESHOLD {
            return RunOutcome::finish(
                trace,
                TerminationReason::Diverged,
                "the method diverges: iterates grow without bound".to_string(),
            );
        }
    }

    RunOutcome::finish(
        trace,
        TerminationReason::Exhausted,
        format!("no convergence within {max_iterations} iterations"),
    )
}

/// Runs one independent iteration per initial guess in parallel, keeping the
/// outcomes in input order. Every guess must be finite.
pub fn sweep_initial_guesses<G>(
    g: &G,
    config: &Configuration,
    initial_guesses: &[f64],
) -> Result<Vec<RunOutcome>>
where
    G: ScalarFunction + Sync + ?Sized,
{
    let configs = initial_guesses
        .iter()
        .map(|&guess| config.with_initial_guess(guess))
        .collect::<Result<Vec<_>>>()?;

    Ok(configs
        .par_iter()
        .map(|config| run_fixed_point_iteration(g, config))
        .collect())
}
