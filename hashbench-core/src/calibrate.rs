//! Calibrator
//!
//! Finds the smallest batch size whose elapsed time clears the minimum batch
//! duration, growing geometrically from a single invocation. The qualifying
//! batch is returned as the first sample so no measurement is wasted.

use crate::cancel::CancellationToken;
use crate::candidate::Candidate;
use crate::error::MeasureError;
use crate::measure::Clock;
use crate::runner::{Batch, SampleRunner};

/// Outcome of a successful calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Iterations per batch for the rest of the measurement
    pub iterations: u64,
    /// The batch that met the threshold
    pub first_batch: Batch,
}

/// Wall-time limit of a calibration, as an absolute clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deadline {
    at_ns: u64,
    budget_ns: u64,
}

/// Batch-size search with a hard iteration ceiling
#[derive(Debug, Clone)]
pub struct Calibrator {
    min_batch_duration_ns: u64,
    growth_factor: u64,
    max_iterations: u64,
    cancellation: Option<CancellationToken>,
    deadline: Option<Deadline>,
}

impl Calibrator {
    /// Create a calibrator. `growth_factor` is raised to at least 2.
    pub fn new(min_batch_duration_ns: u64, growth_factor: u64, max_iterations: u64) -> Self {
        Self {
            min_batch_duration_ns,
            growth_factor: growth_factor.max(2),
            max_iterations: max_iterations.max(1),
            cancellation: None,
            deadline: None,
        }
    }

    /// Stop with [`MeasureError::Interrupted`] once `token` is cancelled.
    /// Checked after every calibration batch.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Stop with [`MeasureError::BudgetExhausted`] once the clock reads
    /// `started_ns + budget_ns` or later.
    pub fn with_deadline(mut self, started_ns: u64, budget_ns: u64) -> Self {
        self.deadline = Some(Deadline {
            at_ns: started_ns.saturating_add(budget_ns),
            budget_ns,
        });
        self
    }

    /// Minimum duration one batch must reach
    pub fn min_batch_duration_ns(&self) -> u64 {
        self.min_batch_duration_ns
    }

    /// Grow the batch size until one batch takes at least the minimum duration.
    ///
    /// Fails with [`MeasureError::CalibrationTimeout`] when the next batch size
    /// would exceed the iteration ceiling.
    pub fn calibrate<C: Clock + ?Sized>(
        &self,
        candidate: &Candidate,
        input: &[u8],
        clock: &C,
    ) -> Result<Calibration, MeasureError> {
        self.calibrate_from(candidate, input, clock, 1)
    }

    /// Like [`Calibrator::calibrate`], starting the search at `iterations`
    pub fn calibrate_from<C: Clock + ?Sized>(
        &self,
        candidate: &Candidate,
        input: &[u8],
        clock: &C,
        iterations: u64,
    ) -> Result<Calibration, MeasureError> {
        let runner = SampleRunner::new(clock);
        let mut iterations = iterations.clamp(1, self.max_iterations);

        loop {
            let batch = runner.run(candidate, input, iterations)?;
            if batch.elapsed_nanos >= self.min_batch_duration_ns {
                return Ok(Calibration {
                    iterations,
                    first_batch: batch,
                });
            }

            if self.cancellation.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(MeasureError::Interrupted);
            }
            if let Some(deadline) = self.deadline {
                if clock.now_nanos() >= deadline.at_ns {
                    return Err(MeasureError::BudgetExhausted {
                        iterations,
                        budget_ns: deadline.budget_ns,
                    });
                }
            }

            let next = iterations.saturating_mul(self.growth_factor);
            if next > self.max_iterations || next == iterations {
                return Err(MeasureError::CalibrationTimeout {
                    iterations,
                    elapsed_ns: batch.elapsed_nanos,
                    target_ns: self.min_batch_duration_ns,
                });
            }
            iterations = next;
        }
    }
}

/// Minimum batch duration that keeps the clock's quantisation error below
/// `max_error_pct` percent, never lower than `min_batch_duration_ns`.
///
/// A reading can be off by half a tick at each end of a batch, so the batch
/// must last `resolution / (2 * max_error)`.
pub fn effective_min_batch_ns(
    min_batch_duration_ns: u64,
    resolution_ns: u64,
    max_error_pct: f64,
) -> u64 {
    if max_error_pct <= 0.0 {
        return min_batch_duration_ns;
    }
    let required = resolution_ns as f64 * 100.0 / (2.0 * max_error_pct);
    min_batch_duration_ns.max(required.ceil() as u64)
}
