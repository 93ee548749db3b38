//! Sample Runner
//!
//! Runs a candidate a fixed number of times between two clock reads and
//! returns the result as one [`Batch`].

use crate::candidate::Candidate;
use crate::error::MeasureError;
use crate::measure::{Clock, Timer};

/// One timed execution of `iterations` invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Invocations in this batch
    pub iterations: u64,
    /// Total elapsed time in nanoseconds
    pub elapsed_nanos: u64,
}

impl Batch {
    /// Create a batch; `iterations` is clamped to at least 1
    pub fn new(iterations: u64, elapsed_nanos: u64) -> Self {
        Self {
            iterations: iterations.max(1),
            elapsed_nanos,
        }
    }

    /// Mean time of one invocation
    ///
    /// Uses f64 to avoid integer truncation for fast candidates.
    pub fn per_iteration_nanos(&self) -> f64 {
        self.elapsed_nanos as f64 / self.iterations as f64
    }
}

/// Executes batches of one candidate against one clock
pub struct SampleRunner<'c, C: Clock + ?Sized> {
    clock: &'c C,
}

impl<'c, C: Clock + ?Sized> SampleRunner<'c, C> {
    /// Create a runner reading `clock`
    pub fn new(clock: &'c C) -> Self {
        Self { clock }
    }

    /// Run `iterations` invocations back to back and time them.
    ///
    /// The first candidate error aborts the batch.
    #[inline]
    pub fn run(
        &self,
        candidate: &Candidate,
        input: &[u8],
        iterations: u64,
    ) -> Result<Batch, MeasureError> {
        let iterations = iterations.max(1);
        let timer = Timer::start(self.clock);

        for _ in 0..iterations {
            if let Err(e) = candidate.invoke(input) {
                return Err(MeasureError::CandidateFailure {
                    candidate: candidate.name().to_string(),
                    message: e.message().to_string(),
                });
            }
        }

        let elapsed_nanos = timer.stop();
        Ok(Batch::new(iterations, elapsed_nanos))
    }
}
