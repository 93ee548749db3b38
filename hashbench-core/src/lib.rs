#![warn(missing_docs)]
//! HashBench Core - Measurement Primitives
//!
//! This crate provides the timed side of the benchmark engine:
//! - `Clock` abstraction with a monotonic wall clock and a manual test clock
//! - `Candidate` and `Suite` registration
//! - `SampleRunner` producing one timed `Batch` per call
//! - `Calibrator` growing the batch size until the clock error is negligible
//! - `CancellationToken` checked between batches
//! - CPU affinity pinning for the measuring thread

mod calibrate;
mod cancel;
mod candidate;
mod error;
mod measure;
mod runner;

pub use calibrate::{Calibration, Calibrator, effective_min_batch_ns};
pub use cancel::CancellationToken;
pub use candidate::{Candidate, CandidateError, InvokeFn, Suite};
pub use error::{MeasureError, SuiteError};
pub use measure::{Clock, ManualClock, MonotonicClock, Timer, pin_current_thread, pin_to_cpu};
pub use runner::{Batch, SampleRunner};

/// Default minimum wall time of one batch (50 ms)
pub const DEFAULT_MIN_BATCH_DURATION_NS: u64 = 50_000_000;

/// Default factor by which the calibrator grows the batch size
pub const DEFAULT_GROWTH_FACTOR: u64 = 2;

/// Default iteration ceiling for calibration
pub const DEFAULT_MAX_CALIBRATION_ITERATIONS: u64 = 1 << 30;
