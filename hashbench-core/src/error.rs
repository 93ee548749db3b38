//! Error Types
//!
//! [`MeasureError`] is scoped to one candidate and never aborts a suite.
//! [`SuiteError`] is raised during suite setup, before any timing begins.

use thiserror::Error;

/// Failure while measuring a single candidate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// Iteration ceiling reached before a batch took long enough to time
    #[error(
        "calibration timed out: {iterations} iterations took {elapsed_ns} ns, needed {target_ns} ns"
    )]
    CalibrationTimeout {
        /// Largest batch size tried
        iterations: u64,
        /// Elapsed time of that batch
        elapsed_ns: u64,
        /// Minimum batch duration that was required
        target_ns: u64,
    },

    /// The wall-time budget ran out before calibration found a batch size
    #[error("wall-time budget of {budget_ns} ns exhausted during calibration at {iterations} iterations")]
    BudgetExhausted {
        /// Largest batch size tried
        iterations: u64,
        /// Wall-time budget of the measurement
        budget_ns: u64,
    },

    /// Cancellation was requested between two batches
    #[error("measurement cancelled")]
    Interrupted,

    /// The candidate returned an error during a timed batch
    #[error("candidate '{candidate}' failed: {message}")]
    CandidateFailure {
        /// Candidate name
        candidate: String,
        /// Error reported by the candidate
        message: String,
    },
}

/// Fatal suite-level error
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Two candidates share a name
    #[error("duplicate candidate '{0}'")]
    DuplicateCandidate(String),

    /// Suite has nothing to measure
    #[error("suite '{0}' has no candidates")]
    EmptySuite(String),

    /// Input size must be positive
    #[error("suite '{label}' has invalid input size {size}")]
    InvalidInputSize {
        /// Suite label
        label: String,
        /// Rejected size
        size: usize,
    },

    /// Corpus length differs from the suite's input size
    #[error("corpus holds {actual} bytes but suite expects {expected}")]
    CorpusMismatch {
        /// Suite input size
        expected: usize,
        /// Corpus length
        actual: usize,
    },

    /// Rejected configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The reporting sink failed
    #[error("reporting failed: {0}")]
    Report(#[source] Box<dyn std::error::Error + Send + Sync>),
}
