#![warn(missing_docs)]
//! # HashBench
//!
//! Adaptive micro-benchmarking of hash functions across input sizes.
//!
//! HashBench decides for itself how long to measure:
//! - **Calibration**: batch sizes grow geometrically until a batch outlasts the
//!   clock's resolution by a safe margin
//! - **Precision loop**: batches are timed until the Student-t margin of error
//!   drops below a target, or a sample/time budget runs out
//! - **Outlier rejection**: batches far from the recent median (in MADs) are
//!   discarded before they reach the statistics
//! - **Rankings**: candidates are sorted by throughput, with the statistically
//!   tied leaders reported as "fastest"
//!
//! ## Quick Start
//!
//! ```ignore
//! use hashbench::prelude::*;
//!
//! let mut suite = Suite::for_size(1024);
//! suite.register("len", |input: &[u8]| input.len())?;
//!
//! let corpus = CorpusGenerator::new(Some(42)).generate(1024);
//! let orchestrator = Orchestrator::new(SuiteConfig::default(), MonotonicClock::new());
//! let ranking = orchestrator.run_suite(&suite, &corpus, &mut MemoryReporter::new())?;
//! println!("{}", format_human_output(&ranking));
//! ```

// Re-export core types
pub use hashbench_core::{
    Batch, Calibration, Calibrator, CancellationToken, Candidate, CandidateError, Clock,
    ManualClock, MeasureError, MonotonicClock, SampleRunner, Suite, SuiteError,
    effective_min_batch_ns,
};

// Re-export stats
pub use hashbench_stats::{OutlierFilter, RunningStats, Verdict};

// Re-export reporting
pub use hashbench_report::{
    CandidateFailure, CsvReporter, FailureReason, JsonReporter, MemoryReporter, Ranking,
    ReportError, Reporter, RunReport, SuiteResult,
};

// Re-export orchestration
pub use hashbench_cli::{
    ALGORITHMS, Corpus, CorpusGenerator, HashAlgorithm, HumanReporter, Orchestrator, SuiteConfig,
    build_suite, format_human_output,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CancellationToken, Corpus, CorpusGenerator, MemoryReporter, MonotonicClock, Orchestrator,
        Ranking, Reporter, Suite, SuiteConfig, format_human_output,
    };
}

/// Run the HashBench CLI harness.
///
/// ```ignore
/// fn main() -> anyhow::Result<std::process::ExitCode> {
///     hashbench::run()
/// }
/// ```
pub use hashbench_cli::run;
