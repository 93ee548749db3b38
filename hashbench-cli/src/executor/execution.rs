//! Suite Execution
//!
//! The [`Orchestrator`] drives one suite at a time: for every candidate it
//! calibrates a batch size, then alternates timed batches with the outlier
//! filter and the running statistics until the precision target is reached
//! or a budget runs out. Results are ranked and handed to a [`Reporter`].
//!
//! ## Data Flow
//!
//! ```text
//!   Suite + Corpus
//!        │
//!        ▼
//! ┌──────────────┐
//! │  Calibrator  │  1, 2, 4, … invocations until a batch is long enough
//! └──────┬───────┘
//!        │ first batch
//!        ▼
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────┐
//! │ SampleRunner │ ──▶ │ OutlierFilter │ ──▶ │ RunningStats │
//! └──────────────┘     └───────────────┘     └──────┬───────┘
//!        ▲                                          │
//!        └────────── until precise or exhausted ────┘
//!        │
//!        ▼
//!   Ranking ──▶ Reporter
//! ```

use super::corpus::{Corpus, CorpusGenerator};
use hashbench_core::{
    Batch, CancellationToken, Calibrator, Candidate, Clock, MeasureError, SampleRunner, Suite,
    SuiteError, effective_min_batch_ns, pin_current_thread,
};
use hashbench_report::{
    CandidateFailure, FailureReason, Ranking, ReportConfig, Reporter, SuiteResult,
};
use hashbench_stats::{MIN_WINDOW, OutlierFilter, RunningStats, Verdict};
use indicatif::{ProgressBar, ProgressStyle};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

/// Re-calibrations allowed per candidate after a too-short batch
const MAX_RECALIBRATIONS: u32 = 3;

/// Configuration for candidate measurement
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    /// Minimum wall time of one batch
    pub min_batch_duration_ns: u64,
    /// Precision target: margin of error as a percentage of the mean
    pub target_moe_pct: f64,
    /// Admitted samples required before precision may stop a measurement
    pub min_samples: u64,
    /// Batch ceiling per candidate, rejected batches included
    pub max_samples: u64,
    /// Wall-time ceiling per candidate, calibration included
    pub max_wall_time_ns: u64,
    /// Outlier threshold in multiples of the MAD
    pub outlier_threshold_k: f64,
    /// Recent batches considered by the outlier filter
    pub outlier_window: usize,
    /// Confidence level of the margin of error
    pub confidence_level: f64,
    /// Calibration growth factor
    pub growth_factor: u64,
    /// Iteration ceiling for calibration
    pub max_calibration_iterations: u64,
    /// Largest tolerated clock quantisation error per batch, in percent
    pub max_resolution_error_pct: f64,
    /// Pin the measuring thread to its current CPU
    pub pin_cpu: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            min_batch_duration_ns: hashbench_core::DEFAULT_MIN_BATCH_DURATION_NS,
            target_moe_pct: 1.0,
            min_samples: 5,
            max_samples: 100,
            max_wall_time_ns: 5_000_000_000, // 5 seconds
            outlier_threshold_k: hashbench_stats::DEFAULT_OUTLIER_K,
            outlier_window: hashbench_stats::DEFAULT_OUTLIER_WINDOW,
            confidence_level: hashbench_stats::DEFAULT_CONFIDENCE_LEVEL,
            growth_factor: hashbench_core::DEFAULT_GROWTH_FACTOR,
            max_calibration_iterations: hashbench_core::DEFAULT_MAX_CALIBRATION_ITERATIONS,
            max_resolution_error_pct: 1.0,
            pin_cpu: true,
        }
    }
}

impl SuiteConfig {
    /// Reject values the measurement loop cannot work with
    pub fn validate(&self) -> Result<(), SuiteError> {
        let invalid = |msg: String| Err(SuiteError::InvalidConfig(msg));

        if self.min_batch_duration_ns == 0 {
            return invalid("min_batch_duration must be positive".into());
        }
        if !(self.target_moe_pct.is_finite() && self.target_moe_pct > 0.0) {
            return invalid(format!("target_moe_pct must be positive, got {}", self.target_moe_pct));
        }
        if self.min_samples == 0 {
            return invalid("min_samples must be at least 1".into());
        }
        if self.max_samples < self.min_samples {
            return invalid(format!(
                "max_samples ({}) is below min_samples ({})",
                self.max_samples, self.min_samples
            ));
        }
        if self.max_wall_time_ns == 0 {
            return invalid("max_wall_time must be positive".into());
        }
        if !(self.outlier_threshold_k.is_finite() && self.outlier_threshold_k > 0.0) {
            return invalid(format!(
                "outlier_threshold_k must be positive, got {}",
                self.outlier_threshold_k
            ));
        }
        if self.outlier_window < MIN_WINDOW {
            return invalid(format!(
                "outlier_window must be at least {}, got {}",
                MIN_WINDOW, self.outlier_window
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return invalid(format!(
                "confidence_level must lie in (0, 1), got {}",
                self.confidence_level
            ));
        }
        if self.growth_factor < 2 {
            return invalid(format!("growth_factor must be at least 2, got {}", self.growth_factor));
        }
        if self.max_calibration_iterations == 0 {
            return invalid("max_calibration_iterations must be at least 1".into());
        }
        if !(self.max_resolution_error_pct.is_finite() && self.max_resolution_error_pct > 0.0) {
            return invalid(format!(
                "max_resolution_error_pct must be positive, got {}",
                self.max_resolution_error_pct
            ));
        }
        Ok(())
    }

    /// Settings snapshot for report metadata
    pub fn report_config(&self, clock_resolution_ns: u64) -> ReportConfig {
        ReportConfig {
            min_batch_duration_ns: self.min_batch_duration_ns,
            target_moe_pct: self.target_moe_pct,
            min_samples: self.min_samples,
            max_samples: self.max_samples,
            max_wall_time_ns: self.max_wall_time_ns,
            outlier_threshold_k: self.outlier_threshold_k,
            confidence_level: self.confidence_level,
            clock_resolution_ns,
        }
    }
}

/// What happened to one candidate
#[derive(Debug)]
enum Outcome {
    Measured(SuiteResult),
    Failed(CandidateFailure),
    /// Cancelled mid-measurement; the partial data is dropped
    Interrupted,
}

/// Runs suites candidate by candidate and reports their rankings
pub struct Orchestrator<C: Clock> {
    config: SuiteConfig,
    clock: C,
    cancellation: CancellationToken,
    progress: bool,
    generator: Option<CorpusGenerator>,
}

impl<C: Clock> Orchestrator<C> {
    /// Create an orchestrator. Without [`Orchestrator::with_corpus_generator`],
    /// `run_sizes` draws a random corpus seed.
    pub fn new(config: SuiteConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            cancellation: CancellationToken::new(),
            progress: false,
            generator: None,
        }
    }

    /// Observe an external cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Show a progress bar over the candidates of each suite
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Generate `run_sizes` inputs with this generator
    pub fn with_corpus_generator(mut self, generator: CorpusGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Measurement configuration
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Cancellation token checked between batches
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Measure a suite and deliver its ranking to `reporter`
    pub fn run_suite(
        &self,
        suite: &Suite,
        corpus: &Corpus,
        reporter: &mut dyn Reporter,
    ) -> Result<Ranking, SuiteError> {
        let ranking = self.measure_suite(suite, corpus)?;
        reporter
            .report(&ranking)
            .map_err(|e| SuiteError::Report(Box::new(e)))?;
        Ok(ranking)
    }

    /// Measure every candidate of a suite and rank the results without reporting them
    pub fn measure_suite(&self, suite: &Suite, corpus: &Corpus) -> Result<Ranking, SuiteError> {
        self.config.validate()?;
        suite.validate()?;
        if corpus.len() != suite.input_size_bytes() {
            return Err(SuiteError::CorpusMismatch {
                expected: suite.input_size_bytes(),
                actual: corpus.len(),
            });
        }

        self.pin_if_enabled();

        tracing::info!(
            suite = suite.label(),
            size = suite.input_size_bytes(),
            candidates = suite.len(),
            "Running suite"
        );

        let start = Instant::now();
        let pb = self.progress_bar(suite.len());
        let mut results = Vec::with_capacity(suite.len());
        let mut failures = Vec::new();
        let mut cancelled = false;

        for candidate in suite.candidates() {
            if self.cancellation.is_cancelled() {
                cancelled = true;
                break;
            }
            pb.set_message(candidate.name().to_string());

            match self.measure_guarded(candidate, suite.input_size_bytes(), corpus.bytes()) {
                Outcome::Measured(result) => results.push(result),
                Outcome::Failed(failure) => {
                    tracing::warn!(
                        candidate = %failure.candidate,
                        reason = %failure.reason,
                        "Candidate failed: {}",
                        failure.message
                    );
                    failures.push(failure);
                }
                Outcome::Interrupted => {
                    tracing::warn!(candidate = candidate.name(), "Measurement cancelled");
                    cancelled = true;
                    break;
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();

        let ranking = Ranking::new(
            suite.label(),
            suite.input_size_bytes(),
            results,
            failures,
            cancelled,
            start.elapsed().as_secs_f64() * 1000.0,
        );

        tracing::info!(
            suite = suite.label(),
            results = ranking.results.len(),
            failures = ranking.failures.len(),
            duration_ms = ranking.duration_ms,
            "Suite complete"
        );

        Ok(ranking)
    }

    /// Run one suite per size, in order.
    ///
    /// While a ranking is being reported the next size's corpus is generated
    /// on a scoped thread. After a cancellation the remaining sizes are
    /// skipped. The reporter is not finished here.
    pub fn run_sizes<F>(
        &self,
        sizes: &[usize],
        mut build_suite: F,
        reporter: &mut dyn Reporter,
    ) -> Result<Vec<Ranking>, SuiteError>
    where
        F: FnMut(usize) -> Result<Suite, SuiteError>,
    {
        self.config.validate()?;

        let generator = self
            .generator
            .unwrap_or_else(|| CorpusGenerator::new(None));
        let mut rankings = Vec::with_capacity(sizes.len());
        let mut pending: Option<Corpus> = None;

        for (i, &size) in sizes.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                tracing::warn!(skipped = sizes.len() - i, "Cancelled, skipping remaining suites");
                break;
            }

            let corpus = match pending.take() {
                Some(corpus) if corpus.len() == size => corpus,
                _ => generator.generate(size),
            };
            let suite = build_suite(size)?;
            let ranking = self.measure_suite(&suite, &corpus)?;
            drop(corpus);

            let next_size = sizes
                .get(i + 1)
                .copied()
                .filter(|_| !ranking.cancelled && !self.cancellation.is_cancelled());

            let (reported, next_corpus) = std::thread::scope(|scope| {
                let handle = next_size.map(|size| scope.spawn(move || generator.generate(size)));
                let reported = reporter.report(&ranking);
                let next_corpus = handle.and_then(|h| h.join().ok());
                (reported, next_corpus)
            });

            reported.map_err(|e| SuiteError::Report(Box::new(e)))?;
            pending = next_corpus;
            rankings.push(ranking);
        }

        Ok(rankings)
    }

    fn pin_if_enabled(&self) {
        if !self.config.pin_cpu {
            return;
        }
        match pin_current_thread() {
            Ok(cpu) => tracing::debug!(cpu, "Pinned measuring thread"),
            Err(e) => tracing::warn!("Failed to pin measuring thread: {}", e),
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    /// Measure one candidate, turning a panic into a failure
    fn measure_guarded(&self, candidate: &Candidate, input_size: usize, input: &[u8]) -> Outcome {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.measure_candidate(candidate, input_size, input)
        }));

        match outcome {
            Ok(outcome) => outcome,
            Err(payload) => Outcome::Failed(CandidateFailure {
                candidate: candidate.name().to_string(),
                reason: FailureReason::Panicked,
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    fn measure_candidate(&self, candidate: &Candidate, input_size: usize, input: &[u8]) -> Outcome {
        let cfg = &self.config;
        let started = self.clock.now_nanos();

        let min_batch = effective_min_batch_ns(
            cfg.min_batch_duration_ns,
            self.clock.resolution_ns(),
            cfg.max_resolution_error_pct,
        );
        let calibrator =
            Calibrator::new(min_batch, cfg.growth_factor, cfg.max_calibration_iterations)
                .with_cancellation(self.cancellation.clone())
                .with_deadline(started, cfg.max_wall_time_ns);

        let mut calibration = match calibrator.calibrate(candidate, input, &self.clock) {
            Ok(calibration) => calibration,
            Err(e) => return outcome_from(candidate, e),
        };
        tracing::debug!(
            candidate = candidate.name(),
            iterations = calibration.iterations,
            min_batch_ns = min_batch,
            "Calibrated"
        );

        let runner = SampleRunner::new(&self.clock);
        let mut stats = RunningStats::new(cfg.confidence_level);
        let mut filter = OutlierFilter::new(cfg.outlier_window, cfg.outlier_threshold_k);
        let mut batch: Batch = calibration.first_batch;
        let mut batches = 0u64;
        let mut recalibrations = 0u32;

        let precise = loop {
            batches += 1;
            for (per_iter, verdict) in filter.screen(batch.per_iteration_nanos()) {
                record(&mut stats, candidate, per_iter, verdict);
            }

            if stats.is_precise(cfg.target_moe_pct) && stats.count() >= cfg.min_samples {
                break true;
            }
            let elapsed = self.clock.now_nanos().saturating_sub(started);
            if batches >= cfg.max_samples || elapsed >= cfg.max_wall_time_ns {
                break false;
            }
            if self.cancellation.is_cancelled() {
                return Outcome::Interrupted;
            }

            batch = match runner.run(candidate, input, calibration.iterations) {
                Ok(batch) => batch,
                Err(e) => return outcome_from(candidate, e),
            };

            // Calibration sized the batch on a cold start; every sample so far
            // was taken with too few iterations.
            if batch.elapsed_nanos < min_batch / 2 && recalibrations < MAX_RECALIBRATIONS {
                recalibrations += 1;
                calibration = match calibrator.calibrate_from(
                    candidate,
                    input,
                    &self.clock,
                    calibration.iterations,
                ) {
                    Ok(calibration) => calibration,
                    Err(e) => return outcome_from(candidate, e),
                };
                tracing::debug!(
                    candidate = candidate.name(),
                    iterations = calibration.iterations,
                    discarded = batches,
                    "Recalibrated"
                );
                stats = RunningStats::new(cfg.confidence_level);
                filter = OutlierFilter::new(cfg.outlier_window, cfg.outlier_threshold_k);
                batches = 0;
                batch = calibration.first_batch;
            }
        };

        if !precise {
            for (per_iter, verdict) in filter.flush() {
                record(&mut stats, candidate, per_iter, verdict);
            }
            tracing::debug!(
                candidate = candidate.name(),
                samples = stats.count(),
                batches,
                moe_pct = ?stats.margin_of_error_pct(),
                "Budget exhausted before precision target"
            );
        }

        Outcome::Measured(SuiteResult::from_stats(
            candidate.name(),
            &stats,
            input_size,
            calibration.iterations,
            batches,
            filter.rejected(),
            !precise,
        ))
    }
}

fn record(stats: &mut RunningStats, candidate: &Candidate, per_iter: f64, verdict: Verdict) {
    match verdict {
        Verdict::Admitted => stats.push(per_iter),
        Verdict::Rejected {
            median,
            mad,
            deviation,
        } => tracing::debug!(
            candidate = candidate.name(),
            per_iter,
            median,
            mad,
            deviation,
            "Rejected outlier batch"
        ),
    }
}

fn outcome_from(candidate: &Candidate, error: MeasureError) -> Outcome {
    let reason = match error {
        MeasureError::Interrupted => return Outcome::Interrupted,
        MeasureError::CalibrationTimeout { .. } | MeasureError::BudgetExhausted { .. } => {
            FailureReason::CalibrationTimeout
        }
        MeasureError::CandidateFailure { .. } => FailureReason::CandidateFailure,
    };
    Outcome::Failed(CandidateFailure {
        candidate: candidate.name().to_string(),
        reason,
        message: error.to_string(),
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
