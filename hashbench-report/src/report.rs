//! Report Data Structures

use chrono::{DateTime, Utc};
use hashbench_stats::RunningStats;
use serde::{Deserialize, Serialize};

/// Measurement outcome of one candidate in one suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Candidate name
    pub candidate: String,
    /// Invocations per second derived from the mean
    pub ops_per_sec: f64,
    /// Margin of error as a percentage of the mean (needs 2+ samples)
    pub margin_of_error_pct: Option<f64>,
    /// Admitted batches folded into the statistics
    pub sample_count: u64,
    /// Mean time per invocation
    pub mean_ns: f64,
    /// Standard deviation of per-invocation time across batches
    pub std_dev_ns: f64,
    /// Fastest batch (per invocation)
    pub min_ns: f64,
    /// Slowest admitted batch (per invocation)
    pub max_ns: f64,
    /// Calibrated invocations per batch
    pub iterations_per_batch: u64,
    /// Batches executed, including rejected ones
    pub batches: u64,
    /// Batches rejected by the outlier filter
    pub outliers_rejected: u64,
    /// Input bytes processed per second
    pub throughput_bytes_per_sec: f64,
    /// Budget ran out before the precision target was met
    pub low_confidence: bool,
}

impl SuiteResult {
    /// Build a result from the final statistics of a candidate.
    ///
    /// `ops_per_sec` is `1e9 / mean_ns`, or 0 when the mean is not positive.
    pub fn from_stats(
        candidate: impl Into<String>,
        stats: &RunningStats,
        input_size_bytes: usize,
        iterations_per_batch: u64,
        batches: u64,
        outliers_rejected: u64,
        low_confidence: bool,
    ) -> Self {
        let mean_ns = stats.mean();
        let ops_per_sec = if mean_ns > 0.0 { 1e9 / mean_ns } else { 0.0 };

        Self {
            candidate: candidate.into(),
            ops_per_sec,
            margin_of_error_pct: stats.margin_of_error_pct(),
            sample_count: stats.count(),
            mean_ns,
            std_dev_ns: stats.std_dev(),
            min_ns: stats.min().unwrap_or(0.0),
            max_ns: stats.max().unwrap_or(0.0),
            iterations_per_batch,
            batches,
            outliers_rejected,
            throughput_bytes_per_sec: ops_per_sec * input_size_bytes as f64,
            low_confidence,
        }
    }

    /// Margin of error, 0 when undefined
    pub fn moe_or_zero(&self) -> f64 {
        self.margin_of_error_pct.unwrap_or(0.0)
    }
}

/// Why a candidate produced no result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Too fast to time within the iteration ceiling
    CalibrationTimeout,
    /// The candidate returned an error
    CandidateFailure,
    /// The candidate panicked
    Panicked,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::CalibrationTimeout => write!(f, "CalibrationTimeout"),
            FailureReason::CandidateFailure => write!(f, "CandidateFailure"),
            FailureReason::Panicked => write!(f, "Panicked"),
        }
    }
}

/// A candidate excluded from the ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFailure {
    /// Candidate name
    pub candidate: String,
    /// Failure category
    pub reason: FailureReason,
    /// Underlying cause
    pub message: String,
}

/// Ordered comparison of the candidates of one suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Suite label
    pub label: String,
    /// Input size shared by every candidate
    pub input_size_bytes: usize,
    /// Results, fastest first
    pub results: Vec<SuiteResult>,
    /// Candidates that produced no result
    pub failures: Vec<CandidateFailure>,
    /// Cancellation cut the suite short
    pub cancelled: bool,
    /// Wall time spent on the suite
    pub duration_ms: f64,
}

impl Ranking {
    /// Build a ranking, sorting results by `ops_per_sec` descending.
    ///
    /// The sort is stable, so ties keep registration order.
    pub fn new(
        label: impl Into<String>,
        input_size_bytes: usize,
        mut results: Vec<SuiteResult>,
        failures: Vec<CandidateFailure>,
        cancelled: bool,
        duration_ms: f64,
    ) -> Self {
        results.sort_by(|a, b| {
            b.ops_per_sec
                .partial_cmp(&a.ops_per_sec)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            label: label.into(),
            input_size_bytes,
            results,
            failures,
            cancelled,
            duration_ms,
        }
    }

    /// Whether at least one candidate produced a result
    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    /// Candidate names in rank order
    pub fn order(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.candidate.as_str()).collect()
    }

    /// Results statistically tied with the leader.
    ///
    /// A result ties when the optimistic end of its interval reaches the
    /// pessimistic end of the leader's.
    pub fn fastest(&self) -> Vec<&SuiteResult> {
        let Some(leader) = self.results.first() else {
            return Vec::new();
        };
        let leader_slowest = leader.mean_ns * (1.0 + leader.moe_or_zero() / 100.0);

        self.results
            .iter()
            .filter(|r| r.mean_ns * (1.0 - r.moe_or_zero() / 100.0) <= leader_slowest)
            .collect()
    }

    /// Results flagged low-confidence
    pub fn low_confidence_count(&self) -> usize {
        self.results.iter().filter(|r| r.low_confidence).count()
    }
}

/// Complete run: metadata plus every reported ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run metadata
    pub meta: ReportMeta,
    /// Rankings in the order the suites ran
    pub rankings: Vec<Ranking>,
    /// Aggregate counts
    pub summary: ReportSummary,
}

impl RunReport {
    /// Assemble a report and compute its summary
    pub fn new(meta: ReportMeta, rankings: Vec<Ranking>) -> Self {
        let summary = ReportSummary::from_rankings(&rankings);
        Self {
            meta,
            rankings,
            summary,
        }
    }
}

/// Run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Tool version
    pub version: String,
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
    /// Seed of the corpus generator
    pub corpus_seed: Option<u64>,
    /// Host information
    pub system: SystemInfo,
    /// Measurement settings
    pub config: ReportConfig,
}

/// Measurement settings captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Minimum batch duration
    pub min_batch_duration_ns: u64,
    /// Precision target
    pub target_moe_pct: f64,
    /// Minimum admitted samples before precision can stop a run
    pub min_samples: u64,
    /// Batch ceiling per candidate
    pub max_samples: u64,
    /// Wall-time ceiling per candidate
    pub max_wall_time_ns: u64,
    /// Outlier threshold in MADs
    pub outlier_threshold_k: f64,
    /// Confidence level of margins
    pub confidence_level: f64,
    /// Clock resolution observed at startup
    pub clock_resolution_ns: u64,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// CPU model name
    pub cpu: String,
    /// Logical cores
    pub cpu_cores: u32,
}

/// Aggregate counts over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Suites reported
    pub suites: usize,
    /// Results across all suites
    pub results: usize,
    /// Failed candidates across all suites
    pub failures: usize,
    /// Results flagged low-confidence
    pub low_confidence: usize,
    /// Suites without a single result
    pub empty_suites: usize,
    /// Whether any suite was cancelled
    pub cancelled: bool,
    /// Summed suite durations
    pub total_duration_ms: f64,
}

impl ReportSummary {
    /// Summarise a set of rankings
    pub fn from_rankings(rankings: &[Ranking]) -> Self {
        let mut summary = ReportSummary::default();
        for ranking in rankings {
            summary.add(ranking);
        }
        summary
    }

    /// Fold one ranking into the totals
    pub fn add(&mut self, ranking: &Ranking) {
        self.suites += 1;
        self.results += ranking.results.len();
        self.failures += ranking.failures.len();
        self.low_confidence += ranking.low_confidence_count();
        if !ranking.has_results() {
            self.empty_suites += 1;
        }
        self.cancelled |= ranking.cancelled;
        self.total_duration_ms += ranking.duration_ms;
    }
}
