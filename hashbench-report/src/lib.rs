#![warn(missing_docs)]
//! HashBench Report - Rankings and Reporting Sinks
//!
//! Holds the immutable result records produced by a suite run and the
//! pluggable sinks that consume them:
//! - JSON (machine-readable, one document per run)
//! - CSV (spreadsheet-compatible, one row per candidate)
//! - in-memory collection for embedding and tests
//!
//! The human-readable table lives with the CLI, next to the other terminal
//! output.

mod csv;
mod format;
mod json;
mod report;
mod sink;

pub use csv::{CSV_HEADER, CsvReporter, generate_csv_report};
pub use format::{format_bytes, format_duration_ns, format_ops, format_throughput};
pub use json::{JsonReporter, generate_json_report};
pub use report::{
    CandidateFailure, FailureReason, Ranking, ReportConfig, ReportMeta, ReportSummary, RunReport,
    SuiteResult, SystemInfo,
};
pub use sink::{MemoryReporter, ReportError, Reporter};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with run metadata
    Json,
    /// CSV for spreadsheets
    Csv,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
