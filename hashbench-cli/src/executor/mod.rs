//! Suite Executor
//!
//! Measures suites of candidates and renders their rankings.
//!
//! ## Pipeline Overview
//!
//! ```text
//!  size ──▶ ┌──────────┐  Corpus   ┌─────────────┐  Ranking  ┌────────────┐
//!           │  corpus  │ ────────▶ │  execution  │ ────────▶ │ formatting │
//!           └──────────┘           └─────────────┘           └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Calibration, precision loop and ranking
//! - [`corpus`] - Deterministic parallel input generation
//! - [`formatting`] - Human-readable output formatting
//! - [`metadata`] - System metadata collection

mod corpus;
mod execution;
mod formatting;
mod metadata;

// Re-export public API
pub use corpus::{CHUNK_SIZE, Corpus, CorpusGenerator};
pub use execution::{Orchestrator, SuiteConfig};
pub use formatting::{HumanReporter, format_human_output};
pub use metadata::build_report_meta;
