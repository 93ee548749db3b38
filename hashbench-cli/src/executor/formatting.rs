//! Output Formatting
//!
//! Human-readable output formatting for suite rankings.
//!
//! Generates terminal-friendly output with:
//! - A ranked table (ops/sec, margin of error, samples, throughput)
//! - Failed candidates with their cause
//! - The "Fastest is ..." summary line

use hashbench_report::{
    FailureReason, Ranking, ReportError, Reporter, format_duration_ns, format_ops,
    format_throughput,
};
use std::io::Write;

/// Format a ranking for human-readable terminal display
///
/// # Arguments
/// * `ranking` - Ranking of one suite
///
/// # Returns
/// Formatted string suitable for terminal output
pub fn format_human_output(ranking: &Ranking) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str(&format!("Suite: {}\n", ranking.label));
    output.push_str(&"-".repeat(78));
    output.push('\n');

    if ranking.has_results() {
        output.push_str(&format!(
            "{:>4}  {:<12} {:>16} {:>10} {:>8} {:>16}\n",
            "#", "candidate", "ops/sec", "±moe", "samples", "throughput"
        ));

        for (i, result) in ranking.results.iter().enumerate() {
            let moe = match result.margin_of_error_pct {
                Some(moe) => format!("±{:.2}%", moe),
                None => "n/a".to_string(),
            };
            let flag = if result.low_confidence { "  (low confidence)" } else { "" };
            output.push_str(&format!(
                "{:>4}  {:<12} {:>16} {:>10} {:>8} {:>16}{}\n",
                i + 1,
                result.candidate,
                format_ops(result.ops_per_sec),
                moe,
                result.sample_count,
                format_throughput(result.throughput_bytes_per_sec),
                flag
            ));
        }
    } else {
        output.push_str("  no valid results\n");
    }

    for failure in &ranking.failures {
        let status_icon = match failure.reason {
            FailureReason::Panicked => "💥",
            FailureReason::CalibrationTimeout | FailureReason::CandidateFailure => "✗",
        };
        output.push_str(&format!(
            "  {} {} ({}): {}\n",
            status_icon, failure.candidate, failure.reason, failure.message
        ));
    }

    if ranking.cancelled {
        output.push_str("  ⊘ cancelled before all candidates were measured\n");
    }

    let fastest: Vec<&str> = ranking
        .fastest()
        .iter()
        .map(|r| r.candidate.as_str())
        .collect();
    if !fastest.is_empty() {
        output.push_str(&format!("Fastest is {}\n", fastest.join(", ")));
    }

    output.push_str(&format!(
        "({} in {})\n",
        plural(ranking.results.len() + ranking.failures.len(), "candidate"),
        format_duration_ns(ranking.duration_ms * 1_000_000.0)
    ));

    output
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Writes each ranking as a human-readable table as soon as it arrives
pub struct HumanReporter<W: Write> {
    writer: W,
}

impl<W: Write> HumanReporter<W> {
    /// Create a reporter writing to `writer`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for HumanReporter<W> {
    fn report(&mut self, ranking: &Ranking) -> Result<(), ReportError> {
        self.writer.write_all(format_human_output(ranking).as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }
}
