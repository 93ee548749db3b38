//! JSON Output

use crate::report::{Ranking, ReportMeta, RunReport};
use crate::sink::{ReportError, Reporter};
use std::io::Write;

/// Generate a prettified JSON report.
///
/// Serializes the run into machine-readable JSON format.
pub fn generate_json_report(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Collects rankings and writes one JSON document on `finish`
pub struct JsonReporter<W: Write> {
    writer: W,
    meta: ReportMeta,
    rankings: Vec<Ranking>,
    written: bool,
}

impl<W: Write> JsonReporter<W> {
    /// Create a reporter writing to `writer`
    pub fn new(writer: W, meta: ReportMeta) -> Self {
        Self {
            writer,
            meta,
            rankings: Vec::new(),
            written: false,
        }
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, ranking: &Ranking) -> Result<(), ReportError> {
        self.rankings.push(ranking.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        if self.written {
            return Ok(());
        }
        let report = RunReport::new(self.meta.clone(), std::mem::take(&mut self.rankings));
        serde_json::to_writer_pretty(&mut self.writer, &report)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written = true;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::report::tests::sample_ranking;
    use crate::report::{ReportConfig, SystemInfo};
    use chrono::Utc;

    pub(crate) fn sample_meta() -> ReportMeta {
        ReportMeta {
            version: "0.1.0".to_string(),
            timestamp: Utc::now(),
            corpus_seed: Some(42),
            system: SystemInfo {
                os: "linux".to_string(),
                arch: "x86_64".to_string(),
                cpu: "test cpu".to_string(),
                cpu_cores: 8,
            },
            config: ReportConfig {
                min_batch_duration_ns: 50_000_000,
                target_moe_pct: 1.0,
                min_samples: 5,
                max_samples: 100,
                max_wall_time_ns: 5_000_000_000,
                outlier_threshold_k: 3.0,
                confidence_level: 0.95,
                clock_resolution_ns: 20,
            },
        }
    }

    #[test]
    fn test_json_reporter_single_document() {
        let mut reporter = JsonReporter::new(Vec::new(), sample_meta());
        reporter.report(&sample_ranking()).unwrap();
        reporter.report(&sample_ranking()).unwrap();
        reporter.finish().unwrap();
        reporter.finish().unwrap();

        let bytes = reporter.into_inner();
        let parsed: RunReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.rankings.len(), 2);
        assert_eq!(parsed.summary.results, 6);
        assert_eq!(parsed.meta.corpus_seed, Some(42));
        assert_eq!(parsed.rankings[0].results[0].candidate, "fast");
    }

    #[test]
    fn test_generate_json_report() {
        let report = RunReport::new(sample_meta(), vec![sample_ranking()]);
        let json = generate_json_report(&report).unwrap();
        assert!(json.contains("\"CandidateFailure\""));
        assert!(json.contains("\"ops_per_sec\""));
    }
}
