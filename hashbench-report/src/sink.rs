//! Reporting Sinks
//!
//! The orchestrator hands every finished [`Ranking`] to a [`Reporter`]. Sinks
//! decide whether to stream it out immediately or collect it for `finish`.

use crate::report::Ranking;

/// Errors raised while writing a report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Underlying writer failed
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Consumer of suite rankings
pub trait Reporter {
    /// Receive one completed ranking
    fn report(&mut self, ranking: &Ranking) -> Result<(), ReportError>;

    /// Flush anything buffered. Called once after the last suite.
    fn finish(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&mut self, ranking: &Ranking) -> Result<(), ReportError> {
        (**self).report(ranking)
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        (**self).finish()
    }
}

/// Keeps every ranking in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    rankings: Vec<Ranking>,
    finished: bool,
}

impl MemoryReporter {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Rankings received so far
    pub fn rankings(&self) -> &[Ranking] {
        &self.rankings
    }

    /// Consume the collector
    pub fn into_rankings(self) -> Vec<Ranking> {
        self.rankings
    }

    /// Whether `finish` has been called
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, ranking: &Ranking) -> Result<(), ReportError> {
        self.rankings.push(ranking.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_ranking;

    #[test]
    fn test_memory_reporter() {
        let mut reporter = MemoryReporter::new();
        reporter.report(&sample_ranking()).unwrap();
        reporter.report(&sample_ranking()).unwrap();
        assert!(!reporter.is_finished());
        reporter.finish().unwrap();

        assert!(reporter.is_finished());
        assert_eq!(reporter.rankings().len(), 2);
        assert_eq!(reporter.into_rankings()[0].label, "1024 bytes");
    }

    #[test]
    fn test_boxed_reporter() {
        let mut boxed: Box<dyn Reporter> = Box::new(MemoryReporter::new());
        boxed.report(&sample_ranking()).unwrap();
        boxed.finish().unwrap();
    }
}
