//! Running Statistics
//!
//! Welford's online algorithm: count, mean and variance are updated one
//! sample at a time, so no sample history is kept.

use crate::distribution::critical_value;

/// Incrementally updated summary of per-iteration times (nanoseconds)
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    confidence_level: f64,
}

impl RunningStats {
    /// Create an empty accumulator reporting margins at `confidence_level`
    pub fn new(confidence_level: f64) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            confidence_level,
        }
    }

    /// Fold one sample into the running state
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Number of samples folded in
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running mean (0.0 when empty)
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (n - 1 denominator); 0.0 below two samples
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).max(0.0)
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean
    pub fn standard_error(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.variance() / self.count as f64).sqrt()
    }

    /// Smallest sample seen
    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest sample seen
    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Confidence level used for margins
    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Half-width of the confidence interval in nanoseconds.
    ///
    /// `None` until two samples have been seen.
    pub fn margin_of_error(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        Some(critical_value(self.confidence_level, self.count - 1) * self.standard_error())
    }

    /// Margin of error as a percentage of the mean.
    ///
    /// `None` until two samples have been seen; never negative.
    pub fn margin_of_error_pct(&self) -> Option<f64> {
        let moe = self.margin_of_error()?;
        if moe == 0.0 || self.mean <= 0.0 {
            return Some(0.0);
        }
        Some(moe / self.mean * 100.0)
    }

    /// Whether the margin of error is at or below `target_pct`
    pub fn is_precise(&self, target_pct: f64) -> bool {
        matches!(self.margin_of_error_pct(), Some(moe) if moe <= target_pct)
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new(crate::DEFAULT_CONFIDENCE_LEVEL)
    }
}
