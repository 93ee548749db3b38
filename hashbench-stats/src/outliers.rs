//! Outlier Filter
//!
//! Rejects batches whose per-iteration time sits too far from the recent
//! history, so scheduler hiccups and cold caches do not drag the mean.
//!
//! The test is `|x - median| > k * MAD` over a small sliding window. Every
//! observation enters the window, rejected or not, so a genuine level shift
//! (frequency scaling, thermal throttling) is absorbed after a few batches
//! instead of being rejected forever.
//!
//! [`OutlierFilter::screen`] holds back the first samples until the window can
//! judge them, then rules on all of them at once. A cold first batch is
//! therefore filtered like any later one.

use crate::percentiles::{median, median_absolute_deviation};
use std::collections::VecDeque;

/// Observations required before the filter starts rejecting
pub const MIN_WINDOW: usize = 3;

/// Lower bound on the MAD relative to the median. A perfectly flat window
/// would otherwise reject any sample that is not bit-identical.
pub const MAD_FLOOR_RATIO: f64 = 0.001;

/// Classification of one observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Sample may enter the statistics
    Admitted,
    /// Sample is an outlier
    Rejected {
        /// Window median at the time of the test
        median: f64,
        /// Window MAD at the time of the test
        mad: f64,
        /// Absolute distance of the sample from the median
        deviation: f64,
    },
}

impl Verdict {
    /// Whether the sample was rejected
    pub fn is_outlier(&self) -> bool {
        matches!(self, Verdict::Rejected { .. })
    }
}

/// Sliding-window median/MAD filter
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    window: VecDeque<f64>,
    capacity: usize,
    k: f64,
    held: Vec<f64>,
    observed: u64,
    rejected: u64,
}

impl OutlierFilter {
    /// Create a filter keeping `window_size` recent observations (at least
    /// [`MIN_WINDOW`]) and rejecting beyond `k` MADs.
    pub fn new(window_size: usize, k: f64) -> Self {
        let capacity = window_size.max(MIN_WINDOW);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            k,
            held: Vec::with_capacity(MIN_WINDOW),
            observed: 0,
            rejected: 0,
        }
    }

    /// Test `value` against the current window without recording it
    pub fn classify(&self, value: f64) -> Verdict {
        if self.window.len() < MIN_WINDOW {
            return Verdict::Admitted;
        }

        let samples: Vec<f64> = self.window.iter().copied().collect();
        let center = median(&samples);
        let mad = median_absolute_deviation(&samples, center);
        let spread = mad.max(center.abs() * MAD_FLOOR_RATIO);
        let deviation = (value - center).abs();

        if deviation > self.k * spread {
            Verdict::Rejected {
                median: center,
                mad,
                deviation,
            }
        } else {
            Verdict::Admitted
        }
    }

    /// Classify `value`, then add it to the window
    pub fn observe(&mut self, value: f64) -> Verdict {
        let verdict = self.judge(value);

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.observed += 1;
        verdict
    }

    /// Observe `value` and return every sample that received its final
    /// verdict, in observation order.
    ///
    /// While the window is shorter than [`MIN_WINDOW`] samples are held and
    /// nothing is returned. The observation that fills the window releases
    /// all held samples, each judged against that first full window.
    pub fn screen(&mut self, value: f64) -> Vec<(f64, Verdict)> {
        if self.window.len() >= MIN_WINDOW {
            return vec![(value, self.observe(value))];
        }

        self.window.push_back(value);
        self.observed += 1;
        self.held.push(value);
        if self.window.len() < MIN_WINDOW {
            return Vec::new();
        }

        let held = std::mem::take(&mut self.held);
        held.into_iter().map(|v| (v, self.judge(v))).collect()
    }

    /// Release held samples without waiting for a full window. They are all
    /// admitted since a short window cannot judge them.
    pub fn flush(&mut self) -> Vec<(f64, Verdict)> {
        std::mem::take(&mut self.held)
            .into_iter()
            .map(|v| (v, Verdict::Admitted))
            .collect()
    }

    /// Samples waiting for the window to fill
    pub fn held(&self) -> usize {
        self.held.len()
    }

    fn judge(&mut self, value: f64) -> Verdict {
        let verdict = self.classify(value);
        if verdict.is_outlier() {
            self.rejected += 1;
        }
        verdict
    }

    /// Observations seen so far
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Observations rejected so far
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Current window contents, oldest first
    pub fn window(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }

    /// Outlier threshold in MADs
    pub fn k(&self) -> f64 {
        self.k
    }
}
