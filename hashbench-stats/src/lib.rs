#![warn(missing_docs)]
//! HashBench Statistical Engine
//!
//! Online statistics for adaptive benchmarking:
//! - Welford running mean/variance with Student-t margin of error
//! - Sliding-window outlier filter using median absolute deviation
//! - Normal and Student-t critical values for arbitrary confidence levels
//! - Percentile helpers shared by the filter and the reports

mod distribution;
mod outliers;
mod percentiles;
mod running;

pub use distribution::{critical_value, normal_quantile, student_t_quantile};
pub use outliers::{MAD_FLOOR_RATIO, MIN_WINDOW, OutlierFilter, Verdict};
pub use percentiles::{compute_percentile, median, median_absolute_deviation};
pub use running::RunningStats;

/// Default confidence level (95%)
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Default outlier threshold in multiples of the MAD
pub const DEFAULT_OUTLIER_K: f64 = 3.0;

/// Default number of recent batches kept by the outlier filter
pub const DEFAULT_OUTLIER_WINDOW: usize = 8;
