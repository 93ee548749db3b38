//! Configuration loading from hashbench.toml
//!
//! HashBench configuration can be specified in a `hashbench.toml` file. The
//! file is discovered by walking up from the current directory, or passed
//! explicitly with `--config`. Command-line flags override file values.

use crate::executor::SuiteConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the discovered configuration file
pub const CONFIG_FILE_NAME: &str = "hashbench.toml";

/// HashBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HashBenchConfig {
    /// Measurement configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Input corpus configuration
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for candidate measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Minimum wall time of one batch (e.g., "50ms")
    #[serde(default = "default_min_batch_duration")]
    pub min_batch_duration: String,
    /// Stop once the margin of error drops below this percentage
    #[serde(default = "default_target_moe_pct")]
    pub target_moe_pct: f64,
    /// Admitted samples required before precision may end a measurement
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,
    /// Batch ceiling per candidate
    #[serde(default = "default_max_samples")]
    pub max_samples: u64,
    /// Wall-time ceiling per candidate, calibration included (e.g., "5s")
    #[serde(default = "default_max_time")]
    pub max_time: String,
    /// Outlier threshold in multiples of the MAD
    #[serde(default = "default_outlier_threshold_k")]
    pub outlier_threshold_k: f64,
    /// Recent batches considered by the outlier filter
    #[serde(default = "default_outlier_window")]
    pub outlier_window: usize,
    /// Confidence level (e.g., 0.95 for 95%)
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Calibration growth factor
    #[serde(default = "default_growth_factor")]
    pub growth_factor: u64,
    /// Iteration ceiling for calibration
    #[serde(default = "default_max_calibration_iterations")]
    pub max_calibration_iterations: u64,
    /// Largest tolerated clock quantisation error, in percent of a batch
    #[serde(default = "default_max_resolution_error_pct")]
    pub max_resolution_error_pct: f64,
    /// Pin the measuring thread to its current CPU
    #[serde(default = "default_pin_cpu")]
    pub pin_cpu: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            min_batch_duration: default_min_batch_duration(),
            target_moe_pct: default_target_moe_pct(),
            min_samples: default_min_samples(),
            max_samples: default_max_samples(),
            max_time: default_max_time(),
            outlier_threshold_k: default_outlier_threshold_k(),
            outlier_window: default_outlier_window(),
            confidence_level: default_confidence_level(),
            growth_factor: default_growth_factor(),
            max_calibration_iterations: default_max_calibration_iterations(),
            max_resolution_error_pct: default_max_resolution_error_pct(),
            pin_cpu: default_pin_cpu(),
        }
    }
}

fn default_min_batch_duration() -> String {
    "50ms".to_string()
}
fn default_target_moe_pct() -> f64 {
    1.0
}
fn default_min_samples() -> u64 {
    5
}
fn default_max_samples() -> u64 {
    100
}
fn default_max_time() -> String {
    "5s".to_string()
}
fn default_outlier_threshold_k() -> f64 {
    hashbench_stats::DEFAULT_OUTLIER_K
}
fn default_outlier_window() -> usize {
    hashbench_stats::DEFAULT_OUTLIER_WINDOW
}
fn default_confidence_level() -> f64 {
    hashbench_stats::DEFAULT_CONFIDENCE_LEVEL
}
fn default_growth_factor() -> u64 {
    hashbench_core::DEFAULT_GROWTH_FACTOR
}
fn default_max_calibration_iterations() -> u64 {
    hashbench_core::DEFAULT_MAX_CALIBRATION_ITERATIONS
}
fn default_max_resolution_error_pct() -> f64 {
    1.0
}
fn default_pin_cpu() -> bool {
    true
}

/// Input corpus configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorpusConfig {
    /// Generator seed; a random seed is drawn when unset
    #[serde(default)]
    pub seed: Option<u64>,
    /// Input sizes in bytes; powers of ten up to 1e8 when unset
    #[serde(default)]
    pub sizes: Option<Vec<usize>>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human", "json", "csv"
    #[serde(default = "default_format")]
    pub format: String,
    /// Report file (stdout when unset)
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            path: None,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl HashBenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Walk up from `start` looking for `hashbench.toml`
    pub fn find_config_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Discover and load configuration by walking up from the current directory.
    ///
    /// Returns `Ok(None)` when no file exists; a file that fails to parse is an error.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        match Self::find_config_file(&cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::load(path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Resolve the runner section into a measurement configuration
    pub fn to_suite_config(&self) -> anyhow::Result<SuiteConfig> {
        let runner = &self.runner;
        Ok(SuiteConfig {
            min_batch_duration_ns: Self::parse_duration(&runner.min_batch_duration)
                .context("runner.min_batch_duration")?,
            target_moe_pct: runner.target_moe_pct,
            min_samples: runner.min_samples,
            max_samples: runner.max_samples,
            max_wall_time_ns: Self::parse_duration(&runner.max_time).context("runner.max_time")?,
            outlier_threshold_k: runner.outlier_threshold_k,
            outlier_window: runner.outlier_window,
            confidence_level: runner.confidence_level,
            growth_factor: runner.growth_factor,
            max_calibration_iterations: runner.max_calibration_iterations,
            max_resolution_error_pct: runner.max_resolution_error_pct,
            pin_cpu: runner.pin_cpu,
        })
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# HashBench Configuration

[runner]
# Minimum wall time of one timed batch
min_batch_duration = "50ms"
# Stop measuring a candidate once its margin of error is below this percentage
target_moe_pct = 1.0
# Samples required before the precision target may end a measurement
min_samples = 5
# Batch ceiling per candidate
max_samples = 100
# Wall-time ceiling per candidate, calibration included
max_time = "5s"
# Reject batches further than k MADs from the window median
outlier_threshold_k = 3.0
outlier_window = 8
# Confidence level (0.0 to 1.0)
confidence_level = 0.95
# Calibration grows the batch size by this factor
growth_factor = 2
max_calibration_iterations = 1073741824
# Largest clock quantisation error tolerated per batch, in percent
max_resolution_error_pct = 1.0
# Pin the measuring thread to one CPU (Linux only)
pin_cpu = true

[corpus]
# Fixed seed for reproducible inputs (uncomment to enable)
# seed = 42
# Input sizes in bytes (uncomment to override the powers of ten up to 1e8)
# sizes = [16, 1024, 1048576]

[output]
# Default output format: human, json, csv
format = "human"
# Report file (uncomment to write to a file instead of stdout)
# path = "hashbench.json"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HashBenchConfig::default();
        assert_eq!(config.runner.min_batch_duration, "50ms");
        assert_eq!(config.runner.max_time, "5s");
        assert_eq!(config.runner.outlier_window, 8);
        assert!(config.runner.pin_cpu);
        assert!(config.corpus.seed.is_none());
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(HashBenchConfig::parse_duration("3s").unwrap(), 3_000_000_000);
        assert_eq!(HashBenchConfig::parse_duration("50ms").unwrap(), 50_000_000);
        assert_eq!(HashBenchConfig::parse_duration("100us").unwrap(), 100_000);
        assert_eq!(HashBenchConfig::parse_duration("100µs").unwrap(), 100_000);
        assert_eq!(HashBenchConfig::parse_duration("1000ns").unwrap(), 1000);
        assert_eq!(HashBenchConfig::parse_duration("2m").unwrap(), 120_000_000_000);
        assert_eq!(HashBenchConfig::parse_duration("1.5s").unwrap(), 1_500_000_000);
        assert_eq!(HashBenchConfig::parse_duration("2").unwrap(), 2_000_000_000);
        assert!(HashBenchConfig::parse_duration("").is_err());
        assert!(HashBenchConfig::parse_duration("5 fortnights").is_err());
        assert!(HashBenchConfig::parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            min_batch_duration = "10ms"
            target_moe_pct = 0.5
            pin_cpu = false

            [corpus]
            seed = 7
            sizes = [1, 64]
        "#;

        let config: HashBenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.min_batch_duration, "10ms");
        assert!(!config.runner.pin_cpu);
        assert_eq!(config.corpus.seed, Some(7));
        assert_eq!(config.corpus.sizes, Some(vec![1, 64]));
        // Defaults should still apply
        assert_eq!(config.runner.max_samples, 100);
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_default_toml_parses() {
        let config: HashBenchConfig = toml::from_str(&HashBenchConfig::default_toml()).unwrap();
        let defaults = HashBenchConfig::default();
        assert_eq!(config.runner.min_batch_duration, defaults.runner.min_batch_duration);
        assert_eq!(
            config.runner.max_calibration_iterations,
            defaults.runner.max_calibration_iterations
        );
        assert_eq!(config.output.format, defaults.output.format);
    }

    #[test]
    fn test_to_suite_config() {
        let mut config = HashBenchConfig::default();
        config.runner.min_batch_duration = "20ms".to_string();
        config.runner.max_time = "1s".to_string();

        let suite = config.to_suite_config().unwrap();
        assert_eq!(suite.min_batch_duration_ns, 20_000_000);
        assert_eq!(suite.max_wall_time_ns, 1_000_000_000);
        assert!(suite.validate().is_ok());

        config.runner.max_time = "soon".to_string();
        assert!(config.to_suite_config().is_err());
    }

    #[test]
    fn test_find_config_file() {
        let root = std::env::temp_dir().join(format!("hashbench-config-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "[corpus]\nseed = 3\n").unwrap();

        let found = HashBenchConfig::find_config_file(&nested).unwrap();
        assert_eq!(found, root.join(CONFIG_FILE_NAME));
        assert_eq!(HashBenchConfig::load(&found).unwrap().corpus.seed, Some(3));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
