//! System Metadata Collection
//!
//! Collects host information and the measurement settings for the report
//! metadata. Linux-specific data (CPU model) gracefully degrades on other
//! platforms, returning "Unknown".

use super::execution::SuiteConfig;
use chrono::Utc;
use hashbench_report::{ReportMeta, SystemInfo};

/// Build report metadata from the run settings and host details
pub fn build_report_meta(
    config: &SuiteConfig,
    corpus_seed: Option<u64>,
    clock_resolution_ns: u64,
) -> ReportMeta {
    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
    };

    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        corpus_seed,
        system,
        config: config.report_config(clock_resolution_ns),
    }
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Get number of available CPU cores
fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}
