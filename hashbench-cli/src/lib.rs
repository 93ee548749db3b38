#![warn(missing_docs)]
//! HashBench CLI Library
//!
//! Command-line harness around the measurement engine: configuration
//! discovery, candidate selection, corpus generation, suite orchestration and
//! report output. The `hashbench` binary calls [`run`].
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<std::process::ExitCode> {
//!     hashbench_cli::run()
//! }
//! ```

mod candidates;
mod config;
mod executor;
mod planner;

pub use candidates::{ALGORITHMS, HashAlgorithm, build_suite, find_algorithm};
pub use config::*;
pub use executor::{
    CHUNK_SIZE, Corpus, CorpusGenerator, HumanReporter, Orchestrator, SuiteConfig,
    build_report_meta, format_human_output,
};
pub use planner::{ExecutionPlan, MAX_INPUT_SIZE, build_plan, check_size, default_sizes, parse_size};

use anyhow::Context;
use clap::Parser;
use hashbench_core::{CancellationToken, Clock, MonotonicClock};
use hashbench_report::{
    CsvReporter, JsonReporter, OutputFormat, ReportSummary, Reporter, format_duration_ns,
};
use regex::Regex;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// HashBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "hashbench")]
#[command(author, version, about = "HashBench - adaptive micro-benchmarks for hash functions")]
pub struct Cli {
    /// Input sizes in bytes (e.g. 1024, 1e6, 64KiB); powers of ten up to 1e8 by default
    #[arg(value_parser = parse_size)]
    pub sizes: Vec<usize>,

    /// Only run candidates whose name matches this regex
    #[arg(long)]
    pub filter: Option<String>,

    /// Output format: human, json, csv
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Corpus seed for reproducible inputs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Configuration file (default: discover hashbench.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum duration of one timed batch (e.g. "50ms")
    #[arg(long)]
    pub min_batch: Option<String>,

    /// Target margin of error in percent
    #[arg(long)]
    pub target_moe: Option<f64>,

    /// Samples required before the precision target may stop a candidate
    #[arg(long)]
    pub min_samples: Option<u64>,

    /// Maximum batches per candidate
    #[arg(long)]
    pub max_samples: Option<u64>,

    /// Maximum wall time per candidate (e.g. "5s")
    #[arg(long)]
    pub max_time: Option<String>,

    /// Outlier threshold in MADs
    #[arg(long)]
    pub outlier_k: Option<f64>,

    /// Confidence level of the margin of error
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Cancel the run after this long (e.g. "10m"); finished results are still reported
    #[arg(long)]
    pub deadline: Option<String>,

    /// Do not pin the measuring thread to a CPU
    #[arg(long)]
    pub no_pin: bool,

    /// List the selected candidates and sizes without running
    #[arg(long)]
    pub list: bool,

    /// Print a default hashbench.toml and exit
    #[arg(long)]
    pub init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the HashBench CLI with the process arguments.
///
/// # Returns
/// Exit code 1 when any suite produced no valid result, 0 otherwise.
pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the HashBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    init_logging(cli.verbose);

    if cli.init_config {
        print!("{}", HashBenchConfig::default_toml());
        return Ok(ExitCode::SUCCESS);
    }

    // Explicit --config wins over discovery; CLI flags override either
    let config = match &cli.config {
        Some(path) => HashBenchConfig::load(path)?,
        None => HashBenchConfig::discover()?.unwrap_or_default(),
    };

    let filter = cli
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --filter pattern")?;

    let sizes = if cli.sizes.is_empty() {
        config.corpus.sizes.clone().unwrap_or_else(default_sizes)
    } else {
        cli.sizes.clone()
    };
    let sizes = sizes
        .into_iter()
        .map(check_size)
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::msg)?;

    let plan = build_plan(ALGORITHMS.iter(), sizes, filter.as_ref());

    if cli.list {
        list_plan(&plan);
        return Ok(ExitCode::SUCCESS);
    }
    if plan.algorithms.is_empty() {
        anyhow::bail!("no hash candidates match the filter");
    }

    let suite_config = build_suite_config(&cli, &config)?;
    suite_config.validate()?;

    let format_name = cli.format.clone().unwrap_or_else(|| config.output.format.clone());
    let format: OutputFormat = format_name.parse().map_err(anyhow::Error::msg)?;

    let output_path = cli.output.clone().or_else(|| config.output.path.clone().map(PathBuf::from));
    let writer: Box<dyn Write> = match &output_path {
        Some(path) => Box::new(BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    let generator = CorpusGenerator::new(cli.seed.or(config.corpus.seed));
    let clock = MonotonicClock::new();
    tracing::info!(
        seed = generator.seed(),
        clock_resolution_ns = clock.resolution_ns(),
        candidates = plan.algorithms.len(),
        suites = plan.sizes.len(),
        "Starting HashBench"
    );

    let mut reporter: Box<dyn Reporter> = match format {
        OutputFormat::Human => Box::new(HumanReporter::new(writer)),
        OutputFormat::Json => Box::new(JsonReporter::new(
            writer,
            build_report_meta(&suite_config, Some(generator.seed()), clock.resolution_ns()),
        )),
        OutputFormat::Csv => Box::new(CsvReporter::new(writer)),
    };

    let cancellation = CancellationToken::new();
    if let Some(deadline) = &cli.deadline {
        let deadline_ns = HashBenchConfig::parse_duration(deadline).context("invalid --deadline")?;
        spawn_deadline_watchdog(Duration::from_nanos(deadline_ns), cancellation.clone());
    }

    let orchestrator = Orchestrator::new(suite_config, clock)
        .with_cancellation(cancellation)
        .with_progress(!cli.verbose)
        .with_corpus_generator(generator);

    let rankings = orchestrator.run_sizes(
        &plan.sizes,
        |size| build_suite(size, &plan.algorithms),
        reporter.as_mut(),
    )?;
    reporter.finish()?;

    let summary = ReportSummary::from_rankings(&rankings);
    tracing::info!(
        suites = summary.suites,
        results = summary.results,
        failures = summary.failures,
        low_confidence = summary.low_confidence,
        cancelled = summary.cancelled,
        "Run complete in {}",
        format_duration_ns(summary.total_duration_ms * 1_000_000.0)
    );

    if let Some(path) = &output_path {
        eprintln!("Report written to: {}", path.display());
    }

    if summary.empty_suites > 0 {
        tracing::warn!(
            empty_suites = summary.empty_suites,
            "Some suites produced no valid result"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Initialize logging on stderr so stdout stays clean for reports
fn init_logging(verbose: bool) {
    let filter = if verbose { "hashbench=debug" } else { "hashbench=info" };
    // A subscriber may already be installed when embedded; keep it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build a SuiteConfig by layering: hashbench.toml defaults → CLI overrides.
fn build_suite_config(cli: &Cli, config: &HashBenchConfig) -> anyhow::Result<SuiteConfig> {
    let mut suite = config.to_suite_config()?;

    if let Some(min_batch) = &cli.min_batch {
        suite.min_batch_duration_ns =
            HashBenchConfig::parse_duration(min_batch).context("invalid --min-batch")?;
    }
    if let Some(max_time) = &cli.max_time {
        suite.max_wall_time_ns =
            HashBenchConfig::parse_duration(max_time).context("invalid --max-time")?;
    }
    if let Some(target) = cli.target_moe {
        suite.target_moe_pct = target;
    }
    if let Some(min_samples) = cli.min_samples {
        suite.min_samples = min_samples;
    }
    if let Some(max_samples) = cli.max_samples {
        suite.max_samples = max_samples;
    }
    if let Some(k) = cli.outlier_k {
        suite.outlier_threshold_k = k;
    }
    if let Some(confidence) = cli.confidence {
        suite.confidence_level = confidence;
    }
    if cli.no_pin {
        suite.pin_cpu = false;
    }

    Ok(suite)
}

/// Trip `token` once `deadline` has passed
fn spawn_deadline_watchdog(deadline: Duration, token: CancellationToken) {
    std::thread::spawn(move || {
        std::thread::sleep(deadline);
        if !token.is_cancelled() {
            tracing::warn!(deadline_ms = deadline.as_millis() as u64, "Deadline reached, cancelling");
            token.cancel();
        }
    });
}

fn list_plan(plan: &ExecutionPlan) {
    println!("HashBench Plan:");
    println!("├── candidates:");
    for algorithm in &plan.algorithms {
        let kind = if algorithm.cryptographic { "cryptographic" } else { "non-cryptographic" };
        println!("│   ├── {} ({}, {})", algorithm.name, algorithm.provider, kind);
    }
    println!("├── sizes:");
    for size in &plan.sizes {
        println!("│   ├── {} bytes", size);
    }
    println!(
        "{} candidates × {} sizes.",
        plan.algorithms.len(),
        plan.sizes.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "hashbench",
            "1k",
            "64KiB",
            "--filter",
            "^xxh",
            "--format",
            "json",
            "--seed",
            "42",
            "--min-batch",
            "10ms",
            "--no-pin",
        ])
        .unwrap();

        assert_eq!(cli.sizes, vec![1_000, 65_536]);
        assert_eq!(cli.filter.as_deref(), Some("^xxh"));
        assert_eq!(cli.seed, Some(42));
        assert!(cli.no_pin);
        assert!(!cli.list);
    }

    #[test]
    fn test_cli_rejects_bad_size() {
        assert!(Cli::try_parse_from(["hashbench", "0"]).is_err());
        assert!(Cli::try_parse_from(["hashbench", "lots"]).is_err());
        assert!(Cli::try_parse_from(["hashbench", "16GiB"]).is_err());
    }

    #[test]
    fn test_oversized_config_size_rejected() {
        let path = std::env::temp_dir().join(format!("hashbench-sizes-{}.toml", std::process::id()));
        std::fs::write(&path, "[corpus]\nsizes = [64, 2147483648]\n").unwrap();

        let cli = Cli::try_parse_from(["hashbench", "--config", path.to_str().unwrap()]).unwrap();
        let err = run_with_cli(cli).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(err.to_string().contains("limit"), "{err}");
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "hashbench",
            "--min-batch",
            "10ms",
            "--max-time",
            "2s",
            "--target-moe",
            "0.5",
            "--outlier-k",
            "4",
            "--no-pin",
        ])
        .unwrap();
        let mut config = HashBenchConfig::default();
        config.runner.max_samples = 42;

        let suite = build_suite_config(&cli, &config).unwrap();
        assert_eq!(suite.min_batch_duration_ns, 10_000_000);
        assert_eq!(suite.max_wall_time_ns, 2_000_000_000);
        assert!((suite.target_moe_pct - 0.5).abs() < f64::EPSILON);
        assert!((suite.outlier_threshold_k - 4.0).abs() < f64::EPSILON);
        assert_eq!(suite.max_samples, 42);
        assert!(!suite.pin_cpu);
    }

    #[test]
    fn test_invalid_cli_duration() {
        let cli = Cli::try_parse_from(["hashbench", "--min-batch", "quickly"]).unwrap();
        assert!(build_suite_config(&cli, &HashBenchConfig::default()).is_err());
    }

    #[test]
    fn test_deadline_watchdog() {
        let token = CancellationToken::new();
        spawn_deadline_watchdog(Duration::from_millis(10), token.clone());

        let start = std::time::Instant::now();
        while !token.is_cancelled() && start.elapsed() < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(token.is_cancelled());
    }
}
