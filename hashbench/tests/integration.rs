//! Integration tests for HashBench
//!
//! These tests verify the end-to-end behavior of the measurement engine.
//! Most use a `ManualClock` that candidates advance themselves, so timings and
//! therefore rankings are exact.

use hashbench::{
    ALGORITHMS, Calibrator, CancellationToken, CorpusGenerator, FailureReason, JsonReporter,
    ManualClock, MemoryReporter, MonotonicClock, Orchestrator, OutlierFilter, Ranking, Reporter,
    RunningStats, Suite, SuiteConfig, SuiteError, build_suite,
};
use hashbench_report::{ReportConfig, ReportMeta, SystemInfo};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

fn manual_config() -> SuiteConfig {
    SuiteConfig {
        min_batch_duration_ns: 10_000,
        max_wall_time_ns: u64::MAX,
        max_samples: 50,
        pin_cpu: false,
        ..SuiteConfig::default()
    }
}

/// Suite whose candidates cost a fixed number of manual nanoseconds per call
fn costed_suite(size: usize, clock: &ManualClock, costs: &[(&str, u64)]) -> Suite {
    let mut suite = Suite::for_size(size);
    for &(name, cost) in costs {
        let clock = clock.clone();
        suite
            .register(name, move |_: &[u8]| clock.advance(cost))
            .unwrap();
    }
    suite
}

fn assert_ranking_invariants(ranking: &Ranking, min_samples: u64) {
    for pair in ranking.results.windows(2) {
        assert!(pair[0].ops_per_sec >= pair[1].ops_per_sec);
    }
    for result in &ranking.results {
        assert!(ranking.failures.iter().all(|f| f.candidate != result.candidate));
        assert_eq!(result.margin_of_error_pct.is_some(), result.sample_count >= 2);
        if let Some(moe) = result.margin_of_error_pct {
            assert!(moe >= 0.0);
        }
        if !result.low_confidence {
            assert!(result.sample_count >= min_samples);
        }
    }
}

/// Results are ordered by throughput across every suite of a run
#[test]
fn test_ranking_order_across_sizes() {
    let clock = ManualClock::new();
    let orchestrator = Orchestrator::new(manual_config(), clock.clone())
        .with_corpus_generator(CorpusGenerator::new(Some(3)));
    let mut reporter = MemoryReporter::new();

    let rankings = orchestrator
        .run_sizes(
            &[16, 256],
            |size| {
                Ok(costed_suite(
                    size,
                    &clock,
                    &[("slow", 3_000), ("fast", 700), ("mid", 1_500)],
                ))
            },
            &mut reporter,
        )
        .unwrap();
    reporter.finish().unwrap();

    assert_eq!(rankings.len(), 2);
    for ranking in &rankings {
        assert_eq!(ranking.order(), vec!["fast", "mid", "slow"]);
        assert_ranking_invariants(ranking, manual_config().min_samples);
    }
    assert_eq!(reporter.rankings(), rankings.as_slice());
    assert!(reporter.is_finished());
}

/// A spike far outside a steady window is rejected
#[test]
fn test_outlier_window() {
    let mut filter = OutlierFilter::new(8, 3.0);
    let mut stats = RunningStats::new(0.95);

    for value in [10.0, 10.0, 10.0, 10.0, 1000.0] {
        if !filter.observe(value).is_outlier() {
            stats.push(value);
        }
    }

    assert_eq!(filter.rejected(), 1);
    assert_eq!(stats.count(), 4);
    assert!((stats.mean() - 10.0).abs() < 1e-12);
}

/// Doubling from one call reaches a quarter-batch candidate at 4 calls
#[test]
fn test_calibrator_growth() {
    let min_batch = 1_000_000;
    let clock = ManualClock::new();
    let suite = costed_suite(1, &clock, &[("quarter", min_batch / 4)]);

    let calibration = Calibrator::new(min_batch, 2, 1 << 30)
        .calibrate(&suite.candidates()[0], &[0], &clock)
        .unwrap();

    assert!((4..=8).contains(&calibration.iterations));
    assert_eq!(calibration.iterations, 4);
    assert!(calibration.first_batch.elapsed_nanos >= min_batch);
}

/// Identical samples have zero variance and a zero margin of error
#[test]
fn test_constant_samples_statistics() {
    let mut stats = RunningStats::new(0.95);
    for _ in 0..4 {
        stats.push(100.0);
    }

    assert!((stats.mean() - 100.0).abs() < f64::EPSILON);
    assert_eq!(stats.variance(), 0.0);
    assert_eq!(stats.margin_of_error_pct(), Some(0.0));
    assert!(stats.is_precise(1.0));
}

/// Same seed and same deterministic candidates give the same ranking
#[test]
fn test_idempotent_runs() {
    let run = || {
        let clock = ManualClock::new();
        let orchestrator = Orchestrator::new(manual_config(), clock.clone())
            .with_corpus_generator(CorpusGenerator::new(Some(99)));
        let rankings = orchestrator
            .run_sizes(
                &[100, 1_000],
                |size| {
                    let mut suite = Suite::for_size(size);
                    let c = clock.clone();
                    // Cost depends on the corpus contents
                    suite.register("bytesum", move |input: &[u8]| {
                        let sum: u64 = input.iter().map(|&b| b as u64).sum();
                        c.advance(100 + sum % 1_000);
                    })?;
                    let c = clock.clone();
                    suite.register("flat", move |_: &[u8]| c.advance(600))?;
                    Ok(suite)
                },
                &mut MemoryReporter::new(),
            )
            .unwrap();
        rankings
            .iter()
            .map(|r| r.order().into_iter().map(String::from).collect::<Vec<_>>())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

/// Cancelling inside candidate 2 of 3 keeps candidate 1 and skips the rest of the run
#[test]
fn test_cancellation_skips_remaining_work() {
    let clock = ManualClock::new();
    let token = CancellationToken::new();
    let orchestrator = Orchestrator::new(manual_config(), clock.clone())
        .with_cancellation(token.clone())
        .with_corpus_generator(CorpusGenerator::new(Some(1)));
    let mut reporter = MemoryReporter::new();

    let rankings = orchestrator
        .run_sizes(
            &[8, 64, 512],
            |size| {
                let mut suite = costed_suite(size, &clock, &[("first", 1_000)]);
                let (t, c) = (token.clone(), clock.clone());
                suite.register("second", move |_: &[u8]| {
                    t.cancel();
                    c.advance(1_000);
                })?;
                let c = clock.clone();
                suite.register("third", move |_: &[u8]| c.advance(1_000))?;
                Ok(suite)
            },
            &mut reporter,
        )
        .unwrap();

    assert_eq!(rankings.len(), 1);
    let ranking = &rankings[0];
    assert!(ranking.cancelled);
    assert_eq!(ranking.order(), vec!["first"]);
    assert!(ranking.failures.is_empty());
    assert_eq!(reporter.rankings().len(), 1);
}

/// Cancellation reaches a candidate that is still calibrating on the wall clock
#[test]
fn test_cancellation_interrupts_calibration() {
    let token = CancellationToken::new();
    let after_cancel = Arc::new(AtomicU64::new(0));
    let mut suite = Suite::for_size(8);
    let (t, n) = (token.clone(), after_cancel.clone());
    suite
        .register("trivial", move |input: &[u8]| {
            if t.is_cancelled() {
                n.fetch_add(1, Ordering::Relaxed);
            }
            t.cancel();
            input.len()
        })
        .unwrap();

    let config = SuiteConfig {
        min_batch_duration_ns: 50_000_000,
        max_wall_time_ns: 60_000_000_000,
        pin_cpu: false,
        ..SuiteConfig::default()
    };
    let corpus = CorpusGenerator::new(Some(9)).generate(8);
    let ranking = Orchestrator::new(config, MonotonicClock::new())
        .with_cancellation(token)
        .measure_suite(&suite, &corpus)
        .unwrap();

    assert!(ranking.cancelled);
    assert!(ranking.results.is_empty());
    assert!(after_cancel.load(Ordering::Relaxed) < 1_000);
}

/// A candidate too fast for a coarse clock times out; the others still rank
#[test]
fn test_calibration_timeout_on_coarse_clock() {
    let clock = ManualClock::with_resolution(1_000_000);
    let mut suite = Suite::for_size(32);
    suite.register("noop", |_: &[u8]| ()).unwrap();
    let c = clock.clone();
    suite
        .register("millis", move |_: &[u8]| c.advance(1_000_000))
        .unwrap();

    let config = SuiteConfig {
        max_calibration_iterations: 1_024,
        ..manual_config()
    };
    let corpus = CorpusGenerator::new(Some(5)).generate(32);
    let ranking = Orchestrator::new(config, clock.clone())
        .measure_suite(&suite, &corpus)
        .unwrap();

    assert_eq!(ranking.failures.len(), 1);
    assert_eq!(ranking.failures[0].candidate, "noop");
    assert_eq!(ranking.failures[0].reason, FailureReason::CalibrationTimeout);
    assert_eq!(ranking.order(), vec!["millis"]);
    assert!(ranking.has_results());
}

/// Suite setup errors are raised before any timing
#[test]
fn test_suite_errors() {
    let clock = ManualClock::new();
    let orchestrator = Orchestrator::new(manual_config(), clock.clone());
    let mut reporter = MemoryReporter::new();

    let empty = Suite::for_size(8);
    let corpus = CorpusGenerator::new(Some(1)).generate(8);
    let err = orchestrator
        .run_suite(&empty, &corpus, &mut reporter)
        .unwrap_err();
    assert!(matches!(err, SuiteError::EmptySuite(_)));

    let mut suite = Suite::for_size(8);
    suite.register("a", |_: &[u8]| ()).unwrap();
    assert!(matches!(
        suite.register("a", |_: &[u8]| ()),
        Err(SuiteError::DuplicateCandidate(_))
    ));

    let bad = Orchestrator::new(
        SuiteConfig {
            confidence_level: 1.5,
            ..manual_config()
        },
        clock,
    );
    assert!(matches!(
        bad.run_sizes(&[8], |size| Ok(Suite::for_size(size)), &mut reporter),
        Err(SuiteError::InvalidConfig(_))
    ));
    assert!(reporter.rankings().is_empty());
}

/// The real hash candidates run end to end on the wall clock
#[test]
fn test_real_hashes_on_wall_clock() {
    let selected: Vec<_> = ALGORITHMS
        .iter()
        .filter(|a| a.name.starts_with("xxh") || a.name == "blake3")
        .collect();
    let config = SuiteConfig {
        min_batch_duration_ns: 1_000_000,
        max_wall_time_ns: 100_000_000,
        max_samples: 20,
        min_samples: 3,
        target_moe_pct: 5.0,
        pin_cpu: false,
        ..SuiteConfig::default()
    };
    let orchestrator = Orchestrator::new(config, MonotonicClock::new())
        .with_corpus_generator(CorpusGenerator::new(Some(2024)));

    let rankings = orchestrator
        .run_sizes(&[4_096], |size| build_suite(size, &selected), &mut MemoryReporter::new())
        .unwrap();

    let ranking = &rankings[0];
    assert_eq!(ranking.label, "4096 bytes");
    assert_eq!(ranking.results.len(), 4);
    assert_ranking_invariants(ranking, 3);
    for result in &ranking.results {
        assert!(result.ops_per_sec > 0.0 && result.ops_per_sec.is_finite());
        assert!(result.iterations_per_batch >= 1);
        assert!((result.throughput_bytes_per_sec - result.ops_per_sec * 4_096.0).abs() < 1.0);
    }
}

/// The JSON reporter emits one document holding every ranking
#[test]
fn test_json_report_document() {
    let meta = ReportMeta {
        version: "test".to_string(),
        timestamp: chrono_now(),
        corpus_seed: Some(8),
        system: SystemInfo {
            os: "test".to_string(),
            arch: "test".to_string(),
            cpu: "test".to_string(),
            cpu_cores: 1,
        },
        config: ReportConfig {
            min_batch_duration_ns: 10_000,
            target_moe_pct: 1.0,
            min_samples: 5,
            max_samples: 50,
            max_wall_time_ns: u64::MAX,
            outlier_threshold_k: 3.0,
            confidence_level: 0.95,
            clock_resolution_ns: 1,
        },
    };

    let clock = ManualClock::new();
    let orchestrator = Orchestrator::new(manual_config(), clock.clone())
        .with_corpus_generator(CorpusGenerator::new(Some(8)));
    let mut reporter = JsonReporter::new(Vec::new(), meta);
    orchestrator
        .run_sizes(
            &[10, 20],
            |size| Ok(costed_suite(size, &clock, &[("a", 900), ("b", 400)])),
            &mut reporter,
        )
        .unwrap();
    reporter.finish().unwrap();

    let value: serde_json::Value = serde_json::from_slice(&reporter.into_inner()).unwrap();
    assert_eq!(value["rankings"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["rankings"][0]["results"][0]["candidate"], "b");
    assert_eq!(value["summary"]["results"], 4);
    assert_eq!(value["meta"]["corpus_seed"], 8);
}

fn chrono_now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
