//! End-to-end tests of the two-phase reduction

mod common;

use common::*;
use phased_core::{Error, ReductionConfig};
use phased_reduce::{reference, Orchestrator, Phase, RecordingHandler, ReductionEvent};
use statrs::statistics::Statistics;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_reference_scenario_nine_threads() {
    let seq = reference_sequence();
    let expected = reference::serial(&seq).unwrap();

    let summary = Orchestrator::default().run(&seq, 9).unwrap();

    assert!(summary.agrees_within(&expected, REL_TOL));
    assert!(summary.agrees_floored(&expected));
    assert_eq!(summary.workers, 9);
    assert_eq!(summary.len, 1_000_000);
}

#[test]
fn test_matches_independent_statistics() {
    let data = generate_test_data(10_007, 11);
    let as_f64: Vec<f64> = data.iter().map(|&v| f64::from(v)).collect();

    let summary = Orchestrator::default().run(&data, 7).unwrap();

    assert_relative_eq!(summary.mean, as_f64.iter().mean(), max_relative = REL_TOL);
    assert_relative_eq!(
        summary.std_dev,
        as_f64.iter().population_std_dev(),
        max_relative = REL_TOL
    );
}

#[test]
fn test_many_thread_counts_agree() {
    let data = generate_test_data(4_099, 3);
    let expected = reference::serial(&data).unwrap();
    let orchestrator = Orchestrator::default();

    for workers in thread_counts() {
        let summary = orchestrator.run(&data, workers).unwrap();
        // Integer phase-1 sums make the mean independent of the split
        assert_eq!(summary.mean, expected.mean, "workers = {workers}");
        assert!(summary.agrees_within(&expected, REL_TOL), "workers = {workers}");
    }
}

#[test]
fn test_one_worker_matches_serial_exactly() {
    let data = generate_test_data(5_000, 5);
    let expected = reference::serial(&data).unwrap();

    let report = Orchestrator::default().run_detailed(&data, 1).unwrap();

    assert_eq!(report.summary.moments(), expected);
    assert!(report.workers[0].mean.is_finalizer);
    assert!(report.workers[0].std_dev.is_finalizer);
}

#[test]
fn test_one_element_per_worker() {
    let data = generate_test_data(64, 17);
    let expected = reference::serial(&data).unwrap();

    let report = Orchestrator::default().run_detailed(&data, 64).unwrap();

    assert!(report.workers.iter().all(|w| w.partition.len() == 1));
    assert!(report.summary.agrees_within(&expected, REL_TOL));
}

#[test]
fn test_exactly_one_finalizer_per_phase() {
    let data = generate_test_data(10_000, 23);

    for _ in 0..20 {
        let report = Orchestrator::default().run_detailed(&data, 8).unwrap();
        let mean_finalizers: Vec<_> = report
            .workers
            .iter()
            .filter(|w| w.mean.is_finalizer)
            .map(|w| w.worker)
            .collect();
        let std_dev_finalizers: Vec<_> = report
            .workers
            .iter()
            .filter(|w| w.std_dev.is_finalizer)
            .map(|w| w.worker)
            .collect();

        assert_eq!(mean_finalizers, vec![report.summary.mean_finalizer]);
        assert_eq!(std_dev_finalizers, vec![report.summary.std_dev_finalizer]);
        assert!(report.workers.iter().all(|w| w.mean.published == report.summary.mean));
        assert!(report
            .workers
            .iter()
            .all(|w| w.std_dev.published == report.summary.std_dev));
    }
}

#[test]
fn test_second_pass_never_starts_before_mean_is_published() {
    let data = generate_test_data(20_000, 29);
    let workers = 12;

    for _ in 0..10 {
        let recorder = Arc::new(RecordingHandler::new());
        let orchestrator = Orchestrator::default().with_handler(recorder.clone());
        orchestrator.run(&data, workers).unwrap();
        let events = recorder.events();

        let published_at = events
            .iter()
            .position(|e| matches!(e, ReductionEvent::PhasePublished { phase: Phase::Mean, .. }))
            .unwrap();
        let published_mean = match events[published_at] {
            ReductionEvent::PhasePublished { value, .. } => value,
            _ => unreachable!(),
        };

        let partials_before = events[..published_at]
            .iter()
            .filter(|e| matches!(e, ReductionEvent::PartialReady { phase: Phase::Mean, .. }))
            .count();
        assert_eq!(partials_before, workers);

        let second_passes: Vec<_> = events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match e {
                ReductionEvent::SecondPassStarted { mean, .. } => Some((i, *mean)),
                _ => None,
            })
            .collect();
        assert_eq!(second_passes.len(), workers);
        for (at, mean) in second_passes {
            assert!(at > published_at);
            assert_eq!(mean, published_mean);
        }

        let publications = events
            .iter()
            .filter(|e| matches!(e, ReductionEvent::PhasePublished { .. }))
            .count();
        assert_eq!(publications, 2);
        assert!(matches!(events.last(), Some(ReductionEvent::RunCompleted { .. })));
    }
}

#[test]
fn test_too_many_threads_rejected_before_spawning() {
    let data = generate_test_data(8, 1);
    let orchestrator = Orchestrator::default();

    let err = orchestrator.run(&data, 9).unwrap_err();

    assert!(matches!(err, Error::ThreadsExceedLength { threads: 9, len: 8 }));
    assert!(err.is_usage_error());
    assert_eq!(orchestrator.spawned(), 0);
}

#[test]
fn test_configured_limits_rejected_before_spawning() {
    let data = generate_test_data(100, 1);
    let orchestrator =
        Orchestrator::new(ReductionConfig::new().with_max_len(50).with_max_threads(2));

    assert!(matches!(
        orchestrator.run(&data, 2),
        Err(Error::SequenceTooLong { requested: 100, max: 50 })
    ));
    assert!(matches!(
        orchestrator.run(&data[..50], 3),
        Err(Error::TooManyThreads { requested: 3, max: 2 })
    ));
    assert!(orchestrator.run(&data, 0).is_err());
    assert_eq!(orchestrator.spawned(), 0);

    orchestrator.run(&data[..50], 2).unwrap();
    assert_eq!(orchestrator.spawned(), 2);
}

#[test]
fn test_wait_timeout_does_not_disturb_complete_runs() {
    let data = generate_test_data(3_001, 31);
    let expected = reference::serial(&data).unwrap();
    let config = ReductionConfig::new().with_wait_timeout(Duration::from_secs(30));

    let summary = Orchestrator::new(config).run(&data, 6).unwrap();

    assert!(summary.agrees_within(&expected, REL_TOL));
}
