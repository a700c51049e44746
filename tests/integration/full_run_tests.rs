//! Full run integration tests.
//!
//! Runs that complete without deadline or interrupt: group dispatch,
//! result aggregation, failed-check logs and error surfacing.

use crate::mocks::*;
use certcheck::engine::check::{Check, CheckResult, Verdict};
use certcheck::engine::group::ChecksGroup;
use certcheck::engine::registry::Registry;
use certcheck::engine::runner::Runner;
use certcheck::error::{GroupError, RunFailure};
use std::time::Duration;

const FAR_FUTURE: Duration = Duration::from_secs(3600);

fn two_group_registry() -> Registry {
    let mut registry = Registry::new();
    registry.add_check(passing_check("G1", "A")).unwrap();
    registry.add_check(failing_check("G1", "B", "B is broken")).unwrap();
    registry.add_check(passing_check("G2", "C")).unwrap();
    registry
}

#[tokio::test(flavor = "multi_thread")]
async fn test_two_groups_summary_and_failed_log() {
    let reporter = CapturingReporter::new();
    let runner = Runner::new(two_group_registry(), catalog_for(&["A", "B", "C"])).with_reporter(reporter.clone());

    let report = runner.run_checks("", FAR_FUTURE).await.unwrap();

    assert_eq!(report.summary.counts("G1"), Some([1, 1, 0]));
    assert_eq!(report.summary.counts("G2"), Some([1, 0, 0]));
    assert!(report.aborted.is_none());

    assert_eq!(report.failed_logs.len(), 1);
    assert_eq!(report.failed_logs[0].check_id, "B");
    assert_eq!(report.failed_logs[0].output, "B ran\n");

    let calls = reporter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, report.summary);
    assert_eq!(calls[0].1, report.failed_logs);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_group_runs_exactly_once() {
    let counters: Vec<CallCounter> = (0..4).map(|_| CallCounter::new()).collect();
    let mut registry = Registry::new();
    for (i, counter) in counters.iter().enumerate() {
        let group = format!("group-{}", i % 2);
        let id = format!("check-{}", i);
        registry
            .add_check(counted_check(&group, &id, Verdict::Pass, counter))
            .unwrap();
    }
    let runner = Runner::new(registry, catalog_for(&["check-0", "check-1", "check-2", "check-3"]));

    runner.run_checks("", FAR_FUTURE).await.unwrap();

    for counter in &counters {
        assert_eq!(counter.get(), 1);
    }
    for group in runner.groups() {
        for check in group.checks() {
            let state = check.snapshot().state;
            assert_eq!(state.result, CheckResult::Passed);
            assert!(state.failure_reason.is_empty());
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_run_in_registration_order() {
    let order = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    for group in ["zeta", "alpha", "mid"] {
        let order = std::sync::Arc::clone(&order);
        let name = group.to_string();
        registry
            .add_check(Check::new(group, format!("{}-check", group), move |_| {
                order.lock().unwrap().push(name.clone());
                Ok(Verdict::Pass)
            }))
            .unwrap();
    }
    let runner = Runner::new(registry, catalog_for(&["zeta-check", "alpha-check", "mid-check"]));

    runner.run_checks("", FAR_FUTURE).await.unwrap();
    runner.run_checks("", FAR_FUTURE).await.unwrap();

    assert_eq!(
        *order.lock().unwrap(),
        vec!["zeta", "alpha", "mid", "zeta", "alpha", "mid"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_checks_are_not_run_errors() {
    let mut registry = Registry::new();
    registry.add_check(failing_check("G", "F1", "nope")).unwrap();
    registry
        .add_check(Check::new("G", "E1", |_| Err("target unreachable".into())))
        .unwrap();
    let runner = Runner::new(registry, catalog_for(&["F1", "E1"]));

    let report = runner.run_checks("", FAR_FUTURE).await.unwrap();
    assert_eq!(report.summary.counts("G"), Some([0, 1, 0]));

    let results = runner.results();
    assert_eq!(results["F1"].state, "failed");
    assert_eq!(results["F1"].failure_reason, "nope");
    assert_eq!(results["E1"].state, "error");
    assert_eq!(results["E1"].failure_reason, "target unreachable");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_group_errors_aggregate_without_stopping_run() {
    let mut registry = Registry::new();
    registry
        .add_group(ChecksGroup::new("broken").with_before_all(|| Err("no client".to_string())))
        .unwrap();
    registry.add_check(passing_check("broken", "X")).unwrap();
    registry.add_check(Check::new("panicky", "P", |_| panic!("bug"))).unwrap();
    registry.add_check(passing_check("healthy", "H")).unwrap();
    let runner = Runner::new(registry, catalog_for(&["X", "P", "H"]));

    let err = runner.run_checks("", FAR_FUTURE).await.unwrap_err();

    assert_eq!(err.failures.len(), 2);
    assert!(matches!(err.failures[0], RunFailure::Group(GroupError::BeforeAll { .. })));
    assert!(matches!(err.failures[1], RunFailure::Group(GroupError::CheckPanicked { .. })));
    assert_eq!(err.to_string(), "2 errors found in checks/groups");

    assert_eq!(err.report.summary.counts("healthy"), Some([1, 0, 0]));
    let results = runner.results();
    assert_eq!(results.len(), 3);
    assert_eq!(results["X"].state, "error");
    assert_eq!(results["P"].state, "error");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_catalog_entry_does_not_stop_recording() {
    let runner = Runner::new(two_group_registry(), catalog_for(&["A", "C"]));

    let err = runner.run_checks("", FAR_FUTURE).await.unwrap_err();

    assert_eq!(err.failures.len(), 1);
    assert!(err.failures[0].to_string().contains("check B"));
    let results = runner.results();
    assert!(results.contains_key("A"));
    assert!(results.contains_key("C"));
    assert!(!results.contains_key("B"));
    assert_eq!(err.report.summary.counts("G1"), Some([1, 1, 0]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_group_inventory_skips() {
    let counter = CallCounter::new();
    let mut registry = Registry::new();
    registry
        .add_group(ChecksGroup::new("operator").with_skip_when(|| Some("No CSVs to perform test, skipping.".to_string())))
        .unwrap();
    registry
        .add_check(counted_check("operator", "O1", Verdict::Pass, &counter))
        .unwrap();
    registry
        .add_check(counted_check("operator", "O2", Verdict::Pass, &counter))
        .unwrap();
    let runner = Runner::new(registry, catalog_for(&["O1", "O2"]));

    let report = runner.run_checks("", FAR_FUTURE).await.unwrap();

    assert_eq!(counter.get(), 0);
    assert_eq!(report.summary.counts("operator"), Some([0, 0, 2]));
    assert_eq!(runner.results()["O1"].failure_reason, "No CSVs to perform test, skipping.");
}
