//! Abort integration tests.
//!
//! Deadline and interrupt handling: the racing group is stopped and marked
//! aborted, later groups never run, every group is still recorded, and runs
//! never interleave.

use crate::mocks::*;
use certcheck::engine::check::{Check, CheckResult, Verdict};
use certcheck::engine::interrupt::{AbortReason, Interrupts};
use certcheck::engine::registry::Registry;
use certcheck::engine::runner::Runner;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LONG: Duration = Duration::from_secs(5);

struct Fixture {
    registry: Registry,
    slow_acknowledged: CallCounter,
    b_calls: CallCounter,
    c_calls: CallCounter,
}

/// G1 = {A (runs until stopped), B}, G2 = {C}.
fn slow_first_group() -> Fixture {
    let slow_acknowledged = CallCounter::new();
    let b_calls = CallCounter::new();
    let c_calls = CallCounter::new();

    let mut registry = Registry::new();
    registry
        .add_check(slow_check("G1", "A", LONG, &slow_acknowledged))
        .unwrap();
    registry
        .add_check(counted_check("G1", "B", Verdict::Fail("bad".to_string()), &b_calls))
        .unwrap();
    registry
        .add_check(counted_check("G2", "C", Verdict::Pass, &c_calls))
        .unwrap();

    Fixture {
        registry,
        slow_acknowledged,
        b_calls,
        c_calls,
    }
}

fn assert_all_aborted(runner: &Runner, reason: &str) {
    for group in runner.groups() {
        for check in group.checks() {
            let state = check.snapshot().state;
            assert_eq!(state.result, CheckResult::Skipped, "check {}", check.id());
            assert_eq!(state.failure_reason, reason, "check {}", check.id());
        }
    }
    let results = runner.results();
    assert_eq!(results.len(), 3);
    for record in results.values() {
        assert_eq!(record.state, "skipped");
        assert_eq!(record.failure_reason, reason);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deadline_aborts_current_and_later_groups() {
    let fixture = slow_first_group();
    let reporter = CapturingReporter::new();
    let runner = Runner::new(fixture.registry, catalog_for(&["A", "B", "C"]))
        .with_reporter(reporter.clone())
        .with_grace_period(LONG);

    let report = runner
        .run_checks("", Duration::from_millis(100))
        .await
        .unwrap();

    assert_eq!(report.aborted, Some(AbortReason::GlobalTimeout));
    assert_eq!(report.summary.counts("G1"), Some([0, 0, 2]));
    assert_eq!(report.summary.counts("G2"), Some([0, 0, 1]));
    assert!(report.failed_logs.is_empty());
    assert_all_aborted(&runner, "global time-out");

    // A saw the stop signal and the runner waited for it; B and C never ran.
    assert_eq!(fixture.slow_acknowledged.get(), 1);
    assert_eq!(fixture.b_calls.get(), 0);
    assert_eq!(fixture.c_calls.get(), 0);

    // Summary is still reported on an aborted run.
    assert_eq!(reporter.calls().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_interrupt_aborts_with_interrupt_reason() {
    let (handle, interrupts) = Interrupts::channel();
    let acknowledged = CallCounter::new();
    let c_calls = CallCounter::new();

    let mut registry = Registry::new();
    let ack = acknowledged.clone();
    registry
        .add_check(Check::new("G1", "A", move |ctx| {
            handle.interrupt();
            if wait_for_cancel(ctx, LONG) {
                ack.hit();
            }
            Ok(Verdict::Pass)
        }))
        .unwrap();
    registry.add_check(passing_check("G1", "B")).unwrap();
    registry
        .add_check(counted_check("G2", "C", Verdict::Pass, &c_calls))
        .unwrap();

    let runner = Runner::new(registry, catalog_for(&["A", "B", "C"]))
        .with_interrupts(interrupts)
        .with_grace_period(LONG);

    let report = runner.run_checks("", LONG).await.unwrap();

    assert_eq!(report.aborted, Some(AbortReason::Interrupt));
    assert_all_aborted(&runner, "interrupt");
    assert_eq!(acknowledged.get(), 1);
    assert_eq!(c_calls.get(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_before_abort_keep_their_results() {
    let mut registry = Registry::new();
    registry.add_check(passing_check("G0", "done")).unwrap();
    registry
        .add_check(slow_check("G1", "A", LONG, &CallCounter::new()))
        .unwrap();
    registry.add_check(passing_check("G2", "C")).unwrap();
    let runner = Runner::new(registry, catalog_for(&["done", "A", "C"])).with_grace_period(LONG);

    let report = runner
        .run_checks("", Duration::from_millis(150))
        .await
        .unwrap();

    assert_eq!(report.summary.counts("G0"), Some([1, 0, 0]));
    assert_eq!(report.summary.counts("G1"), Some([0, 0, 1]));
    assert_eq!(report.summary.counts("G2"), Some([0, 0, 1]));
    assert_eq!(runner.results()["done"].state, "passed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unresponsive_group_left_after_grace_period() {
    let mut registry = Registry::new();
    registry
        .add_check(Check::new("G1", "stubborn", |_| {
            std::thread::sleep(Duration::from_millis(800));
            Ok(Verdict::Pass)
        }))
        .unwrap();
    registry.add_check(passing_check("G2", "C")).unwrap();
    let runner = Runner::new(registry, catalog_for(&["stubborn", "C"])).with_grace_period(Duration::from_millis(20));

    let started = std::time::Instant::now();
    let report = runner
        .run_checks("", Duration::from_millis(50))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_millis(700));
    assert_eq!(report.aborted, Some(AbortReason::GlobalTimeout));
    assert_eq!(runner.results()["stubborn"].state, "skipped");
    assert_eq!(runner.results()["C"].state, "skipped");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_late_result_does_not_overwrite_abort() {
    let mut registry = Registry::new();
    registry
        .add_check(Check::new("G1", "late", |ctx| {
            wait_for_cancel(ctx, LONG);
            ctx.log("finished after stop");
            Ok(Verdict::Fail("too late".to_string()))
        }))
        .unwrap();
    let runner = Runner::new(registry, catalog_for(&["late"])).with_grace_period(LONG);

    runner
        .run_checks("", Duration::from_millis(50))
        .await
        .unwrap();

    let record = &runner.results()["late"];
    assert_eq!(record.state, "skipped");
    assert_eq!(record.failure_reason, "global time-out");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_runs_are_serialized() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    let log = Arc::clone(&events);
    registry
        .add_check(Check::new("G", "S", move |_| {
            log.lock().unwrap().push("start");
            std::thread::sleep(Duration::from_millis(100));
            log.lock().unwrap().push("end");
            Ok(Verdict::Pass)
        }))
        .unwrap();
    let runner = Arc::new(Runner::new(registry, catalog_for(&["S"])));

    let first = tokio::spawn({
        let runner = Arc::clone(&runner);
        async move { runner.run_checks("", LONG).await.map(|r| r.summary) }
    });
    let second = tokio::spawn({
        let runner = Arc::clone(&runner);
        async move { runner.run_checks("", LONG).await.map(|r| r.summary) }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(*events.lock().unwrap(), vec!["start", "end", "start", "end"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_abort_does_not_carry_into_next_run() {
    let (handle, interrupts) = Interrupts::channel();
    let mut registry = Registry::new();
    registry.add_check(passing_check("G", "P")).unwrap();
    let runner = Runner::new(registry, catalog_for(&["P"])).with_interrupts(interrupts);

    // Raised while idle: discarded when the next run starts.
    handle.interrupt();

    let report = runner.run_checks("", LONG).await.unwrap();
    assert!(report.aborted.is_none());
    assert_eq!(report.summary.counts("G"), Some([1, 0, 0]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_left_behind_check_cannot_write_into_next_run() {
    let calls = CallCounter::new();
    let counted = calls.clone();
    let mut registry = Registry::new();
    registry
        .add_check(Check::new("G", "X", move |ctx| {
            let first = counted.get() == 0;
            counted.hit();
            if first {
                // Ignores the stop signal and outlives the grace period.
                std::thread::sleep(Duration::from_millis(400));
                ctx.log("from run 1");
                Ok(Verdict::Fail("stale result from run 1".to_string()))
            } else {
                std::thread::sleep(Duration::from_millis(600));
                Ok(Verdict::Pass)
            }
        }))
        .unwrap();
    let runner = Runner::new(registry, catalog_for(&["X"])).with_grace_period(Duration::from_millis(10));

    let first = runner
        .run_checks("", Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(first.aborted, Some(AbortReason::GlobalTimeout));

    let second = runner.run_checks("", LONG).await.unwrap();

    assert!(second.aborted.is_none());
    assert_eq!(second.summary.counts("G"), Some([1, 0, 0]));
    assert!(second.failed_logs.is_empty());
    let record = &runner.results()["X"];
    assert_eq!(record.state, "passed");
    assert!(record.failure_reason.is_empty());
    assert!(!record.captured_test_output.contains("from run 1"));
    assert_eq!(calls.get(), 2);
}
