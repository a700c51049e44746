//! Run phase: one end-to-end pass over every group.
//!
//! Groups run strictly one at a time in registration order. Each group's
//! execution is raced against the run-wide deadline and operator
//! interrupts; the first to fire wins. Once a deadline or interrupt fires
//! the run is aborting for good: the racing group and every later group
//! have their remaining checks skipped with the abort reason. Every group
//! is recorded and reported regardless of how it exited.

use crate::catalog::Catalog;
use crate::engine::group::ChecksGroup;
use crate::engine::interrupt::{AbortReason, CancellationToken, Interrupts};
use crate::engine::recorder::{ResultRecord, ResultRecorder};
use crate::engine::registry::Registry;
use crate::engine::summary::{collect_failed_checks_logs, FailedCheckLog, ResultsSummary};
use crate::error::{GroupError, RunError, RunFailure};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Longer timeouts are clamped to this; it is treated as no deadline.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Receives the outcome of a run before it returns.
pub trait Reporter: Send + Sync {
    fn report(&self, summary: &ResultsSummary, failed_logs: &[FailedCheckLog]);
}

/// Reporter that drops everything.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _summary: &ResultsSummary, _failed_logs: &[FailedCheckLog]) {}
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub summary: ResultsSummary,
    pub failed_logs: Vec<FailedCheckLog>,
    pub aborted: Option<AbortReason>,
}

/// How a single group's race ended.
enum RaceOutcome {
    Completed(Vec<GroupError>),
    Aborted(AbortReason, JoinHandle<Vec<GroupError>>),
}

/// Owns the registered groups and the results store, and executes runs.
pub struct Runner {
    groups: Vec<Arc<ChecksGroup>>,
    recorder: ResultRecorder,
    reporter: Box<dyn Reporter>,
    grace_period: Duration,
    // Holding this lock is what makes a run exclusive.
    interrupts: Mutex<Interrupts>,
}

impl Runner {
    /// End registration. `catalog` enriches every recorded result.
    pub fn new(registry: Registry, catalog: Catalog) -> Self {
        Runner {
            groups: registry.into_groups().into_iter().map(Arc::new).collect(),
            recorder: ResultRecorder::new(Arc::new(catalog)),
            reporter: Box::new(NullReporter),
            grace_period: DEFAULT_GRACE_PERIOD,
            interrupts: Mutex::new(Interrupts::never()),
        }
    }

    /// Replace the default [`NullReporter`].
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Use `interrupts` instead of a source that never fires.
    pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
        self.interrupts = Mutex::new(interrupts);
        self
    }

    /// How long to wait for an aborted group to acknowledge the stop
    /// request before moving on.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Groups in run order.
    pub fn groups(&self) -> impl Iterator<Item = &ChecksGroup> {
        self.groups.iter().map(|group| group.as_ref())
    }

    /// Results store of the latest run.
    pub fn recorder(&self) -> &ResultRecorder {
        &self.recorder
    }

    /// Copy of the latest run's records, keyed by check identity.
    pub fn results(&self) -> BTreeMap<String, ResultRecord> {
        self.recorder.snapshot()
    }

    /// Latest run's records as a JSON object, for the claim document.
    pub fn reconciled_results(&self) -> serde_json::Map<String, serde_json::Value> {
        self.recorder.reconciled_results()
    }

    /// Per-group counts from the checks' current results.
    pub fn results_summary(&self) -> ResultsSummary {
        ResultsSummary::from_groups(self.groups())
    }

    /// Run every group once.
    ///
    /// Concurrent callers are serialized: a second call waits until the
    /// first has returned. Failed checks are results, not errors; the
    /// returned error lists group execution and recording failures only.
    pub async fn run_checks(&self, label_filter: &str, timeout: Duration) -> Result<RunReport, RunError> {
        let mut interrupts = self.interrupts.lock().await;
        interrupts.drain();

        for group in &self.groups {
            group.reset();
        }
        self.recorder.clear();

        let deadline = tokio::time::sleep_until(Instant::now() + timeout.min(MAX_TIMEOUT));
        tokio::pin!(deadline);

        tracing::info!(groups = self.groups.len(), label_filter, ?timeout, "running checks");

        let mut aborted: Option<AbortReason> = None;
        let mut failures: Vec<RunFailure> = Vec::new();

        for group in &self.groups {
            if let Some(reason) = aborted {
                group.on_abort(label_filter, reason.as_str());
            } else {
                let token = CancellationToken::new();
                let handle = spawn_group(Arc::clone(group), label_filter, token.clone());

                match race(group.name(), handle, deadline.as_mut(), &mut interrupts).await {
                    RaceOutcome::Completed(errors) => {
                        tracing::trace!(group = group.name(), "group finished running checks");
                        failures.extend(errors.into_iter().map(RunFailure::from));
                    }
                    RaceOutcome::Aborted(reason, handle) => {
                        match reason {
                            AbortReason::GlobalTimeout => tracing::warn!(group = group.name(), "running all checks timed out"),
                            AbortReason::Interrupt => tracing::warn!(group = group.name(), "SIGINT/SIGTERM received"),
                        }
                        token.cancel();
                        aborted = Some(reason);
                        group.on_abort(label_filter, reason.as_str());
                        failures.extend(self.await_stopped(group.name(), handle).await);
                    }
                }
            }

            failures.extend(
                group
                    .record_checks_results(&self.recorder)
                    .into_iter()
                    .map(RunFailure::from),
            );
        }

        let report = RunReport {
            summary: self.results_summary(),
            failed_logs: collect_failed_checks_logs(self.groups()),
            aborted,
        };
        self.reporter.report(&report.summary, &report.failed_logs);

        if failures.is_empty() {
            Ok(report)
        } else {
            tracing::error!(errors = ?failures, "run checks errors");
            Err(RunError { failures, report })
        }
    }

    /// Give an aborted group's task the grace period to notice its token.
    async fn await_stopped(&self, group: &str, handle: JoinHandle<Vec<GroupError>>) -> Vec<RunFailure> {
        match tokio::time::timeout(self.grace_period, handle).await {
            Ok(joined) => join_errors(group, joined)
                .into_iter()
                .map(RunFailure::from)
                .collect(),
            Err(_) => {
                tracing::warn!(
                    group,
                    grace_period = ?self.grace_period,
                    "group did not acknowledge stop request, leaving it running"
                );
                Vec::new()
            }
        }
    }
}

fn spawn_group(group: Arc<ChecksGroup>, label_filter: &str, token: CancellationToken) -> JoinHandle<Vec<GroupError>> {
    let label_filter = label_filter.to_string();
    tokio::task::spawn_blocking(move || group.run_checks(&label_filter, &token))
}

async fn race(
    group: &str,
    mut handle: JoinHandle<Vec<GroupError>>,
    deadline: std::pin::Pin<&mut tokio::time::Sleep>,
    interrupts: &mut Interrupts,
) -> RaceOutcome {
    tokio::select! {
        biased;
        joined = &mut handle => RaceOutcome::Completed(join_errors(group, joined)),
        _ = deadline => RaceOutcome::Aborted(AbortReason::GlobalTimeout, handle),
        _ = interrupts.recv() => RaceOutcome::Aborted(AbortReason::Interrupt, handle),
    }
}

fn join_errors(group: &str, joined: Result<Vec<GroupError>, tokio::task::JoinError>) -> Vec<GroupError> {
    match joined {
        Ok(errors) => errors,
        Err(err) => vec![GroupError::Task {
            group: group.to_string(),
            message: err.to_string(),
        }],
    }
}
