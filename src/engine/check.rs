//! Check entity and its per-run state.
//!
//! A [`Check`] is created at registration time and owned by exactly one
//! group. Its mutable state sits behind a mutex so that the group task
//! (running on a blocking thread) and the runner's abort path can both
//! touch it. Finalization is compare-and-set: only a `NotRun` check can be
//! finalized, so a check is never recorded twice in one run. Every reset
//! starts a new epoch; a result computed under an older epoch is dropped.

use crate::engine::interrupt::CancellationToken;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Final outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckResult {
    #[default]
    NotRun,
    Passed,
    Failed,
    Skipped,
    Error,
}

impl CheckResult {
    /// Claim state string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckResult::NotRun => "not-run",
            CheckResult::Passed => "passed",
            CheckResult::Failed => "failed",
            CheckResult::Skipped => "skipped",
            CheckResult::Error => "error",
        }
    }

    pub fn is_finalized(&self) -> bool {
        !matches!(self, CheckResult::NotRun)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a check function concluded about the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
    Skip(String),
}

/// Error type check functions may return. Maps to [`CheckResult::Error`].
pub type CheckFnError = Box<dyn std::error::Error + Send + Sync>;

/// Check body.
pub type CheckFn = Arc<dyn Fn(&mut CheckContext) -> Result<Verdict, CheckFnError> + Send + Sync>;

/// Predicate deciding whether a check (or a whole group) should be skipped.
/// Returns the skip reason.
pub type SkipFn = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Handed to a check function while it runs.
pub struct CheckContext {
    check_id: String,
    output: String,
    token: CancellationToken,
}

impl CheckContext {
    pub(crate) fn new(check_id: &str, token: CancellationToken) -> Self {
        CheckContext {
            check_id: check_id.to_string(),
            output: String::new(),
            token,
        }
    }

    pub fn check_id(&self) -> &str {
        &self.check_id
    }

    /// Append one line to the captured diagnostic output.
    pub fn log(&mut self, line: impl AsRef<str>) {
        self.output.push_str(line.as_ref());
        self.output.push('\n');
    }

    /// True once the runner has asked the owning group to stop.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn into_output(self) -> String {
        self.output
    }
}

/// Mutable, per-run part of a check.
#[derive(Debug, Clone, Default)]
pub struct CheckState {
    pub result: CheckResult,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub failure_reason: String,
    pub captured_output: String,
}

/// Read-only copy of a check taken after its group finished.
#[derive(Debug, Clone)]
pub struct CheckSnapshot {
    pub id: String,
    pub group: String,
    pub labels: Vec<String>,
    pub state: CheckState,
}

impl CheckSnapshot {
    /// Whole seconds between start and end, zero when either is missing.
    pub fn duration_secs(&self) -> i64 {
        match (self.state.start_time, self.state.end_time) {
            (Some(start), Some(end)) => (end - start).num_seconds().max(0),
            _ => 0,
        }
    }
}

/// State plus the run epoch it belongs to.
#[derive(Debug, Default)]
struct Slot {
    epoch: u64,
    state: CheckState,
}

/// A single validation unit.
pub struct Check {
    id: String,
    group: String,
    labels: Vec<String>,
    check_fn: CheckFn,
    skip_fns: Vec<SkipFn>,
    slot: Mutex<Slot>,
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("group", &self.group)
            .field("labels", &self.labels)
            .field("state", &self.lock().state)
            .finish()
    }
}

impl Check {
    pub fn new<F>(group: impl Into<String>, id: impl Into<String>, check_fn: F) -> Self
    where
        F: Fn(&mut CheckContext) -> Result<Verdict, CheckFnError> + Send + Sync + 'static,
    {
        Check {
            id: id.into(),
            group: group.into(),
            labels: Vec::new(),
            check_fn: Arc::new(check_fn),
            skip_fns: Vec::new(),
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Add a skip predicate. Predicates are evaluated in order before the
    /// check function; the first reason returned wins.
    pub fn with_skip_check_fn<F>(mut self, skip_fn: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.skip_fns.push(Arc::new(skip_fn));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn result(&self) -> CheckResult {
        self.lock().state.result
    }

    pub fn snapshot(&self) -> CheckSnapshot {
        CheckSnapshot {
            id: self.id.clone(),
            group: self.group.clone(),
            labels: self.labels.clone(),
            state: self.lock().state.clone(),
        }
    }

    /// Handle mutex poisoning by recovering the data anyway; a panicking
    /// check body never holds this lock.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Back to `NotRun` under a new epoch.
    pub(crate) fn reset(&self) {
        let mut slot = self.lock();
        slot.epoch = slot.epoch.wrapping_add(1);
        slot.state = CheckState::default();
    }

    /// Mark the check as started and return the current epoch. Refused once
    /// the check is finalized or `token` has been cancelled.
    pub(crate) fn begin(&self, token: &CancellationToken) -> Option<u64> {
        let mut slot = self.lock();
        if slot.state.result.is_finalized() || token.is_cancelled() {
            return None;
        }
        slot.state.start_time = Some(Utc::now());
        Some(slot.epoch)
    }

    /// Finalize with `result` unless already finalized. Captured output is
    /// appended either way. Returns whether this call set the result.
    pub(crate) fn finalize(&self, result: CheckResult, reason: &str, output: &str) -> bool {
        finalize_state(&mut self.lock().state, result, reason, output)
    }

    /// Like [`finalize`](Self::finalize) for a check started with
    /// [`begin`](Self::begin). Nothing is kept, output included, if the
    /// check was reset since.
    pub(crate) fn finalize_started(&self, epoch: u64, result: CheckResult, reason: &str, output: &str) -> bool {
        let mut slot = self.lock();
        if slot.epoch != epoch {
            tracing::debug!(check_id = %self.id, "dropping result from a previous run");
            return false;
        }
        finalize_state(&mut slot.state, result, reason, output)
    }

    pub(crate) fn skip_reason(&self) -> Option<String> {
        self.skip_fns.iter().find_map(|skip_fn| skip_fn())
    }

    pub(crate) fn check_fn(&self) -> &CheckFn {
        &self.check_fn
    }
}

fn finalize_state(state: &mut CheckState, result: CheckResult, reason: &str, output: &str) -> bool {
    if !output.is_empty() {
        state.captured_output.push_str(output);
    }
    if state.result.is_finalized() {
        return false;
    }
    let now = Utc::now();
    state.result = result;
    state.failure_reason = reason.to_string();
    state.start_time.get_or_insert(now);
    state.end_time = Some(now);
    true
}
