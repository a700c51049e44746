//! Check groups.
//!
//! A group owns an ordered list of checks and their lifecycle during a run:
//! it executes them, marks them aborted without running them, and hands
//! them to the recorder once its race in the runner is resolved.

use crate::engine::check::{Check, CheckContext, CheckResult, SkipFn, Verdict};
use crate::engine::interrupt::CancellationToken;
use crate::engine::recorder::ResultRecorder;
use crate::error::{GroupError, RecordError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Group-level hook run before the first or after the last check.
pub type HookFn = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Named, ordered collection of checks sharing one run and abort lifecycle.
pub struct ChecksGroup {
    name: String,
    checks: Vec<Check>,
    before_all: Option<HookFn>,
    after_all: Option<HookFn>,
    skip_when: Option<SkipFn>,
}

impl std::fmt::Debug for ChecksGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksGroup")
            .field("name", &self.name)
            .field("checks", &self.checks)
            .finish_non_exhaustive()
    }
}

impl ChecksGroup {
    pub fn new(name: impl Into<String>) -> Self {
        ChecksGroup {
            name: name.into(),
            checks: Vec::new(),
            before_all: None,
            after_all: None,
            skip_when: None,
        }
    }

    /// Hook run before the first check. A failure errors every check.
    pub fn with_before_all<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.before_all = Some(Arc::new(hook));
        self
    }

    /// Hook run after the last check. A failure leaves results untouched.
    pub fn with_after_all<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.after_all = Some(Arc::new(hook));
        self
    }

    /// Skip every check of the group when `predicate` yields a reason, e.g.
    /// when the inventory the group inspects is empty.
    pub fn with_skip_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.skip_when = Some(Arc::new(predicate));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks in registration order.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub(crate) fn push(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub(crate) fn reset(&self) {
        for check in &self.checks {
            check.reset();
        }
    }

    /// Execute the group's checks in order.
    ///
    /// `label_filter` is accepted for check selection but not evaluated yet:
    /// every check runs. Stops starting new checks once `token` is
    /// cancelled; checks left unstarted stay `NotRun` for `on_abort`.
    pub fn run_checks(&self, label_filter: &str, token: &CancellationToken) -> Vec<GroupError> {
        tracing::debug!(group = %self.name, label_filter, checks = self.checks.len(), "running group");
        let mut errors = Vec::new();

        if let Some(reason) = self.skip_when.as_ref().and_then(|predicate| predicate()) {
            tracing::debug!(group = %self.name, %reason, "skipping every check in group");
            self.finalize_unstarted(token, CheckResult::Skipped, &reason);
            return errors;
        }

        if let Some(hook) = &self.before_all {
            if let Err(reason) = hook() {
                tracing::error!(group = %self.name, %reason, "before-all hook failed");
                self.finalize_unstarted(token, CheckResult::Error, &format!("before-all hook failed: {reason}"));
                errors.push(GroupError::BeforeAll {
                    group: self.name.clone(),
                    reason,
                });
                return errors;
            }
        }

        for check in &self.checks {
            if token.is_cancelled() {
                tracing::debug!(group = %self.name, "stop requested, not starting remaining checks");
                break;
            }
            if let Some(error) = self.run_check(check, token) {
                errors.push(error);
            }
        }

        if let Some(hook) = &self.after_all {
            if let Err(reason) = hook() {
                tracing::error!(group = %self.name, %reason, "after-all hook failed");
                errors.push(GroupError::AfterAll {
                    group: self.name.clone(),
                    reason,
                });
            }
        }

        errors
    }

    fn run_check(&self, check: &Check, token: &CancellationToken) -> Option<GroupError> {
        let epoch = check.begin(token)?;
        if let Some(reason) = check.skip_reason() {
            check.finalize_started(epoch, CheckResult::Skipped, &reason, "");
            return None;
        }

        tracing::trace!(group = %self.name, check_id = check.id(), "running check");
        let mut ctx = CheckContext::new(check.id(), token.clone());
        let check_fn = Arc::clone(check.check_fn());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| check_fn(&mut ctx)));
        let output = ctx.into_output();

        match outcome {
            Ok(Ok(Verdict::Pass)) => {
                check.finalize_started(epoch, CheckResult::Passed, "", &output);
                None
            }
            Ok(Ok(Verdict::Fail(reason))) => {
                check.finalize_started(epoch, CheckResult::Failed, &reason, &output);
                None
            }
            Ok(Ok(Verdict::Skip(reason))) => {
                check.finalize_started(epoch, CheckResult::Skipped, &reason, &output);
                None
            }
            Ok(Err(err)) => {
                check.finalize_started(epoch, CheckResult::Error, &err.to_string(), &output);
                None
            }
            Err(_) => {
                tracing::error!(group = %self.name, check_id = check.id(), "check panicked");
                check.finalize_started(epoch, CheckResult::Error, "check panicked", &output);
                Some(GroupError::CheckPanicked {
                    group: self.name.clone(),
                    check_id: check.id().to_string(),
                })
            }
        }
    }

    /// Mark every check not yet finalized as skipped with `reason`, without
    /// running any check logic. Safe to call more than once.
    pub fn on_abort(&self, label_filter: &str, reason: &str) {
        tracing::debug!(group = %self.name, label_filter, reason, "aborting group");
        self.finalize_remaining(CheckResult::Skipped, reason);
    }

    /// Finalize from inside the group task. Goes through `begin` so a task
    /// outliving its run cannot touch the next run's state.
    fn finalize_unstarted(&self, token: &CancellationToken, result: CheckResult, reason: &str) {
        for check in &self.checks {
            if let Some(epoch) = check.begin(token) {
                check.finalize_started(epoch, result, reason, "");
            }
        }
    }

    fn finalize_remaining(&self, result: CheckResult, reason: &str) {
        for check in &self.checks {
            check.finalize(result, reason, "");
        }
    }

    /// Hand every check to the recorder, once each.
    pub fn record_checks_results(&self, recorder: &ResultRecorder) -> Vec<RecordError> {
        self.checks
            .iter()
            .filter_map(|check| recorder.record_check_result(&check.snapshot()).err())
            .collect()
    }
}
