//! Pass/fail/skip aggregation and the failed-check log section.

use crate::engine::check::CheckResult;
use crate::engine::group::ChecksGroup;
use serde::Serialize;

pub const PASSED: usize = 0;
pub const FAILED: usize = 1;
pub const SKIPPED: usize = 2;

const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Counts for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    /// `[passed, failed, skipped]`
    pub counts: [usize; 3],
}

impl GroupSummary {
    pub fn passed(&self) -> usize {
        self.counts[PASSED]
    }

    pub fn failed(&self) -> usize {
        self.counts[FAILED]
    }

    pub fn skipped(&self) -> usize {
        self.counts[SKIPPED]
    }
}

/// Per-group counts in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultsSummary {
    pub groups: Vec<GroupSummary>,
}

impl ResultsSummary {
    /// Count strictly from each check's final result. `NotRun` and `Error`
    /// are not counted.
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a ChecksGroup>) -> Self {
        let groups = groups
            .into_iter()
            .map(|group| {
                let mut counts = [0; 3];
                for check in group.checks() {
                    match check.result() {
                        CheckResult::Passed => counts[PASSED] += 1,
                        CheckResult::Failed => counts[FAILED] += 1,
                        CheckResult::Skipped => counts[SKIPPED] += 1,
                        CheckResult::NotRun | CheckResult::Error => {}
                    }
                }
                GroupSummary {
                    name: group.name().to_string(),
                    counts,
                }
            })
            .collect();
        ResultsSummary { groups }
    }

    pub fn counts(&self, group: &str) -> Option<[usize; 3]> {
        self.groups
            .iter()
            .find(|summary| summary.name == group)
            .map(|summary| summary.counts)
    }

    pub fn total(&self) -> [usize; 3] {
        self.groups.iter().fold([0; 3], |mut acc, summary| {
            for (total, count) in acc.iter_mut().zip(summary.counts) {
                *total += count;
            }
            acc
        })
    }
}

/// Captured output of one failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCheckLog {
    pub check_id: String,
    pub output: String,
}

pub fn collect_failed_checks_logs<'a>(groups: impl IntoIterator<Item = &'a ChecksGroup>) -> Vec<FailedCheckLog> {
    groups
        .into_iter()
        .flat_map(|group| group.checks())
        .filter(|check| check.result() == CheckResult::Failed)
        .map(|check| FailedCheckLog {
            check_id: check.id().to_string(),
            output: check.snapshot().state.captured_output,
        })
        .collect()
}

/// Render one bordered banner per failed check followed by its output.
pub fn format_failed_checks_log(logs: &[FailedCheckLog], color: bool) -> String {
    let mut out = String::new();
    for log in logs {
        let plain = format!("| LOG ({}) |", log.check_id);
        let header = if color {
            format!("| {CYAN}LOG ({}){RESET} |", log.check_id)
        } else {
            plain.clone()
        };
        let border = "-".repeat(plain.chars().count());

        out.push_str(&border);
        out.push('\n');
        out.push_str(&header);
        out.push('\n');
        out.push_str(&border);
        out.push('\n');
        let body = log.output.trim_end_matches('\n');
        if body.is_empty() {
            out.push_str("Empty log output");
        } else {
            out.push_str(body);
        }
        out.push('\n');
    }
    out
}
