//! Terminal output for run results.
//!
//! Renders the per-group pass/fail/skip table followed by the failed-check
//! log section. Colour is optional and off for non-terminal consumers.

use crate::engine::runner::Reporter;
use crate::engine::summary::{format_failed_checks_log, FailedCheckLog, ResultsSummary};

const SEPARATOR: &str = "--------------------------------------------------------------------------------";

/// Prints results to stdout.
#[derive(Debug, Clone)]
pub struct TerminalReporter {
    color: bool,
}

impl TerminalReporter {
    pub fn new(color: bool) -> Self {
        TerminalReporter { color }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    /// Colour a count only when it is non-zero.
    fn count(&self, value: usize, paint: fn(&Self, &str) -> String) -> String {
        let text = format!("{:>7}", value);
        if value > 0 {
            paint(self, &text)
        } else {
            text
        }
    }

    pub fn render(&self, summary: &ResultsSummary, failed_logs: &[FailedCheckLog]) -> String {
        let width = summary
            .groups
            .iter()
            .map(|group| group.name.chars().count())
            .chain(std::iter::once("GROUP".len()))
            .max()
            .unwrap_or(0);

        let mut output = String::new();
        output.push_str(SEPARATOR);
        output.push('\n');
        output.push_str(&format!(
            "{:<width$} | {:>7} | {:>7} | {:>7}\n",
            "GROUP", "PASSED", "FAILED", "SKIPPED"
        ));
        output.push_str(SEPARATOR);
        output.push('\n');

        for group in &summary.groups {
            output.push_str(&format!(
                "{:<width$} | {} | {} | {}\n",
                group.name,
                self.count(group.passed(), Self::green),
                self.count(group.failed(), Self::red),
                self.count(group.skipped(), Self::yellow),
            ));
        }

        let [passed, failed, skipped] = summary.total();
        output.push_str(SEPARATOR);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} passed, {} failed, {} skipped\n",
            passed, failed, skipped
        ));
        output.push_str(SEPARATOR);
        output.push('\n');

        if !failed_logs.is_empty() {
            output.push('\n');
            output.push_str(&format_failed_checks_log(failed_logs, self.color));
        }

        output
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, summary: &ResultsSummary, failed_logs: &[FailedCheckLog]) {
        print!("{}", self.render(summary, failed_logs));
    }
}
