//! Output formatters for golden test results
//!
//! Progress markers while a suite runs, and full diagnostic reports for
//! single results and finished runs, as text or JSON.

use serde::Serialize;

use crate::compare;
use crate::models::{Drained, EvaluationOutcome, Progress, RunSummary, TestResult};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Renders progress and reports
pub struct Reporter {
    format: OutputFormat,
    colorize: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Whether progress markers are printed at all
    pub fn shows_progress(&self) -> bool {
        self.format == OutputFormat::Text
    }

    /// Single-character marker for one step of a run
    pub fn progress_marker(progress: &Progress) -> char {
        match progress {
            Progress::Passed(_) => '.',
            Progress::Failed(_) => 'X',
            Progress::Drained(Drained::Cancelled { .. }) => '?',
            Progress::Drained(drained) => match drained.result() {
                Some(result) if result.success => '.',
                _ => 'x',
            },
        }
    }

    pub fn render_progress(&self, progress: &Progress) -> String {
        let marker = Self::progress_marker(progress);
        if !self.colorize {
            return marker.to_string();
        }
        match marker {
            '.' => format!("\x1b[32m{marker}\x1b[0m"),
            'X' | 'x' => format!("\x1b[31m{marker}\x1b[0m"),
            _ => format!("\x1b[33m{marker}\x1b[0m"),
        }
    }

    /// Full report for one result: success or failure layout as appropriate
    pub fn render_result(&self, result: &TestResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Text if result.success => render_success(result),
            OutputFormat::Text => render_failure(result),
        }
    }

    /// Closing report for a suite run
    pub fn render_summary(&self, summary: &RunSummary) -> String {
        match self.format {
            OutputFormat::Json => to_json(summary),
            OutputFormat::Text => match &summary.first_failure {
                Some(failure) => render_failure(failure),
                None => format!("{} tests successful.\n", summary.passed),
            },
        }
    }
}

/// Report for a passing case
pub fn render_success(result: &TestResult) -> String {
    let mut output = String::new();
    section(&mut output, "Success:", &result.test_case.identity);
    section(&mut output, "Expression:", &result.test_case.source_expression);
    section(&mut output, "Result:", &render_outcome(&result.actual));
    output
}

/// Report for a failing case with both sides rendered for diffing
pub fn render_failure(result: &TestResult) -> String {
    let mut output = String::new();
    section(&mut output, "Failed:", &result.test_case.identity);
    section(&mut output, "When running:", &result.test_case.source_expression);
    section(&mut output, "Expected:", &render_outcome(&result.expected));
    section(&mut output, "But got:", &render_outcome(&result.actual));
    output
}

/// Canonical value, or the diagnostic lines of a failure
pub fn render_outcome(outcome: &EvaluationOutcome) -> String {
    match outcome {
        EvaluationOutcome::Success { value } => compare::canonicalize(value),
        EvaluationOutcome::Failure { diagnostic } => diagnostic.join("\n"),
    }
}

fn section(output: &mut String, heading: &str, body: &str) {
    output.push_str(heading);
    output.push('\n');
    output.push_str(&indent(body, 2));
    output.push('\n');
}

fn indent(text: &str, cols: usize) -> String {
    let pad = " ".repeat(cols);
    text.lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_json<T: Serialize>(value: &T) -> String {
    let mut json = serde_json::to_string_pretty(value).unwrap_or_default();
    json.push('\n');
    json
}
