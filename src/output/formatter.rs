//! Output formatters for run results
//!
//! Renders summary lines and the diagnostic blocks printed while a report
//! is walked.

use serde::Serialize;

use crate::models::{Execution, Tally};

/// How much diagnostic detail to print
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verbosity {
    pub verbose: bool,
    pub quiet: bool,
}

impl Verbosity {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    #[cfg(test)]
    pub fn verbose() -> Self {
        Self::new(true, false)
    }

    #[cfg(test)]
    pub fn quiet() -> Self {
        Self::new(false, true)
    }
}

/// Result formatter
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn new() -> Self {
        Self
    }

    /// `Results for <suite>: <failed> failed, <passed> passed, <total> total`
    ///
    /// Counts include one failed check per timed-out run.
    pub fn summary_line(&self, suite_label: &str, tally: Tally) -> String {
        format!(
            "Results for {}: {} failed, {} passed, {} total",
            suite_label,
            tally.failed,
            tally.passed(),
            tally.total
        )
    }

    /// Verbose block describing one request execution
    pub fn execution_block(&self, execution: &Execution) -> Vec<String> {
        let request = &execution.request;
        let mut lines = vec![
            format!("Test: {}", execution.item.name),
            format!("Request: {} {}", request.method, request.url.display_uri()),
        ];

        match &request.body {
            Some(body) => lines.push(format!("Body: {}", self.pretty(body))),
            None => lines.push("Body: none".to_string()),
        }

        let results = execution
            .response
            .as_ref()
            .and_then(|r| r.stream.as_ref())
            .map(|s| s.results())
            .unwrap_or_default();

        if results.is_empty() {
            lines.push("no results".to_string());
        } else {
            lines.extend(results.iter().map(|r| self.pretty(r)));
        }

        lines
    }

    /// Pretty-printed JSON for a diagnostic payload
    pub fn pretty<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "<unprintable>".to_string())
    }
}
