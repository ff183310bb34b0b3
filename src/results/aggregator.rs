//! Report reduction
//!
//! Walks one execution report in order, prints diagnostics according to the
//! configured verbosity, and returns the engine's own assertion counts.

use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

use crate::error::FanoutError;
use crate::models::{AssertionStatus, ExecutionReport, Tally};
use crate::output::{ResultFormatter, Verbosity};

/// Reduces execution reports to tallies and diagnostic output
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultAggregator {
    verbosity: Verbosity,
    formatter: ResultFormatter,
}

impl ResultAggregator {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            formatter: ResultFormatter::new(),
        }
    }

    /// Process one report.
    ///
    /// The first test-script error aborts the walk. The returned tally is the
    /// report's aggregate, never a recount of the walked assertions.
    pub fn handle(
        &self,
        report: &ExecutionReport,
        suite_label: &str,
        out: &mut dyn Write,
    ) -> Result<Tally> {
        for execution in report.executions() {
            if self.verbosity.verbose {
                for line in self.formatter.execution_block(execution) {
                    writeln!(out, "{line}").context("Failed to write diagnostics")?;
                }
            }

            if !self.verbosity.quiet {
                writeln!(out, "{}", execution.request.url.resolved_path())
                    .context("Failed to write diagnostics")?;
            }

            if let Some(error) = execution.test_script.iter().find_map(|s| s.error.as_ref()) {
                let location = error.location();
                if let Some(stack) = &location.stack {
                    debug!("Script error stack in {}:\n{}", execution.item.name, stack);
                }
                return Err(FanoutError::ScriptFault {
                    test: execution.item.name.clone(),
                    location,
                }
                .into());
            }

            for assertion in &execution.assertions {
                let status = AssertionStatus::classify(assertion);
                debug!(
                    "{} {} [{}] {}",
                    status.symbol(),
                    suite_label,
                    execution.item.name,
                    assertion.assertion
                );

                if status == AssertionStatus::Fail && !self.verbosity.quiet {
                    writeln!(out, "{}", self.formatter.pretty(assertion))
                        .context("Failed to write diagnostics")?;
                }
            }
        }

        Ok(Tally::from(report.assertions()))
    }

    /// Print the final line for a suite; printed at every verbosity
    pub fn summarize(&self, suite_label: &str, tally: Tally, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", self.formatter.summary_line(suite_label, tally))
            .context("Failed to write summary")?;
        out.flush().context("Failed to flush summary")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_with_failure() -> ExecutionReport {
        serde_json::from_value(json!({
            "run": {
                "stats": { "assertions": { "total": 5, "failed": 1 } },
                "executions": [
                    {
                        "item": { "name": "List widgets" },
                        "request": {
                            "url": { "protocol": "https", "host": ["api", "example", "com"], "path": ["v1", "widgets"] },
                            "method": "GET"
                        },
                        "response": { "stream": "{\"Results\": [{\"id\": 7}]}" },
                        "assertions": [
                            { "assertion": "status is 200" },
                            { "assertion": "has widgets", "error": { "name": "AssertionError", "message": "expected 0 to be above 0" } }
                        ]
                    },
                    {
                        "item": { "name": "Get widget" },
                        "request": {
                            "url": { "protocol": "https", "host": ["api", "example", "com"], "path": ["v1", "widgets", "7"] },
                            "method": "GET"
                        },
                        "assertions": [{ "assertion": "status is 200", "skipped": true }]
                    }
                ]
            }
        }))
        .unwrap()
    }

    fn render(verbosity: Verbosity, report: &ExecutionReport) -> (Result<Tally>, String) {
        let mut out = Vec::new();
        let result = ResultAggregator::new(verbosity).handle(report, "Tenacious.json", &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_tally_comes_from_engine_aggregate() {
        let (tally, _) = render(Verbosity::default(), &report_with_failure());
        let tally = tally.unwrap();

        // three assertions are walked, but the engine reported five
        assert_eq!(tally, Tally::new(5, 1));
        assert_eq!(tally.passed(), 4);
    }

    #[test]
    fn test_default_prints_paths_and_failures() {
        let (_, output) = render(Verbosity::default(), &report_with_failure());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "v1/widgets");
        assert!(output.contains("expected 0 to be above 0"));
        assert!(output.contains("v1/widgets/7"));
        assert!(!output.contains("Test: List widgets"));
    }

    #[test]
    fn test_quiet_prints_nothing() {
        let (tally, output) = render(Verbosity::quiet(), &report_with_failure());
        assert!(tally.is_ok());
        assert!(output.is_empty());
    }

    #[test]
    fn test_verbose_prints_request_details() {
        let (_, output) = render(Verbosity::verbose(), &report_with_failure());

        assert!(output.contains("Test: List widgets"));
        assert!(output.contains("Request: GET https://api.example.com/v1/widgets"));
        assert!(output.contains("\"id\": 7"));
        assert!(output.contains("no results"));
    }

    #[test]
    fn test_script_error_is_fatal() {
        let report: ExecutionReport = serde_json::from_value(json!({
            "run": {
                "stats": { "assertions": { "total": 2, "failed": 0 } },
                "executions": [
                    {
                        "item": { "name": "Broken script" },
                        "testScript": [{ "error": {
                            "name": "ReferenceError",
                            "message": "token is not defined",
                            "fileName": "auth.js",
                            "lineNumber": 42
                        } }]
                    },
                    { "item": { "name": "Never reached" }, "request": { "url": { "path": ["unreached"] } } }
                ]
            }
        }))
        .unwrap();

        let (result, output) = render(Verbosity::default(), &report);
        let err = result.unwrap_err();

        match err.downcast_ref::<FanoutError>() {
            Some(FanoutError::ScriptFault { test, location }) => {
                assert_eq!(test, "Broken script");
                assert_eq!(location.name.as_deref(), Some("ReferenceError"));
                assert_eq!(location.message, "token is not defined");
                assert_eq!(location.file.as_deref(), Some("auth.js"));
                assert_eq!(location.line, Some(42));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!output.contains("unreached"));
    }

    #[test]
    fn test_summary_printed_even_when_quiet() {
        let mut out = Vec::new();
        ResultAggregator::new(Verbosity::quiet())
            .summarize("Tenacious.json", Tally::new(4, 0), &mut out)
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Results for Tenacious.json: 0 failed, 4 passed, 4 total\n"
        );
    }
}
