//! Parallel cohort execution
//!
//! Runs every suite with one run per argument. All runs of all suites are
//! futures multiplexed on the calling task: suites are joined together, and
//! the runs of one suite are polled from a `FuturesUnordered` so their
//! results are reduced in completion order.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info, warn};

use super::coordinator::RunCoordinator;
use super::engine::TestEngine;
use super::runner::TestExecutor;
use crate::config::RunnerConfig;
use crate::environment::EnvironmentFactory;
use crate::models::{suite_label, RunOutcome, RunRequest, Tally};
use crate::results::ResultAggregator;

/// Final counts for one suite file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteSummary {
    pub suite: String,
    pub runs: usize,
    pub timed_out: usize,
    pub tally: Tally,
}

/// Runs every configured suite across the configured arguments
pub struct Runner<E> {
    test_files: Vec<PathBuf>,
    data_file: Option<PathBuf>,
    arguments: Vec<String>,
    factory: EnvironmentFactory,
    executor: TestExecutor<E>,
    aggregator: ResultAggregator,
    temp_dir: TempDir,
    output: Mutex<Box<dyn Write + Send>>,
}

impl<E: TestEngine> Runner<E> {
    /// Build a runner; loads the template and creates the private temp directory
    pub fn new(config: &RunnerConfig, engine: E) -> Result<Self> {
        let factory = EnvironmentFactory::from_template_path(config.template.as_deref())?;

        let temp_dir = tempfile::Builder::new()
            .prefix("suite-fanout-")
            .tempdir()
            .context("Failed to create temporary directory")?;
        debug!("Environment files go to {}", temp_dir.path().display());

        Ok(Self {
            test_files: config.test_files.clone(),
            data_file: config.data_file.clone(),
            arguments: config.arguments.clone(),
            factory,
            executor: TestExecutor::new(engine, config.timeout),
            aggregator: ResultAggregator::new(config.verbosity),
            temp_dir,
            output: Mutex::new(Box::new(std::io::stdout())),
        })
    }

    /// Send diagnostics and summary lines somewhere other than stdout
    #[cfg(test)]
    pub fn with_output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.output = Mutex::new(output);
        self
    }

    #[cfg(test)]
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Run all suites concurrently. The first fatal fault stops everything.
    pub async fn run(&self) -> Result<Vec<SuiteSummary>> {
        info!(
            "Running {} suite(s) x {} argument(s)",
            self.test_files.len(),
            self.arguments.len()
        );

        try_join_all(self.test_files.iter().map(|suite| self.run_suite(suite))).await
    }

    /// Run one cohort for `suite` and print its summary line
    pub async fn run_suite(&self, suite: &Path) -> Result<SuiteSummary> {
        let label = suite_label(suite);
        let requests: Vec<RunRequest> = self
            .arguments
            .iter()
            .map(|argument| {
                RunRequest::new(argument.as_str(), suite).with_data_file(self.data_file.clone())
            })
            .collect();

        let coordinator = RunCoordinator::schedule(requests.len());
        let mut runs = FuturesUnordered::new();

        for request in &requests {
            let environment = self.factory.build(request);
            runs.push(self.run_one(&coordinator, request));
            coordinator
                .enqueue(environment)
                .with_context(|| format!("Failed to schedule run for {label}"))?;
        }

        let mut tally = Tally::default();
        let mut timed_out = 0;

        while let Some(outcome) = runs.next().await {
            match outcome? {
                RunOutcome::Completed(report) => {
                    let mut out = self.output.lock().unwrap_or_else(PoisonError::into_inner);
                    tally += self
                        .aggregator
                        .handle(&report, &label, &mut **out)
                        .with_context(|| format!("Aborted processing results for {label}"))?;
                }
                RunOutcome::TimedOut { timeout_ms } => {
                    warn!("A run of {} timed out after {}ms, counted as failed", label, timeout_ms);
                    timed_out += 1;
                    tally += Tally::timed_out();
                }
            }
        }

        {
            let mut out = self.output.lock().unwrap_or_else(PoisonError::into_inner);
            self.aggregator.summarize(&label, tally, &mut **out)?;
        }

        Ok(SuiteSummary {
            suite: label,
            runs: requests.len(),
            timed_out,
            tally,
        })
    }

    /// Allocate a temp file, take an environment once the cohort is complete,
    /// write it, and execute the suite against it
    async fn run_one(
        &self,
        coordinator: &RunCoordinator,
        request: &RunRequest,
    ) -> Result<RunOutcome> {
        let file = self.allocate_environment_file().await?;
        let environment = coordinator.dequeue().await?;

        debug!(
            "Writing environment {} to {}",
            environment.identifier(),
            file.path().display()
        );
        tokio::fs::write(file.path(), environment.body())
            .await
            .with_context(|| format!("Failed to write environment file: {}", file.path().display()))?;

        // `file` stays alive until the engine is done with it
        self.executor
            .run(request.suite_file(), file.path(), request.data_file())
            .await
    }

    async fn allocate_environment_file(&self) -> Result<NamedTempFile> {
        let dir = self.temp_dir.path().to_path_buf();

        tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("env-")
                .suffix(".json")
                .tempfile_in(dir)
        })
        .await
        .context("Temp file allocation task failed")?
        .context("Failed to allocate environment file")
    }
}
