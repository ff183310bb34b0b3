//! Single-run execution
//!
//! Invokes the engine once for one populated environment file.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::engine::{EngineInvocation, EngineOutcome, TestEngine};
use crate::error::FanoutError;
use crate::models::{suite_label, RunOutcome};
use crate::utils::timer::Timer;

/// Runs one suite against one environment file
pub struct TestExecutor<E> {
    engine: E,
    timeout: Duration,
}

impl<E: TestEngine> TestExecutor<E> {
    pub fn new(engine: E, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run the collection once.
    ///
    /// A timeout comes back as `RunOutcome::TimedOut`. Missing input files
    /// and every other engine fault are returned as errors.
    pub async fn run(
        &self,
        collection: &Path,
        environment_file: &Path,
        data_file: Option<&Path>,
    ) -> Result<RunOutcome> {
        ensure_present("collection file", collection)?;
        ensure_present("environment file", environment_file)?;

        let iteration_data = match data_file {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => {
                warn!(
                    "Data file {} not found, running without iteration data",
                    path.display()
                );
                None
            }
            None => None,
        };

        let invocation = EngineInvocation {
            collection: collection.to_path_buf(),
            environment: environment_file.to_path_buf(),
            iteration_data,
            timeout: self.timeout,
        };

        let label = suite_label(collection);
        let timer = Timer::start(format!("run {label}"));

        let outcome = self
            .engine
            .run(&invocation)
            .await
            .with_context(|| format!("Engine run failed for {}", collection.display()))?;
        let elapsed_ms = timer.stop().as_millis();

        match outcome {
            EngineOutcome::Completed(report) => {
                info!("Run of {} completed in {}ms", label, elapsed_ms);
                Ok(RunOutcome::Completed(report))
            }
            EngineOutcome::TimedOut => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(
                    "Run of {} timed out after {}ms ({}ms elapsed)",
                    label,
                    timeout_ms, elapsed_ms
                );
                Ok(RunOutcome::TimedOut { timeout_ms })
            }
        }
    }
}

fn ensure_present(what: &'static str, path: &Path) -> Result<(), FanoutError> {
    if path.exists() {
        Ok(())
    } else {
        Err(FanoutError::Precondition {
            what,
            path: path.to_path_buf(),
        })
    }
}
