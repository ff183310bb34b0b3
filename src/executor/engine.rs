//! Test-execution engine adapter
//!
//! The engine itself is an external program. `TestEngine` is the seam the
//! executor talks to; `NewmanEngine` drives the `newman` CLI and reads back
//! its JSON report.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::models::ExecutionReport;

/// One engine invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineInvocation {
    pub collection: PathBuf,
    pub environment: PathBuf,
    pub iteration_data: Option<PathBuf>,
    pub timeout: Duration,
}

/// Tagged result of an engine invocation.
///
/// Timeouts are decided here, at the adapter boundary, so callers never have
/// to inspect fault messages.
#[derive(Clone, Debug)]
pub enum EngineOutcome {
    Completed(ExecutionReport),
    TimedOut,
}

/// An external test-execution engine
pub trait TestEngine {
    /// Run the collection once. Faults other than a timeout are returned as errors.
    fn run(&self, invocation: &EngineInvocation) -> impl Future<Output = Result<EngineOutcome>>;
}

/// Adapter for the `newman` command-line runner
#[derive(Clone, Debug)]
pub struct NewmanEngine {
    binary: PathBuf,
}

impl NewmanEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Report file written next to the environment file
    fn report_path(environment: &Path) -> PathBuf {
        environment.with_extension("report.json")
    }

    fn command(&self, invocation: &EngineInvocation, report: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("run")
            .arg(&invocation.collection)
            .arg("--environment")
            .arg(&invocation.environment);

        if let Some(data) = &invocation.iteration_data {
            cmd.arg("--iteration-data").arg(data);
        }

        cmd.args(["--reporters", "json", "--reporter-json-export"])
            .arg(report)
            .arg("--suppress-exit-code")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }
}

impl Default for NewmanEngine {
    fn default() -> Self {
        Self::new("newman")
    }
}

impl TestEngine for NewmanEngine {
    async fn run(&self, invocation: &EngineInvocation) -> Result<EngineOutcome> {
        let report_path = Self::report_path(&invocation.environment);
        let mut cmd = self.command(invocation, &report_path);

        debug!(
            "Launching {} for {}",
            self.binary.display(),
            invocation.collection.display()
        );

        let output = match tokio::time::timeout(invocation.timeout, cmd.output()).await {
            Ok(output) => output
                .with_context(|| format!("Failed to launch {}", self.binary.display()))?,
            Err(_) => return Ok(EngineOutcome::TimedOut),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} exited with {} for {}: {}",
                self.binary.display(),
                output.status,
                invocation.collection.display(),
                stderr.trim()
            );
        }

        let raw = tokio::fs::read(&report_path)
            .await
            .with_context(|| format!("Failed to read engine report: {}", report_path.display()))?;

        let report: ExecutionReport = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse engine report: {}", report_path.display()))?;

        if let Err(e) = tokio::fs::remove_file(&report_path).await {
            debug!("Could not remove {}: {}", report_path.display(), e);
        }

        Ok(EngineOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(data: Option<&str>) -> EngineInvocation {
        EngineInvocation {
            collection: PathBuf::from("/suites/Tenacious.json"),
            environment: PathBuf::from("/tmp/run/env-1.json"),
            iteration_data: data.map(PathBuf::from),
            timeout: Duration::from_millis(30_000),
        }
    }

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_report_path_next_to_environment() {
        assert_eq!(
            NewmanEngine::report_path(Path::new("/tmp/run/env-1.json")),
            PathBuf::from("/tmp/run/env-1.report.json")
        );
    }

    #[test]
    fn test_command_without_data() {
        let engine = NewmanEngine::default();
        let cmd = engine.command(&invocation(None), Path::new("/tmp/r.json"));
        let args = args_of(&cmd);

        assert_eq!(cmd.as_std().get_program(), "newman");
        assert_eq!(&args[..4], ["run", "/suites/Tenacious.json", "--environment", "/tmp/run/env-1.json"]);
        assert!(!args.iter().any(|a| a == "--iteration-data"));
        assert!(args.iter().any(|a| a == "--suppress-exit-code"));
    }

    #[test]
    fn test_command_with_data() {
        let engine = NewmanEngine::new("/opt/newman/bin/newman");
        let cmd = engine.command(&invocation(Some("/data/rows.csv")), Path::new("/tmp/r.json"));
        let args = args_of(&cmd);

        let pos = args.iter().position(|a| a == "--iteration-data").unwrap();
        assert_eq!(args[pos + 1], "/data/rows.csv");
    }

    /// Write an executable shell script standing in for newman
    fn fake_newman(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-newman");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn invocation_in(dir: &Path, timeout: Duration) -> EngineInvocation {
        let collection = dir.join("Tenacious.json");
        let environment = dir.join("env-1.json");
        std::fs::write(&collection, "{}").unwrap();
        std::fs::write(&environment, "{}").unwrap();

        EngineInvocation {
            collection,
            environment,
            iteration_data: None,
            timeout,
        }
    }

    #[tokio::test]
    async fn test_slow_engine_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let engine = NewmanEngine::new(fake_newman(dir.path(), "sleep 5"));
        let invocation = invocation_in(dir.path(), Duration::from_millis(200));

        let started = std::time::Instant::now();
        let outcome = engine.run(&invocation).await.unwrap();

        assert!(matches!(outcome, EngineOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_report_is_parsed_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let script = r#"while [ "$#" -gt 0 ]; do
  if [ "$1" = "--reporter-json-export" ]; then out="$2"; fi
  shift
done
printf '%s' '{"run":{"stats":{"assertions":{"total":4,"failed":1}},"executions":[]}}' > "$out""#;
        let engine = NewmanEngine::new(fake_newman(dir.path(), script));
        let invocation = invocation_in(dir.path(), Duration::from_secs(10));

        let outcome = engine.run(&invocation).await.unwrap();

        let EngineOutcome::Completed(report) = outcome else {
            panic!("expected a completed run, got {outcome:?}");
        };
        assert_eq!(report.assertions().total, 4);
        assert_eq!(report.assertions().failed, 1);
        assert!(!NewmanEngine::report_path(&invocation.environment).exists());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_a_fault_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let engine = NewmanEngine::new(fake_newman(
            dir.path(),
            "echo 'collection could not be loaded' >&2\nexit 1",
        ));
        let invocation = invocation_in(dir.path(), Duration::from_secs(10));

        let err = engine.run(&invocation).await.unwrap_err().to_string();

        assert!(err.contains("fake-newman exited with"));
        assert!(err.contains("collection could not be loaded"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_fault() {
        let engine = NewmanEngine::new("/definitely/not/a/newman");
        let err = engine.run(&invocation(None)).await.unwrap_err();
        assert!(err.to_string().contains("Failed to launch"));
    }
}
