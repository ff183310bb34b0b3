//! Configuration module
//!
//! Resolves command-line flags, environment variables and the optional
//! config file into one `RunnerConfig`. Every validation failure here is a
//! configuration fault and stops the process before any run starts.

mod env;
mod file;

pub use env::EnvConfig;
pub use file::ConfigFile;

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::Args;
use crate::error::FanoutError;
use crate::output::Verbosity;
use crate::utils::logger::LogLevel;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_FOLDER: &str = "ExampleFolder";
pub const DEFAULT_ENGINE: &str = "newman";

/// Fully resolved settings for one invocation
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Suites to run, each resolved to an existing file
    pub test_files: Vec<PathBuf>,

    /// Iteration data shared by every run, when it resolved
    pub data_file: Option<PathBuf>,

    /// Environment template, when one was given
    pub template: Option<PathBuf>,

    /// One run per argument, for every suite
    pub arguments: Vec<String>,

    pub timeout: Duration,
    pub verbosity: Verbosity,

    /// Engine executable
    pub engine: PathBuf,

    pub log_level: LogLevel,
}

impl RunnerConfig {
    /// Resolve configuration from flags, the process environment and config files
    pub fn load(args: &Args) -> Result<Self> {
        let env = EnvConfig::load();

        let config_path = args
            .config
            .clone()
            .or_else(|| env.config_file.as_ref().map(PathBuf::from));

        let file = match config_path {
            Some(path) => ConfigFile::load(&path)
                .map_err(|e| FanoutError::config(format!("{e:#}")))?,
            None => ConfigFile::load_default()
                .map_err(|e| FanoutError::config(format!("{e:#}")))?,
        };

        Self::from_sources(args, &env, &file, dirs::home_dir().as_deref())
    }

    /// Merge sources, highest precedence first: flags, environment, file, defaults.
    ///
    /// `home` is the directory under which `<folder>/<path>` lookups happen.
    pub fn from_sources(
        args: &Args,
        env: &EnvConfig,
        file: &ConfigFile,
        home: Option<&Path>,
    ) -> Result<Self> {
        let defaults = &file.defaults;

        if env.has_any() {
            debug!("Applying environment overrides: {:?}", env);
        }

        let folder = args
            .folder
            .clone()
            .or_else(|| env.folder.clone())
            .or_else(|| defaults.folder.clone())
            .unwrap_or_else(|| DEFAULT_FOLDER.to_string());
        let search_root = home.map(|h| h.join(&folder));
        let resolver = Resolver::new(search_root);

        let timeout_ms = args
            .timeout
            .or(env.timeout)
            .or(defaults.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(FanoutError::config("timeout must be greater than zero").into());
        }

        let verbosity = if args.verbose || args.quiet {
            Verbosity::new(args.verbose, args.quiet)
        } else if env.verbose.is_some() || env.quiet.is_some() {
            Verbosity::new(env.verbose.unwrap_or(false), env.quiet.unwrap_or(false))
        } else {
            Verbosity::new(defaults.verbose, defaults.quiet)
        };
        if verbosity.verbose && verbosity.quiet {
            return Err(FanoutError::config("verbose and quiet cannot both be enabled").into());
        }

        let log_level = match args.log_level.as_deref().or(env.log_level.as_deref()) {
            Some(raw) => LogLevel::from_str(raw)
                .ok_or_else(|| FanoutError::config(format!("unknown log level: {raw}")))?,
            None => defaults.log_level.unwrap_or(if verbosity.verbose {
                LogLevel::Info
            } else {
                LogLevel::Warn
            }),
        };

        let test_files: Vec<PathBuf> = args
            .testfiles
            .iter()
            .filter_map(|path| {
                let resolved = resolver.resolve(path);
                if resolved.is_none() {
                    warn!("Test file {} not found, skipping", path.display());
                }
                resolved
            })
            .collect();
        if test_files.is_empty() {
            return Err(FanoutError::config(format!(
                "no test files found (searched as given and under {})",
                resolver.describe()
            ))
            .into());
        }

        let data_file = match &args.datafile {
            Some(path) => match resolver.resolve(path) {
                Some(resolved) => {
                    if let Some(rows) = preflight_data_file(&resolved)? {
                        info!("Data file {} has {} iterations", resolved.display(), rows);
                    }
                    Some(resolved)
                }
                None => {
                    warn!("Data file {} not found", path.display());
                    None
                }
            },
            None => None,
        };

        let template = match args
            .template
            .clone()
            .or_else(|| env.template.as_ref().map(PathBuf::from))
            .or_else(|| defaults.template.clone())
        {
            Some(path) => Some(resolver.resolve(&path).ok_or_else(|| {
                FanoutError::config(format!("template {} not found", path.display()))
            })?),
            None => None,
        };

        let arguments = if !args.globals.is_empty() {
            args.globals.clone()
        } else if data_file.is_some() {
            vec![String::new()]
        } else {
            return Err(FanoutError::config(
                "nothing to run: supply a resolvable --datafile or at least one --globals value",
            )
            .into());
        };

        let engine = args
            .newman
            .clone()
            .or_else(|| env.newman.as_ref().map(PathBuf::from))
            .or_else(|| defaults.newman.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE));

        Ok(Self {
            test_files,
            data_file,
            template,
            arguments,
            timeout: Duration::from_millis(timeout_ms),
            verbosity,
            engine,
            log_level,
        })
    }

    /// Number of runs started per suite
    pub fn cohort_size(&self) -> usize {
        self.arguments.len()
    }
}

/// Looks a path up as given, then under the suite folder
struct Resolver {
    search_root: Option<PathBuf>,
}

impl Resolver {
    fn new(search_root: Option<PathBuf>) -> Self {
        Self { search_root }
    }

    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        if path.exists() {
            return Some(path.to_path_buf());
        }

        self.search_root
            .as_ref()
            .map(|root| root.join(path))
            .filter(|candidate| candidate.exists())
    }

    fn describe(&self) -> String {
        self.search_root
            .as_ref()
            .map(|r| r.display().to_string())
            .unwrap_or_else(|| "<no home directory>".to_string())
    }
}

/// Check a data file before any run uses it.
///
/// Returns the number of iterations for CSV and JSON files, `None` for
/// formats left to the engine.
fn preflight_data_file(path: &Path) -> Result<Option<usize>> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let invalid = |reason: String| FanoutError::config(format!("data file {}: {reason}", path.display()));

    match extension.as_str() {
        "csv" => {
            let mut reader = csv::Reader::from_path(path).map_err(|e| invalid(e.to_string()))?;
            let headers = reader.headers().map_err(|e| invalid(e.to_string()))?;
            if headers.is_empty() {
                return Err(invalid("missing header row".to_string()).into());
            }

            let mut rows = 0;
            for record in reader.records() {
                record.map_err(|e| invalid(e.to_string()))?;
                rows += 1;
            }
            Ok(Some(rows))
        }
        "json" => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file: {}", path.display()))?;
            match serde_json::from_str::<Value>(&content).map_err(|e| invalid(e.to_string()))? {
                Value::Array(rows) => Ok(Some(rows.len())),
                _ => Err(invalid("expected a JSON array of iterations".to_string()).into()),
            }
        }
        _ => Ok(None),
    }
}
