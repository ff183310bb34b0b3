//! suite-fanout - parallel parameterized API suite runner
//!
//! Runs a Postman-style collection once per argument, each run against its
//! own generated environment file, and prints one result line per suite.
//!
//! ## Features
//!
//! - Deterministic environment identifiers (UUID v5) per argument
//! - Template substitution into the environment `values` array
//! - All runs of a suite scheduled before any is consumed
//! - Per-run timeouts that count as failures instead of aborting
//! - Verbose and quiet diagnostic modes
//!
//! ## Usage
//!
//! ```bash
//! # Two runs of one suite, one per global value
//! suite-fanout --testfiles Tenacious.json --globals Beelzaboss Kickapoo
//!
//! # Shared iteration data and a custom template
//! suite-fanout --testfiles Tenacious.json --datafile rows.csv --template env.tmpl
//!
//! # Print request details for every execution
//! suite-fanout --testfiles Tenacious.json --globals a b c -v
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod cli;
mod config;
mod environment;
mod error;
mod executor;
mod models;
mod output;
mod results;
mod utils;

use cli::Args;
use config::RunnerConfig;
use executor::{NewmanEngine, Runner};
use utils::logger::init_logger;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RunnerConfig::load(&args)?;
    init_logger(config.log_level);

    info!(
        "{} suite(s), {} run(s) each, timeout {}ms",
        config.test_files.len(),
        config.cohort_size(),
        config.timeout.as_millis()
    );
    debug!("Resolved configuration: {:?}", config);

    let engine = NewmanEngine::new(&config.engine);
    let runner = Runner::new(&config, engine)?;
    let summaries = runner.run().await?;

    for summary in &summaries {
        debug!(
            "{}: {} run(s), {} timed out, {}/{} passed",
            summary.suite,
            summary.runs,
            summary.timed_out,
            summary.tally.passed(),
            summary.tally.total
        );
    }

    Ok(())
}
