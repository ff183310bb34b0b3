//! Test execution engine
//!
//! Coordinates environment hand-off, engine invocation and parallel cohorts.

mod coordinator;
mod engine;
mod parallel;
mod runner;

pub use engine::NewmanEngine;
pub use parallel::Runner;
