//! Data models for suite fan-out runs
//!
//! This module contains all data structures shared between the factory,
//! executor and aggregator.

mod outcome;
mod report;
mod request;

pub use outcome::{AssertionStatus, RunOutcome, Tally};
pub use report::{Execution, ExecutionReport};
pub use request::{suite_label, RunRequest};

#[cfg(test)]
pub use report::{AssertionStats, ExecutedResponse, ResponseStream};
