//! Run outcome and tally models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

use super::report::{AssertionRecord, AssertionStats, ExecutionReport};

/// Classification of a single assertion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionStatus {
    Pass,
    Fail,
    Skip,
}

impl AssertionStatus {
    pub fn classify(record: &AssertionRecord) -> Self {
        if record.error.is_some() {
            AssertionStatus::Fail
        } else if record.skipped {
            AssertionStatus::Skip
        } else {
            AssertionStatus::Pass
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            AssertionStatus::Pass => "✓",
            AssertionStatus::Fail => "✗",
            AssertionStatus::Skip => "○",
        }
    }
}

impl fmt::Display for AssertionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionStatus::Pass => write!(f, "PASS"),
            AssertionStatus::Fail => write!(f, "FAIL"),
            AssertionStatus::Skip => write!(f, "SKIP"),
        }
    }
}

/// Result of one run, as seen by the orchestration layer
#[derive(Clone, Debug)]
pub enum RunOutcome {
    Completed(ExecutionReport),
    TimedOut { timeout_ms: u64 },
}

/// Pass/fail counts for a suite.
///
/// Completed runs contribute the engine's aggregate counts. Each timed-out
/// run adds one failed check on top, so totals include timed-out runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total: u64,
    pub failed: u64,
}

impl Tally {
    pub fn new(total: u64, failed: u64) -> Self {
        Self { total, failed }
    }

    /// A timed-out run counts as one failed check
    pub fn timed_out() -> Self {
        Self::new(1, 1)
    }

    pub fn passed(&self) -> u64 {
        self.total.saturating_sub(self.failed)
    }
}

impl From<AssertionStats> for Tally {
    fn from(stats: AssertionStats) -> Self {
        Self::new(stats.total, stats.failed)
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.failed += other.failed;
    }
}
