//! Output formatting module
//!
//! Provides summary lines and diagnostic rendering for run results.

mod formatter;

pub use formatter::{ResultFormatter, Verbosity};
