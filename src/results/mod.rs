//! Result aggregation module
//!
//! Reduces engine reports to per-suite tallies.

mod aggregator;

pub use aggregator::ResultAggregator;
