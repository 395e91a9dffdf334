//! Result collection and reporting
//!
//! This module provides:
//! - The pending result table shared by dispatch and collection
//! - Final statistics (count, errors, min, max, average, median)
//! - Human and JSON report rendering

pub mod aggregator;
pub mod reporter;

pub use aggregator::{median, AggregatedResult, ResultAggregator};
pub use reporter::MetricsReporter;
