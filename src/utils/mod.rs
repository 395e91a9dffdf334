//! Utility modules

pub mod error;

pub use error::{
    AggregationError, BenchmarkError, ConnectionError, InputParseError, QueryError, Result,
    StatsError,
};
