//! Benchmark input: query parameters and the line source that yields them

pub mod query_param;
pub mod source;

pub use query_param::{QueryParam, QUERY_PARAM_TIME_FORMAT};
pub use source::{open_input, QuerySource, STDIN_PATH};
