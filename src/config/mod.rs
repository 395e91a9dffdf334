//! Configuration module

pub mod benchmark_config;
pub mod cli;
pub mod query_config;

pub use benchmark_config::BenchmarkConfig;
pub use cli::{CliArgs, LogLevel, OutputFormat};
pub use query_config::QuerySpec;
