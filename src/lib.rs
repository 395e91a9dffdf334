//! timescale-bench library
//!
//! Query latency benchmark for TimescaleDB. Query parameters are routed by
//! hostname to a fixed pool of workers, each holding one connection, and the
//! per-query timings are summarized once every result is in.

pub mod benchmark;
pub mod client;
pub mod config;
pub mod dataset;
pub mod metrics;
pub mod utils;
