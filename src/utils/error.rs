//! Error types for timescale-bench

use std::io;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Worker error: {0}")]
    Worker(String),
}

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Worker {worker_id} failed to connect: {source}")]
    ConnectFailed {
        worker_id: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("Worker {worker_id} connection timeout after {timeout_ms}ms")]
    Timeout { worker_id: usize, timeout_ms: u64 },

    #[error("Worker {worker_id} connection refused: {reason}")]
    Refused { worker_id: usize, reason: String },

    #[error("Worker {worker_id} could not start its runtime: {source}")]
    Runtime {
        worker_id: usize,
        #[source]
        source: io::Error,
    },

    #[error("Worker {0} exited before reporting its connection status")]
    WorkerGone(usize),
}

/// A malformed line in the query input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    #[error("wrong query_param format: {0}")]
    WrongFormat(String),

    #[error("wrong time format: {line}: {reason}")]
    WrongTime { line: String, reason: String },
}

/// Failure of a single query execution
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Worker exited before reporting: {0}")]
    Abandoned(String),
}

/// Bookkeeping faults in the pending result table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Job {0} is already pending")]
    DuplicatePending(String),

    #[error("Result for unknown job {0}")]
    UnknownJob(String),

    #[error("Duplicate result for job {0}")]
    DuplicateResult(String),

    #[error("Job {0} recorded after draining started")]
    Sealed(String),
}

/// Summary statistics errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    #[error("No successful samples to summarize")]
    EmptySample,
}

pub type Result<T> = std::result::Result<T, BenchmarkError>;
