//! Query execution seam between workers and the database driver
//!
//! A worker only needs two things from the database layer: a way to open
//! its own connection at startup, and a way to run one range query at a time
//! on it. Everything else about the driver stays behind these traits.

use async_trait::async_trait;

use crate::dataset::QueryParam;
use crate::utils::{ConnectionError, QueryError};

/// A single, exclusively owned connection able to run the range query
#[async_trait]
pub trait QueryExecutor: Send {
    /// Run the range query for `param`, discarding the returned rows
    async fn execute(&mut self, param: &QueryParam) -> Result<(), QueryError>;

    /// Close the underlying connection
    async fn close(self) -> Result<(), QueryError>;
}

/// Opens one executor per worker
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Executor: QueryExecutor + 'static;

    async fn connect(&self, worker_id: usize) -> Result<Self::Executor, ConnectionError>;
}
