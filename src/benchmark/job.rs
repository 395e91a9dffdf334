//! Jobs handed to workers and the results they send back

use std::fmt;
use std::time::Duration;

use uuid::Uuid;

use crate::dataset::QueryParam;
use crate::utils::QueryError;

/// A query parameter tagged with the id used to match its result
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub param: QueryParam,
}

impl Job {
    /// Create a job with a fresh random id
    pub fn new(param: QueryParam) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            param,
        }
    }

    /// Routing key
    pub fn key(&self) -> &str {
        &self.param.hostname
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Job: id={}, queryParam={}>", self.id, self.param)
    }
}

/// Outcome of one job. A failed query carries no duration.
#[derive(Debug)]
pub struct QueryResult {
    pub job_id: String,
    pub worker_id: usize,
    pub outcome: Result<Duration, QueryError>,
}

impl QueryResult {
    pub fn success(job_id: String, worker_id: usize, elapsed: Duration) -> Self {
        Self {
            job_id,
            worker_id,
            outcome: Ok(elapsed),
        }
    }

    pub fn failure(job_id: String, worker_id: usize, error: QueryError) -> Self {
        Self {
            job_id,
            worker_id,
            outcome: Err(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// Measured duration, zero for failures
    pub fn duration(&self) -> Duration {
        self.outcome.as_ref().copied().unwrap_or(Duration::ZERO)
    }
}
