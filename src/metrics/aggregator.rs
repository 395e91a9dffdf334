//! Pending result table and final statistics
//!
//! Every dispatched job id is registered here before it is handed to a
//! worker. Results arriving on the fan-in path fill the matching slot. The
//! summary is computed once, from a sorted copy of the successful durations,
//! after every slot has been filled.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn, Span};

use crate::benchmark::job::QueryResult;
use crate::utils::{AggregationError, QueryError, StatsError};

/// Summary of one benchmark run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedResult {
    /// Successful queries
    pub num_queries: u64,
    /// Failed queries
    pub num_errors: u64,
    pub total_processing_time: Duration,
    pub min: Duration,
    pub max: Duration,
    pub average: Duration,
    pub median: Duration,
}

impl AggregatedResult {
    /// True when no query succeeded; latency fields are then all zero
    pub fn is_empty(&self) -> bool {
        self.num_queries == 0
    }

    /// Build the summary from every completed result
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a QueryResult>,
    {
        let mut summary = Self::default();
        let mut durations = Vec::new();

        for result in results {
            match &result.outcome {
                Ok(elapsed) => {
                    summary.num_queries += 1;
                    summary.total_processing_time += *elapsed;
                    durations.push(*elapsed);
                }
                Err(_) => summary.num_errors += 1,
            }
        }

        durations.sort_unstable();

        let Ok(median) = median(&durations) else {
            return summary;
        };

        summary.min = durations[0];
        summary.max = durations[durations.len() - 1];
        summary.average = average(summary.total_processing_time, summary.num_queries);
        summary.median = median;
        summary
    }
}

/// Median of an ascending slice; the mean of the middle pair for even lengths
pub fn median(sorted: &[Duration]) -> Result<Duration, StatsError> {
    if sorted.is_empty() {
        return Err(StatsError::EmptySample);
    }

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2)
    } else {
        Ok(sorted[mid])
    }
}

/// Integer mean, truncated to whole nanoseconds
fn average(total: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos((total.as_nanos() / count as u128) as u64)
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<String, Option<QueryResult>>,
    outstanding: usize,
    sealed: bool,
}

/// Thread-safe job id -> result table shared by dispatch and collection
pub struct ResultAggregator {
    table: Mutex<PendingTable>,
    span: Span,
}

impl ResultAggregator {
    pub fn new(span: Span) -> Self {
        Self {
            table: Mutex::new(PendingTable::default()),
            span,
        }
    }

    /// Register a job about to be dispatched
    pub fn record_pending(&self, job_id: &str) -> Result<(), AggregationError> {
        let mut table = self.table.lock();
        if table.sealed {
            return Err(AggregationError::Sealed(job_id.to_string()));
        }
        if table.entries.contains_key(job_id) {
            return Err(AggregationError::DuplicatePending(job_id.to_string()));
        }
        table.entries.insert(job_id.to_string(), None);
        table.outstanding += 1;
        Ok(())
    }

    /// Store the result of a pending job. Never overwrites an earlier result.
    pub fn record_result(&self, result: QueryResult) -> Result<(), AggregationError> {
        let mut table = self.table.lock();
        let slot = table
            .entries
            .get_mut(&result.job_id)
            .ok_or_else(|| AggregationError::UnknownJob(result.job_id.clone()))?;

        if slot.is_some() {
            return Err(AggregationError::DuplicateResult(result.job_id.clone()));
        }

        debug!(
            parent: &self.span,
            "Job {} finished on worker {} ({:?})",
            result.job_id,
            result.worker_id,
            result.outcome.as_ref().map_err(|e| e.to_string())
        );
        *slot = Some(result);
        table.outstanding -= 1;
        Ok(())
    }

    /// Stop accepting new pending jobs
    pub fn seal(&self) {
        self.table.lock().sealed = true;
    }

    /// True iff every registered job has a result
    pub fn is_complete(&self) -> bool {
        self.table.lock().outstanding == 0
    }

    /// Jobs still waiting for a result
    pub fn outstanding(&self) -> usize {
        self.table.lock().outstanding
    }

    /// Jobs registered so far
    pub fn recorded(&self) -> usize {
        self.table.lock().entries.len()
    }

    /// Fail every job still waiting for a result. Returns how many were settled.
    pub fn settle_outstanding(&self, reason: &str) -> usize {
        let mut table = self.table.lock();
        let mut settled = 0;

        for (job_id, slot) in table.entries.iter_mut() {
            if slot.is_none() {
                *slot = Some(QueryResult::failure(
                    job_id.clone(),
                    usize::MAX,
                    QueryError::Abandoned(reason.to_string()),
                ));
                settled += 1;
            }
        }

        if settled > 0 {
            warn!(parent: &self.span, "Settled {} jobs without results: {}", settled, reason);
        }
        table.outstanding = 0;
        settled
    }

    /// Compute the run summary from all completed results
    pub fn finalize(&self) -> AggregatedResult {
        let table = self.table.lock();
        let summary = AggregatedResult::from_results(table.entries.values().flatten());

        if summary.is_empty() {
            warn!(
                parent: &self.span,
                "{}; reporting zero latency statistics",
                StatsError::EmptySample
            );
        }
        summary
    }
}
