//! Hash-routed pool of persistent-connection workers

use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, error, info, info_span, Span};

use super::job::{Job, QueryResult};
use super::router::route;
use super::worker::{WorkerHandle, WorkerSummary};
use crate::client::Connector;
use crate::utils::{BenchmarkError, ConnectionError, Result};

/// Fixed set of workers, one connection each, for the duration of a run
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    span: Span,
}

impl WorkerPool {
    /// Spawn and connect every worker.
    ///
    /// Returns only once each worker has reported its connection outcome. If
    /// any worker failed to connect, the workers that did connect are shut
    /// down and the first connection error is returned.
    pub fn start<C: Connector>(
        connector: Arc<C>,
        worker_count: usize,
        queue_depth: usize,
        results: Sender<QueryResult>,
        span: Span,
    ) -> Result<Self> {
        if worker_count == 0 {
            return Err(BenchmarkError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }

        let mut pool = Self {
            workers: Vec::with_capacity(worker_count),
            span,
        };
        let mut ready = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let worker_span = info_span!(parent: &pool.span, "worker", id = worker_id);
            let (handle, ready_rx) = WorkerHandle::spawn(
                worker_id,
                Arc::clone(&connector),
                queue_depth,
                results.clone(),
                worker_span,
            )?;
            pool.workers.push(handle);
            ready.push((worker_id, ready_rx));
        }

        let mut first_error: Option<ConnectionError> = None;
        for (worker_id, ready_rx) in ready {
            let outcome = ready_rx
                .recv()
                .unwrap_or(Err(ConnectionError::WorkerGone(worker_id)));
            if let Err(e) = outcome {
                error!(parent: &pool.span, "{}", e);
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            pool.shutdown();
            return Err(e.into());
        }

        info!(parent: &pool.span, "Started {} workers", worker_count);
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Hand `job` to the worker owning its hostname; blocks while that
    /// worker's queue is full. Returns the worker index.
    pub fn dispatch(&self, job: Job) -> Result<usize> {
        let worker_id = route(job.key(), self.workers.len())?;

        self.workers[worker_id].submit(job).map_err(|job| {
            BenchmarkError::Worker(format!(
                "worker {} has exited; {} was not dispatched",
                worker_id, job
            ))
        })?;

        debug!(parent: &self.span, "Job dispatched to worker {}", worker_id);
        Ok(worker_id)
    }

    /// Close every input queue. Workers finish their backlog and exit.
    pub fn close(&mut self) {
        for worker in &mut self.workers {
            worker.close();
        }
    }

    /// Close all queues and wait for every worker thread. Calling it again
    /// after the threads are joined returns an empty list.
    pub fn shutdown(&mut self) -> Vec<WorkerSummary> {
        self.close();

        let span = &self.span;
        let mut summaries = Vec::with_capacity(self.workers.len());
        for worker in &mut self.workers {
            if !worker.is_running() {
                continue;
            }
            match worker.join() {
                Some(summary) => summaries.push(summary),
                None => error!(parent: span, "Worker {} panicked", worker.worker_id),
            }
        }
        summaries
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
