//! Query worker thread
//!
//! Each worker owns one database connection exclusively and drives it from a
//! current-thread tokio runtime private to its OS thread. Jobs are taken from
//! the worker's own queue strictly in arrival order, so two queries for the
//! same host never overlap. The worker stops only when its queue is closed;
//! it then closes its connection and drops its result sender, which is how
//! the collector learns that this worker is done.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn, Span};

use super::job::{Job, QueryResult};
use crate::client::{Connector, QueryExecutor};
use crate::utils::{BenchmarkError, ConnectionError, Result};

/// Per-worker totals returned when the thread exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub jobs_processed: u64,
    pub error_count: u64,
}

/// A connected worker, ready to drain its queue
pub struct QueryWorker<E> {
    worker_id: usize,
    executor: E,
    runtime: Runtime,
    span: Span,
}

impl<E: QueryExecutor> QueryWorker<E> {
    /// Build the worker's runtime and open its connection
    pub fn connect<C>(
        worker_id: usize,
        connector: &C,
        span: Span,
    ) -> std::result::Result<Self, ConnectionError>
    where
        C: Connector<Executor = E>,
    {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| ConnectionError::Runtime { worker_id, source })?;

        let executor = runtime.block_on(connector.connect(worker_id))?;
        debug!(parent: &span, "Worker {} connected", worker_id);

        Ok(Self {
            worker_id,
            executor,
            runtime,
            span,
        })
    }

    /// Execute jobs until the queue is closed, then close the connection
    pub fn run(self, jobs: Receiver<Job>, results: Sender<QueryResult>) -> WorkerSummary {
        let QueryWorker {
            worker_id,
            mut executor,
            runtime,
            span,
        } = self;
        let _enter = span.enter();

        let mut summary = WorkerSummary {
            worker_id,
            ..Default::default()
        };

        for job in jobs.iter() {
            let start = Instant::now();
            let outcome = runtime.block_on(executor.execute(&job.param));
            let elapsed = start.elapsed();

            let result = match outcome {
                Ok(()) => {
                    debug!("{} took {:?}", job, elapsed);
                    QueryResult::success(job.id, worker_id, elapsed)
                }
                Err(e) => {
                    warn!("{} failed: {}", job, e);
                    summary.error_count += 1;
                    QueryResult::failure(job.id, worker_id, e)
                }
            };
            summary.jobs_processed += 1;

            if results.send(result).is_err() {
                warn!("Result channel closed, result dropped");
            }
        }

        if let Err(e) = runtime.block_on(executor.close()) {
            warn!("Failed to close connection: {}", e);
        }

        info!(
            "Worker {} finished: {} jobs, {} errors",
            worker_id, summary.jobs_processed, summary.error_count
        );
        summary
    }
}

/// Dispatcher-side handle to a worker thread
pub struct WorkerHandle {
    pub worker_id: usize,
    jobs: Option<Sender<Job>>,
    thread: Option<JoinHandle<WorkerSummary>>,
}

impl WorkerHandle {
    /// Spawn a worker thread. The returned receiver yields exactly one
    /// message: the outcome of the worker's connection attempt.
    pub fn spawn<C: Connector>(
        worker_id: usize,
        connector: Arc<C>,
        queue_depth: usize,
        results: Sender<QueryResult>,
        span: Span,
    ) -> Result<(Self, Receiver<std::result::Result<(), ConnectionError>>)> {
        let (jobs_tx, jobs_rx) = crossbeam_channel::bounded::<Job>(queue_depth);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread = thread::Builder::new()
            .name(format!("query-worker-{}", worker_id))
            .spawn(move || {
                match QueryWorker::connect(worker_id, connector.as_ref(), span) {
                    Ok(worker) => {
                        let _ = ready_tx.send(Ok(()));
                        worker.run(jobs_rx, results)
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        WorkerSummary {
                            worker_id,
                            ..Default::default()
                        }
                    }
                }
            })
            .map_err(|e| {
                BenchmarkError::Worker(format!("failed to spawn worker {}: {}", worker_id, e))
            })?;

        Ok((
            Self {
                worker_id,
                jobs: Some(jobs_tx),
                thread: Some(thread),
            },
            ready_rx,
        ))
    }

    /// Hand a job to the worker, blocking while its queue is full.
    /// Gives the job back if the worker has already exited.
    pub fn submit(&self, job: Job) -> std::result::Result<(), Job> {
        match &self.jobs {
            Some(tx) => tx.send(job).map_err(|e| e.into_inner()),
            None => Err(job),
        }
    }

    /// Close the queue; the worker exits after its last job
    pub fn close(&mut self) {
        self.jobs = None;
    }

    /// True until the thread has been joined
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Wait for the thread. `None` if it panicked or was already joined.
    pub fn join(&mut self) -> Option<WorkerSummary> {
        self.thread.take().and_then(|t| t.join().ok())
    }
}
