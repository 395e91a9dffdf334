//! Benchmark orchestrator
//!
//! Drives one run through its phases:
//!
//! ```text
//! Starting -> Running -> Draining -> Finalizing -> Done
//! ```
//!
//! `Starting` connects every worker; any failure ends the run before a job is
//! read. `Running` registers each job as pending and then dispatches it.
//! `Draining` closes the worker queues and waits for the result collector to
//! see the fan-in channel disconnect. `Finalizing` computes the summary once.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, info_span, warn, Span};

use super::counters::RunCounters;
use super::job::{Job, QueryResult};
use super::pool::WorkerPool;
use super::worker::WorkerSummary;
use crate::client::Connector;
use crate::config::BenchmarkConfig;
use crate::dataset::QueryParam;
use crate::metrics::{AggregatedResult, ResultAggregator};
use crate::utils::{BenchmarkError, Result};

/// Lifecycle of a run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Starting,
    Running,
    Draining,
    Finalizing,
    Done,
}

impl RunPhase {
    /// Move to `next`, rejecting any transition that does not go forward
    pub fn advance(&mut self, next: RunPhase) -> Result<()> {
        if next <= *self {
            return Err(BenchmarkError::Worker(format!(
                "invalid phase transition {} -> {}",
                self, next
            )));
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Starting => "starting",
            RunPhase::Running => "running",
            RunPhase::Draining => "draining",
            RunPhase::Finalizing => "finalizing",
            RunPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: AggregatedResult,
    pub dispatched: u64,
    pub elapsed: Duration,
    pub workers: Vec<WorkerSummary>,
}

/// Benchmark orchestrator
pub struct Orchestrator<C: Connector> {
    connector: Arc<C>,
    workers: usize,
    queue_depth: usize,
    show_progress: bool,
    span: Span,
}

impl<C: Connector> Orchestrator<C> {
    pub fn new(connector: Arc<C>, workers: usize, queue_depth: usize, span: Span) -> Self {
        Self {
            connector,
            workers,
            queue_depth,
            show_progress: false,
            span,
        }
    }

    /// Create orchestrator from a resolved configuration
    pub fn from_config(config: &BenchmarkConfig, connector: Arc<C>, span: Span) -> Self {
        Self::new(connector, config.workers, config.queue_depth, span)
            .with_progress(!config.quiet)
    }

    /// Show a progress spinner on stderr while the run is active
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run every query parameter through the pool and summarize the results
    pub fn run<I>(&self, params: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = QueryParam>,
    {
        let mut phase = RunPhase::Starting;
        let start = Instant::now();

        let aggregator = Arc::new(ResultAggregator::new(
            info_span!(parent: &self.span, "aggregator"),
        ));
        let counters = Arc::new(RunCounters::new());
        let (results_tx, results_rx) = crossbeam_channel::unbounded::<QueryResult>();

        let mut pool = WorkerPool::start(
            Arc::clone(&self.connector),
            self.workers,
            self.queue_depth,
            results_tx,
            info_span!(parent: &self.span, "pool"),
        )?;
        self.enter(&mut phase, RunPhase::Running)?;
        info!(parent: &self.span, "Dispatching to {} workers", pool.size());

        let collector = {
            let aggregator = Arc::clone(&aggregator);
            let counters = Arc::clone(&counters);
            let span = self.span.clone();
            thread::Builder::new()
                .name("result-collector".to_string())
                .spawn(move || {
                    for result in results_rx.iter() {
                        counters.record_completed(result.is_error());
                        if let Err(e) = aggregator.record_result(result) {
                            warn!(parent: &span, "Discarding result: {}", e);
                        }
                    }
                })
                .map_err(|e| {
                    BenchmarkError::Worker(format!("failed to spawn result collector: {}", e))
                })?
        };

        let progress = if self.show_progress {
            Some(spawn_progress(Arc::clone(&counters))?)
        } else {
            None
        };

        let dispatched = self.dispatch_all(&pool, &aggregator, &counters, params);

        self.enter(&mut phase, RunPhase::Draining)?;
        aggregator.seal();
        let worker_summaries = pool.shutdown();

        if collector.join().is_err() {
            error!(parent: &self.span, "Result collector panicked");
        }
        if !aggregator.is_complete() {
            warn!(
                parent: &self.span,
                "{} of {} jobs have no result",
                aggregator.outstanding(),
                aggregator.recorded()
            );
            aggregator.settle_outstanding("worker exited before reporting");
        }

        counters.signal_shutdown();
        if let Some(handle) = progress {
            let _ = handle.join();
        }

        self.enter(&mut phase, RunPhase::Finalizing)?;
        let summary = aggregator.finalize();
        self.enter(&mut phase, RunPhase::Done)?;

        let elapsed = start.elapsed();
        info!(
            parent: &self.span,
            "Run finished in {:.2}s: {} queries dispatched, {} succeeded, {} failed",
            elapsed.as_secs_f64(),
            dispatched,
            summary.num_queries,
            summary.num_errors
        );

        Ok(RunReport {
            summary,
            dispatched,
            elapsed,
            workers: worker_summaries,
        })
    }

    /// Register then dispatch each job. Returns how many reached a worker;
    /// jobs that did not stay pending until drain settles them.
    fn dispatch_all<I>(
        &self,
        pool: &WorkerPool,
        aggregator: &ResultAggregator,
        counters: &RunCounters,
        params: I,
    ) -> u64
    where
        I: IntoIterator<Item = QueryParam>,
    {
        let mut dispatched = 0u64;
        for param in params {
            let job = Job::new(param);
            if let Err(e) = aggregator.record_pending(&job.id) {
                error!(parent: &self.span, "Skipping {}: {}", job, e);
                continue;
            }
            match pool.dispatch(job) {
                Ok(_) => {
                    counters.record_dispatched();
                    dispatched += 1;
                }
                Err(e) => error!(parent: &self.span, "{}", e),
            }
        }
        dispatched
    }

    fn enter(&self, phase: &mut RunPhase, next: RunPhase) -> Result<()> {
        phase.advance(next)?;
        info!(parent: &self.span, "Phase: {}", next);
        Ok(())
    }
}

fn spawn_progress(counters: Arc<RunCounters>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("progress".to_string())
        .spawn(move || report_progress(&counters))
        .map_err(|e| BenchmarkError::Worker(format!("failed to spawn progress reporter: {}", e)))
}

/// Poll the counters and redraw the spinner until shutdown is signalled
fn report_progress(counters: &RunCounters) {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }

    let start = Instant::now();
    let mut last_completed = 0u64;
    let mut last_time = start;
    let mut rate = 0.0;

    while !counters.is_shutdown() {
        let (completed, dispatched, errors) = counters.progress();

        let now = Instant::now();
        let interval = now.duration_since(last_time).as_secs_f64();
        if interval >= 0.5 {
            rate = (completed - last_completed) as f64 / interval;
            last_completed = completed;
            last_time = now;
        }

        pb.set_message(format!(
            "{}/{} queries, {} errors, {:.0} q/s",
            completed, dispatched, errors, rate
        ));
        pb.tick();
        thread::sleep(Duration::from_millis(100));
    }

    let (completed, _, errors) = counters.progress();
    pb.finish_with_message(format!("Complete - {} queries, {} errors", completed, errors));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::router::route;
    use crate::client::scripted::ScriptedConnector;
    use crate::utils::ConnectionError;

    fn param(host: &str) -> QueryParam {
        let line = format!("{},2017-01-01 08:59:22,2017-01-01 09:59:22", host);
        QueryParam::parse_line(&line).unwrap()
    }

    fn orchestrator(connector: &Arc<ScriptedConnector>, workers: usize) -> Orchestrator<ScriptedConnector> {
        Orchestrator::new(Arc::clone(connector), workers, 1, Span::none())
    }

    #[test]
    fn test_phase_only_moves_forward() {
        let mut phase = RunPhase::Starting;
        phase.advance(RunPhase::Running).unwrap();
        phase.advance(RunPhase::Draining).unwrap();

        assert!(matches!(
            phase.advance(RunPhase::Running),
            Err(BenchmarkError::Worker(_))
        ));
        assert!(phase.advance(RunPhase::Draining).is_err());
        assert_eq!(phase, RunPhase::Draining);

        phase.advance(RunPhase::Finalizing).unwrap();
        phase.advance(RunPhase::Done).unwrap();
        assert!(phase.advance(RunPhase::Starting).is_err());
    }

    #[test]
    fn test_every_job_reports_once() {
        for workers in 1..=4 {
            for n in [0usize, 1, 17] {
                let connector = Arc::new(ScriptedConnector::new());
                let params: Vec<QueryParam> =
                    (0..n).map(|i| param(&format!("host_{:06}", i % 6))).collect();

                let report = orchestrator(&connector, workers).run(params).unwrap();

                assert_eq!(report.dispatched, n as u64);
                assert_eq!(report.summary.num_queries + report.summary.num_errors, n as u64);
                assert_eq!(report.workers.len(), workers);
                assert_eq!(connector.closed(), workers);
            }
        }
    }

    #[test]
    fn test_same_host_runs_on_one_worker_in_order() {
        let connector =
            Arc::new(ScriptedConnector::new().with_delay(Duration::from_millis(5)));
        let params = vec![param("h1"), param("h2"), param("h1")];

        let report = orchestrator(&connector, 2).run(params).unwrap();
        assert_eq!(report.summary.num_queries, 3);
        assert_eq!(report.summary.num_errors, 0);

        let h1: Vec<_> = connector
            .executions()
            .into_iter()
            .filter(|r| r.hostname == "h1")
            .collect();
        assert_eq!(h1.len(), 2);
        assert_eq!(h1[0].worker_id, route("h1", 2).unwrap());
        assert_eq!(h1[0].worker_id, h1[1].worker_id);

        let (first, second) = if h1[0].started < h1[1].started {
            (&h1[0], &h1[1])
        } else {
            (&h1[1], &h1[0])
        };
        assert!(first.finished < second.started);
    }

    #[test]
    fn test_failed_queries_are_counted() {
        let connector = Arc::new(ScriptedConnector::new());
        let params = vec![param("host_1"), param("fail_1"), param("host_2"), param("fail_2")];

        let report = orchestrator(&connector, 3).run(params).unwrap();
        assert_eq!(report.summary.num_queries, 2);
        assert_eq!(report.summary.num_errors, 2);
        assert_eq!(
            report.workers.iter().map(|w| w.error_count).sum::<u64>(),
            2
        );
    }

    #[test]
    fn test_all_failed_gives_empty_report() {
        let connector = Arc::new(ScriptedConnector::new());
        let params = vec![param("fail_a"), param("fail_b")];

        let report = orchestrator(&connector, 2).run(params).unwrap();
        assert!(report.summary.is_empty());
        assert_eq!(report.summary.num_errors, 2);
        assert_eq!(report.summary.median, Duration::ZERO);
    }

    #[test]
    fn test_dead_worker_jobs_settle_as_errors() {
        let connector = Arc::new(ScriptedConnector::new().panicking_on("boom"));
        let params = vec![
            param("h1"),
            param("boom"),
            param("h2"),
            param("h3"),
            param("h4"),
        ];

        let report = orchestrator(&connector, 1).run(params).unwrap();

        // Every job after the panic is either undeliverable or settled at drain
        assert_eq!(report.summary.num_queries + report.summary.num_errors, 5);
        assert_eq!(report.summary.num_queries, 1);
        assert_eq!(report.summary.num_errors, 4);
        assert!(report.dispatched >= 2);
        assert!(report.workers.is_empty());
    }

    #[test]
    fn test_progress_counts_only_delivered_jobs() {
        let connector = Arc::new(ScriptedConnector::new());
        let orchestrator = orchestrator(&connector, 1);
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut pool = WorkerPool::start(Arc::clone(&connector), 1, 1, tx, Span::none()).unwrap();
        let aggregator = ResultAggregator::new(Span::none());
        let counters = RunCounters::new();

        orchestrator.dispatch_all(&pool, &aggregator, &counters, vec![param("h0")]);
        pool.shutdown();

        let dispatched = orchestrator.dispatch_all(
            &pool,
            &aggregator,
            &counters,
            vec![param("h1"), param("h2")],
        );
        assert_eq!(dispatched, 0);
        assert_eq!(counters.progress().1, 1);
        assert_eq!(aggregator.outstanding(), 3);
    }

    #[test]
    fn test_connection_failure_dispatches_nothing() {
        let connector = Arc::new(ScriptedConnector::new().refusing(&[0]));
        let params = vec![param("host_1"), param("host_2")];

        let result = orchestrator(&connector, 2).run(params);
        assert!(matches!(
            result,
            Err(BenchmarkError::Connection(ConnectionError::Refused { worker_id: 0, .. }))
        ));
        assert!(connector.executions().is_empty());
    }

    #[test]
    fn test_zero_workers_is_config_error() {
        let connector = Arc::new(ScriptedConnector::new());
        let result = orchestrator(&connector, 0).run(vec![param("host_1")]);
        assert!(matches!(result, Err(BenchmarkError::Config(_))));
    }
}
