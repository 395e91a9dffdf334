//! Benchmark execution
//!
//! This module provides the multi-threaded query runner:
//! - Router: stable hostname to worker mapping
//! - QueryWorker: one thread and one connection per worker
//! - WorkerPool: spawns workers and routes jobs to them
//! - Orchestrator: drives a run from startup to the final summary

pub mod counters;
pub mod job;
pub mod orchestrator;
pub mod pool;
pub mod router;
pub mod worker;

pub use counters::RunCounters;
pub use job::{Job, QueryResult};
pub use orchestrator::{Orchestrator, RunPhase, RunReport};
pub use pool::WorkerPool;
pub use router::{key_hash, route};
pub use worker::{QueryWorker, WorkerHandle, WorkerSummary};
