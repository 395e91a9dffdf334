//! Scripted in-memory connector used by tests
//!
//! Records every execution with global start/finish sequence numbers so
//! tests can check ordering across worker threads without a database.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::executor::{Connector, QueryExecutor};
use crate::dataset::QueryParam;
use crate::utils::{ConnectionError, QueryError};

/// Hostnames with this prefix fail to execute
pub const FAILING_HOST_PREFIX: &str = "fail";

#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub worker_id: usize,
    pub hostname: String,
    pub started: u64,
    pub finished: u64,
}

#[derive(Default)]
struct Shared {
    log: Mutex<Vec<ExecutionRecord>>,
    clock: AtomicU64,
    connected: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    shared: Arc<Shared>,
    refuse_workers: Vec<usize>,
    panic_host: Option<String>,
    delay: Duration,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse connections for the given worker ids
    pub fn refusing(mut self, workers: &[usize]) -> Self {
        self.refuse_workers = workers.to_vec();
        self
    }

    /// Panic the executing worker thread when it reaches `host`
    pub fn panicking_on(mut self, host: &str) -> Self {
        self.panic_host = Some(host.to_string());
        self
    }

    /// Sleep this long inside every query
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn executions(&self) -> Vec<ExecutionRecord> {
        self.shared.log.lock().clone()
    }

    pub fn connected(&self) -> usize {
        self.shared.connected.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Executor = ScriptedExecutor;

    async fn connect(&self, worker_id: usize) -> Result<ScriptedExecutor, ConnectionError> {
        if self.refuse_workers.contains(&worker_id) {
            return Err(ConnectionError::Refused {
                worker_id,
                reason: "scripted refusal".to_string(),
            });
        }
        self.shared.connected.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedExecutor {
            worker_id,
            shared: Arc::clone(&self.shared),
            panic_host: self.panic_host.clone(),
            delay: self.delay,
        })
    }
}

pub struct ScriptedExecutor {
    worker_id: usize,
    shared: Arc<Shared>,
    panic_host: Option<String>,
    delay: Duration,
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&mut self, param: &QueryParam) -> Result<(), QueryError> {
        if self.panic_host.as_deref() == Some(param.hostname.as_str()) {
            panic!("scripted panic on {}", param.hostname);
        }
        let started = self.shared.clock.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let finished = self.shared.clock.fetch_add(1, Ordering::SeqCst);

        self.shared.log.lock().push(ExecutionRecord {
            worker_id: self.worker_id,
            hostname: param.hostname.clone(),
            started,
            finished,
        });

        if param.hostname.starts_with(FAILING_HOST_PREFIX) {
            return Err(QueryError::Database(sqlx::Error::Protocol(format!(
                "relation for {} does not exist",
                param.hostname
            ))));
        }
        Ok(())
    }

    async fn close(self) -> Result<(), QueryError> {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
