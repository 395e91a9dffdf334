//! PostgreSQL / TimescaleDB executor backed by sqlx

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};

use super::executor::{Connector, QueryExecutor};
use crate::config::QuerySpec;
use crate::dataset::QueryParam;
use crate::utils::{ConnectionError, QueryError};

/// Build the 1-minute bucketed min/max query for the configured table
pub fn build_range_query(spec: &QuerySpec) -> String {
    format!(
        "SELECT time_bucket('1 minute', {time}) AS bucket, min({metric}), max({metric}) \
         FROM {table} \
         WHERE {host} = $1 AND {time} BETWEEN $2 AND $3 \
         GROUP BY bucket ORDER BY bucket",
        time = spec.time_column,
        metric = spec.metric_column,
        table = spec.table,
        host = spec.host_column,
    )
}

/// Opens one dedicated `PgConnection` per worker
#[derive(Debug, Clone)]
pub struct PgConnector {
    pub db_url: String,
    pub connect_timeout: Duration,
    sql: Arc<str>,
}

impl PgConnector {
    pub fn new(db_url: &str, connect_timeout: Duration, spec: &QuerySpec) -> Self {
        Self {
            db_url: db_url.to_string(),
            connect_timeout,
            sql: Arc::from(build_range_query(spec)),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Executor = PgExecutor;

    async fn connect(&self, worker_id: usize) -> Result<PgExecutor, ConnectionError> {
        let conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect(&self.db_url))
            .await
            .map_err(|_| ConnectionError::Timeout {
                worker_id,
                timeout_ms: self.connect_timeout.as_millis() as u64,
            })?
            .map_err(|source| ConnectionError::ConnectFailed { worker_id, source })?;

        Ok(PgExecutor {
            conn,
            sql: Arc::clone(&self.sql),
        })
    }
}

/// Range query executor holding a single connection
pub struct PgExecutor {
    conn: PgConnection,
    sql: Arc<str>,
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn execute(&mut self, param: &QueryParam) -> Result<(), QueryError> {
        sqlx::query(&self.sql)
            .bind(&param.hostname)
            .bind(param.start_time)
            .bind(param.end_time)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn close(self) -> Result<(), QueryError> {
        self.conn.close().await?;
        Ok(())
    }
}
