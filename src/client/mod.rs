//! Database client layer

pub mod executor;
pub mod postgres;
#[cfg(test)]
pub(crate) mod scripted;

pub use executor::{Connector, QueryExecutor};
pub use postgres::{build_range_query, PgConnector, PgExecutor};
