//! timescale-bench - query latency benchmark for TimescaleDB
//!
//! Reads `hostname,start_time,end_time` lines, runs one time-bucketed
//! min/max query per line across a pool of workers and prints latency
//! statistics.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, info_span, Level};
use tracing_subscriber::FmtSubscriber;

use timescale_bench::benchmark::Orchestrator;
use timescale_bench::client::PgConnector;
use timescale_bench::config::{BenchmarkConfig, CliArgs};
use timescale_bench::dataset::{open_input, QuerySource};
use timescale_bench::metrics::MetricsReporter;
use timescale_bench::utils::BenchmarkError;

fn setup_logging(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

fn print_banner(config: &BenchmarkConfig) {
    if config.quiet {
        return;
    }

    println!("timescale-bench v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Database: {}", config.redacted_db_url());
    println!("Input: {}", config.input_path.display());
    println!(
        "Workers: {}, Queue depth: {}",
        config.workers, config.queue_depth
    );
    println!(
        "Query: {}.{} by {} over {}",
        config.query.table,
        config.query.metric_column,
        config.query.host_column,
        config.query.time_column
    );
    println!("====================================\n");
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.effective_log_level().as_tracing())?;

    // Build configuration
    let config = BenchmarkConfig::from_cli(&args).map_err(BenchmarkError::Config)?;

    print_banner(&config);

    let reader = open_input(&config.input_path)
        .map_err(BenchmarkError::Io)
        .with_context(|| format!("Failed to open input {}", config.input_path.display()))?;

    let run_span = info_span!("run");
    let mut source = QuerySource::new(reader, run_span.clone());

    let connector = Arc::new(PgConnector::new(
        &config.db_url,
        config.connect_timeout(),
        &config.query,
    ));
    let orchestrator = Orchestrator::from_config(&config, connector, run_span);

    let report = orchestrator.run(&mut source)?;

    if source.skipped() > 0 {
        info!("Skipped {} malformed input lines", source.skipped());
    }
    for worker in &report.workers {
        info!(
            "Worker {}: {} queries, {} errors",
            worker.worker_id, worker.jobs_processed, worker.error_count
        );
    }

    let reporter = MetricsReporter::new(config.output_format);
    reporter
        .write_report(&report.summary, config.output_path.as_deref())
        .map_err(BenchmarkError::Io)
        .context("Failed to write report")?;

    if let Some(ref path) = config.output_path {
        info!("Report written to {}", path.display());
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
