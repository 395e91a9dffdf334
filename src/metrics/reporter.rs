//! Report rendering
//!
//! Supports two output formats:
//! - Human (labelled lines, durations in humantime notation)
//! - JSON (pretty-printed, durations as float milliseconds)

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use humantime::format_duration;
use serde_json::{json, Value};

use super::aggregator::AggregatedResult;
use crate::config::OutputFormat;

/// Renders an [`AggregatedResult`] in the configured format
pub struct MetricsReporter {
    format: OutputFormat,
}

impl MetricsReporter {
    /// Create new reporter with specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn render(&self, summary: &AggregatedResult) -> String {
        match self.format {
            OutputFormat::Human => render_human(summary),
            OutputFormat::Json => {
                // Serializing a Value built from numbers and bools cannot fail
                serde_json::to_string_pretty(&to_json(summary)).unwrap_or_default()
            }
        }
    }

    /// Write the rendered report to `path`, or to stdout when no path is given
    pub fn write_report(&self, summary: &AggregatedResult, path: Option<&Path>) -> io::Result<()> {
        let rendered = self.render(summary);
        match path {
            Some(path) => {
                let mut file = File::create(path)?;
                writeln!(file, "{}", rendered)
            }
            None => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                writeln!(out, "{}", rendered)?;
                out.flush()
            }
        }
    }
}

fn render_human(summary: &AggregatedResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Num Queries: {}\n", summary.num_queries));
    out.push_str(&format!("Num Errors: {}\n", summary.num_errors));
    out.push_str(&format!(
        "Total Processing time: {}\n",
        format_duration(summary.total_processing_time)
    ));
    out.push_str(&format!("Min time: {}\n", format_duration(summary.min)));
    out.push_str(&format!("Max time: {}\n", format_duration(summary.max)));
    out.push_str(&format!("Average time: {}\n", format_duration(summary.average)));
    out.push_str(&format!("Median time: {}", format_duration(summary.median)));
    out
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// JSON view of a summary
pub fn to_json(summary: &AggregatedResult) -> Value {
    json!({
        "num_queries": summary.num_queries,
        "num_errors": summary.num_errors,
        "total_processing_time_ms": millis(summary.total_processing_time),
        "min_time_ms": millis(summary.min),
        "max_time_ms": millis(summary.max),
        "average_time_ms": millis(summary.average),
        "median_time_ms": millis(summary.median),
        "empty": summary.is_empty(),
    })
}
