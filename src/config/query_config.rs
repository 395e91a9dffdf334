//! Shape of the benchmarked range query

use super::cli::CliArgs;

/// Table and column names substituted into the range query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub table: String,
    pub time_column: String,
    pub host_column: String,
    pub metric_column: String,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            table: "cpu_usage".to_string(),
            time_column: "ts".to_string(),
            host_column: "host".to_string(),
            metric_column: "usage".to_string(),
        }
    }
}

impl QuerySpec {
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let spec = Self {
            table: args.table.clone(),
            time_column: args.time_column.clone(),
            host_column: args.host_column.clone(),
            metric_column: args.metric_column.clone(),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Names are spliced into SQL text, so only plain identifiers are allowed
    pub fn validate(&self) -> Result<(), String> {
        for (flag, name) in [
            ("--table", &self.table),
            ("--time-column", &self.time_column),
            ("--host-column", &self.host_column),
            ("--metric-column", &self.metric_column),
        ] {
            if !is_plain_identifier(name) {
                return Err(format!("{} is not a valid SQL identifier: {:?}", flag, name));
            }
        }
        Ok(())
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
