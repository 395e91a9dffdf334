//! Line-oriented query source
//!
//! Reads `hostname,start,end` records after a single header line. Malformed
//! records are logged and skipped so a few bad lines never abort a run.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use tracing::{debug, error, warn, Span};

use super::query_param::QueryParam;

/// Path value that selects standard input
pub const STDIN_PATH: &str = "-";

/// Open the benchmark input, treating `-` as standard input
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    if path.as_os_str() == STDIN_PATH {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

/// Iterator over the valid query parameters of an input stream
pub struct QuerySource<R> {
    lines: Lines<R>,
    header_skipped: bool,
    line_no: u64,
    skipped: u64,
    span: Span,
}

impl<R: BufRead> QuerySource<R> {
    pub fn new(reader: R, span: Span) -> Self {
        Self {
            lines: reader.lines(),
            header_skipped: false,
            line_no: 0,
            skipped: 0,
            span,
        }
    }

    /// Number of malformed lines skipped so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: BufRead> Iterator for QuerySource<R> {
    type Item = QueryParam;

    fn next(&mut self) -> Option<QueryParam> {
        let _enter = self.span.enter();

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read input after line {}: {}", self.line_no, e);
                    return None;
                }
            };
            self.line_no += 1;

            if !self.header_skipped {
                self.header_skipped = true;
                continue;
            }

            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            debug!("Got line: {}", line);
            match QueryParam::parse_line(line) {
                Ok(param) => return Some(param),
                Err(e) => {
                    warn!("Skipping line {}: {}", self.line_no, e);
                    self.skipped += 1;
                }
            }
        }
    }
}
