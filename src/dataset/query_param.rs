//! Query parameters parsed from the benchmark input

use std::fmt;

use chrono::NaiveDateTime;

use crate::utils::InputParseError;

/// Timestamp layout used by the input file
pub const QUERY_PARAM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One input row: the host to query and the time range to aggregate over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub hostname: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl QueryParam {
    /// Parse a `hostname,start,end` line
    pub fn parse_line(line: &str) -> Result<Self, InputParseError> {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() != 3 {
            return Err(InputParseError::WrongFormat(line.to_string()));
        }

        let parse_time = |raw: &str| {
            NaiveDateTime::parse_from_str(raw, QUERY_PARAM_TIME_FORMAT).map_err(|e| {
                InputParseError::WrongTime {
                    line: line.to_string(),
                    reason: e.to_string(),
                }
            })
        };

        Ok(Self {
            hostname: parts[0].to_string(),
            start_time: parse_time(parts[1])?,
            end_time: parse_time(parts[2])?,
        })
    }
}

impl fmt::Display for QueryParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<QueryParam: host={}, start={}, end={}>",
            self.hostname,
            self.start_time.format(QUERY_PARAM_TIME_FORMAT),
            self.end_time.format(QUERY_PARAM_TIME_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normal_line() {
        let param =
            QueryParam::parse_line("host_000008,2017-01-01 08:59:22,2017-01-01 09:59:22").unwrap();
        assert_eq!(param.hostname, "host_000008");
        assert_eq!(
            param.start_time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "2017-01-01T08:59:22Z"
        );
        assert_eq!(
            param.end_time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            "2017-01-01T09:59:22Z"
        );
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        let cases = [
            ("host_000008,2017-01-01 08:59:22", "wrong query_param format"),
            ("host_000008,2017-01-01 08:59:22,1,2,3", "wrong query_param format"),
            ("host_000008,2017-01-01 08:59:22,", "wrong time format"),
            (
                "host_000008,2017-01-01 08:59:22,2017-01-01T08:59:22Z",
                "wrong time format",
            ),
        ];

        for (line, expected) in cases {
            let err = QueryParam::parse_line(line).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "line {:?} gave {:?}",
                line,
                err
            );
        }
    }

    #[test]
    fn test_display() {
        let param =
            QueryParam::parse_line("host_000001,2017-01-02 13:02:02,2017-01-02 14:02:02").unwrap();
        assert_eq!(
            param.to_string(),
            "<QueryParam: host=host_000001, start=2017-01-02 13:02:02, end=2017-01-02 14:02:02>"
        );
    }
}
