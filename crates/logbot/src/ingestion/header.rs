//! Header extraction from the first line of a log block

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Timestamp, level token, `[service]`, then an optional `[error code]`
static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}\.\d{3})\s+(\w+)\s+\[(.*?)\]\s+(?:\[(.*?)\])?",
    )
    .expect("Invalid regex")
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Fields parsed from a block header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    pub timestamp: NaiveDateTime,
    pub level: String,
    pub service_name: String,
    pub error_code: Option<String>,
}

/// Parse a header line
///
/// Fails with [`Error::MalformedHeader`] when the line does not have the
/// header shape or its timestamp is not a real date-time.
pub fn parse_header(line: &str) -> Result<LogHeader> {
    let caps = HEADER_PATTERN
        .captures(line)
        .ok_or_else(|| Error::malformed_header(line, "line does not match header pattern"))?;

    let timestamp_str = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
        .map_err(|e| Error::malformed_header(line, format!("invalid timestamp: {}", e)))?;

    let level = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
    let service_name = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
    let error_code = caps
        .get(4)
        .map(|m| m.as_str().trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    Ok(LogHeader {
        timestamp,
        level,
        service_name,
        error_code,
    })
}
