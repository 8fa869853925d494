//! Log-shaped file parsing for both sinks
//!
//! Structured records are built per block; semantic units are built per
//! non-empty line, so a stack trace line lands in the index without its
//! header context.

use crate::types::{LogRecord, SemanticUnit};

use super::chunker::{LogBlock, TimestampChunker};
use super::classifier::classify;
use super::header::parse_header;

/// Records parsed from one log file
#[derive(Debug, Default)]
pub struct ParsedLogFile {
    /// One record per block whose header parsed
    pub records: Vec<LogRecord>,
    /// Blocks discarded for a malformed header
    pub dropped_blocks: usize,
}

/// Chunker → header parser → classifier
#[derive(Debug, Clone, Default)]
pub struct LogFileParser {
    chunker: TimestampChunker,
}

impl LogFileParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the whole file into structured records
    pub fn parse(&self, content: &str, source_file: &str) -> ParsedLogFile {
        let mut parsed = ParsedLogFile::default();

        for block in self.chunker.chunk(content) {
            match self.parse_block(&block, source_file) {
                Some(record) => parsed.records.push(record),
                None => parsed.dropped_blocks += 1,
            }
        }

        parsed
    }

    /// Build a record from one block, or None if its header is malformed
    pub fn parse_block(&self, block: &LogBlock<'_>, source_file: &str) -> Option<LogRecord> {
        let header = match parse_header(block.header_line()) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!(
                    "{}:{}: dropping block of {} line(s): {}",
                    source_file,
                    block.first_line,
                    block.line_count(),
                    e
                );
                return None;
            }
        };

        let raw_text = block.text.trim_end_matches(['\r', '\n']);

        Some(LogRecord {
            id: None,
            timestamp: header.timestamp,
            level: header.level,
            service_name: header.service_name,
            error_code: header.error_code,
            message: None,
            raw_text: raw_text.to_string(),
            log_type: classify(block.text),
            source_file: source_file.to_string(),
        })
    }
}

/// One semantic unit per non-empty line, each classified on its own
pub fn line_units(content: &str, source_file: &str) -> Vec<SemanticUnit> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| SemanticUnit::log_line(line, source_file, classify(line)))
        .collect()
}
