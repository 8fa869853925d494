//! Per-run ingestion counters

use serde::{Deserialize, Serialize};

/// Outcome of one ingestion pass
///
/// Structured and semantic counts are independent: a log file yields at most
/// one record per headered block but one semantic unit per non-empty line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionSummary {
    /// Files found by discovery
    pub files_discovered: usize,
    /// Files routed to the log parsers
    pub log_files: usize,
    /// Files routed to the report parser
    pub report_files: usize,
    /// Files matching neither suffix
    pub files_skipped: usize,
    /// Structured records written
    pub records_written: usize,
    /// Blocks dropped for a malformed header
    pub blocks_dropped: usize,
    /// Structured writes that failed
    pub persistence_failures: usize,
    /// Report findings produced
    pub report_findings: usize,
    /// Semantic units written
    pub semantic_units_written: usize,
    /// Semantic batches that failed to write
    pub semantic_batches_failed: usize,
}

impl IngestionSummary {
    /// Fold another summary into this one
    pub fn merge(&mut self, other: &IngestionSummary) {
        self.files_discovered += other.files_discovered;
        self.log_files += other.log_files;
        self.report_files += other.report_files;
        self.files_skipped += other.files_skipped;
        self.records_written += other.records_written;
        self.blocks_dropped += other.blocks_dropped;
        self.persistence_failures += other.persistence_failures;
        self.report_findings += other.report_findings;
        self.semantic_units_written += other.semantic_units_written;
        self.semantic_batches_failed += other.semantic_batches_failed;
    }
}
