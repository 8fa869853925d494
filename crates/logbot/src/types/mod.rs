//! Core types for ingested records, report findings and semantic units

pub mod log_record;
pub mod report;
pub mod semantic_unit;
pub mod summary;

pub use log_record::{ErrorCodeCount, LogRecord, LogType};
pub use report::ReportFinding;
pub use semantic_unit::{metadata_keys, SemanticMatch, SemanticUnit};
pub use summary::IngestionSummary;
