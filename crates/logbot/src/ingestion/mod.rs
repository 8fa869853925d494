//! Parsing and dual-sink ingestion of log files and transaction reports

pub mod chunker;
pub mod classifier;
pub mod header;
pub mod log_parser;
pub mod orchestrator;
pub mod report_parser;

pub use chunker::{LogBlock, TimestampChunker};
pub use classifier::classify;
pub use header::{parse_header, LogHeader};
pub use log_parser::{line_units, LogFileParser, ParsedLogFile};
pub use orchestrator::{discover_resources, FileRoute, IngestionOrchestrator, InputResource};
pub use report_parser::{extract_report_date, scan_report, ParsedReport, TransactionReportParser};
