//! logbot: dual-sink ingestion of service logs and transaction reports
//!
//! Log-shaped files are chunked on timestamp anchors, parsed into structured
//! records for exact and aggregate queries, and also split per line into
//! tagged units for a semantic index. Transaction reports are scanned for
//! account/error findings that go to both sinks.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod providers;
pub mod storage;
pub mod types;

pub use config::LogbotConfig;
pub use error::{Error, Result};
pub use ingestion::IngestionOrchestrator;
pub use types::{
    ErrorCodeCount, IngestionSummary, LogRecord, LogType, ReportFinding, SemanticUnit,
};
