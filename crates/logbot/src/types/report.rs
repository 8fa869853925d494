//! Findings extracted from transaction reports

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{LogRecord, LogType};

/// Service name recorded for every report-derived structured record
pub const REPORT_SERVICE_NAME: &str = "TransactionService";

/// Account ID used before any account line has been seen
pub const UNKNOWN_ACCOUNT: &str = "UNKNOWN";

/// One account/error-message association from a report scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportFinding {
    /// Account in effect when the error line was scanned
    pub account_id: String,
    /// First whitespace-delimited token of the message
    pub error_code: String,
    /// Trimmed error message text
    pub message: String,
    /// Report-wide timestamp, or the processing instant of this finding
    pub timestamp: NaiveDateTime,
    /// Report-wide timestamp when the DATE/TIME header parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDateTime>,
    /// Report file name
    pub source_file: String,
}

impl ReportFinding {
    /// Synthesized text used for both the raw record text and the semantic unit
    pub fn text(&self) -> String {
        format!("Account: {} | Error: {}", self.account_id, self.message)
    }

    /// Structured record for this finding
    pub fn to_record(&self) -> LogRecord {
        LogRecord {
            id: None,
            timestamp: self.timestamp,
            level: "ERROR".to_string(),
            service_name: REPORT_SERVICE_NAME.to_string(),
            error_code: Some(self.error_code.clone()),
            message: Some(self.message.clone()),
            raw_text: self.text(),
            log_type: LogType::TransactionReport,
            source_file: self.source_file.clone(),
        }
    }
}
