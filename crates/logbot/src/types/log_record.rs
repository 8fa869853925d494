//! Structured log records and their fixed category set

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Fixed log category derived from substring markers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LogType {
    /// Marker `PAY-PRC-`
    PaymentPost,
    /// Marker `CUST-VAL-ERR`
    AddressUpdate,
    /// Marker `INT-CALC-FAIL`
    LateFeeCalc,
    /// Marker `SFTP-DROP-01`
    FileTransfer,
    /// No marker present
    General,
    /// Structured record derived from a transaction report
    TransactionReport,
    /// Semantic unit derived from a transaction report
    TransactionReportError,
}

impl LogType {
    /// Display label stored in both sinks
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentPost => "Payment Post",
            Self::AddressUpdate => "Address Update",
            Self::LateFeeCalc => "Late Fee Calc",
            Self::FileTransfer => "File Transfer",
            Self::General => "General",
            Self::TransactionReport => "Transaction Report",
            Self::TransactionReportError => "Transaction Report Error",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Payment Post" => Ok(Self::PaymentPost),
            "Address Update" => Ok(Self::AddressUpdate),
            "Late Fee Calc" => Ok(Self::LateFeeCalc),
            "File Transfer" => Ok(Self::FileTransfer),
            "General" => Ok(Self::General),
            "Transaction Report" => Ok(Self::TransactionReport),
            "Transaction Report Error" => Ok(Self::TransactionReportError),
            other => Err(Error::internal(format!("Unknown log type: {}", other))),
        }
    }
}

/// One structured record in the record store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    /// Store-assigned row ID (None until persisted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Event time, millisecond precision
    pub timestamp: NaiveDateTime,
    /// Level token as written in the source (e.g. "ERROR")
    pub level: String,
    /// Service name from the header brackets
    pub service_name: String,
    /// Error code, if the header or report line carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Short message; only report findings set this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Full raw text, including continuation lines
    pub raw_text: String,
    /// Category label
    pub log_type: LogType,
    /// File the record was ingested from
    pub source_file: String,
}

/// Grouped error count returned by the aggregate queries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeCount {
    pub error_code: String,
    pub count: u64,
}
