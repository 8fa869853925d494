//! Text units written to the semantic index

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{LogType, ReportFinding};

/// Metadata keys attached to semantic units
pub mod metadata_keys {
    pub const SOURCE_FILE: &str = "source_file";
    pub const LOG_TYPE: &str = "log_type";
    pub const ACCOUNT_ID: &str = "account_id";
    pub const ERROR_CODE: &str = "error_code";
    pub const REPORT_DATE: &str = "report_date";
}

/// A (text, metadata) pair for the semantic index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SemanticUnit {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl SemanticUnit {
    /// Unit for a single line of a log-shaped file
    pub fn log_line(line: impl Into<String>, source_file: &str, log_type: LogType) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(metadata_keys::SOURCE_FILE.to_string(), source_file.to_string());
        metadata.insert(metadata_keys::LOG_TYPE.to_string(), log_type.as_str().to_string());
        Self {
            text: line.into(),
            metadata,
        }
    }

    /// Unit for a transaction report finding
    pub fn from_finding(finding: &ReportFinding) -> Self {
        let mut unit = Self::log_line(
            finding.text(),
            &finding.source_file,
            LogType::TransactionReportError,
        );
        unit.metadata.insert(
            metadata_keys::ACCOUNT_ID.to_string(),
            finding.account_id.clone(),
        );
        unit.metadata.insert(
            metadata_keys::ERROR_CODE.to_string(),
            finding.error_code.clone(),
        );
        if let Some(report_date) = finding.report_date {
            unit.metadata.insert(
                metadata_keys::REPORT_DATE.to_string(),
                format_report_date(&report_date),
            );
        }
        unit
    }

    /// Metadata value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// ISO-8601 local date-time, as stored in `report_date`
pub fn format_report_date(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Nearest-neighbour hit returned by the semantic index
#[derive(Debug, Clone)]
pub struct SemanticMatch {
    /// The stored unit
    pub unit: SemanticUnit,
    /// Cosine similarity (higher is more similar)
    pub similarity: f32,
}
