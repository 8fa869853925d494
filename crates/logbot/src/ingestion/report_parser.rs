//! Transaction report scanning
//!
//! A report is a tabular printout with one `DATE: .. TIME: ..` header and
//! indented account lines, each followed somewhere below by one or more
//! `ERROR MESSAGE:` lines. The scan is a single fold over the lines with the
//! active account carried in the accumulator, so concurrent parses share
//! nothing.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::RecordStore;
use crate::types::report::UNKNOWN_ACCOUNT;
use crate::types::{ReportFinding, SemanticUnit};

/// Indented run of at least ten digits, e.g. `  9900009054750`
static ACCOUNT_LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+(\d{10,})").expect("Invalid regex"));

/// e.g. `  ERROR MESSAGE: 000201S EMPTY ACTIVE MASTER DATABASE`
static ERROR_MESSAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"ERROR MESSAGE:\s+(.*)").expect("Invalid regex"));

/// e.g. `RPT ID: ZT1030 DATE: 08/13/2022 TIME: 01:27P`
static REPORT_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"DATE:\s+(\d{2}/\d{2}/\d{4})\s+TIME:\s+(\d{2}:\d{2}[AP]?)").expect("Invalid regex")
});

const REPORT_DATE_FORMAT: &str = "%m/%d/%Y %I:%M%p";

/// Find and parse the report-wide DATE/TIME header
///
/// A bare trailing `A`/`P` is widened to `AM`/`PM` first. A missing header or
/// a time without a meridiem yields [`Error::ReportDateUnavailable`].
pub fn extract_report_date(content: &str) -> Result<NaiveDateTime> {
    let caps = REPORT_DATE_PATTERN
        .captures(content)
        .ok_or(Error::ReportDateUnavailable)?;

    let mut date_str = format!("{} {}", &caps[1], &caps[2]);
    if date_str.ends_with('A') || date_str.ends_with('P') {
        date_str.push('M');
    }

    NaiveDateTime::parse_from_str(&date_str, REPORT_DATE_FORMAT)
        .map_err(|_| Error::ReportDateUnavailable)
}

/// Fold accumulator: the active account and the findings so far
struct ScanState {
    account_id: String,
    findings: Vec<ReportFinding>,
}

/// Scan report lines into findings
///
/// `clock` is consulted once per finding when `report_date` is None, so each
/// untimed finding is stamped with its own processing instant.
pub fn scan_report<F>(
    content: &str,
    source_file: &str,
    report_date: Option<NaiveDateTime>,
    clock: F,
) -> Vec<ReportFinding>
where
    F: Fn() -> NaiveDateTime,
{
    let initial = ScanState {
        account_id: UNKNOWN_ACCOUNT.to_string(),
        findings: Vec::new(),
    };

    let state = content.split('\n').fold(initial, |mut state, line| {
        if let Some(caps) = ACCOUNT_LINE_PATTERN.captures(line) {
            state.account_id = caps[1].to_string();
        }

        if let Some(caps) = ERROR_MESSAGE_PATTERN.captures(line) {
            let message = caps[1].trim().to_string();
            let error_code = message
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string();

            state.findings.push(ReportFinding {
                account_id: state.account_id.clone(),
                error_code,
                message,
                timestamp: report_date.unwrap_or_else(&clock),
                report_date,
                source_file: source_file.to_string(),
            });
        }

        state
    });

    state.findings
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Output of one report parse
#[derive(Debug, Default)]
pub struct ParsedReport {
    /// Findings in document order
    pub findings: Vec<ReportFinding>,
    /// One semantic unit per finding, same order
    pub units: Vec<SemanticUnit>,
    /// Findings written to the record store
    pub persisted: usize,
    /// Findings whose structured write failed
    pub persistence_failures: usize,
}

/// Scans a report and writes each finding to the record store
pub struct TransactionReportParser {
    store: Arc<dyn RecordStore>,
}

impl TransactionReportParser {
    /// Create a parser writing to the given store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Parse a report and persist its findings
    ///
    /// A failed write for one finding is logged and skipped; it never stops
    /// the scan or drops the finding's semantic unit.
    pub async fn parse(&self, content: &str, source_file: &str) -> ParsedReport {
        let report_date = match extract_report_date(content) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::debug!("{}: {}, findings use processing time", source_file, e);
                None
            }
        };

        let findings = scan_report(content, source_file, report_date, local_now);
        let mut parsed = ParsedReport::default();

        for finding in &findings {
            match self.store.insert_record(&finding.to_record()).await {
                Ok(_) => parsed.persisted += 1,
                Err(e) => {
                    tracing::warn!(
                        "{}: skipping structured write for account {} ({}): {}",
                        source_file,
                        finding.account_id,
                        finding.error_code,
                        e
                    );
                    parsed.persistence_failures += 1;
                }
            }
        }

        parsed.units = findings.iter().map(SemanticUnit::from_finding).collect();
        parsed.findings = findings;
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::local::LocalRecordStore;
    use crate::providers::record_store::RejectingStore;
    use crate::storage::LogDb;
    use crate::types::{metadata_keys, LogType};
    use chrono::{Duration, NaiveDate};
    use std::cell::Cell;

    const REPORT: &str = "\
RPT ID: ZT1030          DAILY TRANSACTION EXCEPTIONS          DATE: 08/13/2022 TIME: 01:27P
  ACCOUNT NUMBER    TRAN   DESCRIPTION
  9900009054750     NEW    NEW ACCT
  ERROR MESSAGE: 000201S EMPTY ACTIVE MASTER DATABASE
  ERROR MESSAGE: 000317W ADDRESS NOT VERIFIED
  9900009061122     PMT    PAYMENT
  ERROR MESSAGE: 000480E PAYMENT REVERSED
";

    fn fixed(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 8, 13)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_extract_report_date_pm_suffix() {
        assert_eq!(extract_report_date(REPORT).unwrap(), fixed(13, 27));
    }

    #[test]
    fn test_extract_report_date_am_suffix() {
        let date = extract_report_date("DATE: 08/13/2022 TIME: 09:05A").unwrap();
        assert_eq!(date, fixed(9, 5));
    }

    #[test]
    fn test_extract_report_date_unavailable() {
        assert!(matches!(
            extract_report_date("no header here"),
            Err(Error::ReportDateUnavailable)
        ));
        // No meridiem cannot be parsed as a 12-hour time
        assert!(matches!(
            extract_report_date("DATE: 08/13/2022 TIME: 01:27"),
            Err(Error::ReportDateUnavailable)
        ));
        assert!(matches!(
            extract_report_date("DATE: 13/45/2022 TIME: 01:27P"),
            Err(Error::ReportDateUnavailable)
        ));
    }

    #[test]
    fn test_account_context_applies_to_following_errors() {
        let findings = scan_report(REPORT, "transaction_log.txt", Some(fixed(13, 27)), || {
            panic!("clock must not be used when the report is dated")
        });

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].account_id, "9900009054750");
        assert_eq!(findings[0].error_code, "000201S");
        assert_eq!(findings[1].account_id, "9900009054750");
        assert_eq!(findings[1].error_code, "000317W");
        assert_eq!(findings[2].account_id, "9900009061122");
        assert_eq!(findings[2].message, "000480E PAYMENT REVERSED");
        assert!(findings.iter().all(|f| f.timestamp == fixed(13, 27)));
    }

    #[test]
    fn test_account_context_survives_unrelated_lines() {
        let content = "  1234567890\nfoo\nbar\nbaz\nERROR MESSAGE: X";
        let findings = scan_report(content, "r.txt", None, local_now);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].account_id, "1234567890");
        assert_eq!(findings[0].error_code, "X");
    }

    #[test]
    fn test_unknown_account_before_first_account_line() {
        let content = "  ERROR MESSAGE: 000999F ORPHAN\n  123456789 too short";
        let findings = scan_report(content, "r.txt", None, local_now);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].account_id, UNKNOWN_ACCOUNT);
    }

    #[test]
    fn test_undated_findings_take_their_own_timestamp() {
        let ticks = Cell::new(0i64);
        let clock = || {
            ticks.set(ticks.get() + 1);
            fixed(0, 0) + Duration::seconds(ticks.get())
        };
        let content = "  9900009054750\n  ERROR MESSAGE: A one\n  ERROR MESSAGE: B two";
        let findings = scan_report(content, "r.txt", None, clock);

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].timestamp, fixed(0, 0) + Duration::seconds(1));
        assert_eq!(findings[1].timestamp, fixed(0, 0) + Duration::seconds(2));
        assert!(findings.iter().all(|f| f.report_date.is_none()));
    }

    #[test]
    fn test_blank_error_message_line() {
        let content = "  9900009054750\n  ERROR MESSAGE:    \r";
        let findings = scan_report(content, "r.txt", None, local_now);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "");
        assert_eq!(findings[0].error_code, "");
    }

    #[tokio::test]
    async fn test_parse_persists_and_tags() {
        let store = Arc::new(LocalRecordStore::new(Arc::new(LogDb::in_memory().unwrap())));
        let parser = TransactionReportParser::new(store.clone());

        let content = "  9900009054750\n  ERROR MESSAGE: 000201S EMPTY ACTIVE MASTER DATABASE";
        let before = local_now();
        let parsed = parser.parse(content, "transaction_log.txt").await;
        let after = local_now();

        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.units.len(), 1);
        assert_eq!(parsed.persisted, 1);

        let finding = &parsed.findings[0];
        assert_eq!(finding.account_id, "9900009054750");
        assert_eq!(finding.error_code, "000201S");
        assert_eq!(finding.message, "000201S EMPTY ACTIVE MASTER DATABASE");
        assert!(finding.report_date.is_none());
        assert!(finding.timestamp >= before && finding.timestamp <= after);

        let unit = &parsed.units[0];
        assert_eq!(unit.get(metadata_keys::REPORT_DATE), None);
        assert_eq!(unit.get(metadata_keys::LOG_TYPE), Some("Transaction Report Error"));

        let stored = store.find_by_error_code("000201S").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, "ERROR");
        assert_eq!(stored[0].service_name, "TransactionService");
        assert_eq!(stored[0].log_type, LogType::TransactionReport);
        assert_eq!(
            stored[0].message.as_deref(),
            Some("000201S EMPTY ACTIVE MASTER DATABASE")
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_stop_scan() {
        let parser = TransactionReportParser::new(Arc::new(RejectingStore));
        let parsed = parser.parse(REPORT, "transaction_log.txt").await;

        assert_eq!(parsed.findings.len(), 3);
        assert_eq!(parsed.units.len(), 3);
        assert_eq!(parsed.persisted, 0);
        assert_eq!(parsed.persistence_failures, 3);
        assert_eq!(
            parsed.units[0].get(metadata_keys::REPORT_DATE),
            Some("2022-08-13T13:27:00")
        );
    }
}
