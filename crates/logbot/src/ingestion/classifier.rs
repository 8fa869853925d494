//! Substring-marker log type classification

use crate::types::LogType;

/// Markers in priority order; the first one found wins
const MARKERS: [(&str, LogType); 4] = [
    ("PAY-PRC-", LogType::PaymentPost),
    ("CUST-VAL-ERR", LogType::AddressUpdate),
    ("INT-CALC-FAIL", LogType::LateFeeCalc),
    ("SFTP-DROP-01", LogType::FileTransfer),
];

/// Classify a block or line by the first matching marker
pub fn classify(text: &str) -> LogType {
    MARKERS
        .iter()
        .find(|(marker, _)| text.contains(marker))
        .map(|(_, log_type)| *log_type)
        .unwrap_or(LogType::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_marker() {
        assert_eq!(classify("[PAY-PRC-9] boom"), LogType::PaymentPost);
        assert_eq!(classify("CUST-VAL-ERR zip"), LogType::AddressUpdate);
        assert_eq!(classify("INT-CALC-FAIL on acct"), LogType::LateFeeCalc);
        assert_eq!(classify("SFTP-DROP-01 timeout"), LogType::FileTransfer);
        assert_eq!(classify("all good"), LogType::General);
        assert_eq!(classify(""), LogType::General);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            classify("SFTP-DROP-01 then PAY-PRC-7"),
            LogType::PaymentPost
        );
        assert_eq!(
            classify("INT-CALC-FAIL\ncaused by CUST-VAL-ERR"),
            LogType::AddressUpdate
        );
    }

    #[test]
    fn test_marker_in_continuation_line() {
        let block = "2024-01-01 10:00:00.000 ERROR [Svc] failed\nnested: SFTP-DROP-01";
        assert_eq!(classify(block), LogType::FileTransfer);
    }
}
