//! Structured record store trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ErrorCodeCount, LogRecord};

/// Append-only sink for structured records, plus the read queries
/// the analysis side relies on
///
/// Implementations:
/// - `LocalRecordStore`: SQLite via [`crate::storage::LogDb`]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one record, returning its assigned ID
    async fn insert_record(&self, record: &LogRecord) -> Result<i64>;

    /// All records with an exact error code
    async fn find_by_error_code(&self, error_code: &str) -> Result<Vec<LogRecord>>;

    /// All records with an exact level token
    async fn find_by_level(&self, level: &str) -> Result<Vec<LogRecord>>;

    /// Count of `ERROR` records with an error code, grouped by code, most frequent first
    async fn count_errors_by_code(&self) -> Result<Vec<ErrorCodeCount>>;

    /// Same as [`RecordStore::count_errors_by_code`], restricted to one source file
    async fn count_errors_by_code_and_file(&self, source_file: &str)
        -> Result<Vec<ErrorCodeCount>>;

    /// Distinct source file names that have records
    async fn distinct_source_files(&self) -> Result<Vec<String>>;

    /// Total number of records
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get store name for logging
    fn name(&self) -> &str;
}

/// Store that refuses every write, for exercising persistence failure paths
#[cfg(test)]
pub(crate) struct RejectingStore;

#[cfg(test)]
#[async_trait]
impl RecordStore for RejectingStore {
    async fn insert_record(&self, _record: &LogRecord) -> Result<i64> {
        Err(crate::error::Error::persistence("constraint violation"))
    }

    async fn find_by_error_code(&self, _error_code: &str) -> Result<Vec<LogRecord>> {
        Ok(Vec::new())
    }

    async fn find_by_level(&self, _level: &str) -> Result<Vec<LogRecord>> {
        Ok(Vec::new())
    }

    async fn count_errors_by_code(&self) -> Result<Vec<ErrorCodeCount>> {
        Ok(Vec::new())
    }

    async fn count_errors_by_code_and_file(
        &self,
        _source_file: &str,
    ) -> Result<Vec<ErrorCodeCount>> {
        Ok(Vec::new())
    }

    async fn distinct_source_files(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn len(&self) -> Result<usize> {
        Ok(0)
    }

    fn name(&self) -> &str {
        "rejecting"
    }
}
