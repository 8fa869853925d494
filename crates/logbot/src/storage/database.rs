//! SQLite database for structured log records
//!
//! Append-only from the ingestion side: records are inserted once and never
//! updated or deleted here.

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ErrorCodeCount, LogRecord, LogType};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const SELECT_COLUMNS: &str = "SELECT id, timestamp, level, service_name, error_code, message, \
                              full_log, log_type, source_file FROM logs";

/// SQLite-based log record database
pub struct LogDb {
    conn: Arc<Mutex<Connection>>,
}

impl LogDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Internal(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Internal(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#).map_err(|e| Error::Internal(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(r#"
            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                level TEXT NOT NULL,
                service_name TEXT NOT NULL,
                error_code TEXT,
                message TEXT,
                full_log TEXT NOT NULL CHECK (length(full_log) > 0),
                log_type TEXT NOT NULL,
                source_file TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_logs_error_code ON logs(error_code);
            CREATE INDEX IF NOT EXISTS idx_logs_level ON logs(level);
            CREATE INDEX IF NOT EXISTS idx_logs_source_file ON logs(source_file);
        "#)
        .map_err(|e| Error::Internal(format!("Failed to run migrations: {}", e)))?;

        tracing::debug!("Database migrations complete");
        Ok(())
    }

    /// Insert a record, returning its row ID
    pub fn insert_record(&self, record: &LogRecord) -> Result<i64> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO logs (
                timestamp, level, service_name, error_code, message,
                full_log, log_type, source_file
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                record.level,
                record.service_name,
                record.error_code,
                record.message,
                record.raw_text,
                record.log_type.as_str(),
                record.source_file,
            ],
        ).map_err(|e| Error::persistence(format!("Failed to insert log record: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    /// Records with an exact error code
    pub fn find_by_error_code(&self, error_code: &str) -> Result<Vec<LogRecord>> {
        self.query_records(
            &format!("{} WHERE error_code = ?1 ORDER BY timestamp, id", SELECT_COLUMNS),
            error_code,
        )
    }

    /// Records with an exact level
    pub fn find_by_level(&self, level: &str) -> Result<Vec<LogRecord>> {
        self.query_records(
            &format!("{} WHERE level = ?1 ORDER BY timestamp, id", SELECT_COLUMNS),
            level,
        )
    }

    fn query_records(&self, sql: &str, param: &str) -> Result<Vec<LogRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(sql)
            .map_err(|e| Error::Internal(format!("Failed to prepare query: {}", e)))?;

        let records = stmt.query_map(params![param], row_to_log_record)
            .map_err(|e| Error::Internal(format!("Failed to query log records: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Internal(format!("Failed to read log record: {}", e)))?;

        Ok(records)
    }

    /// ERROR records with a code, grouped by code, most frequent first
    pub fn count_errors_by_code(&self) -> Result<Vec<ErrorCodeCount>> {
        self.query_counts(
            r#"
            SELECT error_code, COUNT(*) FROM logs
            WHERE level = 'ERROR' AND error_code IS NOT NULL
            GROUP BY error_code
            ORDER BY COUNT(*) DESC, error_code ASC
            "#,
            None,
        )
    }

    /// Same grouping restricted to one source file
    pub fn count_errors_by_code_and_file(&self, source_file: &str) -> Result<Vec<ErrorCodeCount>> {
        self.query_counts(
            r#"
            SELECT error_code, COUNT(*) FROM logs
            WHERE source_file = ?1 AND level = 'ERROR' AND error_code IS NOT NULL
            GROUP BY error_code
            ORDER BY COUNT(*) DESC, error_code ASC
            "#,
            Some(source_file),
        )
    }

    fn query_counts(&self, sql: &str, source_file: Option<&str>) -> Result<Vec<ErrorCodeCount>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(sql)
            .map_err(|e| Error::Internal(format!("Failed to prepare query: {}", e)))?;

        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<ErrorCodeCount> {
            let count: i64 = row.get(1)?;
            Ok(ErrorCodeCount {
                error_code: row.get(0)?,
                count: count as u64,
            })
        };

        let rows = match source_file {
            Some(file) => stmt.query_map(params![file], map_row),
            None => stmt.query_map([], map_row),
        }
        .map_err(|e| Error::Internal(format!("Failed to count errors: {}", e)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| Error::Internal(format!("Failed to read error count: {}", e)))?;

        Ok(rows)
    }

    /// Distinct source file names
    pub fn distinct_source_files(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT DISTINCT source_file FROM logs ORDER BY source_file")
            .map_err(|e| Error::Internal(format!("Failed to prepare query: {}", e)))?;

        let files = stmt.query_map([], |row| row.get(0))
            .map_err(|e| Error::Internal(format!("Failed to list source files: {}", e)))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(|e| Error::Internal(format!("Failed to read source file: {}", e)))?;

        Ok(files)
    }

    /// Total record count
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))
            .map_err(|e| Error::Internal(format!("Failed to count log records: {}", e)))?;

        Ok(total as usize)
    }
}

fn row_to_log_record(row: &rusqlite::Row) -> rusqlite::Result<LogRecord> {
    let id: i64 = row.get(0)?;
    let timestamp_str: String = row.get(1)?;
    let log_type_str: String = row.get(7)?;

    let timestamp = NaiveDateTime::parse_from_str(&timestamp_str, TIMESTAMP_FORMAT)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
    let log_type = log_type_str.parse::<LogType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(LogRecord {
        id: Some(id),
        timestamp,
        level: row.get(2)?,
        service_name: row.get(3)?,
        error_code: row.get(4)?,
        message: row.get(5)?,
        raw_text: row.get(6)?,
        log_type,
        source_file: row.get(8)?,
    })
}
