//! Ingestion pass orchestration
//!
//! Discovers input files, routes each by suffix, and writes to the record
//! store and the semantic index. Only discovery and read failures end a run;
//! everything below file level is logged, counted and skipped. There is no
//! transaction across files or sinks, so a file can land in one sink and not
//! the other.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::InputConfig;
use crate::error::{Error, Result};
use crate::providers::{RecordStore, SemanticIndex};
use crate::types::{IngestionSummary, SemanticUnit};

use super::log_parser::{line_units, LogFileParser};
use super::report_parser::TransactionReportParser;

/// A discovered input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputResource {
    /// File name used as `source_file` in both sinks
    pub name: String,
    /// Full path
    pub path: PathBuf,
}

/// Parser route chosen from a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRoute {
    /// Tabular transaction report
    Report,
    /// Timestamped log stream
    Log,
    /// Neither suffix
    Unsupported,
}

impl FileRoute {
    /// Route a file name; the report suffix is checked first
    pub fn for_name(name: &str, config: &InputConfig) -> Self {
        if name.ends_with(&config.report_suffix) {
            Self::Report
        } else if name.ends_with(&config.log_suffix) {
            Self::Log
        } else {
            Self::Unsupported
        }
    }
}

fn resource_for(path: PathBuf) -> InputResource {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    InputResource { name, path }
}

/// List input files: the log directory (sorted by name), then extra files
///
/// A missing log directory counts as empty and a missing extra file is
/// skipped; any other I/O failure is [`Error::ResourceDiscovery`].
pub async fn discover_resources(config: &InputConfig) -> Result<Vec<InputResource>> {
    let mut resources = Vec::new();

    match tokio::fs::read_dir(&config.log_dir).await {
        Ok(mut entries) => {
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Error::resource_discovery(&config.log_dir, e))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| Error::resource_discovery(entry.path(), e))?;
                if file_type.is_file() {
                    resources.push(resource_for(entry.path()));
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("Log directory {} does not exist", config.log_dir.display());
        }
        Err(e) => return Err(Error::resource_discovery(&config.log_dir, e)),
    }

    resources.sort_by(|a, b| a.name.cmp(&b.name));

    for path in &config.extra_files {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => resources.push(resource_for(path.clone())),
            Ok(_) => tracing::debug!("Skipping {}: not a regular file", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Extra input {} not present", path.display());
            }
            Err(e) => return Err(Error::resource_discovery(path, e)),
        }
    }

    Ok(resources)
}

/// Runs ingestion passes against a record store and a semantic index
///
/// At most one pass runs at a time; a second caller gets
/// [`Error::IngestionInProgress`] instead of interleaving writes.
pub struct IngestionOrchestrator {
    input: InputConfig,
    store: Arc<dyn RecordStore>,
    index: Arc<dyn SemanticIndex>,
    log_parser: LogFileParser,
    report_parser: TransactionReportParser,
    run_guard: Mutex<()>,
}

impl IngestionOrchestrator {
    /// Create an orchestrator
    pub fn new(
        input: InputConfig,
        store: Arc<dyn RecordStore>,
        index: Arc<dyn SemanticIndex>,
    ) -> Self {
        tracing::debug!(
            "Ingestion wired to store '{}' and index '{}'",
            store.name(),
            index.name()
        );

        Self {
            input,
            report_parser: TransactionReportParser::new(store.clone()),
            store,
            index,
            log_parser: LogFileParser::new(),
            run_guard: Mutex::new(()),
        }
    }

    /// Run one full ingestion pass
    ///
    /// Returns after every discovered file has been processed, or on the
    /// first discovery/read failure.
    pub async fn ingest_logs(&self) -> Result<IngestionSummary> {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| Error::IngestionInProgress)?;

        let resources = discover_resources(&self.input).await?;
        tracing::info!("Discovered {} input file(s)", resources.len());

        let mut summary = IngestionSummary {
            files_discovered: resources.len(),
            ..Default::default()
        };

        for resource in &resources {
            let bytes = tokio::fs::read(&resource.path)
                .await
                .map_err(|e| Error::resource_discovery(&resource.path, e))?;
            let content = String::from_utf8_lossy(&bytes);

            let file_summary = self.ingest_content(&resource.name, &content).await;
            summary.merge(&file_summary);
        }

        tracing::info!(
            "Ingestion complete: {} records, {} units, {} dropped blocks, {} write failures",
            summary.records_written,
            summary.semantic_units_written,
            summary.blocks_dropped,
            summary.persistence_failures + summary.semantic_batches_failed
        );

        Ok(summary)
    }

    /// Route and ingest one file's content
    pub async fn ingest_content(&self, name: &str, content: &str) -> IngestionSummary {
        match FileRoute::for_name(name, &self.input) {
            FileRoute::Report => self.ingest_report(name, content).await,
            FileRoute::Log => self.ingest_log(name, content).await,
            FileRoute::Unsupported => {
                tracing::debug!("Skipping {}: unsupported suffix", name);
                IngestionSummary {
                    files_skipped: 1,
                    ..Default::default()
                }
            }
        }
    }

    async fn ingest_report(&self, name: &str, content: &str) -> IngestionSummary {
        tracing::info!("Ingesting report: {}", name);

        let parsed = self.report_parser.parse(content, name).await;
        let mut summary = IngestionSummary {
            report_files: 1,
            report_findings: parsed.findings.len(),
            records_written: parsed.persisted,
            persistence_failures: parsed.persistence_failures,
            ..Default::default()
        };

        if !parsed.units.is_empty() {
            self.write_units(name, &parsed.units, &mut summary).await;
        }

        tracing::info!("Ingested {} report entries from {}", parsed.findings.len(), name);
        summary
    }

    async fn ingest_log(&self, name: &str, content: &str) -> IngestionSummary {
        tracing::info!("Ingesting log file: {}", name);

        let mut summary = IngestionSummary {
            log_files: 1,
            ..Default::default()
        };

        // Structured sink, one record per headered block
        let parsed = self.log_parser.parse(content, name);
        summary.blocks_dropped = parsed.dropped_blocks;
        for record in &parsed.records {
            match self.store.insert_record(record).await {
                Ok(_) => summary.records_written += 1,
                Err(e) => {
                    tracing::error!("Error saving structured log from {}: {}", name, e);
                    summary.persistence_failures += 1;
                }
            }
        }

        // Semantic sink, one unit per non-empty line
        let units = line_units(content, name);
        self.write_units(name, &units, &mut summary).await;

        tracing::info!(
            "Ingested {} entries from {} ({} structured record(s))",
            units.len(),
            name,
            summary.records_written
        );
        summary
    }

    async fn write_units(
        &self,
        name: &str,
        units: &[SemanticUnit],
        summary: &mut IngestionSummary,
    ) {
        if units.is_empty() {
            return;
        }

        match self.index.add_batch(units).await {
            Ok(written) => summary.semantic_units_written += written,
            Err(e) => {
                tracing::error!(
                    "Error writing {} semantic unit(s) from {}: {}",
                    units.len(),
                    name,
                    e
                );
                summary.semantic_batches_failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::local::{LocalRecordStore, LocalSemanticIndex};
    use crate::providers::record_store::RejectingStore;
    use crate::providers::EmbeddingProvider;
    use crate::storage::LogDb;
    use crate::types::metadata_keys;
    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    /// Embeds text length; optionally waits on a gate or fails
    struct StubEmbedder {
        gate: Option<Arc<Semaphore>>,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if let Some(gate) = &self.gate {
                let _permit = gate
                    .acquire()
                    .await
                    .map_err(|e| Error::embedding(e.to_string()))?;
            }
            if self.fail {
                return Err(Error::embedding("model offline"));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        input: InputConfig,
        store: Arc<LocalRecordStore>,
        index: Arc<LocalSemanticIndex>,
    }

    fn fixture(embedder: StubEmbedder) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("simulated_logs");
        std::fs::create_dir_all(&log_dir).unwrap();
        std::fs::write(
            log_dir.join("payments.log"),
            "2024-01-01 10:00:00.000 ERROR [Svc] [PAY-PRC-9] boom\n\
             cause: x\n\
             2024-01-01 10:00:01.000 INFO [Svc] ok\n",
        )
        .unwrap();
        std::fs::write(
            log_dir.join("exceptions.txt"),
            "  9900009054750\n  ERROR MESSAGE: 000201S EMPTY ACTIVE MASTER DATABASE\n",
        )
        .unwrap();
        std::fs::write(log_dir.join("notes.md"), "ignored").unwrap();

        let input = InputConfig {
            log_dir,
            extra_files: vec![dir.path().join("transaction_log.txt")],
            ..InputConfig::default()
        };

        Fixture {
            input,
            store: Arc::new(LocalRecordStore::new(Arc::new(LogDb::in_memory().unwrap()))),
            index: Arc::new(LocalSemanticIndex::in_memory("test", Arc::new(embedder))),
            _dir: dir,
        }
    }

    fn orchestrator(f: &Fixture) -> IngestionOrchestrator {
        IngestionOrchestrator::new(f.input.clone(), f.store.clone(), f.index.clone())
    }

    #[test]
    fn test_routing() {
        let config = InputConfig::default();
        assert_eq!(FileRoute::for_name("transaction_log.txt", &config), FileRoute::Report);
        assert_eq!(FileRoute::for_name("app.log", &config), FileRoute::Log);
        assert_eq!(FileRoute::for_name("app.log.gz", &config), FileRoute::Unsupported);
    }

    #[tokio::test]
    async fn test_discovery_order_and_missing_extra() {
        let f = fixture(StubEmbedder { gate: None, fail: false });
        let names: Vec<String> = discover_resources(&f.input)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, vec!["exceptions.txt", "notes.md", "payments.log"]);
    }

    #[tokio::test]
    async fn test_missing_log_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let input = InputConfig {
            log_dir: dir.path().join("nope"),
            extra_files: Vec::new(),
            ..InputConfig::default()
        };
        assert!(discover_resources(&input).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_log_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("file.log");
        std::fs::write(&not_a_dir, "x").unwrap();
        let input = InputConfig {
            log_dir: not_a_dir,
            extra_files: Vec::new(),
            ..InputConfig::default()
        };

        let err = discover_resources(&input).await.unwrap_err();
        assert!(matches!(err, Error::ResourceDiscovery { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_full_pass() {
        let f = fixture(StubEmbedder { gate: None, fail: false });
        let summary = orchestrator(&f).ingest_logs().await.unwrap();

        assert_eq!(summary.files_discovered, 3);
        assert_eq!(summary.log_files, 1);
        assert_eq!(summary.report_files, 1);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.records_written, 3);
        assert_eq!(summary.report_findings, 1);
        // 3 log lines + 1 report finding
        assert_eq!(summary.semantic_units_written, 4);

        let counts = f.store.count_errors_by_code().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(
            f.store.distinct_source_files().await.unwrap(),
            vec!["exceptions.txt", "payments.log"]
        );

        let units = f.index.units();
        assert!(units
            .iter()
            .any(|u| u.get(metadata_keys::ACCOUNT_ID) == Some("9900009054750")));
    }

    #[tokio::test]
    async fn test_semantic_failure_keeps_structured_records() {
        let f = fixture(StubEmbedder { gate: None, fail: true });
        let summary = orchestrator(&f).ingest_logs().await.unwrap();

        assert_eq!(summary.records_written, 3);
        assert_eq!(summary.semantic_units_written, 0);
        assert_eq!(summary.semantic_batches_failed, 2);
        assert_eq!(f.store.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_still_indexes_log_lines() {
        let f = fixture(StubEmbedder { gate: None, fail: false });
        let orchestrator =
            IngestionOrchestrator::new(f.input.clone(), Arc::new(RejectingStore), f.index.clone());

        let content = "2024-01-01 10:00:00.000 ERROR [Svc] [PAY-PRC-9] boom\n\
                       cause: x\n\
                       \n\
                       2024-01-01 10:00:01.000 INFO [Svc] ok\n";
        let summary = orchestrator.ingest_content("payments.log", content).await;

        assert_eq!(summary.log_files, 1);
        assert_eq!(summary.records_written, 0);
        assert_eq!(summary.persistence_failures, 2);
        assert_eq!(summary.semantic_units_written, 3);
        assert_eq!(summary.semantic_batches_failed, 0);

        let texts: Vec<String> = f.index.units().into_iter().map(|u| u.text).collect();
        assert_eq!(
            texts,
            vec![
                "2024-01-01 10:00:00.000 ERROR [Svc] [PAY-PRC-9] boom",
                "cause: x",
                "2024-01-01 10:00:01.000 INFO [Svc] ok",
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_run_rejected() {
        let gate = Arc::new(Semaphore::new(0));
        let f = fixture(StubEmbedder {
            gate: Some(gate.clone()),
            fail: false,
        });
        let orchestrator = orchestrator(&f);

        let (first, second) = tokio::join!(orchestrator.ingest_logs(), async {
            let second = orchestrator.ingest_logs().await;
            gate.add_permits(1024);
            second
        });

        assert!(matches!(second, Err(Error::IngestionInProgress)));
        assert_eq!(first.unwrap().records_written, 3);
    }
}
