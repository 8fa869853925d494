//! Local provider implementations: SQLite record store and an in-process
//! semantic index

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SemanticIndexConfig;
use crate::error::{Error, Result};
use crate::storage::LogDb;
use crate::types::{ErrorCodeCount, LogRecord, SemanticMatch, SemanticUnit};

use super::embedding::EmbeddingProvider;
use super::record_store::RecordStore;
use super::semantic_index::SemanticIndex;

/// Record store wrapping the SQLite log database
pub struct LocalRecordStore {
    db: Arc<LogDb>,
}

impl LocalRecordStore {
    /// Create from an open database
    pub fn new(db: Arc<LogDb>) -> Self {
        Self { db }
    }

    /// Get underlying database for direct access
    pub fn inner(&self) -> &Arc<LogDb> {
        &self.db
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&LogDb) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(db.as_ref()))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    async fn insert_record(&self, record: &LogRecord) -> Result<i64> {
        let record = record.clone();
        self.blocking(move |db| db.insert_record(&record)).await
    }

    async fn find_by_error_code(&self, error_code: &str) -> Result<Vec<LogRecord>> {
        let error_code = error_code.to_string();
        self.blocking(move |db| db.find_by_error_code(&error_code)).await
    }

    async fn find_by_level(&self, level: &str) -> Result<Vec<LogRecord>> {
        let level = level.to_string();
        self.blocking(move |db| db.find_by_level(&level)).await
    }

    async fn count_errors_by_code(&self) -> Result<Vec<ErrorCodeCount>> {
        self.blocking(|db| db.count_errors_by_code()).await
    }

    async fn count_errors_by_code_and_file(
        &self,
        source_file: &str,
    ) -> Result<Vec<ErrorCodeCount>> {
        let source_file = source_file.to_string();
        self.blocking(move |db| db.count_errors_by_code_and_file(&source_file))
            .await
    }

    async fn distinct_source_files(&self) -> Result<Vec<String>> {
        self.blocking(|db| db.distinct_source_files()).await
    }

    async fn len(&self) -> Result<usize> {
        self.blocking(|db| db.count()).await
    }

    fn name(&self) -> &str {
        "local-sqlite"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedUnit {
    unit: SemanticUnit,
    embedding: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    collection: String,
    entries: Vec<IndexedUnit>,
}

/// In-process semantic index with brute-force cosine search
///
/// Each batch is embedded in full before anything is stored, so a failed
/// embedding call leaves the index unchanged. With a snapshot path set the
/// whole index is rewritten as JSON before a batch is committed, and a
/// failed write leaves the batch out.
pub struct LocalSemanticIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    entries: RwLock<Vec<IndexedUnit>>,
    snapshot_path: Option<PathBuf>,
}

impl LocalSemanticIndex {
    /// Create an index, loading an existing snapshot if configured
    pub fn open(
        config: &SemanticIndexConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let mut entries = Vec::new();

        if let Some(path) = &config.storage_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let snapshot: IndexSnapshot = serde_json::from_str(&content)?;
                if snapshot.collection != config.collection {
                    return Err(Error::Config(format!(
                        "Snapshot {} holds collection '{}', expected '{}'",
                        path.display(),
                        snapshot.collection,
                        config.collection
                    )));
                }
                entries = snapshot.entries;
                tracing::info!("Loaded {} semantic units from {}", entries.len(), path.display());
            }
        }

        Ok(Self {
            embedder,
            collection: config.collection.clone(),
            entries: RwLock::new(entries),
            snapshot_path: config.storage_path.clone(),
        })
    }

    /// Create an empty, unpersisted index
    pub fn in_memory(collection: impl Into<String>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            collection: collection.into(),
            entries: RwLock::new(Vec::new()),
            snapshot_path: None,
        }
    }

    /// Copy of every stored unit, in insertion order
    pub fn units(&self) -> Vec<SemanticUnit> {
        self.entries.read().iter().map(|e| e.unit.clone()).collect()
    }

    /// Write the stored entries plus `pending` to the snapshot file
    async fn save_snapshot(&self, pending: &[IndexedUnit]) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let json = {
            let entries = self.entries.read();
            serde_json::to_string(&SnapshotRef {
                collection: &self.collection,
                entries: entries.iter().chain(pending).collect(),
            })?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    collection: &'a str,
    entries: Vec<&'a IndexedUnit>,
}

#[async_trait]
impl SemanticIndex for LocalSemanticIndex {
    async fn add_batch(&self, units: &[SemanticUnit]) -> Result<usize> {
        if units.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != units.len() {
            return Err(Error::semantic_index(format!(
                "{} returned {} embeddings for {} units",
                self.embedder.name(),
                embeddings.len(),
                units.len()
            )));
        }

        let batch: Vec<IndexedUnit> = units
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(unit, embedding)| IndexedUnit { unit, embedding })
            .collect();

        // Nothing becomes visible until the snapshot holding it is on disk
        self.save_snapshot(&batch).await?;
        self.entries.write().extend(batch);
        Ok(units.len())
    }

    async fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SemanticMatch>> {
        let entries = self.entries.read();

        let mut matches: Vec<SemanticMatch> = entries
            .iter()
            .map(|entry| SemanticMatch {
                unit: entry.unit.clone(),
                similarity: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "local-memory"
    }
}

/// Cosine similarity; zero for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(d, na, nb), (x, y)| {
            (d + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
