//! Configuration for the ingestion pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogbotConfig {
    /// Where input files are discovered and how they are routed
    pub input: InputConfig,
    /// Structured store configuration
    pub database: DatabaseConfig,
    /// Semantic index configuration
    pub semantic_index: SemanticIndexConfig,
    /// Embedding model configuration
    pub embeddings: EmbeddingConfig,
}

impl LogbotConfig {
    /// Load configuration from a TOML file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check routing and model settings
    pub fn validate(&self) -> Result<()> {
        self.input.validate()?;
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be non-zero".to_string()));
        }
        if self.semantic_index.collection.trim().is_empty() {
            return Err(Error::Config("semantic_index.collection must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Input discovery and routing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory scanned (non-recursively) for input files
    pub log_dir: PathBuf,
    /// Extra files checked on their own; missing ones are skipped
    pub extra_files: Vec<PathBuf>,
    /// File name suffix of log-shaped files
    pub log_suffix: String,
    /// File name suffix of transaction reports
    pub report_suffix: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("simulated_logs"),
            extra_files: vec![PathBuf::from("transaction_log.txt")],
            log_suffix: ".log".to_string(),
            report_suffix: ".txt".to_string(),
        }
    }
}

impl InputConfig {
    /// Suffixes must be non-empty and distinct
    pub fn validate(&self) -> Result<()> {
        if self.log_suffix.is_empty() || self.report_suffix.is_empty() {
            return Err(Error::Config("input suffixes must not be empty".to_string()));
        }
        if self.log_suffix == self.report_suffix {
            return Err(Error::Config(format!(
                "log and report suffix are both '{}'",
                self.log_suffix
            )));
        }
        Ok(())
    }
}

/// SQLite record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("logbot")
            .join("logs.db");

        Self { path }
    }
}

/// Semantic index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticIndexConfig {
    /// Collection name recorded in the snapshot
    pub collection: String,
    /// JSON snapshot file; None keeps the index in memory only
    pub storage_path: Option<PathBuf>,
}

impl Default for SemanticIndexConfig {
    fn default() -> Self {
        Self {
            collection: "log-embeddings".to_string(),
            storage_path: None,
        }
    }
}

/// Embedding model configuration (Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 15,
        }
    }
}
