//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for structured log records.

mod database;

pub use database::LogDb;
