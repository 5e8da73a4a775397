//! Storage module for persisting crawl records
//!
//! This module provides the two persistence backends records are routed to:
//! - A SQLite document store with named collections and run bookkeeping
//! - A flat-file sink writing line batches under a base directory

mod files;
mod schema;
mod sqlite;
mod traits;

pub use files::{FileSink, WriteMode};
pub use sqlite::SqliteStore;
pub use traits::{DocumentStore, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a document store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub mode: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
