//! Storage traits and error types
//!
//! This module defines the narrow interface the crawl core writes through
//! and the associated error types.

use crate::crawler::Record;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A document store with named logical collections
///
/// Implementations must accept concurrent callers: workers on different
/// partitions may insert into the same collection at the same time. No
/// transactional guarantee is required across calls.
pub trait DocumentStore: Send + Sync {
    /// Inserts a single document into `collection`
    fn insert_one(&self, collection: &str, document: &Record) -> StorageResult<()>;

    /// Inserts a batch of documents into `collection`
    ///
    /// An empty batch is a no-op.
    fn insert_many(&self, collection: &str, documents: &[Record]) -> StorageResult<()>;

    /// Counts the documents in `collection`
    fn count(&self, collection: &str) -> StorageResult<u64>;

    /// Returns all documents of `collection` in insertion order
    fn find_all(&self, collection: &str) -> StorageResult<Vec<Record>>;

    /// Lists collection names that hold at least one document
    fn collections(&self) -> StorageResult<Vec<String>>;
}
