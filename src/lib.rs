//! Issue-Trawler: a paginated crawler for issue-tracker and code-review APIs
//!
//! This crate walks Bugzilla-style bug/comment endpoints and Gerrit-style
//! change queries to completion, fans per-unit crawls out over a fixed worker
//! pool, and routes every decoded record to a SQLite document store and/or
//! flat files.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod units;

use thiserror::Error;

/// Main error type for Issue-Trawler operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Sink write failed ({sink} -> {target}): {message}")]
    SinkWrite {
        sink: String,
        target: String,
        message: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker task died; `partial` holds what the other workers reported
    #[error("Worker task failed: {message}")]
    WorkerPanicked {
        message: String,
        partial: Box<output::CrawlReport>,
    },
}

impl TrawlError {
    /// Returns true for the conditions that are reported instead of failing the process
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid date in config: {0}")]
    InvalidDate(String),
}

/// Result type alias for Issue-Trawler operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlMode, CrawlModeDispatcher};
pub use output::{CrawlReport, RecordRouter};
pub use units::WorkUnit;
