//! Statistics from the document store
//!
//! This module provides functionality for extracting and displaying what a
//! previous crawl left in the store.

use crate::storage::{DocumentStore, RunRecord, SqliteStore};
use crate::Result;

/// Document store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Document count per collection, sorted by collection name
    pub collections: Vec<(String, u64)>,

    /// Total number of documents
    pub total_documents: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from the store
pub fn load_statistics(store: &SqliteStore) -> Result<StoreStatistics> {
    let mut collections = Vec::new();
    for name in store.collections()? {
        let count = store.count(&name)?;
        collections.push((name, count));
    }

    let total_documents = collections.iter().map(|(_, count)| count).sum();
    let latest_run = store.get_latest_run()?;

    Ok(StoreStatistics {
        collections,
        total_documents,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Mode: {}", run.mode);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Config hash: {}", run.config_hash);
        println!();
    }

    println!("Collections ({}):", stats.collections.len());
    for (name, count) in &stats.collections {
        println!("  {}: {}", name, count);
    }
    println!();

    println!("Total documents: {}", stats.total_documents);
}
