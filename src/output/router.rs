//! Record routing
//!
//! Writes each batch to every configured sink. A failing sink never stops
//! the other one from being attempted; failures come back in the
//! `RouteReport` instead of being raised mid-routing.

use crate::crawler::{CrawlResult, Listing, Record};
use crate::output::layout::{Category, UNIT_ARTIFACT};
use crate::output::report::{RouteReport, SinkKind};
use crate::storage::{DocumentStore, FileSink, WriteMode};
use crate::units::{save_units, WorkUnit};
use serde_json::{json, Value};
use std::sync::Arc;

/// Account id field of a Gerrit change owner
const OWNER_FIELD: &str = "owner";
const ACCOUNT_ID_FIELD: &str = "_account_id";

/// Routes crawled records to the document store and/or the file folder
#[derive(Clone)]
pub struct RecordRouter {
    store: Option<Arc<dyn DocumentStore>>,
    files: Option<FileSink>,
    separator: String,
    commit_buckets: u64,
}

impl RecordRouter {
    /// Creates a router over the given sinks
    ///
    /// Either sink may be absent; with neither, routing only logs.
    pub fn new(
        store: Option<Arc<dyn DocumentStore>>,
        files: Option<FileSink>,
        separator: impl Into<String>,
        commit_buckets: u64,
    ) -> Self {
        Self {
            store,
            files,
            separator: separator.into(),
            commit_buckets: commit_buckets.max(1),
        }
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn has_files(&self) -> bool {
        self.files.is_some()
    }

    /// Writes `records` of `category` to every configured sink
    ///
    /// An empty batch writes nothing, except that files rewritten on every
    /// listing are still truncated so they never outlive the listing.
    pub fn route(&self, category: Category, records: &[Record]) -> RouteReport {
        let mut report = RouteReport::default();
        let rewrites_file = category.write_mode() == WriteMode::Truncate;
        if records.is_empty() && !rewrites_file {
            return report;
        }

        if let Some(store) = self.store.as_ref().filter(|_| !records.is_empty()) {
            let collection = category.collection();
            let result = if category.is_bulk() {
                store.insert_many(&collection, records)
            } else {
                records
                    .iter()
                    .try_for_each(|record| store.insert_one(&collection, record))
            };
            match result {
                Ok(()) => report.record_write(SinkKind::Store, &collection, records.len()),
                Err(e) => report.record_failure(SinkKind::Store, &collection, e.to_string()),
            }
        }

        if let Some(files) = &self.files {
            let file_name = category.file_name();
            let result = records
                .iter()
                .map(|record| category.render_line(record, &self.separator))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())
                .and_then(|lines| {
                    files
                        .write_lines(&file_name, &lines, category.write_mode())
                        .map_err(|e| e.to_string())
                });
            match result {
                Ok(()) => report.record_write(SinkKind::Files, &file_name, records.len()),
                Err(message) => report.record_failure(SinkKind::Files, &file_name, message),
            }
        }

        report
    }

    /// Routes a finished bug listing
    ///
    /// Bugs go to `BugsData`, identifiers to `BugIDs`, and with a file sink
    /// the identifier list is also saved as the restart artifact.
    pub fn route_bug_listing(&self, listing: &Listing) -> RouteReport {
        let id_documents: Vec<Record> = listing
            .ids
            .iter()
            .map(|id| to_record(json!({ "ID": id.to_value() })))
            .collect();

        let mut report = self.route(Category::BugIds, &id_documents);
        report.merge(self.route(Category::Bugs, &listing.records));

        if let Some(files) = &self.files {
            match save_units(&files.path_of(UNIT_ARTIFACT), &listing.ids) {
                Ok(()) => report.record_write(SinkKind::Files, UNIT_ARTIFACT, listing.ids.len()),
                Err(e) => report.record_failure(SinkKind::Files, UNIT_ARTIFACT, e.to_string()),
            }
        }

        report
    }

    /// Routes the comments of one bug; an empty list writes nothing
    pub fn route_comments(&self, unit: &WorkUnit, comments: &[Record]) -> RouteReport {
        if comments.is_empty() {
            tracing::debug!("Bug {} has no comments", unit);
            return RouteReport::default();
        }
        self.route(Category::Comments, comments)
    }

    /// Routes the commits of one user
    ///
    /// Users without commits land in `noCommits`. Otherwise the commits go to
    /// the bucket picked by the owner's account id and a developer summary is
    /// written to `allDevs`.
    pub fn route_commits(&self, result: &CrawlResult) -> RouteReport {
        let author = result.unit.to_value();

        if result.records.is_empty() {
            let marker = to_record(json!({ "author": author, "active": result.is_active }));
            return self.route(Category::NoCommits, &[marker]);
        }

        let account_id = account_id_of(&result.records[0]);
        let bucket = match account_id {
            Some(id) => id % self.commit_buckets,
            None => {
                tracing::warn!(
                    "No {}.{} on commits of {}, using bucket 0",
                    OWNER_FIELD,
                    ACCOUNT_ID_FIELD,
                    result.unit
                );
                0
            }
        };

        let mut report = self.route(Category::Commits(bucket), &result.records);

        let summary = to_record(json!({
            "author": author,
            "user-id": account_id,
            "commits": result.total_count,
            "active": result.is_active,
        }));
        report.merge(self.route(Category::Devs, &[summary]));

        report
    }
}

/// Reads `owner._account_id` from a commit record
fn account_id_of(record: &Record) -> Option<u64> {
    record
        .get(OWNER_FIELD)
        .and_then(|owner| owner.get(ACCOUNT_ID_FIELD))
        .and_then(Value::as_u64)
}

fn to_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
