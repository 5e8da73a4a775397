//! Response normalization
//!
//! Both source protocols return loosely shaped text: Gerrit prefixes its JSON
//! with a `)]}'` guard line and flags further pages with a `_more_changes`
//! field inside the last change, while Bugzilla wraps records in a `bugs`
//! envelope. Everything is turned into one `Page` of records here.

use crate::{Result, TrawlError};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// An opaque record mapping (bug, comment or commit)
pub type Record = Map<String, Value>;

/// Field Gerrit uses to flag that more changes are available
pub const MORE_CHANGES_FIELD: &str = "_more_changes";

/// Anti-XSSI guard line Gerrit prepends to every JSON response
const GERRIT_META_LINE: &str = ")]}'";

/// One decoded server response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub more_available: bool,
}

/// The response shapes the crawler understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Bugzilla bug listing: `{"bugs": [...]}`
    BugList,

    /// Bugzilla comments of one bug: `{"bugs": {"<id>": {"comments": [...]}}}`
    BugComments(String),

    /// Gerrit change query: optional guard line, then `[...]`
    GerritChanges,
}

/// Decodes a raw response body into a page of records
///
/// An empty body (after the guard line, for Gerrit) yields an empty page with
/// no more data. A body that still fails to decode is reported as
/// `MalformedResponse`; nothing is retried here.
pub fn normalize(body: &str, format: &ResponseFormat) -> Result<Page> {
    let body = match format {
        ResponseFormat::GerritChanges => strip_meta_line(body),
        _ => body,
    };

    if body.trim().is_empty() {
        return Ok(Page::default());
    }

    // The marker must be read off the text: once decoded it is just another
    // field on the last record.
    let more_available = matches!(format, ResponseFormat::GerritChanges) && has_more_marker(body);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| TrawlError::MalformedResponse(format!("{} ({})", e, excerpt(body))))?;

    let records = match format {
        ResponseFormat::BugList => {
            let bugs = value
                .get("bugs")
                .ok_or_else(|| malformed("missing 'bugs' array", body))?;
            into_records(bugs, body)?
        }
        ResponseFormat::BugComments(bug_id) => {
            let comments = value
                .get("bugs")
                .and_then(|bugs| bugs.get(bug_id.as_str()))
                .and_then(|bug| bug.get("comments"))
                .ok_or_else(|| malformed(&format!("no comments for bug {}", bug_id), body))?;
            into_records(comments, body)?
        }
        ResponseFormat::GerritChanges => {
            let mut records = into_records(&value, body)?;
            for record in &mut records {
                record.remove(MORE_CHANGES_FIELD);
            }
            records
        }
    };

    Ok(Page {
        records,
        more_available,
    })
}

/// Drops the Gerrit guard line if the body starts with it
fn strip_meta_line(body: &str) -> &str {
    if !body.starts_with(GERRIT_META_LINE) {
        return body;
    }
    match body.split_once('\n') {
        Some((_, rest)) => rest,
        None => "",
    }
}

fn has_more_marker(body: &str) -> bool {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER
        .get_or_init(|| Regex::new(r#""_more_changes"\s*:\s*true"#).expect("static regex"))
        .is_match(body)
}

fn into_records(value: &Value, body: &str) -> Result<Vec<Record>> {
    let items = value
        .as_array()
        .ok_or_else(|| malformed("expected an array of records", body))?;

    items
        .iter()
        .map(|item| {
            item.as_object()
                .cloned()
                .ok_or_else(|| malformed("record is not an object", body))
        })
        .collect()
}

fn malformed(reason: &str, body: &str) -> TrawlError {
    TrawlError::MalformedResponse(format!("{} ({})", reason, excerpt(body)))
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(80) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
