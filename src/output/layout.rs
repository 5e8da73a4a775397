//! Sink layout
//!
//! Names the collection and file every record category is written to, and
//! how each category is encoded as text lines.

use crate::crawler::Record;
use crate::storage::WriteMode;
use serde_json::Value;

/// Name of the restart artifact written next to the listing files
pub const UNIT_ARTIFACT: &str = "bugIDList.json";

/// A destination bucket for routed records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Listed bug identifiers, one `{"ID": id}` document each
    BugIds,

    /// Listed bug records
    Bugs,

    /// Comments of one bug
    Comments,

    /// Commits of one user, bucketed by account id modulo the bucket count
    Commits(u64),

    /// Users without commits
    NoCommits,

    /// One summary per user with commits
    Devs,
}

/// Line encoding of a category's file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEncoding {
    /// One compact JSON object per line
    JsonLines,

    /// The named fields joined by the separator
    Columns(&'static [&'static str]),
}

impl Category {
    /// Document store collection name
    pub fn collection(&self) -> String {
        match self {
            Self::BugIds => "BugIDs".to_string(),
            Self::Bugs => "BugsData".to_string(),
            Self::Comments => "Comments".to_string(),
            Self::Commits(bucket) => format!("id{}", bucket),
            Self::NoCommits => "noCommits".to_string(),
            Self::Devs => "allDevs".to_string(),
        }
    }

    /// File name under the output folder
    pub fn file_name(&self) -> String {
        match self {
            Self::BugIds => "bugIDList.csv".to_string(),
            Self::Bugs => "bugsData.txt".to_string(),
            Self::Comments => "Bugzilla_Comments.txt".to_string(),
            Self::Commits(bucket) => format!("id{}.csv", bucket),
            Self::NoCommits => "noCommitsUser.csv".to_string(),
            Self::Devs => "allDevs.csv".to_string(),
        }
    }

    /// Listing files are rewritten per run; everything else accumulates
    pub fn write_mode(&self) -> WriteMode {
        match self {
            Self::BugIds | Self::Bugs => WriteMode::Truncate,
            _ => WriteMode::Append,
        }
    }

    /// Whether the store receives the batch in one bulk insert
    pub fn is_bulk(&self) -> bool {
        matches!(self, Self::Bugs | Self::Comments | Self::Commits(_))
    }

    pub fn encoding(&self) -> FileEncoding {
        match self {
            Self::BugIds => FileEncoding::Columns(&["ID"]),
            Self::NoCommits => FileEncoding::Columns(&["author", "active"]),
            Self::Devs => FileEncoding::Columns(&["author", "user-id", "commits", "active"]),
            _ => FileEncoding::JsonLines,
        }
    }

    /// Renders one record as a file line
    pub fn render_line(&self, record: &Record, separator: &str) -> Result<String, serde_json::Error> {
        match self.encoding() {
            FileEncoding::JsonLines => serde_json::to_string(record),
            FileEncoding::Columns(fields) => Ok(fields
                .iter()
                .map(|field| record.get(*field).map(render_scalar).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(separator)),
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_commit_buckets_are_named_by_index() {
        assert_eq!(Category::Commits(7).collection(), "id7");
        assert_eq!(Category::Commits(7).file_name(), "id7.csv");
    }

    #[test]
    fn test_render_columns() {
        let dev = record(json!({"author": "alice", "user-id": 1000, "commits": 12, "active": true}));
        assert_eq!(
            Category::Devs.render_line(&dev, ";").unwrap(),
            "alice;1000;12;true"
        );

        let no_commits = record(json!({"author": "bob", "active": false}));
        assert_eq!(
            Category::NoCommits.render_line(&no_commits, ",").unwrap(),
            "bob,false"
        );
    }

    #[test]
    fn test_render_missing_column_is_empty() {
        let dev = record(json!({"author": "carol", "user-id": null, "commits": 1, "active": true}));
        assert_eq!(
            Category::Devs.render_line(&dev, ",").unwrap(),
            "carol,,1,true"
        );
    }

    #[test]
    fn test_render_json_line() {
        let bug = record(json!({"id": 5, "summary": "crash"}));
        let line = Category::Bugs.render_line(&bug, ",").unwrap();
        assert_eq!(serde_json::from_str::<Record>(&line).unwrap(), bug);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_write_modes() {
        assert_eq!(Category::Bugs.write_mode(), WriteMode::Truncate);
        assert_eq!(Category::Comments.write_mode(), WriteMode::Append);
        assert_eq!(Category::Commits(0).write_mode(), WriteMode::Append);
    }
}
