//! Work units and the restart artifact
//!
//! A work unit is the identifier driving one detail crawl: a numeric bug ID
//! for Bugzilla comment crawls or a username for Gerrit commit crawls.
//!
//! # Components
//!
//! - `WorkUnit`: the immutable unit identifier
//! - `save_units` / `load_units`: the persisted unit list a later run can resume from

mod artifact;

pub use artifact::{load_units, save_units};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One unit of work for a detail crawl
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkUnit {
    /// A numeric identifier (Bugzilla bug ID, Gerrit account ID)
    Id(u64),

    /// A textual identifier (Gerrit username)
    Name(String),
}

impl WorkUnit {
    /// Builds a unit from a decoded JSON value
    ///
    /// Only non-negative integers and strings qualify; anything else yields None.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(Self::Id),
            Value::String(s) if !s.is_empty() => Some(Self::Name(s.clone())),
            _ => None,
        }
    }

    /// Parses one line of a line-delimited unit list
    ///
    /// Purely numeric lines become `Id`, everything else becomes `Name`.
    /// Blank lines yield None.
    pub fn parse_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<u64>() {
            Ok(id) => Some(Self::Id(id)),
            Err(_) => Some(Self::Name(trimmed.to_string())),
        }
    }

    /// Converts the unit into a JSON value for storage
    pub fn to_value(&self) -> Value {
        match self {
            Self::Id(id) => Value::from(*id),
            Self::Name(name) => Value::from(name.as_str()),
        }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for WorkUnit {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for WorkUnit {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}
