use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// Main configuration structure for Issue-Trawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub login: Option<LoginConfig>,
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Which protocol the crawled endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Bugzilla,
    Gerrit,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Protocol of the endpoint
    pub kind: SourceKind,

    /// Bugzilla REST base (`https://host/rest/`) or Gerrit changes endpoint
    pub url: String,

    /// Extra query parameters appended to the bug listing, starting with '&'
    #[serde(rename = "further-params", default)]
    pub further_params: Option<String>,

    /// Bug listing page size (`limit=` and offset step)
    #[serde(rename = "page-size", default = "default_step")]
    pub page_size: usize,

    /// Gerrit start point increase; equals the server's result limit per query
    #[serde(rename = "start-point-increase", default = "default_step")]
    pub start_point_increase: usize,

    /// Optional `before:` bound for Gerrit queries (yyyy-mm-dd)
    #[serde(default)]
    pub before: Option<String>,

    /// Optional `after:` bound for Gerrit queries (yyyy-mm-dd)
    #[serde(default)]
    pub after: Option<String>,
}

/// Credentials posted once before crawling
#[derive(Debug, Clone, Deserialize)]
pub struct LoginConfig {
    pub url: String,
    pub name: String,
    pub password: String,
}

/// Crawl mode and parallelism
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Mode name (`units-only`, `parallel-both`, ...) or its index 0..5
    #[serde(deserialize_with = "mode_name_or_index")]
    pub mode: String,

    /// Number of parallel workers for the parallel modes
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Path to a persisted unit list for the detail-only modes
    #[serde(rename = "unit-list", default)]
    pub unit_list: Option<PathBuf>,

    /// Inline unit list; takes precedence over `unit-list`
    #[serde(default)]
    pub units: Option<Vec<crate::units::WorkUnit>>,
}

/// Sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Folder for flat-file output; created if absent
    #[serde(default)]
    pub folder: Option<PathBuf>,

    /// Path to the SQLite document store
    #[serde(rename = "database-path", default)]
    pub database_path: Option<PathBuf>,

    /// Column separator for the csv sinks
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Number of commit sinks commits are spread over by account id
    #[serde(rename = "commit-buckets", default = "default_buckets")]
    pub commit_buckets: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: None,
            database_path: None,
            separator: default_separator(),
            commit_buckets: default_buckets(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Accepts `mode = "parallel-both"`, `mode = "3"` and `mode = 3` alike
fn mode_name_or_index<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ModeValue {
        Name(String),
        Index(u64),
    }

    Ok(match ModeValue::deserialize(deserializer)? {
        ModeValue::Name(name) => name,
        ModeValue::Index(index) => index.to_string(),
    })
}

fn default_step() -> usize {
    500
}

fn default_workers() -> usize {
    10
}

fn default_separator() -> String {
    ",".to_string()
}

fn default_buckets() -> u64 {
    10
}
