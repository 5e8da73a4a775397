//! Crawler module for paginated API walks
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and the optional login session
//! - Response normalization into flat record lists
//! - Pagination to completion, with inactive-account re-resolution
//! - Unit partitioning and the parallel worker pool
//! - The Bugzilla and Gerrit sources, and mode dispatch over them

mod bugzilla;
mod coordinator;
mod dispatcher;
mod executor;
mod fetcher;
mod gerrit;
mod normalize;
mod partition;
mod source;
mod walker;

pub use bugzilla::BugzillaSource;
pub use coordinator::{run_crawl, Coordinator};
pub use dispatcher::{CrawlMode, CrawlModeDispatcher};
pub use executor::ParallelCrawlExecutor;
pub use fetcher::{build_http_client, Fetch, HttpFetcher};
pub use gerrit::GerritSource;
pub use normalize::{normalize, Page, Record, ResponseFormat, MORE_CHANGES_FIELD};
pub use partition::partition;
pub use source::CrawlSource;
pub use walker::{
    extract_account_candidate, CrawlResult, Listing, PaginationWalker, ID_FIELD,
    INACTIVE_ACCOUNT_MARKER,
};
