//! Gerrit change-query source
//!
//! Crawls the changes owned by each user through
//! `?q=owner:<user>[+before:<date>][+after:<date>]&S=<start>`. Gerrit has no
//! endpoint that enumerates users, so the unit list must come from the caller.

use crate::crawler::fetcher::Fetch;
use crate::crawler::source::CrawlSource;
use crate::crawler::walker::PaginationWalker;
use crate::output::{RecordRouter, RouteReport};
use crate::units::WorkUnit;
use crate::{Result, TrawlError};
use async_trait::async_trait;
use url::form_urlencoded::byte_serialize;

/// Crawls commits per user from a Gerrit changes endpoint
pub struct GerritSource<F> {
    fetcher: F,
    base_url: String,
    before: Option<String>,
    after: Option<String>,
    walker: PaginationWalker,
}

impl<F: Fetch> GerritSource<F> {
    /// Creates a source for the changes endpoint at `url`
    ///
    /// `start_point_increase` must equal the server's per-query result limit.
    pub fn new(
        fetcher: F,
        url: &str,
        before: Option<String>,
        after: Option<String>,
        start_point_increase: usize,
    ) -> Self {
        let mut base_url = url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Self {
            fetcher,
            base_url,
            before,
            after,
            walker: PaginationWalker::new(start_point_increase),
        }
    }

    /// Query URL for `owner` starting at `start`
    pub fn query_url(&self, owner: &str, start: usize) -> String {
        let owner: String = byte_serialize(owner.as_bytes()).collect();
        let mut url = format!("{}?q=owner:{}", self.base_url, owner);

        if let Some(before) = &self.before {
            url.push_str("+before:");
            url.push_str(before);
        }
        if let Some(after) = &self.after {
            url.push_str("+after:");
            url.push_str(after);
        }

        url.push_str(&format!("&S={}", start));
        url
    }
}

#[async_trait]
impl<F: Fetch> CrawlSource for GerritSource<F> {
    fn name(&self) -> &'static str {
        "gerrit"
    }

    fn can_list_units(&self) -> bool {
        false
    }

    async fn list_units(&self, _router: &RecordRouter) -> Result<(Vec<WorkUnit>, RouteReport)> {
        Err(TrawlError::InvalidArgument(
            "a gerrit source cannot enumerate units; supply a unit list".to_string(),
        ))
    }

    async fn crawl_unit(&self, unit: &WorkUnit, router: &RecordRouter) -> Result<RouteReport> {
        let result = self
            .walker
            .crawl_unit(unit, |owner, start| {
                let url = self.query_url(&owner, start);
                async move { self.fetcher.fetch(&url).await }
            })
            .await?;

        tracing::debug!(
            "{}: {} commits (active: {})",
            unit,
            result.total_count,
            result.is_active
        );
        Ok(router.route_commits(&result))
    }
}
