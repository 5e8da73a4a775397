//! Bugzilla REST source
//!
//! Lists bugs page by page through `/bug?limit=..&offset=..` and fetches the
//! comments of each bug through `/bug/{id}/comment`.

use crate::crawler::fetcher::Fetch;
use crate::crawler::normalize::{normalize, ResponseFormat};
use crate::crawler::source::CrawlSource;
use crate::crawler::walker::PaginationWalker;
use crate::output::{RecordRouter, RouteReport};
use crate::units::WorkUnit;
use crate::Result;
use async_trait::async_trait;

/// Crawls bugs and comments from a Bugzilla REST endpoint
pub struct BugzillaSource<F> {
    fetcher: F,
    rest_url: String,
    further_params: String,
    walker: PaginationWalker,
}

impl<F: Fetch> BugzillaSource<F> {
    /// Creates a source for `rest_url` (e.g. `https://host/rest/`)
    ///
    /// `further_params` is appended verbatim to every listing request and
    /// must start with '&' when non-empty.
    pub fn new(fetcher: F, rest_url: &str, further_params: Option<&str>, page_size: usize) -> Self {
        let mut rest_url = rest_url.to_string();
        if !rest_url.ends_with('/') {
            rest_url.push('/');
        }

        Self {
            fetcher,
            rest_url,
            further_params: further_params.unwrap_or_default().to_string(),
            walker: PaginationWalker::new(page_size),
        }
    }

    /// URL of the listing page starting at `offset`
    pub fn listing_url(&self, offset: usize) -> String {
        format!(
            "{}bug?limit={}{}&offset={}",
            self.rest_url,
            self.walker.step(),
            self.further_params,
            offset
        )
    }

    /// URL of the comments of one bug
    pub fn comment_url(&self, unit: &WorkUnit) -> String {
        format!("{}bug/{}/comment", self.rest_url, unit)
    }
}

#[async_trait]
impl<F: Fetch> CrawlSource for BugzillaSource<F> {
    fn name(&self) -> &'static str {
        "bugzilla"
    }

    fn can_list_units(&self) -> bool {
        true
    }

    async fn list_units(&self, router: &RecordRouter) -> Result<(Vec<WorkUnit>, RouteReport)> {
        tracing::info!("Listing bugs from {}", self.rest_url);

        let listing = self
            .walker
            .crawl_all(|offset| {
                let url = self.listing_url(offset);
                async move { self.fetcher.fetch(&url).await }
            })
            .await?;

        let report = router.route_bug_listing(&listing);
        Ok((listing.ids, report))
    }

    async fn crawl_unit(&self, unit: &WorkUnit, router: &RecordRouter) -> Result<RouteReport> {
        let body = self.fetcher.fetch(&self.comment_url(unit)).await?;
        let page = normalize(&body, &ResponseFormat::BugComments(unit.to_string()))?;
        tracing::debug!("Bug {}: {} comments", unit, page.records.len());
        Ok(router.route_comments(unit, &page.records))
    }
}
