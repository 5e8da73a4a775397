//! The crawl source seam
//!
//! A source knows one protocol's URLs and response shapes. The dispatcher
//! only talks to sources through this trait.

use crate::output::{RecordRouter, RouteReport};
use crate::units::WorkUnit;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CrawlSource: Send + Sync {
    /// Short protocol name for logs
    fn name(&self) -> &'static str;

    /// Whether `list_units` is supported
    fn can_list_units(&self) -> bool;

    /// Walks the full listing, routes it and returns the unit list it yields
    async fn list_units(&self, router: &RecordRouter) -> Result<(Vec<WorkUnit>, RouteReport)>;

    /// Crawls everything belonging to one unit and routes it
    async fn crawl_unit(&self, unit: &WorkUnit, router: &RecordRouter) -> Result<RouteReport>;
}
