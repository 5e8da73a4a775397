//! Crawl mode dispatch
//!
//! Maps each of the six crawl modes to its behavior: list units, crawl
//! details for a unit list (sequentially or in parallel), both in sequence,
//! or nothing at all.

use crate::crawler::executor::ParallelCrawlExecutor;
use crate::crawler::source::CrawlSource;
use crate::output::{CrawlReport, RecordRouter};
use crate::units::WorkUnit;
use crate::{Result, TrawlError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What a dispatch does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlMode {
    /// Walk the listing only; routes records and ids
    UnitsOnly,

    /// Detail crawl over a supplied unit list, one unit at a time
    DetailOnly,

    /// Listing, then a sequential detail crawl over its ids
    SequentialBoth,

    /// Detail crawl over a supplied unit list with the worker pool
    ParallelDetailOnly,

    /// Listing, then a parallel detail crawl over its ids
    ParallelBoth,

    /// No I/O at all
    NoOp,
}

impl CrawlMode {
    pub const ALL: [CrawlMode; 6] = [
        Self::UnitsOnly,
        Self::DetailOnly,
        Self::SequentialBoth,
        Self::ParallelDetailOnly,
        Self::ParallelBoth,
        Self::NoOp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnitsOnly => "units-only",
            Self::DetailOnly => "detail-only",
            Self::SequentialBoth => "sequential-both",
            Self::ParallelDetailOnly => "parallel-detail-only",
            Self::ParallelBoth => "parallel-both",
            Self::NoOp => "no-op",
        }
    }

    /// Modes that walk the listing first
    pub fn lists_units(&self) -> bool {
        matches!(self, Self::UnitsOnly | Self::SequentialBoth | Self::ParallelBoth)
    }

    /// Modes that need a unit list from the caller
    pub fn requires_units(&self) -> bool {
        matches!(self, Self::DetailOnly | Self::ParallelDetailOnly)
    }

    /// Modes that crawl unit details
    pub fn crawls_details(&self) -> bool {
        !matches!(self, Self::UnitsOnly | Self::NoOp)
    }

    /// Modes that use the full worker pool
    pub fn is_parallel(&self) -> bool {
        matches!(self, Self::ParallelDetailOnly | Self::ParallelBoth)
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrawlMode {
    type Err = TrawlError;

    /// Accepts the kebab-case name, the classic short name or the index 0..5
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "units-only" | "bug" | "0" => Ok(Self::UnitsOnly),
            "detail-only" | "comment" | "1" => Ok(Self::DetailOnly),
            "sequential-both" | "both" | "2" => Ok(Self::SequentialBoth),
            "parallel-detail-only" | "cfast" | "3" => Ok(Self::ParallelDetailOnly),
            "parallel-both" | "bfast" | "4" => Ok(Self::ParallelBoth),
            "no-op" | "no" | "5" => Ok(Self::NoOp),
            other => Err(TrawlError::InvalidArgument(format!(
                "unknown crawl mode '{}'",
                other
            ))),
        }
    }
}

/// Runs one crawl mode against a source
pub struct CrawlModeDispatcher {
    source: Arc<dyn CrawlSource>,
    router: Arc<RecordRouter>,
    executor: ParallelCrawlExecutor,
}

impl CrawlModeDispatcher {
    /// Creates a dispatcher
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `workers` is zero.
    pub fn new(source: Arc<dyn CrawlSource>, router: Arc<RecordRouter>, workers: usize) -> Result<Self> {
        Ok(Self {
            source,
            router,
            executor: ParallelCrawlExecutor::new(workers)?,
        })
    }

    /// Executes `mode`
    ///
    /// Preconditions are checked before any I/O: a mode that lists units on a
    /// source that cannot list them raises `InvalidArgument`, and a
    /// detail-only mode without a (non-empty) unit list raises `MissingInput`.
    pub async fn dispatch(&self, mode: CrawlMode, units: Option<Vec<WorkUnit>>) -> Result<CrawlReport> {
        Self::check(self.source.as_ref(), mode, units.as_deref())?;
        let supplied = units.filter(|list| !list.is_empty());

        tracing::info!("Dispatching {} against {} source", mode, self.source.name());
        let mut report = CrawlReport::new(mode.as_str());

        let units = if mode.lists_units() {
            let (ids, routing) = self.source.list_units(&self.router).await?;
            report.routing.merge(routing);
            ids
        } else {
            supplied.unwrap_or_default()
        };

        if mode.crawls_details() {
            let executor = if mode.is_parallel() {
                self.executor
            } else {
                ParallelCrawlExecutor::new(1)?
            };
            report.merge(self.crawl_details(executor, units).await?);
        }

        Ok(report)
    }

    /// Checks the preconditions of `mode` against `source` without any I/O
    pub fn check(source: &dyn CrawlSource, mode: CrawlMode, units: Option<&[WorkUnit]>) -> Result<()> {
        if mode.lists_units() && !source.can_list_units() {
            return Err(TrawlError::InvalidArgument(format!(
                "mode {} needs a unit listing, which the {} source does not provide",
                mode,
                source.name()
            )));
        }

        let has_units = units.map(|list| !list.is_empty()).unwrap_or(false);
        if mode.requires_units() && !has_units {
            return Err(TrawlError::MissingInput(format!(
                "mode {} needs a unit list; none was supplied",
                mode
            )));
        }

        Ok(())
    }

    async fn crawl_details(
        &self,
        executor: ParallelCrawlExecutor,
        units: Vec<WorkUnit>,
    ) -> Result<CrawlReport> {
        let source = Arc::clone(&self.source);
        let router = Arc::clone(&self.router);

        executor
            .run(units, move |unit| {
                let source = Arc::clone(&source);
                let router = Arc::clone(&router);
                async move { source.crawl_unit(&unit, &router).await }
            })
            .await
    }
}
