//! Parallel crawl execution
//!
//! Runs a per-unit crawl over a unit list with a fixed pool of tasks. Each
//! task owns one contiguous partition and works through it in order; tasks
//! share nothing but the per-unit function.

use crate::crawler::partition::partition;
use crate::output::{CrawlReport, RouteReport};
use crate::units::WorkUnit;
use crate::{Result, TrawlError};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Fans a unit list out over a fixed number of workers
#[derive(Debug, Clone, Copy)]
pub struct ParallelCrawlExecutor {
    workers: usize,
}

impl ParallelCrawlExecutor {
    /// Creates an executor with `workers` tasks
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `workers` is zero.
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(TrawlError::InvalidArgument(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Applies `per_unit` to every unit and waits for all workers
    ///
    /// A unit whose crawl fails is recorded in the report and its worker moves
    /// on to the next unit. A worker that dies (panics) does not cancel its
    /// siblings; once every task has finished, the first such failure is
    /// returned instead of the report.
    pub async fn run<F, Fut>(&self, units: Vec<WorkUnit>, per_unit: F) -> Result<CrawlReport>
    where
        F: Fn(WorkUnit) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RouteReport>> + Send + 'static,
    {
        let partitions = partition(&units, self.workers)?;
        let per_unit = Arc::new(per_unit);

        tracing::info!(
            "Starting {} workers over {} units",
            self.workers,
            units.len()
        );

        let mut join_set = JoinSet::new();
        for (index, slice) in partitions.into_iter().enumerate() {
            let per_unit = Arc::clone(&per_unit);
            join_set.spawn(async move {
                tracing::debug!("Worker {} starting with {} units", index, slice.len());
                let mut report = CrawlReport::default();
                for unit in slice {
                    match per_unit(unit.clone()).await {
                        Ok(routing) => report.record_unit(routing),
                        Err(e) => report.record_unit_failure(unit, &e),
                    }
                }
                tracing::debug!("Worker {} finished", index);
                report
            });
        }

        let mut report = CrawlReport::default();
        let mut fatal = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => {
                    tracing::error!("Worker task failed: {}", e);
                    fatal.get_or_insert(e.to_string());
                }
            }
        }

        report.units_total = units.len() as u64;

        if let Some(message) = fatal {
            tracing::error!(
                "Surviving workers visited {} of {} units, {} failed",
                report.units_visited,
                report.units_total,
                report.unit_failures.len()
            );
            return Err(TrawlError::WorkerPanicked {
                message,
                partial: Box::new(report),
            });
        }

        tracing::info!(
            "All workers finished: {} units visited, {} failed",
            report.units_visited,
            report.unit_failures.len()
        );
        Ok(report)
    }
}
