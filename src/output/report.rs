//! Crawl reports
//!
//! Routing never raises on a failed sink write; failures are collected here
//! and surfaced once the run is over, together with the units whose crawl
//! failed.

use crate::units::WorkUnit;
use std::collections::BTreeMap;
use std::fmt;

/// The persistence backend a write went to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SinkKind {
    /// The SQLite document store
    Store,

    /// The flat-file folder
    Files,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => f.write_str("store"),
            Self::Files => f.write_str("files"),
        }
    }
}

/// One failed write to one sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFailure {
    pub sink: SinkKind,
    /// Collection or file name
    pub target: String,
    pub message: String,
}

impl SinkFailure {
    /// Converts the failure into the error it is reported as
    pub fn to_error(&self) -> crate::TrawlError {
        crate::TrawlError::SinkWrite {
            sink: self.sink.to_string(),
            target: self.target.clone(),
            message: self.message.clone(),
        }
    }
}

/// Outcome of routing one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteReport {
    /// Records written, keyed by `sink/target`
    pub written: BTreeMap<String, u64>,
    pub failures: Vec<SinkFailure>,
}

impl RouteReport {
    pub fn record_write(&mut self, sink: SinkKind, target: &str, count: usize) {
        *self
            .written
            .entry(format!("{}/{}", sink, target))
            .or_insert(0) += count as u64;
    }

    pub fn record_failure(&mut self, sink: SinkKind, target: &str, message: impl Into<String>) {
        let failure = SinkFailure {
            sink,
            target: target.to_string(),
            message: message.into(),
        };
        tracing::warn!("{}", failure.to_error());
        self.failures.push(failure);
    }

    pub fn merge(&mut self, other: RouteReport) {
        for (key, count) in other.written {
            *self.written.entry(key).or_insert(0) += count;
        }
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A unit whose crawl failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: WorkUnit,
    pub error: String,
}

/// Aggregated outcome of a whole dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Mode the report belongs to
    pub mode: String,

    /// Units handed to the detail crawl
    pub units_total: u64,

    /// Units whose crawl finished (successfully or not)
    pub units_visited: u64,

    /// Units whose crawl raised an error
    pub unit_failures: Vec<UnitFailure>,

    /// Records written and failed writes across all units
    pub routing: RouteReport,
}

impl CrawlReport {
    /// Creates an empty report for `mode`
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Self::default()
        }
    }

    /// Records a finished unit and what routing it produced
    pub fn record_unit(&mut self, routing: RouteReport) {
        self.units_visited += 1;
        self.routing.merge(routing);
    }

    /// Records a unit whose crawl failed
    pub fn record_unit_failure(&mut self, unit: WorkUnit, error: &crate::TrawlError) {
        tracing::error!("Unit {} failed: {}", unit, error);
        self.units_visited += 1;
        self.unit_failures.push(UnitFailure {
            unit,
            error: error.to_string(),
        });
    }

    /// Folds another report into this one
    pub fn merge(&mut self, other: CrawlReport) {
        self.units_total += other.units_total;
        self.units_visited += other.units_visited;
        self.unit_failures.extend(other.unit_failures);
        self.routing.merge(other.routing);
    }

    pub fn sink_failures(&self) -> &[SinkFailure] {
        &self.routing.failures
    }

    /// True when no unit and no sink failed
    pub fn is_clean(&self) -> bool {
        self.unit_failures.is_empty() && self.routing.is_clean()
    }
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ({}) ===\n", report.mode);

    println!("Overview:");
    println!("  Units queued: {}", report.units_total);
    println!("  Units visited: {}", report.units_visited);
    println!("  Units failed: {}", report.unit_failures.len());
    println!("  Sink failures: {}", report.sink_failures().len());
    println!();

    if !report.routing.written.is_empty() {
        println!("Records Written:");
        for (target, count) in &report.routing.written {
            println!("  {}: {}", target, count);
        }
        println!();
    }

    if !report.unit_failures.is_empty() {
        println!("Failed Units ({}):", report.unit_failures.len());
        for failure in &report.unit_failures {
            println!("  - {}: {}", failure.unit, failure.error);
        }
        println!();
    }

    if !report.sink_failures().is_empty() {
        println!("Failed Sink Writes ({}):", report.sink_failures().len());
        for failure in report.sink_failures() {
            println!("  - {}/{}: {}", failure.sink, failure.target, failure.message);
        }
        println!();
    }

    if report.is_clean() {
        println!("✓ Crawl finished without failures");
    } else {
        println!("✗ Crawl finished with failures");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrawlError;

    #[test]
    fn test_route_report_merge() {
        let mut a = RouteReport::default();
        a.record_write(SinkKind::Store, "Comments", 3);

        let mut b = RouteReport::default();
        b.record_write(SinkKind::Store, "Comments", 2);
        b.record_write(SinkKind::Files, "Bugzilla_Comments.txt", 2);
        b.record_failure(SinkKind::Files, "x.csv", "disk full");

        a.merge(b);
        assert_eq!(a.written.get("store/Comments"), Some(&5));
        assert_eq!(a.written.get("files/Bugzilla_Comments.txt"), Some(&2));
        assert_eq!(a.failures.len(), 1);
        assert!(!a.is_clean());
    }

    #[test]
    fn test_crawl_report_counts() {
        let mut report = CrawlReport::new("parallel-detail-only");
        report.units_total = 2;
        report.record_unit(RouteReport::default());
        report.record_unit_failure(
            WorkUnit::Id(4),
            &TrawlError::MalformedResponse("bad".to_string()),
        );

        assert_eq!(report.units_visited, 2);
        assert_eq!(report.unit_failures[0].unit, WorkUnit::Id(4));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_sink_failure_to_error() {
        let failure = SinkFailure {
            sink: SinkKind::Store,
            target: "id3".to_string(),
            message: "locked".to_string(),
        };
        assert!(matches!(failure.to_error(), TrawlError::SinkWrite { .. }));
    }
}
