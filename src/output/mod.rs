//! Output module for routing records and reporting on a crawl
//!
//! This module handles:
//! - Routing record batches to the configured sinks
//! - Naming collections and files per record category
//! - Aggregating per-unit and per-sink failures into a crawl report
//! - Displaying store statistics

mod layout;
mod report;
mod router;
pub mod stats;

pub use layout::{Category, FileEncoding, UNIT_ARTIFACT};
pub use report::{print_report, CrawlReport, RouteReport, SinkFailure, SinkKind, UnitFailure};
pub use router::RecordRouter;
pub use stats::{load_statistics, print_statistics, StoreStatistics};
