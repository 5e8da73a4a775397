//! Crawler coordinator - wires configuration to a running crawl
//!
//! This module builds everything a dispatch needs from the configuration:
//! - The HTTP fetcher (and the optional login session)
//! - The protocol source
//! - The document store and file sinks behind the record router
//! - The unit list for the detail-only modes
//!
//! and records each run in the document store when one is configured.

use crate::config::{Config, SourceKind};
use crate::crawler::bugzilla::BugzillaSource;
use crate::crawler::dispatcher::{CrawlMode, CrawlModeDispatcher};
use crate::crawler::fetcher::HttpFetcher;
use crate::crawler::gerrit::GerritSource;
use crate::crawler::source::CrawlSource;
use crate::output::{CrawlReport, RecordRouter};
use crate::storage::{open_store, DocumentStore, FileSink, RunStatus, SqliteStore};
use crate::units::{load_units, WorkUnit};
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: String,
    fetcher: HttpFetcher,
    source: Arc<dyn CrawlSource>,
}

/// Sinks opened for one run
struct OpenSinks {
    store: Option<Arc<SqliteStore>>,
    router: RecordRouter,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Only the HTTP client and the source are built here. Sinks are opened
    /// by `run` once the mode's preconditions hold.
    pub fn new(config: Config, config_hash: impl Into<String>) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(&config.user_agent)?;

        let source: Arc<dyn CrawlSource> = match config.source.kind {
            SourceKind::Bugzilla => Arc::new(BugzillaSource::new(
                fetcher.clone(),
                &config.source.url,
                config.source.further_params.as_deref(),
                config.source.page_size,
            )),
            SourceKind::Gerrit => Arc::new(GerritSource::new(
                fetcher.clone(),
                &config.source.url,
                config.source.before.clone(),
                config.source.after.clone(),
                config.source.start_point_increase,
            )),
        };

        Ok(Self {
            config: Arc::new(config),
            config_hash: config_hash.into(),
            fetcher,
            source,
        })
    }

    /// Resolves the unit list for the detail-only modes
    ///
    /// `override_path` (from the command line) wins over inline units, which
    /// win over the configured `unit-list` file.
    pub fn resolve_units(&self, override_path: Option<&Path>) -> Result<Option<Vec<WorkUnit>>> {
        if let Some(path) = override_path {
            return load_units(path).map(Some);
        }
        if let Some(units) = &self.config.crawl.units {
            return Ok(Some(units.clone()));
        }
        match &self.config.crawl.unit_list {
            Some(path) => load_units(path).map(Some),
            None => Ok(None),
        }
    }

    /// Runs `mode` to completion
    ///
    /// Preconditions are checked first, so `NoOp`, `MissingInput` and
    /// `InvalidArgument` outcomes touch neither the network nor the sinks
    /// and leave no run record behind.
    pub async fn run(&self, mode: CrawlMode, units: Option<Vec<WorkUnit>>) -> Result<CrawlReport> {
        CrawlModeDispatcher::check(self.source.as_ref(), mode, units.as_deref())?;

        if mode == CrawlMode::NoOp {
            tracing::info!("Mode {}: nothing to do", mode);
            return Ok(CrawlReport::new(mode.as_str()));
        }

        let sinks = self.open_sinks()?;
        let dispatcher = CrawlModeDispatcher::new(
            Arc::clone(&self.source),
            Arc::new(sinks.router),
            self.config.crawl.workers,
        )?;

        if let Some(login) = &self.config.login {
            self.fetcher.login(login).await?;
        }

        let run_id = match &sinks.store {
            Some(store) => Some(store.create_run(&self.config_hash, mode.as_str())?),
            None => None,
        };

        let start_time = std::time::Instant::now();
        let outcome = dispatcher.dispatch(mode, units).await;

        if let (Some(store), Some(run_id)) = (&sinks.store, run_id) {
            let status = match &outcome {
                Ok(_) => RunStatus::Completed,
                Err(_) => RunStatus::Failed,
            };
            if let Err(e) = store.finish_run(run_id, status) {
                tracing::warn!("Could not close run {}: {}", run_id, e);
            }
        }

        match &outcome {
            Ok(report) => tracing::info!(
                "Mode {} finished in {:?}: {} units, {} unit failures, {} sink failures",
                mode,
                start_time.elapsed(),
                report.units_visited,
                report.unit_failures.len(),
                report.sink_failures().len()
            ),
            Err(e) => tracing::error!("Mode {} aborted: {}", mode, e),
        }

        outcome
    }

    /// Opens the document store and creates the output folder, if configured
    fn open_sinks(&self) -> Result<OpenSinks> {
        let output = &self.config.output;

        let store = match &output.database_path {
            Some(path) => {
                tracing::info!("Opening document store at {}", path.display());
                Some(Arc::new(open_store(path)?))
            }
            None => None,
        };

        let files = match &output.folder {
            Some(folder) => {
                tracing::info!("Writing files to {}", folder.display());
                Some(FileSink::new(folder.clone())?)
            }
            None => None,
        };

        if store.is_none() && files.is_none() {
            tracing::warn!("No sink configured; crawled records will be discarded");
        }

        let router = RecordRouter::new(
            store.clone().map(|s| s as Arc<dyn DocumentStore>),
            files,
            output.separator.clone(),
            output.commit_buckets,
        );

        Ok(OpenSinks { store, router })
    }
}

/// Runs the crawl described by `config`
///
/// # Example
///
/// ```no_run
/// use issue_trawler::config::load_config_with_hash;
/// use issue_trawler::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("trawler.toml"))?;
/// let report = run_crawl(config, hash, None, None).await?;
/// println!("{} units visited", report.units_visited);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    config_hash: String,
    mode_override: Option<CrawlMode>,
    units_override: Option<&Path>,
) -> Result<CrawlReport> {
    let mode = match mode_override {
        Some(mode) => mode,
        None => config.crawl.mode.parse::<CrawlMode>()?,
    };

    let coordinator = Coordinator::new(config, config_hash)?;
    let units = if mode.requires_units() {
        coordinator.resolve_units(units_override)?
    } else {
        None
    };

    coordinator.run(mode, units).await
}

