//! Indexing lifecycle: Idle ⇄ Running.
//!
//! `start` marks every configured site INDEXING and spawns one crawl task per
//! site over a fresh shared [`CrawlPool`]. `stop` shuts the pool down, aborts
//! the tasks and fails every site still INDEXING. Both hold the state mutex only
//! for the transition itself; crawling happens in the spawned tasks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{CrawlerConfig, SiteConfig};
use crate::crawler::{CrawlPool, Fetcher, SiteCrawler};
use crate::errors::{CrawlError, OrchestratorError};
use crate::indexer::PageIndexer;
use crate::models::{Site, SiteStatus};
use crate::storage::Storage;

/// Error recorded on sites interrupted by `stop`
pub const STOPPED_BY_USER: &str = "Indexing stopped by user";

/// Collaborators shared by every crawl task
struct CrawlResources {
  storage: Storage,
  fetcher: Arc<dyn Fetcher>,
  indexer: Arc<PageIndexer>,
  settings: CrawlerConfig,
}

/// One indexing run
struct Run {
  pool: CrawlPool,
  tasks: Vec<JoinHandle<()>>,
}

impl Run {
  fn is_finished(&self) -> bool {
    self.tasks.iter().all(JoinHandle::is_finished)
  }
}

enum RunState {
  Idle,
  Running(Run),
}

/// Starts and stops indexing runs over the configured sites.
pub struct IndexingOrchestrator {
  sites: Vec<SiteConfig>,
  resources: Arc<CrawlResources>,
  state: Mutex<RunState>,
}

impl IndexingOrchestrator {
  /// Creates an idle orchestrator
  pub fn new(
    sites: Vec<SiteConfig>,
    settings: CrawlerConfig,
    storage: Storage,
    fetcher: Arc<dyn Fetcher>,
    indexer: Arc<PageIndexer>,
  ) -> Self {
    Self {
      sites,
      resources: Arc::new(CrawlResources {
        storage,
        fetcher,
        indexer,
        settings,
      }),
      state: Mutex::new(RunState::Idle),
    }
  }

  /// Launches one crawl task per configured site and returns immediately.
  ///
  /// # Errors
  /// - `OrchestratorError::AlreadyRunning` while a previous run has unfinished tasks
  /// - `OrchestratorError::NoRuntime` outside of a tokio runtime
  /// - `OrchestratorError::Storage` when a site cannot be marked INDEXING
  pub fn start(&self) -> Result<(), OrchestratorError> {
    let runtime = Handle::try_current().map_err(|_| OrchestratorError::NoRuntime)?;
    let mut state = self.lock_state();
    reap(&mut state);
    if matches!(*state, RunState::Running(_)) {
      return Err(OrchestratorError::AlreadyRunning);
    }

    let mut sites = Vec::with_capacity(self.sites.len());
    for site in &self.sites {
      let url = site.url.trim();
      sites.push(self.resources.storage.sites.upsert(url, site.name.trim(), SiteStatus::Indexing, None)?);
    }

    let pool = CrawlPool::new(self.resources.settings.max_concurrency);
    let tasks = sites
      .into_iter()
      .map(|site| runtime.spawn(crawl_site(site, Arc::clone(&self.resources), pool.clone())))
      .collect();
    *state = RunState::Running(Run { pool, tasks });
    info!(sites = self.sites.len(), "indexing started");
    Ok(())
  }

  /// Cancels the current run and fails every site still INDEXING.
  ///
  /// Returns the number of sites marked FAILED.
  ///
  /// # Errors
  /// - `OrchestratorError::NotRunning` when no run is in progress
  /// - `OrchestratorError::Storage` when site statuses cannot be read or written
  pub fn stop(&self) -> Result<usize, OrchestratorError> {
    let mut state = self.lock_state();
    reap(&mut state);
    let RunState::Running(run) = std::mem::replace(&mut *state, RunState::Idle) else {
      return Err(OrchestratorError::NotRunning);
    };

    run.pool.shutdown();
    for task in &run.tasks {
      task.abort();
    }

    let mut stopped = 0;
    for site in self.resources.storage.sites.list_all()? {
      if site.status == SiteStatus::Indexing
        && self.resources.storage.sites.transition(
          site.id,
          SiteStatus::Indexing,
          SiteStatus::Failed,
          Some(STOPPED_BY_USER.to_string()),
        )?
      {
        stopped += 1;
      }
    }
    info!(stopped, "indexing stopped");
    Ok(stopped)
  }

  /// True while a run has unfinished tasks
  pub fn is_running(&self) -> bool {
    let mut state = self.lock_state();
    reap(&mut state);
    matches!(*state, RunState::Running(_))
  }

  fn lock_state(&self) -> MutexGuard<'_, RunState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Returns a run whose tasks have all finished to Idle.
fn reap(state: &mut RunState) {
  if let RunState::Running(run) = state
    && run.is_finished()
  {
    info!("indexing finished");
    *state = RunState::Idle;
  }
}

/// Crawls one site and records the outcome in its status.
async fn crawl_site(site: Site, resources: Arc<CrawlResources>, pool: CrawlPool) {
  let crawler = match SiteCrawler::new(
    site.clone(),
    Arc::clone(&resources.fetcher),
    resources.storage.clone(),
    Arc::clone(&resources.indexer),
    pool,
    &resources.settings,
  ) {
    Ok(crawler) => crawler,
    Err(err) => {
      fail_site(&resources.storage, &site, &err);
      return;
    }
  };

  match crawler.crawl().await {
    Ok(pages) => {
      match resources
        .storage
        .sites
        .transition(site.id, SiteStatus::Indexing, SiteStatus::Indexed, None)
      {
        Ok(true) => info!(site = %site.url, pages = pages.len(), "site indexed"),
        Ok(false) => info!(site = %site.url, "site status changed during crawl, keeping it"),
        Err(err) => warn!(site = %site.url, error = %err, "failed to mark site indexed"),
      }
    }
    Err(CrawlError::Cancelled) => info!(site = %site.url, "crawl cancelled"),
    Err(err) => fail_site(&resources.storage, &site, &err),
  }
}

fn fail_site(storage: &Storage, site: &Site, err: &CrawlError) {
  error!(site = %site.url, error = %err, "site crawl failed");
  if let Err(store_err) =
    storage
      .sites
      .transition(site.id, SiteStatus::Indexing, SiteStatus::Failed, Some(err.to_string()))
  {
    warn!(site = %site.url, error = %store_err, "failed to mark site failed");
  }
}
