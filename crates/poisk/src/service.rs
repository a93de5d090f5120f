// crates/poisk/src/service.rs

//! PoiskService: the facade of the poisk crate.
//!
//! - Indexing control (IndexingOrchestrator)
//! - Single-page re-indexing (SiteCrawler::refresh_page)
//! - Search (SearchEngine)
//! - Statistics
//!
//! The HTTP layer only needs this struct. Every operation answers with a
//! response struct carrying a success flag; errors never escape to the caller.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PoiskConfig;
use crate::crawler::url_policy;
use crate::crawler::{CrawlPool, Fetcher, HttpFetcher, SiteCrawler};
use crate::errors::{PoiskError, PoiskResult};
use crate::indexer::PageIndexer;
use crate::lemmatizer::Lemmatizer;
use crate::models::{ControlResponse, Page, SearchResponse, SiteStatus};
use crate::orchestrator::IndexingOrchestrator;
use crate::searcher::SearchEngine;
use crate::statistics::{StatisticsResponse, collect_statistics};
use crate::storage::Storage;

/// Facade over indexing, search and statistics.
pub struct PoiskService {
  config: PoiskConfig,
  storage: Storage,
  fetcher: Arc<dyn Fetcher>,
  indexer: Arc<PageIndexer>,
  engine: SearchEngine,
  orchestrator: IndexingOrchestrator,
}

impl PoiskService {
  /// Initializes the service with an HTTP fetcher and in-memory storage.
  ///
  /// # Errors
  /// - The configuration is invalid
  /// - The HTTP client cannot be built
  pub fn init(config: &PoiskConfig) -> PoiskResult<Self> {
    config.validate()?;
    let fetcher = HttpFetcher::new(&config.crawler)?;
    Self::with_parts(config, Storage::in_memory(), Arc::new(fetcher))
  }

  /// Initializes the service over explicit collaborators.
  ///
  /// # Errors
  /// The configuration is invalid.
  pub fn with_parts(config: &PoiskConfig, storage: Storage, fetcher: Arc<dyn Fetcher>) -> PoiskResult<Self> {
    config.validate()?;

    let lemmatizer = Arc::new(Lemmatizer::new(config.supported_languages()));
    let indexer = Arc::new(
      PageIndexer::new(storage.clone(), Arc::clone(&lemmatizer), config.indexer)
        .with_extractor(config.lemmatizer.text_extractor),
    );
    let engine = SearchEngine::new(
      storage.clone(),
      lemmatizer,
      config.search.clone(),
      config.lemmatizer.text_extractor,
    );
    let orchestrator = IndexingOrchestrator::new(
      config.sites.clone(),
      config.crawler.clone(),
      storage.clone(),
      Arc::clone(&fetcher),
      Arc::clone(&indexer),
    );

    info!(
      sites = config.sites.len(),
      languages = ?config.supported_languages(),
      "poisk service initialized"
    );
    Ok(Self {
      config: config.clone(),
      storage,
      fetcher,
      indexer,
      engine,
      orchestrator,
    })
  }

  /// Starts indexing every configured site.
  ///
  /// Must be called inside a tokio runtime.
  pub fn start_indexing(&self) -> ControlResponse {
    match self.orchestrator.start() {
      Ok(()) => ControlResponse::ok(),
      Err(err) => {
        warn!(error = %err, "start indexing rejected");
        ControlResponse::failure(err.to_string())
      }
    }
  }

  /// Stops the current indexing run.
  pub fn stop_indexing(&self) -> ControlResponse {
    match self.orchestrator.stop() {
      Ok(_) => ControlResponse::ok(),
      Err(err) => {
        warn!(error = %err, "stop indexing rejected");
        ControlResponse::failure(err.to_string())
      }
    }
  }

  /// True while an indexing run is in progress
  pub fn is_indexing(&self) -> bool {
    self.orchestrator.is_running()
  }

  /// Fetches, stores and re-indexes one page of a configured site.
  pub async fn index_page(&self, url: &str) -> ControlResponse {
    match self.try_index_page(url).await {
      Ok(page) => {
        info!(url = %page.path, code = page.code, "page indexed on request");
        ControlResponse::ok()
      }
      Err(err) => {
        warn!(url, error = %err, "index page rejected");
        ControlResponse::failure(err.to_string())
      }
    }
  }

  async fn try_index_page(&self, url: &str) -> PoiskResult<Page> {
    let url = url.trim();
    let Some(site_config) = self
      .config
      .sites
      .iter()
      .find(|site| url_policy::is_same_host(url, &site.url))
    else {
      return Err(PoiskError::PageOutsideSites { url: url.to_string() });
    };

    let site_url = site_config.url.trim();
    let site = match self.storage.sites.find_by_url(site_url)? {
      Some(site) => site,
      None => self
        .storage
        .sites
        .upsert(site_url, site_config.name.trim(), SiteStatus::Indexed, None)?,
    };

    let crawler = SiteCrawler::new(
      site,
      Arc::clone(&self.fetcher),
      self.storage.clone(),
      Arc::clone(&self.indexer),
      CrawlPool::new(1),
      &self.config.crawler,
    )?;
    crawler
      .refresh_page(url)
      .await?
      .ok_or_else(|| PoiskError::PageExcluded { url: url.to_string() })
  }

  /// Searches the index.
  ///
  /// `limit` defaults to `search.default_limit` and is capped at `search.max_limit`.
  pub fn search(&self, query: &str, site: Option<&str>, offset: usize, limit: Option<usize>) -> SearchResponse {
    let limit = limit
      .unwrap_or(self.config.default_search_limit())
      .min(self.config.max_search_limit());
    self.engine.search(query, site, offset, limit)
  }

  /// Corpus totals and per-site detail.
  pub fn statistics(&self) -> StatisticsResponse {
    match collect_statistics(&self.storage, self.orchestrator.is_running()) {
      Ok(data) => StatisticsResponse::success(data),
      Err(err) => {
        warn!(error = %err, "statistics failed");
        StatisticsResponse::failure(err.to_string())
      }
    }
  }

  /// Returns the configuration.
  pub fn config(&self) -> &PoiskConfig {
    &self.config
  }

  /// Returns the storage handle.
  pub fn storage(&self) -> &Storage {
    &self.storage
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SiteConfig;
  use crate::crawler::StaticFetcher;

  fn config() -> PoiskConfig {
    PoiskConfig::from_toml_str(
      r#"
        [[sites]]
        url = "https://a.ru"
        name = "A"

        [crawler]
        politeness_delay_ms = 0

        [search]
        default_limit = 2
        max_limit = 3
      "#,
    )
    .unwrap()
  }

  fn service(fetcher: StaticFetcher) -> PoiskService {
    PoiskService::with_parts(&config(), Storage::in_memory(), Arc::new(fetcher)).unwrap()
  }

  #[test]
  fn with_parts_validates_config() {
    let mut invalid = config();
    invalid.sites.push(SiteConfig {
      url: "ftp://a.ru".to_string(),
      name: "ftp".to_string(),
    });
    let result = PoiskService::with_parts(&invalid, Storage::in_memory(), Arc::new(StaticFetcher::new()));
    assert!(matches!(result, Err(PoiskError::Config(_))));
  }

  #[tokio::test]
  async fn index_page_creates_site_and_page() {
    let service = service(StaticFetcher::new().with_page("https://www.a.ru/news", "<p>leopard</p>"));

    let response = service.index_page("https://www.a.ru/news").await;

    assert_eq!(response, ControlResponse::ok());
    let site = service.storage().sites.find_by_url("https://a.ru").unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert!(service.storage().lemmas.find(site.id, "leopard").unwrap().is_some());
  }

  #[tokio::test]
  async fn index_page_rejects_foreign_host() {
    let service = service(StaticFetcher::new());
    let response = service.index_page("https://elsewhere.ru/page").await;

    assert!(!response.result);
    assert_eq!(
      response.error.as_deref(),
      Some("page is outside the configured sites: https://elsewhere.ru/page")
    );
  }

  #[tokio::test]
  async fn index_page_rejects_excluded_url() {
    let service = service(StaticFetcher::new());
    let response = service.index_page("https://a.ru/report.pdf").await;
    assert!(!response.result);
  }

  #[tokio::test]
  async fn control_calls_report_state_errors() {
    let service = service(StaticFetcher::new());

    assert!(!service.stop_indexing().result);
    assert!(service.start_indexing().result);
    let second = service.start_indexing();
    assert_eq!(second.error.as_deref(), Some("Indexing is already running"));
  }

  #[test]
  fn search_limit_is_defaulted_and_capped() {
    let service = service(StaticFetcher::new());
    let site = service
      .storage()
      .sites
      .upsert("https://a.ru", "A", SiteStatus::Indexed, None)
      .unwrap();
    for n in 0..5 {
      let page = service
        .storage()
        .pages
        .upsert(site.id, &format!("https://a.ru/{n}"), 200, "<p>leopard</p>")
        .unwrap();
      service.indexer.index_page(&page).unwrap();
    }
    for n in 5..15 {
      service
        .storage()
        .pages
        .upsert(site.id, &format!("https://a.ru/{n}"), 200, "<p>fox</p>")
        .unwrap();
    }

    assert_eq!(service.search("leopard", None, 0, None).data.len(), 2);
    assert_eq!(service.search("leopard", None, 0, Some(50)).data.len(), 3);
    assert_eq!(service.search("leopard", None, 0, Some(50)).count, 5);
  }

  #[test]
  fn statistics_reports_sites() {
    let service = service(StaticFetcher::new());
    service
      .storage()
      .sites
      .upsert("https://a.ru", "A", SiteStatus::Indexed, None)
      .unwrap();

    let response = service.statistics();

    assert!(response.result);
    let data = response.statistics.unwrap();
    assert_eq!(data.total.sites, 1);
    assert!(!data.total.indexing);
  }
}
