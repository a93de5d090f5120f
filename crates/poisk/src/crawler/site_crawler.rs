//! Recursive fork/join crawl of one site.
//!
//! Each URL is one task: it claims the URL in the crawl-wide visited set, waits
//! for a pool slot, probes, fetches and persists the page, then spawns a child
//! task per new same-host link and unions the children's discovered URLs with
//! its own. Every network request runs under a pool slot; the slot is never
//! held while joining.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use dashmap::DashSet;
use futures::future::BoxFuture;
use scraper::{Html, Selector};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchedPage, Fetcher, is_html_content_type};
use crate::crawler::pool::CrawlPool;
use crate::crawler::url_policy;
use crate::errors::{CrawlError, FetchError};
use crate::indexer::PageIndexer;
use crate::models::{Page, Site};
use crate::storage::Storage;

static ANCHOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("a[href]").expect("literal css selector"));

/// Crawler of one site within an indexing run.
pub struct SiteCrawler {
  context: Arc<CrawlContext>,
}

/// State shared by every task of one site crawl.
struct CrawlContext {
  site: Site,
  root: Url,
  visited: DashSet<String>,
  fetcher: Arc<dyn Fetcher>,
  storage: Storage,
  indexer: Arc<PageIndexer>,
  pool: CrawlPool,
  politeness_delay: Duration,
  probe_content_type: bool,
}

impl SiteCrawler {
  /// Prepares the crawl of `site`.
  ///
  /// # Errors
  /// `CrawlError::InvalidRootUrl` when the site URL is not an absolute http(s) URL.
  pub fn new(
    site: Site,
    fetcher: Arc<dyn Fetcher>,
    storage: Storage,
    indexer: Arc<PageIndexer>,
    pool: CrawlPool,
    settings: &CrawlerConfig,
  ) -> Result<Self, CrawlError> {
    let root = Url::parse(site.url.trim()).map_err(|e| CrawlError::InvalidRootUrl {
      url: site.url.clone(),
      reason: e.to_string(),
    })?;
    if !matches!(root.scheme(), "http" | "https") || root.host_str().is_none() {
      return Err(CrawlError::InvalidRootUrl {
        url: site.url.clone(),
        reason: "not an absolute http(s) url".to_string(),
      });
    }
    Ok(Self {
      context: Arc::new(CrawlContext {
        site,
        root,
        visited: DashSet::new(),
        fetcher,
        storage,
        indexer,
        pool,
        politeness_delay: settings.politeness_delay(),
        probe_content_type: settings.probe_content_type,
      }),
    })
  }

  /// Crawls every same-host page reachable from the site root.
  ///
  /// Returns the URLs fetched by this crawl.
  ///
  /// # Errors
  /// `CrawlError::Cancelled` when the pool is shut down before the crawl ends.
  pub async fn crawl(&self) -> Result<HashSet<String>, CrawlError> {
    let root = url_policy::normalize_url(self.context.root.as_str());
    info!(site = %self.context.site.url, root = %root, "crawl started");
    let discovered = Arc::clone(&self.context).visit(root).await?;
    info!(
      site = %self.context.site.url,
      pages = discovered.len(),
      "crawl finished"
    );
    Ok(discovered)
  }

  /// Fetches and persists one page without following its links.
  ///
  /// Returns `None` when the URL is excluded.
  ///
  /// # Errors
  /// `CrawlError::Cancelled` when the pool is shut down first.
  pub async fn refresh_page(&self, url: &str) -> Result<Option<Page>, CrawlError> {
    let url = url_policy::normalize_url(url);
    if url_policy::is_excluded(&url) {
      return Ok(None);
    }
    let _permit = self.context.pool.acquire().await?;
    let page = match self.context.pool.run(self.context.fetcher.fetch(&url)).await? {
      Ok(fetched) => self.context.persist(&url, fetched.status, &fetched.body),
      Err(err) => {
        warn!(url = %url, error = %err, "fetch failed, storing placeholder");
        self.context.persist(&url, err.placeholder_code(), "")
      }
    };
    Ok(page)
  }

  /// Crawled site
  pub fn site(&self) -> &Site {
    &self.context.site
  }
}

impl CrawlContext {
  fn visit(self: Arc<Self>, url: String) -> BoxFuture<'static, Result<HashSet<String>, CrawlError>> {
    Box::pin(async move {
      let mut discovered = HashSet::new();
      if url_policy::is_excluded(&url) || !self.visited.insert(url.clone()) {
        return Ok(discovered);
      }
      if self.pool.is_shut_down() {
        return Err(CrawlError::Cancelled);
      }
      let links = {
        let _permit = self.pool.acquire().await?;
        if self.probe_content_type && self.excluded_by_content_type(&url).await? {
          debug!(url = %url, "skipped by content type");
          return Ok(discovered);
        }
        discovered.insert(url.clone());
        self.pool.run(tokio::time::sleep(self.politeness_delay)).await?;
        match self.pool.run(self.fetcher.fetch(&url)).await? {
          Ok(fetched) => {
            self.persist(&url, fetched.status, &fetched.body);
            extract_links(&fetched)
          }
          Err(err) => {
            self.record_failure(&url, &err);
            Vec::new()
          }
        }
      };

      let mut children = JoinSet::new();
      for link in links {
        if self.should_follow(&link) {
          children.spawn(Arc::clone(&self).visit(link));
        }
      }
      while let Some(joined) = children.join_next().await {
        match joined {
          Ok(Ok(found)) => discovered.extend(found),
          Ok(Err(err)) => return Err(err),
          Err(join_error) if join_error.is_cancelled() => return Err(CrawlError::Cancelled),
          Err(join_error) => {
            warn!(site = %self.site.url, error = %join_error, "crawl task panicked");
          }
        }
      }
      Ok(discovered)
    })
  }

  /// Content-type probe. Probe failures never exclude (fail open).
  async fn excluded_by_content_type(&self, url: &str) -> Result<bool, CrawlError> {
    match self.pool.run(self.fetcher.probe_content_type(url)).await? {
      Ok(Some(content_type)) => Ok(!is_html_content_type(&content_type)),
      Ok(None) => Ok(false),
      Err(err) => {
        debug!(url, error = %err, "content type probe failed");
        Ok(false)
      }
    }
  }

  fn should_follow(&self, link: &str) -> bool {
    if url_policy::is_excluded(link)
      || !url_policy::is_same_host(link, self.root.as_str())
      || self.visited.contains(link)
    {
      return false;
    }
    match self.storage.pages.exists(self.site.id, link) {
      Ok(exists) => !exists,
      Err(err) => {
        warn!(url = link, error = %err, "page lookup failed, skipping link");
        false
      }
    }
  }

  fn record_failure(&self, url: &str, err: &FetchError) {
    match err {
      FetchError::NotHtml { .. } => debug!(url, error = %err, "not an html page"),
      _ => warn!(url, error = %err, "fetch failed, storing placeholder"),
    }
    self.persist(url, err.placeholder_code(), "");
  }

  /// Upserts the page, refreshes the site heartbeat and re-indexes the page.
  ///
  /// Storage failures are logged and skipped.
  fn persist(&self, url: &str, code: u16, content: &str) -> Option<Page> {
    let path = url_policy::normalize_url(url);
    if url_policy::is_excluded(&path) {
      return None;
    }
    let page = match self.storage.pages.upsert(self.site.id, &path, code, content) {
      Ok(page) => page,
      Err(err) => {
        warn!(url = %path, error = %err, "failed to store page, skipping");
        return None;
      }
    };
    if let Err(err) = self.storage.sites.touch(self.site.id) {
      warn!(site = %self.site.url, error = %err, "failed to refresh site heartbeat");
    }
    match self.indexer.index_page(&page) {
      Ok(report) => debug!(url = %path, code, terms = report.terms, "page indexed"),
      Err(err) => warn!(url = %path, error = %err, "failed to index page"),
    }
    Some(page)
  }
}

/// Normalized absolute targets of every `a[href]` of a 2xx page.
fn extract_links(page: &FetchedPage) -> Vec<String> {
  if !(200..300).contains(&page.status) {
    return Vec::new();
  }
  let Ok(base) = Url::parse(&page.url) else {
    return Vec::new();
  };
  let document = Html::parse_document(&page.body);
  let links: BTreeSet<String> = document
    .select(&ANCHOR)
    .filter_map(|anchor| anchor.value().attr("href"))
    .filter_map(|href| url_policy::resolve_link(&base, href))
    .collect();
  links.into_iter().collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{IndexerConfig, Language};
  use crate::crawler::fetcher::StaticFetcher;
  use crate::lemmatizer::Lemmatizer;
  use crate::models::SiteStatus;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};

  const ROOT: &str = "https://volochek.life";

  fn settings() -> CrawlerConfig {
    CrawlerConfig {
      politeness_delay_ms: 0,
      ..CrawlerConfig::default()
    }
  }

  fn crawler(fetcher: Arc<dyn Fetcher>, storage: &Storage, pool: CrawlPool) -> SiteCrawler {
    let site = storage
      .sites
      .upsert(ROOT, "Volochek", SiteStatus::Indexing, None)
      .unwrap();
    let lemmatizer = Arc::new(Lemmatizer::new(&[Language::Ru, Language::En]));
    let indexer = Arc::new(PageIndexer::new(
      storage.clone(),
      lemmatizer,
      IndexerConfig::default(),
    ));
    SiteCrawler::new(site, fetcher, storage.clone(), indexer, pool, &settings()).unwrap()
  }

  fn cyclic_site() -> StaticFetcher {
    StaticFetcher::new()
      .with_page(
        ROOT,
        r#"<html><head><title>Home</title></head><body>
          <a href="/news">news</a> <a href="/about?ref=top">about</a>
          <a href="https://volochek.life/news#latest">news again</a>
          <a href="/report.pdf">report</a> <a href="mailto:info@volochek.life">mail</a>
          <a href="https://elsewhere.ru/">outside</a>
        </body></html>"#,
      )
      .with_page(
        "https://volochek.life/news",
        r#"<html><body><p>leopard</p><a href="/">home</a><a href="/about">about</a></body></html>"#,
      )
      .with_page(
        "https://volochek.life/about",
        r#"<html><body><a href="/news">news</a><a href="/missing">missing</a></body></html>"#,
      )
  }

  /// Fetcher whose requests never complete
  struct HangingFetcher;

  #[async_trait]
  impl Fetcher for HangingFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedPage, FetchError> {
      std::future::pending().await
    }

    async fn probe_content_type(&self, _url: &str) -> Result<Option<String>, FetchError> {
      Ok(None)
    }
  }

  /// Fetcher serving a root with many links that records peak in-flight requests
  #[derive(Default)]
  struct CountingFetcher {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
  }

  impl CountingFetcher {
    async fn track(&self) {
      let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
      self.peak.fetch_max(now, Ordering::SeqCst);
      tokio::time::sleep(Duration::from_millis(10)).await;
      self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
  }

  #[async_trait]
  impl Fetcher for CountingFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
      self.track().await;
      let body = if url == "https://volochek.life/" {
        (0..20).map(|i| format!(r#"<a href="/page{i}">{i}</a>"#)).collect()
      } else {
        "<p>leaf</p>".to_string()
      };
      Ok(FetchedPage {
        url: url.to_string(),
        status: 200,
        content_type: Some("text/html".to_string()),
        body,
      })
    }

    async fn probe_content_type(&self, _url: &str) -> Result<Option<String>, FetchError> {
      self.track().await;
      Ok(Some("text/html".to_string()))
    }
  }

  #[tokio::test]
  async fn probes_and_fetches_stay_within_pool_bound() {
    let fetcher = Arc::new(CountingFetcher::default());
    let storage = Storage::in_memory();
    let crawler = crawler(fetcher.clone(), &storage, CrawlPool::new(1));

    let discovered = crawler.crawl().await.unwrap();

    assert_eq!(discovered.len(), 21);
    assert_eq!(fetcher.peak.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn crawl_visits_each_reachable_url_once() {
    let fetcher = Arc::new(cyclic_site());
    let storage = Storage::in_memory();
    let crawler = crawler(fetcher.clone(), &storage, CrawlPool::new(4));

    let discovered = crawler.crawl().await.unwrap();

    let expected: HashSet<String> = [
      "https://volochek.life/",
      "https://volochek.life/news",
      "https://volochek.life/about",
      "https://volochek.life/missing",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    assert_eq!(discovered, expected);
    for url in &expected {
      assert_eq!(fetcher.fetch_count(url), 1, "{url} fetched more than once");
    }
    assert_eq!(fetcher.total_fetches(), 4);
    assert_eq!(fetcher.fetch_count("https://volochek.life/report.pdf"), 0);
    assert_eq!(fetcher.fetch_count("https://elsewhere.ru/"), 0);
  }

  #[tokio::test]
  async fn crawl_persists_pages_and_placeholders() {
    let storage = Storage::in_memory();
    let crawler = crawler(Arc::new(cyclic_site()), &storage, CrawlPool::new(2));
    crawler.crawl().await.unwrap();
    let site_id = crawler.site().id;

    assert_eq!(storage.pages.count_by_site(site_id).unwrap(), 4);
    let missing = storage
      .pages
      .find(site_id, "https://volochek.life/missing")
      .unwrap()
      .unwrap();
    assert_eq!(missing.code, 404);
    assert!(missing.content.is_empty());
    assert!(
      !storage
        .pages
        .exists(site_id, "https://volochek.life/report.pdf")
        .unwrap()
    );

    // the news page was indexed as it was stored
    assert!(storage.lemmas.find(site_id, "leopard").unwrap().is_some());
  }

  #[tokio::test]
  async fn content_type_probe_excludes_non_html() {
    let fetcher = Arc::new(
      StaticFetcher::new()
        .with_page(ROOT, r#"<a href="/feed">feed</a>"#)
        .with_response("https://volochek.life/feed", 200, Some("application/rss+xml"), ""),
    );
    let storage = Storage::in_memory();
    let crawler = crawler(fetcher.clone(), &storage, CrawlPool::new(2));

    let discovered = crawler.crawl().await.unwrap();

    assert_eq!(discovered.len(), 1);
    assert_eq!(fetcher.probe_count("https://volochek.life/feed"), 1);
    assert_eq!(fetcher.fetch_count("https://volochek.life/feed"), 0);
  }

  #[tokio::test]
  async fn shutdown_interrupts_pending_fetches() {
    let storage = Storage::in_memory();
    let pool = CrawlPool::new(2);
    let crawler = crawler(Arc::new(HangingFetcher), &storage, pool.clone());

    let stopper = tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(20)).await;
      pool.shutdown();
    });
    let outcome = crawler.crawl().await;
    stopper.await.unwrap();

    assert!(matches!(outcome, Err(CrawlError::Cancelled)));
  }

  #[tokio::test]
  async fn refresh_page_stores_without_following_links() {
    let fetcher = Arc::new(cyclic_site());
    let storage = Storage::in_memory();
    let crawler = crawler(fetcher.clone(), &storage, CrawlPool::new(1));

    let page = crawler
      .refresh_page("https://volochek.life/news?utm=1")
      .await
      .unwrap()
      .unwrap();

    assert_eq!(page.path, "https://volochek.life/news");
    assert_eq!(page.code, 200);
    assert_eq!(fetcher.total_fetches(), 1);
    assert!(
      crawler
        .refresh_page("https://volochek.life/a.jpg")
        .await
        .unwrap()
        .is_none()
    );
  }

  #[test]
  fn extract_links_only_from_successful_pages() {
    let page = FetchedPage {
      url: "https://volochek.life/dir/".to_string(),
      status: 200,
      content_type: None,
      body: r#"<a href="a">a</a><a href="a#x">a again</a><a href="../b?q=1">b</a>"#.to_string(),
    };
    assert_eq!(
      extract_links(&page),
      vec![
        "https://volochek.life/b".to_string(),
        "https://volochek.life/dir/a".to_string()
      ]
    );

    let redirect = FetchedPage {
      status: 302,
      ..page
    };
    assert!(extract_links(&redirect).is_empty());
  }
}
