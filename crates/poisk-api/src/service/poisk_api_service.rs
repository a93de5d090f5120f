//! Search service behind the HTTP handlers

use async_trait::async_trait;

use poisk::{PoiskConfig, PoiskService};

use crate::errors::Result;
use crate::models::{ControlResponse, SearchRequest, SearchResponse, StatisticsResponse};

/// Common interface of the search service
///
/// This trait allows swapping the production implementation (`PoiskApiServiceFull`)
/// with test stubs/mocks.
#[async_trait]
pub trait PoiskApiService: Send + Sync {
  /// Starts indexing every configured site
  fn start_indexing(&self) -> ControlResponse;

  /// Stops the current indexing run
  fn stop_indexing(&self) -> ControlResponse;

  /// Fetches and re-indexes one page
  async fn index_page(&self, url: &str) -> ControlResponse;

  /// Runs a validated search
  ///
  /// # Errors
  /// Internal error
  fn search(&self, request: SearchRequest) -> Result<SearchResponse>;

  /// Corpus statistics
  fn statistics(&self) -> StatisticsResponse;
}

/// Production implementation over [`PoiskService`]
pub struct PoiskApiServiceFull {
  inner: PoiskService,
}

impl PoiskApiServiceFull {
  /// Initializes the service
  ///
  /// # Errors
  /// Returns an error if the configuration is invalid or the HTTP client cannot be built
  pub fn new(config: &PoiskConfig) -> Result<Self> {
    let inner = PoiskService::init(config)?;
    Ok(Self { inner })
  }

  /// Wraps an already initialized service
  #[must_use]
  pub fn from_service(inner: PoiskService) -> Self {
    Self { inner }
  }
}

/// Production implementation of trait `PoiskApiService`
#[async_trait]
impl PoiskApiService for PoiskApiServiceFull {
  fn start_indexing(&self) -> ControlResponse {
    self.inner.start_indexing()
  }

  fn stop_indexing(&self) -> ControlResponse {
    self.inner.stop_indexing()
  }

  async fn index_page(&self, url: &str) -> ControlResponse {
    self.inner.index_page(url).await
  }

  fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
    Ok(self.inner.search(
      &request.query,
      request.site.as_deref(),
      request.offset,
      request.limit,
    ))
  }

  fn statistics(&self) -> StatisticsResponse {
    self.inner.statistics()
  }
}
