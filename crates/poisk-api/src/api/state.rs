//! API State Definition

use std::sync::Arc;

use crate::config::Config;
use crate::service::PoiskApiService;

/// Application State
///
/// State shared across the entire server.
/// Contains configuration and service.
#[derive(Clone)]
pub struct AppState {
  /// Configuration
  pub config: Config,
  /// Search service
  ///
  /// - Production: `Arc::new(PoiskApiServiceFull::new(&poisk_config)?)`
  /// - Test: `Arc::new(StubPoiskApiService)`
  pub service: Arc<dyn PoiskApiService>,
}

impl AppState {
  /// Creates a new AppState
  #[must_use]
  pub fn new(config: Config, service: Arc<dyn PoiskApiService>) -> Self {
    Self { config, service }
  }
}
