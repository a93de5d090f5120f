//! poisk-api server entry point

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use poisk_api::ApiError;
use poisk_api::api::AppState;
use poisk_api::api::run_server;
use poisk_api::config::Config;
use poisk_api::service::PoiskApiServiceFull;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
  // Load settings
  let config = Config::from_env()?;
  let poisk_config = config.load_poisk_config()?;

  // Initialize logging; RUST_LOG overrides the configured level
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(poisk_config.log_level().as_str()));
  tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
  tracing::info!(
    config_path = %config.config_path.display(),
    sites = poisk_config.sites().len(),
    "configuration loaded"
  );

  // Initialize the service
  let service = Arc::new(PoiskApiServiceFull::new(&poisk_config)?);
  tracing::info!("search service initialized");

  // Create application state
  let state = AppState::new(config, service);

  // Start server
  run_server(state).await
}
