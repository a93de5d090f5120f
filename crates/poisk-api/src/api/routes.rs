//! Router definition

use axum::{
  Router,
  routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::handlers::{
  get_search, get_start_indexing, get_statistics, get_stop_indexing, health_check, post_index_page,
};
use super::state::AppState;
use crate::errors::ApiError;

/// Creates the API router
///
/// # Arguments
/// * `state` - Application state
pub fn create_router(state: AppState) -> Router {
  Router::new()
    .route("/api/startIndexing", get(get_start_indexing))
    .route("/api/stopIndexing", get(get_stop_indexing))
    .route("/api/indexPage", post(post_index_page))
    .route("/api/search", get(get_search))
    .route("/api/statistics", get(get_statistics))
    .route("/health", get(health_check))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Starts the server
///
/// # Errors
/// Returns an error if binding or serving fails
pub async fn run_server(state: AppState) -> crate::errors::Result<()> {
  let addr = state.config.bind_addr.clone();
  let listener = tokio::net::TcpListener::bind(&addr)
    .await
    .map_err(|e| ApiError::config(format!("failed to bind {addr}: {e}")))?;

  tracing::info!("server listening on http://{}", addr);

  let router = create_router(state);

  axum::serve(listener, router)
    .await
    .map_err(|e| ApiError::internal(format!("server error: {e}")))?;

  Ok(())
}
