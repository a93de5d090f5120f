//! HTTP handler definitions

use axum::{
  Json,
  extract::{Query, State},
};
use tracing::{debug, error, info};

use crate::errors::ApiError;
use crate::models::{
  ControlResponse, IndexPageParams, SearchParams, SearchResponse, StatisticsResponse,
};

use super::state::AppState;

/// GET /api/startIndexing endpoint
///
/// Starts indexing every configured site and returns immediately.
/// `result` is false with an error message when indexing is already running.
pub async fn get_start_indexing(State(state): State<AppState>) -> Json<ControlResponse> {
  let response = state.service.start_indexing();
  info!(result = response.result, "start indexing requested");
  Json(response)
}

/// GET /api/stopIndexing endpoint
///
/// `result` is false with an error message when indexing is not running.
pub async fn get_stop_indexing(State(state): State<AppState>) -> Json<ControlResponse> {
  let response = state.service.stop_indexing();
  info!(result = response.result, "stop indexing requested");
  Json(response)
}

/// POST /api/indexPage?url=... endpoint
///
/// # Response
/// - 200 OK: `result` tells whether the page was indexed
/// - 400 Bad Request: missing url
pub async fn post_index_page(
  State(state): State<AppState>,
  Query(params): Query<IndexPageParams>,
) -> Result<Json<ControlResponse>, ApiError> {
  let url = params.validate()?;
  debug!(url = %url, "index page requested");
  Ok(Json(state.service.index_page(&url).await))
}

/// GET /api/search endpoint
///
/// # Query
/// `query` (required), `site`, `offset`, `limit`
///
/// # Response
/// - 200 OK: search response, `result` false on a search failure
/// - 400 Bad Request: missing, empty or too long query
/// - 500 Internal Server Error: internal error
pub async fn get_search(
  State(state): State<AppState>,
  Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
  let request = params.validate()?;
  debug!(query = %request.query, site = ?request.site, "search request received");

  // Lemmatizing and ranking are CPU-bound; keep them off the async workers
  let service = state.service.clone();
  let response = tokio::task::spawn_blocking(move || service.search(request)).await.map_err(|e| {
    error!(error = %e, "spawn_blocking error");
    ApiError::internal("failed to run the search")
  })??;

  info!(count = response.count, returned = response.data.len(), "search completed");
  Ok(Json(response))
}

/// GET /api/statistics endpoint
pub async fn get_statistics(State(state): State<AppState>) -> Json<StatisticsResponse> {
  Json(state.service.statistics())
}

/// Health check endpoint
///
/// Confirms the server is running.
pub async fn health_check() -> &'static str {
  "OK"
}
