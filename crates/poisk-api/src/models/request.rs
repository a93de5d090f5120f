//! Request model definitions

use serde::Deserialize;

use crate::config::MAX_QUERY_LENGTH;
use crate::errors::{ApiError, Result};

/// Query string of `GET /api/search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  /// Search query
  pub query: Option<String>,
  /// Site URL to search in (all sites when absent)
  pub site: Option<String>,
  /// Number of hits to skip
  pub offset: Option<usize>,
  /// Page size
  pub limit: Option<usize>,
}

/// Validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
  /// Non-empty search query
  pub query: String,
  /// Site URL, `None` for every site
  pub site: Option<String>,
  /// Number of hits to skip
  pub offset: usize,
  /// Requested page size, `None` for the configured default
  pub limit: Option<usize>,
}

impl SearchParams {
  /// Validates the parameters
  ///
  /// # Errors
  /// - The query is missing or blank
  /// - The query exceeds [`MAX_QUERY_LENGTH`]
  pub fn validate(self) -> Result<SearchRequest> {
    let query = self.query.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
      return Err(ApiError::invalid_input("query is empty"));
    }
    if query.len() > MAX_QUERY_LENGTH {
      return Err(ApiError::query_too_long(query.len(), MAX_QUERY_LENGTH));
    }
    let site = self.site.map(|site| site.trim().to_string()).filter(|site| !site.is_empty());
    Ok(SearchRequest {
      query: query.to_string(),
      site,
      offset: self.offset.unwrap_or(0),
      limit: self.limit,
    })
  }
}

/// Query string of `POST /api/indexPage`
#[derive(Debug, Default, Deserialize)]
pub struct IndexPageParams {
  /// Page URL
  pub url: Option<String>,
}

impl IndexPageParams {
  /// Returns the trimmed page URL
  ///
  /// # Errors
  /// The URL is missing or blank
  pub fn validate(self) -> Result<String> {
    match self.url.as_deref().map(str::trim) {
      Some(url) if !url.is_empty() => Ok(url.to_string()),
      _ => Err(ApiError::invalid_input("url is empty")),
    }
  }
}
