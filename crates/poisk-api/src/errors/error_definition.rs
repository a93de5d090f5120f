//! API error definitions

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use poisk::errors::{ConfigError, FetchError, PoiskError};

/// Error kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
  /// Invalid input value
  InvalidInput,
  /// Search query too long
  QueryTooLong,
  /// Internal error
  Internal,
  /// Configuration error
  Config,
}

impl ApiErrorKind {
  /// Returns the error code
  #[must_use]
  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidInput => "invalid_input",
      Self::QueryTooLong => "query_too_long",
      Self::Internal => "internal_error",
      Self::Config => "config_error",
    }
  }

  /// Returns the HTTP status code
  #[must_use]
  pub fn status(&self) -> StatusCode {
    match self {
      Self::InvalidInput | Self::QueryTooLong => StatusCode::BAD_REQUEST,
      Self::Internal | Self::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

/// API error
#[derive(Debug, Error)]
pub enum ApiError {
  /// Invalid input value
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// Search query too long
  #[error("query is too long: {0} bytes (max: {1} bytes)")]
  QueryTooLong(usize, usize),

  /// Internal error
  #[error("internal error: {0}")]
  Internal(String),

  /// Configuration error
  #[error("configuration error: {0}")]
  Config(String),
}

impl ApiError {
  /// Returns the error kind
  #[must_use]
  pub fn kind(&self) -> ApiErrorKind {
    match self {
      Self::InvalidInput(_) => ApiErrorKind::InvalidInput,
      Self::QueryTooLong(_, _) => ApiErrorKind::QueryTooLong,
      Self::Internal(_) => ApiErrorKind::Internal,
      Self::Config(_) => ApiErrorKind::Config,
    }
  }

  /// Returns the error code
  #[must_use]
  pub fn code(&self) -> &'static str {
    self.kind().code()
  }

  /// Returns the HTTP status code
  #[must_use]
  pub fn status(&self) -> StatusCode {
    self.kind().status()
  }

  /// Creates an invalid input error
  #[must_use]
  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::InvalidInput(message.into())
  }

  /// Creates a query length error
  #[must_use]
  pub fn query_too_long(actual: usize, max: usize) -> Self {
    Self::QueryTooLong(actual, max)
  }

  /// Creates an internal error
  #[must_use]
  pub fn internal(message: impl Into<String>) -> Self {
    Self::Internal(message.into())
  }

  /// Creates a configuration error
  #[must_use]
  pub fn config(message: impl Into<String>) -> Self {
    Self::Config(message.into())
  }
}

/// JSON body of an error response
#[derive(Serialize)]
struct ErrorResponse {
  error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
  code: &'static str,
  message: String,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = ErrorResponse {
      error: ErrorBody {
        code: self.code(),
        message: self.to_string(),
      },
    };

    (status, Json(body)).into_response()
  }
}

/// Conversion from PoiskError to ApiError
///
/// Maps domain errors onto API error kinds.
impl From<PoiskError> for ApiError {
  fn from(err: PoiskError) -> Self {
    match err {
      PoiskError::PageOutsideSites { .. } | PoiskError::PageExcluded { .. } => {
        ApiError::invalid_input(err.to_string())
      }
      PoiskError::Config(err) => ApiError::config(err.to_string()),
      PoiskError::Fetch(FetchError::Client { .. }) => {
        ApiError::config(format!("http client error: {err}"))
      }
      PoiskError::Storage(_) | PoiskError::Searcher(_) | PoiskError::Indexer(_) => {
        ApiError::internal(format!("internal error: {err}"))
      }
      // PoiskError is #[non_exhaustive]
      _ => ApiError::internal(format!("unknown error: {err}")),
    }
  }
}

impl From<ConfigError> for ApiError {
  fn from(err: ConfigError) -> Self {
    ApiError::config(err.to_string())
  }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
