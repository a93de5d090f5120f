//! Error definitions

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Language;

/// Errors related to the configuration file (PoiskConfig)
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ConfigError {
  /// The configuration file could not be read
  #[error("failed to read configuration file: path={path:?}, error={source}")]
  Read {
    /// Path that was read
    path: PathBuf,
    /// Underlying IO error
    #[source]
    source: Arc<io::Error>,
  },

  /// The configuration file is not valid TOML or does not match the schema
  #[error("failed to parse configuration: {reason}")]
  Parse {
    /// Parser message
    reason: String,
  },

  /// `sites` is empty
  #[error("at least one site must be configured in [[sites]]")]
  NoSites,

  /// A site URL is not an absolute http(s) URL
  #[error("site url is invalid: url={url}, reason={reason}")]
  InvalidSiteUrl {
    /// Configured URL
    url: String,
    /// Why it was rejected
    reason: String,
  },

  /// The same site URL is configured twice
  #[error("site url is configured more than once: {url}")]
  DuplicateSiteUrl {
    /// Duplicated URL
    url: String,
  },

  /// A site has an empty name
  #[error("site name must not be empty: url={url}")]
  EmptySiteName {
    /// URL of the offending site
    url: String,
  },

  /// lemmatizer.languages is empty
  #[error("lemmatizer.languages must contain at least one language")]
  EmptyLanguages,

  /// crawler.max_concurrency < 1
  #[error("crawler.max_concurrency must be at least 1: actual={actual}")]
  InvalidMaxConcurrency {
    /// Configured value
    actual: usize,
  },

  /// A crawler timeout is zero
  #[error("crawler.{field} must be greater than 0")]
  InvalidTimeout {
    /// Name of the timeout field
    field: &'static str,
  },

  /// search.default_limit < 1
  #[error("search.default_limit must be at least 1: actual={actual}")]
  InvalidSearchDefaultLimit {
    /// Configured value
    actual: usize,
  },

  /// search.max_limit < search.default_limit
  #[error(
    "search.max_limit must be greater than or equal to search.default_limit: \
     default_limit={default_limit}, max_limit={max_limit}"
  )]
  InvalidSearchMaxLimit {
    /// search.default_limit
    default_limit: usize,
    /// search.max_limit
    max_limit: usize,
  },

  /// search.too_frequent_threshold outside (0, 1]
  #[error("search.too_frequent_threshold must be within (0, 1]: actual={actual}")]
  InvalidTooFrequentThreshold {
    /// Configured value
    actual: f64,
  },

  /// A rank weight is negative
  #[error("indexer.{field} must not be negative: actual={actual}")]
  NegativeWeight {
    /// Name of the weight field
    field: &'static str,
    /// Configured value
    actual: f64,
  },

  /// A prominent region does not outweigh body text
  #[error("indexer.{field} ({weight}) must be greater than indexer.body_weight ({body_weight})")]
  WeightNotAboveBody {
    /// Name of the weight field
    field: &'static str,
    /// Configured weight
    weight: f64,
    /// Configured body weight
    body_weight: f64,
  },
}

/// Morphological analysis errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum MorphologyError {
  /// The word contains characters the dictionary cannot analyze
  #[error("word is not analyzable by the {language} dictionary: {word}")]
  WrongScript {
    /// Analyzed word
    word: String,
    /// Dictionary language
    language: Language,
  },
}

/// Storage collaborator errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum StorageError {
  /// A referenced record does not exist
  #[error("{entity} not found: {key}")]
  NotFound {
    /// Record kind
    entity: &'static str,
    /// Lookup key
    key: String,
  },

  /// A uniqueness constraint was violated
  #[error("{entity} already exists: {key}")]
  Conflict {
    /// Record kind
    entity: &'static str,
    /// Conflicting key
    key: String,
  },

  /// The backend failed
  #[error("storage backend error: {0}")]
  Backend(String),
}

/// HTTP fetch errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum FetchError {
  /// The HTTP client could not be built
  #[error("failed to build http client: {reason}")]
  Client {
    /// Builder message
    reason: String,
  },

  /// The request timed out
  #[error("request timed out: {url}")]
  Timeout {
    /// Requested URL
    url: String,
  },

  /// The connection could not be established
  #[error("connection failed: url={url}, reason={reason}")]
  Connect {
    /// Requested URL
    url: String,
    /// Transport message
    reason: String,
  },

  /// The server answered with an error status
  #[error("server answered {status}: {url}")]
  HttpStatus {
    /// Requested URL
    url: String,
    /// HTTP status code
    status: u16,
  },

  /// The response is not an HTML document
  #[error("content is not html: url={url}, content_type={content_type}")]
  NotHtml {
    /// Requested URL
    url: String,
    /// Received content type
    content_type: String,
  },

  /// Any other transport failure
  #[error("request failed: url={url}, reason={reason}")]
  Request {
    /// Requested URL
    url: String,
    /// Transport message
    reason: String,
  },
}

impl FetchError {
  /// Status code recorded for the placeholder page written after this failure.
  ///
  /// Error statuses are kept; every other failure is recorded as 404.
  pub fn placeholder_code(&self) -> u16 {
    match self {
      FetchError::HttpStatus { status, .. } => *status,
      _ => 404,
    }
  }
}

/// Crawler errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CrawlError {
  /// The crawl was interrupted by a stop request
  #[error("crawl was cancelled")]
  Cancelled,

  /// The site root URL cannot be crawled
  #[error("site root url is invalid: url={url}, reason={reason}")]
  InvalidRootUrl {
    /// Configured URL
    url: String,
    /// Why it was rejected
    reason: String,
  },

  /// HTTP client construction or fetch failure
  #[error(transparent)]
  Fetch(#[from] FetchError),

  /// Storage failure
  #[error(transparent)]
  Storage(#[from] StorageError),

  /// A crawl task panicked or was aborted unexpectedly
  #[error("crawl task failed: {reason}")]
  TaskFailed {
    /// Join error message
    reason: String,
  },
}

/// Indexer errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum IndexerError {
  /// Storage failure
  #[error(transparent)]
  Storage(#[from] StorageError),
}

/// Query engine errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum SearcherError {
  /// Storage failure
  #[error(transparent)]
  Storage(#[from] StorageError),

  /// The requested site is not indexed
  #[error("site is not indexed: {url}")]
  SiteNotFound {
    /// Requested site URL
    url: String,
  },
}

/// Indexing orchestrator errors
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum OrchestratorError {
  /// start() was called while a run is in progress
  #[error("Indexing is already running")]
  AlreadyRunning,

  /// stop() was called while no run is in progress
  #[error("Indexing is not running")]
  NotRunning,

  /// start() was called outside of a tokio runtime
  #[error("no async runtime is available to run the crawl")]
  NoRuntime,

  /// Storage failure while changing site statuses
  #[error(transparent)]
  Storage(#[from] StorageError),
}

/// Unified error
/// Public APIs exposed outside this crate return this error
/// Used as `PoiskResult<T>` = `Result<T, PoiskError>`
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum PoiskError {
  /// Configuration error
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// Morphology error
  #[error(transparent)]
  Morphology(#[from] MorphologyError),

  /// Storage error
  #[error(transparent)]
  Storage(#[from] StorageError),

  /// Fetch error
  #[error(transparent)]
  Fetch(#[from] FetchError),

  /// Crawler error
  #[error(transparent)]
  Crawl(#[from] CrawlError),

  /// Indexer error
  #[error(transparent)]
  Indexer(#[from] IndexerError),

  /// Query engine error
  #[error(transparent)]
  Searcher(#[from] SearcherError),

  /// Orchestrator error
  #[error(transparent)]
  Orchestrator(#[from] OrchestratorError),

  /// The page does not belong to any configured site
  #[error("page is outside the configured sites: {url}")]
  PageOutsideSites {
    /// Requested URL
    url: String,
  },

  /// The page URL is excluded from crawling (document, media, fragment...)
  #[error("page cannot be indexed: {url}")]
  PageExcluded {
    /// Requested URL
    url: String,
  },
}

/// Standard Result type alias of the poisk crate
pub type PoiskResult<T> = Result<T, PoiskError>;
