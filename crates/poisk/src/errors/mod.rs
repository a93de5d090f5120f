//! errors module
pub mod error_definition;

/// Re-export major error types
pub use error_definition::{
  ConfigError, CrawlError, FetchError, IndexerError, MorphologyError, OrchestratorError,
  PoiskError, PoiskResult, SearcherError, StorageError,
};
