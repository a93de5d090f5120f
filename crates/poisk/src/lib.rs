//! poisk site search library
//!
//! Crawls configured sites, lemmatizes Russian and English page text, keeps an
//! inverted index of weighted lemma ranks and answers ranked queries with
//! highlighted snippets.

/// Configuration module - PoiskConfig, SiteConfig, Language and the section structs
pub mod config;

/// Crawler module - fetch collaborator, URL policy, worker pool and per-site crawl
pub mod crawler;

/// Error module - per-layer error enums, PoiskError and PoiskResult
pub mod errors;

/// Indexer module - page content to Lemma frequencies and Index ranks
pub mod indexer;

/// Lemmatizer module - HTML cleaning, stop words and the lemma frequency map
pub mod lemmatizer;

/// Data model module - Site, Page, Lemma, IndexEntry and the response structs
pub mod models;

/// Morphology module - the dictionary capability and its Snowball implementation
pub mod morphology;

/// Orchestrator module - start/stop state machine of indexing runs
pub mod orchestrator;

/// Search module - ranked lemma search and snippet building
pub mod searcher;

/// Service module - PoiskService, the facade used by the HTTP layer
pub mod service;

/// Statistics module - corpus totals and per-site detail
pub mod statistics;

/// Storage module - store traits and the in-memory backend
pub mod storage;

/// Re-exports
pub use config::{Language, PoiskConfig};
pub use errors::{PoiskError, PoiskResult};
pub use service::PoiskService;
