//! searcher module

pub mod query_engine;
pub mod snippet;

/// Re-exports
pub use query_engine::SearchEngine;
pub use snippet::{NO_TITLE, build_snippet, page_title};
