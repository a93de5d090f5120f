//! indexer module
//!
//! Builds the per-site Lemma table and the page ↔ lemma Index with weighted ranks.

pub mod page_indexer;
pub mod report;

/// Re-export major types
pub use page_indexer::PageIndexer;
pub use report::IndexReport;
