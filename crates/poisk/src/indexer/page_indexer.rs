//! Page indexing: page content → Lemma frequencies and Index ranks.
//!
//! The rank of a lemma on a page is the weighted count of its occurrences,
//! `title_weight * c_title + heading_weight * c_heading + body_weight * c_body`.
//! A lemma's frequency counts the pages holding an Index entry for it, so it is
//! incremented exactly when an entry is created and decremented when one is removed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::config::{IndexerConfig, TextExtractor};
use crate::errors::IndexerError;
use crate::indexer::report::IndexReport;
use crate::lemmatizer::{Lemmatizer, split_regions_with};
use crate::models::{LemmaId, Page};
use crate::storage::Storage;

/// Updates the Lemma and Index records of a page's site.
pub struct PageIndexer {
  storage: Storage,
  lemmatizer: Arc<Lemmatizer>,
  weights: IndexerConfig,
  extractor: TextExtractor,
}

impl PageIndexer {
  /// Creates an indexer writing to `storage` with the given rank weights.
  pub fn new(storage: Storage, lemmatizer: Arc<Lemmatizer>, weights: IndexerConfig) -> Self {
    Self {
      storage,
      lemmatizer,
      weights,
      extractor: TextExtractor::default(),
    }
  }

  /// Uses `extractor` to split pages into rank regions.
  #[must_use]
  pub fn with_extractor(mut self, extractor: TextExtractor) -> Self {
    self.extractor = extractor;
    self
  }

  /// Re-indexes `page` after its content was (re)written.
  ///
  /// Pages with an error code get no entries; entries left over from an earlier
  /// version of the page are removed. Indexing an unchanged page changes nothing.
  ///
  /// # Errors
  /// `IndexerError::Storage` when a store operation fails.
  pub fn index_page(&self, page: &Page) -> Result<IndexReport, IndexerError> {
    let ranks = if page.is_successful() {
      self.rank_terms(&page.content)
    } else {
      HashMap::new()
    };

    let previous: HashSet<LemmaId> = self
      .storage
      .index
      .find_by_page(page.id)?
      .into_iter()
      .map(|entry| entry.lemma_id)
      .collect();

    let mut report = IndexReport {
      terms: ranks.len(),
      ..IndexReport::default()
    };
    let mut current = HashSet::with_capacity(ranks.len());

    for (term, rank) in &ranks {
      let lemma = self.storage.lemmas.upsert_increment(page.site_id, term, 0)?;
      current.insert(lemma.id);
      if self.storage.index.upsert(page.id, lemma.id, *rank)? {
        self.storage.lemmas.upsert_increment(page.site_id, term, 1)?;
        report.record_inserted();
      } else {
        report.record_updated();
      }
    }

    for &lemma_id in previous.difference(&current) {
      if self.storage.index.remove(page.id, lemma_id)? {
        self.storage.lemmas.decrement(lemma_id)?;
        report.record_removed();
      }
    }

    debug!(
      page_id = page.id,
      terms = report.terms,
      inserted = report.inserted,
      removed = report.removed,
      "index updated"
    );
    Ok(report)
  }

  /// Weighted lemma counts of an HTML document.
  pub fn rank_terms(&self, html: &str) -> HashMap<String, f64> {
    let regions = split_regions_with(html, self.extractor);
    let mut ranks = HashMap::new();
    self.accumulate(&mut ranks, &regions.title, self.weights.title_weight);
    for heading in &regions.headings {
      self.accumulate(&mut ranks, heading, self.weights.heading_weight);
    }
    self.accumulate(&mut ranks, &regions.body, self.weights.body_weight);
    ranks
  }

  fn accumulate(&self, ranks: &mut HashMap<String, f64>, text: &str, weight: f64) {
    for (lemma, count) in self.lemmatizer.lemmas(text) {
      *ranks.entry(lemma).or_insert(0.0) += weight * count as f64;
    }
  }
}
