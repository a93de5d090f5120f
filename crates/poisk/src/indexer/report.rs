//! Result of indexing one page

use serde::{Deserialize, Serialize};

/// Counters of one `index_page` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
  /// Distinct lemmas found on the page
  pub terms: usize,
  /// Index entries created (the lemma frequency was incremented)
  pub inserted: usize,
  /// Index entries whose rank was rewritten
  pub updated: usize,
  /// Stale entries removed (the lemma frequency was decremented)
  pub removed: usize,
}

impl IndexReport {
  /// True when the call left every lemma frequency unchanged
  pub fn is_unchanged(&self) -> bool {
    self.inserted == 0 && self.removed == 0
  }

  /// Record a created entry
  pub fn record_inserted(&mut self) {
    self.inserted += 1;
  }

  /// Record a rewritten entry
  pub fn record_updated(&mut self) {
    self.updated += 1;
  }

  /// Record a removed entry
  pub fn record_removed(&mut self) {
    self.removed += 1;
  }
}
