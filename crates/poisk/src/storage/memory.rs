//! In-memory backend on `dashmap`.
//!
//! Unique-key maps (`url`, `(site, path)`, `(site, lemma)`, `(page, lemma)`) are
//! the source of record; an upsert holds the key's shard guard for its whole
//! read-modify-write. Guards are always taken key map first, record map second.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::errors::StorageError;
use crate::models::{IndexEntry, Lemma, LemmaId, Page, PageId, Site, SiteId, SiteStatus};
use crate::storage::{IndexStore, LemmaStore, PageStore, SiteStore};

/// Store of all four record kinds, held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
  next_id: AtomicU64,

  site_ids: DashMap<String, SiteId>,
  sites: DashMap<SiteId, Site>,

  page_ids: DashMap<(SiteId, String), PageId>,
  pages: DashMap<PageId, Page>,

  lemma_ids: DashMap<(SiteId, String), LemmaId>,
  lemmas: DashMap<LemmaId, Lemma>,

  entries: DashMap<(PageId, LemmaId), f64>,
  pages_by_lemma: DashMap<LemmaId, HashSet<PageId>>,
  lemmas_by_page: DashMap<PageId, HashSet<LemmaId>>,
}

impl MemoryStore {
  /// Creates an empty store.
  pub fn new() -> Self {
    Self::default()
  }

  fn allocate_id(&self) -> u64 {
    self.next_id.fetch_add(1, Ordering::Relaxed) + 1
  }
}

fn missing(entity: &'static str, key: impl ToString) -> StorageError {
  StorageError::NotFound {
    entity,
    key: key.to_string(),
  }
}

// ─── Sites ───────────────────────────────────────────────────────────────────

impl SiteStore for MemoryStore {
  fn upsert(
    &self,
    url: &str,
    name: &str,
    status: SiteStatus,
    last_error: Option<String>,
  ) -> Result<Site, StorageError> {
    match self.site_ids.entry(url.to_string()) {
      Entry::Occupied(occupied) => {
        let id = *occupied.get();
        let mut site = self.sites.get_mut(&id).ok_or_else(|| missing("site", id))?;
        site.name = name.to_string();
        site.status = status;
        site.last_error = last_error;
        site.status_time = Utc::now();
        Ok(site.clone())
      }
      Entry::Vacant(vacant) => {
        let site = Site {
          id: self.allocate_id(),
          url: url.to_string(),
          name: name.to_string(),
          status,
          status_time: Utc::now(),
          last_error,
        };
        self.sites.insert(site.id, site.clone());
        vacant.insert(site.id);
        Ok(site)
      }
    }
  }

  fn find_by_url(&self, url: &str) -> Result<Option<Site>, StorageError> {
    let Some(id) = self.site_ids.get(url).map(|id| *id) else {
      return Ok(None);
    };
    SiteStore::find_by_id(self, id)
  }

  fn find_by_id(&self, id: SiteId) -> Result<Option<Site>, StorageError> {
    Ok(self.sites.get(&id).map(|site| site.clone()))
  }

  fn list_all(&self) -> Result<Vec<Site>, StorageError> {
    let mut sites: Vec<Site> = self.sites.iter().map(|site| site.clone()).collect();
    sites.sort_by_key(|site| site.id);
    Ok(sites)
  }

  fn count_by_status(&self, status: SiteStatus) -> Result<usize, StorageError> {
    Ok(self.sites.iter().filter(|site| site.status == status).count())
  }

  fn touch(&self, id: SiteId) -> Result<(), StorageError> {
    let mut site = self.sites.get_mut(&id).ok_or_else(|| missing("site", id))?;
    site.status_time = Utc::now();
    Ok(())
  }

  fn transition(
    &self,
    id: SiteId,
    from: SiteStatus,
    to: SiteStatus,
    last_error: Option<String>,
  ) -> Result<bool, StorageError> {
    let mut site = self.sites.get_mut(&id).ok_or_else(|| missing("site", id))?;
    if site.status != from {
      return Ok(false);
    }
    site.status = to;
    site.last_error = last_error;
    site.status_time = Utc::now();
    Ok(true)
  }
}

// ─── Pages ───────────────────────────────────────────────────────────────────

impl PageStore for MemoryStore {
  fn upsert(
    &self,
    site_id: SiteId,
    path: &str,
    code: u16,
    content: &str,
  ) -> Result<Page, StorageError> {
    match self.page_ids.entry((site_id, path.to_string())) {
      Entry::Occupied(occupied) => {
        let id = *occupied.get();
        let mut page = self.pages.get_mut(&id).ok_or_else(|| missing("page", id))?;
        page.code = code;
        page.content = content.to_string();
        Ok(page.clone())
      }
      Entry::Vacant(vacant) => {
        let page = Page {
          id: self.allocate_id(),
          site_id,
          path: path.to_string(),
          code,
          content: content.to_string(),
        };
        self.pages.insert(page.id, page.clone());
        vacant.insert(page.id);
        Ok(page)
      }
    }
  }

  fn exists(&self, site_id: SiteId, path: &str) -> Result<bool, StorageError> {
    Ok(self.page_ids.contains_key(&(site_id, path.to_string())))
  }

  fn find(&self, site_id: SiteId, path: &str) -> Result<Option<Page>, StorageError> {
    let Some(id) = self.page_ids.get(&(site_id, path.to_string())).map(|id| *id) else {
      return Ok(None);
    };
    PageStore::find_by_id(self, id)
  }

  fn find_by_id(&self, id: PageId) -> Result<Option<Page>, StorageError> {
    Ok(self.pages.get(&id).map(|page| page.clone()))
  }

  fn count_by_site(&self, site_id: SiteId) -> Result<usize, StorageError> {
    Ok(self.pages.iter().filter(|page| page.site_id == site_id).count())
  }

  fn count_successful_by_site(&self, site_id: SiteId) -> Result<usize, StorageError> {
    Ok(
      self
        .pages
        .iter()
        .filter(|page| page.site_id == site_id && page.is_successful())
        .count(),
    )
  }

  fn count_all(&self) -> Result<usize, StorageError> {
    Ok(self.pages.len())
  }
}

// ─── Lemmas ──────────────────────────────────────────────────────────────────

impl LemmaStore for MemoryStore {
  fn upsert_increment(
    &self,
    site_id: SiteId,
    lemma: &str,
    delta: u32,
  ) -> Result<Lemma, StorageError> {
    match self.lemma_ids.entry((site_id, lemma.to_string())) {
      Entry::Occupied(occupied) => {
        let id = *occupied.get();
        let mut record = self.lemmas.get_mut(&id).ok_or_else(|| missing("lemma", id))?;
        record.frequency = record.frequency.saturating_add(delta);
        Ok(record.clone())
      }
      Entry::Vacant(vacant) => {
        let record = Lemma {
          id: self.allocate_id(),
          site_id,
          lemma: lemma.to_string(),
          frequency: delta,
        };
        self.lemmas.insert(record.id, record.clone());
        vacant.insert(record.id);
        Ok(record)
      }
    }
  }

  fn decrement(&self, id: LemmaId) -> Result<Option<Lemma>, StorageError> {
    Ok(self.lemmas.get_mut(&id).map(|mut record| {
      record.frequency = record.frequency.saturating_sub(1);
      record.clone()
    }))
  }

  fn find(&self, site_id: SiteId, lemma: &str) -> Result<Option<Lemma>, StorageError> {
    let Some(id) = self.lemma_ids.get(&(site_id, lemma.to_string())).map(|id| *id) else {
      return Ok(None);
    };
    LemmaStore::find_by_id(self, id)
  }

  fn find_by_id(&self, id: LemmaId) -> Result<Option<Lemma>, StorageError> {
    Ok(self.lemmas.get(&id).map(|lemma| lemma.clone()))
  }

  fn list_by_site(&self, site_id: SiteId) -> Result<Vec<Lemma>, StorageError> {
    let mut lemmas: Vec<Lemma> = self
      .lemmas
      .iter()
      .filter(|lemma| lemma.site_id == site_id)
      .map(|lemma| lemma.clone())
      .collect();
    lemmas.sort_by_key(|lemma| lemma.id);
    Ok(lemmas)
  }

  fn count_by_site(&self, site_id: SiteId) -> Result<usize, StorageError> {
    Ok(self.lemmas.iter().filter(|lemma| lemma.site_id == site_id).count())
  }

  fn sum_frequency_by_site(&self, site_id: SiteId) -> Result<u64, StorageError> {
    Ok(
      self
        .lemmas
        .iter()
        .filter(|lemma| lemma.site_id == site_id)
        .map(|lemma| u64::from(lemma.frequency))
        .sum(),
    )
  }

  fn count_all(&self) -> Result<usize, StorageError> {
    Ok(self.lemmas.len())
  }
}

// ─── Index ───────────────────────────────────────────────────────────────────

impl MemoryStore {
  fn entries_of(&self, pairs: impl IntoIterator<Item = (PageId, LemmaId)>) -> Vec<IndexEntry> {
    let mut entries: Vec<IndexEntry> = pairs
      .into_iter()
      .filter_map(|(page_id, lemma_id)| {
        self.entries.get(&(page_id, lemma_id)).map(|rank| IndexEntry {
          page_id,
          lemma_id,
          rank: *rank,
        })
      })
      .collect();
    entries.sort_by_key(|entry| (entry.page_id, entry.lemma_id));
    entries
  }
}

impl IndexStore for MemoryStore {
  fn upsert(&self, page_id: PageId, lemma_id: LemmaId, rank: f64) -> Result<bool, StorageError> {
    match self.entries.entry((page_id, lemma_id)) {
      Entry::Occupied(mut occupied) => {
        occupied.insert(rank);
        Ok(false)
      }
      Entry::Vacant(vacant) => {
        vacant.insert(rank);
        self.pages_by_lemma.entry(lemma_id).or_default().insert(page_id);
        self.lemmas_by_page.entry(page_id).or_default().insert(lemma_id);
        Ok(true)
      }
    }
  }

  fn find(&self, page_id: PageId, lemma_id: LemmaId) -> Result<Option<IndexEntry>, StorageError> {
    Ok(self.entries.get(&(page_id, lemma_id)).map(|rank| IndexEntry {
      page_id,
      lemma_id,
      rank: *rank,
    }))
  }

  fn find_by_lemma(&self, lemma_id: LemmaId) -> Result<Vec<IndexEntry>, StorageError> {
    let page_ids: Vec<PageId> = self
      .pages_by_lemma
      .get(&lemma_id)
      .map(|pages| pages.iter().copied().collect())
      .unwrap_or_default();
    Ok(self.entries_of(page_ids.into_iter().map(|page_id| (page_id, lemma_id))))
  }

  fn find_by_page(&self, page_id: PageId) -> Result<Vec<IndexEntry>, StorageError> {
    let lemma_ids: Vec<LemmaId> = self
      .lemmas_by_page
      .get(&page_id)
      .map(|lemmas| lemmas.iter().copied().collect())
      .unwrap_or_default();
    Ok(self.entries_of(lemma_ids.into_iter().map(|lemma_id| (page_id, lemma_id))))
  }

  fn find_by_site_and_lemmas(
    &self,
    site_id: SiteId,
    lemma_ids: &[LemmaId],
  ) -> Result<Vec<IndexEntry>, StorageError> {
    let mut entries = Vec::new();
    for &lemma_id in lemma_ids {
      let belongs = self
        .lemmas
        .get(&lemma_id)
        .is_some_and(|lemma| lemma.site_id == site_id);
      if belongs {
        entries.extend(IndexStore::find_by_lemma(self, lemma_id)?);
      }
    }
    Ok(entries)
  }

  fn remove(&self, page_id: PageId, lemma_id: LemmaId) -> Result<bool, StorageError> {
    if self.entries.remove(&(page_id, lemma_id)).is_none() {
      return Ok(false);
    }
    if let Some(mut pages) = self.pages_by_lemma.get_mut(&lemma_id) {
      pages.remove(&page_id);
    }
    if let Some(mut lemmas) = self.lemmas_by_page.get_mut(&page_id) {
      lemmas.remove(&lemma_id);
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::Storage;
  use std::sync::Arc;
  use std::thread;

  fn storage() -> Storage {
    Storage::in_memory()
  }

  // ─── Sites ───────────────────────────────────────────────────────────────

  #[test]
  fn site_upsert_keeps_identity_by_url() {
    let storage = storage();
    let first = storage
      .sites
      .upsert("https://volochek.life", "Volochek", SiteStatus::Indexing, None)
      .unwrap();
    let second = storage
      .sites
      .upsert(
        "https://volochek.life",
        "Volochek Life",
        SiteStatus::Failed,
        Some("boom".to_string()),
      )
      .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Volochek Life");
    assert_eq!(second.last_error.as_deref(), Some("boom"));
    assert!(second.status_time >= first.status_time);
    assert_eq!(storage.sites.list_all().unwrap().len(), 1);
    assert_eq!(
      storage.sites.find_by_url("https://volochek.life").unwrap(),
      Some(second)
    );
  }

  #[test]
  fn site_transition_is_compare_and_set() {
    let storage = storage();
    let site = storage
      .sites
      .upsert("https://volochek.life", "Volochek", SiteStatus::Indexing, None)
      .unwrap();

    let moved = storage
      .sites
      .transition(site.id, SiteStatus::Indexing, SiteStatus::Failed, Some("stop".into()))
      .unwrap();
    assert!(moved);

    let moved_again = storage
      .sites
      .transition(site.id, SiteStatus::Indexing, SiteStatus::Indexed, None)
      .unwrap();
    assert!(!moved_again);

    let stored = storage.sites.find_by_id(site.id).unwrap().unwrap();
    assert_eq!(stored.status, SiteStatus::Failed);
    assert_eq!(stored.last_error.as_deref(), Some("stop"));
    assert_eq!(storage.sites.count_by_status(SiteStatus::Failed).unwrap(), 1);
  }

  #[test]
  fn site_touch_of_unknown_site_fails() {
    let err = storage().sites.touch(42).unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "site", .. }));
  }

  // ─── Pages ───────────────────────────────────────────────────────────────

  #[test]
  fn page_upsert_updates_duplicate_path() {
    let storage = storage();
    let first = storage.pages.upsert(1, "https://a.ru/x", 404, "").unwrap();
    let second = storage.pages.upsert(1, "https://a.ru/x", 200, "<p>x</p>").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.code, 200);
    assert!(storage.pages.exists(1, "https://a.ru/x").unwrap());
    assert!(!storage.pages.exists(2, "https://a.ru/x").unwrap());
    assert_eq!(storage.pages.count_by_site(1).unwrap(), 1);
    assert_eq!(
      storage.pages.find(1, "https://a.ru/x").unwrap().map(|p| p.content),
      Some("<p>x</p>".to_string())
    );
  }

  #[test]
  fn page_counts_split_successful_pages() {
    let storage = storage();
    storage.pages.upsert(1, "https://a.ru/", 200, "ok").unwrap();
    storage.pages.upsert(1, "https://a.ru/gone", 404, "").unwrap();
    storage.pages.upsert(2, "https://b.ru/", 200, "ok").unwrap();

    assert_eq!(storage.pages.count_by_site(1).unwrap(), 2);
    assert_eq!(storage.pages.count_successful_by_site(1).unwrap(), 1);
    assert_eq!(storage.pages.count_all().unwrap(), 3);
  }

  #[test]
  fn concurrent_page_upserts_create_one_record() {
    let storage = Arc::new(storage());
    let handles: Vec<_> = (0..8)
      .map(|i| {
        let storage = Arc::clone(&storage);
        thread::spawn(move || storage.pages.upsert(1, "https://a.ru/", 200, &i.to_string()))
      })
      .collect();
    let ids: HashSet<PageId> = handles
      .into_iter()
      .map(|h| h.join().unwrap().unwrap().id)
      .collect();

    assert_eq!(ids.len(), 1);
    assert_eq!(storage.pages.count_all().unwrap(), 1);
  }

  // ─── Lemmas ──────────────────────────────────────────────────────────────

  #[test]
  fn lemma_upsert_increment_accumulates() {
    let storage = storage();
    let created = storage.lemmas.upsert_increment(1, "леопард", 0).unwrap();
    assert_eq!(created.frequency, 0);
    storage.lemmas.upsert_increment(1, "леопард", 1).unwrap();
    let updated = storage.lemmas.upsert_increment(1, "леопард", 1).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.frequency, 2);
    // same text on another site is a separate record
    let other = storage.lemmas.upsert_increment(2, "леопард", 1).unwrap();
    assert_ne!(other.id, created.id);

    assert_eq!(storage.lemmas.count_by_site(1).unwrap(), 1);
    assert_eq!(storage.lemmas.sum_frequency_by_site(1).unwrap(), 2);
    assert_eq!(storage.lemmas.count_all().unwrap(), 2);
  }

  #[test]
  fn lemma_decrement_saturates() {
    let storage = storage();
    let lemma = storage.lemmas.upsert_increment(1, "кавказ", 1).unwrap();

    let once = storage.lemmas.decrement(lemma.id).unwrap().unwrap();
    let twice = storage.lemmas.decrement(lemma.id).unwrap().unwrap();
    assert_eq!(once.frequency, 0);
    assert_eq!(twice.frequency, 0);
    assert!(storage.lemmas.decrement(999).unwrap().is_none());
  }

  #[test]
  fn concurrent_lemma_increments_are_not_lost() {
    let storage = Arc::new(storage());
    let handles: Vec<_> = (0..16)
      .map(|_| {
        let storage = Arc::clone(&storage);
        thread::spawn(move || storage.lemmas.upsert_increment(1, "leopard", 1))
      })
      .collect();
    for handle in handles {
      handle.join().unwrap().unwrap();
    }

    let lemma = storage.lemmas.find(1, "leopard").unwrap().unwrap();
    assert_eq!(lemma.frequency, 16);
  }

  // ─── Index ───────────────────────────────────────────────────────────────

  #[test]
  fn index_upsert_reports_first_insert() {
    let storage = storage();
    assert!(storage.index.upsert(10, 20, 1.0).unwrap());
    assert!(!storage.index.upsert(10, 20, 3.5).unwrap());

    let entry = storage.index.find(10, 20).unwrap().unwrap();
    assert_eq!(entry.rank, 3.5);
    assert_eq!(storage.index.find_by_lemma(20).unwrap().len(), 1);
    assert_eq!(storage.index.find_by_page(10).unwrap().len(), 1);
  }

  #[test]
  fn index_remove_clears_secondary_lookups() {
    let storage = storage();
    storage.index.upsert(10, 20, 1.0).unwrap();
    storage.index.upsert(11, 20, 2.0).unwrap();

    assert!(storage.index.remove(10, 20).unwrap());
    assert!(!storage.index.remove(10, 20).unwrap());

    let remaining = storage.index.find_by_lemma(20).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].page_id, 11);
    assert!(storage.index.find_by_page(10).unwrap().is_empty());
  }

  #[test]
  fn index_find_by_site_and_lemmas_filters_foreign_lemmas() {
    let storage = storage();
    let own = storage.lemmas.upsert_increment(1, "leopard", 1).unwrap();
    let foreign = storage.lemmas.upsert_increment(2, "leopard", 1).unwrap();
    storage.index.upsert(100, own.id, 1.0).unwrap();
    storage.index.upsert(200, foreign.id, 1.0).unwrap();

    let entries = storage
      .index
      .find_by_site_and_lemmas(1, &[own.id, foreign.id])
      .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].page_id, 100);
  }
}
