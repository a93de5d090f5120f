//! Storage collaborators for sites, pages, lemmas and index entries.
//!
//! Every upsert is atomic per logical key: `url` for sites, `(site, path)` for
//! pages, `(site, lemma)` for lemmas and `(page, lemma)` for index entries.

pub mod memory;

use std::sync::Arc;

use crate::errors::StorageError;
use crate::models::{IndexEntry, Lemma, LemmaId, Page, PageId, Site, SiteId, SiteStatus};

pub use memory::MemoryStore;

/// Site records
pub trait SiteStore: Send + Sync {
  /// Creates or updates the site identified by `url`, setting name, status and
  /// error and refreshing the status time.
  fn upsert(
    &self,
    url: &str,
    name: &str,
    status: SiteStatus,
    last_error: Option<String>,
  ) -> Result<Site, StorageError>;

  /// Site with the given URL
  fn find_by_url(&self, url: &str) -> Result<Option<Site>, StorageError>;

  /// Site with the given id
  fn find_by_id(&self, id: SiteId) -> Result<Option<Site>, StorageError>;

  /// All sites ordered by id
  fn list_all(&self) -> Result<Vec<Site>, StorageError>;

  /// Number of sites in `status`
  fn count_by_status(&self, status: SiteStatus) -> Result<usize, StorageError>;

  /// Refreshes the status time (heartbeat).
  ///
  /// # Errors
  /// `StorageError::NotFound` when the site does not exist.
  fn touch(&self, id: SiteId) -> Result<(), StorageError>;

  /// Moves the site from `from` to `to` only if it is currently in `from`.
  ///
  /// Returns whether the transition happened.
  fn transition(
    &self,
    id: SiteId,
    from: SiteStatus,
    to: SiteStatus,
    last_error: Option<String>,
  ) -> Result<bool, StorageError>;
}

/// Page records
pub trait PageStore: Send + Sync {
  /// Creates or updates the page at `(site_id, path)`.
  fn upsert(&self, site_id: SiteId, path: &str, code: u16, content: &str)
  -> Result<Page, StorageError>;

  /// Whether a page exists at `(site_id, path)`
  fn exists(&self, site_id: SiteId, path: &str) -> Result<bool, StorageError>;

  /// Page at `(site_id, path)`
  fn find(&self, site_id: SiteId, path: &str) -> Result<Option<Page>, StorageError>;

  /// Page with the given id
  fn find_by_id(&self, id: PageId) -> Result<Option<Page>, StorageError>;

  /// Number of pages of the site
  fn count_by_site(&self, site_id: SiteId) -> Result<usize, StorageError>;

  /// Number of pages of the site with a code below 400
  fn count_successful_by_site(&self, site_id: SiteId) -> Result<usize, StorageError>;

  /// Number of pages of all sites
  fn count_all(&self) -> Result<usize, StorageError>;
}

/// Lemma records
pub trait LemmaStore: Send + Sync {
  /// Creates the `(site_id, lemma)` record with frequency `delta`, or adds `delta`
  /// to the existing one.
  fn upsert_increment(&self, site_id: SiteId, lemma: &str, delta: u32)
  -> Result<Lemma, StorageError>;

  /// Lowers the frequency of the lemma by one, saturating at zero.
  fn decrement(&self, id: LemmaId) -> Result<Option<Lemma>, StorageError>;

  /// Lemma record of `(site_id, lemma)`
  fn find(&self, site_id: SiteId, lemma: &str) -> Result<Option<Lemma>, StorageError>;

  /// Lemma with the given id
  fn find_by_id(&self, id: LemmaId) -> Result<Option<Lemma>, StorageError>;

  /// All lemmas of the site ordered by id
  fn list_by_site(&self, site_id: SiteId) -> Result<Vec<Lemma>, StorageError>;

  /// Number of lemma records of the site
  fn count_by_site(&self, site_id: SiteId) -> Result<usize, StorageError>;

  /// Sum of the frequencies of the site's lemmas
  fn sum_frequency_by_site(&self, site_id: SiteId) -> Result<u64, StorageError>;

  /// Number of lemma records of all sites
  fn count_all(&self) -> Result<usize, StorageError>;
}

/// Page ↔ lemma associations
pub trait IndexStore: Send + Sync {
  /// Creates or updates the `(page_id, lemma_id)` entry.
  ///
  /// Returns `true` when the entry did not exist before.
  fn upsert(&self, page_id: PageId, lemma_id: LemmaId, rank: f64) -> Result<bool, StorageError>;

  /// Entry of `(page_id, lemma_id)`
  fn find(&self, page_id: PageId, lemma_id: LemmaId) -> Result<Option<IndexEntry>, StorageError>;

  /// Entries of the lemma
  fn find_by_lemma(&self, lemma_id: LemmaId) -> Result<Vec<IndexEntry>, StorageError>;

  /// Entries of the page
  fn find_by_page(&self, page_id: PageId) -> Result<Vec<IndexEntry>, StorageError>;

  /// Entries of any of `lemma_ids`, restricted to lemmas of the site
  fn find_by_site_and_lemmas(
    &self,
    site_id: SiteId,
    lemma_ids: &[LemmaId],
  ) -> Result<Vec<IndexEntry>, StorageError>;

  /// Deletes the `(page_id, lemma_id)` entry. Returns whether it existed.
  fn remove(&self, page_id: PageId, lemma_id: LemmaId) -> Result<bool, StorageError>;
}

/// Cloneable bundle of the four stores.
#[derive(Clone)]
pub struct Storage {
  /// Site records
  pub sites: Arc<dyn SiteStore>,
  /// Page records
  pub pages: Arc<dyn PageStore>,
  /// Lemma records
  pub lemmas: Arc<dyn LemmaStore>,
  /// Index entries
  pub index: Arc<dyn IndexStore>,
}

impl Storage {
  /// Bundle backed by one backend implementing every store.
  pub fn from_backend<B>(backend: Arc<B>) -> Self
  where
    B: SiteStore + PageStore + LemmaStore + IndexStore + 'static,
  {
    Self {
      sites: backend.clone(),
      pages: backend.clone(),
      lemmas: backend.clone(),
      index: backend,
    }
  }

  /// Fresh in-memory bundle.
  pub fn in_memory() -> Self {
    Self::from_backend(Arc::new(MemoryStore::new()))
  }
}

impl std::fmt::Debug for Storage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Storage").finish_non_exhaustive()
  }
}
