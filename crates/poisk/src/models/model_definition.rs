//! Data Model Definition
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Site identifier
pub type SiteId = u64;

/// Page identifier
pub type PageId = u64;

/// Lemma identifier
pub type LemmaId = u64;

/// Indexing status of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
  /// A crawl of the site is in progress
  Indexing,
  /// The last crawl finished without a fatal error
  Indexed,
  /// The last crawl failed or was stopped
  Failed,
}

impl SiteStatus {
  /// Uppercase status name
  pub fn as_str(&self) -> &'static str {
    match self {
      SiteStatus::Indexing => "INDEXING",
      SiteStatus::Indexed => "INDEXED",
      SiteStatus::Failed => "FAILED",
    }
  }
}

impl std::fmt::Display for SiteStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Crawled site. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
  /// Identifier
  pub id: SiteId,

  /// Root URL as configured
  pub url: String,

  /// Human readable name
  pub name: String,

  /// Current status
  pub status: SiteStatus,

  /// Last status change or page write (heartbeat)
  pub status_time: DateTime<Utc>,

  /// Message of the last failure
  pub last_error: Option<String>,
}

/// Persisted page. `(site_id, path)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
  /// Identifier
  pub id: PageId,

  /// Owning site
  pub site_id: SiteId,

  /// Absolute URL without fragment and query
  pub path: String,

  /// HTTP status code of the last fetch
  pub code: u16,

  /// Raw HTML (empty for placeholders)
  pub content: String,
}

impl Page {
  /// True when the page was fetched without an error status
  pub fn is_successful(&self) -> bool {
    self.code < 400
  }
}

/// Per-site normalized term. `(site_id, lemma)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lemma {
  /// Identifier
  pub id: LemmaId,

  /// Owning site
  pub site_id: SiteId,

  /// Normalized term
  pub lemma: String,

  /// Number of distinct pages of the site containing the term
  pub frequency: u32,
}

/// Page to lemma association. `(page_id, lemma_id)` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
  /// Page
  pub page_id: PageId,

  /// Lemma
  pub lemma_id: LemmaId,

  /// Weighted occurrence count, never negative
  pub rank: f64,
}

// ─── Outward responses ───────────────────────────────────────────────────────

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
  /// Site URL
  pub site: String,

  /// Site name
  pub site_name: String,

  /// Page path
  pub uri: String,

  /// Page title
  pub title: String,

  /// Excerpt with `<b>` highlighted matches
  pub snippet: String,

  /// Relative relevance in [0, 1]
  pub relevance: f64,
}

/// Result of a search call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
  /// Success flag
  pub result: bool,

  /// Total number of hits before pagination
  pub count: usize,

  /// Requested page of hits
  pub data: Vec<SearchItem>,

  /// Failure message
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl SearchResponse {
  /// Successful response
  pub fn success(count: usize, data: Vec<SearchItem>) -> Self {
    Self {
      result: true,
      count,
      data,
      error: None,
    }
  }

  /// Successful response without hits
  pub fn empty() -> Self {
    Self::success(0, Vec::new())
  }

  /// Structured failure
  pub fn failure(message: impl Into<String>) -> Self {
    Self {
      result: false,
      count: 0,
      data: Vec::new(),
      error: Some(message.into()),
    }
  }
}

/// Result of a control call (start / stop / index page)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
  /// Success flag
  pub result: bool,

  /// Failure message
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl ControlResponse {
  /// Successful response
  pub fn ok() -> Self {
    Self {
      result: true,
      error: None,
    }
  }

  /// Structured failure
  pub fn failure(message: impl Into<String>) -> Self {
    Self {
      result: false,
      error: Some(message.into()),
    }
  }
}
