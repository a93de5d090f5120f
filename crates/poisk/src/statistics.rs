//! Index statistics: corpus totals and per-site detail.

use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::models::{Site, SiteStatus};
use crate::storage::Storage;

/// Corpus totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalStatistics {
  /// Number of sites
  pub sites: usize,
  /// Number of stored pages, placeholders included
  pub pages: usize,
  /// Number of lemma records
  pub lemmas: usize,
  /// True while a run is active or any site is INDEXING
  pub indexing: bool,
}

/// State of one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStatisticsItem {
  /// Site URL
  pub url: String,
  /// Site name
  pub name: String,
  /// Current status
  pub status: SiteStatus,
  /// Last status change in epoch milliseconds
  pub status_time: i64,
  /// Last error, empty when none
  pub error: String,
  /// Pages answering below 400
  pub pages: usize,
  /// Lemma records of the site
  pub lemmas: usize,
}

/// Totals plus one item per site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsData {
  /// Corpus totals
  pub total: TotalStatistics,
  /// Sites ordered by id
  pub detailed: Vec<DetailedStatisticsItem>,
}

/// Result of a statistics call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsResponse {
  /// Success flag
  pub result: bool,

  /// Collected statistics, absent on failure
  #[serde(skip_serializing_if = "Option::is_none")]
  pub statistics: Option<StatisticsData>,

  /// Failure message
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl StatisticsResponse {
  /// Successful response
  pub fn success(statistics: StatisticsData) -> Self {
    Self {
      result: true,
      statistics: Some(statistics),
      error: None,
    }
  }

  /// Structured failure
  pub fn failure(message: impl Into<String>) -> Self {
    Self {
      result: false,
      statistics: None,
      error: Some(message.into()),
    }
  }
}

/// Reads totals and per-site detail from `storage`.
///
/// `running` is the orchestrator state; the indexing flag is also set when a
/// site is still INDEXING.
///
/// # Errors
/// `StorageError` from any store read.
pub fn collect_statistics(storage: &Storage, running: bool) -> Result<StatisticsData, StorageError> {
  let sites = storage.sites.list_all()?;
  let indexing = running || storage.sites.count_by_status(SiteStatus::Indexing)? > 0;
  let total = TotalStatistics {
    sites: sites.len(),
    pages: storage.pages.count_all()?,
    lemmas: storage.lemmas.count_all()?,
    indexing,
  };
  let detailed = sites
    .into_iter()
    .map(|site| site_detail(storage, site))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(StatisticsData { total, detailed })
}

fn site_detail(storage: &Storage, site: Site) -> Result<DetailedStatisticsItem, StorageError> {
  Ok(DetailedStatisticsItem {
    pages: storage.pages.count_successful_by_site(site.id)?,
    lemmas: storage.lemmas.count_by_site(site.id)?,
    status_time: site.status_time.timestamp_millis(),
    error: site.last_error.unwrap_or_default(),
    url: site.url,
    name: site.name,
    status: site.status,
  })
}
