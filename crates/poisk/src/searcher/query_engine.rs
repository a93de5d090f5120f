//! Ranked lemma search over the inverted index.
//!
//! Per site, query lemmas that occur on too large a share of the site's pages
//! are dropped, the rest are intersected rarest first and every surviving page
//! scores the sum of its ranks. Scores are then made relative to the best page
//! across all searched sites.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{SearchConfig, TextExtractor};
use crate::errors::SearcherError;
use crate::lemmatizer::{Lemmatizer, extract_text};
use crate::models::{Lemma, PageId, SearchItem, SearchResponse, Site};
use crate::searcher::snippet::{build_snippet, page_title};
use crate::storage::Storage;

/// Page of a site with its absolute relevance
#[derive(Debug, Clone, Copy)]
struct Hit {
  page_id: PageId,
  absolute: f64,
}

/// Read-only search over the stores.
pub struct SearchEngine {
  storage: Storage,
  lemmatizer: Arc<Lemmatizer>,
  settings: SearchConfig,
  extractor: TextExtractor,
}

impl SearchEngine {
  /// Creates a search engine
  pub fn new(
    storage: Storage,
    lemmatizer: Arc<Lemmatizer>,
    settings: SearchConfig,
    extractor: TextExtractor,
  ) -> Self {
    Self {
      storage,
      lemmatizer,
      settings,
      extractor,
    }
  }

  /// Searches `query` in `site` (every site when `None`).
  ///
  /// Never fails: errors become a [`SearchResponse`] with `result = false`.
  pub fn search(&self, query: &str, site: Option<&str>, offset: usize, limit: usize) -> SearchResponse {
    match self.try_search(query, site, offset, limit) {
      Ok((total, items)) => SearchResponse::success(total, items),
      Err(err) => {
        warn!(query, site, error = %err, "search failed");
        SearchResponse::failure(err.to_string())
      }
    }
  }

  /// Total hit count and the requested page of hits.
  fn try_search(
    &self,
    query: &str,
    site: Option<&str>,
    offset: usize,
    limit: usize,
  ) -> Result<(usize, Vec<SearchItem>), SearcherError> {
    let mut query_lemmas: Vec<String> = self.lemmatizer.unique_lemmas(query).into_iter().collect();
    if query_lemmas.is_empty() {
      return Ok((0, Vec::new()));
    }
    query_lemmas.sort();

    let sites = self.target_sites(site)?;
    let mut scored: Vec<(Site, Hit)> = Vec::new();
    for site in sites {
      let hits = self.search_site(&site, &query_lemmas)?;
      debug!(site = %site.url, hits = hits.len(), "site searched");
      scored.extend(hits.into_iter().map(|hit| (site.clone(), hit)));
    }

    let max_absolute = scored.iter().map(|(_, hit)| hit.absolute).fold(0.0_f64, f64::max);
    let mut ranked = Vec::with_capacity(scored.len());
    for (site, hit) in scored {
      let Some(page) = self.storage.pages.find_by_id(hit.page_id)? else {
        continue;
      };
      let relevance = if max_absolute > 0.0 {
        hit.absolute / max_absolute
      } else {
        0.0
      };
      ranked.push((site, page, relevance));
    }
    ranked.sort_by(|(a_site, a_page, a_rel), (b_site, b_page, b_rel)| {
      b_rel
        .partial_cmp(a_rel)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_site.url.cmp(&b_site.url))
        .then_with(|| a_page.path.cmp(&b_page.path))
    });

    let total = ranked.len();
    let start = offset.min(total);
    let terms: HashSet<&str> = query_lemmas.iter().map(String::as_str).collect();
    let items = ranked
      .into_iter()
      .skip(start)
      .take(limit)
      .map(|(site, page, relevance)| SearchItem {
        title: page_title(&page.content),
        snippet: self.snippet(&page.content, &terms),
        site: site.url,
        site_name: site.name,
        uri: page.path,
        relevance,
      })
      .collect();
    Ok((total, items))
  }

  /// The named site, or every site when `site` is `None` or blank.
  fn target_sites(&self, site: Option<&str>) -> Result<Vec<Site>, SearcherError> {
    let Some(url) = site.map(str::trim).filter(|url| !url.is_empty()) else {
      return Ok(self.storage.sites.list_all()?);
    };
    let trimmed = url.trim_end_matches('/');
    for candidate in [url.to_string(), trimmed.to_string(), format!("{trimmed}/")] {
      if let Some(found) = self.storage.sites.find_by_url(&candidate)? {
        return Ok(vec![found]);
      }
    }
    Err(SearcherError::SiteNotFound {
      url: url.to_string(),
    })
  }

  /// Pages of `site` holding every kept query lemma, with absolute relevance.
  fn search_site(&self, site: &Site, query_lemmas: &[String]) -> Result<Vec<Hit>, SearcherError> {
    let total_pages = self.storage.pages.count_by_site(site.id)?;
    if total_pages == 0 {
      return Ok(Vec::new());
    }

    let mut lemmas: Vec<Lemma> = Vec::with_capacity(query_lemmas.len());
    for text in query_lemmas {
      let Some(lemma) = self.storage.lemmas.find(site.id, text)? else {
        continue;
      };
      let ratio = f64::from(lemma.frequency) / total_pages as f64;
      if ratio < self.settings.too_frequent_threshold {
        lemmas.push(lemma);
      } else {
        debug!(site = %site.url, lemma = %lemma.lemma, ratio, "lemma too frequent, ignored");
      }
    }
    if lemmas.is_empty() {
      return Ok(Vec::new());
    }
    lemmas.sort_by(|a, b| a.frequency.cmp(&b.frequency).then_with(|| a.lemma.cmp(&b.lemma)));

    // page -> rank sum over the lemmas intersected so far
    let mut candidates: Option<HashMap<PageId, f64>> = None;
    for lemma in &lemmas {
      let entries = self.storage.index.find_by_lemma(lemma.id)?;
      let next: HashMap<PageId, f64> = match candidates.take() {
        None => entries.into_iter().map(|entry| (entry.page_id, entry.rank)).collect(),
        Some(current) => {
          let ranks: HashMap<PageId, f64> =
            entries.into_iter().map(|entry| (entry.page_id, entry.rank)).collect();
          current
            .into_iter()
            .filter_map(|(page_id, sum)| ranks.get(&page_id).map(|rank| (page_id, sum + rank)))
            .collect()
        }
      };
      if next.is_empty() {
        return Ok(Vec::new());
      }
      candidates = Some(next);
    }

    Ok(
      candidates
        .unwrap_or_default()
        .into_iter()
        .map(|(page_id, absolute)| Hit { page_id, absolute })
        .collect(),
    )
  }

  /// Excerpt of the page text highlighting words that share a lemma with the query.
  fn snippet(&self, html: &str, terms: &HashSet<&str>) -> String {
    let text = extract_text(html, self.extractor);
    let mut verdicts: HashMap<String, bool> = HashMap::new();
    build_snippet(
      &text,
      |word| {
        *verdicts.entry(word.to_string()).or_insert_with(|| {
          self
            .lemmatizer
            .lemma_of(word)
            .is_some_and(|lemma| terms.contains(lemma.as_str()))
        })
      },
      self.settings.snippet_radius,
      self.settings.fallback_excerpt_length,
    )
  }
}
