//! HTTP fetch collaborator.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, REFERER};
use reqwest::redirect::Policy;
use tracing::debug;
use url::Url;

use crate::config::CrawlerConfig;
use crate::errors::FetchError;

/// Successful response of a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
  /// URL after redirects
  pub url: String,
  /// HTTP status code
  pub status: u16,
  /// `Content-Type` header
  pub content_type: Option<String>,
  /// Decoded body
  pub body: String,
}

/// Whether a `Content-Type` value denotes an HTML document.
pub fn is_html_content_type(content_type: &str) -> bool {
  let mime = content_type
    .split(';')
    .next()
    .unwrap_or_default()
    .trim()
    .to_ascii_lowercase();
  mime == "text/html" || mime == "application/xhtml+xml"
}

/// Fetches pages for the crawler.
#[async_trait]
pub trait Fetcher: Send + Sync {
  /// GETs `url`.
  ///
  /// # Errors
  /// - `FetchError::HttpStatus` for 4xx/5xx answers
  /// - `FetchError::NotHtml` when the content type is not HTML
  /// - transport errors otherwise
  async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;

  /// Reads the content type of `url` without downloading the body.
  ///
  /// # Errors
  /// Transport errors; callers treat them as "not excluded".
  async fn probe_content_type(&self, url: &str) -> Result<Option<String>, FetchError>;
}

// ─── reqwest ─────────────────────────────────────────────────────────────────

/// `reqwest` based fetcher sending the configured user agent and referrer.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  probe_timeout: Duration,
}

impl HttpFetcher {
  /// Builds the HTTP client from the [crawler] section.
  ///
  /// # Errors
  /// `FetchError::Client` when the referrer is not a valid header value or the
  /// client cannot be built.
  pub fn new(settings: &CrawlerConfig) -> Result<Self, FetchError> {
    let referrer = HeaderValue::from_str(&settings.referrer).map_err(|e| FetchError::Client {
      reason: format!("invalid referrer {:?}: {e}", settings.referrer),
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(REFERER, referrer);

    let client = reqwest::Client::builder()
      .user_agent(settings.user_agent.clone())
      .default_headers(headers)
      .connect_timeout(settings.connect_timeout())
      .timeout(settings.request_timeout())
      .redirect(Policy::limited(settings.max_redirects))
      .build()
      .map_err(|e| FetchError::Client {
        reason: e.to_string(),
      })?;

    Ok(Self {
      client,
      probe_timeout: settings.probe_timeout(),
    })
  }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
  if err.is_timeout() {
    FetchError::Timeout {
      url: url.to_string(),
    }
  } else if err.is_connect() {
    FetchError::Connect {
      url: url.to_string(),
      reason: err.to_string(),
    }
  } else {
    FetchError::Request {
      url: url.to_string(),
      reason: err.to_string(),
    }
  }
}

fn content_type_of(headers: &HeaderMap) -> Option<String> {
  headers
    .get(CONTENT_TYPE)
    .and_then(|value| value.to_str().ok())
    .map(str::to_string)
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| classify(url, e))?;

    let status = response.status();
    let final_url = response.url().to_string();
    let content_type = content_type_of(response.headers());
    debug!(url, status = status.as_u16(), content_type = ?content_type, "fetched");

    if !status.is_success() {
      return Err(FetchError::HttpStatus {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }
    if let Some(content_type) = content_type.as_deref()
      && !is_html_content_type(content_type)
    {
      return Err(FetchError::NotHtml {
        url: url.to_string(),
        content_type: content_type.to_string(),
      });
    }

    let body = response.text().await.map_err(|e| classify(url, e))?;
    Ok(FetchedPage {
      url: final_url,
      status: status.as_u16(),
      content_type,
      body,
    })
  }

  async fn probe_content_type(&self, url: &str) -> Result<Option<String>, FetchError> {
    let response = self
      .client
      .head(url)
      .timeout(self.probe_timeout)
      .send()
      .await
      .map_err(|e| classify(url, e))?;
    Ok(content_type_of(response.headers()))
  }
}

// ─── In-memory ───────────────────────────────────────────────────────────────

/// Canned response of a [`StaticFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticResponse {
  /// HTTP status code
  pub status: u16,
  /// `Content-Type` header
  pub content_type: Option<String>,
  /// Body
  pub body: String,
}

/// Fetcher serving a fixed URL → response map, recording every request.
///
/// Unknown URLs answer 404. Used for offline crawls and tests.
#[derive(Debug, Default)]
pub struct StaticFetcher {
  responses: HashMap<String, StaticResponse>,
  fetches: DashMap<String, usize>,
  probes: DashMap<String, usize>,
}

fn canonical(url: &str) -> String {
  Url::parse(url.trim())
    .map(|parsed| parsed.to_string())
    .unwrap_or_else(|_| url.trim().to_string())
}

impl StaticFetcher {
  /// Creates a fetcher without pages.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a 200 `text/html` page.
  #[must_use]
  pub fn with_page(self, url: &str, html: &str) -> Self {
    self.with_response(url, 200, Some("text/html; charset=utf-8"), html)
  }

  /// Adds an arbitrary response.
  #[must_use]
  pub fn with_response(
    mut self,
    url: &str,
    status: u16,
    content_type: Option<&str>,
    body: &str,
  ) -> Self {
    self.responses.insert(
      canonical(url),
      StaticResponse {
        status,
        content_type: content_type.map(str::to_string),
        body: body.to_string(),
      },
    );
    self
  }

  /// Number of GET requests made for `url`.
  pub fn fetch_count(&self, url: &str) -> usize {
    self.fetches.get(&canonical(url)).map_or(0, |count| *count)
  }

  /// Number of GET requests made in total.
  pub fn total_fetches(&self) -> usize {
    self.fetches.iter().map(|count| *count.value()).sum()
  }

  /// Number of probe requests made for `url`.
  pub fn probe_count(&self, url: &str) -> usize {
    self.probes.get(&canonical(url)).map_or(0, |count| *count)
  }
}

#[async_trait]
impl Fetcher for StaticFetcher {
  async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
    let key = canonical(url);
    *self.fetches.entry(key.clone()).or_insert(0) += 1;

    let Some(response) = self.responses.get(&key) else {
      return Err(FetchError::HttpStatus {
        url: url.to_string(),
        status: 404,
      });
    };
    if response.status >= 400 {
      return Err(FetchError::HttpStatus {
        url: url.to_string(),
        status: response.status,
      });
    }
    if let Some(content_type) = response.content_type.as_deref()
      && !is_html_content_type(content_type)
    {
      return Err(FetchError::NotHtml {
        url: url.to_string(),
        content_type: content_type.to_string(),
      });
    }
    Ok(FetchedPage {
      url: key,
      status: response.status,
      content_type: response.content_type.clone(),
      body: response.body.clone(),
    })
  }

  async fn probe_content_type(&self, url: &str) -> Result<Option<String>, FetchError> {
    let key = canonical(url);
    *self.probes.entry(key.clone()).or_insert(0) += 1;
    Ok(self
      .responses
      .get(&key)
      .and_then(|response| response.content_type.clone()))
  }
}
