// crates/poisk/src/config.rs

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::errors::ConfigError;
use crate::morphology::Script;

/// Supported languages of the morphological dictionaries.
///
/// Each language is bound to exactly one script; words written in another
/// script are never sent to that dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  /// Russian (Cyrillic script)
  Ru,
  /// English (Latin script)
  En,
}

impl Language {
  /// Returns the language code.
  ///
  /// # Examples
  /// - `Language::Ru` → `"ru"`
  /// - `Language::En` → `"en"`
  pub fn code(&self) -> &'static str {
    match self {
      Language::Ru => "ru",
      Language::En => "en",
    }
  }

  /// Returns the script the language is written in.
  pub fn script(&self) -> Script {
    match self {
      Language::Ru => Script::Cyrillic,
      Language::En => Script::Latin,
    }
  }
}

impl std::fmt::Display for Language {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.code())
  }
}

/// Top-level configuration for poisk.
#[derive(Debug, Clone, Deserialize)]
pub struct PoiskConfig {
  /// [[sites]] entries (at least one)
  pub sites: Vec<SiteConfig>,
  /// [crawler] section
  #[serde(default)]
  pub crawler: CrawlerConfig,
  /// [lemmatizer] section
  #[serde(default)]
  pub lemmatizer: LemmatizerConfig,
  /// [indexer] section
  #[serde(default)]
  pub indexer: IndexerConfig,
  /// [search] section
  #[serde(default)]
  pub search: SearchConfig,
  /// [logging] section
  #[serde(default)]
  pub logging: LoggingConfig,
}

/// One [[sites]] entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteConfig {
  /// Root URL of the site; also the site identity
  pub url: String,
  /// Human readable name
  pub name: String,
}

/// [crawler] section configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
  /// User-Agent header sent with every request
  pub user_agent: String,
  /// Referer header sent with every request
  pub referrer: String,
  /// Connection timeout (milliseconds)
  pub connect_timeout_ms: u64,
  /// Whole request timeout (milliseconds)
  pub request_timeout_ms: u64,
  /// Timeout of the content-type probe (milliseconds)
  pub probe_timeout_ms: u64,
  /// Delay before each fetch (milliseconds)
  pub politeness_delay_ms: u64,
  /// Number of fetches in flight across all sites of one run
  pub max_concurrency: usize,
  /// Maximum number of redirects followed per request
  pub max_redirects: usize,
  /// Whether to send the content-type probe before fetching
  pub probe_content_type: bool,
}

impl Default for CrawlerConfig {
  fn default() -> Self {
    Self {
      user_agent: "PoiskSearchBot".to_string(),
      referrer: "http://www.google.com".to_string(),
      connect_timeout_ms: 10_000,
      request_timeout_ms: 10_000,
      probe_timeout_ms: 3_000,
      politeness_delay_ms: 1_500,
      max_concurrency: 16,
      max_redirects: 10,
      probe_content_type: true,
    }
  }
}

impl CrawlerConfig {
  /// Connection timeout as a `Duration`.
  pub fn connect_timeout(&self) -> Duration {
    Duration::from_millis(self.connect_timeout_ms)
  }

  /// Request timeout as a `Duration`.
  pub fn request_timeout(&self) -> Duration {
    Duration::from_millis(self.request_timeout_ms)
  }

  /// Probe timeout as a `Duration`.
  pub fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.probe_timeout_ms)
  }

  /// Politeness delay as a `Duration`.
  pub fn politeness_delay(&self) -> Duration {
    Duration::from_millis(self.politeness_delay_ms)
  }
}

/// HTML to plain text extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextExtractor {
  /// Regular-expression based stripping
  #[default]
  Regex,
  /// DOM walk with `scraper`, falling back to `Regex` when there is no body
  Structured,
}

/// [lemmatizer] section configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LemmatizerConfig {
  /// Languages whose dictionaries are loaded
  pub languages: Vec<Language>,
  /// HTML extraction strategy for index regions and snippets
  pub text_extractor: TextExtractor,
}

impl Default for LemmatizerConfig {
  fn default() -> Self {
    Self {
      languages: vec![Language::Ru, Language::En],
      text_extractor: TextExtractor::Regex,
    }
  }
}

/// [indexer] section configuration: rank weight table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
  /// Weight of an occurrence inside `<title>`
  pub title_weight: f64,
  /// Weight of an occurrence inside `<h1>`..`<h6>`
  pub heading_weight: f64,
  /// Weight of an occurrence anywhere else
  pub body_weight: f64,
}

impl Default for IndexerConfig {
  fn default() -> Self {
    Self {
      title_weight: 2.0,
      heading_weight: 1.5,
      body_weight: 1.0,
    }
  }
}

/// [search] section configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  /// Default search result limit
  pub default_limit: usize,
  /// Maximum search result limit
  pub max_limit: usize,
  /// Lemmas present on at least this share of a site's pages are ignored
  pub too_frequent_threshold: f64,
  /// Characters kept on each side of the first match in a snippet
  pub snippet_radius: usize,
  /// Length of the excerpt used when the text has no match
  pub fallback_excerpt_length: usize,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      default_limit: 20,
      max_limit: 100,
      too_frequent_threshold: 0.8,
      snippet_radius: 150,
      fallback_excerpt_length: 200,
    }
  }
}

/// [logging] section configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Log level: "trace" | "debug" | "info" | "warn" | "error"
  pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  /// trace
  Trace,

  /// debug
  Debug,

  /// info
  #[default]
  Info,

  /// warn
  Warn,

  ///error
  Error,
}

impl LogLevel {
  /// Returns the directive understood by `tracing_subscriber::EnvFilter`.
  pub fn as_str(&self) -> &'static str {
    match self {
      LogLevel::Trace => "trace",
      LogLevel::Debug => "debug",
      LogLevel::Info => "info",
      LogLevel::Warn => "warn",
      LogLevel::Error => "error",
    }
  }
}

// ===== Loading =====

impl PoiskConfig {
  /// Parses a configuration from TOML text.
  ///
  /// # Errors
  /// `ConfigError::Parse` when the text is not valid TOML or does not match the schema.
  pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::Parse {
      reason: e.to_string(),
    })
  }

  /// Reads and parses a configuration file.
  ///
  /// The result is not validated; call [`PoiskConfig::validate`] afterwards.
  ///
  /// # Errors
  /// `ConfigError::Read` when the file cannot be read, `ConfigError::Parse` otherwise.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.to_path_buf(),
      source: Arc::new(e),
    })?;
    Self::from_toml_str(&text)
  }
}

// ===== Accessor Methods =====

impl PoiskConfig {
  /// Returns the configured sites.
  pub fn sites(&self) -> &[SiteConfig] {
    &self.sites
  }

  /// Returns the list of languages whose dictionaries are loaded.
  pub fn supported_languages(&self) -> &[Language] {
    &self.lemmatizer.languages
  }

  /// Returns the default search result limit.
  pub fn default_search_limit(&self) -> usize {
    self.search.default_limit
  }

  /// Returns the maximum search result limit.
  pub fn max_search_limit(&self) -> usize {
    self.search.max_limit
  }

  /// Returns the log level.
  pub fn log_level(&self) -> LogLevel {
    self.logging.level
  }

  /// Validates the configuration.
  ///
  /// # Validation Items
  /// - `sites` is not empty
  /// - every site URL is an absolute http(s) URL with a host, and unique
  /// - every site name is not blank
  /// - `lemmatizer.languages` is not empty
  /// - `crawler.max_concurrency` >= 1 and all crawler timeouts > 0
  /// - `search.default_limit` >= 1
  /// - `search.max_limit` >= `search.default_limit`
  /// - `search.too_frequent_threshold` within (0, 1]
  /// - indexer weights are not negative
  /// - title and heading weights are greater than the body weight
  ///
  /// # Errors
  /// Returns the first failing `ConfigError`.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.sites.is_empty() {
      return Err(ConfigError::NoSites);
    }

    let mut seen = HashSet::new();
    for site in &self.sites {
      validate_site_url(&site.url)?;
      if !seen.insert(site.url.trim_end_matches('/')) {
        return Err(ConfigError::DuplicateSiteUrl {
          url: site.url.clone(),
        });
      }
      if site.name.trim().is_empty() {
        return Err(ConfigError::EmptySiteName {
          url: site.url.clone(),
        });
      }
    }

    if self.lemmatizer.languages.is_empty() {
      return Err(ConfigError::EmptyLanguages);
    }

    if self.crawler.max_concurrency < 1 {
      return Err(ConfigError::InvalidMaxConcurrency {
        actual: self.crawler.max_concurrency,
      });
    }

    let timeouts = [
      ("connect_timeout_ms", self.crawler.connect_timeout_ms),
      ("request_timeout_ms", self.crawler.request_timeout_ms),
      ("probe_timeout_ms", self.crawler.probe_timeout_ms),
    ];
    if let Some((field, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
      return Err(ConfigError::InvalidTimeout { field });
    }

    if self.search.default_limit < 1 {
      return Err(ConfigError::InvalidSearchDefaultLimit {
        actual: self.search.default_limit,
      });
    }

    if self.search.max_limit < self.search.default_limit {
      return Err(ConfigError::InvalidSearchMaxLimit {
        default_limit: self.search.default_limit,
        max_limit: self.search.max_limit,
      });
    }

    let threshold = self.search.too_frequent_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
      return Err(ConfigError::InvalidTooFrequentThreshold { actual: threshold });
    }

    let weights = self.indexer;
    for (field, value) in [
      ("title_weight", weights.title_weight),
      ("heading_weight", weights.heading_weight),
      ("body_weight", weights.body_weight),
    ] {
      if value.is_nan() || value < 0.0 {
        return Err(ConfigError::NegativeWeight {
          field,
          actual: value,
        });
      }
    }
    for (field, weight) in [
      ("title_weight", weights.title_weight),
      ("heading_weight", weights.heading_weight),
    ] {
      if weight <= weights.body_weight {
        return Err(ConfigError::WeightNotAboveBody {
          field,
          weight,
          body_weight: weights.body_weight,
        });
      }
    }

    Ok(())
  }
}

fn validate_site_url(raw: &str) -> Result<(), ConfigError> {
  let invalid = |reason: &str| ConfigError::InvalidSiteUrl {
    url: raw.to_string(),
    reason: reason.to_string(),
  };
  let parsed = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
  if !matches!(parsed.scheme(), "http" | "https") {
    return Err(invalid("scheme must be http or https"));
  }
  if parsed.host_str().is_none_or(str::is_empty) {
    return Err(invalid("url has no host"));
  }
  Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Test Module
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  // ─── Test Helpers ─────────────────────────────────────────────────────

  /// Creates a base valid configuration
  fn create_valid_config() -> PoiskConfig {
    PoiskConfig {
      sites: vec![
        SiteConfig {
          url: "https://www.playback.ru".to_string(),
          name: "PlayBack.Ru".to_string(),
        },
        SiteConfig {
          url: "https://volochek.life".to_string(),
          name: "Volochek".to_string(),
        },
      ],
      crawler: CrawlerConfig::default(),
      lemmatizer: LemmatizerConfig::default(),
      indexer: IndexerConfig::default(),
      search: SearchConfig::default(),
      logging: LoggingConfig::default(),
    }
  }

  // ─── Language Tests ────────────────────────────────────────────────────

  #[test]
  fn language_code_returns_correct_value() {
    assert_eq!(Language::Ru.code(), "ru");
    assert_eq!(Language::En.code(), "en");
  }

  #[test]
  fn language_script_mapping() {
    assert_eq!(Language::Ru.script(), Script::Cyrillic);
    assert_eq!(Language::En.script(), Script::Latin);
  }

  #[test]
  fn language_display() {
    assert_eq!(format!("{}", Language::Ru), "ru");
    assert_eq!(format!("{}", Language::En), "en");
  }

  // ─── Loading Tests ─────────────────────────────────────────────────────

  #[test]
  fn from_toml_str_applies_section_defaults() {
    let config = PoiskConfig::from_toml_str(
      r#"
        [[sites]]
        url = "https://www.playback.ru"
        name = "PlayBack.Ru"
      "#,
    )
    .unwrap();

    assert_eq!(config.sites.len(), 1);
    assert_eq!(config.crawler.user_agent, "PoiskSearchBot");
    assert_eq!(config.crawler.referrer, "http://www.google.com");
    assert_eq!(config.crawler.politeness_delay(), Duration::from_millis(1_500));
    assert_eq!(config.lemmatizer.languages, vec![Language::Ru, Language::En]);
    assert_eq!(config.lemmatizer.text_extractor, TextExtractor::Regex);
    assert_eq!(config.indexer, IndexerConfig::default());
    assert_eq!(config.default_search_limit(), 20);
    assert_eq!(config.max_search_limit(), 100);
    assert_eq!(config.log_level(), LogLevel::Info);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn from_toml_str_reads_overrides() {
    let config = PoiskConfig::from_toml_str(
      r#"
        [[sites]]
        url = "https://volochek.life"
        name = "Volochek"

        [crawler]
        max_concurrency = 4
        politeness_delay_ms = 0

        [lemmatizer]
        languages = ["ru"]
        text_extractor = "structured"

        [indexer]
        title_weight = 3.0

        [search]
        too_frequent_threshold = 0.5

        [logging]
        level = "debug"
      "#,
    )
    .unwrap();

    assert_eq!(config.crawler.max_concurrency, 4);
    assert_eq!(config.crawler.politeness_delay(), Duration::ZERO);
    // unspecified fields of a present section keep their defaults
    assert_eq!(config.crawler.max_redirects, 10);
    assert_eq!(config.supported_languages(), &[Language::Ru]);
    assert_eq!(config.lemmatizer.text_extractor, TextExtractor::Structured);
    assert_eq!(config.indexer.title_weight, 3.0);
    assert_eq!(config.indexer.heading_weight, 1.5);
    assert_eq!(config.search.too_frequent_threshold, 0.5);
    assert_eq!(config.log_level(), LogLevel::Debug);
  }

  #[test]
  fn from_toml_str_rejects_missing_sites() {
    let err = PoiskConfig::from_toml_str("[crawler]\nmax_concurrency = 2\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
  }

  #[test]
  fn from_toml_str_rejects_unknown_language() {
    let err = PoiskConfig::from_toml_str(
      r#"
        [[sites]]
        url = "https://volochek.life"
        name = "Volochek"

        [lemmatizer]
        languages = ["de"]
      "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
  }

  #[test]
  fn from_file_reads_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("poisk.toml");
    fs::write(
      &path,
      "[[sites]]\nurl = \"https://www.playback.ru\"\nname = \"PlayBack.Ru\"\n",
    )
    .unwrap();

    let config = PoiskConfig::from_file(&path).unwrap();
    assert_eq!(config.sites()[0].name, "PlayBack.Ru");
  }

  #[test]
  fn from_file_reports_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let err = PoiskConfig::from_file(&path).unwrap_err();
    match err {
      ConfigError::Read { path: reported, .. } => assert_eq!(reported, path),
      _ => panic!("expected Read error"),
    }
  }

  // ─── validate() Normal Case Tests ────────────────────────────────────────────

  #[test]
  fn validate_accepts_valid_config() {
    let config = create_valid_config();

    let result = config.validate();
    assert!(result.is_ok(), "valid config should pass validation");
  }

  #[test]
  fn validate_accepts_default_limit_equals_max_limit() {
    let mut config = create_valid_config();
    config.search.default_limit = 50;
    config.search.max_limit = 50; // equal is ok

    assert!(config.validate().is_ok());
  }

  #[test]
  fn validate_accepts_threshold_of_one() {
    let mut config = create_valid_config();
    config.search.too_frequent_threshold = 1.0;

    assert!(config.validate().is_ok());
  }

  // ─── validate() sites Abnormal Cases ───────────────────────────────────────────

  #[test]
  fn validate_rejects_empty_sites() {
    let mut config = create_valid_config();
    config.sites.clear();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NoSites));
  }

  #[test]
  fn validate_rejects_relative_site_url() {
    let mut config = create_valid_config();
    config.sites[0].url = "playback.ru".to_string();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSiteUrl { .. }));
  }

  #[test]
  fn validate_rejects_non_http_site_url() {
    let mut config = create_valid_config();
    config.sites[0].url = "ftp://playback.ru".to_string();

    let err = config.validate().unwrap_err();
    match err {
      ConfigError::InvalidSiteUrl { url, .. } => assert_eq!(url, "ftp://playback.ru"),
      _ => panic!("expected InvalidSiteUrl error"),
    }
  }

  #[test]
  fn validate_rejects_duplicate_site_url() {
    let mut config = create_valid_config();
    config.sites[1].url = "https://www.playback.ru/".to_string();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateSiteUrl { .. }));
  }

  #[test]
  fn validate_rejects_blank_site_name() {
    let mut config = create_valid_config();
    config.sites[1].name = "  ".to_string();

    let err = config.validate().unwrap_err();
    match err {
      ConfigError::EmptySiteName { url } => assert_eq!(url, "https://volochek.life"),
      _ => panic!("expected EmptySiteName error"),
    }
  }

  // ─── validate() lemmatizer / crawler Abnormal Cases ───────────────────────────

  #[test]
  fn validate_rejects_empty_languages() {
    let mut config = create_valid_config();
    config.lemmatizer.languages.clear();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::EmptyLanguages));
  }

  #[test]
  fn validate_rejects_zero_concurrency() {
    let mut config = create_valid_config();
    config.crawler.max_concurrency = 0;

    let err = config.validate().unwrap_err();
    assert!(matches!(
      err,
      ConfigError::InvalidMaxConcurrency { actual: 0 }
    ));
  }

  #[test]
  fn validate_rejects_zero_timeout() {
    let mut config = create_valid_config();
    config.crawler.request_timeout_ms = 0;

    let err = config.validate().unwrap_err();
    match err {
      ConfigError::InvalidTimeout { field } => assert_eq!(field, "request_timeout_ms"),
      _ => panic!("expected InvalidTimeout error"),
    }
  }

  // ─── validate() search Abnormal Cases ──────────────────────────────────────────────

  #[test]
  fn validate_rejects_default_limit_zero() {
    let mut config = create_valid_config();
    config.search.default_limit = 0;

    let err = config.validate().unwrap_err();
    match err {
      ConfigError::InvalidSearchDefaultLimit { actual } => {
        assert_eq!(actual, 0);
      }
      _ => panic!("expected InvalidSearchDefaultLimit error"),
    }
  }

  #[test]
  fn validate_rejects_max_limit_less_than_default() {
    let mut config = create_valid_config();
    config.search.default_limit = 50;
    config.search.max_limit = 10; // less than default

    let err = config.validate().unwrap_err();
    match err {
      ConfigError::InvalidSearchMaxLimit {
        default_limit,
        max_limit,
      } => {
        assert_eq!(default_limit, 50);
        assert_eq!(max_limit, 10);
      }
      _ => panic!("expected InvalidSearchMaxLimit error"),
    }
  }

  #[test]
  fn validate_rejects_threshold_out_of_range() {
    for bad in [0.0, -0.1, 1.5] {
      let mut config = create_valid_config();
      config.search.too_frequent_threshold = bad;

      let err = config.validate().unwrap_err();
      assert!(
        matches!(err, ConfigError::InvalidTooFrequentThreshold { .. }),
        "threshold {bad} should be rejected"
      );
    }
  }

  // ─── validate() indexer Abnormal Cases ───────────────────────────────────────────

  #[test]
  fn validate_rejects_negative_weight() {
    let mut config = create_valid_config();
    config.indexer.body_weight = -1.0;

    let err = config.validate().unwrap_err();
    match err {
      ConfigError::NegativeWeight { field, actual } => {
        assert_eq!(field, "body_weight");
        assert_eq!(actual, -1.0);
      }
      _ => panic!("expected NegativeWeight error"),
    }
  }

  #[test]
  fn validate_rejects_heading_weight_not_above_body() {
    let mut config = create_valid_config();
    config.indexer.heading_weight = 1.0;

    let err = config.validate().unwrap_err();
    match err {
      ConfigError::WeightNotAboveBody { field, .. } => assert_eq!(field, "heading_weight"),
      _ => panic!("expected WeightNotAboveBody error"),
    }
  }

  // ─── Error Priority Tests ────────────────────────────────────────────────

  #[test]
  fn validate_with_multiple_errors_reports_first() {
    let mut config = create_valid_config();

    // Set multiple error conditions
    config.sites.clear(); // NoSites
    config.lemmatizer.languages.clear(); // EmptyLanguages
    config.search.default_limit = 0; // InvalidSearchDefaultLimit

    let err = config.validate().unwrap_err();
    // Fails at the first check
    assert!(matches!(err, ConfigError::NoSites));
  }

  #[test]
  fn log_level_as_str_matches_env_filter_directives() {
    assert_eq!(LogLevel::Trace.as_str(), "trace");
    assert_eq!(LogLevel::Warn.as_str(), "warn");
    assert_eq!(LogLevel::Error.as_str(), "error");
  }
}
