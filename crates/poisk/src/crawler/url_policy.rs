//! URL exclusion, normalization and host comparison.

use url::Url;

/// Extensions of resources that are never fetched.
pub const EXCLUDED_EXTENSIONS: [&str; 29] = [
  ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".svg", ".ico", ".pdf", ".doc", ".docx",
  ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".7z", ".tar", ".gz", ".mp3", ".mp4", ".avi",
  ".mov", ".wmv", ".css", ".js", ".json", ".xml",
];

/// Cheap exclusion check done before any network access.
pub fn is_excluded(url: &str) -> bool {
  let url = url.trim();
  if url.is_empty() || url.contains('#') {
    return true;
  }
  let lowered = url.to_lowercase();
  if lowered.starts_with("mailto:") || lowered.starts_with("tel:") {
    return true;
  }
  EXCLUDED_EXTENSIONS
    .iter()
    .any(|extension| lowered.ends_with(extension))
}

/// Strips fragment and query and trims whitespace.
pub fn normalize_url(url: &str) -> String {
  let url = url.trim();
  let end = url.find(['#', '?']).unwrap_or(url.len());
  url[..end].trim().to_string()
}

/// Resolves `href` against `base` into a normalized absolute http(s) URL.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
  let href = href.trim();
  if href.is_empty() {
    return None;
  }
  let mut resolved = base.join(href).ok()?;
  if !matches!(resolved.scheme(), "http" | "https") {
    return None;
  }
  resolved.set_fragment(None);
  resolved.set_query(None);
  Some(resolved.to_string())
}

/// Host of `url` without a leading `www.`, lowercase.
pub fn host_key(url: &str) -> Option<String> {
  let parsed = Url::parse(url.trim()).ok()?;
  let host = parsed.host_str()?.to_lowercase();
  Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Whether both URLs point to the same host, ignoring a leading `www.`.
pub fn is_same_host(url: &str, root: &str) -> bool {
  match (host_key(url), host_key(root)) {
    (Some(a), Some(b)) => a == b,
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn excludes_documents_media_and_fragments() {
    assert!(is_excluded(""));
    assert!(is_excluded("https://a.ru/report.PDF"));
    assert!(is_excluded("https://a.ru/photo.jpg"));
    assert!(is_excluded("https://a.ru/sitemap.xml"));
    assert!(is_excluded("https://a.ru/page#top"));
    assert!(is_excluded("mailto:info@a.ru"));
    assert!(is_excluded("tel:+7000"));
    assert!(!is_excluded("https://a.ru/catalog/phones"));
    assert!(!is_excluded("https://a.ru/"));
  }

  #[test]
  fn normalize_strips_query_and_fragment() {
    assert_eq!(normalize_url(" https://a.ru/x?id=1#top "), "https://a.ru/x");
    assert_eq!(normalize_url("https://a.ru/x#top?id=1"), "https://a.ru/x");
    assert_eq!(normalize_url("https://a.ru/x"), "https://a.ru/x");
  }

  #[test]
  fn resolve_link_makes_absolute_urls() {
    let base = Url::parse("https://a.ru/catalog/").unwrap();
    assert_eq!(
      resolve_link(&base, "phones?page=2#list").as_deref(),
      Some("https://a.ru/catalog/phones")
    );
    assert_eq!(
      resolve_link(&base, "/about").as_deref(),
      Some("https://a.ru/about")
    );
    assert_eq!(resolve_link(&base, "mailto:info@a.ru"), None);
    assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
    assert_eq!(resolve_link(&base, "  "), None);
  }

  #[test]
  fn same_host_ignores_www_prefix() {
    assert!(is_same_host("https://www.playback.ru/x", "https://playback.ru"));
    assert!(is_same_host("http://playback.ru/", "https://WWW.playback.ru/"));
    assert!(!is_same_host("https://shop.playback.ru/", "https://playback.ru"));
    assert!(!is_same_host("not a url", "https://playback.ru"));
  }
}
