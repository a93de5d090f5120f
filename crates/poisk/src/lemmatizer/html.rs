//! HTML to plain text reduction.
//!
//! [`clean_html`] is the regex based extractor and the fallback of
//! [`clean_html_structured`], which walks the DOM with `scraper`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::config::TextExtractor;

/// Elements whose text never reaches the plain text.
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "iframe", "object", "embed"];

const HEADING_ELEMENTS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Entities decoded by the regex extractor. `&amp;` comes last so that
/// `&amp;lt;` decodes to the literal `&lt;`.
const ENTITIES: [(&str, &str); 12] = [
  ("&nbsp;", " "),
  ("&quot;", "\""),
  ("&lt;", "<"),
  ("&gt;", ">"),
  ("&apos;", "'"),
  ("&#39;", "'"),
  ("&ndash;", "-"),
  ("&mdash;", "-"),
  ("&laquo;", "\""),
  ("&raquo;", "\""),
  ("&hellip;", "..."),
  ("&amp;", "&"),
];

// Patterns are literals; compilation cannot fail at runtime.
fn pattern(source: &str) -> Regex {
  Regex::new(source).expect("literal regex pattern")
}

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<script[^>]*>.*?</script\s*>"));
static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<style[^>]*>.*?</style\s*>"));
static COMMENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<!--.*?-->"));
static BLOCK_TAG: LazyLock<Regex> =
  LazyLock::new(|| pattern(r"(?i)<(?:br|p|div|h[1-6])(?:\s[^>]*)?/?>|</h[1-6]\s*>"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<li(?:\s[^>]*)?>"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"<[^>]+>"));
static LINE_BREAK_RUN: LazyLock<Regex> = LazyLock::new(|| pattern(r"\s*\n\s*"));
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| pattern(r"[^\S\n]+"));
static TITLE_ELEMENT: LazyLock<Regex> =
  LazyLock::new(|| pattern(r"(?is)<title(?:\s[^>]*)?>(.*?)</title\s*>"));
static H1_ELEMENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)<h1(?:\s[^>]*)?>(.*?)</h1\s*>"));
static HEADING_ELEMENT: LazyLock<Regex> =
  LazyLock::new(|| pattern(r"(?is)<h[1-6](?:\s[^>]*)?>(.*?)</h[1-6]\s*>"));

static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));

fn selector(source: &str) -> Selector {
  Selector::parse(source).expect("literal css selector")
}

/// Text of a page split by where it appears, for rank weighting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRegions {
  /// `<title>` text
  pub title: String,
  /// Text of every `<h1>`..`<h6>`
  pub headings: Vec<String>,
  /// Everything else
  pub body: String,
}

/// Reduces HTML to plain text with the configured extractor.
pub fn extract_text(html: &str, extractor: TextExtractor) -> String {
  match extractor {
    TextExtractor::Regex => clean_html(html),
    TextExtractor::Structured => clean_html_structured(html),
  }
}

/// Regex based reduction: drops script, style and comment blocks, turns block tags
/// into line breaks, decodes common entities, collapses whitespace and puts the
/// `<title>` text on the first line.
pub fn clean_html(html: &str) -> String {
  if html.trim().is_empty() {
    return String::new();
  }
  let text = strip_markup(html);
  match extract_title(html) {
    Some(title) if text.is_empty() => title,
    Some(title) => format!("{title}\n\n{text}"),
    None => text,
  }
}

/// DOM based reduction with the same contract as [`clean_html`].
///
/// Falls back to [`clean_html`] when the document has no body element.
pub fn clean_html_structured(html: &str) -> String {
  if html.trim().is_empty() {
    return String::new();
  }
  let document = Html::parse_document(html);
  let Some(body) = document.select(&BODY).next() else {
    return clean_html(html);
  };

  let mut parts: Vec<&str> = Vec::new();
  for node in body.descendants() {
    let Some(text) = node.value().as_text() else {
      continue;
    };
    let hidden = node.ancestors().any(|ancestor| {
      ancestor
        .value()
        .as_element()
        .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()))
    });
    if !hidden {
      parts.push(text);
    }
  }
  let body_text = collapse_spaces(&parts.join(" "));

  let title = document
    .select(&TITLE)
    .next()
    .map(|element| collapse_spaces(&element.text().collect::<String>()))
    .unwrap_or_default();

  match (title.is_empty(), body_text.is_empty()) {
    (true, _) => body_text,
    (false, true) => title,
    (false, false) => format!("{title}\n\n{body_text}"),
  }
}

/// Text of the first `<title>` element, `None` when absent or blank.
pub fn extract_title(html: &str) -> Option<String> {
  first_element_text(&TITLE_ELEMENT, html)
}

/// Text of the first `<h1>` element, `None` when absent or blank.
pub fn extract_first_heading(html: &str) -> Option<String> {
  first_element_text(&H1_ELEMENT, html)
}

/// Splits a page into title, heading and body text.
pub fn split_regions(html: &str) -> PageRegions {
  let title = extract_title(html).unwrap_or_default();
  let headings = HEADING_ELEMENT
    .captures_iter(html)
    .filter_map(|caps| caps.get(1))
    .map(|inner| strip_markup(inner.as_str()))
    .filter(|text| !text.is_empty())
    .collect();
  let without_title = TITLE_ELEMENT.replace_all(html, " ");
  let without_headings = HEADING_ELEMENT.replace_all(&without_title, " ");
  PageRegions {
    title,
    headings,
    body: strip_markup(&without_headings),
  }
}

/// Splits a page into title, heading and body text with the configured extractor.
pub fn split_regions_with(html: &str, extractor: TextExtractor) -> PageRegions {
  match extractor {
    TextExtractor::Regex => split_regions(html),
    TextExtractor::Structured => split_regions_structured(html),
  }
}

/// DOM based [`split_regions`], skipping the same elements as [`clean_html_structured`].
///
/// Falls back to [`split_regions`] when the document has no body element.
pub fn split_regions_structured(html: &str) -> PageRegions {
  let document = Html::parse_document(html);
  let Some(body) = document.select(&BODY).next() else {
    return split_regions(html);
  };

  let title = document
    .select(&TITLE)
    .next()
    .map(|element| collapse_spaces(&element.text().collect::<Vec<_>>().join(" ")))
    .unwrap_or_default();
  let headings = body
    .select(&HEADING)
    .map(|element| collapse_spaces(&element.text().collect::<Vec<_>>().join(" ")))
    .filter(|text| !text.is_empty())
    .collect();

  let mut parts: Vec<&str> = Vec::new();
  for node in body.descendants() {
    let Some(text) = node.value().as_text() else {
      continue;
    };
    let excluded = node.ancestors().any(|ancestor| {
      ancestor.value().as_element().is_some_and(|element| {
        SKIPPED_ELEMENTS.contains(&element.name()) || HEADING_ELEMENTS.contains(&element.name())
      })
    });
    if !excluded {
      parts.push(text);
    }
  }

  PageRegions {
    title,
    headings,
    body: collapse_spaces(&parts.join(" ")),
  }
}

fn first_element_text(element: &Regex, html: &str) -> Option<String> {
  let inner = element.captures(html)?.get(1)?;
  let text = collapse_spaces(&strip_markup(inner.as_str()));
  (!text.is_empty()).then_some(text)
}

/// Markup removal without the title prefix.
fn strip_markup(html: &str) -> String {
  let text = SCRIPT_BLOCK.replace_all(html, " ");
  let text = STYLE_BLOCK.replace_all(&text, " ");
  let text = COMMENT.replace_all(&text, " ");
  let text = BLOCK_TAG.replace_all(&text, "\n");
  let text = LIST_ITEM.replace_all(&text, "\n• ");
  let text = ANY_TAG.replace_all(&text, " ");
  let mut decoded = text.into_owned();
  for (entity, replacement) in ENTITIES {
    if decoded.contains(entity) {
      decoded = decoded.replace(entity, replacement);
    }
  }
  let spaced = SPACE_RUN.replace_all(&decoded, " ");
  LINE_BREAK_RUN.replace_all(&spaced, "\n").trim().to_string()
}

fn collapse_spaces(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Пример страницы</title>
  <style>body { color: red; }</style>
  <script>console.log('test');</script>
</head>
<body>
  <!-- hidden comment -->
  <h1>Заголовок статьи</h1>
  <p>Первый абзац с <strong>важным</strong> текстом.</p>
  <p>Второй абзац &nbsp; с &quot;кавычками&quot;.</p>
  <ul>
    <li>Первый пункт</li>
  </ul>
</body>
</html>"#;

  #[test]
  fn clean_html_strips_blocks_and_prefixes_title() {
    let text = clean_html(SAMPLE);

    assert!(text.starts_with("Пример страницы\n\n"));
    assert!(text.contains("Первый абзац с важным текстом."));
    assert!(text.contains("с \"кавычками\""));
    assert!(text.contains("• Первый пункт"));
    assert!(!text.contains("console"));
    assert!(!text.contains("color"));
    assert!(!text.contains("hidden comment"));
    assert!(!text.contains('<'));
  }

  #[test]
  fn clean_html_turns_block_tags_into_line_breaks() {
    let text = clean_html("<div>one</div><div>two</div><br/>three");
    assert_eq!(text, "one\ntwo\nthree");
  }

  #[test]
  fn clean_html_decodes_amp_last() {
    assert_eq!(clean_html("<p>a &amp;lt; b</p>"), "a &lt; b");
  }

  #[test]
  fn clean_html_of_blank_input_is_empty() {
    assert_eq!(clean_html(""), "");
    assert_eq!(clean_html("   \n"), "");
  }

  #[test]
  fn structured_extractor_skips_hidden_elements() {
    let text = clean_html_structured(SAMPLE);

    assert!(text.starts_with("Пример страницы\n\n"));
    assert!(text.contains("Заголовок статьи"));
    assert!(text.contains("важным"));
    assert!(!text.contains("console"));
    assert!(!text.contains("hidden comment"));
  }

  #[test]
  fn extract_text_dispatches_on_extractor() {
    let html = "<html><body><p>leopard</p></body></html>";
    assert_eq!(extract_text(html, TextExtractor::Regex), "leopard");
    assert_eq!(extract_text(html, TextExtractor::Structured), "leopard");
  }

  #[test]
  fn extract_title_and_heading() {
    assert_eq!(extract_title(SAMPLE).as_deref(), Some("Пример страницы"));
    assert_eq!(
      extract_first_heading(SAMPLE).as_deref(),
      Some("Заголовок статьи")
    );
    assert_eq!(extract_title("<title>  </title>"), None);
    assert_eq!(extract_first_heading("<h2>not an h1</h2>"), None);
  }

  #[test]
  fn split_regions_separates_title_headings_and_body() {
    let regions = split_regions(
      "<html><head><title>Leopard</title></head>\
       <body><h1>Caucasus</h1><h2>Wildlife</h2><p>The leopard lives here.</p></body></html>",
    );

    assert_eq!(regions.title, "Leopard");
    assert_eq!(regions.headings, vec!["Caucasus".to_string(), "Wildlife".to_string()]);
    assert_eq!(regions.body, "The leopard lives here.");
  }

  #[test]
  fn structured_regions_skip_hidden_elements() {
    let html = "<html><head><title>Leopard</title></head><body><h1>Caucasus <em>leopard</em></h1>\
      <p>The leopard lives here.</p><noscript>enable scripts</noscript><script>track()</script></body></html>";

    let regions = split_regions_with(html, TextExtractor::Structured);

    assert_eq!(regions.title, "Leopard");
    assert_eq!(regions.headings, vec!["Caucasus leopard".to_string()]);
    assert_eq!(regions.body, "The leopard lives here.");
    assert!(split_regions_with(html, TextExtractor::Regex).body.contains("enable scripts"));
  }
}
