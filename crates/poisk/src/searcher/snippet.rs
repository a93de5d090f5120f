//! Result titles and highlighted excerpts.
//!
//! Positions are counted in `char`s so excerpts never split a multi-byte letter.
//! A word is a maximal run of alphabetic characters, which makes every match a
//! whole word bounded by non-letters or the text edges.

use crate::lemmatizer::html::{extract_first_heading, extract_title};

/// Title shown for pages without `<title>` and `<h1>`
pub const NO_TITLE: &str = "Без заголовка";

/// Longest title kept before truncation
pub const TITLE_MAX_CHARS: usize = 100;

const ELLIPSIS: &str = "...";
const EMPHASIS_OPEN: &str = "<b>";
const EMPHASIS_CLOSE: &str = "</b>";

/// Title of a page: `<title>`, else the first `<h1>`, else [`NO_TITLE`].
pub fn page_title(html: &str) -> String {
  extract_title(html)
    .or_else(|| extract_first_heading(html))
    .map(|title| truncate_chars(&title, TITLE_MAX_CHARS))
    .unwrap_or_else(|| NO_TITLE.to_string())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
  if text.chars().count() <= max_chars {
    return text.to_string();
  }
  let mut truncated: String = text.chars().take(max_chars).collect();
  truncated.push_str(ELLIPSIS);
  truncated
}

/// Builds an excerpt of `text` with every matching word wrapped in `<b>`.
///
/// `is_match` receives each word lowercased. The excerpt spans `radius`
/// characters on each side of the first match, widened so no word is cut.
/// Without a match it covers the first `fallback_len` characters.
pub fn build_snippet(
  text: &str,
  mut is_match: impl FnMut(&str) -> bool,
  radius: usize,
  fallback_len: usize,
) -> String {
  let chars: Vec<char> = text.chars().collect();
  if chars.is_empty() {
    return String::new();
  }

  let matches: Vec<(usize, usize)> = word_spans(&chars)
    .into_iter()
    .filter(|&(start, end)| is_match(&lowercase(&chars[start..end])))
    .collect();

  let (start, end) = match matches.first() {
    Some(&(first, _)) => widen(
      &chars,
      first.saturating_sub(radius),
      first.saturating_add(radius).min(chars.len()),
    ),
    None => widen(&chars, 0, fallback_len.min(chars.len())),
  };
  let inside: Vec<(usize, usize)> = matches
    .into_iter()
    .filter(|&(word_start, word_end)| word_start >= start && word_end <= end)
    .collect();
  frame(&chars, start, end, &inside)
}

/// Maximal runs of alphabetic characters as `[start, end)` positions.
fn word_spans(chars: &[char]) -> Vec<(usize, usize)> {
  let mut spans = Vec::new();
  let mut start = None;
  for (position, c) in chars.iter().enumerate() {
    match (c.is_alphabetic(), start) {
      (true, None) => start = Some(position),
      (false, Some(word_start)) => {
        spans.push((word_start, position));
        start = None;
      }
      _ => {}
    }
  }
  if let Some(word_start) = start {
    spans.push((word_start, chars.len()));
  }
  spans
}

fn lowercase(chars: &[char]) -> String {
  chars.iter().flat_map(|c| c.to_lowercase()).collect()
}

/// Moves both bounds outwards until neither falls inside a word.
fn widen(chars: &[char], mut start: usize, mut end: usize) -> (usize, usize) {
  while start > 0 && chars[start - 1].is_alphabetic() {
    start -= 1;
  }
  while end < chars.len() && chars[end].is_alphabetic() {
    end += 1;
  }
  (start, end)
}

fn frame(chars: &[char], start: usize, end: usize, emphasized: &[(usize, usize)]) -> String {
  let mut snippet = String::new();
  if start > 0 {
    snippet.push_str(ELLIPSIS);
  }
  let mut position = start;
  for &(word_start, word_end) in emphasized {
    snippet.extend(&chars[position..word_start]);
    snippet.push_str(EMPHASIS_OPEN);
    snippet.extend(&chars[word_start..word_end]);
    snippet.push_str(EMPHASIS_CLOSE);
    position = word_end;
  }
  snippet.extend(&chars[position..end]);
  if end < chars.len() {
    snippet.push_str(ELLIPSIS);
  }
  snippet
}
