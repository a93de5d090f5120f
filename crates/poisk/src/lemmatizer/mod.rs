//! Lemmatizer: raw text → lemma frequency map.
//!
//! Words are lowercased, reduced to Russian/English letters, filtered against
//! stop words and routed by [`Script`] to the matching morphology. Normal forms
//! pass the same filters as raw words. Words no dictionary can handle are
//! counted verbatim.

pub mod html;
pub mod stop_words;

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::config::Language;
use crate::errors::MorphologyError;
use crate::morphology::{Morphologies, Morphology, Script, is_service_word};

pub use html::{
  PageRegions, clean_html, clean_html_structured, extract_text, split_regions, split_regions_structured,
  split_regions_with,
};
pub use stop_words::is_stop_word;

/// Minimum number of characters of an indexable word.
pub const MIN_WORD_CHARS: usize = 2;

/// Language-aware lemmatizer. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
  morphologies: Morphologies,
}

impl Lemmatizer {
  /// Creates a lemmatizer with the built-in dictionaries of `languages`.
  pub fn new(languages: &[Language]) -> Self {
    Self::with_morphologies(Morphologies::for_languages(languages))
  }

  /// Creates a lemmatizer over explicit dictionaries.
  pub fn with_morphologies(morphologies: Morphologies) -> Self {
    Self { morphologies }
  }

  /// Counts the lemmas of `text`.
  ///
  /// Never fails; the result does not depend on word order.
  pub fn lemmas(&self, text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for word in words(text) {
      if let Some(lemma) = self.normalize_word(&word) {
        *counts.entry(lemma).or_insert(0) += 1;
      }
    }
    counts
  }

  /// Distinct lemmas of `text`.
  pub fn unique_lemmas(&self, text: &str) -> HashSet<String> {
    self.lemmas(text).into_keys().collect()
  }

  /// Lemmas of `text` by descending count, ties by lemma.
  pub fn sorted_lemmas(&self, text: &str) -> Vec<(String, usize)> {
    let mut sorted: Vec<_> = self.lemmas(text).into_iter().collect();
    sorted.sort_by(|(a_lemma, a_count), (b_lemma, b_count)| {
      b_count.cmp(a_count).then_with(|| a_lemma.cmp(b_lemma))
    });
    sorted
  }

  /// Lemma of a single word, `None` when the word is not indexable.
  ///
  /// Applies the same filters as [`Lemmatizer::lemmas`] to one word.
  pub fn lemma_of(&self, word: &str) -> Option<String> {
    let lowered = word.to_lowercase();
    self.normalize_word(&lowered)
  }

  fn normalize_word(&self, word: &str) -> Option<String> {
    if !is_indexable(word) {
      return None;
    }
    let morphology = Script::detect(word).and_then(|script| self.morphologies.for_script(script));
    let Some(morphology) = morphology else {
      return Some(word.to_string());
    };
    match analyze(morphology, word) {
      Ok(lemma) => lemma.filter(|normal_form| is_indexable(normal_form)),
      Err(err) => {
        trace!(word, error = %err, "dictionary lookup failed, counting word verbatim");
        Some(word.to_string())
      }
    }
  }
}

/// Long enough and not a stop word. Holds for raw words and normal forms alike.
fn is_indexable(word: &str) -> bool {
  word.chars().count() >= MIN_WORD_CHARS && !is_stop_word(word)
}

/// First normal form of a content word, `None` for unknown and service words.
fn analyze(morphology: &dyn Morphology, word: &str) -> Result<Option<String>, MorphologyError> {
  let Some(normal_form) = morphology.normal_forms(word)?.into_iter().next() else {
    return Ok(None);
  };
  if is_service_word(&morphology.morph_info(word)?) {
    return Ok(None);
  }
  Ok(Some(normal_form))
}

/// Lowercases `text`, replaces everything but Russian/English letters and
/// whitespace with spaces and splits on whitespace.
pub fn words(text: &str) -> Vec<String> {
  let cleaned: String = text
    .to_lowercase()
    .chars()
    .map(|c| match c {
      'а'..='я' | 'ё' | 'a'..='z' => c,
      _ => ' ',
    })
    .collect();
  cleaned.split_whitespace().map(str::to_string).collect()
}
