//! Morphological dictionaries.
//!
//! A [`Morphology`] turns one lowercase word of its script into normal forms and
//! part-of-speech descriptions. Words are routed to a dictionary by [`Script`].

pub mod snowball;

use std::sync::Arc;

use crate::config::Language;
use crate::errors::MorphologyError;

pub use snowball::SnowballMorphology;

/// Part-of-speech tags of service words (interjection, preposition, conjunction, particle).
pub const SERVICE_TAGS: [&str; 8] = ["МЕЖД", "ПРЕДЛ", "СОЮЗ", "ЧАСТ", "INT", "PREP", "CONJ", "PART"];

/// Morphological analysis capability of one language.
///
/// `morph_info` entries have the form `word|TAG ...`.
pub trait Morphology: Send + Sync {
  /// Language of the dictionary
  fn language(&self) -> Language;

  /// Normal forms of `word`, most likely first. Empty when the word is unknown.
  ///
  /// # Errors
  /// `MorphologyError` when the word cannot be analyzed by this dictionary.
  fn normal_forms(&self, word: &str) -> Result<Vec<String>, MorphologyError>;

  /// Part-of-speech descriptions of `word`.
  ///
  /// # Errors
  /// `MorphologyError` when the word cannot be analyzed by this dictionary.
  fn morph_info(&self, word: &str) -> Result<Vec<String>, MorphologyError>;
}

/// True when any description carries a service part-of-speech tag.
pub fn is_service_word(morph_info: &[String]) -> bool {
  morph_info.iter().any(|info| {
    let tags = info.split_once('|').map_or(info.as_str(), |(_, tags)| tags);
    tags
      .split(|c: char| c.is_whitespace() || c == ',')
      .any(|tag| SERVICE_TAGS.contains(&tag))
  })
}

/// Writing system of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
  /// Russian alphabet (а-я, ё)
  Cyrillic,
  /// Basic Latin alphabet (a-z)
  Latin,
}

impl Script {
  /// Classifies a word whose characters all belong to one script.
  ///
  /// Returns `None` for empty or mixed-script words.
  pub fn detect(word: &str) -> Option<Script> {
    let mut chars = word.chars();
    let script = Self::of_char(chars.next()?)?;
    chars
      .all(|c| Self::of_char(c) == Some(script))
      .then_some(script)
  }

  fn of_char(c: char) -> Option<Script> {
    match c {
      'а'..='я' | 'А'..='Я' | 'ё' | 'Ё' => Some(Script::Cyrillic),
      c if c.is_ascii_alphabetic() => Some(Script::Latin),
      _ => None,
    }
  }
}

/// One dictionary per script. A missing dictionary leaves its words unanalyzed.
#[derive(Clone, Default)]
pub struct Morphologies {
  cyrillic: Option<Arc<dyn Morphology>>,
  latin: Option<Arc<dyn Morphology>>,
}

impl Morphologies {
  /// Loads the built-in dictionary of every listed language.
  pub fn for_languages(languages: &[Language]) -> Self {
    let mut morphologies = Self::default();
    for &language in languages {
      morphologies = morphologies.with(Arc::new(SnowballMorphology::new(language)));
    }
    morphologies
  }

  /// Binds `morphology` to the script of its language, replacing any previous one.
  #[must_use]
  pub fn with(mut self, morphology: Arc<dyn Morphology>) -> Self {
    match morphology.language().script() {
      Script::Cyrillic => self.cyrillic = Some(morphology),
      Script::Latin => self.latin = Some(morphology),
    }
    self
  }

  /// Dictionary bound to `script`.
  pub fn for_script(&self, script: Script) -> Option<&dyn Morphology> {
    match script {
      Script::Cyrillic => self.cyrillic.as_deref(),
      Script::Latin => self.latin.as_deref(),
    }
  }
}

impl std::fmt::Debug for Morphologies {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Morphologies")
      .field("cyrillic", &self.cyrillic.as_ref().map(|m| m.language()))
      .field("latin", &self.latin.as_ref().map(|m| m.language()))
      .finish()
  }
}
