//! Dictionary backed by the Snowball stemmers of `rust-stemmers`.
//!
//! The stem stands in for the normal form. Service words come from closed
//! per-language tables, everything else is tagged as a lexical word.

use rust_stemmers::{Algorithm, Stemmer};

use crate::config::Language;
use crate::errors::MorphologyError;
use crate::morphology::{Morphology, Script};

const RUSSIAN_LEXICAL_TAG: &str = "ЛЕКС";
const ENGLISH_LEXICAL_TAG: &str = "LEX";

const RUSSIAN_PREPOSITIONS: &[&str] = &[
  "в", "во", "на", "с", "со", "к", "ко", "по", "из", "изо", "у", "о", "об", "обо", "от", "ото", "до",
  "за", "под", "подо", "над", "надо", "при", "про", "через", "для", "без", "между", "перед",
  "около", "вокруг", "после", "сквозь", "среди", "ради", "вдоль", "возле", "кроме", "мимо",
  "внутри", "вне", "против", "согласно", "благодаря", "вместо",
];

const RUSSIAN_CONJUNCTIONS: &[&str] = &[
  "и", "а", "но", "или", "либо", "да", "что", "чтобы", "если", "когда", "хотя", "потому",
  "поэтому", "зато", "однако", "тоже", "также", "будто", "словно", "чем", "пока", "ибо",
  "причем", "притом", "иначе",
];

const RUSSIAN_PARTICLES: &[&str] = &[
  "не", "ни", "ли", "же", "бы", "вот", "вон", "даже", "уже", "лишь", "только", "ведь", "разве",
  "неужели", "именно", "почти", "едва", "пусть", "пускай", "давай",
];

const RUSSIAN_INTERJECTIONS: &[&str] = &[
  "ах", "ох", "эх", "ух", "ой", "ай", "увы", "ура", "эй", "ого", "ха", "хм", "фу", "тьфу", "ну",
];

const ENGLISH_PREPOSITIONS: &[&str] = &[
  "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
  "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite", "during",
  "except", "for", "from", "in", "inside", "into", "of", "off", "on", "onto", "outside", "over",
  "through", "throughout", "till", "to", "toward", "towards", "under", "underneath", "until",
  "up", "upon", "via", "with", "within", "without",
];

const ENGLISH_CONJUNCTIONS: &[&str] = &[
  "and", "or", "but", "nor", "because", "although", "though", "unless", "whereas", "while",
  "whether", "if", "than", "either", "neither",
];

const ENGLISH_PARTICLES: &[&str] = &["not"];

const ENGLISH_INTERJECTIONS: &[&str] = &[
  "oh", "ah", "wow", "hey", "oops", "alas", "ouch", "hmm", "hooray",
];

/// Snowball-stemmer based morphology for one language.
pub struct SnowballMorphology {
  language: Language,
  stemmer: Stemmer,
}

impl SnowballMorphology {
  /// Creates the dictionary of `language`.
  pub fn new(language: Language) -> Self {
    let algorithm = match language {
      Language::Ru => Algorithm::Russian,
      Language::En => Algorithm::English,
    };
    Self {
      language,
      stemmer: Stemmer::create(algorithm),
    }
  }

  fn check_script(&self, word: &str) -> Result<(), MorphologyError> {
    if Script::detect(word) == Some(self.language.script()) {
      Ok(())
    } else {
      Err(MorphologyError::WrongScript {
        word: word.to_string(),
        language: self.language,
      })
    }
  }

  fn service_tags(&self, word: &str) -> Vec<&'static str> {
    let tables: [(&[&str], &'static str); 4] = match self.language {
      Language::Ru => [
        (RUSSIAN_PREPOSITIONS, "ПРЕДЛ"),
        (RUSSIAN_CONJUNCTIONS, "СОЮЗ"),
        (RUSSIAN_PARTICLES, "ЧАСТ"),
        (RUSSIAN_INTERJECTIONS, "МЕЖД"),
      ],
      Language::En => [
        (ENGLISH_PREPOSITIONS, "PREP"),
        (ENGLISH_CONJUNCTIONS, "CONJ"),
        (ENGLISH_PARTICLES, "PART"),
        (ENGLISH_INTERJECTIONS, "INT"),
      ],
    };
    tables
      .into_iter()
      .filter(|(words, _)| words.contains(&word))
      .map(|(_, tag)| tag)
      .collect()
  }
}

impl Morphology for SnowballMorphology {
  fn language(&self) -> Language {
    self.language
  }

  fn normal_forms(&self, word: &str) -> Result<Vec<String>, MorphologyError> {
    self.check_script(word)?;
    let lowered = word.to_lowercase();
    let stem = self.stemmer.stem(&lowered);
    if stem.is_empty() {
      return Ok(Vec::new());
    }
    Ok(vec![stem.into_owned()])
  }

  fn morph_info(&self, word: &str) -> Result<Vec<String>, MorphologyError> {
    self.check_script(word)?;
    let lowered = word.to_lowercase();
    let tags = self.service_tags(&lowered);
    if tags.is_empty() {
      let lexical = match self.language {
        Language::Ru => RUSSIAN_LEXICAL_TAG,
        Language::En => ENGLISH_LEXICAL_TAG,
      };
      return Ok(vec![format!("{lowered}|{lexical}")]);
    }
    Ok(tags.into_iter().map(|tag| format!("{lowered}|{tag}")).collect())
  }
}

impl std::fmt::Debug for SnowballMorphology {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SnowballMorphology")
      .field("language", &self.language)
      .finish_non_exhaustive()
  }
}
