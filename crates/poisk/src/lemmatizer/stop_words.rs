//! Stop words, skipped both before and after the dictionary lookup.

/// Russian stop words
pub const RUSSIAN_STOP_WORDS: &[&str] = &[
  "и", "в", "не", "на", "я", "он", "что", "то", "это", "как", "а", "по", "но", "за", "вы", "так",
  "же", "от", "из", "у", "к", "до", "бы", "мы", "о", "при", "во", "со", "без", "над", "для", "об",
  "под", "про", "перед", "через", "после", "вокруг", "или", "да", "нет", "ли", "быть", "мочь",
  "сказать", "знать", "хотеть", "видеть", "идти", "взять", "дать", "жить", "смотреть", "думать",
  "говорить", "стать", "работать", "понять", "получить",
];

/// English stop words
pub const ENGLISH_STOP_WORDS: &[&str] = &[
  "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from",
  "up", "about", "into", "over", "after", "is", "are", "was", "were", "be", "been", "being",
  "have", "has", "had", "having", "do", "does", "did", "doing", "will", "would", "shall",
  "should", "may", "might", "must", "can", "could", "i", "you", "he", "she", "it", "we", "they",
  "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their", "this", "that",
  "these", "those", "what", "which", "who", "whom", "whose", "where", "when", "why", "how",
];

/// True when the lowercase `word` is a Russian or English stop word.
pub fn is_stop_word(word: &str) -> bool {
  RUSSIAN_STOP_WORDS.contains(&word) || ENGLISH_STOP_WORDS.contains(&word)
}
