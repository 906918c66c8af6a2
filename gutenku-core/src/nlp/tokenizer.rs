//! Word and sentence tokenization

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9]+(?:['’][A-Za-z]+)*").expect("valid word regex"));

/// Word tokens in order of appearance, internal apostrophes kept
pub fn words(text: &str) -> Vec<&str> {
    WORD_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Lowercased word tokens
pub fn lowercase_words(text: &str) -> Vec<String> {
    words(text).into_iter().map(str::to_lowercase).collect()
}

/// Unicode (UAX #29) sentences, trimmed, blanks dropped
pub fn sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_keep_contractions() {
        assert_eq!(words("Don't stop, the rain!"), vec!["Don't", "stop", "the", "rain"]);
    }

    #[test]
    fn test_sentences_split_on_terminators() {
        let found = sentences("The moon rose. Frogs sang loudly! Did you hear?");
        assert_eq!(found, vec!["The moon rose.", "Frogs sang loudly!", "Did you hear?"]);
    }

    #[test]
    fn test_lowercase_words() {
        assert_eq!(lowercase_words("Old POND"), vec!["old", "pond"]);
    }
}
