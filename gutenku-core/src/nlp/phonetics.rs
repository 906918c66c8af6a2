//! First-sound coding for alliteration

use super::tokenizer::words;
use std::collections::HashMap;

/// Phonetic class of the opening sound of `word`.
///
/// Folds common spelling variants: `ph`→F, `kn`/`gn`→N, `wr`→R, `wh`→W,
/// soft `c`→S, hard `c`/`q`→K, initial `x`→S. Vowels share one class.
pub fn initial_sound(word: &str) -> Option<char> {
    let lower: Vec<char> = word
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let first = *lower.first()?;
    let second = lower.get(1).copied();

    let code = match (first, second) {
        ('p', Some('h')) => 'F',
        ('k', Some('n')) | ('g', Some('n')) => 'N',
        ('w', Some('r')) => 'R',
        ('w', Some('h')) => 'W',
        ('c', Some('e' | 'i' | 'y')) => 'S',
        ('c', _) | ('q', _) => 'K',
        ('x', _) => 'S',
        ('a' | 'e' | 'i' | 'o' | 'u', _) => 'A',
        (c, _) => c.to_ascii_uppercase(),
    };
    Some(code)
}

/// Fraction of words whose opening sound repeats an earlier word's, in [0, 1]
pub fn alliteration_score(text: &str) -> f64 {
    let codes: Vec<char> = words(text).into_iter().filter_map(initial_sound).collect();
    if codes.len() < 2 {
        return 0.0;
    }
    let mut seen: HashMap<char, usize> = HashMap::new();
    for code in &codes {
        *seen.entry(*code).or_insert(0) += 1;
    }
    let repeats: usize = seen.values().filter(|&&n| n > 1).map(|n| n - 1).sum();
    repeats as f64 / codes.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_sound_folds_spellings() {
        assert_eq!(initial_sound("phantom"), Some('F'));
        assert_eq!(initial_sound("fern"), Some('F'));
        assert_eq!(initial_sound("knee"), Some('N'));
        assert_eq!(initial_sound("city"), Some('S'));
        assert_eq!(initial_sound("cat"), Some('K'));
        assert_eq!(initial_sound("42"), None);
    }

    #[test]
    fn test_alliteration_score() {
        // four words, three share an S sound: two repeats
        assert!((alliteration_score("silent snow softly falls") - 0.5).abs() < 1e-9);
        assert_eq!(alliteration_score("pond"), 0.0);
        assert_eq!(alliteration_score("red blue"), 0.0);
    }
}
