//! Line-level verse filters
//!
//! Cheap structural checks applied to a single candidate line before any
//! scoring happens. A line that fails here never reaches the scorer gates.
//!
//! # Checks
//! - **Conjunction start**: first line may not open with and/but/or/of
//! - **Blacklist**: dialogue tags, dangling conjunctions, markup and digits,
//!   honorifics, a lone trailing capital
//! - **Uppercase**: headings and shouted text
//! - **Length**: lines of `VERSE_MAX_LENGTH` characters or more
//! - **Weak start**: pronoun/determiner openers (gated by thresholds)

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines at or above this many characters are rejected
pub const VERSE_MAX_LENGTH: usize = 30;

static CONJUNCTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(and|but|or|of)\b").expect("valid conjunction pattern"));

static WEAK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(it|there|this|that|they|we|he|she|i|and|or|but)\s")
        .expect("valid weak start pattern")
});

static UPPERCASE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z\s!:.?]+$").expect("valid uppercase pattern"));

static BLACKLIST: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // dialogue tags
        r"(?i)^(said|cried|inquired)\b",
        // dangling conjunction
        r"(?i)\b(or|and|of)$",
        r#"[@#\[\](){}/:,_—+=*$%;~&"“”‘’0-9\r\n]"#,
        r"--",
        r"\b(Mr|Mrs|Dr)\b",
        // lost letter from a broken word
        r"\b[A-Z]\b$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid blacklist pattern"))
    .collect()
});

/// True when the line opens with a banned conjunction
pub fn starts_with_conjunction(line: &str) -> bool {
    CONJUNCTION_START.is_match(line.trim_start())
}

/// True when the line opens with a pronoun or determiner
pub fn has_weak_start(line: &str) -> bool {
    WEAK_START.is_match(line.trim_start())
}

/// True when the line contains only capitals and light punctuation
pub fn is_all_uppercase(line: &str) -> bool {
    UPPERCASE_LINE.is_match(line) && line.chars().any(|c| c.is_ascii_uppercase())
}

pub fn is_blacklisted(line: &str) -> bool {
    let trimmed = line.trim();
    BLACKLIST.iter().any(|pattern| pattern.is_match(trimmed))
}

pub fn is_too_long(line: &str) -> bool {
    line.chars().count() >= VERSE_MAX_LENGTH
}

/// Combined structural check: uppercase, blacklist, length
pub fn is_quote_invalid(line: &str) -> bool {
    is_all_uppercase(line) || is_blacklisted(line) || is_too_long(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conjunction_start_matches_whole_words() {
        assert!(starts_with_conjunction("And the rain fell"));
        assert!(starts_with_conjunction("of mice and men"));
        assert!(!starts_with_conjunction("Android dreams"));
        assert!(!starts_with_conjunction("Oftentimes the sea"));
    }

    #[test]
    fn test_weak_start() {
        assert!(has_weak_start("It was a dark night"));
        assert!(has_weak_start("they walked home"));
        assert!(!has_weak_start("Items on the shelf"));
    }

    #[test]
    fn test_uppercase_lines() {
        assert!(is_all_uppercase("CHAPTER ONE"));
        assert!(is_all_uppercase("THE END!"));
        assert!(!is_all_uppercase("The End"));
        assert!(!is_all_uppercase("  "));
    }

    #[test]
    fn test_blacklist_rules() {
        assert!(is_blacklisted("said the old man"));
        assert!(is_blacklisted("the wind and"));
        assert!(is_blacklisted("page 42 of it"));
        assert!(is_blacklisted("Mr Brown walked"));
        assert!(is_blacklisted("dear friend; come"));
        assert!(is_blacklisted("well--perhaps"));
        assert!(is_blacklisted("the road to B"));
        assert!(!is_blacklisted("an old silent pond"));
        assert!(!is_blacklisted("the sandy shore"));
    }

    #[test]
    fn test_length_cap() {
        assert!(!is_too_long("a".repeat(29).as_str()));
        assert!(is_too_long("a".repeat(30).as_str()));
    }

    #[test]
    fn test_quote_invalid_combines_checks() {
        assert!(is_quote_invalid("THE END"));
        assert!(is_quote_invalid("a line that runs on far too long"));
        assert!(!is_quote_invalid("silence returns now"));
    }
}
