//! Title and author extraction from a book's header

use once_cell::sync::Lazy;
use regex::Regex;

/// Header length used when no START marker exists
pub const HEADER_FALLBACK_CHARS: usize = 3000;

static START_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*{3}\s*START\s+OF\s+(?:THE\s+)?PROJECT\s+GUTENBERG").expect("valid start regex")
});

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Title\s*:\s*(.+?)\s*$").expect("valid title regex"));

/// Author line and the credit lines accepted in its place, in priority order
static AUTHOR_LINES: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["Author", "Translator", "Editor", "Retold by"]
        .iter()
        .map(|label| {
            Regex::new(&format!(r"(?im)^\s*{label}\s*:\s*(.+?)\s*$")).expect("valid author regex")
        })
        .collect()
});

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capture(regex: &Regex, header: &str) -> Option<String> {
    regex
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
        .filter(|v| !v.is_empty())
}

/// Text before the START marker, else the first few thousand characters
pub fn header_section(text: &str) -> &str {
    match START_MARKER.find(text) {
        Some(m) => &text[..m.start()],
        None => match text.char_indices().nth(HEADER_FALLBACK_CHARS) {
            Some((end, _)) => &text[..end],
            None => text,
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

pub fn extract_metadata(text: &str) -> ExtractedMetadata {
    let header = header_section(text);
    ExtractedMetadata {
        title: capture(&TITLE, header),
        author: AUTHOR_LINES.iter().find_map(|re| capture(re, header)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_title_and_author() {
        let text = "The Project Gutenberg eBook\r\n\r\nTitle: Pride and   Prejudice\r\n\r\nAuthor: Jane Austen\r\n\r\n\
                    *** START OF THE PROJECT GUTENBERG EBOOK ***\r\nAuthor: Someone Else";
        let meta = extract_metadata(text);
        assert_eq!(meta.title.as_deref(), Some("Pride and Prejudice"));
        assert_eq!(meta.author.as_deref(), Some("Jane Austen"));
    }

    #[test]
    fn test_translator_fallback() {
        let meta = extract_metadata("Title: The Odyssey\nTranslator: Samuel Butler\n");
        assert_eq!(meta.author.as_deref(), Some("Samuel Butler"));
    }

    #[test]
    fn test_missing_fields() {
        let meta = extract_metadata("no header here");
        assert_eq!(meta, ExtractedMetadata::default());
    }

    #[test]
    fn test_author_after_start_marker_ignored() {
        let meta = extract_metadata("Title: X\n*** START OF PROJECT GUTENBERG ***\nAuthor: Y\n");
        assert_eq!(meta.title.as_deref(), Some("X"));
        assert_eq!(meta.author, None);
    }
}
