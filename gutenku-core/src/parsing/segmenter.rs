//! Chapter segmentation
//!
//! An ordered registry of chapter-marker patterns, most specific first. Every
//! marker must open the text or follow a blank line (two or more newlines), so
//! mid-paragraph words and table-of-contents lines are not taken as markers.
//! The first pattern that yields more than one non-empty segment wins; when
//! none does, the whole text is returned as a single segment.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Segments shorter than this (after trimming) are discarded
pub const MIN_SEGMENT_LENGTH: usize = 5;

/// Marker prefix: start of text or a blank line
const BOUNDARY: &str = r"(?:\A|\n{2,})\s*";

static FOOTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\*{3}\s*END\s+OF\s+(?:THE\s+)?PROJECT\s+GUTENBERG.*$")
        .expect("valid footer regex")
});

static TRAILING_PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}\d+\s*$").expect("valid page number regex"));

/// Post-match check rejecting look-alike marker lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerGuard {
    Unguarded,
    /// Dot leaders or trailing page numbers
    TableOfContents,
    /// `CHAPTER ... PAGE` running headers
    NotPageHeader,
    /// Copyright/Published/Printed/Edition lines
    NotPublishingMetadata,
}

impl MarkerGuard {
    fn accepts(self, marker: &str) -> bool {
        let line = marker.trim();
        match self {
            MarkerGuard::Unguarded => true,
            MarkerGuard::TableOfContents => {
                !(line.contains("...") || line.contains('…') || TRAILING_PAGE_NUMBER.is_match(line))
            }
            MarkerGuard::NotPageHeader => !line.to_uppercase().ends_with("PAGE"),
            MarkerGuard::NotPublishingMetadata => {
                let first = line.split_whitespace().next().unwrap_or("").to_lowercase();
                !matches!(first.as_str(), "copyright" | "published" | "printed" | "edition")
            }
        }
    }
}

/// Named chapter-marker rule
#[derive(Debug, Clone)]
pub struct ChapterPattern {
    pub name: &'static str,
    regex: Regex,
    guard: MarkerGuard,
}

impl ChapterPattern {
    /// `body` is appended to the blank-line boundary prefix
    pub fn new(name: &'static str, body: &str, guard: MarkerGuard) -> Result<Self, regex::Error> {
        let (flags, body) = match body.strip_prefix("(?i)") {
            Some(rest) => ("(?i)", rest),
            None => ("", body),
        };
        let regex = Regex::new(&format!("{flags}{BOUNDARY}{body}"))?;
        Ok(Self { name, regex, guard })
    }

    /// Raw split around accepted markers; segments are untrimmed
    ///
    /// A rejected marker gives back everything after its own line start, so
    /// the blank line that ends it can still open the next marker.
    fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut segments = Vec::new();
        let mut last = 0;
        let mut pos = 0;
        while let Some(m) = self.regex.find_at(text, pos) {
            if self.guard.accepts(m.as_str()) {
                segments.push(&text[last..m.start()]);
                last = m.end();
                pos = m.end();
            } else {
                let line_start = m.end() - m.as_str().trim_start().len();
                let next_char = text[m.start()..].chars().next().map_or(1, char::len_utf8);
                pos = line_start.max(m.start() + next_char);
            }
            if pos >= text.len() {
                break;
            }
        }
        segments.push(&text[last..]);
        segments
    }
}

const ORDINALS: &str =
    "FIRST|SECOND|THIRD|FOURTH|FIFTH|SIXTH|SEVENTH|EIGHTH|NINTH|TENTH|ELEVENTH|TWELFTH";

fn default_patterns() -> Vec<ChapterPattern> {
    use MarkerGuard::*;
    let numbered = r"(?:\d+|(?-i:[IVXLCDM]+))\b[^\n]*\n";
    let counted = r"(?:ONE|TWO|THREE|FOUR|FIVE|SIX|SEVEN|EIGHT|NINE|TEN)\b[^\n]*\n";

    let rules: Vec<(&'static str, String, MarkerGuard)> = vec![
        ("roman_dot_title", r"[IVXLCDMivxlcdm]+\. +[A-Z][A-Z '’-]+\.?[ \t]*\n".into(), TableOfContents),
        ("chapter_numeric", format!(r"(?i)CHAPTER[ .]+{numbered}"), TableOfContents),
        ("chapter_named", r"(?i)CHAPTER[ .]+[A-Z][\w ]*\n".into(), NotPageHeader),
        ("chapter_dot_title", r"\d+\. +[A-Z][A-Za-z '’,-]*\n".into(), TableOfContents),
        ("ordinal_book", format!(r"(?i)(?:THE\s+)?(?:{ORDINALS})\s+BOOK\b[^\n]*\n"), Unguarded),
        ("book", format!(r"(?i)BOOK[ .]+{numbered}"), TableOfContents),
        ("volume", format!(r"(?i)VOLUME[ .]+{numbered}"), TableOfContents),
        ("ordinal_canto", format!(r"(?i)(?:THE\s+)?(?:{ORDINALS})\s+CANTO\b[^\n]*\n"), Unguarded),
        ("canto", format!(r"(?i)CANTO[ .]+{numbered}"), TableOfContents),
        ("stave", format!(r"(?i)STAVE[ .]+{counted}"), TableOfContents),
        ("part", format!(r"(?i)PART[ .]+{numbered}"), TableOfContents),
        ("section", format!(r"(?i)SECTION[ .]+{numbered}"), TableOfContents),
        ("letter", format!(r"(?i)LETTER[ .]+{numbered}"), TableOfContents),
        ("fable", format!(r"(?i)FABLE[ .]+{numbered}"), TableOfContents),
        ("bracketed_numeric", r"\[\d+\][ \t]*\n".into(), Unguarded),
        ("custom_prefix", r"[A-Z][a-z]*(?:[ \t][A-Za-z]+)*[ .]{1,5}\d+[ \t]*\n".into(), NotPublishingMetadata),
        ("numeric_only", r"\d+\.?[ \t]*\n".into(), Unguarded),
        ("roman_only", r"[IVXLCDM]+\.?[ \t]*\n".into(), Unguarded),
        ("title_only", r"[A-Z][\w ]*\n".into(), Unguarded),
    ];

    rules
        .into_iter()
        .map(|(name, body, guard)| {
            ChapterPattern::new(name, &body, guard).expect("built-in chapter pattern compiles")
        })
        .collect()
}

static DEFAULT_PATTERNS: Lazy<Vec<ChapterPattern>> = Lazy::new(default_patterns);

/// Outcome of segmenting one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationResult {
    /// Trimmed, non-empty segments
    pub chapters: Vec<String>,
    /// Winning pattern; `None` when the whole text became one segment
    pub pattern_used: Option<&'static str>,
    /// Segments produced by the winning split before filtering
    pub raw_segment_count: usize,
}

/// Normalize line endings and drop a trailing Project Gutenberg licence footer
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let without_footer = match FOOTER.find(&unified) {
        Some(m) => &unified[..m.start()],
        None => unified.as_str(),
    };
    without_footer.trim().to_string()
}

/// Ordered-cascade chapter splitter
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    patterns: Vec<ChapterPattern>,
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSegmenter {
    pub fn new() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.clone(),
        }
    }

    /// Segmenter over a custom registry; order is significant
    pub fn with_patterns(patterns: Vec<ChapterPattern>) -> Self {
        Self { patterns }
    }

    /// Pattern names in match order
    pub fn pattern_names(&self) -> Vec<&'static str> {
        self.patterns.iter().map(|p| p.name).collect()
    }

    pub fn segment(&self, text: &str) -> SegmentationResult {
        let normalized = normalize(text);

        for pattern in &self.patterns {
            let raw = pattern.split(&normalized);
            let raw_segment_count = raw.len();
            let chapters: Vec<String> = raw
                .into_iter()
                .map(str::trim)
                .filter(|s| s.chars().count() >= MIN_SEGMENT_LENGTH)
                .map(str::to_string)
                .collect();

            if chapters.len() > 1 {
                debug!(
                    pattern = pattern.name,
                    raw_segments = raw_segment_count,
                    chapters = chapters.len(),
                    "Chapter pattern matched"
                );
                return SegmentationResult {
                    chapters,
                    pattern_used: Some(pattern.name),
                    raw_segment_count,
                };
            }
        }

        debug!("No chapter pattern matched, returning whole text");
        SegmentationResult {
            chapters: vec![normalized],
            pattern_used: None,
            raw_segment_count: 1,
        }
    }
}
