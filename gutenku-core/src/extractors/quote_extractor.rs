//! Quote extraction via a 4-tier fallback chain
//!
//! Tiers run from most to least precise. Each keeps spans whose summed
//! per-word syllables are exactly 5 or 7 and must reach its own minimum
//! yield; otherwise the next tier runs. The chunk tier is terminal: if it
//! under-yields, extraction fails for the chapter.

use crate::nlp::{count_syllables, grammar_score, sentences, words};
use crate::types::{Quote, VersePools};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(Mr|Mrs|Dr|St)\.").expect("valid abbreviation regex"));
static PUNCTUATION_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!,;]+\s+").expect("valid punctuation regex"));
static CLAUSE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!:;,\-—]+\s+").expect("valid clause regex"));
static CHUNK_SEGMENT_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!:;,—]+\s*|\s-+\s").expect("valid chunk segment regex"));

/// Words that open a new clause inside a delimiter-free span
const CLAUSE_OPENERS: &[&str] = &[
    "and", "but", "or", "yet", "so", "while", "when", "where", "because", "though", "although",
    "until", "unless", "whereas", "since",
];

/// Minimum grammar score for a chunk-tier candidate
const CHUNK_MIN_GRAMMAR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Punctuation,
    Sentence,
    Clause,
    Chunk,
}

impl ExtractionTier {
    /// Tiers in fallback order
    pub const ALL: [ExtractionTier; 4] = [
        ExtractionTier::Punctuation,
        ExtractionTier::Sentence,
        ExtractionTier::Clause,
        ExtractionTier::Chunk,
    ];

    pub fn min_yield(self) -> usize {
        match self {
            ExtractionTier::Punctuation | ExtractionTier::Sentence | ExtractionTier::Clause => 6,
            ExtractionTier::Chunk => 12,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExtractionTier::Punctuation => "punctuation",
            ExtractionTier::Sentence => "sentence",
            ExtractionTier::Clause => "clause",
            ExtractionTier::Chunk => "chunk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierAttempt {
    pub tier: ExtractionTier,
    pub yield_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub quotes: Vec<Quote>,
    /// Tier that met its threshold; `None` on failure
    pub tier: Option<ExtractionTier>,
    /// Every tier tried, in order
    pub attempts: Vec<TierAttempt>,
}

impl ExtractionOutcome {
    pub fn is_failure(&self) -> bool {
        self.tier.is_none()
    }

    pub fn pools(&self) -> VersePools {
        VersePools::from_quotes(&self.quotes)
    }
}

fn is_haiku_length(syllables: usize) -> bool {
    syllables == 5 || syllables == 7
}

/// Tag spans with position and syllables, keeping 5s and 7s
fn keep_haiku_spans<'a, I>(spans: I) -> Vec<Quote>
where
    I: IntoIterator<Item = &'a str>,
{
    spans
        .into_iter()
        .map(str::trim)
        .enumerate()
        .filter(|(_, span)| !span.is_empty())
        .filter_map(|(index, span)| {
            let syllables = count_syllables(span);
            is_haiku_length(syllables).then(|| Quote::new(span, index, syllables))
        })
        .collect()
}

fn collapse(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn split_before_openers(clause: &str) -> Vec<String> {
    let mut parts: Vec<Vec<&str>> = vec![Vec::new()];
    for word in clause.split_whitespace() {
        let opener = CLAUSE_OPENERS.contains(&word.to_lowercase().as_str());
        if opener && parts.last().is_some_and(|p| !p.is_empty()) {
            parts.push(Vec::new());
        }
        if let Some(current) = parts.last_mut() {
            current.push(word);
        }
    }
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.join(" "))
        .collect()
}

fn chunk_is_phrase(chunk_words: &[&str], chunk: &str) -> bool {
    let capital_inside = chunk_words
        .iter()
        .skip(1)
        .any(|w| w.chars().next().is_some_and(char::is_uppercase));
    !capital_inside && grammar_score(chunk) >= CHUNK_MIN_GRAMMAR
}

#[derive(Debug, Clone, Default)]
pub struct QuoteExtractor {
    forced_tier: Option<ExtractionTier>,
}

impl QuoteExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run only `tier`, ignoring its threshold (diagnostics)
    pub fn with_forced_tier(tier: ExtractionTier) -> Self {
        Self {
            forced_tier: Some(tier),
        }
    }

    /// Candidate lines of one tier over `text`
    pub fn extract_tier(&self, tier: ExtractionTier, text: &str) -> Vec<Quote> {
        let text = collapse(text);
        match tier {
            ExtractionTier::Punctuation => {
                let protected = ABBREVIATION.replace_all(&text, "$1");
                keep_haiku_spans(PUNCTUATION_SPLIT.split(&protected))
            }
            ExtractionTier::Sentence => keep_haiku_spans(sentences(&text)),
            ExtractionTier::Clause => {
                let clauses: Vec<String> = CLAUSE_SPLIT
                    .split(&text)
                    .flat_map(split_before_openers)
                    .collect();
                keep_haiku_spans(clauses.iter().map(String::as_str))
            }
            ExtractionTier::Chunk => Self::chunks(&text),
        }
    }

    /// Sliding 2-4 word windows that stay inside punctuation boundaries
    fn chunks(text: &str) -> Vec<Quote> {
        let mut quotes = Vec::new();
        let mut position = 0usize;

        for segment in CHUNK_SEGMENT_SPLIT.split(text) {
            let segment_words = words(segment);
            for start in 0..segment_words.len() {
                for size in 2..=4 {
                    let Some(window) = segment_words.get(start..start + size) else {
                        break;
                    };
                    let index = position;
                    position += 1;

                    let chunk = window.join(" ");
                    let syllables = count_syllables(&chunk);
                    if is_haiku_length(syllables) && chunk_is_phrase(window, &chunk) {
                        quotes.push(Quote::new(chunk, index, syllables));
                    }
                }
            }
        }
        quotes
    }

    pub fn extract(&self, chapter: &str) -> ExtractionOutcome {
        if let Some(tier) = self.forced_tier {
            let quotes = self.extract_tier(tier, chapter);
            let yield_count = quotes.len();
            return ExtractionOutcome {
                tier: (yield_count > 0).then_some(tier),
                quotes,
                attempts: vec![TierAttempt { tier, yield_count }],
            };
        }

        let mut attempts = Vec::with_capacity(ExtractionTier::ALL.len());
        for tier in ExtractionTier::ALL {
            let quotes = self.extract_tier(tier, chapter);
            let yield_count = quotes.len();
            attempts.push(TierAttempt { tier, yield_count });

            if yield_count >= tier.min_yield() {
                debug!(tier = tier.name(), quotes = yield_count, "Extraction tier succeeded");
                return ExtractionOutcome {
                    quotes,
                    tier: Some(tier),
                    attempts,
                };
            }
            debug!(
                tier = tier.name(),
                quotes = yield_count,
                required = tier.min_yield(),
                "Extraction tier under-yielded"
            );
        }

        ExtractionOutcome {
            quotes: Vec::new(),
            tier: None,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUNCTUATED: &str = "The cold wind blows hard, the moon rose on the still lake. \
        Soft rain falls on grass; birds sing through the long dark night! \
        Stars shine on the sea, deep snow lies on the high hill.";

    #[test]
    fn test_punctuation_tier_succeeds_first() {
        let outcome = QuoteExtractor::new().extract(PUNCTUATED);

        assert_eq!(outcome.tier, Some(ExtractionTier::Punctuation));
        assert_eq!(outcome.quotes.len(), 6);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.quotes[0].text, "The cold wind blows hard");
        assert_eq!(outcome.quotes[1].syllable_count, 7);
    }

    #[test]
    fn test_source_indices_follow_text_order() {
        let quotes = QuoteExtractor::new().extract(PUNCTUATED).quotes;
        assert!(quotes.windows(2).all(|w| w[0].source_index < w[1].source_index));
    }

    #[test]
    fn test_abbreviations_do_not_split() {
        let quotes = QuoteExtractor::new()
            .extract_tier(ExtractionTier::Punctuation, "Mr. Brown walks home now, then");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].text, "Mr Brown walks home now");
    }

    #[test]
    fn test_clause_tier_splits_before_openers() {
        let quotes = QuoteExtractor::new().extract_tier(
            ExtractionTier::Clause,
            "the moon rose on the still lake while the cold wind blows hard",
        );
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].text, "the moon rose on the still lake");
    }

    #[test]
    fn test_chunk_tier_windows() {
        let quotes = QuoteExtractor::new().extract_tier(ExtractionTier::Chunk, "beautiful yellow silence");
        let texts: Vec<&str> = quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["beautiful yellow", "beautiful yellow silence"]);
        assert_eq!(quotes[1].syllable_count, 7);
    }

    #[test]
    fn test_chunk_tier_rejects_inner_capitals() {
        let quotes = QuoteExtractor::new().extract_tier(ExtractionTier::Chunk, "beautiful Yellow silence");
        assert!(quotes.is_empty());
    }

    #[test]
    fn test_chain_ends_at_chunk_tier() {
        let outcome =
            QuoteExtractor::new().extract("the cold wind blows hard over the still dark lake while the birds sing");

        assert!(outcome.is_failure());
        assert!(outcome.quotes.is_empty());
        let tiers: Vec<ExtractionTier> = outcome.attempts.iter().map(|a| a.tier).collect();
        assert_eq!(tiers, ExtractionTier::ALL.to_vec());
        assert_eq!(tiers.last(), Some(&ExtractionTier::Chunk));
    }

    #[test]
    fn test_forced_tier_runs_alone() {
        let outcome = QuoteExtractor::with_forced_tier(ExtractionTier::Sentence).extract(PUNCTUATED);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].tier, ExtractionTier::Sentence);
    }
}
