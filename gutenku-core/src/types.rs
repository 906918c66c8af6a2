//! Core domain types
//!
//! Values flowing through the pipeline:
//! raw text → chapters → quotes → verse pools → scored candidates.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Minimum characters a validated chapter must hold
pub const MIN_CHAPTER_LENGTH: usize = 100;

// ============================================================================
// Book Types
// ============================================================================

/// Unparsed text of one source book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBookText {
    content: String,
    source_id: i64,
}

impl RawBookText {
    pub fn new(content: impl Into<String>, source_id: i64) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        if source_id <= 0 {
            return Err(ValidationError::InvalidSourceId(source_id));
        }
        Ok(Self { content, source_id })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_id(&self) -> i64 {
        self.source_id
    }
}

/// Chapter that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterContent {
    content: String,
    index: usize,
}

impl ChapterContent {
    pub fn new(content: impl Into<String>, index: usize) -> Result<Self, ValidationError> {
        let content = content.into();
        let length = content.trim().chars().count();
        if length < MIN_CHAPTER_LENGTH {
            return Err(ValidationError::ChapterTooShort {
                length,
                minimum: MIN_CHAPTER_LENGTH,
            });
        }
        Ok(Self { content, index })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Title, author and source id of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub source_id: i64,
}

/// Successfully parsed book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBook {
    pub metadata: BookMetadata,
    pub chapters: Vec<ChapterContent>,
}

// ============================================================================
// Verse Types
// ============================================================================

/// Candidate line extracted from a chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    /// Position in the source text; selection ordering depends on it
    pub source_index: usize,
    pub syllable_count: usize,
}

impl Quote {
    pub fn new(text: impl Into<String>, source_index: usize, syllable_count: usize) -> Self {
        Self {
            text: text.into(),
            source_index,
            syllable_count,
        }
    }
}

/// Syllable-bucketed quotes forming the genetic search alphabet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersePools {
    pub five_syllable: Vec<Quote>,
    pub seven_syllable: Vec<Quote>,
}

impl VersePools {
    /// Bucket quotes by syllable count, dropping everything but 5 and 7
    pub fn from_quotes(quotes: &[Quote]) -> Self {
        let mut pools = Self::default();
        for quote in quotes {
            match quote.syllable_count {
                5 => pools.five_syllable.push(quote.clone()),
                7 => pools.seven_syllable.push(quote.clone()),
                _ => {}
            }
        }
        pools
    }

    /// Total quotes across both pools
    pub fn total(&self) -> usize {
        self.five_syllable.len() + self.seven_syllable.len()
    }
}

// ============================================================================
// Scoring Types
// ============================================================================

/// Per-dimension quality measurements of a 3-line candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Nature vocabulary occurrences
    pub nature_words: usize,
    /// Content words repeated across lines
    pub repeated_words: usize,
    /// Lines opening with a pronoun/determiner
    pub weak_starts: usize,
    /// Lines hitting the verse blacklist
    pub blacklisted_verses: usize,
    /// Capitalized names inside lines
    pub proper_nouns: usize,
    /// Lines at or above the length cap
    pub long_verses: usize,
    pub sentiment: f64,
    pub grammar: f64,
    pub uniqueness: f64,
    pub alliteration: f64,
    pub verse_distance: f64,
    pub line_length_balance: f64,
    pub imagery_density: f64,
    pub semantic_coherence: f64,
    pub verb_presence: f64,
    pub markov_flow: f64,
    pub trigram_flow: f64,
    pub total_score: f64,
}

/// Scored 3-line haiku candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaikuCandidate {
    pub verses: [String; 3],
    pub source_indices: [usize; 3],
    pub metrics: QualityMetrics,
    pub fitness: f64,
}

impl HaikuCandidate {
    pub fn verses(&self) -> Vec<String> {
        self.verses.to_vec()
    }
}
