//! Chapter validation by paragraph density and boilerplate detection

use crate::types::ChapterContent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\*{3}\s*(?:START|END)\s+OF\s+(?:THE\s+)?)?PROJECT\s+GUTENBERG")
        .expect("valid boilerplate regex")
});

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

pub const BOILERPLATE_REASON: &str = "Contains Gutenberg template text";

/// Validation thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_paragraphs: usize,
    pub min_chapters: usize,
    pub exclude_boilerplate: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_paragraphs: 10,
            min_chapters: 8,
            exclude_boilerplate: true,
        }
    }
}

/// Segment that failed validation, with its original position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedChapter {
    pub index: usize,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterValidationResult {
    /// Re-indexed 0..n
    pub valid_chapters: Vec<ChapterContent>,
    pub rejected_chapters: Vec<RejectedChapter>,
    pub total_processed: usize,
}

/// Number of non-blank, blank-line-delimited blocks
pub fn count_paragraphs(text: &str) -> usize {
    PARAGRAPH_BREAK
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .count()
}

pub fn contains_boilerplate(text: &str) -> bool {
    BOILERPLATE.is_match(text)
}

#[derive(Debug, Clone, Default)]
pub struct ChapterValidator {
    config: ValidationConfig,
}

impl ChapterValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    fn rejection_reasons(&self, segment: &str) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.config.exclude_boilerplate && contains_boilerplate(segment) {
            reasons.push(BOILERPLATE_REASON.to_string());
        }
        if count_paragraphs(segment) < self.config.min_paragraphs {
            reasons.push(format!(
                "Insufficient paragraphs (requires {})",
                self.config.min_paragraphs
            ));
        }
        reasons
    }

    pub fn validate<S: AsRef<str>>(&self, segments: &[S]) -> ChapterValidationResult {
        let mut valid_chapters = Vec::new();
        let mut rejected_chapters = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();
            let reasons = self.rejection_reasons(segment);
            if !reasons.is_empty() {
                debug!(index, ?reasons, "Chapter rejected");
                rejected_chapters.push(RejectedChapter { index, reasons });
                continue;
            }

            match ChapterContent::new(segment, valid_chapters.len()) {
                Ok(chapter) => valid_chapters.push(chapter),
                Err(err) => {
                    debug!(index, error = %err, "Chapter rejected");
                    rejected_chapters.push(RejectedChapter {
                        index,
                        reasons: vec!["Failed to create chapter content (too short)".to_string()],
                    });
                }
            }
        }

        ChapterValidationResult {
            valid_chapters,
            rejected_chapters,
            total_processed: segments.len(),
        }
    }
}
