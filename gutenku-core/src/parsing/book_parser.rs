//! Book parsing: metadata extraction, segmentation and chapter validation
//!
//! Problems are reported as structured errors and warnings rather than
//! faults, because a book with some rejected chapters is still useful. Only
//! callers that opt into `fail_on_invalid_book` receive an insufficient
//! chapters error.

use super::chapter_validator::{ChapterValidator, ValidationConfig};
use super::metadata_extractor::extract_metadata;
use super::segmenter::TextSegmenter;
use crate::error::ParseError;
use crate::types::{BookMetadata, ParsedBook, RawBookText};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ParsingOptions {
    pub validation: ValidationConfig,
    /// Raise `InsufficientChapters` instead of returning an invalid result
    pub fail_on_invalid_book: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsingStats {
    pub raw_segments: usize,
    pub valid_chapters: usize,
    pub rejected_chapters: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingResult {
    /// Present only for valid books
    pub parsed_book: Option<ParsedBook>,
    pub errors: Vec<ParseError>,
    pub warnings: Vec<String>,
    pub pattern_used: Option<&'static str>,
    pub stats: ParsingStats,
}

impl ParsingResult {
    pub fn is_valid(&self) -> bool {
        self.parsed_book.is_some() && self.errors.is_empty()
    }

    fn failed(error: ParseError) -> Self {
        Self {
            parsed_book: None,
            errors: vec![error],
            warnings: Vec::new(),
            pattern_used: None,
            stats: ParsingStats::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookParser {
    segmenter: TextSegmenter,
    options: ParsingOptions,
}

impl BookParser {
    pub fn new(options: ParsingOptions) -> Self {
        Self {
            segmenter: TextSegmenter::new(),
            options,
        }
    }

    pub fn with_segmenter(segmenter: TextSegmenter, options: ParsingOptions) -> Self {
        Self { segmenter, options }
    }

    pub fn parse(&self, raw: &RawBookText) -> Result<ParsingResult, ParseError> {
        let book_id = raw.source_id();
        let metadata = extract_metadata(raw.content());

        let Some(title) = metadata.title else {
            warn!(book_id, "Title not found");
            return Ok(ParsingResult::failed(ParseError::Metadata { field: "title", book_id }));
        };
        let Some(author) = metadata.author else {
            warn!(book_id, "Author not found");
            return Ok(ParsingResult::failed(ParseError::Metadata { field: "author", book_id }));
        };

        let segmentation = self.segmenter.segment(raw.content());
        let mut warnings = Vec::new();
        if segmentation.pattern_used.is_none() {
            warnings.push("No chapter pattern matched, using entire text as single chapter".to_string());
        }

        let validator = ChapterValidator::new(self.options.validation.clone());
        let validation = validator.validate(&segmentation.chapters);
        for rejected in &validation.rejected_chapters {
            warnings.push(format!(
                "Chapter {} rejected: {}",
                rejected.index,
                rejected.reasons.join(", ")
            ));
        }

        let stats = ParsingStats {
            raw_segments: segmentation.raw_segment_count,
            valid_chapters: validation.valid_chapters.len(),
            rejected_chapters: validation.rejected_chapters.len(),
        };

        info!(
            book_id,
            title = %title,
            pattern = segmentation.pattern_used.unwrap_or("none"),
            raw = stats.raw_segments,
            valid = stats.valid_chapters,
            rejected = stats.rejected_chapters,
            "Parsed book"
        );

        let required = self.options.validation.min_chapters;
        if stats.valid_chapters < required {
            let error = ParseError::InsufficientChapters {
                found: stats.valid_chapters,
                required,
            };
            if self.options.fail_on_invalid_book {
                return Err(error);
            }
            return Ok(ParsingResult {
                parsed_book: None,
                errors: vec![error],
                warnings,
                pattern_used: segmentation.pattern_used,
                stats,
            });
        }

        Ok(ParsingResult {
            parsed_book: Some(ParsedBook {
                metadata: BookMetadata {
                    title,
                    author,
                    source_id: book_id,
                },
                chapters: validation.valid_chapters,
            }),
            errors: Vec::new(),
            warnings,
            pattern_used: segmentation.pattern_used,
            stats,
        })
    }
}
