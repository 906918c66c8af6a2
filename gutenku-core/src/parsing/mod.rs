//! Book text parsing: segmentation, validation and metadata

pub mod book_parser;
pub mod chapter_validator;
pub mod metadata_extractor;
pub mod segmenter;

pub use book_parser::{BookParser, ParsingOptions, ParsingResult, ParsingStats};
pub use chapter_validator::{ChapterValidationResult, ChapterValidator, RejectedChapter, ValidationConfig};
pub use metadata_extractor::{extract_metadata, ExtractedMetadata};
pub use segmenter::{ChapterPattern, MarkerGuard, SegmentationResult, TextSegmenter};
