//! gutenku-core library interface
//!
//! Turns public-domain book text into scored 5-7-5 haiku:
//! raw text → chapters → quotes → verse pools → selected or evolved candidate.

pub mod config;
pub mod error;
pub mod extractors;
pub mod genetic;
pub mod language;
pub mod nlp;
pub mod parsing;
pub mod selection;
pub mod services;
pub mod types;
pub mod utils;
pub mod validators;

pub use crate::config::EngineConfig;
pub use crate::error::{
    FetchError, GenerationError, GenerationResult, ModelError, ParseError, ValidationError,
    GENERATION_EXHAUSTED_CODE,
};
pub use crate::types::{
    BookMetadata, ChapterContent, HaikuCandidate, ParsedBook, QualityMetrics, Quote, RawBookText,
    VersePools,
};
