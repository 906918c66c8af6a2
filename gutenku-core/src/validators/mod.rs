//! Verse validation and haiku quality scoring

pub mod quality_scorer;
pub mod verse_filters;

pub use quality_scorer::{
    Gate, QualityScorer, RejectionStats, ScoreThresholds, ScoreWeights,
};
pub use verse_filters::{
    has_weak_start, is_blacklisted, is_quote_invalid, starts_with_conjunction, VERSE_MAX_LENGTH,
};
