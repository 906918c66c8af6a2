//! Source text acquisition and candidate line extraction

pub mod gutenberg_client;
pub mod quote_extractor;

pub use gutenberg_client::GutenbergClient;
pub use quote_extractor::{ExtractionOutcome, ExtractionTier, QuoteExtractor, TierAttempt};
