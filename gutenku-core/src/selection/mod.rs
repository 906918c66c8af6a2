//! Verse selection from extracted quote pools

pub mod verse_selector;

pub use verse_selector::{SelectionOutcome, SelectionState, VerseSelector, HAIKU_PATTERN};
