//! Lightweight English text helpers
//!
//! Heuristic only: syllable counting, sentiment polarity, part-of-speech
//! guesses and first-sound coding are tuned for short literary lines.

pub mod grammar;
pub mod lexicon;
pub mod phonetics;
pub mod sentiment;
pub mod syllables;
pub mod tokenizer;

pub use grammar::{grammar_score, tag_words, PosTag};
pub use phonetics::{alliteration_score, initial_sound};
pub use sentiment::sentiment_score;
pub use syllables::{count_syllables, count_word_syllables};
pub use tokenizer::{lowercase_words, sentences, words};
