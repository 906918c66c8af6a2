//! Bigram/trigram transition model
//!
//! Counts word transitions inside sentences. Coordinating conjunctions are
//! dropped before counting so they never become n-gram endpoints. Row totals
//! are cached per context; the vocabulary feeds Laplace smoothing.

use crate::nlp::lexicon::is_fanboys;
use crate::nlp::{lowercase_words, sentences};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Additive smoothing constant
pub const SMOOTHING_ALPHA: f64 = 0.01;

pub(crate) type TransitionTable = HashMap<String, HashMap<String, u64>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageModel {
    pub(crate) bigrams: TransitionTable,
    pub(crate) trigrams: TransitionTable,
    pub(crate) bigram_totals: HashMap<String, u64>,
    pub(crate) trigram_totals: HashMap<String, u64>,
    pub(crate) total_bigrams: u64,
    pub(crate) total_trigrams: u64,
    pub(crate) vocabulary: HashSet<String>,
}

fn content_words(text: &str) -> Vec<String> {
    lowercase_words(text)
        .into_iter()
        .filter(|w| !is_fanboys(w))
        .collect()
}

fn add(table: &mut TransitionTable, totals: &mut HashMap<String, u64>, context: String, next: &str) {
    *totals.entry(context.clone()).or_insert(0) += 1;
    *table
        .entry(context)
        .or_default()
        .entry(next.to_string())
        .or_insert(0) += 1;
}

fn ratio(table: &TransitionTable, totals: &HashMap<String, u64>, context: &str, next: &str) -> f64 {
    let Some(total) = totals.get(context).copied().filter(|t| *t > 0) else {
        return 0.0;
    };
    let count = table
        .get(context)
        .and_then(|row| row.get(next))
        .copied()
        .unwrap_or(0);
    count as f64 / total as f64
}

impl LanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until something has been trained or loaded
    pub fn is_empty(&self) -> bool {
        self.bigrams.is_empty() && self.trigrams.is_empty()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn total_bigrams(&self) -> u64 {
        self.total_bigrams
    }

    pub fn total_trigrams(&self) -> u64 {
        self.total_trigrams
    }

    /// Accumulate transition counts from `text`
    pub fn train(&mut self, text: &str) {
        let flattened = text.replace('\n', " ");
        let mut sentence_count = 0usize;

        for sentence in sentences(&flattened) {
            let words = content_words(sentence);
            if words.is_empty() {
                continue;
            }
            sentence_count += 1;
            self.vocabulary.extend(words.iter().cloned());

            for pair in words.windows(2) {
                add(&mut self.bigrams, &mut self.bigram_totals, pair[0].clone(), &pair[1]);
                self.total_bigrams += 1;
            }
            for triple in words.windows(3) {
                let context = format!("{} {}", triple[0], triple[1]);
                add(&mut self.trigrams, &mut self.trigram_totals, context, &triple[2]);
                self.total_trigrams += 1;
            }
        }

        debug!(
            sentences = sentence_count,
            vocabulary = self.vocabulary.len(),
            bigrams = self.total_bigrams,
            trigrams = self.total_trigrams,
            "Trained language model"
        );
    }

    fn bigram_key(from: &str, to: &str) -> Option<(String, String)> {
        let last = content_words(from).pop()?;
        let first = content_words(to).into_iter().next()?;
        Some((last, first))
    }

    fn trigram_key(from: &str, to: &str) -> Option<(String, String)> {
        let words = content_words(from);
        if words.len() < 2 {
            return None;
        }
        let context = format!("{} {}", words[words.len() - 2], words[words.len() - 1]);
        let first = content_words(to).into_iter().next()?;
        Some((context, first))
    }

    /// P(first word of `to` | last word of `from`); 0 when unseen
    pub fn evaluate_transition(&self, from: &str, to: &str) -> f64 {
        match Self::bigram_key(from, to) {
            Some((context, next)) => ratio(&self.bigrams, &self.bigram_totals, &context, &next),
            None => 0.0,
        }
    }

    /// P(first word of `to` | last two words of `from`); 0 when unseen
    pub fn evaluate_trigram_transition(&self, from: &str, to: &str) -> f64 {
        match Self::trigram_key(from, to) {
            Some((context, next)) => ratio(&self.trigrams, &self.trigram_totals, &context, &next),
            None => 0.0,
        }
    }

    fn smoothed(&self, table: &TransitionTable, totals: &HashMap<String, u64>, key: Option<(String, String)>) -> f64 {
        let (count, total) = match key {
            Some((context, next)) => (
                table
                    .get(&context)
                    .and_then(|row| row.get(&next))
                    .copied()
                    .unwrap_or(0),
                totals.get(&context).copied().unwrap_or(0),
            ),
            None => (0, 0),
        };
        let vocabulary = self.vocabulary.len().max(1) as f64;
        (count as f64 + SMOOTHING_ALPHA) / (total as f64 + SMOOTHING_ALPHA * vocabulary)
    }

    /// Laplace-smoothed bigram probability; always > 0
    pub fn evaluate_transition_smoothed(&self, from: &str, to: &str) -> f64 {
        self.smoothed(&self.bigrams, &self.bigram_totals, Self::bigram_key(from, to))
    }

    /// Laplace-smoothed trigram probability; always > 0
    pub fn evaluate_trigram_transition_smoothed(&self, from: &str, to: &str) -> f64 {
        self.smoothed(&self.trigrams, &self.trigram_totals, Self::trigram_key(from, to))
    }

    /// Bigram score when non-zero, else the trigram score
    pub fn evaluate_with_backoff(&self, from: &str, to: &str) -> f64 {
        let bigram = self.evaluate_transition(from, to);
        if bigram > 0.0 {
            bigram
        } else {
            self.evaluate_trigram_transition(from, to)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> LanguageModel {
        let mut model = LanguageModel::new();
        model.train("The old pond lies still. The old frog jumps.\nThe old pond shines and the water sleeps.");
        model
    }

    #[test]
    fn test_transition_ratio() {
        let model = trained();
        // "old" is followed by pond twice and frog once
        assert!((model.evaluate_transition("an old", "pond") - 2.0 / 3.0).abs() < 1e-9);
        assert!((model.evaluate_transition("the OLD", "Frog leaps") - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_unseen_is_zero() {
        let model = trained();
        assert_eq!(model.evaluate_transition("old", "moon"), 0.0);
        assert_eq!(model.evaluate_transition("unknown", "pond"), 0.0);
        assert_eq!(model.evaluate_transition("", "pond"), 0.0);
        assert_eq!(model.evaluate_trigram_transition("old", "pond"), 0.0);
    }

    #[test]
    fn test_conjunctions_are_not_endpoints() {
        let model = trained();
        // "shines and the" counts as shines -> the
        assert_eq!(model.evaluate_transition("shines", "the"), 1.0);
        assert_eq!(model.evaluate_transition("shines", "and"), 0.0);
        assert!(!model.vocabulary.contains("and"));
    }

    #[test]
    fn test_trigram_transition() {
        let model = trained();
        assert!((model.evaluate_trigram_transition("the old", "pond") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_smoothed_orders_known_above_unknown() {
        let model = trained();
        let known = model.evaluate_transition_smoothed("old", "pond");
        let unknown = model.evaluate_transition_smoothed("old", "moon");
        assert!(known > unknown);
        assert!(unknown > 0.0);

        let known_tri = model.evaluate_trigram_transition_smoothed("the old", "frog");
        let unknown_tri = model.evaluate_trigram_transition_smoothed("the old", "moon");
        assert!(known_tri > unknown_tri && unknown_tri > 0.0);
    }

    #[test]
    fn test_smoothed_positive_on_empty_model_and_input() {
        let model = LanguageModel::new();
        let p = model.evaluate_transition_smoothed("", "");
        assert!(p > 0.0 && p.is_finite());
        assert!(trained().evaluate_trigram_transition_smoothed("", "") > 0.0);
    }

    #[test]
    fn test_backoff_uses_trigram_when_bigram_missing() {
        let mut model = LanguageModel::new();
        model.train("red fox runs.");
        model.bigrams.clear();
        model.bigram_totals.clear();
        assert_eq!(model.evaluate_transition("red fox", "runs"), 0.0);
        assert_eq!(model.evaluate_with_backoff("red fox", "runs"), 1.0);
    }
}
