//! Quality Scorer
//!
//! Computes the composite fitness of a 3-line haiku candidate and evaluates
//! the hard gates used during verse selection.
//!
//! # Soft Scoring vs Hard Gating
//! Every metric contributes to `total_score` through `ScoreWeights`. A metric
//! whose threshold in `ScoreThresholds` is above 0 additionally acts as a gate:
//! candidates below it are rejected during selection instead of scoring lower.
//!
//! # Scoring Algorithm
//! - **Counts** (per occurrence):
//!   - Nature words: +2
//!   - Repeated content words: -2
//!   - Weak starts: -2
//!   - Blacklisted verses: -3
//!   - Proper nouns: -2
//!   - Long verses: -3
//! - **Bounded scores** [0, 1]:
//!   - Sentiment: (s - 0.5) × 4
//!   - Grammar: × 1.5
//!   - Uniqueness: × 2
//!   - Alliteration: × 1.5
//!   - Verse distance: × 4
//! - **Flow** (language model, non-negative):
//!   - Markov (bigram): × 0.5
//!   - Trigram: × 0.2
//! - **Lexical** (weight 0 unless `ScoreWeights::with_lexical`):
//!   - Line length balance, imagery density, semantic coherence, verb presence
//!
//! # Example
//! ```rust,ignore
//! use gutenku_core::validators::QualityScorer;
//!
//! let scorer = QualityScorer::new(Some(model));
//! let candidate = scorer.score(verses, [3, 9, 14], 40);
//! println!("fitness: {:.2}", candidate.fitness);
//! ```

use crate::language::{FlowMode, LanguageModel};
use crate::nlp::grammar::count_verbs;
use crate::nlp::lexicon::{is_allowed_repeat, is_common_name, is_nature_word, is_sensory_word};
use crate::nlp::{alliteration_score, grammar_score, lowercase_words, sentiment_score, words};
use crate::types::{HaikuCandidate, QualityMetrics};
use crate::validators::verse_filters::{has_weak_start, is_blacklisted, is_too_long};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Sensory words needed for full imagery density
const IMAGERY_SATURATION: f64 = 6.0;

/// Verbs needed for full verb presence
const VERB_SATURATION: f64 = 3.0;

// ============================================================================
// Weights
// ============================================================================

/// Weights combining metrics into `total_score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub nature: f64,
    pub repeated: f64,
    pub weak_start: f64,
    pub blacklisted: f64,
    pub proper_noun: f64,
    pub long_verse: f64,
    /// Applied to (sentiment - 0.5)
    pub sentiment: f64,
    pub grammar: f64,
    pub trigram: f64,
    pub markov: f64,
    pub uniqueness: f64,
    pub alliteration: f64,
    pub verse_distance: f64,
    pub line_length_balance: f64,
    pub imagery_density: f64,
    pub semantic_coherence: f64,
    pub verb_presence: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            nature: 2.0,
            repeated: -2.0,
            weak_start: -2.0,
            blacklisted: -3.0,
            proper_noun: -2.0,
            long_verse: -3.0,
            sentiment: 4.0,
            grammar: 1.5,
            trigram: 0.2,
            markov: 0.5,
            uniqueness: 2.0,
            alliteration: 1.5,
            verse_distance: 4.0,
            line_length_balance: 0.0,
            imagery_density: 0.0,
            semantic_coherence: 0.0,
            verb_presence: 0.0,
        }
    }
}

impl ScoreWeights {
    /// Default weights with the lexical metrics switched on
    pub fn with_lexical() -> Self {
        Self {
            line_length_balance: 1.5,
            imagery_density: 1.5,
            semantic_coherence: 2.0,
            verb_presence: 1.0,
            ..Self::default()
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Hard gate minimums; a gate is active when its value is above 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreThresholds {
    pub sentiment: f64,
    pub markov: f64,
    pub trigram: f64,
    pub grammar: f64,
    pub uniqueness: f64,
    pub alliteration: f64,
    pub verse_distance: f64,
    pub line_length_balance: f64,
    pub imagery_density: f64,
    pub semantic_coherence: f64,
    pub verb_presence: f64,
    /// Maximum repeated content words across selected lines (0 = unlimited)
    pub max_repeated_words: usize,
    pub allow_weak_start: bool,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            sentiment: 0.5,
            markov: 0.1,
            trigram: 0.5,
            grammar: 0.3,
            uniqueness: 0.6,
            alliteration: 0.2,
            verse_distance: 0.05,
            line_length_balance: 0.5,
            imagery_density: 0.0,
            semantic_coherence: 0.0,
            verb_presence: 0.3,
            max_repeated_words: 0,
            allow_weak_start: false,
        }
    }
}

impl ScoreThresholds {
    /// Every gate off, weak starts allowed
    pub fn disabled() -> Self {
        Self {
            sentiment: 0.0,
            markov: 0.0,
            trigram: 0.0,
            grammar: 0.0,
            uniqueness: 0.0,
            alliteration: 0.0,
            verse_distance: 0.0,
            line_length_balance: 0.0,
            imagery_density: 0.0,
            semantic_coherence: 0.0,
            verb_presence: 0.0,
            max_repeated_words: 0,
            allow_weak_start: true,
        }
    }
}

/// Gate that rejected a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Basic,
    Sentiment,
    Grammar,
    RepeatedWords,
    Markov,
    Trigram,
    Alliteration,
    Uniqueness,
    VerseDistance,
    LineLengthBalance,
    ImageryDensity,
    SemanticCoherence,
    VerbPresence,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gate::Basic => "basic",
            Gate::Sentiment => "sentiment",
            Gate::Grammar => "grammar",
            Gate::RepeatedWords => "repeated_words",
            Gate::Markov => "markov",
            Gate::Trigram => "trigram",
            Gate::Alliteration => "alliteration",
            Gate::Uniqueness => "uniqueness",
            Gate::VerseDistance => "verse_distance",
            Gate::LineLengthBalance => "line_length_balance",
            Gate::ImageryDensity => "imagery_density",
            Gate::SemanticCoherence => "semantic_coherence",
            Gate::VerbPresence => "verb_presence",
        };
        f.write_str(name)
    }
}

/// Rejection counters per gate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionStats {
    pub total: u64,
    pub by_gate: HashMap<Gate, u64>,
}

impl RejectionStats {
    pub fn record(&mut self, gate: Gate) {
        self.total += 1;
        *self.by_gate.entry(gate).or_insert(0) += 1;
    }

    pub fn count(&self, gate: Gate) -> u64 {
        self.by_gate.get(&gate).copied().unwrap_or(0)
    }

    pub fn merge(&mut self, other: &RejectionStats) {
        self.total += other.total;
        for (gate, count) in &other.by_gate {
            *self.by_gate.entry(*gate).or_insert(0) += count;
        }
    }
}

// ============================================================================
// Metric helpers
// ============================================================================

/// Nature vocabulary occurrences across all lines
pub fn count_nature_words(lines: &[&str]) -> usize {
    lines
        .iter()
        .flat_map(|line| lowercase_words(line))
        .filter(|word| is_nature_word(word))
        .count()
}

/// Extra occurrences of content words seen more than once across lines
pub fn count_repeated_words(lines: &[&str]) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in lines.iter().flat_map(|line| lowercase_words(line)) {
        if !is_allowed_repeat(&word) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    counts.values().filter(|n| **n > 1).map(|n| n - 1).sum()
}

pub fn count_weak_starts(lines: &[&str]) -> usize {
    lines.iter().filter(|line| has_weak_start(line)).count()
}

/// Capitalized words past the first of each line (other than "I"),
/// plus any known given name
pub fn count_proper_nouns(lines: &[&str]) -> usize {
    lines
        .iter()
        .map(|line| {
            words(line)
                .into_iter()
                .enumerate()
                .filter(|(position, word)| {
                    if is_common_name(word) {
                        return true;
                    }
                    *position > 0
                        && *word != "I"
                        && word.chars().next().is_some_and(|c| c.is_uppercase())
                })
                .count()
        })
        .sum()
}

/// Unique words over total words, 0 for empty input
pub fn word_uniqueness(lines: &[&str]) -> f64 {
    let all: Vec<String> = lines.iter().flat_map(|line| lowercase_words(line)).collect();
    if all.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = all.iter().collect();
    unique.len() as f64 / all.len() as f64
}

/// How far apart the lines sit in the source: `max(0, 1 - span/total)`
pub fn verse_distance(indices: &[usize], total_quotes: usize) -> f64 {
    if indices.len() < 2 || total_quotes <= 1 {
        return 1.0;
    }
    let (Some(min), Some(max)) = (indices.iter().min(), indices.iter().max()) else {
        return 1.0;
    };
    let span = (max - min) as f64;
    (1.0 - span / total_quotes as f64).max(0.0)
}

/// `max(0, 1 - coefficient of variation)` of per-line word counts
pub fn line_length_balance(lines: &[&str]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    let counts: Vec<f64> = lines.iter().map(|line| words(line).len() as f64).collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    (1.0 - variance.sqrt() / mean).max(0.0)
}

pub fn imagery_density(lines: &[&str]) -> f64 {
    let sensory = lines
        .iter()
        .flat_map(|line| lowercase_words(line))
        .filter(|word| is_sensory_word(word))
        .count();
    (sensory as f64 / IMAGERY_SATURATION).min(1.0)
}

/// Mean Jaccard similarity of line pairs over words longer than 2 characters
pub fn semantic_coherence(lines: &[&str]) -> f64 {
    let sets: Vec<HashSet<String>> = lines
        .iter()
        .map(|line| {
            lowercase_words(line)
                .into_iter()
                .filter(|word| word.chars().count() > 2)
                .collect()
        })
        .collect();
    let mut pairs = 0usize;
    let mut total = 0.0;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            pairs += 1;
            let union = sets[i].union(&sets[j]).count();
            if union > 0 {
                total += sets[i].intersection(&sets[j]).count() as f64 / union as f64;
            }
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

pub fn verb_presence(lines: &[&str]) -> f64 {
    let verbs: usize = lines.iter().map(|line| count_verbs(line)).sum();
    (verbs as f64 / VERB_SATURATION).min(1.0)
}

fn mean_by<F: Fn(&str) -> f64>(lines: &[&str], f: F) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    lines.iter().map(|line| f(line)).sum::<f64>() / lines.len() as f64
}

// ============================================================================
// Scorer
// ============================================================================

/// Quality Scorer
///
/// Shares a read-only language model with other scorers; flow metrics are 0
/// when no trained model is present.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    model: Option<Arc<LanguageModel>>,
    weights: ScoreWeights,
    flow_mode: FlowMode,
}

impl QualityScorer {
    /// Create scorer with default weights and raw flow
    pub fn new(model: Option<Arc<LanguageModel>>) -> Self {
        Self {
            model,
            weights: ScoreWeights::default(),
            flow_mode: FlowMode::Raw,
        }
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_flow_mode(mut self, flow_mode: FlowMode) -> Self {
        self.flow_mode = flow_mode;
        self
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// True when a trained model backs the flow metrics
    pub fn has_model(&self) -> bool {
        self.model.as_ref().is_some_and(|model| !model.is_empty())
    }

    fn trained_model(&self) -> Option<&LanguageModel> {
        self.model.as_deref().filter(|model| !model.is_empty())
    }

    pub fn markov_flow(&self, lines: &[&str]) -> f64 {
        self.trained_model()
            .map(|model| model.bigram_flow(lines, self.flow_mode))
            .unwrap_or(0.0)
    }

    pub fn trigram_flow(&self, lines: &[&str]) -> f64 {
        self.trained_model()
            .map(|model| model.trigram_flow(lines, self.flow_mode))
            .unwrap_or(0.0)
    }

    /// Measure every dimension and combine into `total_score`
    pub fn measure(&self, lines: &[&str], indices: &[usize], total_quotes: usize) -> QualityMetrics {
        let mut metrics = QualityMetrics {
            nature_words: count_nature_words(lines),
            repeated_words: count_repeated_words(lines),
            weak_starts: count_weak_starts(lines),
            blacklisted_verses: lines.iter().filter(|line| is_blacklisted(line)).count(),
            proper_nouns: count_proper_nouns(lines),
            long_verses: lines.iter().filter(|line| is_too_long(line)).count(),
            sentiment: mean_by(lines, sentiment_score),
            grammar: mean_by(lines, grammar_score),
            uniqueness: word_uniqueness(lines),
            alliteration: alliteration_score(&lines.join(" ")),
            verse_distance: verse_distance(indices, total_quotes),
            line_length_balance: line_length_balance(lines),
            imagery_density: imagery_density(lines),
            semantic_coherence: semantic_coherence(lines),
            verb_presence: verb_presence(lines),
            markov_flow: self.markov_flow(lines),
            trigram_flow: self.trigram_flow(lines),
            total_score: 0.0,
        };
        metrics.total_score = self.total_score(&metrics);

        debug!(
            total = metrics.total_score,
            nature = metrics.nature_words,
            repeated = metrics.repeated_words,
            sentiment = metrics.sentiment,
            grammar = metrics.grammar,
            markov = metrics.markov_flow,
            trigram = metrics.trigram_flow,
            uniqueness = metrics.uniqueness,
            verse_distance = metrics.verse_distance,
            "Candidate scored"
        );

        metrics
    }

    /// Weighted sum of all dimensions
    pub fn total_score(&self, m: &QualityMetrics) -> f64 {
        let w = &self.weights;
        m.nature_words as f64 * w.nature
            + m.repeated_words as f64 * w.repeated
            + m.weak_starts as f64 * w.weak_start
            + m.blacklisted_verses as f64 * w.blacklisted
            + m.proper_nouns as f64 * w.proper_noun
            + m.long_verses as f64 * w.long_verse
            + (m.sentiment - 0.5) * w.sentiment
            + m.grammar * w.grammar
            + m.trigram_flow * w.trigram
            + m.markov_flow * w.markov
            + m.uniqueness * w.uniqueness
            + m.alliteration * w.alliteration
            + m.verse_distance * w.verse_distance
            + m.line_length_balance * w.line_length_balance
            + m.imagery_density * w.imagery_density
            + m.semantic_coherence * w.semantic_coherence
            + m.verb_presence * w.verb_presence
    }

    /// Score a complete candidate
    pub fn score(
        &self,
        verses: [String; 3],
        source_indices: [usize; 3],
        total_quotes: usize,
    ) -> HaikuCandidate {
        let lines: Vec<&str> = verses.iter().map(String::as_str).collect();
        let metrics = self.measure(&lines, &source_indices, total_quotes);
        let fitness = metrics.total_score;
        HaikuCandidate {
            verses,
            source_indices,
            metrics,
            fitness,
        }
    }

    /// Per-dimension report suitable for logs and CLI output
    pub fn report(&self, metrics: &QualityMetrics) -> serde_json::Value {
        json!({
            "total_score": metrics.total_score,
            "counts": {
                "nature_words": metrics.nature_words,
                "repeated_words": metrics.repeated_words,
                "weak_starts": metrics.weak_starts,
                "blacklisted_verses": metrics.blacklisted_verses,
                "proper_nouns": metrics.proper_nouns,
                "long_verses": metrics.long_verses,
            },
            "scores": {
                "sentiment": metrics.sentiment,
                "grammar": metrics.grammar,
                "uniqueness": metrics.uniqueness,
                "alliteration": metrics.alliteration,
                "verse_distance": metrics.verse_distance,
            },
            "flow": {
                "markov": metrics.markov_flow,
                "trigram": metrics.trigram_flow,
                "model_loaded": self.has_model(),
            },
            "lexical": {
                "line_length_balance": metrics.line_length_balance,
                "imagery_density": metrics.imagery_density,
                "semantic_coherence": metrics.semantic_coherence,
                "verb_presence": metrics.verb_presence,
            },
        })
    }

    // ------------------------------------------------------------------------
    // Gates
    // ------------------------------------------------------------------------

    /// Gates on a single line: sentiment and grammar
    pub fn line_gate(&self, line: &str, thresholds: &ScoreThresholds) -> Option<Gate> {
        if thresholds.sentiment > 0.0 && sentiment_score(line) < thresholds.sentiment {
            return Some(Gate::Sentiment);
        }
        if thresholds.grammar > 0.0 && grammar_score(line) < thresholds.grammar {
            return Some(Gate::Grammar);
        }
        None
    }

    /// Gates on the running set of selected lines plus the candidate
    ///
    /// Flow gates need at least two lines and a trained model.
    pub fn sequence_gate(&self, lines: &[&str], thresholds: &ScoreThresholds) -> Option<Gate> {
        if thresholds.max_repeated_words > 0
            && count_repeated_words(lines) > thresholds.max_repeated_words
        {
            return Some(Gate::RepeatedWords);
        }
        if lines.len() >= 2 && self.has_model() {
            if thresholds.markov > 0.0 && self.markov_flow(lines) < thresholds.markov {
                return Some(Gate::Markov);
            }
            if thresholds.trigram > 0.0 && self.trigram_flow(lines) < thresholds.trigram {
                return Some(Gate::Trigram);
            }
        }
        if lines.len() >= 2
            && thresholds.alliteration > 0.0
            && alliteration_score(&lines.join(" ")) < thresholds.alliteration
        {
            return Some(Gate::Alliteration);
        }
        if lines.len() == 3
            && thresholds.uniqueness > 0.0
            && word_uniqueness(lines) < thresholds.uniqueness
        {
            return Some(Gate::Uniqueness);
        }
        None
    }

    /// Gates on the finished haiku
    pub fn full_haiku_gate(
        &self,
        lines: &[&str],
        indices: &[usize],
        total_quotes: usize,
        thresholds: &ScoreThresholds,
    ) -> Option<Gate> {
        if thresholds.verse_distance > 0.0
            && verse_distance(indices, total_quotes) < thresholds.verse_distance
        {
            return Some(Gate::VerseDistance);
        }
        if thresholds.line_length_balance > 0.0
            && line_length_balance(lines) < thresholds.line_length_balance
        {
            return Some(Gate::LineLengthBalance);
        }
        if thresholds.imagery_density > 0.0 && imagery_density(lines) < thresholds.imagery_density
        {
            return Some(Gate::ImageryDensity);
        }
        if thresholds.semantic_coherence > 0.0
            && semantic_coherence(lines) < thresholds.semantic_coherence
        {
            return Some(Gate::SemanticCoherence);
        }
        if thresholds.verb_presence > 0.0 && verb_presence(lines) < thresholds.verb_presence {
            return Some(Gate::VerbPresence);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pond() -> [String; 3] {
        [
            "an old silent pond".to_string(),
            "a frog jumps into the pond".to_string(),
            "silence returns now".to_string(),
        ]
    }

    #[test]
    fn test_counts() {
        let lines = ["the frog and the pond", "a pond of moss"];
        assert_eq!(count_nature_words(&lines), 4);
        assert_eq!(count_repeated_words(&lines), 1);
        assert_eq!(count_weak_starts(&["it rains", "rain falls", "they go"]), 2);
        assert_eq!(count_proper_nouns(&["walking with Elizabeth", "I go"]), 1);
    }

    #[test]
    fn test_verse_distance() {
        assert_eq!(verse_distance(&[4], 10), 1.0);
        assert_eq!(verse_distance(&[1, 2, 3], 1), 1.0);
        assert!((verse_distance(&[0, 5, 10], 20) - 0.5).abs() < 1e-9);
        assert_eq!(verse_distance(&[0, 50], 20), 0.0);
    }

    #[test]
    fn test_line_length_balance() {
        assert!((line_length_balance(&["a b c", "d e f", "g h i"]) - 1.0).abs() < 1e-9);
        assert!(line_length_balance(&["a", "b c d e f g h", "i"]) < 0.5);
        assert_eq!(line_length_balance(&[]), 0.0);
    }

    #[test]
    fn test_semantic_coherence() {
        let same = semantic_coherence(&["silent pond", "silent pond", "silent pond"]);
        assert!((same - 1.0).abs() < 1e-9);
        assert_eq!(semantic_coherence(&["frog", "moon", "snow"]), 0.0);
    }

    #[test]
    fn test_uniqueness() {
        assert_eq!(word_uniqueness(&["a b", "c d"]), 1.0);
        assert_eq!(word_uniqueness(&["a a", "a a"]), 0.25);
        assert_eq!(word_uniqueness(&[]), 0.0);
    }

    #[test]
    fn test_score_without_model_has_zero_flow() {
        let scorer = QualityScorer::new(None);
        let candidate = scorer.score(pond(), [0, 1, 2], 3);
        assert_eq!(candidate.metrics.markov_flow, 0.0);
        assert_eq!(candidate.metrics.trigram_flow, 0.0);
        assert_eq!(candidate.fitness, candidate.metrics.total_score);
        assert!(candidate.metrics.nature_words >= 2);
    }

    #[test]
    fn test_lexical_weights_change_total() {
        let base = QualityScorer::new(None);
        let lexical = QualityScorer::new(None).with_weights(ScoreWeights::with_lexical());
        let a = base.score(pond(), [0, 1, 2], 3);
        let b = lexical.score(pond(), [0, 1, 2], 3);
        assert!(b.fitness >= a.fitness);
    }

    #[test]
    fn test_model_feeds_flow() {
        let mut model = LanguageModel::new();
        model.train("an old silent pond. a frog jumps into the pond. silence returns now.");
        let scorer = QualityScorer::new(Some(Arc::new(model)));
        assert!(scorer.has_model());
        let flow = scorer.markov_flow(&["the old pond", "pond silence"]);
        assert!(flow >= 0.0);
    }

    #[test]
    fn test_disabled_thresholds_never_gate() {
        let scorer = QualityScorer::new(None);
        let off = ScoreThresholds::disabled();
        let lines = ["x", "y", "z"];
        assert_eq!(scorer.line_gate("zzz", &off), None);
        assert_eq!(scorer.sequence_gate(&lines, &off), None);
        assert_eq!(scorer.full_haiku_gate(&lines, &[0, 0, 0], 3, &off), None);
    }

    #[test]
    fn test_default_thresholds_gate_weak_lines() {
        let scorer = QualityScorer::new(None);
        let thresholds = ScoreThresholds::default();
        assert_eq!(scorer.line_gate("the", &thresholds), Some(Gate::Grammar));
        assert_eq!(
            scorer.sequence_gate(&["moon moon", "moon moon", "moon moon"], &thresholds),
            Some(Gate::Uniqueness)
        );
    }

    #[test]
    fn test_rejection_stats() {
        let mut stats = RejectionStats::default();
        stats.record(Gate::Sentiment);
        stats.record(Gate::Sentiment);
        stats.record(Gate::Markov);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(Gate::Sentiment), 2);

        let mut merged = RejectionStats::default();
        merged.merge(&stats);
        merged.merge(&stats);
        assert_eq!(merged.count(Gate::Markov), 2);
        assert_eq!(merged.total, 6);
    }

    #[test]
    fn test_report_shape() {
        let scorer = QualityScorer::new(None);
        let candidate = scorer.score(pond(), [0, 1, 2], 3);
        let report = scorer.report(&candidate.metrics);
        assert_eq!(report["flow"]["model_loaded"], false);
        assert!(report["counts"]["nature_words"].as_u64().is_some());
    }
}
