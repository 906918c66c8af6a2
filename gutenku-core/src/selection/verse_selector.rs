//! Greedy 5-7-5 verse selection
//!
//! Walks a small state machine over the syllable pattern, filtering the pool
//! at each step and picking uniformly among survivors. Randomness comes from
//! the caller, so a seeded `StdRng` reproduces a selection exactly.
//!
//! # Filters per line
//! 1. Source index strictly after the previous line (lines 2 and 3)
//! 2. Exact syllable count for the target
//! 3. Structural completion: later quotes must still be able to fill the
//!    remaining targets
//! 4. No opening conjunction (line 1)
//! 5. Not uppercase, not blacklisted, under the length cap
//! 6. Weak-start gate unless allowed
//! 7. Line gates (sentiment, grammar)
//! 8. Sequence gates over the chosen lines plus the candidate
//!
//! After the third line the full-haiku gates decide between `Done` and
//! `Failed`. A failed selection never returns a partial haiku.
//!
//! Filter 3 is an addition to the classic greedy walk, which picks uniformly
//! among every quote passing the remaining filters and can strand itself on
//! a line no later quote can follow. Pruning those dead ends first keeps the
//! choice uniform, but only among openers that can still finish a haiku, so
//! a pool holding one ordered 5-7-5 always yields it.

use crate::types::{HaikuCandidate, Quote};
use crate::validators::quality_scorer::{Gate, QualityScorer, RejectionStats, ScoreThresholds};
use crate::validators::verse_filters::{has_weak_start, is_quote_invalid, starts_with_conjunction};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Target syllables per line
pub const HAIKU_PATTERN: [usize; 3] = [5, 7, 5];

/// Selection progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Choosing the line at this position (0-based)
    Picking(usize),
    /// Three lines chosen, full-haiku gates pending
    Complete,
    Done,
    /// No candidate survived for this line (3 = full-haiku gates)
    Failed { line: usize },
}

/// Result of one selection attempt
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub candidate: Option<HaikuCandidate>,
    pub state: SelectionState,
    pub rejections: RejectionStats,
}

impl SelectionOutcome {
    pub fn is_success(&self) -> bool {
        self.state == SelectionState::Done && self.candidate.is_some()
    }
}

/// Verse Selector
///
/// Owns its thresholds; the scorer may share a language model with others.
#[derive(Debug, Clone)]
pub struct VerseSelector {
    scorer: QualityScorer,
    thresholds: ScoreThresholds,
}

impl VerseSelector {
    pub fn new(scorer: QualityScorer, thresholds: ScoreThresholds) -> Self {
        Self { scorer, thresholds }
    }

    pub fn thresholds(&self) -> &ScoreThresholds {
        &self.thresholds
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Assemble one haiku from `pool`
    pub fn select<R: Rng + ?Sized>(&self, pool: &[Quote], rng: &mut R) -> SelectionOutcome {
        let total_quotes = pool.len();
        let mut remaining: Vec<Quote> = pool
            .iter()
            .map(|quote| Quote {
                text: quote.text.replace('\n', " "),
                ..quote.clone()
            })
            .collect();
        let mut chosen: Vec<Quote> = Vec::with_capacity(HAIKU_PATTERN.len());
        let mut rejections = RejectionStats::default();
        let mut state = SelectionState::Picking(0);

        loop {
            state = match state {
                SelectionState::Picking(line) => {
                    let survivors: Vec<usize> = (0..remaining.len())
                        .filter(|&position| {
                            self.accepts(&remaining, position, line, &chosen, &mut rejections)
                        })
                        .collect();

                    match survivors.choose(rng) {
                        None => SelectionState::Failed { line },
                        Some(&position) => {
                            chosen.push(remaining.remove(position));
                            if line + 1 == HAIKU_PATTERN.len() {
                                SelectionState::Complete
                            } else {
                                SelectionState::Picking(line + 1)
                            }
                        }
                    }
                }
                SelectionState::Complete => {
                    let lines: Vec<&str> = chosen.iter().map(|q| q.text.as_str()).collect();
                    let indices: Vec<usize> = chosen.iter().map(|q| q.source_index).collect();
                    match self
                        .scorer
                        .full_haiku_gate(&lines, &indices, total_quotes, &self.thresholds)
                    {
                        Some(gate) => {
                            debug!(gate = %gate, "Full haiku rejected");
                            rejections.record(gate);
                            SelectionState::Failed {
                                line: HAIKU_PATTERN.len(),
                            }
                        }
                        None => SelectionState::Done,
                    }
                }
                SelectionState::Done | SelectionState::Failed { .. } => break,
            };
        }

        let candidate = match (state, chosen.as_slice()) {
            (SelectionState::Done, [a, b, c]) => Some(self.scorer.score(
                [a.text.clone(), b.text.clone(), c.text.clone()],
                [a.source_index, b.source_index, c.source_index],
                total_quotes,
            )),
            _ => None,
        };

        debug!(
            state = ?state,
            rejected = rejections.total,
            pool = total_quotes,
            "Verse selection finished"
        );

        SelectionOutcome {
            candidate,
            state,
            rejections,
        }
    }

    fn accepts(
        &self,
        remaining: &[Quote],
        position: usize,
        line: usize,
        chosen: &[Quote],
        rejections: &mut RejectionStats,
    ) -> bool {
        let quote = &remaining[position];

        if let Some(previous) = chosen.last() {
            if quote.source_index <= previous.source_index {
                return false;
            }
        }
        if quote.syllable_count != HAIKU_PATTERN[line] {
            return false;
        }
        if !can_complete(remaining, position, line) {
            return false;
        }

        let text = quote.text.as_str();
        let basic = (line == 0 && starts_with_conjunction(text))
            || is_quote_invalid(text)
            || (!self.thresholds.allow_weak_start && has_weak_start(text));
        if basic {
            rejections.record(Gate::Basic);
            return false;
        }

        if let Some(gate) = self.scorer.line_gate(text, &self.thresholds) {
            debug!(gate = %gate, line, quote = text, "Verse rejected");
            rejections.record(gate);
            return false;
        }

        if !chosen.is_empty() {
            let mut lines: Vec<&str> = chosen.iter().map(|q| q.text.as_str()).collect();
            lines.push(text);
            if let Some(gate) = self.scorer.sequence_gate(&lines, &self.thresholds) {
                debug!(gate = %gate, line, quote = text, "Verse sequence rejected");
                rejections.record(gate);
                return false;
            }
        }

        true
    }
}

/// Whether quotes after `remaining[position]` can still fill the targets
/// following `line`, ignoring score gates
fn can_complete(remaining: &[Quote], position: usize, line: usize) -> bool {
    let mut cursor = remaining[position].source_index;
    for &target in &HAIKU_PATTERN[line + 1..] {
        let next = remaining
            .iter()
            .enumerate()
            .filter(|(other, quote)| {
                *other != position && quote.syllable_count == target && quote.source_index > cursor
            })
            .map(|(_, quote)| quote.source_index)
            .min();
        match next {
            Some(index) => cursor = index,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pond_pool() -> Vec<Quote> {
        vec![
            Quote::new("an old silent pond", 0, 5),
            Quote::new("a frog jumps into the pond", 1, 7),
            Quote::new("silence returns now", 2, 5),
        ]
    }

    fn open_selector() -> VerseSelector {
        VerseSelector::new(QualityScorer::new(None), ScoreThresholds::disabled())
    }

    #[test]
    fn test_selects_classic_haiku_in_order() {
        let selector = open_selector();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = selector.select(&pond_pool(), &mut rng);
            assert!(outcome.is_success(), "seed {seed} failed: {:?}", outcome.state);
            let candidate = outcome.candidate.unwrap();
            assert_eq!(
                candidate.verses(),
                vec![
                    "an old silent pond".to_string(),
                    "a frog jumps into the pond".to_string(),
                    "silence returns now".to_string(),
                ]
            );
            assert_eq!(candidate.source_indices, [0, 1, 2]);
        }
    }

    #[test]
    fn test_dead_end_openers_are_never_picked() {
        let pool = vec![
            Quote::new("an old silent pond", 0, 5),
            Quote::new("a frog jumps into the pond", 1, 7),
            Quote::new("silence returns now", 2, 5),
            Quote::new("the cold wind blows hard", 3, 5),
            Quote::new("soft rain falls on grass", 4, 5),
        ];
        let selector = open_selector();
        for seed in 0..20 {
            let outcome = selector.select(&pool, &mut StdRng::seed_from_u64(seed));
            let candidate = outcome.candidate.expect("an ordered haiku exists");
            assert_eq!(candidate.source_indices[..2], [0, 1]);
        }
    }

    #[test]
    fn test_fails_without_seven_syllable_line() {
        let pool = vec![
            Quote::new("an old silent pond", 0, 5),
            Quote::new("silence returns now", 2, 5),
        ];
        let outcome = open_selector().select(&pool, &mut StdRng::seed_from_u64(1));
        assert_eq!(outcome.state, SelectionState::Failed { line: 0 });
        assert!(outcome.candidate.is_none());
    }

    #[test]
    fn test_respects_source_order() {
        let pool = vec![
            Quote::new("silence returns now", 0, 5),
            Quote::new("a frog jumps into the pond", 5, 7),
            Quote::new("an old silent pond", 3, 5),
        ];
        let outcome = open_selector().select(&pool, &mut StdRng::seed_from_u64(3));
        assert!(outcome.candidate.is_none());
    }

    #[test]
    fn test_duplicate_text_remains_eligible() {
        let pool = vec![
            Quote::new("the old silent pond", 0, 5),
            Quote::new("a frog jumps into the pond", 1, 7),
            Quote::new("the old silent pond", 2, 5),
        ];
        let outcome = open_selector().select(&pool, &mut StdRng::seed_from_u64(9));
        let candidate = outcome.candidate.expect("selection succeeds");
        assert_eq!(candidate.verses[0], candidate.verses[2]);
        assert_eq!(candidate.source_indices, [0, 1, 2]);
    }

    #[test]
    fn test_conjunction_opener_rejected_on_first_line() {
        let pool = vec![
            Quote::new("and the silent pond", 0, 5),
            Quote::new("a frog jumps into the pond", 1, 7),
            Quote::new("silence returns now", 2, 5),
        ];
        let outcome = open_selector().select(&pool, &mut StdRng::seed_from_u64(4));
        assert_eq!(outcome.state, SelectionState::Failed { line: 0 });
        assert_eq!(outcome.rejections.count(Gate::Basic), 1);
    }

    #[test]
    fn test_same_seed_same_result() {
        let pool = vec![
            Quote::new("an old silent pond", 0, 5),
            Quote::new("the wind in the pines", 1, 5),
            Quote::new("a frog jumps into the pond", 2, 7),
            Quote::new("the river runs to the sea", 3, 7),
            Quote::new("silence returns now", 4, 5),
            Quote::new("morning light on snow", 5, 5),
        ];
        let selector = open_selector();
        let first = selector.select(&pool, &mut StdRng::seed_from_u64(42));
        let second = selector.select(&pool, &mut StdRng::seed_from_u64(42));
        assert_eq!(
            first.candidate.map(|c| c.source_indices),
            second.candidate.map(|c| c.source_indices)
        );
    }

    #[test]
    fn test_full_haiku_gate_failure_returns_nothing() {
        let thresholds = ScoreThresholds {
            verse_distance: 0.99,
            ..ScoreThresholds::disabled()
        };
        let selector = VerseSelector::new(QualityScorer::new(None), thresholds);
        let mut pool = pond_pool();
        pool[2].source_index = 40;
        pool.push(Quote::new("filler", 41, 1));
        let outcome = selector.select(&pool, &mut StdRng::seed_from_u64(0));
        assert_eq!(outcome.state, SelectionState::Failed { line: 3 });
        assert!(outcome.candidate.is_none());
        assert_eq!(outcome.rejections.count(Gate::VerseDistance), 1);
    }
}
