//! Haiku-level flow over line transitions

use super::model::LanguageModel;

/// Multiplier applied to averaged transition probabilities
pub const FLOW_SCALE: f64 = 10.0;

/// Which probability estimate a flow uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowMode {
    /// Observed ratios; 0 for unseen transitions
    #[default]
    Raw,
    /// Laplace-smoothed; strictly positive, keeps a gradient for search
    Smoothed,
}

fn mean_over_transitions<F>(lines: &[&str], score: F) -> f64
where
    F: Fn(&str, &str) -> f64,
{
    if lines.len() < 2 {
        return 0.0;
    }
    let total: f64 = lines.windows(2).map(|pair| score(pair[0], pair[1])).sum();
    total / (lines.len() - 1) as f64 * FLOW_SCALE
}

impl LanguageModel {
    /// Bigram flow across consecutive lines, with trigram backoff in raw mode
    pub fn bigram_flow(&self, lines: &[&str], mode: FlowMode) -> f64 {
        match mode {
            FlowMode::Raw => mean_over_transitions(lines, |a, b| self.evaluate_with_backoff(a, b)),
            FlowMode::Smoothed => {
                mean_over_transitions(lines, |a, b| self.evaluate_transition_smoothed(a, b))
            }
        }
    }

    /// Trigram flow across consecutive lines
    pub fn trigram_flow(&self, lines: &[&str], mode: FlowMode) -> f64 {
        match mode {
            FlowMode::Raw => {
                mean_over_transitions(lines, |a, b| self.evaluate_trigram_transition(a, b))
            }
            FlowMode::Smoothed => {
                mean_over_transitions(lines, |a, b| self.evaluate_trigram_transition_smoothed(a, b))
            }
        }
    }
}
