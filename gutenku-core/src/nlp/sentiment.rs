//! Lexicon-based sentiment polarity

use super::tokenizer::lowercase_words;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static POLARITY: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let positive: &[(&str, f64)] = &[
        ("love", 0.8), ("joy", 0.8), ("happy", 0.75), ("glad", 0.6), ("peace", 0.7),
        ("peaceful", 0.7), ("calm", 0.5), ("gentle", 0.5), ("kind", 0.5), ("sweet", 0.5),
        ("beautiful", 0.75), ("beauty", 0.7), ("lovely", 0.7), ("bright", 0.4), ("warm", 0.4),
        ("soft", 0.3), ("smile", 0.6), ("laugh", 0.6), ("hope", 0.6), ("bless", 0.6),
        ("blessed", 0.6), ("delight", 0.7), ("wonder", 0.5), ("grace", 0.6), ("fair", 0.4),
        ("golden", 0.3), ("shine", 0.3), ("bloom", 0.4), ("blossom", 0.4), ("sing", 0.3),
        ("song", 0.3), ("dream", 0.3), ("free", 0.4), ("friend", 0.5), ("tender", 0.5),
        ("good", 0.5), ("great", 0.5), ("fine", 0.3), ("pleasant", 0.6), ("serene", 0.6),
        ("quiet", 0.2), ("rest", 0.2), ("alive", 0.4), ("heaven", 0.5), ("dear", 0.4),
        ("merry", 0.6), ("cheer", 0.6), ("glow", 0.3), ("light", 0.2), ("spring", 0.2),
    ];
    let negative: &[(&str, f64)] = &[
        ("death", -0.8), ("dead", -0.7), ("die", -0.7), ("kill", -0.8), ("hate", -0.8),
        ("fear", -0.6), ("afraid", -0.6), ("pain", -0.7), ("sorrow", -0.7), ("sad", -0.6),
        ("grief", -0.7), ("weep", -0.5), ("cry", -0.4), ("tears", -0.4), ("cruel", -0.7),
        ("evil", -0.8), ("dark", -0.3), ("cold", -0.2), ("lonely", -0.5), ("lost", -0.4),
        ("anger", -0.6), ("angry", -0.6), ("wrong", -0.5), ("bad", -0.5), ("poor", -0.4),
        ("sick", -0.5), ("ill", -0.5), ("blood", -0.5), ("war", -0.6), ("wound", -0.5),
        ("misery", -0.8), ("miserable", -0.8), ("despair", -0.8), ("shame", -0.6),
        ("ugly", -0.6), ("terrible", -0.7), ("horrible", -0.7), ("dread", -0.6), ("grave", -0.4),
        ("curse", -0.6), ("bitter", -0.4), ("broken", -0.5), ("fail", -0.5), ("harsh", -0.4),
        ("storm", -0.2), ("trouble", -0.5), ("worry", -0.5), ("hurt", -0.6), ("alone", -0.3),
    ];
    positive.iter().chain(negative.iter()).copied().collect()
});

fn polarity(word: &str) -> Option<f64> {
    if let Some(&p) = POLARITY.get(word) {
        return Some(p);
    }
    // crude stemming for inflected forms (loved, smiles, weeping)
    for suffix in ["ing", "ed", "es", "s", "ly", "d"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if let Some(&p) = POLARITY.get(stem) {
                return Some(p);
            }
        }
    }
    None
}

/// Sentiment in [0, 1]; 0.5 is neutral (including text with no words)
pub fn sentiment_score(text: &str) -> f64 {
    let words = lowercase_words(text);
    if words.is_empty() {
        return 0.5;
    }
    let sum: f64 = words.iter().filter_map(|w| polarity(w)).sum();
    let average = sum / words.len() as f64;
    ((average + 1.0) / 2.0).clamp(0.0, 1.0)
}
