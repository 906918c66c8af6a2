//! Heuristic part-of-speech tagging and grammar scoring
//!
//! Closed word classes come from fixed lists; open classes are guessed from
//! suffixes and the previous tag. Unknown words default to nouns.

use super::tokenizer::words;
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Determiner,
    Preposition,
    Conjunction,
}

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "my", "your", "his", "her", "its", "our",
    "their", "some", "any", "no", "every", "each", "all", "both", "few", "many", "much", "more",
];
const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "us", "them", "who", "whom",
    "myself", "himself", "herself", "itself", "ourselves", "themselves", "one",
];
const PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "by", "for", "with", "from", "to", "of", "into", "onto", "over", "under",
    "through", "across", "along", "behind", "beyond", "above", "below", "beneath", "beside",
    "between", "near", "upon", "within", "without", "toward", "towards", "around", "against",
    "among", "after", "before", "during", "until", "like", "off", "up", "down",
];
const CONJUNCTIONS: &[&str] = &[
    "and", "but", "or", "nor", "yet", "so", "because", "although", "though", "while", "when",
    "where", "if", "unless", "since", "as", "than", "whether",
];
const ADVERBS: &[&str] = &[
    "not", "never", "always", "often", "still", "again", "here", "there", "now", "then", "soon",
    "very", "too", "once", "ever", "already", "almost", "quite", "just", "away", "back",
];
const VERBS: &[&str] = &[
    "is", "are", "was", "were", "be", "been", "am", "has", "have", "had", "do", "does", "did",
    "will", "would", "shall", "should", "can", "could", "may", "might", "must", "go", "went",
    "come", "came", "see", "saw", "seen", "hear", "heard", "know", "knew", "think", "thought",
    "take", "took", "make", "made", "give", "gave", "find", "found", "tell", "told", "say",
    "said", "feel", "felt", "fall", "fell", "rise", "rose", "sing", "sang", "fly", "flew",
    "run", "ran", "sit", "sat", "stand", "stood", "lie", "lay", "sleep", "slept", "wake",
    "woke", "drift", "drifts", "jump", "blow", "blew", "shine", "shone", "grow", "grew", "weep",
    "wept", "dance", "sleep", "wait", "walk", "call", "keep", "kept", "hold", "held", "leave",
    "left", "return", "returns", "bloom", "float", "flow", "wander", "whisper", "glow", "burn",
    "turn", "cry", "fade", "break", "broke", "sink", "sank", "bring", "brought", "seem",
    "seemed", "love", "become", "became", "begin", "began", "remain", "stay", "speak", "spoke",
];
const ADJECTIVES: &[&str] = &[
    "old", "new", "young", "little", "small", "big", "great", "long", "short", "high", "low",
    "deep", "wide", "cold", "warm", "hot", "cool", "dark", "bright", "pale", "soft", "hard",
    "silent", "quiet", "still", "empty", "full", "white", "black", "red", "green", "blue",
    "gold", "golden", "grey", "gray", "silver", "sweet", "wild", "lonely", "last", "first",
    "good", "bad", "fair", "sad", "glad", "strange", "gentle", "thin", "slow", "swift", "dim",
];

static LEXICON: Lazy<HashMap<&'static str, PosTag>> = Lazy::new(|| {
    let mut map = HashMap::new();
    // later inserts win for words in several lists
    for (list, tag) in [
        (ADJECTIVES, PosTag::Adjective),
        (VERBS, PosTag::Verb),
        (ADVERBS, PosTag::Adverb),
        (CONJUNCTIONS, PosTag::Conjunction),
        (PREPOSITIONS, PosTag::Preposition),
        (PRONOUNS, PosTag::Pronoun),
        (DETERMINERS, PosTag::Determiner),
    ] {
        for word in list {
            map.insert(*word, tag);
        }
    }
    map
});

fn guess_open_class(word: &str, previous: Option<PosTag>) -> PosTag {
    if let Some(stem) = word.strip_suffix('s') {
        if let Some(PosTag::Verb) = LEXICON.get(stem) {
            return PosTag::Verb;
        }
    }
    if word.ends_with("ly") {
        return PosTag::Adverb;
    }
    if word.len() > 4 && (word.ends_with("ing") || word.ends_with("ed")) {
        return match previous {
            Some(PosTag::Determiner) => PosTag::Adjective,
            _ => PosTag::Verb,
        };
    }
    const ADJECTIVE_SUFFIXES: [&str; 8] = ["ous", "ful", "less", "ive", "able", "ible", "ish", "ic"];
    if ADJECTIVE_SUFFIXES
        .iter()
        .any(|s| word.len() > s.len() + 2 && word.ends_with(s))
    {
        return PosTag::Adjective;
    }
    match previous {
        Some(PosTag::Pronoun) => PosTag::Verb,
        _ => PosTag::Noun,
    }
}

/// Tag each word of `text` in order
pub fn tag_words(text: &str) -> Vec<(String, PosTag)> {
    let mut tagged: Vec<(String, PosTag)> = Vec::new();
    for word in words(text) {
        let lower = word.to_lowercase();
        let previous = tagged.last().map(|(_, tag)| *tag);
        let tag = match LEXICON.get(lower.as_str()) {
            Some(tag) => *tag,
            None => guess_open_class(&lower, previous),
        };
        tagged.push((lower, tag));
    }
    tagged
}

/// Well-formedness in [0, 1]:
/// noun+verb 1.0, noun+adjective 0.8, noun 0.5, verb 0.3, otherwise 0
pub fn grammar_score(text: &str) -> f64 {
    let tags = tag_words(text);
    let has = |wanted: PosTag| tags.iter().any(|(_, tag)| *tag == wanted);
    let (noun, verb, adjective) = (has(PosTag::Noun), has(PosTag::Verb), has(PosTag::Adjective));

    if noun && verb {
        1.0
    } else if noun && adjective {
        0.8
    } else if noun {
        0.5
    } else if verb {
        0.3
    } else {
        0.0
    }
}

/// Number of verbs across `text`
pub fn count_verbs(text: &str) -> usize {
    tag_words(text)
        .iter()
        .filter(|(_, tag)| *tag == PosTag::Verb)
        .count()
}
