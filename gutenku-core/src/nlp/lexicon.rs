//! Word lists used by extraction, scoring and the language model

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Coordinating conjunctions never used as n-gram endpoints
pub const FANBOYS: &[&str] = &["for", "and", "nor", "but", "or", "yet", "so"];

/// Function words allowed to repeat across lines without penalty
pub const ALLOWED_REPEATS: &[&str] = &[
    "the", "a", "an", "in", "on", "of", "to", "and", "is", "was", "with", "for", "at", "by",
    "from", "as",
];

const NATURE: &[&str] = &[
    "autumn", "spring", "summer", "winter", "season", "moon", "sun", "sunlight", "moonlight",
    "star", "stars", "sky", "cloud", "clouds", "rain", "snow", "frost", "ice", "mist", "fog",
    "dew", "wind", "breeze", "storm", "thunder", "lightning", "dawn", "dusk", "twilight",
    "evening", "morning", "night", "tree", "trees", "leaf", "leaves", "branch", "branches",
    "flower", "flowers", "blossom", "blossoms", "petal", "petals", "rose", "roses", "grass",
    "moss", "forest", "wood", "woods", "field", "fields", "meadow", "hill", "hills", "mountain",
    "mountains", "valley", "river", "rivers", "stream", "brook", "lake", "pond", "sea", "ocean",
    "wave", "waves", "shore", "stone", "stones", "rock", "rocks", "sand", "earth", "bird",
    "birds", "frog", "frogs", "crow", "crows", "cricket", "crickets", "butterfly", "bee", "bees",
    "deer", "fish", "nest", "seed", "seeds", "root", "roots", "garden", "willow", "pine",
    "oak", "cherry", "plum", "bamboo", "harvest", "shadow", "shadows", "water",
];

const SENSORY: &[&str] = &[
    "see", "saw", "seen", "look", "looked", "watch", "gaze", "glance", "bright", "dark", "light",
    "shadow", "glow", "gleam", "shine", "shining", "red", "blue", "green", "gold", "golden",
    "white", "black", "grey", "gray", "silver", "hear", "heard", "listen", "sound", "silence",
    "silent", "quiet", "loud", "whisper", "song", "sing", "echo", "ring", "hum", "cry", "touch",
    "soft", "rough", "smooth", "warm", "cold", "cool", "wet", "dry", "sharp", "smell", "scent",
    "fragrance", "sweet", "bitter", "taste", "sour", "fresh", "flicker", "rustle", "crackle",
];

const COMMON_NAMES: &[&str] = &[
    "John", "Mary", "James", "Elizabeth", "Henry", "Jane", "George", "Anne", "William", "Emma",
    "Charles", "Alice", "Thomas", "Margaret", "Robert", "Catherine", "Edward", "Sarah", "Richard",
    "Lucy", "Arthur", "Harriet", "Frank", "Emily", "Peter", "Helen", "Paul", "Martha", "Tom",
    "Jim", "Huck", "Oliver", "Holmes", "Watson", "Darcy", "Bennet", "London", "Paris", "England",
    "France",
];

static NATURE_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| NATURE.iter().copied().collect());
static SENSORY_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| SENSORY.iter().copied().collect());
static NAME_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| COMMON_NAMES.iter().copied().collect());

pub fn is_fanboys(word: &str) -> bool {
    FANBOYS.contains(&word)
}

pub fn is_allowed_repeat(word: &str) -> bool {
    ALLOWED_REPEATS.contains(&word)
}

/// Word must already be lowercase
pub fn is_nature_word(word: &str) -> bool {
    NATURE_SET.contains(word)
}

/// Word must already be lowercase
pub fn is_sensory_word(word: &str) -> bool {
    SENSORY_SET.contains(word)
}

/// Case-sensitive lookup of frequent character and place names
pub fn is_common_name(word: &str) -> bool {
    NAME_SET.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_sets() {
        assert!(is_fanboys("yet"));
        assert!(!is_fanboys("pond"));
        assert!(is_nature_word("pond"));
        assert!(is_sensory_word("silence"));
        assert!(is_allowed_repeat("the"));
        assert!(is_common_name("Holmes"));
        assert!(!is_common_name("holmes"));
    }
}
