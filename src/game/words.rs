use anyhow::{Context, Error, Result};
use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::HashMap;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

/// Source of secret words for a hosted round.
pub trait WordSupplier {
    /// A word with exactly `length` letters, `None` if there is none.
    fn supply_word(&mut self, length: usize) -> Option<String>;
}

const BUILTIN_LIST: &[&str] = &[
    // 3
    "ant", "bee", "cat", "dog", "elk", "fox", "gnu", "hen", "ink", "jam", "key", "log", "map",
    "nut", "owl", "pig", "rag", "sun", "tea", "yak",
    // 4
    "atom", "bark", "cube", "dusk", "echo", "fern", "gale", "harp", "iris", "jade", "kite",
    "lamp", "mint", "nest", "opal", "pear", "quiz", "rust", "sand", "tide", "vase", "wolf",
    // 5
    "audio", "brick", "crate", "dance", "eagle", "flame", "grape", "house", "igloo", "jelly",
    "knife", "lemon", "mango", "night", "ocean", "piano", "queen", "river", "stone", "tiger",
    "unity", "vivid", "whale", "yeast", "zebra", "trace", "could", "cloud",
    // 6
    "anchor", "bridge", "candle", "dragon", "engine", "forest", "garden", "hammer", "island",
    "jungle", "kettle", "ladder", "marble", "needle", "orange", "planet", "rocket", "silver",
    "tunnel", "velvet", "window",
    // 7
    "balloon", "cabinet", "diamond", "eclipse", "fiction", "glacier", "harvest", "iceberg",
    "journey", "kingdom", "lantern", "mystery", "network", "octopus", "pyramid", "rainbow",
    "sunrise", "thunder", "volcano", "weather",
    // 8
    "alphabet", "blizzard", "calendar", "dinosaur", "elephant", "festival", "graphite",
    "hospital", "keyboard", "mountain", "notebook", "painting", "question", "sandwich",
    "treasure", "umbrella",
];

lazy_static! {
    static ref BUILTIN_WORDS: WordBank = WordBank::from_words(BUILTIN_LIST.iter());
}

/// Words grouped by their number of letters.
#[derive(Clone, Debug, Default)]
pub struct WordBank {
    by_length: HashMap<usize, Vec<String>>,
}

impl WordBank {
    /// the word list compiled into the binary
    pub fn builtin() -> Self {
        BUILTIN_WORDS.clone()
    }

    /// Build a bank from arbitrary text, keeping only alphabetic words.
    /// Words are lowercased, duplicates are dropped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_length: HashMap<usize, Vec<String>> = HashMap::new();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if word.is_empty() || !word.chars().all(char::is_alphabetic) {
                continue;
            }
            let bucket = by_length.entry(word.graphemes(true).count()).or_default();
            if !bucket.contains(&word) {
                bucket.push(word);
            }
        }
        WordBank { by_length }
    }

    /// Newline separated word list.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read word list {}", path.display()))?;
        let bank = WordBank::from_words(text.lines());
        if bank.is_empty() {
            return Err(Error::msg(format!(
                "word list {} has no usable words",
                path.display()
            )));
        }
        Ok(bank)
    }

    pub fn is_empty(&self) -> bool {
        self.by_length.values().all(|bucket| bucket.is_empty())
    }

    /// lengths for which a word can be supplied, shortest first
    pub fn lengths(&self) -> Vec<usize> {
        let mut lengths: Vec<usize> = self
            .by_length
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(length, _)| *length)
            .collect();
        lengths.sort_unstable();
        lengths
    }
}

impl WordSupplier for WordBank {
    fn supply_word(&mut self, length: usize) -> Option<String> {
        self.by_length
            .get(&length)
            .and_then(|bucket| bucket.choose(&mut thread_rng()))
            .cloned()
    }
}
