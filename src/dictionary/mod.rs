use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{error::ContentError, game::RandomSource};

/// Target word for a solo session with its hints in reveal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoloWord {
    pub word: String,
    pub hints: Vec<String>,
}

/// Secret words used when no word list is configured
static BUILTIN_WORDS: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "APPLE", "BRIDGE", "CANDLE", "DESERT", "ENGINE", "FOREST", "GARDEN", "HARBOR", "ISLAND",
        "JACKET", "KETTLE", "LADDER", "MIRROR", "NEEDLE", "ORANGE", "PENCIL", "QUEEN", "RIVER",
        "SADDLE", "TEMPLE", "UMBRELLA", "VIOLIN", "WINDOW", "YOGURT", "ZEBRA", "ANCHOR",
        "BALLOON", "CASTLE", "DRAGON", "FEATHER", "GUITAR", "HAMMER", "LANTERN", "MARKET",
        "PLANET", "ROCKET", "SHADOW", "TICKET", "VOLCANO", "WHISTLE",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
});

static BUILTIN_SOLO_WORDS: Lazy<Vec<SoloWord>> = Lazy::new(|| {
    let entry = |word: &str, hints: &[&str]| SoloWord {
        word: word.to_string(),
        hints: hints.iter().map(|h| h.to_string()).collect(),
    };
    vec![
        entry("INDEPENDENCE", &["HISTORY", "FLAG", "FIREWORKS"]),
        entry("RESTAURANT", &["FOOD", "MENU", "WAITER"]),
        entry("CINEMA", &["FILM", "POPCORN", "BIG SCREEN"]),
        entry("ISLAND", &["SEA", "BEACH", "REMOTE"]),
        entry("ASTRONAUT", &["OUTER SPACE", "ROCKET", "MOON"]),
        entry("LIBRARY", &["BOOKS", "QUIET", "BORROW"]),
    ]
});

/// Word corpus for chat games and solo sessions
pub struct WordBank {
    words: Vec<String>,
    solo_words: Vec<SoloWord>,
}

impl WordBank {
    /// Load the secret word list (one word per line) and the solo corpus (JSON array)
    pub async fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        word_list: P,
        solo_words: Q,
    ) -> Result<Self, ContentError> {
        let words = Self::load_words(word_list.as_ref()).await?;
        let solo_words = Self::load_solo_words(solo_words.as_ref()).await?;

        tracing::info!(
            "Loaded {} secret words and {} solo words",
            words.len(),
            solo_words.len()
        );

        Ok(Self { words, solo_words })
    }

    async fn load_words(path: &Path) -> Result<Vec<String>, ContentError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ContentError::Io {
                path: display.clone(),
                source,
            })?;
        let words = Self::parse_words(&content);
        if words.is_empty() {
            return Err(ContentError::Empty(display));
        }
        Ok(words)
    }

    async fn load_solo_words(path: &Path) -> Result<Vec<SoloWord>, ContentError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ContentError::Io {
                path: display.clone(),
                source,
            })?;
        let parsed: Vec<SoloWord> =
            serde_json::from_str(&content).map_err(|source| ContentError::Parse {
                path: display.clone(),
                source,
            })?;
        let solo_words = Self::normalize_solo(parsed);
        if solo_words.is_empty() {
            return Err(ContentError::Empty(display));
        }
        Ok(solo_words)
    }

    fn parse_words(content: &str) -> Vec<String> {
        content
            .lines()
            .map(|line| line.trim().to_uppercase())
            .filter(|word| !word.is_empty() && !word.starts_with('#'))
            .collect()
    }

    /// Drop entries that could never be played
    fn normalize_solo(entries: Vec<SoloWord>) -> Vec<SoloWord> {
        entries
            .into_iter()
            .filter_map(|entry| {
                let word = entry.word.trim().to_uppercase();
                let hints: Vec<String> = entry
                    .hints
                    .into_iter()
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .collect();
                if word.is_empty() || hints.is_empty() {
                    tracing::warn!("Skipping solo word entry without word or hints");
                    None
                } else {
                    Some(SoloWord { word, hints })
                }
            })
            .collect()
    }

    /// Built-in corpus
    pub fn builtin() -> Self {
        Self {
            words: BUILTIN_WORDS.to_vec(),
            solo_words: BUILTIN_SOLO_WORDS.to_vec(),
        }
    }

    /// Fixed corpus, mainly for tests
    pub fn from_parts(words: Vec<String>, solo_words: Vec<SoloWord>) -> Self {
        let words = words
            .into_iter()
            .map(|w| w.trim().to_uppercase())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>();
        let solo_words = Self::normalize_solo(solo_words);
        Self {
            words: if words.is_empty() {
                BUILTIN_WORDS.to_vec()
            } else {
                words
            },
            solo_words: if solo_words.is_empty() {
                BUILTIN_SOLO_WORDS.to_vec()
            } else {
                solo_words
            },
        }
    }

    /// Draw a secret word uniformly at random
    pub fn draw_word(&self, rng: &dyn RandomSource) -> String {
        self.words[rng.index(self.words.len())].clone()
    }

    /// Draw a solo word uniformly at random
    pub fn draw_solo(&self, rng: &dyn RandomSource) -> SoloWord {
        self.solo_words[rng.index(self.solo_words.len())].clone()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn solo_len(&self) -> usize {
        self.solo_words.len()
    }
}
