use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, time::Duration};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    pub word_list_path: String,
    pub solo_words_path: String,
    pub locales_dir: String,
    pub default_language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub default_rounds: u32,
    pub clue_reminder_secs: u64,
    pub guess_warning_secs: u64,
    pub guess_timeout_secs: u64,
    pub round_break_secs: u64,
    pub game_start_delay_secs: u64,
    /// Fixed seed for turn order and word draws; random when unset
    pub rng_seed: Option<u64>,
}

/// Delays that drive the round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub clue_reminder: Duration,
    pub guess_warning: Duration,
    pub guess_timeout: Duration,
    pub round_break: Duration,
    pub game_start_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            clue_reminder: Duration::from_secs(90),
            guess_warning: Duration::from_secs(45),
            guess_timeout: Duration::from_secs(60),
            round_break: Duration::from_secs(4),
            game_start_delay: Duration::from_secs(2),
        }
    }
}

impl Timings {
    /// Time guessers still have once the warning goes out
    pub fn after_warning(&self) -> Duration {
        self.guess_timeout.saturating_sub(self.guess_warning)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let content = ContentConfig {
            word_list_path: env::var("WORD_LIST_PATH")
                .unwrap_or_else(|_| "./words.txt".to_string()),
            solo_words_path: env::var("SOLO_WORDS_PATH")
                .unwrap_or_else(|_| "./solo_words.json".to_string()),
            locales_dir: env::var("LOCALES_DIR").unwrap_or_else(|_| "./locales".to_string()),
            default_language: env::var("DEFAULT_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
        };

        let game = GameConfig {
            default_rounds: env::var("DEFAULT_ROUNDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DEFAULT_ROUNDS must be a number")?,
            clue_reminder_secs: secs_var("CLUE_REMINDER_SECS", 90)?,
            guess_warning_secs: secs_var("GUESS_WARNING_SECS", 45)?,
            guess_timeout_secs: secs_var("GUESS_TIMEOUT_SECS", 60)?,
            round_break_secs: secs_var("ROUND_BREAK_SECS", 4)?,
            game_start_delay_secs: secs_var("GAME_START_DELAY_SECS", 2)?,
            rng_seed: match env::var("RNG_SEED") {
                Ok(raw) => Some(raw.parse().context("RNG_SEED must be a number")?),
                Err(_) => None,
            },
        };

        if game.guess_warning_secs >= game.guess_timeout_secs {
            anyhow::bail!("GUESS_WARNING_SECS must be shorter than GUESS_TIMEOUT_SECS");
        }

        Ok(Config { game, content })
    }

    pub fn timings(&self) -> Timings {
        Timings {
            clue_reminder: Duration::from_secs(self.game.clue_reminder_secs),
            guess_warning: Duration::from_secs(self.game.guess_warning_secs),
            guess_timeout: Duration::from_secs(self.game.guess_timeout_secs),
            round_break: Duration::from_secs(self.game.round_break_secs),
            game_start_delay: Duration::from_secs(self.game.game_start_delay_secs),
        }
    }
}

fn secs_var(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number of seconds", key)),
        Err(_) => Ok(default),
    }
}
