use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use word_sleuth_backend::{
    config::Config,
    console,
    dictionary::WordBank,
    engine::{EngineSettings, GameEngine},
    game::{RandomSource, StdRandom},
    gateway::{ConsoleGateway, JsonLocalizer, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "word_sleuth_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Word Sleuth backend...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Load word lists
    let words = match WordBank::load(
        &config.content.word_list_path,
        &config.content.solo_words_path,
    )
    .await
    {
        Ok(words) => words,
        Err(e) => {
            tracing::warn!("Failed to load word lists: {}. Using built-in words.", e);
            WordBank::builtin()
        }
    };
    tracing::info!(
        "Word bank ready: {} words, {} solo words",
        words.len(),
        words.solo_len()
    );

    // Load message catalogues
    let localizer = match JsonLocalizer::load_dir(&config.content.locales_dir).await {
        Ok(localizer) => localizer,
        Err(e) => {
            tracing::warn!("Failed to load locales: {}. Using built-in catalogues.", e);
            JsonLocalizer::builtin()
        }
    };
    tracing::info!("Languages: {:?}", localizer.languages());

    let rng: Arc<dyn RandomSource> = match config.game.rng_seed {
        Some(seed) => {
            tracing::info!("Using fixed RNG seed {}", seed);
            Arc::new(StdRandom::seeded(seed))
        }
        None => Arc::new(StdRandom::from_os()),
    };

    let engine = GameEngine::new(
        Arc::new(ConsoleGateway::new()),
        Arc::new(MemoryStore::new()),
        Arc::new(localizer),
        words,
        rng,
        EngineSettings {
            timings: config.timings(),
            default_rounds: config.game.default_rounds,
            language: config.content.default_language.clone(),
        },
    );

    console::run(engine).await
}
