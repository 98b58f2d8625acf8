//! Game orchestration.
//!
//! Every operation follows the same shape: look the game up in the registry,
//! take its lock, validate and apply the transition, queue the resulting
//! messages in an [`Outbox`], release the lock, then talk to the gateway and
//! the store. Sends whose result feeds back into the state (the lobby message,
//! the clue announcement, the secret-word DM) re-take the lock afterwards and
//! check that the game, round and status are still the ones they were sent for.

mod guesses;
mod lobby;
mod rounds;
mod solo;
pub mod texts;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
    config::Timings,
    dictionary::WordBank,
    error::GameError,
    game::RandomSource,
    gateway::{Formatting, Localizer, MessagingGateway, PersistenceStore},
    models::{ChatId, GameSnapshot, MessageRef, Player, UserId, UserProfile},
    registry::GameRegistry,
    timer::{self, TimerToken},
};

pub use guesses::{GuessOutcome, IncomingGuess};
pub use lobby::JoinOutcome;
pub use solo::{PrivateRoute, SoloOutcome};
pub use texts::Texts;

type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Tunables that are not collaborators
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub timings: Timings,
    pub default_rounds: u32,
    /// Language used when the actor did not report one
    pub language: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            default_rounds: 10,
            language: "en".to_string(),
        }
    }
}

/// Entry point for every inbound event. Cheap to clone.
#[derive(Clone)]
pub struct GameEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    registry: GameRegistry,
    gateway: Arc<dyn MessagingGateway>,
    store: Arc<dyn PersistenceStore>,
    localizer: Arc<dyn Localizer>,
    words: WordBank,
    rng: Arc<dyn RandomSource>,
    settings: EngineSettings,
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// All rounds were played
    Completed,
    /// The host used the end command
    Host,
}

/// A message queued under the lock and delivered after it is released
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outbound {
    Send {
        chat_id: ChatId,
        text: String,
        formatting: Formatting,
    },
    Edit {
        message: MessageRef,
        text: String,
        formatting: Formatting,
    },
    Delete {
        message: MessageRef,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Outbox {
    items: Vec<Outbound>,
}

impl Outbox {
    pub(crate) fn send(&mut self, chat_id: ChatId, text: String) {
        self.items.push(Outbound::Send {
            chat_id,
            text,
            formatting: Formatting::html(),
        });
    }

    pub(crate) fn edit(&mut self, message: MessageRef, text: String, formatting: Formatting) {
        self.items.push(Outbound::Edit {
            message,
            text,
            formatting,
        });
    }

    pub(crate) fn delete(&mut self, message: MessageRef) {
        self.items.push(Outbound::Delete { message });
    }
}

impl GameEngine {
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        store: Arc<dyn PersistenceStore>,
        localizer: Arc<dyn Localizer>,
        words: WordBank,
        rng: Arc<dyn RandomSource>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry: GameRegistry::new(),
                gateway,
                store,
                localizer,
                words,
                rng,
                settings,
            }),
        }
    }

    /// Read-only copy of the game running in `chat_id`
    pub async fn snapshot(&self, chat_id: ChatId) -> Option<GameSnapshot> {
        let shared = self.inner.registry.game(chat_id)?;
        let game = shared.lock().await;
        Some(game.snapshot())
    }

    pub fn has_solo(&self, user_id: UserId) -> bool {
        self.inner.registry.has_solo(user_id)
    }

    pub fn active_games(&self) -> usize {
        self.inner.registry.game_count()
    }

    fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    fn timings(&self) -> &Timings {
        &self.inner.settings.timings
    }

    fn texts<'a>(&'a self, lang: &'a str) -> Texts<'a> {
        Texts::new(self.inner.localizer.as_ref(), lang)
    }

    fn language_of(&self, profile: &UserProfile) -> String {
        profile
            .language
            .clone()
            .unwrap_or_else(|| self.settings().language.clone())
    }

    /// Look up or create the persistent record for an actor
    async fn resolve_player(&self, profile: &UserProfile) -> Result<Player, GameError> {
        self.inner
            .store
            .get_or_create_player(profile)
            .await
            .map_err(|e| {
                tracing::error!("Failed to resolve player {}: {}", profile.user_id, e);
                GameError::from(e)
            })
    }

    /// Deliver queued messages in order. Failures are logged and skipped.
    async fn dispatch(&self, outbox: Outbox) {
        let gateway = &self.inner.gateway;
        for item in outbox.items {
            let result = match &item {
                Outbound::Send {
                    chat_id,
                    text,
                    formatting,
                } => gateway.send(*chat_id, text, formatting).await.map(|_| ()),
                Outbound::Edit {
                    message,
                    text,
                    formatting,
                } => gateway.edit(*message, text, formatting).await,
                Outbound::Delete { message } => gateway.delete(*message).await,
            };
            if let Err(e) = result {
                tracing::warn!("Failed to deliver {:?}: {}", item, e);
            }
        }
    }

    /// Fire a timer callback for one round of one game
    fn schedule_timer(
        &self,
        delay: Duration,
        chat_id: ChatId,
        game_id: Uuid,
        round: u32,
        kind: timer::TimerKind,
    ) -> TimerToken {
        timer::schedule(delay, self.timer_task(chat_id, game_id, round, kind))
    }

    fn timer_task(
        &self,
        chat_id: ChatId,
        game_id: Uuid,
        round: u32,
        kind: timer::TimerKind,
    ) -> BoxedTask {
        let engine = self.clone();
        Box::pin(async move {
            match kind {
                timer::TimerKind::NextRound => engine.run_next_round(chat_id, game_id).await,
                _ => engine.on_timer(chat_id, game_id, round, kind).await,
            }
        })
    }
}

