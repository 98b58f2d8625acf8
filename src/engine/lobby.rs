use uuid::Uuid;

use super::{GameEngine, Outbox};
use crate::{
    error::GameError,
    gateway::Formatting,
    models::{ChatId, GameSnapshot, GameState, GameStatus, MessageRef, UserId, UserProfile},
    timer::TimerKind,
};

/// Result of a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyJoined,
}

impl GameEngine {
    /// Open a lobby in `chat_id` with the caller as host
    pub async fn create_game(
        &self,
        chat_id: ChatId,
        host: &UserProfile,
        total_rounds: Option<u32>,
    ) -> Result<GameSnapshot, GameError> {
        let language = self.language_of(host);
        if self.inner.registry.game(chat_id).is_some() {
            self.notify(chat_id, &language, "game_already_running").await;
            return Err(GameError::AlreadyRunning);
        }

        let player = self.resolve_player(host).await?;
        let rounds = total_rounds.unwrap_or(self.settings().default_rounds);
        let state = GameState::new(chat_id, player, rounds, language.clone());

        let shared = match self.inner.registry.create_game(state) {
            Ok(shared) => shared,
            Err(e) => {
                self.notify(chat_id, &language, "game_already_running").await;
                return Err(e);
            }
        };

        let (game_id, snapshot, text) = {
            let game = shared.lock().await;
            (
                game.game_id,
                game.snapshot(),
                self.texts(&game.language).lobby(&game),
            )
        };

        tracing::info!(
            "Game {} created in chat {} by user {} ({} rounds)",
            game_id,
            chat_id,
            host.user_id,
            snapshot.total_rounds
        );

        match self
            .inner
            .gateway
            .send(chat_id, &text, &self.join_formatting(&language))
            .await
        {
            Ok(message) => self.attach_lobby_message(chat_id, game_id, message, &text).await,
            Err(e) => tracing::warn!("Failed to post lobby for chat {}: {}", chat_id, e),
        }

        Ok(snapshot)
    }

    /// Remember the lobby message, catching up with anything that changed while it was in flight
    async fn attach_lobby_message(
        &self,
        chat_id: ChatId,
        game_id: Uuid,
        message: MessageRef,
        sent_text: &str,
    ) {
        let Some(shared) = self.inner.registry.game_instance(chat_id, game_id) else {
            return;
        };
        let mut outbox = Outbox::default();
        {
            let mut game = shared.lock().await;
            if !game.is_active {
                return;
            }
            game.lobby_message = Some(message);
            let texts = self.texts(&game.language);
            if game.status == GameStatus::Lobby {
                let current = texts.lobby(&game);
                if current != sent_text {
                    outbox.edit(message, current, self.join_formatting(&game.language));
                }
            } else {
                outbox.edit(message, texts.lobby_closed(&game), Formatting::html());
            }
        }
        self.dispatch(outbox).await;
    }

    /// Add a player to the lobby
    pub async fn join_game(
        &self,
        chat_id: ChatId,
        profile: &UserProfile,
    ) -> Result<JoinOutcome, GameError> {
        let shared = self
            .inner
            .registry
            .game(chat_id)
            .ok_or(GameError::GameNotFound)?;
        let player = self.resolve_player(profile).await?;

        let mut outbox = Outbox::default();
        let outcome = {
            let mut game = shared.lock().await;
            if !game.is_active {
                return Err(GameError::GameNotFound);
            }
            if !game.add_player(player)? {
                JoinOutcome::AlreadyJoined
            } else {
                if let Some(message) = game.lobby_message {
                    outbox.edit(
                        message,
                        self.texts(&game.language).lobby(&game),
                        self.join_formatting(&game.language),
                    );
                }
                JoinOutcome::Joined
            }
        };

        match outcome {
            JoinOutcome::Joined => {
                tracing::info!("User {} joined game in chat {}", profile.user_id, chat_id)
            }
            JoinOutcome::AlreadyJoined => tracing::debug!(
                "User {} already in game in chat {}",
                profile.user_id,
                chat_id
            ),
        }

        self.dispatch(outbox).await;
        Ok(outcome)
    }

    /// Close the lobby, shuffle the turn order and schedule round one
    pub async fn start_game(&self, chat_id: ChatId, user_id: UserId) -> Result<(), GameError> {
        let shared = self
            .inner
            .registry
            .game(chat_id)
            .ok_or(GameError::GameNotFound)?;

        let mut outbox = Outbox::default();
        let result = {
            let mut game = shared.lock().await;
            self.start_locked(&mut game, user_id, &mut outbox)
        };
        self.dispatch(outbox).await;

        if result.is_ok() {
            tracing::info!("Game started in chat {} by user {}", chat_id, user_id);
        }
        result
    }

    fn start_locked(
        &self,
        game: &mut GameState,
        user_id: UserId,
        outbox: &mut Outbox,
    ) -> Result<(), GameError> {
        if !game.is_active {
            return Err(GameError::GameNotFound);
        }
        let language = game.language.clone();
        let texts = self.texts(&language);
        if !game.is_host(user_id) {
            outbox.send(game.chat_id, texts.with_host("play_command_not_host", game));
            return Err(GameError::NotHost);
        }
        if game.status != GameStatus::Lobby {
            return Err(GameError::WrongPhase(game.status));
        }

        let permutation = self.inner.rng.permutation(game.players().len());
        if let Err(e) = game.start(&permutation) {
            if matches!(e, GameError::NotEnoughPlayers { .. }) {
                outbox.send(
                    game.chat_id,
                    texts.get("play_command_not_enough_players", &[]),
                );
            }
            return Err(e);
        }

        if let Some(message) = game.lobby_message {
            outbox.edit(message, texts.lobby_closed(game), Formatting::html());
        }
        outbox.send(game.chat_id, texts.game_started(game));

        let token = self.schedule_timer(
            self.timings().game_start_delay,
            game.chat_id,
            game.game_id,
            game.round,
            TimerKind::NextRound,
        );
        game.timers.arm(TimerKind::NextRound, token);
        Ok(())
    }

    fn join_formatting(&self, language: &str) -> Formatting {
        Formatting::html().with_join_button(self.texts(language).get("button_join_game", &[]))
    }

    /// Public one-off notice
    pub(crate) async fn notify(&self, chat_id: ChatId, language: &str, key: &str) {
        let mut outbox = Outbox::default();
        outbox.send(chat_id, self.texts(language).get(key, &[]));
        self.dispatch(outbox).await;
    }
}
