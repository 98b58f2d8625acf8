use super::{GameEngine, Outbox};
use crate::{
    error::GameError,
    game::{Scorer, WordValidator},
    models::{ChatId, GameStatus, SoloGameState, UserId, UserProfile},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoloOutcome {
    Solved { score: i64 },
    /// Wrong guess, hint number `number` is now revealed
    Hint { number: usize },
    /// Wrong guess with no hints left; the session is over
    Exhausted,
}

/// Where a private message ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivateRoute {
    Clue { chat_id: ChatId },
    Solo(SoloOutcome),
    Ignored,
}

impl GameEngine {
    /// Start a hint-unlocking session for one user
    pub async fn start_solo(&self, chat_id: ChatId, profile: &UserProfile) -> Result<(), GameError> {
        let language = self.language_of(profile);
        if self.inner.registry.has_solo(profile.user_id) {
            self.notify(chat_id, &language, "solo_game_already_running")
                .await;
            return Err(GameError::AlreadyRunning);
        }
        self.resolve_player(profile).await?;

        let word = self.inner.words.draw_solo(self.inner.rng.as_ref());
        let state = SoloGameState::new(profile.user_id, chat_id, word).with_language(&language);
        let first_hint = state.current_hint().to_string();
        if let Err(e) = self.inner.registry.create_solo(state) {
            self.notify(chat_id, &language, "solo_game_already_running")
                .await;
            return Err(e);
        }
        tracing::info!("Solo game started for user {}", profile.user_id);

        let texts = self.texts(&language);
        let mut outbox = Outbox::default();
        outbox.send(
            chat_id,
            format!(
                "{}\n\n{}",
                texts.get("solo_game_started", &[]),
                texts.solo_hint(1, &first_hint)
            ),
        );
        self.dispatch(outbox).await;
        Ok(())
    }

    /// Guess for the user's solo session
    pub async fn submit_solo_guess(
        &self,
        user_id: UserId,
        text: &str,
    ) -> Result<SoloOutcome, GameError> {
        let shared = self
            .inner
            .registry
            .solo(user_id)
            .ok_or(GameError::SoloNotFound)?;

        let mut outbox = Outbox::default();
        let outcome = {
            let mut solo = shared.lock().await;
            if !solo.is_active {
                return Err(GameError::SoloNotFound);
            }
            let language = solo.language.clone();
            let texts = self.texts(&language);
            let word = solo.current_word.word.clone();

            if WordValidator::is_correct_guess(text, &word) {
                let score = Scorer::solo_points(solo.hints_given);
                outbox.send(solo.chat_id, texts.solo_solved(solo.hints_given, &word, score));
                solo.is_active = false;
                self.inner.registry.remove_solo(user_id, solo.session_id);
                SoloOutcome::Solved { score }
            } else if let Some(hint) = solo.unlock_next_hint().map(str::to_string) {
                let number = solo.hints_given;
                outbox.send(solo.chat_id, texts.solo_hint(number, &hint));
                SoloOutcome::Hint { number }
            } else {
                outbox.send(solo.chat_id, texts.with_word("solo_no_more_hints", &word));
                solo.is_active = false;
                self.inner.registry.remove_solo(user_id, solo.session_id);
                SoloOutcome::Exhausted
            }
        };
        self.dispatch(outbox).await;

        match outcome {
            SoloOutcome::Solved { score } => {
                tracing::info!("User {} solved solo word for {} points", user_id, score);
                if let Err(e) = self.inner.store.add_points(user_id, score).await {
                    tracing::error!("Failed to flush solo points for {}: {}", user_id, e);
                }
            }
            SoloOutcome::Exhausted => {
                tracing::info!("User {} ran out of solo hints", user_id)
            }
            SoloOutcome::Hint { number } => {
                tracing::debug!("User {} unlocked solo hint {}", user_id, number)
            }
        }
        Ok(outcome)
    }

    /// Route a private message: a pending clue first, then a solo guess
    pub async fn handle_private_message(
        &self,
        profile: &UserProfile,
        text: &str,
    ) -> Result<PrivateRoute, GameError> {
        if let Some(chat_id) = self.pending_clue_chat(profile.user_id).await {
            self.submit_clue(chat_id, profile.user_id, text).await?;
            return Ok(PrivateRoute::Clue { chat_id });
        }
        if self.inner.registry.has_solo(profile.user_id) {
            let outcome = self.submit_solo_guess(profile.user_id, text).await?;
            return Ok(PrivateRoute::Solo(outcome));
        }
        Ok(PrivateRoute::Ignored)
    }

    /// Chat whose game is waiting for a clue from this user
    async fn pending_clue_chat(&self, user_id: UserId) -> Option<ChatId> {
        for shared in self.inner.registry.games() {
            let game = shared.lock().await;
            if game.is_active
                && game.status == GameStatus::WaitingForClue
                && game.is_clue_giver(user_id)
            {
                return Some(game.chat_id);
            }
        }
        None
    }
}
