use futures::future::join_all;
use uuid::Uuid;

use super::{EndReason, GameEngine, Outbox};
use crate::{
    error::GameError,
    gateway::Formatting,
    models::{ChatId, GameState, GameStatus, Player, PlayerStat, RoundNext, UserId},
    timer::TimerKind,
};

impl GameEngine {
    /// Start the next round after a break, or end the game if it was the last one.
    ///
    /// Runs as the `NextRound` timer callback.
    pub(crate) async fn run_next_round(&self, chat_id: ChatId, game_id: Uuid) {
        let Some(shared) = self.inner.registry.game_instance(chat_id, game_id) else {
            tracing::debug!("Next round for finished game {} ignored", game_id);
            return;
        };

        let mut outbox = Outbox::default();
        let (clue_giver, round, prompt) = {
            let mut game = shared.lock().await;
            game.timers.clear(TimerKind::NextRound);
            if !game.is_active || game.status != GameStatus::RoundBreak {
                return;
            }
            if game.round >= game.total_rounds {
                drop(game);
                self.end_game(chat_id, game_id, EndReason::Completed).await;
                return;
            }

            let word = self.inner.words.draw_word(self.inner.rng.as_ref());
            let clue_giver = match game.begin_round(word.clone()) {
                Ok(player) => player.clone(),
                Err(e) => {
                    tracing::error!("Cannot begin round in chat {}: {}", chat_id, e);
                    return;
                }
            };
            let round = game.round;

            let language = game.language.clone();
            let texts = self.texts(&language);
            outbox.send(chat_id, texts.round_start(&game, &clue_giver));
            let prompt_language = clue_giver.language.clone().unwrap_or(language.clone());
            let prompt = self
                .texts(&prompt_language)
                .secret_word_prompt(&clue_giver, &word);

            let token = self.schedule_timer(
                self.timings().clue_reminder,
                chat_id,
                game_id,
                round,
                TimerKind::ClueReminder,
            );
            game.timers.arm(TimerKind::ClueReminder, token);

            tracing::info!(
                "Round {}/{} in chat {}: clue giver {}",
                round,
                game.total_rounds,
                chat_id,
                clue_giver.user_id
            );
            (clue_giver, round, prompt)
        };
        self.dispatch(outbox).await;

        // The secret word goes to the clue giver's private chat
        if let Err(e) = self
            .inner
            .gateway
            .send(clue_giver.user_id, &prompt, &Formatting::html())
            .await
        {
            tracing::warn!(
                "Secret word DM to {} failed, forfeiting round {} in chat {}: {}",
                clue_giver.user_id,
                round,
                chat_id,
                e
            );
            self.forfeit_round(chat_id, game_id, round, GameStatus::WaitingForClue, |texts, game| {
                game.clue_giver
                    .as_ref()
                    .map(|p| texts.with_name("secret_word_dm_failed", p))
                    .unwrap_or_default()
            })
            .await;
        }
    }

    /// Resolve a round with no winner because the game cannot proceed
    pub(crate) async fn forfeit_round<F>(
        &self,
        chat_id: ChatId,
        game_id: Uuid,
        round: u32,
        expected: GameStatus,
        notice: F,
    ) where
        F: FnOnce(&super::Texts<'_>, &GameState) -> String + Send,
    {
        let Some(shared) = self.inner.registry.game_instance(chat_id, game_id) else {
            return;
        };
        let mut outbox = Outbox::default();
        let next = {
            let mut game = shared.lock().await;
            if !game.is_active || game.round != round || game.status != expected {
                return;
            }
            let language = game.language.clone();
            let texts = self.texts(&language);
            outbox.send(chat_id, notice(&texts, &*game));
            match self.resolve_locked(&mut game, &mut outbox) {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!("Cannot forfeit round in chat {}: {}", chat_id, e);
                    return;
                }
            }
        };
        self.finish_round(chat_id, game_id, next, outbox).await;
    }

    /// Close the current round under the lock: scoreboard plus the follow-up timer
    pub(crate) fn resolve_locked(
        &self,
        game: &mut GameState,
        outbox: &mut Outbox,
    ) -> Result<RoundNext, GameError> {
        let next = game.resolve_round()?;
        let language = game.language.clone();
        outbox.send(game.chat_id, self.texts(&language).scoreboard(&game.standings()));

        if next == RoundNext::Advance {
            let token = self.schedule_timer(
                self.timings().round_break,
                game.chat_id,
                game.game_id,
                game.round,
                TimerKind::NextRound,
            );
            game.timers.arm(TimerKind::NextRound, token);
        }
        tracing::debug!(
            "Round {} resolved in chat {}: {:?}",
            game.round,
            game.chat_id,
            next
        );
        Ok(next)
    }

    /// Deliver round-end messages and end the game after the last round
    pub(crate) async fn finish_round(
        &self,
        chat_id: ChatId,
        game_id: Uuid,
        next: RoundNext,
        outbox: Outbox,
    ) {
        self.dispatch(outbox).await;
        if next == RoundNext::End {
            self.end_game(chat_id, game_id, EndReason::Completed).await;
        }
    }

    /// Timer callback for one round. Anything stale is a no-op.
    pub(crate) async fn on_timer(&self, chat_id: ChatId, game_id: Uuid, round: u32, kind: TimerKind) {
        let Some(shared) = self.inner.registry.game_instance(chat_id, game_id) else {
            tracing::debug!("{:?} timer for finished game {} ignored", kind, game_id);
            return;
        };

        let mut outbox = Outbox::default();
        let next = {
            let mut game = shared.lock().await;
            if !game.is_active || game.round != round {
                tracing::debug!("Stale {:?} timer in chat {} ignored", kind, chat_id);
                return;
            }
            game.timers.clear(kind);
            let language = game.language.clone();
            let texts = self.texts(&language);

            match (kind, game.status) {
                (TimerKind::ClueReminder, GameStatus::WaitingForClue) => {
                    // One reminder only; the turn is not skipped
                    if let Some(giver) = game.clue_giver.as_ref() {
                        outbox.send(giver.user_id, texts.with_name("clue_giver_reminder", giver));
                    }
                    None
                }
                (TimerKind::GuessWarning, GameStatus::WaitingForGuesses) => {
                    let seconds = self.timings().after_warning().as_secs().to_string();
                    outbox.send(
                        chat_id,
                        texts.get("guess_time_warning", &[("seconds", &seconds)]),
                    );
                    None
                }
                (TimerKind::GuessTimeout, GameStatus::WaitingForGuesses) => {
                    game.timers.cancel(TimerKind::GuessWarning);
                    let word = game.secret_word.clone().unwrap_or_default();
                    outbox.send(chat_id, texts.with_word("times_up", &word));
                    tracing::info!("Round {} timed out in chat {}", round, chat_id);
                    match self.resolve_locked(&mut game, &mut outbox) {
                        Ok(next) => Some(next),
                        Err(e) => {
                            tracing::error!("Cannot resolve timed out round: {}", e);
                            None
                        }
                    }
                }
                (kind, status) => {
                    tracing::debug!("{:?} timer no longer applies in {:?}", kind, status);
                    return;
                }
            }
        };

        match next {
            Some(next) => self.finish_round(chat_id, game_id, next, outbox).await,
            None => self.dispatch(outbox).await,
        }
    }

    /// Host-issued end command, valid in any phase
    pub async fn end_game_by_host(&self, chat_id: ChatId, user_id: UserId) -> Result<(), GameError> {
        let Some(shared) = self.inner.registry.game(chat_id) else {
            self.notify(chat_id, &self.settings().language, "game_not_found")
                .await;
            return Err(GameError::GameNotFound);
        };

        let game_id = {
            let game = shared.lock().await;
            if !game.is_active {
                return Err(GameError::GameNotFound);
            }
            if !game.is_host(user_id) {
                let text = self
                    .texts(&game.language)
                    .with_host("end_command_not_host", &game);
                drop(game);
                let mut outbox = Outbox::default();
                outbox.send(chat_id, text);
                self.dispatch(outbox).await;
                return Err(GameError::NotHost);
            }
            game.game_id
        };

        if self.end_game(chat_id, game_id, EndReason::Host).await {
            Ok(())
        } else {
            Err(GameError::GameNotFound)
        }
    }

    /// Terminal transition: stop timers, drop the game, announce, flush scores.
    ///
    /// Returns false if this instance had already ended.
    pub(crate) async fn end_game(&self, chat_id: ChatId, game_id: Uuid, reason: EndReason) -> bool {
        let Some(shared) = self.inner.registry.game_instance(chat_id, game_id) else {
            return false;
        };

        let mut outbox = Outbox::default();
        let (deltas, members, winner, played) = {
            let mut game = shared.lock().await;
            if !game.is_active {
                return false;
            }
            if let Err(e) = game.finish() {
                tracing::error!("Cannot end game {}: {}", game_id, e);
                return false;
            }
            self.inner.registry.remove_game(chat_id, game_id);

            let standings = game.standings();
            let winner = game.winner();
            let language = game.language.clone();
            let texts = self.texts(&language);
            if game.round == 0 {
                if let Some(message) = game.lobby_message {
                    outbox.edit(message, texts.lobby_closed(&game), Formatting::html());
                }
            }
            outbox.send(
                chat_id,
                texts.summary(reason, game.total_rounds, &standings, winner.as_ref()),
            );

            let members: Vec<Player> = game.players().to_vec();
            (
                game.positive_deltas(),
                members,
                winner.map(|s| s.player.user_id),
                game.round > 0,
            )
        };

        tracing::info!(
            "Game {} in chat {} ended ({:?}), winner: {:?}",
            game_id,
            chat_id,
            reason,
            winner
        );
        self.dispatch(outbox).await;
        self.flush_scores(&deltas).await;
        if played {
            self.record_game_stats(&members, winner).await;
        }
        true
    }

    /// Push positive session deltas to persistent totals
    async fn flush_scores(&self, deltas: &[(UserId, i64)]) {
        let store = &self.inner.store;
        let results = join_all(
            deltas
                .iter()
                .map(|&(user_id, points)| async move { (user_id, store.add_points(user_id, points).await) }),
        )
        .await;
        for (user_id, result) in results {
            if let Err(e) = result {
                tracing::error!("Failed to flush points for {}: {}", user_id, e);
            }
        }
    }

    async fn record_game_stats(&self, members: &[Player], winner: Option<UserId>) {
        let store = &self.inner.store;
        for player in members {
            if let Err(e) = store
                .increment_stat(player.user_id, PlayerStat::GamesPlayed, 1)
                .await
            {
                tracing::warn!("Failed to record game for {}: {}", player.user_id, e);
            }
        }
        if let Some(user_id) = winner {
            if let Err(e) = store.increment_stat(user_id, PlayerStat::GamesWon, 1).await {
                tracing::warn!("Failed to record win for {}: {}", user_id, e);
            }
        }
    }
}
