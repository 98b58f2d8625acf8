use tokio::time::Instant;
use uuid::Uuid;

use super::{GameEngine, Outbox};
use crate::{
    error::{ClueRejection, GameError},
    game::{Scorer, WordValidator},
    gateway::Formatting,
    models::{ChatId, GameStatus, MessageRef, PlayerStat, UserId},
    timer::TimerKind,
};

/// A group message that may be a guess
#[derive(Debug, Clone)]
pub struct IncomingGuess {
    pub user_id: UserId,
    pub text: String,
    /// The guess message itself, deleted once processed
    pub message: Option<MessageRef>,
    /// Message the guess replies to
    pub reply_to: Option<MessageRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct { points: i64 },
    Incorrect,
}

/// Stats to record once the lock is released
struct RoundWin {
    guesser: UserId,
    clue_giver: Option<UserId>,
    elapsed_secs: f64,
}

impl GameEngine {
    /// Clue from the current clue giver, usually sent privately
    pub async fn submit_clue(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        text: &str,
    ) -> Result<(), GameError> {
        let shared = self
            .inner
            .registry
            .game(chat_id)
            .ok_or(GameError::GameNotFound)?;

        let mut outbox = Outbox::default();
        let accepted = {
            let mut game = shared.lock().await;
            if !game.is_active {
                return Err(GameError::GameNotFound);
            }
            if game.status != GameStatus::WaitingForClue {
                return Err(GameError::WrongPhase(game.status));
            }
            if !game.is_clue_giver(user_id) {
                return Err(GameError::NotClueGiver);
            }
            let secret = game.secret_word.clone().unwrap_or_default();
            let language = game.language.clone();
            let texts = self.texts(&language);

            match WordValidator::validate_clue(text, &secret) {
                Err(rejection) => {
                    let key = match rejection {
                        ClueRejection::NotOneWord => "clue_invalid_not_one_word",
                        ClueRejection::IsSecretWord => "clue_invalid_is_secret_word",
                    };
                    outbox.send(user_id, texts.get(key, &[]));
                    Err(rejection)
                }
                Ok(clue) => {
                    game.timers.cancel(TimerKind::ClueReminder);
                    game.open_guessing(clue, Instant::now())?;

                    let (game_id, round) = (game.game_id, game.round);
                    let warning = self.schedule_timer(
                        self.timings().guess_warning,
                        chat_id,
                        game_id,
                        round,
                        TimerKind::GuessWarning,
                    );
                    let timeout = self.schedule_timer(
                        self.timings().guess_timeout,
                        chat_id,
                        game_id,
                        round,
                        TimerKind::GuessTimeout,
                    );
                    game.timers.arm(TimerKind::GuessWarning, warning);
                    game.timers.arm(TimerKind::GuessTimeout, timeout);

                    outbox.send(user_id, texts.get("clue_received", &[]));
                    Ok((game_id, round, texts.clue_announcement(&game)))
                }
            }
        };
        self.dispatch(outbox).await;

        let (game_id, round, announcement) = match accepted {
            Ok(accepted) => accepted,
            Err(rejection) => {
                tracing::debug!("Clue from {} rejected: {}", user_id, rejection);
                return Err(GameError::InvalidClue(rejection));
            }
        };
        tracing::info!("Clue accepted for round {} in chat {}", round, chat_id);

        match self
            .inner
            .gateway
            .send(chat_id, &announcement, &Formatting::html())
            .await
        {
            Ok(message) => self.attach_clue_message(chat_id, game_id, round, message).await,
            Err(e) => {
                tracing::warn!(
                    "Clue announcement failed in chat {}, forfeiting round {}: {}",
                    chat_id,
                    round,
                    e
                );
                self.forfeit_round(
                    chat_id,
                    game_id,
                    round,
                    GameStatus::WaitingForGuesses,
                    |texts, game| {
                        texts.with_word(
                            "clue_announcement_failed",
                            game.secret_word.as_deref().unwrap_or_default(),
                        )
                    },
                )
                .await;
            }
        }
        Ok(())
    }

    async fn attach_clue_message(
        &self,
        chat_id: ChatId,
        game_id: Uuid,
        round: u32,
        message: MessageRef,
    ) {
        let Some(shared) = self.inner.registry.game_instance(chat_id, game_id) else {
            return;
        };
        let mut game = shared.lock().await;
        if game.is_active
            && game.round == round
            && game.status == GameStatus::WaitingForGuesses
            && game.clue_message.is_none()
        {
            game.clue_message = Some(message);
        }
    }

    /// Group message replying to the clue announcement
    pub async fn submit_guess(
        &self,
        chat_id: ChatId,
        guess: IncomingGuess,
    ) -> Result<GuessOutcome, GameError> {
        let shared = self
            .inner
            .registry
            .game(chat_id)
            .ok_or(GameError::GameNotFound)?;

        let mut outbox = Outbox::default();
        let (outcome, win, next, game_id) = {
            let mut game = shared.lock().await;
            if !game.is_active {
                return Err(GameError::GameNotFound);
            }
            if game.status != GameStatus::WaitingForGuesses {
                return Err(GameError::WrongPhase(game.status));
            }
            let language = game.language.clone();
            let texts = self.texts(&language);

            if !game.is_member(guess.user_id) {
                outbox.send(guess.user_id, texts.get("warning_not_participant", &[]));
                drop(game);
                self.dispatch(outbox).await;
                return Err(GameError::NotParticipant);
            }
            if guess.reply_to.is_none() || guess.reply_to != game.clue_message {
                return Err(GameError::NotAReplyToClue);
            }
            if game.is_clue_giver(guess.user_id) {
                return Err(GameError::ClueGiverGuess);
            }

            if let Some(message) = guess.message {
                outbox.delete(message);
            }
            let secret = game.secret_word.clone().unwrap_or_default();

            if WordValidator::is_correct_guess(&guess.text, &secret) {
                let elapsed = game
                    .guessing_started_at
                    .map(|started| started.elapsed())
                    .unwrap_or_default();
                let points = Scorer::guess_points(elapsed);
                game.timers.cancel(TimerKind::GuessWarning);
                game.timers.cancel(TimerKind::GuessTimeout);
                game.award(guess.user_id, points);

                if let Some(winner) = game.member(guess.user_id) {
                    outbox.send(chat_id, texts.round_won(winner, &secret, points));
                }
                let win = RoundWin {
                    guesser: guess.user_id,
                    clue_giver: game.clue_giver.as_ref().map(|p| p.user_id),
                    elapsed_secs: elapsed.as_secs_f64(),
                };
                tracing::info!(
                    "User {} guessed round {} in chat {} after {:.1}s for {} points",
                    guess.user_id,
                    game.round,
                    chat_id,
                    win.elapsed_secs,
                    points
                );
                let next = self.resolve_locked(&mut game, &mut outbox)?;
                (
                    GuessOutcome::Correct { points },
                    Some(win),
                    Some(next),
                    game.game_id,
                )
            } else {
                let wrong = guess.text.trim();
                if !wrong.is_empty() {
                    game.wrong_guesses.push(wrong.to_string());
                }
                if let Some(message) = game.clue_message {
                    outbox.edit(message, texts.clue_announcement(&game), Formatting::html());
                }
                tracing::debug!("Wrong guess from {} in chat {}", guess.user_id, chat_id);
                (GuessOutcome::Incorrect, None, None, game.game_id)
            }
        };

        match next {
            Some(next) => self.finish_round(chat_id, game_id, next, outbox).await,
            None => self.dispatch(outbox).await,
        }
        if let Some(win) = win {
            self.record_round_win(win).await;
        }
        Ok(outcome)
    }

    async fn record_round_win(&self, win: RoundWin) {
        let store = &self.inner.store;
        if let Err(e) = store
            .increment_stat(win.guesser, PlayerStat::WordsGuessed, 1)
            .await
        {
            tracing::warn!("Failed to record guess for {}: {}", win.guesser, e);
        }
        if let Err(e) = store.record_fastest_guess(win.guesser, win.elapsed_secs).await {
            tracing::warn!("Failed to record guess time for {}: {}", win.guesser, e);
        }
        if let Some(clue_giver) = win.clue_giver {
            if let Err(e) = store
                .increment_stat(clue_giver, PlayerStat::CluesSolved, 1)
                .await
            {
                tracing::warn!("Failed to record solved clue for {}: {}", clue_giver, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::assert_ok;

    use super::{GuessOutcome, IncomingGuess};
    use crate::{
        error::{ClueRejection, GameError},
        models::{GameStatus, MessageRef, PlayerStat},
        test_support::{harness, settle, Harness, CHAT},
        timer::TimerKind,
    };

    fn reply(user_id: i64, text: &str, clue: Option<MessageRef>) -> IncomingGuess {
        IncomingGuess {
            user_id,
            text: text.to_string(),
            message: Some(MessageRef {
                chat_id: CHAT,
                message_id: 10_000 + user_id,
            }),
            reply_to: clue,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_player_round() {
        let h = harness();
        let snapshot = h.started_game(&[1, 2, 3], 10).await;
        assert_eq!(snapshot.turn_order.len(), 3);
        let giver = Harness::clue_giver(&snapshot);

        assert_ok!(h.engine.submit_clue(CHAT, giver, "fruit").await);
        let snapshot = h.snapshot().await;
        assert_eq!(snapshot.status, GameStatus::WaitingForGuesses);
        assert_eq!(snapshot.clue.as_deref(), Some("fruit"));
        assert!(snapshot.clue_message.is_some());
        assert_eq!(
            snapshot.armed_timers,
            vec![TimerKind::GuessWarning, TimerKind::GuessTimeout]
        );

        // outsider is warned privately and leaves no trace
        assert_eq!(
            h.engine
                .submit_guess(CHAT, reply(99, "apple", snapshot.clue_message))
                .await,
            Err(GameError::NotParticipant)
        );
        assert_eq!(h.gateway.count_containing(99, "not part of this game"), 1);
        assert!(h.snapshot().await.wrong_guesses.is_empty());

        tokio::time::sleep(Duration::from_secs(8)).await;
        let guesser = Harness::guesser(&snapshot);
        assert_eq!(
            h.engine
                .submit_guess(CHAT, reply(guesser, "apple", snapshot.clue_message))
                .await,
            Ok(GuessOutcome::Correct { points: 20 })
        );
        settle().await;

        let after = h.snapshot().await;
        assert_eq!(after.round, 2);
        assert_eq!(after.session_scores.get(&guesser), Some(&20));
        assert_eq!(after.current_turn_index, 1);
        assert!(h
            .gateway
            .count_containing(CHAT, "guessed <b>APPLE</b> and earns 20 points")
            == 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clue_must_be_one_word() {
        let h = harness();
        let snapshot = h.started_game(&[1, 2], 3).await;
        let giver = Harness::clue_giver(&snapshot);

        assert_eq!(
            h.engine.submit_clue(CHAT, giver, "red fruit").await,
            Err(GameError::InvalidClue(ClueRejection::NotOneWord))
        );
        assert_eq!(
            h.engine.submit_clue(CHAT, giver, "Apple").await,
            Err(GameError::InvalidClue(ClueRejection::IsSecretWord))
        );
        assert_eq!(h.gateway.count_containing(giver, "exactly one word"), 1);
        assert_eq!(h.gateway.count_containing(giver, "cannot be the secret word"), 1);

        let after = h.snapshot().await;
        assert_eq!(after.status, GameStatus::WaitingForClue);
        assert!(after.clue.is_none());
        // the reminder is still pending
        assert_eq!(after.armed_timers, vec![TimerKind::ClueReminder]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_clue_giver_may_give_clue() {
        let h = harness();
        let snapshot = h.started_game(&[1, 2], 3).await;
        let guesser = Harness::guesser(&snapshot);
        assert_eq!(
            h.engine.submit_clue(CHAT, guesser, "fruit").await,
            Err(GameError::NotClueGiver)
        );
        assert_eq!(h.snapshot().await.status, GameStatus::WaitingForClue);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_clue_is_wrong_phase() {
        let h = harness();
        let snapshot = h.started_game(&[1, 2], 3).await;
        h.give_clue().await;
        assert_eq!(
            h.engine
                .submit_clue(CHAT, Harness::clue_giver(&snapshot), "tree")
                .await,
            Err(GameError::WrongPhase(GameStatus::WaitingForGuesses))
        );
        assert_eq!(h.snapshot().await.clue.as_deref(), Some("fruit"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_guesses_rerender_announcement() {
        let h = harness();
        h.started_game(&[1, 2, 3], 3).await;
        let snapshot = h.give_clue().await;
        let clue = snapshot.clue_message;
        let guesser = Harness::guesser(&snapshot);

        for word in ["pear", "plum"] {
            assert_eq!(
                h.engine.submit_guess(CHAT, reply(guesser, word, clue)).await,
                Ok(GuessOutcome::Incorrect)
            );
        }

        let after = h.snapshot().await;
        assert_eq!(after.wrong_guesses, vec!["pear", "plum"]);
        assert_eq!(after.status, GameStatus::WaitingForGuesses);

        let (message, text, _) = h.gateway.edits().pop().unwrap();
        assert_eq!(Some(message), clue);
        assert!(text.contains("❌ pear\n❌ plum"));
        assert_eq!(h.gateway.deleted().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guess_must_reply_to_clue() {
        let h = harness();
        h.started_game(&[1, 2], 3).await;
        let snapshot = h.give_clue().await;
        let guesser = Harness::guesser(&snapshot);

        let stray = Some(MessageRef {
            chat_id: CHAT,
            message_id: 1,
        });
        for reply_to in [None, stray] {
            assert_eq!(
                h.engine
                    .submit_guess(CHAT, reply(guesser, "apple", reply_to))
                    .await,
                Err(GameError::NotAReplyToClue)
            );
        }
        assert!(h.gateway.deleted().is_empty());
        assert_eq!(h.snapshot().await.round, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clue_giver_cannot_guess() {
        let h = harness();
        h.started_game(&[1, 2], 3).await;
        let snapshot = h.give_clue().await;
        assert_eq!(
            h.engine
                .submit_guess(
                    CHAT,
                    reply(Harness::clue_giver(&snapshot), "apple", snapshot.clue_message)
                )
                .await,
            Err(GameError::ClueGiverGuess)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_guess_before_clue_is_wrong_phase() {
        let h = harness();
        let snapshot = h.started_game(&[1, 2], 3).await;
        assert_eq!(
            h.engine
                .submit_guess(CHAT, reply(Harness::guesser(&snapshot), "apple", None))
                .await,
            Err(GameError::WrongPhase(GameStatus::WaitingForClue))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_points_follow_guess_speed() {
        for (wait, expected) in [(20, 15), (40, 10), (50, 5)] {
            let h = harness();
            h.started_game(&[1, 2], 3).await;
            let snapshot = h.give_clue().await;

            tokio::time::sleep(Duration::from_secs(wait)).await;
            let outcome = h
                .engine
                .submit_guess(
                    CHAT,
                    reply(Harness::guesser(&snapshot), " APPLE ", snapshot.clue_message),
                )
                .await;
            assert_eq!(outcome, Ok(GuessOutcome::Correct { points: expected }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_win_updates_stats() {
        let h = harness();
        h.started_game(&[1, 2], 3).await;
        let snapshot = h.give_clue().await;
        let guesser = Harness::guesser(&snapshot);
        let giver = Harness::clue_giver(&snapshot);

        tokio::time::sleep(Duration::from_secs(12)).await;
        h.engine
            .submit_guess(CHAT, reply(guesser, "apple", snapshot.clue_message))
            .await
            .unwrap();

        let guesser_record = h.store.player(guesser).unwrap();
        assert_eq!(guesser_record.stat(PlayerStat::WordsGuessed), 1);
        let fastest = guesser_record.fastest_guess_secs.unwrap();
        assert!((12.0..12.1).contains(&fastest));
        assert_eq!(h.store.player(giver).unwrap().stat(PlayerStat::CluesSolved), 1);
        // totals only move at game end
        assert!(h.store.point_log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_positive_scores_are_flushed() {
        let h = harness();
        h.started_game(&[1, 2, 3], 3).await;
        let snapshot = h.give_clue().await;
        let guesser = Harness::guesser(&snapshot);
        h.engine
            .submit_guess(CHAT, reply(guesser, "apple", snapshot.clue_message))
            .await
            .unwrap();
        settle().await;

        h.engine.end_game_by_host(CHAT, 1).await.unwrap();
        assert_eq!(h.store.point_log(), vec![(guesser, 20)]);
        assert_eq!(h.store.points(guesser), 20);
        assert_eq!(h.store.player(guesser).unwrap().games_won, 1);
        assert_eq!(
            h.gateway.count_containing(CHAT, "Winner: <b>"),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_failure_does_not_block_end() {
        let h = harness();
        h.started_game(&[1, 2], 3).await;
        let snapshot = h.give_clue().await;
        h.engine
            .submit_guess(
                CHAT,
                reply(Harness::guesser(&snapshot), "apple", snapshot.clue_message),
            )
            .await
            .unwrap();
        settle().await;

        h.store.set_unavailable(true);
        assert_ok!(h.engine.end_game_by_host(CHAT, 1).await);
        assert!(h.engine.snapshot(CHAT).await.is_none());
        assert!(h.store.point_log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_announcement_failure_forfeits_round() {
        let h = harness();
        let snapshot = h.started_game(&[1, 2], 3).await;
        let giver = Harness::clue_giver(&snapshot);

        h.gateway.fail_chat(CHAT);
        assert_ok!(h.engine.submit_clue(CHAT, giver, "fruit").await);
        h.gateway.restore_chat(CHAT);
        settle().await;

        let after = h.snapshot().await;
        assert_eq!(after.round, 2);
        assert_eq!(after.status, GameStatus::WaitingForClue);
        assert!(after.session_scores.is_empty());
    }
}
