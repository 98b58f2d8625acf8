use std::collections::HashMap;

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use super::{ChatId, MessageRef, Player, UserId};
use crate::{error::GameError, timer::RoundTimers};

pub const MIN_ROUNDS: u32 = 3;
pub const MAX_ROUNDS: u32 = 25;
pub const MIN_PLAYERS: usize = 2;

/// Phase of a chat game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Players may join, rounds have not begun
    Lobby,
    WaitingForClue,
    WaitingForGuesses,
    /// A round has been resolved and the next step is pending
    RoundBreak,
    /// Terminal
    Ended,
}

impl GameStatus {
    /// Transition table for the round lifecycle
    pub fn can_transition_to(self, next: GameStatus) -> bool {
        use GameStatus::*;
        matches!(
            (self, next),
            (Lobby, RoundBreak)
                | (RoundBreak, WaitingForClue)
                | (WaitingForClue, WaitingForGuesses)
                | (WaitingForClue, RoundBreak)
                | (WaitingForGuesses, RoundBreak)
                | (Lobby | WaitingForClue | WaitingForGuesses | RoundBreak, Ended)
        )
    }

    pub fn accepts_joins(self) -> bool {
        self == GameStatus::Lobby
    }
}

/// What follows a resolved round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundNext {
    Advance,
    End,
}

/// One scoreboard line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub player: Player,
    pub points: i64,
}

/// Live state of one chat game.
///
/// Only ever touched while holding the registry's per-chat lock.
#[derive(Debug)]
pub struct GameState {
    pub game_id: Uuid,
    pub chat_id: ChatId,
    pub status: GameStatus,
    pub is_active: bool,
    pub host: Player,
    /// Members in join order
    players: Vec<Player>,
    turn_order: Vec<Player>,
    pub current_turn_index: usize,
    pub round: u32,
    pub total_rounds: u32,
    pub clue_giver: Option<Player>,
    pub secret_word: Option<String>,
    pub clue: Option<String>,
    pub wrong_guesses: Vec<String>,
    pub clue_message: Option<MessageRef>,
    pub lobby_message: Option<MessageRef>,
    pub session_scores: HashMap<UserId, i64>,
    pub guessing_started_at: Option<Instant>,
    pub timers: RoundTimers,
    /// Language used for public messages in this chat
    pub language: String,
}

impl GameState {
    pub fn new(chat_id: ChatId, host: Player, total_rounds: u32, language: String) -> Self {
        Self {
            game_id: Uuid::new_v4(),
            chat_id,
            status: GameStatus::Lobby,
            is_active: true,
            players: vec![host.clone()],
            host,
            turn_order: Vec::new(),
            current_turn_index: 0,
            round: 0,
            total_rounds: total_rounds.clamp(MIN_ROUNDS, MAX_ROUNDS),
            clue_giver: None,
            secret_word: None,
            clue: None,
            wrong_guesses: Vec::new(),
            clue_message: None,
            lobby_message: None,
            session_scores: HashMap::new(),
            guessing_started_at: None,
            timers: RoundTimers::default(),
            language,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn turn_order(&self) -> &[Player] {
        &self.turn_order
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.players.iter().any(|p| p.user_id == user_id)
    }

    pub fn member(&self, user_id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn is_host(&self, user_id: UserId) -> bool {
        self.host.user_id == user_id
    }

    pub fn is_clue_giver(&self, user_id: UserId) -> bool {
        self.clue_giver
            .as_ref()
            .map(|p| p.user_id == user_id)
            .unwrap_or(false)
    }

    /// Add a player to the lobby. Returns false if already a member.
    pub fn add_player(&mut self, player: Player) -> Result<bool, GameError> {
        if self.is_member(player.user_id) {
            return Ok(false);
        }
        if !self.status.accepts_joins() {
            return Err(GameError::LobbyClosed);
        }
        self.players.push(player);
        Ok(true)
    }

    pub fn transition(&mut self, next: GameStatus) -> Result<(), GameError> {
        if !self.status.can_transition_to(next) {
            return Err(GameError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Close the lobby and fix the turn order from a permutation of member indices
    pub fn start(&mut self, permutation: &[usize]) -> Result<(), GameError> {
        if self.status != GameStatus::Lobby {
            return Err(GameError::WrongPhase(self.status));
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                required: MIN_PLAYERS,
                current: self.players.len(),
            });
        }
        debug_assert_eq!(permutation.len(), self.players.len());
        self.transition(GameStatus::RoundBreak)?;
        self.turn_order = permutation
            .iter()
            .map(|&idx| self.players[idx].clone())
            .collect();
        Ok(())
    }

    /// Move to the next round with a fresh secret word
    pub fn begin_round(&mut self, secret_word: String) -> Result<&Player, GameError> {
        if self.turn_order.is_empty() {
            return Err(GameError::WrongPhase(self.status));
        }
        self.transition(GameStatus::WaitingForClue)?;
        self.round += 1;
        self.current_turn_index = (self.round as usize - 1) % self.turn_order.len();
        self.clue_giver = Some(self.turn_order[self.current_turn_index].clone());
        self.secret_word = Some(secret_word);
        self.clue = None;
        self.wrong_guesses.clear();
        self.clue_message = None;
        self.guessing_started_at = None;
        Ok(&self.turn_order[self.current_turn_index])
    }

    /// Accept a clue and open the guessing window
    pub fn open_guessing(&mut self, clue: String, now: Instant) -> Result<(), GameError> {
        self.transition(GameStatus::WaitingForGuesses)?;
        self.clue = Some(clue);
        self.guessing_started_at = Some(now);
        Ok(())
    }

    /// Close the current round. Exactly one call succeeds per round.
    pub fn resolve_round(&mut self) -> Result<RoundNext, GameError> {
        self.transition(GameStatus::RoundBreak)?;
        self.timers.cancel_all();
        if self.round >= self.total_rounds {
            Ok(RoundNext::End)
        } else {
            Ok(RoundNext::Advance)
        }
    }

    pub fn award(&mut self, user_id: UserId, points: i64) -> i64 {
        let total = self.session_scores.entry(user_id).or_insert(0);
        *total += points;
        *total
    }

    pub fn score_of(&self, user_id: UserId) -> i64 {
        self.session_scores.get(&user_id).copied().unwrap_or(0)
    }

    /// Players by session score descending, ties kept in join order
    pub fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .players
            .iter()
            .map(|p| Standing {
                player: p.clone(),
                points: self.score_of(p.user_id),
            })
            .collect();
        standings.sort_by(|a, b| b.points.cmp(&a.points));
        standings
    }

    /// Highest scorer, first in join order on ties. None when nobody scored.
    pub fn winner(&self) -> Option<Standing> {
        self.standings().into_iter().next().filter(|s| s.points > 0)
    }

    /// Session deltas that should reach persistent totals
    pub fn positive_deltas(&self) -> Vec<(UserId, i64)> {
        self.players
            .iter()
            .map(|p| (p.user_id, self.score_of(p.user_id)))
            .filter(|(_, points)| *points > 0)
            .collect()
    }

    /// Stop the game. Timers are cancelled and no further transition is legal.
    pub fn finish(&mut self) -> Result<(), GameError> {
        self.transition(GameStatus::Ended)?;
        self.is_active = false;
        self.timers.cancel_all();
        Ok(())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_id: self.game_id,
            chat_id: self.chat_id,
            status: self.status,
            is_active: self.is_active,
            host: self.host.clone(),
            players: self.players.clone(),
            turn_order: self.turn_order.clone(),
            current_turn_index: self.current_turn_index,
            round: self.round,
            total_rounds: self.total_rounds,
            clue_giver: self.clue_giver.clone(),
            secret_word: self.secret_word.clone(),
            clue: self.clue.clone(),
            wrong_guesses: self.wrong_guesses.clone(),
            clue_message: self.clue_message,
            session_scores: self.session_scores.clone(),
            armed_timers: self.timers.armed(),
        }
    }
}

/// Read-only copy of a game for callers outside the lock
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub game_id: Uuid,
    pub chat_id: ChatId,
    pub status: GameStatus,
    pub is_active: bool,
    pub host: Player,
    pub players: Vec<Player>,
    pub turn_order: Vec<Player>,
    pub current_turn_index: usize,
    pub round: u32,
    pub total_rounds: u32,
    pub clue_giver: Option<Player>,
    pub secret_word: Option<String>,
    pub clue: Option<String>,
    pub wrong_guesses: Vec<String>,
    pub clue_message: Option<MessageRef>,
    pub session_scores: HashMap<UserId, i64>,
    pub armed_timers: Vec<crate::timer::TimerKind>,
}
