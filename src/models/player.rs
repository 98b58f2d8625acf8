use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Identity of an inbound actor as reported by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub first_name: String,
    pub username: Option<String>,
    /// IETF language tag reported by the client, if any
    pub language: Option<String>,
}

impl UserProfile {
    pub fn new(user_id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            first_name: first_name.into(),
            username: None,
            language: None,
        }
    }
}

/// Persistent player record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: UserId,
    pub first_name: String,
    pub username: Option<String>,
    pub language: Option<String>,
    pub points: i64,
    pub games_played: i64,
    pub games_won: i64,
    pub words_guessed: i64,
    pub clues_solved: i64,
    /// Fastest correct guess in seconds, None until the first one
    pub fastest_guess_secs: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Counters kept on the player record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStat {
    GamesPlayed,
    GamesWon,
    WordsGuessed,
    CluesSolved,
}

impl Player {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            first_name: profile.first_name.clone(),
            username: profile.username.clone(),
            language: profile.language.clone(),
            points: 0,
            games_played: 0,
            games_won: 0,
            words_guessed: 0,
            clues_solved: 0,
            fastest_guess_secs: None,
            created_at: Utc::now(),
        }
    }

    /// Get the best display name for this player
    /// Priority: first_name > username > numeric id
    pub fn display_name(&self) -> String {
        if !self.first_name.trim().is_empty() {
            self.first_name.clone()
        } else if let Some(username) = self.username.as_deref() {
            username.to_string()
        } else {
            self.user_id.to_string()
        }
    }

    pub fn stat(&self, stat: PlayerStat) -> i64 {
        match stat {
            PlayerStat::GamesPlayed => self.games_played,
            PlayerStat::GamesWon => self.games_won,
            PlayerStat::WordsGuessed => self.words_guessed,
            PlayerStat::CluesSolved => self.clues_solved,
        }
    }

    pub fn stat_mut(&mut self, stat: PlayerStat) -> &mut i64 {
        match stat {
            PlayerStat::GamesPlayed => &mut self.games_played,
            PlayerStat::GamesWon => &mut self.games_won,
            PlayerStat::WordsGuessed => &mut self.words_guessed,
            PlayerStat::CluesSolved => &mut self.clues_solved,
        }
    }

    /// Win rate in percent over finished games
    pub fn win_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            (self.games_won as f32 / self.games_played as f32) * 100.0
        }
    }
}
