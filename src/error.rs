use thiserror::Error;

use crate::models::GameStatus;

/// Errors returned by engine operations.
///
/// Validation variants never change game state; the transport layer may show
/// them to the actor but nothing else depends on them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("a game is already running")]
    AlreadyRunning,
    #[error("no active game")]
    GameNotFound,
    #[error("no active solo game")]
    SoloNotFound,
    #[error("only the host can do that")]
    NotHost,
    #[error("the lobby is closed")]
    LobbyClosed,
    #[error("at least {required} players are needed, have {current}")]
    NotEnoughPlayers { required: usize, current: usize },
    #[error("it is not this player's turn")]
    NotClueGiver,
    #[error("player is not part of this game")]
    NotParticipant,
    #[error("the clue giver cannot guess")]
    ClueGiverGuess,
    #[error("guess does not reply to the clue announcement")]
    NotAReplyToClue,
    #[error("invalid clue: {0}")]
    InvalidClue(ClueRejection),
    #[error("action not allowed while {0:?}")]
    WrongPhase(GameStatus),
    #[error("illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: GameStatus, to: GameStatus },
    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Why a clue was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClueRejection {
    NotOneWord,
    IsSecretWord,
}

impl std::fmt::Display for ClueRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClueRejection::NotOneWord => write!(f, "clue must be exactly one word"),
            ClueRejection::IsSecretWord => write!(f, "clue cannot be the secret word"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("chat {0} is unreachable")]
    Unreachable(i64),
    #[error("message {message_id} in chat {chat_id} not found")]
    MessageNotFound { chat_id: i64, message_id: i64 },
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("player {0} not found")]
    PlayerNotFound(i64),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        GameError::Persistence(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} is empty")]
    Empty(String),
}
