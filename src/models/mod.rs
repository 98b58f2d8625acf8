pub mod game;
pub mod player;
pub mod solo;

pub use game::{GameSnapshot, GameState, GameStatus, RoundNext, Standing};
pub use player::{Player, PlayerStat, UserProfile};
pub use solo::SoloGameState;

/// Chat identifier as issued by the transport
pub type ChatId = i64;
/// User identifier as issued by the transport
pub type UserId = i64;

/// Location of a message previously sent through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
}
