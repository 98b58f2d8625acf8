//! Contracts for the collaborators the engine drives, plus reference
//! implementations used by the binary and the tests.

pub mod localizer;
pub mod messaging;
pub mod store;

use async_trait::async_trait;

use crate::{
    error::{GatewayError, StoreError},
    models::{ChatId, MessageRef, Player, PlayerStat, UserId, UserProfile},
};

pub use localizer::{escape_html, render, JsonLocalizer};
pub use messaging::ConsoleGateway;
pub use store::MemoryStore;

/// How the transport should present a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatting {
    /// Text contains HTML markup
    pub html: bool,
    /// Label of an inline "join" button, if the message carries one
    pub join_button: Option<String>,
}

impl Formatting {
    pub fn html() -> Self {
        Self {
            html: true,
            join_button: None,
        }
    }

    pub fn with_join_button(mut self, label: impl Into<String>) -> Self {
        self.join_button = Some(label.into());
        self
    }
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        formatting: &Formatting,
    ) -> Result<MessageRef, GatewayError>;

    /// Replace the text of a sent message. A button survives only if
    /// `formatting` carries it again.
    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        formatting: &Formatting,
    ) -> Result<(), GatewayError>;

    async fn delete(&self, message: MessageRef) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn get_or_create_player(&self, profile: &UserProfile) -> Result<Player, StoreError>;

    async fn add_points(&self, user_id: UserId, delta: i64) -> Result<(), StoreError>;

    async fn increment_stat(
        &self,
        user_id: UserId,
        stat: PlayerStat,
        by: i64,
    ) -> Result<(), StoreError>;

    /// Keep the faster of the stored and the offered guess time
    async fn record_fastest_guess(&self, user_id: UserId, secs: f64) -> Result<(), StoreError>;
}

/// String lookup by language; never fails, falls back to the key
pub trait Localizer: Send + Sync {
    fn get(&self, lang: &str, key: &str) -> String;
}
