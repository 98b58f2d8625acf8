//! Fakes and fixtures shared by the engine tests.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    config::Timings,
    dictionary::{SoloWord, WordBank},
    engine::{EngineSettings, GameEngine},
    error::GatewayError,
    game::StdRandom,
    gateway::{Formatting, JsonLocalizer, MemoryStore, MessagingGateway},
    models::{ChatId, GameSnapshot, MessageRef, UserId, UserProfile},
};

pub const CHAT: ChatId = -1001;

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: MessageRef,
    pub text: String,
    pub formatting: Formatting,
}

/// Gateway that remembers everything and can be told to fail per chat
#[derive(Debug, Default)]
pub struct RecordingGateway {
    next_id: AtomicI64,
    sent: Mutex<Vec<SentMessage>>,
    edits: Mutex<Vec<(MessageRef, String, Formatting)>>,
    deleted: Mutex<Vec<MessageRef>>,
    unreachable: Mutex<HashSet<ChatId>>,
}

impl RecordingGateway {
    pub fn fail_chat(&self, chat_id: ChatId) {
        self.unreachable.lock().unwrap().insert(chat_id);
    }

    pub fn restore_chat(&self, chat_id: ChatId) {
        self.unreachable.lock().unwrap().remove(&chat_id);
    }

    pub fn sent_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.message.chat_id == chat_id)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of messages to `chat_id` containing `needle`
    pub fn count_containing(&self, chat_id: ChatId, needle: &str) -> usize {
        self.sent_to(chat_id)
            .iter()
            .filter(|text| text.contains(needle))
            .count()
    }

    pub fn edits(&self) -> Vec<(MessageRef, String, Formatting)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deleted.lock().unwrap().clone()
    }

    fn check(&self, chat_id: ChatId) -> Result<(), GatewayError> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            Err(GatewayError::Unreachable(chat_id))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        formatting: &Formatting,
    ) -> Result<MessageRef, GatewayError> {
        self.check(chat_id)?;
        let message = MessageRef {
            chat_id,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.sent.lock().unwrap().push(SentMessage {
            message,
            text: text.to_string(),
            formatting: formatting.clone(),
        });
        Ok(message)
    }

    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        formatting: &Formatting,
    ) -> Result<(), GatewayError> {
        self.check(message.chat_id)?;
        self.edits
            .lock()
            .unwrap()
            .push((message, text.to_string(), formatting.clone()));
        Ok(())
    }

    async fn delete(&self, message: MessageRef) -> Result<(), GatewayError> {
        self.check(message.chat_id)?;
        self.deleted.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct Harness {
    pub engine: GameEngine,
    pub gateway: Arc<RecordingGateway>,
    pub store: Arc<MemoryStore>,
}

/// Round rules at their real lengths, no pauses between rounds
pub fn test_timings() -> Timings {
    Timings {
        round_break: Duration::ZERO,
        game_start_delay: Duration::ZERO,
        ..Timings::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_timings())
}

pub fn harness_with(timings: Timings) -> Harness {
    let gateway = Arc::new(RecordingGateway::default());
    let store = Arc::new(MemoryStore::new());
    let words = WordBank::from_parts(
        vec!["APPLE".to_string()],
        vec![SoloWord {
            word: "ISLAND".to_string(),
            hints: vec!["SEA".into(), "BEACH".into(), "REMOTE".into()],
        }],
    );
    let engine = GameEngine::new(
        gateway.clone(),
        store.clone(),
        Arc::new(JsonLocalizer::builtin()),
        words,
        Arc::new(StdRandom::seeded(7)),
        EngineSettings {
            timings,
            ..EngineSettings::default()
        },
    );
    Harness {
        engine,
        gateway,
        store,
    }
}

pub fn profile(user_id: UserId) -> UserProfile {
    UserProfile::new(user_id, format!("Player{}", user_id))
}

/// Let spawned tasks and zero-length timers run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

impl Harness {
    pub async fn snapshot(&self) -> GameSnapshot {
        self.engine.snapshot(CHAT).await.expect("game should exist")
    }

    /// Lobby hosted by the first id, everyone joined and started, round 1 open
    pub async fn started_game(&self, ids: &[UserId], rounds: u32) -> GameSnapshot {
        self.engine
            .create_game(CHAT, &profile(ids[0]), Some(rounds))
            .await
            .unwrap();
        for &id in &ids[1..] {
            self.engine.join_game(CHAT, &profile(id)).await.unwrap();
        }
        self.engine.start_game(CHAT, ids[0]).await.unwrap();
        settle().await;
        self.snapshot().await
    }

    pub fn clue_giver(snapshot: &GameSnapshot) -> UserId {
        snapshot
            .clue_giver
            .as_ref()
            .expect("round should have a clue giver")
            .user_id
    }

    /// Any member other than the current clue giver
    pub fn guesser(snapshot: &GameSnapshot) -> UserId {
        let giver = Self::clue_giver(snapshot);
        snapshot
            .players
            .iter()
            .map(|p| p.user_id)
            .find(|&id| id != giver)
            .expect("game should have a guesser")
    }

    /// Submit a valid clue for the current round
    pub async fn give_clue(&self) -> GameSnapshot {
        let snapshot = self.snapshot().await;
        self.engine
            .submit_clue(CHAT, Self::clue_giver(&snapshot), "fruit")
            .await
            .unwrap();
        self.snapshot().await
    }
}
