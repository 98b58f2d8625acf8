use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::GameError,
    models::{ChatId, GameState, SoloGameState, UserId},
};

pub type SharedGame = Arc<Mutex<GameState>>;
pub type SharedSolo = Arc<Mutex<SoloGameState>>;

/// Registry slot; the id lets removal target one specific game instance
#[derive(Debug, Clone)]
struct Slot<T> {
    id: Uuid,
    state: Arc<Mutex<T>>,
}

/// Active games keyed by chat and solo sessions keyed by user.
///
/// The maps only guarantee atomic get/create/delete per key. Everything that
/// reads or mutates a game goes through its own mutex.
#[derive(Debug, Default)]
pub struct GameRegistry {
    games: DashMap<ChatId, Slot<GameState>>,
    solos: DashMap<UserId, Slot<SoloGameState>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a game unless one is already running in the chat
    pub fn create_game(&self, state: GameState) -> Result<SharedGame, GameError> {
        match self.games.entry(state.chat_id) {
            Entry::Occupied(_) => Err(GameError::AlreadyRunning),
            Entry::Vacant(vacant) => {
                let slot = Slot {
                    id: state.game_id,
                    state: Arc::new(Mutex::new(state)),
                };
                let shared = slot.state.clone();
                vacant.insert(slot);
                Ok(shared)
            }
        }
    }

    pub fn game(&self, chat_id: ChatId) -> Option<SharedGame> {
        self.games.get(&chat_id).map(|slot| slot.state.clone())
    }

    /// Look up a game only if it is still the same instance
    pub fn game_instance(&self, chat_id: ChatId, game_id: Uuid) -> Option<SharedGame> {
        self.games
            .get(&chat_id)
            .filter(|slot| slot.id == game_id)
            .map(|slot| slot.state.clone())
    }

    pub fn remove_game(&self, chat_id: ChatId, game_id: Uuid) -> bool {
        self.games
            .remove_if(&chat_id, |_, slot| slot.id == game_id)
            .is_some()
    }

    /// Handles to every running game
    pub fn games(&self) -> Vec<SharedGame> {
        self.games.iter().map(|slot| slot.state.clone()).collect()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn create_solo(&self, state: SoloGameState) -> Result<SharedSolo, GameError> {
        match self.solos.entry(state.user_id) {
            Entry::Occupied(_) => Err(GameError::AlreadyRunning),
            Entry::Vacant(vacant) => {
                let slot = Slot {
                    id: state.session_id,
                    state: Arc::new(Mutex::new(state)),
                };
                let shared = slot.state.clone();
                vacant.insert(slot);
                Ok(shared)
            }
        }
    }

    pub fn solo(&self, user_id: UserId) -> Option<SharedSolo> {
        self.solos.get(&user_id).map(|slot| slot.state.clone())
    }

    pub fn remove_solo(&self, user_id: UserId, session_id: Uuid) -> bool {
        self.solos
            .remove_if(&user_id, |_, slot| slot.id == session_id)
            .is_some()
    }

    pub fn has_solo(&self, user_id: UserId) -> bool {
        self.solos.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dictionary::SoloWord,
        models::{Player, UserProfile},
    };

    fn game(chat_id: ChatId) -> GameState {
        let host = Player::from_profile(&UserProfile::new(1, "Host"));
        GameState::new(chat_id, host, 10, "en".to_string())
    }

    #[tokio::test]
    async fn test_one_game_per_chat() {
        let registry = GameRegistry::new();
        assert!(registry.create_game(game(-1)).is_ok());
        assert_eq!(
            registry.create_game(game(-1)).err(),
            Some(GameError::AlreadyRunning)
        );
        assert!(registry.create_game(game(-2)).is_ok());
        assert_eq!(registry.game_count(), 2);
    }

    #[tokio::test]
    async fn test_remove_targets_instance() {
        let registry = GameRegistry::new();
        let first = registry.create_game(game(-1)).unwrap();
        let first_id = first.lock().await.game_id;
        assert!(registry.remove_game(-1, first_id));

        let second = registry.create_game(game(-1)).unwrap();
        let second_id = second.lock().await.game_id;

        // a late removal for the old instance leaves the new one alone
        assert!(!registry.remove_game(-1, first_id));
        assert!(registry.game_instance(-1, first_id).is_none());
        assert!(registry.game_instance(-1, second_id).is_some());
    }

    #[tokio::test]
    async fn test_one_solo_per_user() {
        let registry = GameRegistry::new();
        let word = SoloWord {
            word: "MOON".into(),
            hints: vec!["NIGHT".into()],
        };
        let solo = registry
            .create_solo(SoloGameState::new(9, 9, word.clone()))
            .unwrap();
        assert!(registry.create_solo(SoloGameState::new(9, 9, word)).is_err());
        assert!(registry.has_solo(9));

        let session_id = solo.lock().await.session_id;
        assert!(registry.remove_solo(9, session_id));
        assert!(!registry.has_solo(9));
    }
}
