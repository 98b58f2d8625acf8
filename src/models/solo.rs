use uuid::Uuid;

use super::{ChatId, UserId};
use crate::dictionary::SoloWord;

/// Single-player hint-unlocking session
#[derive(Debug, Clone)]
pub struct SoloGameState {
    pub session_id: Uuid,
    pub user_id: UserId,
    /// Chat the session replies into
    pub chat_id: ChatId,
    pub current_word: SoloWord,
    /// Number of hints revealed so far, starts at 1
    pub hints_given: usize,
    pub is_active: bool,
    pub language: String,
}

impl SoloGameState {
    pub fn new(user_id: UserId, chat_id: ChatId, current_word: SoloWord) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            chat_id,
            current_word,
            hints_given: 1,
            is_active: true,
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn total_hints(&self) -> usize {
        self.current_word.hints.len()
    }

    pub fn current_hint(&self) -> &str {
        &self.current_word.hints[self.hints_given - 1]
    }

    /// Reveal the next hint, if any remain
    pub fn unlock_next_hint(&mut self) -> Option<&str> {
        if self.hints_given < self.total_hints() {
            self.hints_given += 1;
            Some(self.current_hint())
        } else {
            None
        }
    }
}
