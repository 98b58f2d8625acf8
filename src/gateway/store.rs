use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use dashmap::DashMap;

use super::PersistenceStore;
use crate::{
    error::StoreError,
    models::{Player, PlayerStat, UserId, UserProfile},
};

/// Process-local player store
#[derive(Debug, Default)]
pub struct MemoryStore {
    players: DashMap<UserId, Player>,
    /// Every accepted `add_points` call, in order
    point_log: Mutex<Vec<(UserId, i64)>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, to exercise error paths
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn player(&self, user_id: UserId) -> Option<Player> {
        self.players.get(&user_id).map(|p| p.clone())
    }

    pub fn points(&self, user_id: UserId) -> i64 {
        self.players.get(&user_id).map(|p| p.points).unwrap_or(0)
    }

    pub fn point_log(&self) -> Vec<(UserId, i64)> {
        self.point_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn get_or_create_player(&self, profile: &UserProfile) -> Result<Player, StoreError> {
        self.check_available()?;
        let mut entry = self
            .players
            .entry(profile.user_id)
            .or_insert_with(|| Player::from_profile(profile));
        // Names can change between messages
        entry.first_name = profile.first_name.clone();
        entry.username = profile.username.clone();
        if profile.language.is_some() {
            entry.language = profile.language.clone();
        }
        Ok(entry.clone())
    }

    async fn add_points(&self, user_id: UserId, delta: i64) -> Result<(), StoreError> {
        self.check_available()?;
        let mut player = self
            .players
            .get_mut(&user_id)
            .ok_or(StoreError::PlayerNotFound(user_id))?;
        player.points += delta;
        tracing::info!(
            "Player {} awarded {} points. New total: {}",
            user_id,
            delta,
            player.points
        );
        drop(player);
        if let Ok(mut log) = self.point_log.lock() {
            log.push((user_id, delta));
        }
        Ok(())
    }

    async fn increment_stat(
        &self,
        user_id: UserId,
        stat: PlayerStat,
        by: i64,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut player = self
            .players
            .get_mut(&user_id)
            .ok_or(StoreError::PlayerNotFound(user_id))?;
        *player.stat_mut(stat) += by;
        Ok(())
    }

    async fn record_fastest_guess(&self, user_id: UserId, secs: f64) -> Result<(), StoreError> {
        self.check_available()?;
        let mut player = self
            .players
            .get_mut(&user_id)
            .ok_or(StoreError::PlayerNotFound(user_id))?;
        if player.fastest_guess_secs.map_or(true, |best| secs < best) {
            player.fastest_guess_secs = Some(secs);
        }
        Ok(())
    }
}
