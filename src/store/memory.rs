use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::error::{StoreError, StoreResult};
use super::{Store, mutations, sort_local_users, sort_registered_users, sort_tournaments};
use crate::domain::models::{HoleNumber, HoleOutcome, MatchResult, Tournament};
use crate::domain::tournament::Pairing;
use crate::domain::users::{LocalUser, RegisteredUser, email_key};

#[derive(Default)]
struct MemoryState {
    tournaments: HashMap<String, Tournament>,
    users: HashMap<String, RegisteredUser>,
    local_users: HashMap<String, LocalUser>,
}

/// Keeps everything in process memory; contents are lost on exit
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-modify-write of one tournament under the write lock. The edit
    /// runs on a copy, so a failed edit leaves the stored value untouched.
    async fn mutate<F>(&self, id: &str, apply: F) -> StoreResult<Tournament>
    where
        F: FnOnce(&mut Tournament) -> StoreResult<()> + Send,
    {
        let mut state = self.state.write().await;
        let mut tournament = state
            .tournaments
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::tournament_not_found(id))?;

        apply(&mut tournament)?;
        mutations::touch(&mut tournament);

        state.tournaments.insert(id.to_string(), tournament.clone());
        debug!("Updated tournament {} in memory", id);
        Ok(tournament)
    }

    async fn mutate_local_user<F>(&self, email: &str, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut HashMap<String, LocalUser>, String) -> StoreResult<()> + Send,
    {
        let mut state = self.state.write().await;
        apply(&mut state.local_users, email_key(email))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_tournament(&self, mut tournament: Tournament) -> StoreResult<Tournament> {
        mutations::validate_tournament_id(&tournament.id)?;
        let mut state = self.state.write().await;
        if state.tournaments.contains_key(&tournament.id) {
            return Err(StoreError::Conflict(format!("tournament {}", tournament.id)));
        }

        let now = Utc::now();
        tournament.created_at = now;
        tournament.updated_at = now;
        state.tournaments.insert(tournament.id.clone(), tournament.clone());
        debug!("Created tournament {} in memory", tournament.id);
        Ok(tournament)
    }

    async fn get_tournament(&self, id: &str) -> StoreResult<Tournament> {
        let state = self.state.read().await;
        state
            .tournaments
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::tournament_not_found(id))
    }

    async fn update_tournament(&self, tournament: Tournament) -> StoreResult<Tournament> {
        let id = tournament.id.clone();
        self.mutate(&id, move |stored| {
            let created_at = stored.created_at;
            *stored = tournament;
            stored.created_at = created_at;
            Ok(())
        })
        .await
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        let state = self.state.read().await;
        let mut tournaments: Vec<Tournament> = state.tournaments.values().cloned().collect();
        sort_tournaments(&mut tournaments);
        Ok(tournaments)
    }

    async fn delete_tournament(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .tournaments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::tournament_not_found(id))
    }

    async fn update_match_result(
        &self,
        tournament_id: &str,
        round_number: u32,
        match_id: &str,
        result: MatchResult,
        score: &str,
    ) -> StoreResult<Tournament> {
        self.mutate(tournament_id, |t| {
            mutations::apply_match_result(t, round_number, match_id, result, score)
        })
        .await
    }

    async fn set_round_pairings(
        &self,
        tournament_id: &str,
        round_number: u32,
        pairings: Vec<Pairing>,
    ) -> StoreResult<Tournament> {
        self.mutate(tournament_id, move |t| {
            mutations::apply_round_pairings(t, round_number, pairings)
        })
        .await
    }

    async fn set_hole_result(
        &self,
        tournament_id: &str,
        round_number: u32,
        match_id: &str,
        hole: HoleNumber,
        outcome: Option<HoleOutcome>,
    ) -> StoreResult<Tournament> {
        self.mutate(tournament_id, |t| {
            mutations::apply_hole_result(t, round_number, match_id, hole, outcome)
        })
        .await
    }

    async fn register_user(&self, user: RegisteredUser) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.users.insert(user.key(), user);
        Ok(())
    }

    async fn list_registered_users(&self) -> StoreResult<Vec<RegisteredUser>> {
        let state = self.state.read().await;
        let mut users: Vec<RegisteredUser> = state.users.values().cloned().collect();
        sort_registered_users(&mut users);
        Ok(users)
    }

    async fn link_player(
        &self,
        tournament_id: &str,
        player_id: &str,
        email: &str,
    ) -> StoreResult<Tournament> {
        self.mutate(tournament_id, |t| mutations::apply_player_link(t, player_id, email))
            .await
    }

    async fn create_local_user(&self, user: LocalUser) -> StoreResult<()> {
        let email = user.email.clone();
        self.mutate_local_user(&email, move |users, key| {
            if users.contains_key(&key) {
                return Err(StoreError::Conflict(format!("user {}", user.email)));
            }
            users.insert(key, user);
            Ok(())
        })
        .await
    }

    async fn get_local_user(&self, email: &str) -> StoreResult<LocalUser> {
        let state = self.state.read().await;
        state
            .local_users
            .get(&email_key(email))
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(email))
    }

    async fn verify_local_user(&self, token: &str) -> StoreResult<LocalUser> {
        let mut state = self.state.write().await;
        let user = state
            .local_users
            .values_mut()
            .find(|u| u.has_token(token))
            .ok_or_else(|| StoreError::NotFound("verification token".to_string()))?;
        user.mark_verified();
        Ok(user.clone())
    }

    async fn list_local_users(&self) -> StoreResult<Vec<LocalUser>> {
        let state = self.state.read().await;
        let mut users: Vec<LocalUser> = state.local_users.values().cloned().collect();
        sort_local_users(&mut users);
        Ok(users)
    }

    async fn confirm_local_user(&self, email: &str) -> StoreResult<()> {
        self.mutate_local_user(email, |users, key| {
            let user = users
                .get_mut(&key)
                .ok_or_else(|| StoreError::user_not_found(email))?;
            user.confirmed = true;
            Ok(())
        })
        .await
    }

    async fn delete_local_user(&self, email: &str) -> StoreResult<()> {
        self.mutate_local_user(email, |users, key| {
            users
                .remove(&key)
                .map(|_| ())
                .ok_or_else(|| StoreError::user_not_found(email))
        })
        .await
    }
}
