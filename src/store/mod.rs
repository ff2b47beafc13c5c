//! Tournament persistence.
//!
//! Every backend implements [`Store`]. Mutations load the whole tournament,
//! apply one of the edits in [`mutations`] and write the whole tournament
//! back while holding the backend's exclusive lock, so concurrent edits to
//! different matches of one tournament never lose each other.

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod mutations;
pub mod remote;

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::config::{BackendKind, StoreSettings};
use crate::domain::models::{HoleNumber, HoleOutcome, MatchResult, Scoreboard, Tournament};
use crate::domain::tournament::Pairing;
use crate::domain::users::{LocalUser, RegisteredUser};

pub use error::{StorageContext, StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Stores a new tournament, stamping both timestamps. Conflict if the id
    /// is taken.
    async fn create_tournament(&self, tournament: Tournament) -> StoreResult<Tournament>;

    async fn get_tournament(&self, id: &str) -> StoreResult<Tournament>;

    /// Replaces a stored tournament, stamping `updated_at`
    async fn update_tournament(&self, tournament: Tournament) -> StoreResult<Tournament>;

    /// All tournaments, oldest first. Unreadable records are skipped.
    async fn list_tournaments(&self) -> StoreResult<Vec<Tournament>>;

    async fn delete_tournament(&self, id: &str) -> StoreResult<()>;

    /// Sets a match's result and score directly, bypassing hole scoring
    async fn update_match_result(
        &self,
        tournament_id: &str,
        round_number: u32,
        match_id: &str,
        result: MatchResult,
        score: &str,
    ) -> StoreResult<Tournament>;

    /// Replaces a round's matches with fresh pending matches
    async fn set_round_pairings(
        &self,
        tournament_id: &str,
        round_number: u32,
        pairings: Vec<Pairing>,
    ) -> StoreResult<Tournament>;

    /// Records (`Some`) or erases (`None`) one hole, backfilling earlier
    /// unrecorded holes as halved, and re-derives the match result
    async fn set_hole_result(
        &self,
        tournament_id: &str,
        round_number: u32,
        match_id: &str,
        hole: HoleNumber,
        outcome: Option<HoleOutcome>,
    ) -> StoreResult<Tournament>;

    /// Inserts or replaces the user with the same email
    async fn register_user(&self, user: RegisteredUser) -> StoreResult<()>;

    async fn list_registered_users(&self) -> StoreResult<Vec<RegisteredUser>>;

    async fn link_player(
        &self,
        tournament_id: &str,
        player_id: &str,
        email: &str,
    ) -> StoreResult<Tournament>;

    /// Conflict if an account with the same email exists
    async fn create_local_user(&self, user: LocalUser) -> StoreResult<()>;

    async fn get_local_user(&self, email: &str) -> StoreResult<LocalUser>;

    /// Marks the account holding `token` as verified and consumes the token
    async fn verify_local_user(&self, token: &str) -> StoreResult<LocalUser>;

    async fn list_local_users(&self) -> StoreResult<Vec<LocalUser>>;

    async fn confirm_local_user(&self, email: &str) -> StoreResult<()>;

    async fn delete_local_user(&self, email: &str) -> StoreResult<()>;
}

/// Scoreboard of the tournament as currently stored
pub async fn load_scoreboard(store: &dyn Store, tournament_id: &str) -> StoreResult<Scoreboard> {
    Ok(store.get_tournament(tournament_id).await?.scoreboard())
}

pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn Store>> {
    info!("Using {} store", settings.backend.as_str());
    let store: Arc<dyn Store> = match settings.backend {
        BackendKind::Memory => Arc::new(MemoryStore::new()),
        BackendKind::File => Arc::new(FileStore::new(&settings.data_dir)?),
        BackendKind::Remote => Arc::new(RemoteStore::new(&settings.remote)?),
    };
    Ok(store)
}

pub(crate) fn sort_tournaments(tournaments: &mut [Tournament]) {
    tournaments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

pub(crate) fn sort_registered_users(users: &mut [RegisteredUser]) {
    users.sort_by_key(RegisteredUser::key);
}

pub(crate) fn sort_local_users(users: &mut [LocalUser]) {
    users.sort_by_key(LocalUser::key);
}

/// Entry of the user or local-account registry, keyed by lowercased email
pub(crate) trait RegistryEntry:
    serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static
{
    fn registry_key(&self) -> String;
}

impl RegistryEntry for RegisteredUser {
    fn registry_key(&self) -> String {
        self.key()
    }
}

impl RegistryEntry for LocalUser {
    fn registry_key(&self) -> String {
        self.key()
    }
}
