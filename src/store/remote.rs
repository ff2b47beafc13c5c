use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::codec::{decode_tournament_value, decode_value};
use super::error::{StorageContext, StoreError, StoreResult};
use super::{
    RegistryEntry, Store, mutations, sort_local_users, sort_registered_users, sort_tournaments,
};
use crate::config::RemoteSettings;
use crate::docserver::models::{DocumentEntry, DocumentList};
use crate::domain::models::{HoleNumber, HoleOutcome, MatchResult, Tournament};
use crate::domain::tournament::Pairing;
use crate::domain::users::{LocalUser, RegisteredUser, email_key};
use crate::http::client::{DocumentClient, Precondition};

const TOURNAMENTS: &str = "tournaments";
const USERS: &str = "users";
const LOCAL_USERS: &str = "local_users";

/// Talks to a document server over HTTP. One JSON document per tournament,
/// registered user and local account.
///
/// The lock serialises this process's read-modify-write cycles; the
/// `If-Match`/`If-None-Match` preconditions catch records created or deleted
/// behind its back.
pub struct RemoteStore {
    client: DocumentClient,
    lock: RwLock<()>,
}

fn unexpected(response: &Response) -> anyhow::Error {
    anyhow!("document server answered {}", response.status())
}

impl RemoteStore {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let client = DocumentClient::new(settings)?;
        info!("Remote store at {}", client.base_url());

        Ok(Self {
            client,
            lock: RwLock::new(()),
        })
    }

    /// `None` when the server has no such document
    async fn fetch(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let response = self.client.get(collection, id).await.storage("fetch", id)?;
        match response.status() {
            StatusCode::OK => {
                let value = response.json::<Value>().await.storage("read", id)?;
                Ok(Some(value))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(StoreError::storage("fetch", id, unexpected(&response))),
        }
    }

    /// `false` when the precondition failed
    async fn store<T: Serialize + Sync + ?Sized>(
        &self,
        collection: &str,
        id: &str,
        document: &T,
        precondition: Precondition,
    ) -> StoreResult<bool> {
        let response = self
            .client
            .put(collection, id, document, precondition)
            .await
            .storage("store", id)?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(true),
            StatusCode::PRECONDITION_FAILED => Ok(false),
            _ => Err(StoreError::storage("store", id, unexpected(&response))),
        }
    }

    /// `false` when there was nothing to delete
    async fn remove(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let response = self.client.delete(collection, id).await.storage("delete", id)?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(StoreError::storage("delete", id, unexpected(&response))),
        }
    }

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<DocumentEntry>> {
        let response = self.client.list(collection).await.storage("list", collection)?;
        if response.status() != StatusCode::OK {
            return Err(StoreError::storage("list", collection, unexpected(&response)));
        }
        let list = response
            .json::<DocumentList>()
            .await
            .storage("list", collection)?;
        Ok(list.documents)
    }

    /// Decodes every document of a registry collection, skipping the ones
    /// that do not parse
    async fn list_registry<T: RegistryEntry>(&self, collection: &str) -> StoreResult<Vec<T>> {
        let entries = self.list_documents(collection).await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| match decode_value::<T>(entry.data, collection) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Skipping unreadable {} document {}: {:#}", collection, entry.id, e);
                    None
                }
            })
            .collect())
    }

    async fn read_tournament(&self, id: &str) -> StoreResult<Tournament> {
        let value = self
            .fetch(TOURNAMENTS, id)
            .await?
            .ok_or_else(|| StoreError::tournament_not_found(id))?;
        let tournament = decode_tournament_value(value).storage("decode tournament", id)?;
        if tournament.id != id {
            return Err(StoreError::storage(
                "decode tournament",
                id,
                anyhow!("document holds tournament {}", tournament.id),
            ));
        }
        Ok(tournament)
    }

    async fn mutate<F>(&self, id: &str, apply: F) -> StoreResult<Tournament>
    where
        F: FnOnce(&mut Tournament) -> StoreResult<()> + Send,
    {
        let _guard = self.lock.write().await;
        let mut tournament = self.read_tournament(id).await?;

        apply(&mut tournament)?;
        mutations::touch(&mut tournament);

        if !self.store(TOURNAMENTS, id, &tournament, Precondition::Present).await? {
            return Err(StoreError::tournament_not_found(id));
        }
        debug!("Updated tournament {} on document server", id);
        Ok(tournament)
    }

    async fn read_local_user(&self, email: &str) -> StoreResult<LocalUser> {
        let value = self
            .fetch(LOCAL_USERS, &email_key(email))
            .await?
            .ok_or_else(|| StoreError::user_not_found(email))?;
        decode_value(value, "local user").storage("decode local user", email)
    }

    async fn write_local_user(&self, user: &LocalUser) -> StoreResult<()> {
        if !self
            .store(LOCAL_USERS, &user.key(), user, Precondition::Present)
            .await?
        {
            return Err(StoreError::user_not_found(&user.email));
        }
        Ok(())
    }

    /// Stores a tournament as given, timestamps included, replacing any
    /// document with the same id
    pub async fn import_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        self.store(TOURNAMENTS, &tournament.id, tournament, Precondition::None)
            .await?;
        debug!("Imported tournament {}", tournament.id);
        Ok(())
    }

    /// Stores a local account as given, replacing any with the same email
    pub async fn import_local_user(&self, user: &LocalUser) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        self.store(LOCAL_USERS, &user.key(), user, Precondition::None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for RemoteStore {
    async fn create_tournament(&self, mut tournament: Tournament) -> StoreResult<Tournament> {
        mutations::validate_tournament_id(&tournament.id)?;
        let _guard = self.lock.write().await;
        let now = Utc::now();
        tournament.created_at = now;
        tournament.updated_at = now;

        if !self
            .store(TOURNAMENTS, &tournament.id, &tournament, Precondition::Absent)
            .await?
        {
            return Err(StoreError::Conflict(format!("tournament {}", tournament.id)));
        }
        debug!("Created tournament {} on document server", tournament.id);
        Ok(tournament)
    }

    async fn get_tournament(&self, id: &str) -> StoreResult<Tournament> {
        let _guard = self.lock.read().await;
        self.read_tournament(id).await
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
        let _guard = self.lock.read().await;
        let mut tournaments: Vec<Tournament> = self
            .list_documents(TOURNAMENTS)
            .await?
            .into_iter()
            .filter_map(|entry| match decode_tournament_value(entry.data) {
                Ok(tournament) => Some(tournament),
                Err(e) => {
                    warn!("Skipping unreadable tournament document {}: {:#}", entry.id, e);
                    None
                }
            })
            .collect();
        sort_tournaments(&mut tournaments);
        Ok(tournaments)
    }

    async fn delete_tournament(&self, id: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        if !self.remove(TOURNAMENTS, id).await? {
            return Err(StoreError::tournament_not_found(id));
        }
        debug!("Deleted tournament {} from document server", id);
        Ok(())
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
        let _guard = self.lock.write().await;
        self.store(USERS, &user.registry_key(), &user, Precondition::None)
            .await?;
        Ok(())
    }

    async fn list_registered_users(&self) -> StoreResult<Vec<RegisteredUser>> {
        let _guard = self.lock.read().await;
        let mut users = self.list_registry::<RegisteredUser>(USERS).await?;
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
        let _guard = self.lock.write().await;
        if !self
            .store(LOCAL_USERS, &user.key(), &user, Precondition::Absent)
            .await?
        {
            return Err(StoreError::Conflict(format!("user {}", user.email)));
        }
        Ok(())
    }

    async fn get_local_user(&self, email: &str) -> StoreResult<LocalUser> {
        let _guard = self.lock.read().await;
        self.read_local_user(email).await
    }

    async fn verify_local_user(&self, token: &str) -> StoreResult<LocalUser> {
        let _guard = self.lock.write().await;
        let mut user = self
            .list_registry::<LocalUser>(LOCAL_USERS)
            .await?
            .into_iter()
            .find(|u| u.has_token(token))
            .ok_or_else(|| StoreError::NotFound("verification token".to_string()))?;

        user.mark_verified();
        self.write_local_user(&user).await?;
        Ok(user)
    }

    async fn list_local_users(&self) -> StoreResult<Vec<LocalUser>> {
        let _guard = self.lock.read().await;
        let mut users = self.list_registry::<LocalUser>(LOCAL_USERS).await?;
        sort_local_users(&mut users);
        Ok(users)
    }

    async fn confirm_local_user(&self, email: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let mut user = self.read_local_user(email).await?;
        user.confirmed = true;
        self.write_local_user(&user).await
    }

    async fn delete_local_user(&self, email: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        if !self.remove(LOCAL_USERS, &email_key(email)).await? {
            return Err(StoreError::user_not_found(email));
        }
        Ok(())
    }
}
