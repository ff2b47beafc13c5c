use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::codec::{decode, decode_tournament, encode};
use super::error::{StorageContext, StoreError, StoreResult};
use super::{
    RegistryEntry, Store, mutations, sort_local_users, sort_registered_users, sort_tournaments,
};
use crate::domain::models::{HoleNumber, HoleOutcome, MatchResult, Tournament};
use crate::domain::tournament::Pairing;
use crate::domain::users::{LocalUser, RegisteredUser, email_key};

const USERS_FILE: &str = "_users.json";
const LOCAL_USERS_FILE: &str = "_local_users.json";

/// One pretty-printed JSON file per tournament under `dir`, plus one file per
/// user registry. Files are replaced atomically, so a reader never sees a
/// half-written document.
pub struct FileStore {
    dir: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        info!("File store at {}", dir.display());

        Ok(Self {
            dir,
            lock: RwLock::new(()),
        })
    }

    /// `None` for ids that could never have been created
    fn tournament_path(&self, id: &str) -> Option<PathBuf> {
        mutations::validate_tournament_id(id)
            .ok()
            .map(|()| self.dir.join(format!("{}.json", id)))
    }

    async fn read_tournament(&self, id: &str) -> StoreResult<Tournament> {
        let path = self
            .tournament_path(id)
            .ok_or_else(|| StoreError::tournament_not_found(id))?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::tournament_not_found(id));
            }
            Err(e) => return Err(StoreError::storage("read tournament", id, e)),
        };
        decode_stored(id, &bytes).storage("decode tournament", id)
    }

    async fn write_tournament(&self, tournament: &Tournament) -> StoreResult<()> {
        let path = self
            .tournament_path(&tournament.id)
            .ok_or_else(|| StoreError::Invalid(format!("tournament id {:?}", tournament.id)))?;
        let bytes = encode(tournament, "tournament").storage("encode tournament", &tournament.id)?;
        atomic_write(&path, &bytes)
            .await
            .storage("write tournament", &tournament.id)
    }

    async fn mutate<F>(&self, id: &str, apply: F) -> StoreResult<Tournament>
    where
        F: FnOnce(&mut Tournament) -> StoreResult<()> + Send,
    {
        let _guard = self.lock.write().await;
        let mut tournament = self.read_tournament(id).await?;

        apply(&mut tournament)?;
        mutations::touch(&mut tournament);

        self.write_tournament(&tournament).await?;
        debug!("Updated tournament {} on disk", id);
        Ok(tournament)
    }

    /// Registry contents keyed by lowercased email; a missing file is empty
    async fn read_registry<T: RegistryEntry>(&self, file: &str) -> StoreResult<BTreeMap<String, T>> {
        let bytes = match fs::read(self.dir.join(file)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::storage("read registry", file, e)),
        };
        let stored: BTreeMap<String, T> = decode(&bytes, file).storage("decode registry", file)?;
        Ok(stored
            .into_values()
            .map(|entry| (entry.registry_key(), entry))
            .collect())
    }

    async fn write_registry<T: RegistryEntry>(
        &self,
        file: &str,
        entries: &BTreeMap<String, T>,
    ) -> StoreResult<()> {
        let bytes = encode(entries, file).storage("encode registry", file)?;
        atomic_write(&self.dir.join(file), &bytes)
            .await
            .storage("write registry", file)
    }

    async fn mutate_local_users<F, R>(&self, apply: F) -> StoreResult<R>
    where
        F: FnOnce(&mut BTreeMap<String, LocalUser>) -> StoreResult<R> + Send,
        R: Send,
    {
        let _guard = self.lock.write().await;
        let mut users = self.read_registry::<LocalUser>(LOCAL_USERS_FILE).await?;
        let out = apply(&mut users)?;
        self.write_registry(LOCAL_USERS_FILE, &users).await?;
        Ok(out)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes `bytes` next to `path`, syncs, then renames over `path`. The
/// temporary file is removed if any step fails.
pub async fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    let written = write_synced(&tmp, bytes).await;
    let result = match written {
        Ok(()) => fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to move {} into place", tmp.display())),
        Err(e) => Err(e),
    };

    if result.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    result
}

async fn write_synced(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.sync_all()
        .await
        .with_context(|| format!("Failed to sync {}", path.display()))?;
    Ok(())
}

/// A file only holds the tournament its name says it does; writes go back
/// to the path of the decoded id
fn decode_stored(id: &str, bytes: &[u8]) -> Result<Tournament> {
    let tournament = decode_tournament(bytes)?;
    if tournament.id != id {
        bail!("file for {} holds tournament {}", id, tournament.id);
    }
    Ok(tournament)
}

fn is_tournament_file(path: &Path) -> bool {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let is_registry = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_'));
    is_json && !is_registry
}

#[async_trait]
impl Store for FileStore {
    async fn create_tournament(&self, mut tournament: Tournament) -> StoreResult<Tournament> {
        mutations::validate_tournament_id(&tournament.id)?;
        let _guard = self.lock.write().await;
        let path = self
            .tournament_path(&tournament.id)
            .ok_or_else(|| StoreError::Invalid(format!("tournament id {:?}", tournament.id)))?;
        if fs::try_exists(&path)
            .await
            .storage("check tournament", &tournament.id)?
        {
            return Err(StoreError::Conflict(format!("tournament {}", tournament.id)));
        }

        let now = Utc::now();
        tournament.created_at = now;
        tournament.updated_at = now;
        self.write_tournament(&tournament).await?;
        debug!("Created tournament {} on disk", tournament.id);
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
        let dir_name = self.dir.display().to_string();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::storage("list directory", &dir_name, e)),
        };

        let mut tournaments = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .storage("list directory", &dir_name)?
        {
            let path = entry.path();
            if !is_tournament_file(&path) {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let loaded = match fs::read(&path).await {
                Ok(bytes) => decode_stored(&stem, &bytes),
                Err(e) => Err(e.into()),
            };
            match loaded {
                Ok(tournament) => tournaments.push(tournament),
                Err(e) => warn!("Skipping unreadable tournament file {}: {:#}", path.display(), e),
            }
        }

        sort_tournaments(&mut tournaments);
        Ok(tournaments)
    }

    async fn delete_tournament(&self, id: &str) -> StoreResult<()> {
        let _guard = self.lock.write().await;
        let path = self
            .tournament_path(id)
            .ok_or_else(|| StoreError::tournament_not_found(id))?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted tournament {} from disk", id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::tournament_not_found(id)),
            Err(e) => Err(StoreError::storage("delete tournament", id, e)),
        }
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
        let mut users = self.read_registry::<RegisteredUser>(USERS_FILE).await?;
        users.insert(user.key(), user);
        self.write_registry(USERS_FILE, &users).await
    }

    async fn list_registered_users(&self) -> StoreResult<Vec<RegisteredUser>> {
        let _guard = self.lock.read().await;
        let mut users: Vec<RegisteredUser> = self
            .read_registry(USERS_FILE)
            .await?
            .into_values()
            .collect();
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
        self.mutate_local_users(move |users| {
            let key = user.key();
            if users.contains_key(&key) {
                return Err(StoreError::Conflict(format!("user {}", user.email)));
            }
            users.insert(key, user);
            Ok(())
        })
        .await
    }

    async fn get_local_user(&self, email: &str) -> StoreResult<LocalUser> {
        let _guard = self.lock.read().await;
        self.read_registry::<LocalUser>(LOCAL_USERS_FILE)
            .await?
            .remove(&email_key(email))
            .ok_or_else(|| StoreError::user_not_found(email))
    }

    async fn verify_local_user(&self, token: &str) -> StoreResult<LocalUser> {
        self.mutate_local_users(|users| {
            let user = users
                .values_mut()
                .find(|u| u.has_token(token))
                .ok_or_else(|| StoreError::NotFound("verification token".to_string()))?;
            user.mark_verified();
            Ok(user.clone())
        })
        .await
    }

    async fn list_local_users(&self) -> StoreResult<Vec<LocalUser>> {
        let _guard = self.lock.read().await;
        let mut users: Vec<LocalUser> = self
            .read_registry(LOCAL_USERS_FILE)
            .await?
            .into_values()
            .collect();
        sort_local_users(&mut users);
        Ok(users)
    }

    async fn confirm_local_user(&self, email: &str) -> StoreResult<()> {
        self.mutate_local_users(|users| {
            let user = users
                .get_mut(&email_key(email))
                .ok_or_else(|| StoreError::user_not_found(email))?;
            user.confirmed = true;
            Ok(())
        })
        .await
    }

    async fn delete_local_user(&self, email: &str) -> StoreResult<()> {
        self.mutate_local_users(|users| {
            users
                .remove(&email_key(email))
                .map(|_| ())
                .ok_or_else(|| StoreError::user_not_found(email))
        })
        .await
    }
}
