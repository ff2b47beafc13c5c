use anyhow::Result;
use log::{info, warn};

use crate::config::StoreSettings;
use crate::store::{FileStore, RemoteStore, Store};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub tournaments: usize,
    pub users: usize,
    pub local_users: usize,
    pub failed: usize,
}

impl MigrationReport {
    pub fn summary(&self) -> String {
        format!(
            "Migrated {} tournaments, {} registered users, {} local accounts ({} failed)",
            self.tournaments, self.users, self.local_users, self.failed
        )
    }
}

/// Copies a file store directory into a document server
pub struct MigrationService {
    source: FileStore,
    target: RemoteStore,
}

impl MigrationService {
    pub fn new(source: FileStore, target: RemoteStore) -> Self {
        Self { source, target }
    }

    /// Reads from `settings.data_dir` and writes to `settings.remote`
    pub fn from_settings(settings: &StoreSettings) -> Result<Self> {
        Ok(Self::new(
            FileStore::new(&settings.data_dir)?,
            RemoteStore::new(&settings.remote)?,
        ))
    }

    /// Copies every record, continuing past the ones that fail
    pub async fn run(&self) -> Result<MigrationReport> {
        info!("=== Starting Migration ===");
        let mut report = MigrationReport::default();

        for tournament in self.source.list_tournaments().await? {
            match self.target.import_tournament(&tournament).await {
                Ok(()) => {
                    info!("  → Tournament {} ({})", tournament.id, tournament.name);
                    report.tournaments += 1;
                }
                Err(e) => {
                    warn!("  ✗ Tournament {}: {}", tournament.id, e);
                    report.failed += 1;
                }
            }
        }

        for user in self.source.list_registered_users().await? {
            match self.target.register_user(user.clone()).await {
                Ok(()) => report.users += 1,
                Err(e) => {
                    warn!("  ✗ User {}: {}", user.email, e);
                    report.failed += 1;
                }
            }
        }

        for user in self.source.list_local_users().await? {
            match self.target.import_local_user(&user).await {
                Ok(()) => report.local_users += 1,
                Err(e) => {
                    warn!("  ✗ Local account {}: {}", user.email, e);
                    report.failed += 1;
                }
            }
        }

        info!("=== {} ===", report.summary());
        Ok(report)
    }
}
