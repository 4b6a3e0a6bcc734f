//! # Legacy migration agent
//!
//! One-shot transfer of every journal blob left in the legacy store into
//! the remote service, as a single batch.
//!
//! Legacy keys are deleted only when the service reports that every
//! submitted entry was migrated. After a partial success all of them stay,
//! so the migration can be run again without losing anything locally.

use std::sync::Arc;

use serde::Serialize;

use crate::client::JournalApi;
use crate::dto::LegacyJournal;
use crate::error::{SyncError, SyncResult};
use crate::legacy::{LegacyStore, JOURNAL_KEY_PREFIX};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub success: bool,
    pub migrated: usize,
    pub submitted: usize,
    /// Legacy keys removed after a complete migration.
    pub cleared: Vec<String>,
    /// Keys whose value could not be parsed as a journal blob.
    pub skipped: Vec<String>,
    /// Per-entry rejections reported by the service.
    pub rejected: Vec<String>,
}

pub struct MigrationAgent {
    api: Arc<dyn JournalApi>,
    store: Arc<dyn LegacyStore>,
}

impl MigrationAgent {
    pub fn new(api: Arc<dyn JournalApi>, store: Arc<dyn LegacyStore>) -> Self {
        Self { api, store }
    }

    /// Every parsable journal blob in the legacy store, plus the keys that
    /// had to be skipped.
    pub fn scan(&self) -> SyncResult<(Vec<LegacyJournal>, Vec<String>)> {
        let mut journals = Vec::new();
        let mut skipped = Vec::new();

        for key in self.store.keys()? {
            if !key.starts_with(JOURNAL_KEY_PREFIX) {
                continue;
            }
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(data) if data.is_object() => journals.push(LegacyJournal { key, data }),
                Ok(_) => {
                    tracing::warn!(key = %key, "Legacy journal is not a JSON object, skipping");
                    skipped.push(key);
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Legacy journal failed to parse, skipping");
                    skipped.push(key);
                }
            }
        }

        Ok((journals, skipped))
    }

    pub async fn run(&self) -> SyncResult<MigrationOutcome> {
        let (journals, skipped) = self.scan()?;
        if journals.is_empty() {
            tracing::info!(skipped = skipped.len(), "No legacy journals to migrate");
            return Ok(MigrationOutcome {
                success: true,
                skipped,
                ..Default::default()
            });
        }

        let submitted = journals.len();
        tracing::info!(submitted = submitted, "Submitting legacy journals for migration");
        let response = self.api.migrate_legacy(&journals).await?;

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "Service rejected the migration batch".to_string());
            tracing::error!(reason = %reason, "Legacy migration failed");
            return Err(SyncError::Migration(reason));
        }

        for rejection in &response.errors {
            tracing::warn!(reason = %rejection, "Legacy journal rejected by service");
        }
        if response.total_journals != submitted {
            tracing::warn!(
                submitted = submitted,
                reported = response.total_journals,
                "Service counted a different batch size"
            );
        }

        let mut cleared = Vec::new();
        if response.migrated_count == submitted {
            for journal in &journals {
                match self.store.remove(&journal.key) {
                    Ok(()) => cleared.push(journal.key.clone()),
                    Err(e) => {
                        tracing::warn!(key = %journal.key, error = %e, "Failed to clear migrated legacy journal");
                    }
                }
            }
            tracing::info!(migrated = response.migrated_count, cleared = cleared.len(), "Legacy migration complete");
        } else {
            tracing::warn!(
                migrated = response.migrated_count,
                submitted = submitted,
                "Partial migration, keeping every legacy journal"
            );
        }

        Ok(MigrationOutcome {
            success: true,
            migrated: response.migrated_count,
            submitted,
            cleared,
            skipped,
            rejected: response.errors,
        })
    }
}
