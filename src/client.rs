//! # Remote journal client
//!
//! Single-shot calls against the journal service. Nothing here retries,
//! caches, or touches local state; every failure is translated into a
//! `SyncError` and handed back to the caller.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::config::Config;
use crate::dto::{
    ApiEnvelope, ApprovalRequest, ApprovalResult, LegacyJournal, MigrationRequest,
    MigrationResponse,
};
use crate::error::{SyncError, SyncResult};
use crate::models::{dog, Dog, DogId, JournalId, JournalRecord};

/// The remote journal service, as seen by the session controller and the
/// migration agent.
#[async_trait]
pub trait JournalApi: Send + Sync {
    async fn list_dogs(&self) -> SyncResult<Vec<Dog>>;

    /// `None` when no dog has exactly this name. Fetches the whole fleet.
    async fn find_dog_by_name(&self, name: &str) -> SyncResult<Option<Dog>> {
        let dogs = self.list_dogs().await?;
        Ok(dog::find_by_name(&dogs, name).cloned())
    }

    async fn list_journals_for_dog(&self, dog_id: DogId) -> SyncResult<Vec<JournalRecord>>;

    /// The service only indexes by dog, so the date filter runs here.
    /// Service order is preserved.
    async fn journals_for_dog_on(
        &self,
        dog_id: DogId,
        journal_date: &str,
    ) -> SyncResult<Vec<JournalRecord>> {
        let journals = self.list_journals_for_dog(dog_id).await?;
        Ok(journals
            .into_iter()
            .filter(|journal| journal.journal_date == journal_date)
            .collect())
    }

    async fn get_journal(&self, id: JournalId) -> SyncResult<JournalRecord>;

    /// Returns `record` with the server-assigned id merged in.
    async fn create_journal(&self, record: &JournalRecord) -> SyncResult<JournalRecord>;

    async fn update_journal(&self, id: JournalId, record: &JournalRecord) -> SyncResult<JournalRecord>;

    /// `Ok(false)` when the service refuses the delete.
    async fn delete_journal(&self, id: JournalId) -> SyncResult<bool>;

    async fn approve_journal(
        &self,
        id: JournalId,
        request: &ApprovalRequest,
    ) -> SyncResult<ApprovalResult>;

    async fn list_pending_journals(&self) -> SyncResult<Vec<JournalRecord>>;

    async fn list_approved_journals(&self) -> SyncResult<Vec<JournalRecord>>;

    async fn migrate_legacy(&self, journals: &[LegacyJournal]) -> SyncResult<MigrationResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpJournalClient {
    http: reqwest::Client,
    config: Config,
}

impl HttpJournalClient {
    pub fn new(config: Config) -> SyncResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    /// Startup probe: how many dogs the service can see.
    pub async fn check_connectivity(&self) -> SyncResult<usize> {
        match self.list_dogs().await {
            Ok(dogs) => {
                tracing::info!(base_url = %self.base_url(), dogs = dogs.len(), "Journal API reachable");
                Ok(dogs.len())
            }
            Err(e) => {
                tracing::error!(base_url = %self.base_url(), error = %e, "Journal API connectivity check failed");
                Err(e)
            }
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> SyncResult<Vec<T>> {
        let response = self.http.get(self.config.api_url(path)).send().await?;
        let envelope = read_envelope::<Vec<T>>(response).await?;
        into_data(envelope, path)
    }
}

/// Non-2xx is a transport failure carrying status and raw body; a 2xx body
/// that is not the expected envelope is malformed.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> SyncResult<ApiEnvelope<T>> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        tracing::warn!(status = %status, body = %body, "Journal API returned an error status");
        return Err(SyncError::http_status(status, &body));
    }
    serde_json::from_str(&body).map_err(SyncError::malformed_body)
}

fn into_data<T>(envelope: ApiEnvelope<T>, what: &str) -> SyncResult<T> {
    if !envelope.success {
        return Err(SyncError::Transport(format!(
            "{} failed: {}",
            what,
            envelope.failure_reason()
        )));
    }
    envelope
        .data
        .ok_or_else(|| SyncError::Transport(format!("{} returned no data", what)))
}

fn merge_assigned_id(
    record: &JournalRecord,
    envelope: ApiEnvelope<serde_json::Value>,
    what: &str,
) -> SyncResult<JournalRecord> {
    let data = into_data(envelope, what)?;
    let id = data
        .get("id")
        .and_then(serde_json::Value::as_i64)
        .map(JournalId)
        .ok_or_else(|| SyncError::Transport(format!("{} response carried no journal id", what)))?;

    let mut saved = record.clone();
    saved.id = Some(id);
    Ok(saved)
}

#[async_trait]
impl JournalApi for HttpJournalClient {
    async fn list_dogs(&self) -> SyncResult<Vec<Dog>> {
        self.get_list("/api/dogs").await
    }

    async fn list_journals_for_dog(&self, dog_id: DogId) -> SyncResult<Vec<JournalRecord>> {
        let journals: Vec<JournalRecord> = self
            .get_list(&format!("/api/journals/by-dog/{}", dog_id))
            .await?;
        tracing::debug!(dog_id = %dog_id, count = journals.len(), "Fetched journals for dog");
        Ok(journals)
    }

    async fn get_journal(&self, id: JournalId) -> SyncResult<JournalRecord> {
        let response = self
            .http
            .get(self.config.api_url(&format!("/api/journals/{}", id)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(format!("Journal {} not found", id)));
        }
        let envelope = read_envelope::<JournalRecord>(response).await?;
        into_data(envelope, "get journal")
    }

    async fn create_journal(&self, record: &JournalRecord) -> SyncResult<JournalRecord> {
        record.validate()?;
        let response = self
            .http
            .post(self.config.api_url("/api/journals"))
            .json(record)
            .send()
            .await?;
        let envelope = read_envelope::<serde_json::Value>(response).await?;
        let saved = merge_assigned_id(record, envelope, "create journal")?;
        tracing::info!(journal_id = ?saved.id, dog_id = %record.dog_id, date = %record.journal_date, "Journal created");
        Ok(saved)
    }

    async fn update_journal(&self, id: JournalId, record: &JournalRecord) -> SyncResult<JournalRecord> {
        record.validate()?;
        let response = self
            .http
            .put(self.config.api_url(&format!("/api/journals/{}", id)))
            .json(record)
            .send()
            .await?;
        let envelope = read_envelope::<serde_json::Value>(response).await?;
        into_data(envelope, "update journal")?;

        let mut saved = record.clone();
        saved.id = Some(id);
        tracing::info!(journal_id = %id, "Journal updated");
        Ok(saved)
    }

    async fn delete_journal(&self, id: JournalId) -> SyncResult<bool> {
        let response = self
            .http
            .delete(self.config.api_url(&format!("/api/journals/{}", id)))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // A refusal is a `success: false` envelope with 2xx or 404. Any other
        // error status is a hard failure, whatever the body says.
        let refusable = status.is_success() || status == StatusCode::NOT_FOUND;
        match serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body) {
            Ok(envelope) if envelope.success && status.is_success() => {
                tracing::info!(journal_id = %id, "Journal deleted");
                Ok(true)
            }
            Ok(envelope) if !envelope.success && refusable => {
                tracing::warn!(journal_id = %id, status = %status, reason = %envelope.failure_reason(), "Journal delete refused");
                Ok(false)
            }
            Ok(_) => Err(SyncError::http_status(status, &body)),
            Err(_) if !status.is_success() => Err(SyncError::http_status(status, &body)),
            Err(e) => Err(SyncError::malformed_body(e)),
        }
    }

    async fn approve_journal(
        &self,
        id: JournalId,
        request: &ApprovalRequest,
    ) -> SyncResult<ApprovalResult> {
        request.validate()?;
        let response = self
            .http
            .post(self.config.api_url(&format!("/api/journals/{}/approve", id)))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let envelope: ApiEnvelope<JournalRecord> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(SyncError::http_status(status, &body)),
            Err(e) => return Err(SyncError::malformed_body(e)),
        };
        tracing::info!(journal_id = %id, approved = request.approved, success = envelope.success, "Journal approval submitted");
        Ok(envelope.into())
    }

    async fn list_pending_journals(&self) -> SyncResult<Vec<JournalRecord>> {
        self.get_list("/api/journals/pending").await
    }

    async fn list_approved_journals(&self) -> SyncResult<Vec<JournalRecord>> {
        self.get_list("/api/journals/approved").await
    }

    async fn migrate_legacy(&self, journals: &[LegacyJournal]) -> SyncResult<MigrationResponse> {
        let response = self
            .http
            .post(self.config.api_url("/api/journals/migrate-from-localstorage"))
            .json(&MigrationRequest { journals })
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        // The service reports batch failures as `{success: false, error}`,
        // usually with a 500; keep that message for the agent.
        match serde_json::from_str::<MigrationResponse>(&body) {
            Ok(parsed) if status.is_success() || !parsed.success => Ok(parsed),
            Ok(_) => Err(SyncError::http_status(status, &body)),
            Err(_) if !status.is_success() => Err(SyncError::http_status(status, &body)),
            Err(e) => Err(SyncError::malformed_body(e)),
        }
    }
}
