//! # Session controller
//!
//! Owns the identity of the one journal being edited: which dog, which
//! trainer, and (once it exists remotely) which journal id. Loads, saves and
//! deletes go through here so that identity never drifts from what the
//! service holds.
//!
//! Only one `open`, `save`, `new_journal` or `remove` may run at a time per
//! controller. A call made while another is in flight fails with
//! `SyncError::Busy` instead of racing it for the identity.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::client::JournalApi;
use crate::dto::{ApprovalRequest, ApprovalResult};
use crate::error::{SyncError, SyncResult};
use crate::legacy::LegacyStore;
use crate::models::{DogId, JournalDraft, JournalId, JournalRecord, TrainerId, UserId};
use crate::notify::{self, JournalEvent, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No dog/date selected.
    Empty,
    /// Lookup in flight.
    Hydrating,
    /// Matches the last known remote state (or a fresh, unsaved entry).
    Clean,
    /// Write in flight.
    Saving,
}

/// Who and what is currently open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub journal_id: Option<JournalId>,
    pub dog_id: Option<DogId>,
    pub trainer_id: Option<TrainerId>,
    pub dog_name: Option<String>,
    pub journal_date: Option<String>,
}

pub struct SessionController {
    api: Arc<dyn JournalApi>,
    store: Arc<dyn LegacyStore>,
    notifier: Arc<dyn Notifier>,
    identity: AsyncMutex<SessionIdentity>,
    phase: Mutex<SessionPhase>,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn JournalApi>,
        store: Arc<dyn LegacyStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            store,
            notifier,
            identity: AsyncMutex::new(SessionIdentity::default()),
            phase: Mutex::new(SessionPhase::Empty),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: SessionPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    /// Snapshot of the open identity; waits for an in-flight operation.
    pub async fn identity(&self) -> SessionIdentity {
        self.identity.lock().await.clone()
    }

    fn begin(&self) -> SyncResult<MutexGuard<'_, SessionIdentity>> {
        self.identity.try_lock().map_err(|_| {
            tracing::warn!("Rejected journal operation: another is still in flight");
            SyncError::Busy
        })
    }

    /// Open the journal of `dog_name` on `journal_date`.
    ///
    /// With `force_new` no journal lookup is made and a blank entry comes
    /// back. Otherwise the first journal the service lists for that day is
    /// loaded; a day with none also yields a blank entry. Any failure leaves
    /// the session `Empty`.
    pub async fn open(
        &self,
        dog_name: &str,
        journal_date: &str,
        force_new: bool,
    ) -> SyncResult<JournalDraft> {
        let mut identity = self.begin()?;
        self.set_phase(SessionPhase::Hydrating);

        match self.hydrate(&mut identity, dog_name, journal_date, force_new).await {
            Ok(draft) => {
                self.set_phase(SessionPhase::Clean);
                Ok(draft)
            }
            Err(e) => {
                tracing::warn!(dog_name = %dog_name, date = %journal_date, error = %e, "Failed to open journal");
                *identity = SessionIdentity::default();
                self.set_phase(SessionPhase::Empty);
                Err(e)
            }
        }
    }

    async fn hydrate(
        &self,
        identity: &mut SessionIdentity,
        dog_name: &str,
        journal_date: &str,
        force_new: bool,
    ) -> SyncResult<JournalDraft> {
        let dog = self
            .api
            .find_dog_by_name(dog_name)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("Dog \"{}\" not found", dog_name)))?;

        *identity = SessionIdentity {
            journal_id: None,
            dog_id: Some(dog.id),
            trainer_id: dog.trainer_id,
            dog_name: Some(dog.name.clone()),
            journal_date: Some(journal_date.to_string()),
        };

        if force_new {
            tracing::debug!(dog_id = %dog.id, date = %journal_date, "Starting new journal");
            return Ok(JournalDraft::empty(&dog.name, journal_date));
        }

        let journals = self.api.journals_for_dog_on(dog.id, journal_date).await?;
        if journals.len() > 1 {
            tracing::warn!(
                dog_id = %dog.id,
                date = %journal_date,
                count = journals.len(),
                "Several journals for one day, using the first listed"
            );
        }

        match journals.into_iter().next() {
            Some(record) => {
                identity.journal_id = record.id;
                tracing::debug!(journal_id = ?record.id, dog_id = %dog.id, "Loaded existing journal");
                Ok(JournalDraft::from_record(&record, &dog.name))
            }
            None => {
                tracing::debug!(dog_id = %dog.id, date = %journal_date, "No journal for day, starting blank");
                Ok(JournalDraft::empty(&dog.name, journal_date))
            }
        }
    }

    /// Write `draft` for the open dog: create when no journal id is held,
    /// update otherwise. The new id is adopted so the next save updates.
    ///
    /// On failure the held identity is untouched and the caller keeps its
    /// draft for another attempt.
    pub async fn save(&self, draft: &JournalDraft) -> SyncResult<JournalRecord> {
        let mut identity = self.begin()?;

        let (dog_id, trainer_id) = match (identity.dog_id, identity.trainer_id) {
            (Some(dog_id), Some(trainer_id)) => (dog_id, trainer_id),
            (dog_id, trainer_id) => {
                tracing::warn!(dog_id = ?dog_id, trainer_id = ?trainer_id, "Refusing to save without dog and trainer");
                return Err(SyncError::Validation(
                    "Missing dog or trainer for this journal".into(),
                ));
            }
        };

        let mut record = draft.to_record(dog_id, trainer_id);
        record.id = identity.journal_id;

        let previous = self.phase();
        self.set_phase(SessionPhase::Saving);

        let result = match identity.journal_id {
            Some(id) => self.api.update_journal(id, &record).await,
            None => self.api.create_journal(&record).await,
        };

        match result {
            Ok(saved) => {
                identity.journal_id = saved.id;
                identity.journal_date = Some(saved.journal_date.clone());
                self.set_phase(SessionPhase::Clean);
                self.announce(saved.id);
                Ok(saved)
            }
            Err(e) => {
                tracing::error!(dog_id = %dog_id, journal_id = ?identity.journal_id, error = %e, "Journal save failed");
                self.set_phase(previous);
                Err(e)
            }
        }
    }

    /// Forget the held journal id; the next save creates a new journal for
    /// the same dog.
    pub fn new_journal(&self) -> SyncResult<()> {
        let mut identity = self.begin()?;
        identity.journal_id = None;
        Ok(())
    }

    /// Delete a journal. `Ok(false)` when the service refused.
    pub async fn remove(&self, id: JournalId) -> SyncResult<bool> {
        let mut identity = self.begin()?;
        let deleted = self.api.delete_journal(id).await?;
        if deleted {
            if identity.journal_id == Some(id) {
                identity.journal_id = None;
            }
            self.announce(Some(id));
        }
        Ok(deleted)
    }

    /// Approve or reject a journal. Approver identity is checked by the
    /// service, not here.
    pub async fn approve(
        &self,
        id: JournalId,
        approver_id: UserId,
        approved: bool,
        rejection_reason: Option<String>,
    ) -> SyncResult<ApprovalResult> {
        let request = ApprovalRequest {
            approver_id,
            approved,
            rejection_reason,
        };
        let result = self.api.approve_journal(id, &request).await?;
        if result.success {
            self.announce(Some(id));
        }
        Ok(result)
    }

    fn announce(&self, journal_id: Option<JournalId>) {
        let event = JournalEvent::updated(journal_id);
        notify::publish(self.store.as_ref(), self.notifier.as_ref(), &event);
    }
}
