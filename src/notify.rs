use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::legacy::LegacyStore;
use crate::models::JournalId;

/// Freshness markers other observers poll in the legacy store.
pub const REFRESH_TRIGGER_KEY: &str = "dashboard_refresh_trigger";
pub const JOURNAL_UPDATED_KEY: &str = "dashboard_journal_updated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JournalEventKind {
    #[serde(rename = "JOURNAL_UPDATE")]
    JournalUpdate,
}

/// Message posted to an embedding parent after a journal changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEvent {
    #[serde(rename = "type")]
    pub kind: JournalEventKind,
    pub journal_id: Option<JournalId>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl JournalEvent {
    pub fn updated(journal_id: Option<JournalId>) -> Self {
        Self {
            kind: JournalEventKind::JournalUpdate,
            journal_id,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: &JournalEvent) -> anyhow::Result<()>;
}

/// For contexts with nobody listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &JournalEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fans events out as JSON strings to every subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<String>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, event: &JournalEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(event)?;
        // No subscribers is not a failure; the event is simply unobserved.
        let _ = self.tx.send(payload);
        Ok(())
    }
}

/// Write both freshness markers, then post `event`. Never fails: every
/// problem is logged and swallowed.
pub fn publish(store: &dyn LegacyStore, notifier: &dyn Notifier, event: &JournalEvent) {
    let stamp = event.timestamp.to_string();
    for key in [REFRESH_TRIGGER_KEY, JOURNAL_UPDATED_KEY] {
        if let Err(e) = store.set(key, &stamp) {
            tracing::warn!(error = %e, key = key, "Failed to write freshness marker");
        }
    }

    if let Err(e) = notifier.notify(event) {
        tracing::warn!(error = %e, journal_id = ?event.journal_id, "Failed to notify dashboard");
    }
}
