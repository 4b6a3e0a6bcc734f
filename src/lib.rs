//! Journal record synchronization for the K9 training journal: the remote
//! journal client, the editing session that keeps one open journal in step
//! with the service, the activity text codec, and the one-shot migration
//! of legacy local journals.

pub mod client;
pub mod codec;
pub mod config;
pub mod dto;
pub mod error;
pub mod legacy;
pub mod migration;
pub mod models;
pub mod notify;
pub mod session;

pub use client::{HttpJournalClient, JournalApi};
pub use config::Config;
pub use error::{SyncError, SyncResult};
pub use legacy::{FileStore, LegacyStore, MemoryStore};
pub use migration::{MigrationAgent, MigrationOutcome};
pub use notify::{BroadcastNotifier, JournalEvent, NoopNotifier, Notifier};
pub use session::{SessionController, SessionIdentity, SessionPhase};
