//! # Remote service wire shapes
//!
//! Every response from the journal service is wrapped in the same
//! `{success, data | error}` envelope. Request bodies that are not a plain
//! journal record live here too.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::ids::UserId;
use crate::models::journal::JournalRecord;

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    // Must not carry `#[serde(default)]`: that would require `T: Default`.
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// The service's own explanation for a failed call.
    pub fn failure_reason(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Unknown service error".to_string())
    }
}

// ============================================================================
// Approval
// ============================================================================

/// POST /api/journals/{id}/approve
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApprovalRequest {
    pub approver_id: UserId,
    pub approved: bool,
    #[validate(length(max = 2000, message = "Rejection reason must be under 2000 characters"))]
    pub rejection_reason: Option<String>,
}

/// What the service said about an approval, passed through as-is.
#[derive(Debug, Clone)]
pub struct ApprovalResult {
    pub success: bool,
    pub journal: Option<JournalRecord>,
    pub error: Option<String>,
}

impl From<ApiEnvelope<JournalRecord>> for ApprovalResult {
    fn from(envelope: ApiEnvelope<JournalRecord>) -> Self {
        let error = (!envelope.success).then(|| envelope.failure_reason());
        Self {
            success: envelope.success,
            journal: envelope.data,
            error,
        }
    }
}

// ============================================================================
// Migration
// ============================================================================

/// One legacy-store entry as submitted to the migration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyJournal {
    pub key: String,
    pub data: serde_json::Value,
}

/// POST /api/journals/migrate-from-localstorage
#[derive(Debug, Serialize)]
pub struct MigrationRequest<'a> {
    pub journals: &'a [LegacyJournal],
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigrationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub migrated_count: usize,
    #[serde(default)]
    pub total_journals: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}
