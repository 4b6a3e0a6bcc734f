#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Legacy store error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Another journal operation is already in flight")]
    Busy,
}

impl SyncError {
    /// Non-2xx response from the remote service. The raw body is kept so the
    /// caller can surface whatever the service said.
    pub fn http_status(status: reqwest::StatusCode, body: &str) -> Self {
        SyncError::Transport(format!("API Error {}: {}", status.as_u16(), body))
    }

    pub fn malformed_body(err: serde_json::Error) -> Self {
        SyncError::Transport(format!("Malformed response body: {}", err))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::Busy)
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl From<validator::ValidationErrors> for SyncError {
    fn from(err: validator::ValidationErrors) -> Self {
        SyncError::Validation(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_includes_code_and_body() {
        let err = SyncError::http_status(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        let msg = err.to_string();
        assert!(msg.contains("502"));
        assert!(msg.contains("upstream down"));
        assert!(matches!(err, SyncError::Transport(_)));
    }

    #[test]
    fn test_malformed_body_is_transport() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = SyncError::malformed_body(json_err);
        assert!(matches!(err, SyncError::Transport(_)));
        assert!(err.to_string().starts_with("Transport error: Malformed response body"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::Transport("x".into()).is_retryable());
        assert!(SyncError::Busy.is_retryable());
        assert!(!SyncError::Validation("x".into()).is_retryable());
        assert!(!SyncError::Migration("x".into()).is_retryable());
    }
}
