use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// Origin substituted when running from a local file rather than a served page.
pub const LOCAL_SERVICE_ORIGIN: &str = "http://localhost:5000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub legacy_store_path: PathBuf,
    pub http_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> SyncResult<Self> {
        let origin = env::var("APP_ORIGIN").unwrap_or_else(|_| "file://".into());
        let api_base_url = match env::var("JOURNAL_API_URL").ok().filter(|s| !s.is_empty()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => resolve_base_url(&origin),
        };

        let http_timeout = match env::var("HTTP_TIMEOUT_SECS").ok().filter(|s| !s.is_empty()) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    SyncError::Config(format!("HTTP_TIMEOUT_SECS must be a number, got {:?}", raw))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_base_url,
            legacy_store_path: env::var("LEGACY_STORE_PATH")
                .unwrap_or_else(|_| "legacy_store.json".into())
                .into(),
            http_timeout,
        })
    }

    /// Config pointed at an explicit service URL, used when embedding.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            legacy_store_path: PathBuf::from("legacy_store.json"),
            http_timeout: None,
        }
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

/// Resolve the remote service origin from the execution origin.
pub fn resolve_base_url(origin: &str) -> String {
    let origin = origin.trim();
    if origin.is_empty() || origin.starts_with("file:") {
        LOCAL_SERVICE_ORIGIN.to_string()
    } else {
        origin.trim_end_matches('/').to_string()
    }
}
