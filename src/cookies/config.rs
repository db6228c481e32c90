//! Cookie jar configuration.

use crate::base::neterror::NetError;
use crate::cookies::jar::{MAX_COOKIES_PER_DOMAIN, MAX_COOKIES_TOTAL};
use crate::cookies::persistence::{CookiePersistence, JsonCookieFile, SqliteCookieFile};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Storage format used for the persistence file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    #[default]
    Json,
    Sqlite,
}

/// Configuration options for [`CookieJar`](crate::cookies::jar::CookieJar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieJarConfig {
    /// Persistence file (None or empty for an in-memory jar).
    pub persistence_path: Option<PathBuf>,

    /// Format of the persistence file.
    pub backend: PersistenceBackend,

    /// Maximum cookies per domain.
    pub max_cookies_per_domain: usize,

    /// Maximum cookies across all domains.
    pub max_cookies_total: usize,

    /// Whether the jar starts enabled.
    pub enabled: bool,

    /// Interval of the background expiry purge (None disables it).
    pub purge_interval_secs: Option<u64>,
}

impl Default for CookieJarConfig {
    fn default() -> Self {
        Self {
            persistence_path: None,
            backend: PersistenceBackend::Json,
            max_cookies_per_domain: MAX_COOKIES_PER_DOMAIN,
            max_cookies_total: MAX_COOKIES_TOTAL,
            enabled: true,
            purge_interval_secs: Some(60),
        }
    }
}

impl CookieJarConfig {
    /// Config for a jar persisted at `path`.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            persistence_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_backend(mut self, backend: PersistenceBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        serde_json::from_str(json).map_err(|e| NetError::cookie_invalid_data(e.to_string()))
    }

    pub fn purge_interval(&self) -> Option<Duration> {
        self.purge_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Build the configured persistence backend, if any.
    pub fn persistence(&self) -> Option<Arc<dyn CookiePersistence>> {
        let path = self
            .persistence_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())?
            .clone();

        let backend: Arc<dyn CookiePersistence> = match self.backend {
            PersistenceBackend::Json => Arc::new(JsonCookieFile::new(path)),
            PersistenceBackend::Sqlite => Arc::new(SqliteCookieFile::new(path)),
        };
        Some(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_in_memory() {
        let config = CookieJarConfig::default();
        assert!(config.persistence().is_none());
        assert!(config.enabled);
        assert_eq!(config.max_cookies_per_domain, MAX_COOKIES_PER_DOMAIN);
    }

    #[test]
    fn test_empty_path_is_in_memory() {
        let config = CookieJarConfig::persistent("");
        assert!(config.persistence().is_none());
    }

    #[test]
    fn test_from_json_partial() {
        let config = CookieJarConfig::from_json(
            r#"{"persistence_path": "/tmp/cookies.db", "backend": "sqlite", "purge_interval_secs": 0}"#,
        )
        .unwrap();

        assert_eq!(config.backend, PersistenceBackend::Sqlite);
        assert_eq!(config.max_cookies_total, MAX_COOKIES_TOTAL);
        assert!(config.persistence().is_some());
        assert_eq!(config.purge_interval(), None);
    }

    #[test]
    fn test_from_json_rejects_unknown_backend() {
        let result = CookieJarConfig::from_json(r#"{"backend": "leveldb"}"#);
        assert!(matches!(result, Err(NetError::CookieInvalidData { .. })));
    }
}
