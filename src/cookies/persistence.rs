//! Cookie persistence - save and load cookies to/from disk.
//!
//! The jar only talks to a [`CookiePersistence`] backend through two calls,
//! `load() -> records` and `save(records)`, so cookie matching stays
//! independent of the storage technology. Two backends are provided:
//!
//! - [`JsonCookieFile`]: a pretty-printed JSON array of [`CookieRecord`]s.
//! - [`SqliteCookieFile`]: a single `cookies` table keyed by `(name, domain, path)`.
//!
//! Both backends skip malformed records individually on load instead of
//! failing the whole file.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::{CanonicalCookie, CookiePriority, SameSite};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Serializable representation of a cookie for persistence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: SameSite,
    #[serde(default)]
    pub priority: CookiePriority,
    pub expires_unix_secs: Option<i64>,
    #[serde(default)]
    pub creation_unix_secs: Option<i64>,
    #[serde(default)]
    pub last_access_unix_secs: Option<i64>,
}

impl From<&CanonicalCookie> for CookieRecord {
    fn from(cookie: &CanonicalCookie) -> Self {
        Self {
            name: cookie.name.clone(),
            value: cookie.value.clone(),
            domain: cookie.domain.clone(),
            path: cookie.path.clone(),
            secure: cookie.secure,
            http_only: cookie.http_only,
            same_site: cookie.same_site,
            priority: cookie.priority,
            expires_unix_secs: cookie.expiration_time.map(|t| t.unix_timestamp()),
            creation_unix_secs: Some(cookie.creation_time.unix_timestamp()),
            last_access_unix_secs: Some(cookie.last_access_time.unix_timestamp()),
        }
    }
}

impl TryFrom<CookieRecord> for CanonicalCookie {
    type Error = NetError;

    fn try_from(record: CookieRecord) -> Result<Self, Self::Error> {
        if record.name.is_empty() {
            return Err(NetError::cookie_invalid_data("empty cookie name"));
        }
        if record.domain.trim_start_matches('.').is_empty() {
            return Err(NetError::cookie_invalid_data("empty cookie domain"));
        }
        if !record.path.starts_with('/') {
            return Err(NetError::cookie_invalid_data(format!(
                "invalid cookie path {:?}",
                record.path
            )));
        }

        let expiration_time = record
            .expires_unix_secs
            .map(|secs| {
                OffsetDateTime::from_unix_timestamp(secs)
                    .map_err(|e| NetError::cookie_invalid_data(e.to_string()))
            })
            .transpose()?;

        let creation_time = match record.creation_unix_secs {
            Some(secs) => OffsetDateTime::from_unix_timestamp(secs)
                .map_err(|e| NetError::cookie_invalid_data(e.to_string()))?,
            None => OffsetDateTime::now_utc(),
        };

        let last_access_time = match record.last_access_unix_secs {
            Some(secs) => OffsetDateTime::from_unix_timestamp(secs)
                .map_err(|e| NetError::cookie_invalid_data(e.to_string()))?,
            None => creation_time,
        };

        Ok(CanonicalCookie {
            name: record.name,
            value: record.value,
            domain: record.domain.to_ascii_lowercase(),
            path: record.path,
            creation_time,
            expiration_time,
            last_access_time,
            secure: record.secure,
            http_only: record.http_only,
            same_site: record.same_site,
            priority: record.priority,
        })
    }
}

/// Durable storage for a cookie jar.
///
/// Implementations must be `Send + Sync`; the jar calls them from whichever
/// thread triggers `save`/`load`.
pub trait CookiePersistence: Send + Sync {
    /// Read every stored record. A missing store yields an empty list.
    fn load(&self) -> Result<Vec<CookieRecord>, NetError>;

    /// Replace the stored contents with `records`.
    fn save(&self, records: &[CookieRecord]) -> Result<(), NetError>;
}

/// JSON file backend.
#[derive(Debug, Clone)]
pub struct JsonCookieFile {
    path: PathBuf,
}

impl JsonCookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl CookiePersistence for JsonCookieFile {
    fn load(&self) -> Result<Vec<CookieRecord>, NetError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.path).store_context(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<serde_json::Value> = serde_json::from_str(&json)
            .map_err(|e| NetError::cookie_invalid_data(e.to_string()))?;

        let mut records = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<CookieRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        index,
                        error = %e,
                        "skipping malformed cookie record"
                    );
                }
            }
        }

        Ok(records)
    }

    fn save(&self, records: &[CookieRecord]) -> Result<(), NetError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).store_context(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(records)
            .map_err(|e| NetError::cookie_invalid_data(e.to_string()))?;

        // Write then rename; readers never observe a partial file
        let tmp = self.temp_path();
        fs::write(&tmp, json).store_context(&tmp)?;
        fs::rename(&tmp, &self.path).store_context(&self.path)
    }
}

/// SQLite database backend.
#[derive(Debug, Clone)]
pub struct SqliteCookieFile {
    path: PathBuf,
}

const CREATE_COOKIES_TABLE: &str = "CREATE TABLE IF NOT EXISTS cookies (
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    domain TEXT NOT NULL,
    path TEXT NOT NULL,
    is_secure INTEGER NOT NULL,
    is_httponly INTEGER NOT NULL,
    samesite INTEGER NOT NULL,
    priority INTEGER NOT NULL,
    expires_utc INTEGER,
    creation_utc INTEGER,
    last_access_utc INTEGER,
    PRIMARY KEY (name, domain, path)
)";

impl SqliteCookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, NetError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).store_context(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(CREATE_COOKIES_TABLE)?;
        Ok(conn)
    }
}

impl CookiePersistence for SqliteCookieFile {
    fn load(&self) -> Result<Vec<CookieRecord>, NetError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT name, value, domain, path, is_secure, is_httponly, samesite, priority, \
             expires_utc, creation_utc, last_access_utc FROM cookies",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CookieRecord {
                name: row.get(0)?,
                value: row.get(1)?,
                domain: row.get(2)?,
                path: row.get(3)?,
                secure: row.get(4)?,
                http_only: row.get(5)?,
                same_site: SameSite::from_i32(row.get(6)?),
                priority: CookiePriority::from_i32(row.get(7)?),
                expires_unix_secs: row.get(8)?,
                creation_unix_secs: row.get(9)?,
                last_access_unix_secs: row.get(10)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "skipping malformed cookie row"
                    );
                }
            }
        }

        Ok(records)
    }

    fn save(&self, records: &[CookieRecord]) -> Result<(), NetError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cookies", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO cookies (name, value, domain, path, is_secure, \
                 is_httponly, samesite, priority, expires_utc, creation_utc, last_access_utc) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for r in records {
                stmt.execute(params![
                    r.name,
                    r.value,
                    r.domain,
                    r.path,
                    r.secure,
                    r.http_only,
                    r.same_site.as_i32(),
                    r.priority.as_i32(),
                    r.expires_unix_secs,
                    r.creation_unix_secs,
                    r.last_access_unix_secs,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl From<rusqlite::Error> for NetError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ffi::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ffi::ErrorCode::DatabaseLocked =>
            {
                NetError::CookieDatabaseLocked
            }
            _ => NetError::CookieDatabaseError {
                message: err.to_string(),
            },
        }
    }
}
