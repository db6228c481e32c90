use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // URL Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,

    // Cookie Validation Errors
    #[error("Cookie prefix validation failed")]
    CookieInvalidPrefix,
    #[error("Cookie domain is a public suffix")]
    CookiePublicSuffix,
    #[error("Cookie domain does not match request host")]
    CookieDomainMismatch,
    #[error("Invalid cookie data: {reason}")]
    CookieInvalidData { reason: String },

    // Cookie Persistence Errors
    #[error("Cookie store I/O failed for {path}: {message}")]
    CookieStoreIo { path: String, message: String },
    #[error("Cookie database error: {message}")]
    CookieDatabaseError { message: String },
    #[error("Cookie database is locked")]
    CookieDatabaseLocked,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Create an invalid data error.
    pub fn cookie_invalid_data(reason: impl Into<String>) -> Self {
        NetError::CookieInvalidData {
            reason: reason.into(),
        }
    }

    /// Create a store I/O error for `path`.
    pub fn cookie_store_io(path: &Path, err: impl std::fmt::Display) -> Self {
        NetError::CookieStoreIo {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether the error came from the persistence layer rather than validation.
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            NetError::CookieStoreIo { .. }
                | NetError::CookieDatabaseError { .. }
                | NetError::CookieDatabaseLocked
        )
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            // Custom codes start at -10000 to stay clear of Chromium's ranges
            NetError::CookieInvalidPrefix => -10001,
            NetError::CookiePublicSuffix => -10002,
            NetError::CookieDomainMismatch => -10003,
            NetError::CookieInvalidData { .. } => -10004,
            NetError::CookieStoreIo { .. } => -10005,
            NetError::CookieDatabaseError { .. } => -10006,
            NetError::CookieDatabaseLocked => -10007,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -10001 => NetError::CookieInvalidPrefix,
            -10002 => NetError::CookiePublicSuffix,
            -10003 => NetError::CookieDomainMismatch,
            -10004 => NetError::CookieInvalidData {
                reason: String::new(),
            },
            -10005 => NetError::CookieStoreIo {
                path: String::new(),
                message: String::new(),
            },
            -10006 => NetError::CookieDatabaseError {
                message: String::new(),
            },
            -10007 => NetError::CookieDatabaseLocked,
            _ => NetError::Unknown(code),
        }
    }
}
