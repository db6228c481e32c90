//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add cookie store context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use cookiejar::base::context::IoResultExt;
    ///
    /// let json = std::fs::read_to_string(&path).store_context(&path)?;
    /// // Error: "Cookie store I/O failed for /tmp/cookies.json: permission denied"
    /// ```
    fn store_context(self, path: &Path) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn store_context(self, path: &Path) -> Result<T, NetError> {
        self.map_err(|e| NetError::cookie_store_io(path, e))
    }
}
