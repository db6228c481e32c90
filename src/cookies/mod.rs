//! Cookie management and persistence.
//!
//! This module provides a complete cookie store including:
//!
//! - **Storage**: Thread-safe cookie jar ([`CookieJar`](jar::CookieJar))
//! - **Matching**: RFC 6265 domain, path, secure and expiry rules
//! - **Validation**: Public Suffix List and `__Secure-`/`__Host-` prefix checks
//! - **Persistence**: Save/load cookies to JSON or SQLite
//! - **Import/Export**: Netscape format (curl/wget compatible)
//!
//! # Architecture
//!
//! This implementation mirrors Chromium's cookie storage architecture:
//!
//! | Chromium (C++) | cookiejar (Rust) | Responsibility |
//! |----------------|------------------|----------------|
//! | `net::CookieMonster` | [`CookieJar`](jar::CookieJar) | Cookie jar with LRU eviction |
//! | `net::CanonicalCookie` | [`CanonicalCookie`](canonical_cookie::CanonicalCookie) | Single cookie representation |
//! | `net::CookieStore` | [`CookieStore`](store::CookieStore) | Interface used by the network stack |
//! | `SqlitePersistentCookieStore` | [`persistence`] | Disk persistence |
//!
//! # Persistent jar
//!
//! ```rust,no_run
//! use cookiejar::cookies::config::CookieJarConfig;
//! use cookiejar::cookies::jar::CookieJar;
//! use url::Url;
//!
//! let jar = CookieJar::with_config(&CookieJarConfig::persistent("cookies.json"));
//! jar.load()?;
//!
//! let url = Url::parse("https://www.example.com/login")?;
//! jar.parse_and_save_cookie(&url, "sid=abc; Domain=example.com; Max-Age=3600");
//! assert_eq!(jar.cookies_for_url(&url).len(), 1);
//!
//! jar.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Export to Netscape Format (curl/wget compatible)
//!
//! ```rust,no_run
//! use cookiejar::cookies::jar::CookieJar;
//!
//! let jar = CookieJar::new();
//! // ... add cookies ...
//! let netscape = jar.export_netscape(None);
//! std::fs::write("cookies.txt", netscape)?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod canonical_cookie;
pub mod config;
pub mod jar;
pub mod maintenance;
pub mod persistence;
pub mod psl;
pub mod store;
