//! # cookiejar
//!
//! A persistent HTTP cookie store modeled on Chromium's cookie stack.
//!
//! `cookiejar` keeps the cookies a browser-like client has received, decides
//! which of them belong on each outgoing request, and carries durable cookies
//! across process restarts.
//!
//! ## Features
//!
//! - **RFC 6265 Matching**: Domain, path, `Secure` and expiry rules
//! - **Supercookie Protection**: Public Suffix List validation
//! - **Capacity Limits**: 50 cookies per domain, 3000 total (oldest evicted first)
//! - **Persistence**: JSON file or SQLite database, malformed records skipped
//! - **Network Boundary**: A narrow [`CookieStore`](cookies::store::CookieStore) trait
//!   for HTTP clients
//!
//! ## Quick Start
//!
//! ```rust
//! use cookiejar::cookies::jar::CookieJar;
//! use url::Url;
//!
//! let jar = CookieJar::new();
//! let login = Url::parse("https://www.example.com/login").unwrap();
//! jar.parse_and_save_cookie(&login, "sid=abc; Domain=example.com");
//!
//! let home = Url::parse("https://api.example.com/home").unwrap();
//! assert_eq!(jar.cookies_for_url(&home)[0].value, "abc");
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`cookies`] - Cookie storage, matching, and persistence

pub mod base;
pub mod cookies;
