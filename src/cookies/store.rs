//! The cookie contract consumed by the network layer.
//!
//! An HTTP client only needs two calls per exchange: fetch the cookies for an
//! outgoing request, and hand over the cookies from a response. [`CookieStore`]
//! is exactly that, plus header helpers built on top of it.
//!
//! ```rust
//! use cookiejar::cookies::jar::CookieJar;
//! use cookiejar::cookies::store::CookieStore;
//! use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
//! use std::sync::Arc;
//! use url::Url;
//!
//! let store: Arc<dyn CookieStore> = Arc::new(CookieJar::new());
//! let url = Url::parse("https://example.com/").unwrap();
//!
//! let mut headers = HeaderMap::new();
//! headers.append(SET_COOKIE, HeaderValue::from_static("sid=abc; Path=/"));
//! store.store_response_cookies(&url, &headers);
//!
//! assert_eq!(store.cookie_header_for_url(&url).as_deref(), Some("sid=abc"));
//! ```

use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::jar::CookieJar;
use http::header::{HeaderMap, SET_COOKIE};
use time::OffsetDateTime;
use url::Url;

/// Cookie storage as seen by an HTTP client.
pub trait CookieStore: Send + Sync {
    /// Cookies to attach to a request for `url`, in header order.
    fn cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie>;

    /// Store cookies parsed from a response for `url`.
    /// Returns true if at least one cookie was accepted.
    fn set_cookies_from_url(&self, cookies: Vec<CanonicalCookie>, url: &Url) -> bool;

    /// The `Cookie` request header value for `url`, if any cookie applies.
    fn cookie_header_for_url(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies_for_url(url);
        if cookies.is_empty() {
            return None;
        }

        // Format cookies as "name=value; name2=value2"
        Some(
            cookies
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Parse every `Set-Cookie` header in `headers` and store the results.
    fn store_response_cookies(&self, url: &Url, headers: &HeaderMap) -> bool {
        let now = OffsetDateTime::now_utc();
        let cookies: Vec<CanonicalCookie> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|val| val.to_str().ok())
            .filter_map(
                |line| match CanonicalCookie::from_set_cookie(url, line, now) {
                    Ok(cookie) => Some(cookie),
                    Err(e) => {
                        tracing::debug!(url = %url, error = %e, "ignoring Set-Cookie header");
                        None
                    }
                },
            )
            .collect();

        if cookies.is_empty() {
            return false;
        }

        self.set_cookies_from_url(cookies, url)
    }
}

impl CookieStore for CookieJar {
    fn cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        CookieJar::cookies_for_url(self, url)
    }

    fn set_cookies_from_url(&self, cookies: Vec<CanonicalCookie>, url: &Url) -> bool {
        CookieJar::set_cookies_from_url(self, cookies, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;

    #[test]
    fn test_cookie_header_orders_longest_path_first() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/account/settings").unwrap();
        jar.parse_and_save_cookie(&url, "root=1; Path=/");
        jar.parse_and_save_cookie(&url, "deep=2; Path=/account");

        let store: &dyn CookieStore = &jar;
        assert_eq!(
            store.cookie_header_for_url(&url).as_deref(),
            Some("deep=2; root=1")
        );
    }

    #[test]
    fn test_cookie_header_none_when_empty() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(CookieStore::cookie_header_for_url(&jar, &url), None);
    }

    #[test]
    fn test_store_response_cookies_multiple_headers() {
        let jar = CookieJar::new();
        let url = Url::parse("https://www.example.com/login").unwrap();

        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2; Domain=example.com"));
        headers.append(SET_COOKIE, HeaderValue::from_static("garbage"));
        headers.append(SET_COOKIE, HeaderValue::from_static("c=3; Domain=evil.com"));

        assert!(jar.store_response_cookies(&url, &headers));
        assert_eq!(jar.total_cookie_count(), 2);
        assert!(jar.cookie("b", None).is_some_and(|c| c.domain == ".example.com"));
        assert!(jar.cookie("c", None).is_none());
    }

    #[test]
    fn test_store_response_cookies_without_set_cookie() {
        let jar = CookieJar::new();
        let url = Url::parse("https://example.com/").unwrap();
        assert!(!jar.store_response_cookies(&url, &HeaderMap::new()));
    }
}
