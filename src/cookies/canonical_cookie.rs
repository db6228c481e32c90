use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use time::{Duration, OffsetDateTime};
use url::Url;

/// Upper bound on cookie lifetime (RFC 6265bis, 400 days).
pub const MAX_EXPIRATION_DAYS: i64 = 400;

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
///
/// A cookie is identified by `(name, domain, path)`. A `domain` starting with
/// `.` applies to that domain and all of its subdomains; any other domain is
/// host-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub last_access_time: OffsetDateTime,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub priority: CookiePriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    #[default]
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

impl SameSite {
    /// Chromium's `CookieSameSite` value, as stored in cookie databases.
    pub fn as_i32(self) -> i32 {
        match self {
            SameSite::Unspecified => -1,
            SameSite::NoRestriction => 0,
            SameSite::Lax => 1,
            SameSite::Strict => 2,
        }
    }

    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => SameSite::NoRestriction,
            1 => SameSite::Lax,
            2 => SameSite::Strict,
            _ => SameSite::Unspecified,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum CookiePriority {
    Low,
    #[default]
    Medium,
    High,
}

impl CookiePriority {
    pub fn as_i32(self) -> i32 {
        match self {
            CookiePriority::Low => 0,
            CookiePriority::Medium => 1,
            CookiePriority::High => 2,
        }
    }

    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => CookiePriority::Low,
            2 => CookiePriority::High,
            _ => CookiePriority::Medium,
        }
    }
}

impl CanonicalCookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
        creation_time: OffsetDateTime,
        expiration_time: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
            creation_time,
            expiration_time,
            last_access_time: creation_time,
            secure: false,
            http_only: false,
            same_site: SameSite::Unspecified,
            priority: CookiePriority::Medium,
        }
    }

    /// Parse a `Set-Cookie` header value received from `url`.
    ///
    /// Handles `Domain`, `Path`, `Expires`, `Max-Age` (which wins over
    /// `Expires`), `Secure`, `HttpOnly` and `SameSite`. An explicit `Domain`
    /// always yields a dot-prefixed domain cookie; without one the cookie is
    /// host-only. Domain validation against the request host is left to the jar.
    pub fn from_set_cookie(
        url: &Url,
        cookie_line: &str,
        now: OffsetDateTime,
    ) -> Result<Self, NetError> {
        let host = cookieable_host(url)?;
        let parsed = cookie::Cookie::parse(cookie_line)
            .map_err(|e| NetError::cookie_invalid_data(e.to_string()))?;

        if parsed.name().is_empty() {
            return Err(NetError::cookie_invalid_data("empty cookie name"));
        }

        let domain = match parsed.domain() {
            Some(d) if !d.trim_start_matches('.').is_empty() => {
                format!(".{}", d.trim_start_matches('.').to_ascii_lowercase())
            }
            _ => host,
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url),
        };

        let expiration_time = match parsed.max_age() {
            Some(max_age) if max_age <= Duration::ZERO => Some(OffsetDateTime::UNIX_EPOCH),
            Some(max_age) => Some(clamp_expiration(now.checked_add(max_age), now)),
            None => parsed
                .expires()
                .and_then(|e| e.datetime())
                .map(|t| clamp_expiration(Some(t), now)),
        };

        let same_site = match parsed.same_site() {
            Some(cookie::SameSite::Lax) => SameSite::Lax,
            Some(cookie::SameSite::Strict) => SameSite::Strict,
            Some(cookie::SameSite::None) => SameSite::NoRestriction,
            None => SameSite::Unspecified,
        };

        Ok(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            creation_time: now,
            expiration_time,
            last_access_time: now,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            same_site,
            priority: CookiePriority::Medium,
        })
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.expiration_time {
            Some(expiry) => expiry < current_time,
            None => false,
        }
    }

    /// Session cookies have no expiration and never outlive the process.
    pub fn is_session(&self) -> bool {
        self.expiration_time.is_none()
    }

    pub fn is_host_only(&self) -> bool {
        !self.domain.starts_with('.')
    }

    /// True when `other` has the same `(name, domain, path)` identity.
    pub fn is_equivalent(&self, other: &CanonicalCookie) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.domain.eq_ignore_ascii_case(&other.domain)
    }

    /// RFC 6265 domain matching against a request host.
    pub fn is_domain_match(&self, host: &str) -> bool {
        domain_matches(&self.domain, host)
    }

    /// RFC 6265 path matching against a request path.
    pub fn is_on_path(&self, request_path: &str) -> bool {
        path_matches(&self.path, request_path)
    }

    /// Whether this cookie should be attached to a request for `url` at `now`.
    pub fn is_included_for_url(&self, url: &Url, now: OffsetDateTime) -> bool {
        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return false,
        };

        if !self.is_domain_match(host) {
            return false;
        }

        if !self.is_on_path(url.path()) {
            return false;
        }

        if self.secure && !is_secure_scheme(url) {
            return false;
        }

        !self.is_expired(now)
    }

    /// Validate __Secure- and __Host- cookie prefixes per RFC 6265bis.
    /// - __Secure- cookies MUST have the Secure attribute
    /// - __Host- cookies MUST have Secure, Path="/", and no Domain attribute
    pub fn validate_prefix(&self, secure_origin: bool) -> Result<(), NetError> {
        if self.name.starts_with("__Secure-") && (!self.secure || !secure_origin) {
            return Err(NetError::CookieInvalidPrefix);
        }

        if self.name.starts_with("__Host-")
            && (!self.secure || self.path != "/" || !self.is_host_only() || !secure_origin)
        {
            return Err(NetError::CookieInvalidPrefix);
        }

        Ok(())
    }
}

impl fmt::Display for CanonicalCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Schemes that count as secure transport for `Secure` cookies.
pub fn is_secure_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "https" | "wss")
}

/// Lowercased host of `url`, if cookies may be set or sent for it.
///
/// Only `http`, `https`, `ws` and `wss` URLs with a host carry cookies.
pub fn cookieable_host(url: &Url) -> Result<String, NetError> {
    if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
        return Err(NetError::DisallowedUrlScheme);
    }

    match url.host_str() {
        Some(h) if !h.is_empty() => Ok(h.to_ascii_lowercase()),
        _ => Err(NetError::InvalidUrl),
    }
}

/// Check if cookie domain matches request host.
/// Implements RFC 6265 domain matching: host-only domains need an exact
/// match, dot-prefixed domains also match any subdomain on a label boundary.
pub fn domain_matches(cookie_domain: &str, request_host: &str) -> bool {
    let Some(base) = cookie_domain.strip_prefix('.') else {
        return cookie_domain.eq_ignore_ascii_case(request_host);
    };

    if base.is_empty() {
        return false;
    }

    if request_host.eq_ignore_ascii_case(base) {
        return true;
    }

    // IP literals never match by suffix
    if is_ip_literal(request_host) {
        return false;
    }

    if request_host.len() <= base.len() {
        return false;
    }

    let split = request_host.len() - base.len();
    if !request_host.is_char_boundary(split) {
        return false;
    }

    request_host[split..].eq_ignore_ascii_case(base) && request_host.as_bytes()[split - 1] == b'.'
}

/// Check if request path matches cookie path.
/// Implements RFC 6265 path matching.
pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }

    if let Some(rest) = request_path.strip_prefix(cookie_path) {
        // Cookie path is a prefix on a segment boundary
        return cookie_path.ends_with('/') || rest.starts_with('/');
    }

    false
}

/// RFC 6265 §5.1.4 default-path of a request URL.
pub fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }

    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

pub(crate) fn is_ip_literal(host: &str) -> bool {
    host.starts_with('[') || host.parse::<IpAddr>().is_ok()
}

fn clamp_expiration(expiry: Option<OffsetDateTime>, now: OffsetDateTime) -> OffsetDateTime {
    let limit = now + Duration::days(MAX_EXPIRATION_DAYS);
    match expiry {
        Some(t) if t < limit => t,
        _ => limit,
    }
}
