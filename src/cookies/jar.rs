use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::{
    cookieable_host, default_path, is_ip_literal, is_secure_scheme, CanonicalCookie,
    CookiePriority,
};
use crate::cookies::config::CookieJarConfig;
use crate::cookies::persistence::{CookiePersistence, CookieRecord};
use crate::cookies::psl;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain (Chromium default).
pub const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies.
/// Chromium uses 3300, but we use a slightly lower limit to keep memory usage predictable.
pub const MAX_COOKIES_TOTAL: usize = 3000;

/// The cookie store for one browsing profile.
/// Modeled after Chromium's `net::CookieMonster`.
///
/// All methods take `&self`; share the jar as `Arc<CookieJar>` between the
/// network layer and the host application.
pub struct CookieJar {
    // Store: Map<Domain without leading dot, List<Cookie>>
    store: DashMap<String, Vec<CanonicalCookie>>,
    enabled: AtomicBool,
    persistence: Option<Arc<dyn CookiePersistence>>,
    max_cookies_per_domain: usize,
    max_cookies_total: usize,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieJar")
            .field("cookies", &self.total_cookie_count())
            .field("enabled", &self.is_enabled())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl CookieJar {
    /// In-memory jar with default limits.
    pub fn new() -> Self {
        Self::with_config(&CookieJarConfig::default())
    }

    pub fn with_config(config: &CookieJarConfig) -> Self {
        Self {
            store: DashMap::new(),
            enabled: AtomicBool::new(config.enabled),
            persistence: config.persistence(),
            max_cookies_per_domain: config.max_cookies_per_domain.max(1),
            max_cookies_total: config.max_cookies_total.max(1),
        }
    }

    /// Jar with default limits backed by `persistence`.
    pub fn with_persistence(persistence: Arc<dyn CookiePersistence>) -> Self {
        let mut jar = Self::new();
        jar.persistence = Some(persistence);
        jar
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Stop answering reads and accepting writes. Stored cookies are kept.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Get cookies to send with a request for `url`.
    ///
    /// Applies domain, path, `Secure` and expiry checks, and marks every
    /// returned cookie as accessed. Results are ordered longest path first,
    /// then by creation time.
    pub fn cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        if !self.is_enabled() {
            return Vec::new();
        }

        let Ok(host) = cookieable_host(url) else {
            return Vec::new();
        };
        let now = OffsetDateTime::now_utc();

        let mut result = Vec::new();
        for key in candidate_keys(&host) {
            if let Some(mut entry) = self.store.get_mut(&key) {
                for cookie in entry
                    .iter_mut()
                    .filter(|c| c.is_included_for_url(url, now))
                {
                    cookie.last_access_time = now;
                    result.push(cookie.clone());
                }
            }
        }

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// Store cookies received in a response from `url`.
    ///
    /// Empty domains default to the request host (host-only) and empty paths
    /// to the URL's default path. Cookies scoped to a foreign domain or to a
    /// public suffix are dropped. Returns true if at least one cookie was stored.
    pub fn set_cookies_from_url(&self, cookies: Vec<CanonicalCookie>, url: &Url) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let host = match cookieable_host(url) {
            Ok(host) => host,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "rejecting cookies for URL");
                return false;
            }
        };

        let now = OffsetDateTime::now_utc();
        let secure_origin = is_secure_scheme(url);
        let mut accepted = false;

        for cookie in cookies {
            let name = cookie.name.clone();
            match canonicalize_for_url(cookie, url, &host, secure_origin) {
                Ok(cookie) => accepted |= self.store_cookie(cookie, now),
                Err(e) => {
                    tracing::debug!(host = %host, name = %name, error = %e, "rejected cookie");
                }
            }
        }

        accepted
    }

    /// Parse a raw `Set-Cookie` value and store it as if received from `url`.
    pub fn parse_and_save_cookie(&self, url: &Url, cookie_line: &str) -> bool {
        match CanonicalCookie::from_set_cookie(url, cookie_line, OffsetDateTime::now_utc()) {
            Ok(cookie) => self.set_cookies_from_url(vec![cookie], url),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "failed to parse cookie");
                false
            }
        }
    }

    /// Add a single cookie. See [`add_cookies`](Self::add_cookies).
    pub fn add_cookie(&self, cookie: CanonicalCookie, url: Option<&Url>) -> bool {
        self.add_cookies(vec![cookie], url)
    }

    /// Add cookies on behalf of the host application.
    ///
    /// With a URL the cookies are validated exactly like response cookies.
    /// Without one, their domain and path are trusted as given.
    pub fn add_cookies(&self, cookies: Vec<CanonicalCookie>, url: Option<&Url>) -> bool {
        if let Some(url) = url {
            return self.set_cookies_from_url(cookies, url);
        }

        if !self.is_enabled() {
            return false;
        }

        let now = OffsetDateTime::now_utc();
        let mut accepted = false;
        for cookie in cookies {
            match normalize_trusted(cookie) {
                Ok(cookie) => accepted |= self.store_cookie(cookie, now),
                Err(e) => tracing::debug!(error = %e, "rejected cookie"),
            }
        }

        accepted
    }

    /// All unexpired cookies (no URL) or the cookies that apply to `url`.
    pub fn cookies(&self, url: Option<&Url>) -> Vec<CanonicalCookie> {
        if !self.is_enabled() {
            return Vec::new();
        }

        match url {
            Some(url) => self.cookies_for_url(url),
            None => {
                let now = OffsetDateTime::now_utc();
                self.iter_all_cookies()
                    .filter(|c| !c.is_expired(now))
                    .collect()
            }
        }
    }

    /// Look up a cookie by name within the scope of `url`.
    pub fn cookie(&self, name: &str, url: Option<&Url>) -> Option<CanonicalCookie> {
        self.cookies(url).into_iter().find(|c| c.name == name)
    }

    /// Delete cookies named `name` within the scope of `url`.
    pub fn delete_cookie(&self, name: &str, url: Option<&Url>) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let removed = match url {
            Some(url) => {
                let now = OffsetDateTime::now_utc();
                self.remove_where(|c| c.name == name && c.is_included_for_url(url, now))
            }
            None => self.remove_where(|c| c.name == name),
        };

        removed > 0
    }

    /// Delete every cookie within the scope of `url`, or every cookie at all.
    pub fn delete_cookies(&self, url: Option<&Url>) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let removed = match url {
            Some(url) => {
                let now = OffsetDateTime::now_utc();
                self.remove_where(|c| c.is_included_for_url(url, now))
            }
            None => self.remove_where(|_| true),
        };

        removed > 0
    }

    /// Clear all cookies.
    pub fn clear_cookies(&self) {
        self.store.clear();
    }

    /// Remove cookies whose expiration time has passed.
    pub fn purge_expired_cookies(&self) -> bool {
        let now = OffsetDateTime::now_utc();
        let removed = self.remove_where(|c| c.is_expired(now));
        if removed > 0 {
            tracing::debug!(removed, "purged expired cookies");
        }
        removed > 0
    }

    /// Remove cookies without an expiration time.
    pub fn purge_session_cookies(&self) -> bool {
        let removed = self.remove_where(CanonicalCookie::is_session);
        if removed > 0 {
            tracing::debug!(removed, "purged session cookies");
        }
        removed > 0
    }

    /// Write all durable cookies to the persistence backend.
    ///
    /// Session and expired cookies are never written. No-op for an in-memory jar.
    pub fn save(&self) -> Result<(), NetError> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };

        let now = OffsetDateTime::now_utc();
        let records: Vec<CookieRecord> = self
            .iter_all_cookies()
            .filter(|c| !c.is_session() && !c.is_expired(now))
            .map(|c| CookieRecord::from(&c))
            .collect();

        persistence.save(&records)?;
        tracing::info!(count = records.len(), "saved cookies");
        Ok(())
    }

    /// Read cookies from the persistence backend into the jar.
    ///
    /// Invalid and expired records are skipped. Returns the number loaded.
    pub fn load(&self) -> Result<usize, NetError> {
        let Some(persistence) = &self.persistence else {
            return Ok(0);
        };

        let records = persistence.load()?;
        let now = OffsetDateTime::now_utc();
        let mut loaded = 0;

        for record in records {
            let cookie = match CanonicalCookie::try_from(record) {
                Ok(cookie) => cookie,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping invalid persisted cookie");
                    continue;
                }
            };

            if cookie.is_expired(now) {
                continue;
            }

            self.insert_canonical_cookie(cookie);
            loaded += 1;
        }

        tracing::info!(loaded, "loaded cookies");
        Ok(loaded)
    }

    /// Drop session cookies and persist the rest; call on orderly exit.
    pub fn shutdown(&self) -> Result<(), NetError> {
        self.purge_session_cookies();
        self.purge_expired_cookies();
        self.save()
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    /// Iterate over all cookies (for persistence).
    pub fn iter_all_cookies(&self) -> impl Iterator<Item = CanonicalCookie> + '_ {
        self.store.iter().flat_map(|entry| entry.value().clone())
    }

    /// Export cookies to Netscape cookie format.
    ///
    /// The Netscape format is widely used by curl, wget, and other tools.
    /// Each line has the format:
    /// `domain\tinclude_subdomains\tpath\tsecure\texpiry\tname\tvalue`
    ///
    /// `domain_filter` keeps only cookies of the same site (registrable domain).
    pub fn export_netscape(&self, domain_filter: Option<&str>) -> String {
        let mut lines = vec![
            "# Netscape HTTP Cookie File".to_string(),
            "# https://curl.se/docs/http-cookies.html".to_string(),
            "# This file was generated by cookiejar".to_string(),
            String::new(),
        ];

        let filter_site = domain_filter.map(site_for);

        for cookie in self.iter_all_cookies() {
            if let Some(site) = &filter_site {
                if &site_for(&cookie.domain) != site {
                    continue;
                }
            }

            let include_subdomains = if cookie.is_host_only() { "FALSE" } else { "TRUE" };
            let secure = if cookie.secure { "TRUE" } else { "FALSE" };
            let expiry = cookie
                .expiration_time
                .map(|t| t.unix_timestamp())
                .unwrap_or(0);
            let prefix = if cookie.http_only { "#HttpOnly_" } else { "" };

            lines.push(format!(
                "{}{}\t{}\t{}\t{}\t{}\t{}\t{}",
                prefix,
                cookie.domain,
                include_subdomains,
                cookie.path,
                secure,
                expiry,
                cookie.name,
                cookie.value
            ));
        }

        lines.join("\n")
    }

    /// Import cookies from Netscape format file content.
    ///
    /// Returns the number of cookies stored.
    pub fn import_netscape(&self, content: &str) -> usize {
        if !self.is_enabled() {
            return 0;
        }

        let mut count = 0;
        let now = OffsetDateTime::now_utc();

        for line in content.lines() {
            let line = line.trim();
            let (line, http_only) = match line.strip_prefix("#HttpOnly_") {
                Some(rest) => (rest, true),
                None => (line, false),
            };

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 7 {
                continue;
            }

            let bare = parts[0].trim_start_matches('.');
            let domain = if parts[1].eq_ignore_ascii_case("TRUE") {
                format!(".{}", bare)
            } else {
                bare.to_string()
            };
            let expiration_time = match parts[4].trim().parse::<i64>() {
                Ok(0) => None,
                Ok(secs) => match OffsetDateTime::from_unix_timestamp(secs) {
                    Ok(t) => Some(t),
                    Err(e) => {
                        tracing::debug!(expiry = secs, error = %e, "skipping netscape cookie line");
                        continue;
                    }
                },
                Err(e) => {
                    tracing::debug!(expiry = parts[4], error = %e, "skipping netscape cookie line");
                    continue;
                }
            };

            let mut cookie =
                CanonicalCookie::new(parts[5], parts[6], domain, parts[2], now, expiration_time);
            cookie.secure = parts[3].eq_ignore_ascii_case("TRUE");
            cookie.http_only = http_only;

            match normalize_trusted(cookie) {
                Ok(cookie) => {
                    if self.store_cookie(cookie, now) {
                        count += 1;
                    }
                }
                Err(e) => tracing::debug!(error = %e, "skipping netscape cookie line"),
            }
        }

        count
    }

    /// Insert, or delete the equivalent cookie when `cookie` is already expired.
    fn store_cookie(&self, cookie: CanonicalCookie, now: OffsetDateTime) -> bool {
        if cookie.is_expired(now) {
            if self.remove_equivalent(&cookie) {
                tracing::debug!(name = %cookie.name, domain = %cookie.domain, "expired cookie deleted");
            }
            return false;
        }

        self.insert_canonical_cookie(cookie);
        true
    }

    fn insert_canonical_cookie(&self, cookie: CanonicalCookie) {
        let mut entry = self.store.entry(bucket_key(&cookie.domain)).or_default();

        // Replace in place if name/domain/path match, keeping the original creation time
        if let Some(existing) = entry.iter_mut().find(|c| c.is_equivalent(&cookie)) {
            let creation_time = existing.creation_time;
            *existing = CanonicalCookie {
                creation_time,
                ..cookie
            };
            return;
        }

        // Enforce per-domain limit: lowest priority first, then least recently used
        while entry.len() >= self.max_cookies_per_domain {
            if let Some(victim_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| eviction_key(c))
                .map(|(i, _)| i)
            {
                let evicted = entry.remove(victim_idx);
                tracing::debug!(domain = %evicted.domain, name = %evicted.name, "evicted cookie over domain limit");
            } else {
                break;
            }
        }

        entry.push(cookie);
        drop(entry); // Release lock before checking global count

        self.enforce_global_limit();
    }

    /// Enforce the global cookie limit, evicting in the same order as the per-domain limit.
    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > self.max_cookies_total {
            let mut victim: Option<CanonicalCookie> = None;
            for entry in self.store.iter() {
                for cookie in entry.value() {
                    let lower = victim
                        .as_ref()
                        .map_or(true, |v| eviction_key(cookie) < eviction_key(v));
                    if lower {
                        victim = Some(cookie.clone());
                    }
                }
            }

            let Some(victim) = victim else {
                break;
            };

            // Shard locks were released; match by identity, never by position
            if self.remove_same_cookie(&victim) {
                tracing::debug!(domain = %victim.domain, name = %victim.name, "evicted cookie over global limit");
            }
        }
    }

    /// Remove the stored cookie that is `cookie`: same triple and creation time.
    fn remove_same_cookie(&self, cookie: &CanonicalCookie) -> bool {
        let key = bucket_key(&cookie.domain);
        let removed = match self.store.get_mut(&key) {
            Some(mut entry) => {
                match entry.iter().position(|c| {
                    c.is_equivalent(cookie) && c.creation_time == cookie.creation_time
                }) {
                    Some(idx) => {
                        entry.remove(idx);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };
        self.store.remove_if(&key, |_, cookies| cookies.is_empty());
        removed
    }

    fn remove_equivalent(&self, cookie: &CanonicalCookie) -> bool {
        let key = bucket_key(&cookie.domain);
        let removed = match self.store.get_mut(&key) {
            Some(mut entry) => {
                let before = entry.len();
                entry.retain(|c| !c.is_equivalent(cookie));
                before != entry.len()
            }
            None => false,
        };
        self.store.remove_if(&key, |_, cookies| cookies.is_empty());
        removed
    }

    fn remove_where(&self, pred: impl Fn(&CanonicalCookie) -> bool) -> usize {
        let mut removed = 0;
        for mut entry in self.store.iter_mut() {
            let cookies = entry.value_mut();
            let before = cookies.len();
            cookies.retain(|c| !pred(c));
            removed += before - cookies.len();
        }

        if removed > 0 {
            self.store.retain(|_, cookies| !cookies.is_empty());
        }
        removed
    }
}

fn canonicalize_for_url(
    mut cookie: CanonicalCookie,
    url: &Url,
    host: &str,
    secure_origin: bool,
) -> Result<CanonicalCookie, NetError> {
    if cookie.name.is_empty() {
        return Err(NetError::cookie_invalid_data("empty cookie name"));
    }

    cookie.domain = if cookie.domain.is_empty() {
        host.to_string()
    } else {
        psl::canonicalize_cookie_domain(&cookie.domain, host)?
    };

    if !cookie.path.starts_with('/') {
        cookie.path = default_path(url);
    }

    cookie.validate_prefix(secure_origin)?;
    Ok(cookie)
}

fn normalize_trusted(mut cookie: CanonicalCookie) -> Result<CanonicalCookie, NetError> {
    if cookie.name.is_empty() {
        return Err(NetError::cookie_invalid_data("empty cookie name"));
    }
    if cookie.domain.trim_start_matches('.').is_empty() {
        return Err(NetError::cookie_invalid_data("empty cookie domain"));
    }

    cookie.domain = cookie.domain.to_ascii_lowercase();
    if !cookie.path.starts_with('/') {
        cookie.path = "/".to_string();
    }
    Ok(cookie)
}

fn eviction_key(cookie: &CanonicalCookie) -> (CookiePriority, OffsetDateTime) {
    (cookie.priority, cookie.last_access_time)
}

fn bucket_key(domain: &str) -> String {
    domain.trim_start_matches('.').to_ascii_lowercase()
}

fn site_for(domain: &str) -> String {
    psl::registrable_domain(domain).unwrap_or_else(|| bucket_key(domain))
}

/// Get all bucket keys to check for a given host.
/// Returns the host itself and all parent domains.
fn candidate_keys(host: &str) -> Vec<String> {
    let mut keys = vec![host.to_string()];
    if is_ip_literal(host) {
        return keys;
    }

    // e.g. for "foo.bar.example.com", add "bar.example.com", "example.com", "com"
    let mut rest = host;
    while let Some(idx) = rest.find('.') {
        rest = &rest[idx + 1..];
        if rest.is_empty() {
            break;
        }
        keys.push(rest.to_string());
    }

    keys
}
