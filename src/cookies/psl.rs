//! Public Suffix List (PSL) validation for cookie domain security.
//!
//! Prevents supercookie attacks by rejecting cookies set on public
//! suffixes like `.com`, `.co.uk`, etc.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::is_ip_literal;
use psl::{List, Psl};

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
/// Returns true if the domain itself is a public suffix.
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_ascii_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// Get the registrable domain (eTLD+1) for a domain.
/// For "sub.example.com", returns "example.com".
/// For "com" (public suffix), returns None.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let domain_lower = domain.trim_start_matches('.').to_ascii_lowercase();
    if is_ip_literal(&domain_lower) {
        return None;
    }
    psl::domain(domain_lower.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(|s| s.to_string())
}

/// Canonicalize a cookie domain received from `url_host`.
///
/// The returned domain is lowercased and keeps its leading dot (domain
/// cookie) or lack of one (host-only). Fails when the domain is neither the
/// host nor a parent of it, or when it is a public suffix. A public suffix
/// that equals the host itself is downgraded to a host-only cookie.
pub fn canonicalize_cookie_domain(cookie_domain: &str, url_host: &str) -> Result<String, NetError> {
    let is_domain_cookie = cookie_domain.starts_with('.');
    let bare = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let host = url_host.to_ascii_lowercase();

    if bare.is_empty() {
        return Err(NetError::cookie_invalid_data("empty cookie domain"));
    }

    if is_ip_literal(&host) {
        // IP hosts only ever get host-only cookies
        return if bare == host {
            Ok(host)
        } else {
            Err(NetError::CookieDomainMismatch)
        };
    }

    let on_host = host == bare || host.ends_with(&format!(".{}", bare));
    if !on_host {
        return Err(NetError::CookieDomainMismatch);
    }

    if is_public_suffix(&bare) {
        return if bare == host {
            Ok(host)
        } else {
            Err(NetError::CookiePublicSuffix)
        };
    }

    if is_domain_cookie {
        Ok(format!(".{}", bare))
    } else {
        Ok(bare)
    }
}

/// Check if a cookie domain is valid for a given URL host.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    canonicalize_cookie_domain(cookie_domain, url_host).is_ok()
}
