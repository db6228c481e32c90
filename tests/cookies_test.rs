use cookiejar::cookies::canonical_cookie::CanonicalCookie;
use cookiejar::cookies::jar::CookieJar;
use std::time::Duration as StdDuration;
use time::{Duration, OffsetDateTime};
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn cookie(name: &str, value: &str, domain: &str, path: &str) -> CanonicalCookie {
    CanonicalCookie::new(name, value, domain, path, OffsetDateTime::now_utc(), None)
}

fn names(cookies: &[CanonicalCookie]) -> Vec<&str> {
    cookies.iter().map(|c| c.name.as_str()).collect()
}

#[test]
fn test_parse_and_save() {
    let store = CookieJar::new();
    let url = url("https://example.com/foo");
    assert!(store.parse_and_save_cookie(&url, "foo=bar; Path=/"));

    let cookies = store.cookies_for_url(&url);
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "foo");
    assert_eq!(cookies[0].value, "bar");
    assert_eq!(cookies[0].path, "/");
}

#[test]
fn test_uniqueness_latest_value_wins() {
    let jar = CookieJar::new();
    for value in ["1", "2", "3"] {
        assert!(jar.add_cookie(cookie("id", value, ".example.com", "/"), None));
    }

    // Same name on another path is a distinct cookie
    jar.add_cookie(cookie("id", "other", ".example.com", "/app"), None);

    let all = jar.cookies(None);
    assert_eq!(all.len(), 2);
    let root = all.iter().find(|c| c.path == "/").unwrap();
    assert_eq!(root.value, "3");
}

#[test]
fn test_domain_scoping_wildcard() {
    let jar = CookieJar::new();
    jar.add_cookie(cookie("w", "1", ".example.com", "/"), None);

    assert_eq!(jar.cookies_for_url(&url("http://example.com/")).len(), 1);
    assert_eq!(jar.cookies_for_url(&url("http://www.example.com/")).len(), 1);
    assert_eq!(jar.cookies_for_url(&url("http://api.example.com/")).len(), 1);
    assert!(jar.cookies_for_url(&url("http://notexample.com/")).is_empty());
}

#[test]
fn test_domain_scoping_host_only() {
    let jar = CookieJar::new();
    jar.add_cookie(cookie("h", "1", "example.com", "/"), None);

    assert_eq!(jar.cookies_for_url(&url("http://example.com/")).len(), 1);
    assert!(jar.cookies_for_url(&url("http://www.example.com/")).is_empty());
}

#[test]
fn test_path_scoping() {
    let jar = CookieJar::new();
    jar.add_cookie(cookie("acct", "1", "example.com", "/account"), None);

    assert_eq!(jar.cookies_for_url(&url("http://example.com/account")).len(), 1);
    assert_eq!(
        jar.cookies_for_url(&url("http://example.com/account/settings")).len(),
        1
    );
    assert!(jar.cookies_for_url(&url("http://example.com/acc")).is_empty());
    assert!(jar.cookies_for_url(&url("http://example.com/")).is_empty());
}

#[test]
fn test_path_matching_from_headers() {
    let store = CookieJar::new();
    let url = url("https://example.com/foo/bar");

    store.parse_and_save_cookie(&url, "root=val; Path=/");
    store.parse_and_save_cookie(&url, "foo=val; Path=/foo");
    store.parse_and_save_cookie(&url, "baz=val; Path=/baz");

    let cookies = store.cookies_for_url(&url);
    assert_eq!(names(&cookies), vec!["foo", "root"]);
}

#[test]
fn test_secure_flag() {
    let store = CookieJar::new();
    let https_url = url("https://example.com");
    let http_url = url("http://example.com");

    store.parse_and_save_cookie(&https_url, "sec=saved; Secure");

    assert_eq!(store.cookies_for_url(&https_url).len(), 1);
    assert_eq!(store.cookies_for_url(&http_url).len(), 0);
}

#[test]
fn test_expired_cookies_filtered_at_read_time() {
    let jar = CookieJar::new();
    let now = OffsetDateTime::now_utc();
    let mut brief = cookie("brief", "1", "example.com", "/");
    brief.expiration_time = Some(now + Duration::milliseconds(50));
    assert!(jar.add_cookie(brief, None));

    std::thread::sleep(StdDuration::from_millis(100));

    // Still stored until a purge, but never returned
    assert_eq!(jar.total_cookie_count(), 1);
    assert!(jar.cookies_for_url(&url("http://example.com/")).is_empty());
}

#[test]
fn test_expired_cookies_hidden_from_listing_and_lookup() {
    let jar = CookieJar::new();
    let now = OffsetDateTime::now_utc();
    let mut brief = cookie("brief", "1", "example.com", "/");
    brief.expiration_time = Some(now + Duration::milliseconds(50));
    jar.add_cookies(vec![brief, cookie("session", "1", "example.com", "/")], None);

    std::thread::sleep(StdDuration::from_millis(100));

    assert_eq!(names(&jar.cookies(None)), vec!["session"]);
    assert!(jar.cookie("brief", None).is_none());
    assert!(jar.cookie("session", None).is_some());
}

#[test]
fn test_purge_expired_cookies() {
    let jar = CookieJar::new();
    let now = OffsetDateTime::now_utc();

    let mut brief = cookie("brief", "1", "example.com", "/");
    brief.expiration_time = Some(now + Duration::milliseconds(50));
    let mut durable = cookie("durable", "1", "example.com", "/");
    durable.expiration_time = Some(now + Duration::days(1));
    let session = cookie("session", "1", "example.com", "/");

    jar.add_cookies(vec![brief, durable, session], None);
    assert_eq!(jar.total_cookie_count(), 3);

    std::thread::sleep(StdDuration::from_millis(100));

    assert!(jar.purge_expired_cookies());
    let remaining = jar.cookies(None);
    let mut left = names(&remaining);
    left.sort_unstable();
    assert_eq!(left, vec!["durable", "session"]);

    // Nothing left to purge
    assert!(!jar.purge_expired_cookies());
}

#[test]
fn test_purge_session_cookies() {
    let jar = CookieJar::new();
    let mut durable = cookie("durable", "1", "example.com", "/");
    durable.expiration_time = Some(OffsetDateTime::now_utc() + Duration::days(1));

    jar.add_cookies(
        vec![
            durable,
            cookie("s1", "1", "example.com", "/"),
            cookie("s2", "1", ".other.org", "/"),
        ],
        None,
    );

    assert!(jar.purge_session_cookies());
    assert_eq!(names(&jar.cookies(None)), vec!["durable"]);
    assert!(!jar.purge_session_cookies());
}

#[test]
fn test_cross_domain_rejection() {
    let jar = CookieJar::new();
    let accepted = jar.set_cookies_from_url(
        vec![cookie("evil", "1", "other.com", "/")],
        &url("http://example.com/"),
    );

    assert!(!accepted);
    assert_eq!(jar.total_cookie_count(), 0);
}

#[test]
fn test_non_cookieable_scheme_rejected() {
    let jar = CookieJar::new();
    let file = url("file:///home/user/page.html");

    assert!(!jar.set_cookies_from_url(vec![cookie("f", "1", "", "/")], &file));
    assert!(!jar.parse_and_save_cookie(&url("ftp://example.com/"), "f=1"));
    assert_eq!(jar.total_cookie_count(), 0);
    assert!(jar.cookies_for_url(&file).is_empty());
}

#[test]
fn test_set_cookies_defaults_domain_to_host() {
    let jar = CookieJar::new();
    let from = url("http://www.example.com/app/login");
    assert!(jar.set_cookies_from_url(vec![cookie("a", "1", "", "")], &from));

    let stored = jar.cookie("a", None).unwrap();
    assert_eq!(stored.domain, "www.example.com");
    assert_eq!(stored.path, "/app");
    assert!(jar.cookies_for_url(&url("http://example.com/app")).is_empty());
}

#[test]
fn test_set_cookies_partial_acceptance() {
    let jar = CookieJar::new();
    let accepted = jar.set_cookies_from_url(
        vec![
            cookie("good", "1", ".example.com", "/"),
            cookie("bad", "1", ".other.com", "/"),
            cookie("", "1", ".example.com", "/"),
        ],
        &url("https://example.com/"),
    );

    assert!(accepted);
    assert_eq!(names(&jar.cookies(None)), vec!["good"]);
}

#[test]
fn test_expired_cookie_from_response_deletes_existing() {
    let jar = CookieJar::new();
    let from = url("https://example.com/");
    jar.parse_and_save_cookie(&from, "sid=abc");
    assert_eq!(jar.total_cookie_count(), 1);

    assert!(!jar.parse_and_save_cookie(&from, "sid=gone; Max-Age=0"));
    assert_eq!(jar.total_cookie_count(), 0);
}

#[test]
fn test_disabled_jar_is_noop() {
    let jar = CookieJar::new();
    let from = url("http://example.com/");
    jar.add_cookie(cookie("kept", "1", "example.com", "/"), None);

    jar.disable();
    assert!(!jar.is_enabled());

    assert!(!jar.add_cookie(cookie("new", "1", "example.com", "/"), None));
    assert!(!jar.set_cookies_from_url(vec![cookie("new", "1", "", "/")], &from));
    assert!(!jar.delete_cookie("kept", None));
    assert!(!jar.delete_cookies(None));
    assert!(jar.cookies_for_url(&from).is_empty());
    assert!(jar.cookie("kept", None).is_none());
    assert_eq!(jar.total_cookie_count(), 1);

    jar.enable();
    assert_eq!(names(&jar.cookies_for_url(&from)), vec!["kept"]);
}

#[test]
fn test_cookie_lookup_by_name_and_scope() {
    let jar = CookieJar::new();
    jar.add_cookie(cookie("sid", "a", "a.example.com", "/"), None);
    jar.add_cookie(cookie("sid", "b", "b.example.com", "/"), None);

    let found = jar.cookie("sid", Some(&url("http://b.example.com/"))).unwrap();
    assert_eq!(found.value, "b");
    assert!(jar.cookie("sid", Some(&url("http://c.example.com/"))).is_none());
    assert!(jar.cookie("missing", None).is_none());
}

#[test]
fn test_delete_cookie_scoped_to_url() {
    let jar = CookieJar::new();
    jar.add_cookie(cookie("sid", "a", "a.example.com", "/"), None);
    jar.add_cookie(cookie("sid", "b", "b.example.com", "/"), None);

    assert!(jar.delete_cookie("sid", Some(&url("http://a.example.com/"))));
    assert_eq!(jar.total_cookie_count(), 1);
    assert!(!jar.delete_cookie("sid", Some(&url("http://a.example.com/"))));

    assert!(jar.delete_cookie("sid", None));
    assert_eq!(jar.total_cookie_count(), 0);
}

#[test]
fn test_delete_cookies_scoped_and_clear() {
    let jar = CookieJar::new();
    jar.add_cookie(cookie("a", "1", ".example.com", "/"), None);
    jar.add_cookie(cookie("b", "1", ".example.com", "/"), None);
    jar.add_cookie(cookie("c", "1", "other.org", "/"), None);

    assert!(jar.delete_cookies(Some(&url("http://www.example.com/"))));
    assert_eq!(names(&jar.cookies(None)), vec!["c"]);
    assert!(!jar.delete_cookies(Some(&url("http://www.example.com/"))));

    jar.clear_cookies();
    assert_eq!(jar.total_cookie_count(), 0);
    assert!(!jar.delete_cookies(None));
}

#[test]
fn test_add_cookie_with_url_validates() {
    let jar = CookieJar::new();
    let from = url("http://www.example.com/");

    assert!(!jar.add_cookie(cookie("x", "1", "other.com", "/"), Some(&from)));
    assert!(jar.add_cookie(cookie("x", "1", ".example.com", "/"), Some(&from)));

    // Without a URL the cookie's own scope is trusted
    assert!(jar.add_cookie(cookie("y", "1", "other.com", "/"), None));
    assert_eq!(jar.total_cookie_count(), 2);
}

#[test]
fn test_sid_scenario() {
    let jar = CookieJar::new();
    let login = url("http://www.example.com/login");

    assert!(jar.set_cookies_from_url(vec![cookie("sid", "abc", ".example.com", "/")], &login));

    let home = jar.cookies_for_url(&url("http://www.example.com/home"));
    assert_eq!(names(&home), vec!["sid"]);
    assert_eq!(home[0].value, "abc");
    assert!(jar.cookies_for_url(&url("http://other.com/")).is_empty());

    assert!(jar.purge_session_cookies());
    assert!(jar.cookies_for_url(&url("http://www.example.com/home")).is_empty());
}

#[test]
fn test_concurrent_writers() {
    use std::sync::Arc;

    let jar = Arc::new(CookieJar::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let jar = jar.clone();
            std::thread::spawn(move || {
                let from = Url::parse("https://example.com/").unwrap();
                for i in 0..20 {
                    jar.parse_and_save_cookie(&from, &format!("t{}c{}=v", t, i));
                    jar.parse_and_save_cookie(&from, "shared=v");
                    jar.cookies_for_url(&from);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Capped by the per-domain limit; the shared cookie is never duplicated
    assert_eq!(jar.total_cookie_count(), 50);
    assert!(jar.cookies(None).iter().filter(|c| c.name == "shared").count() <= 1);
}

#[test]
fn test_concurrent_writers_across_domains_respect_global_limit() {
    use cookiejar::cookies::config::CookieJarConfig;
    use std::sync::Arc;

    let config = CookieJarConfig {
        max_cookies_total: 40,
        ..CookieJarConfig::default()
    };
    let jar = Arc::new(CookieJar::with_config(&config));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let jar = jar.clone();
            std::thread::spawn(move || {
                for i in 0..30 {
                    let host = format!("https://site{}.example.com/", i % 10);
                    let from = Url::parse(&host).unwrap();
                    jar.parse_and_save_cookie(&from, &format!("t{}c{}=v", t, i));
                    if i % 3 == 0 {
                        jar.delete_cookie(&format!("t{}c{}", t, i / 2), None);
                    }
                    jar.cookies_for_url(&from);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(jar.total_cookie_count() <= 40);
    let all = jar.cookies(None);
    assert_eq!(all.len(), jar.total_cookie_count());
    for (i, a) in all.iter().enumerate() {
        assert!(all[i + 1..].iter().all(|b| !a.is_equivalent(b)));
    }
}
