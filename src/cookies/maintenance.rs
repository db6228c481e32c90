//! Background upkeep for a shared [`CookieJar`].

use crate::cookies::config::CookieJarConfig;
use crate::cookies::jar::CookieJar;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest period accepted by [`spawn_expiry_purge`].
pub const MIN_PURGE_PERIOD: Duration = Duration::from_secs(1);

/// Run [`CookieJar::purge_expired_cookies`] every `period` on the current runtime.
///
/// The task runs until the returned handle is aborted. The first purge happens
/// one `period` after spawning. Periods below [`MIN_PURGE_PERIOD`] are raised to it.
pub fn spawn_expiry_purge(jar: Arc<CookieJar>, period: Duration) -> JoinHandle<()> {
    let period = period.max(MIN_PURGE_PERIOD);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if jar.purge_expired_cookies() {
                tracing::debug!(
                    remaining = jar.total_cookie_count(),
                    "periodic expiry purge removed cookies"
                );
            }
        }
    })
}

/// Spawn the purge task if `config` asks for one.
pub fn spawn_from_config(jar: Arc<CookieJar>, config: &CookieJarConfig) -> Option<JoinHandle<()>> {
    config
        .purge_interval()
        .map(|period| spawn_expiry_purge(jar, period))
}
