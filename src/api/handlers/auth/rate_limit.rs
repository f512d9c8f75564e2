//! Fixed-window rate limiting backed by a shared counter store.
//!
//! The increment happens before the limit comparison, so concurrent requests
//! racing on the same key each observe a distinct counter value and at most
//! `limit` of them are admitted per window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::Pool;

/// Verdict for a single request against a fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Requests left in the current window (0 when denied).
    pub remaining: u32,
    /// Unix timestamp at which the window resets.
    pub reset_at: u64,
}

#[derive(Debug, Clone)]
struct MemoryCounter {
    count: i64,
    expires_at: Option<Instant>,
}

enum Backend {
    Redis(Pool),
    Memory(Arc<Mutex<HashMap<String, MemoryCounter>>>),
}

/// Counter backend: Redis in production, an in-process map for tests and
/// single-node setups without Redis.
#[derive(Clone)]
pub struct CounterStore {
    backend: Arc<Backend>,
}

impl std::fmt::Debug for CounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.backend.as_ref() {
            Backend::Redis(_) => f.write_str("CounterStore::Redis"),
            Backend::Memory(_) => f.write_str("CounterStore::Memory"),
        }
    }
}

impl CounterStore {
    #[must_use]
    pub fn redis(pool: Pool) -> Self {
        Self {
            backend: Arc::new(Backend::Redis(pool)),
        }
    }

    #[must_use]
    pub fn memory() -> Self {
        Self {
            backend: Arc::new(Backend::Memory(Arc::new(Mutex::new(HashMap::new())))),
        }
    }

    /// Atomically increment `key`, returning the post-increment value.
    async fn incr(&self, key: &str) -> Result<i64> {
        match self.backend.as_ref() {
            Backend::Redis(pool) => {
                let mut conn = pool.get().await.context("failed to get redis connection")?;
                let count: i64 = conn.incr(key, 1).await.context("failed to incr counter")?;
                Ok(count)
            }
            Backend::Memory(map) => {
                let mut map = map.lock().map_err(|_| anyhow!("counter store poisoned"))?;
                let now = Instant::now();
                let counter = map.entry(key.to_string()).or_insert(MemoryCounter {
                    count: 0,
                    expires_at: None,
                });
                if counter.expires_at.is_some_and(|deadline| deadline <= now) {
                    counter.count = 0;
                    counter.expires_at = None;
                }
                counter.count += 1;
                Ok(counter.count)
            }
        }
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<()> {
        match self.backend.as_ref() {
            Backend::Redis(pool) => {
                let mut conn = pool.get().await.context("failed to get redis connection")?;
                let _: bool = conn
                    .expire(key, seconds)
                    .await
                    .context("failed to set counter expiry")?;
                Ok(())
            }
            Backend::Memory(map) => {
                let mut map = map.lock().map_err(|_| anyhow!("counter store poisoned"))?;
                if let Some(counter) = map.get_mut(key) {
                    let seconds = u64::try_from(seconds).unwrap_or(0);
                    counter.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
                }
                Ok(())
            }
        }
    }

    /// Seconds until `key` expires; negative when missing or persistent,
    /// matching Redis TTL semantics.
    async fn ttl(&self, key: &str) -> Result<i64> {
        match self.backend.as_ref() {
            Backend::Redis(pool) => {
                let mut conn = pool.get().await.context("failed to get redis connection")?;
                let ttl: i64 = conn.ttl(key).await.context("failed to read counter ttl")?;
                Ok(ttl)
            }
            Backend::Memory(map) => {
                let map = map.lock().map_err(|_| anyhow!("counter store poisoned"))?;
                let Some(counter) = map.get(key) else {
                    return Ok(-2);
                };
                match counter.expires_at {
                    Some(deadline) => {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        Ok(i64::try_from(remaining.as_secs()).unwrap_or(i64::MAX))
                    }
                    None => Ok(-1),
                }
            }
        }
    }

    /// Connectivity probe used by the health endpoint.
    pub(crate) async fn ping(&self) -> Result<()> {
        match self.backend.as_ref() {
            Backend::Redis(pool) => {
                let mut conn = pool.get().await.context("failed to get redis connection")?;
                let _: String = deadpool_redis::redis::cmd("PING")
                    .query_async(&mut conn)
                    .await
                    .context("redis ping failed")?;
                Ok(())
            }
            Backend::Memory(_) => Ok(()),
        }
    }
}

/// Fixed-window limiter keyed by caller-chosen identifiers.
#[derive(Clone, Debug)]
pub struct FixedWindowLimiter {
    store: CounterStore,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(store: CounterStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &CounterStore {
        &self.store
    }

    /// Record one request for `identifier` and report whether it fits inside
    /// the window of `limit` requests per `window_seconds`.
    pub async fn check(
        &self,
        identifier: &str,
        limit: u32,
        window_seconds: i64,
    ) -> Result<RateLimitResult> {
        let key = format!("rate-limit:{identifier}");
        let count = self.store.incr(&key).await?;
        // First hit in the window owns setting the expiry.
        if count == 1 {
            self.store.expire(&key, window_seconds).await?;
        }
        let ttl = self.store.ttl(&key).await?;
        let ttl = if ttl < 0 { window_seconds } else { ttl };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock before unix epoch")?
            .as_secs();
        let reset_at = now.saturating_add(u64::try_from(ttl).unwrap_or(0));

        if count > i64::from(limit) {
            return Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at,
            });
        }

        let remaining = limit.saturating_sub(u32::try_from(count).unwrap_or(limit));
        Ok(RateLimitResult {
            allowed: true,
            remaining,
            reset_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn window_admits_limit_then_denies() {
        let limiter = FixedWindowLimiter::new(CounterStore::memory());

        let first = limiter.check("resend:a@example.com", 3, 60).await.unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 2);

        let second = limiter.check("resend:a@example.com", 3, 60).await.unwrap();
        assert!(second.allowed);
        assert_eq!(second.remaining, 1);

        let third = limiter.check("resend:a@example.com", 3, 60).await.unwrap();
        assert!(third.allowed);
        assert_eq!(third.remaining, 0);

        let fourth = limiter.check("resend:a@example.com", 3, 60).await.unwrap();
        assert!(!fourth.allowed);
        assert_eq!(fourth.remaining, 0);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = FixedWindowLimiter::new(CounterStore::memory());

        let denied = limiter.check("resend:a@example.com", 1, 60).await.unwrap();
        assert!(denied.allowed);
        let denied = limiter.check("resend:a@example.com", 1, 60).await.unwrap();
        assert!(!denied.allowed);

        let other = limiter.check("resend:b@example.com", 1, 60).await.unwrap();
        assert!(other.allowed);
    }

    #[tokio::test]
    async fn reset_at_lands_inside_window() {
        let limiter = FixedWindowLimiter::new(CounterStore::memory());
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let result = limiter.check("resend:c@example.com", 3, 60).await.unwrap();
        assert!(result.reset_at >= before);
        assert!(result.reset_at <= before + 61);
    }

    #[tokio::test]
    async fn expired_window_starts_fresh() {
        let limiter = FixedWindowLimiter::new(CounterStore::memory());

        let denied = limiter.check("resend:d@example.com", 1, 1).await.unwrap();
        assert!(denied.allowed);
        let denied = limiter.check("resend:d@example.com", 1, 1).await.unwrap();
        assert!(!denied.allowed);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let fresh = limiter.check("resend:d@example.com", 1, 1).await.unwrap();
        assert!(fresh.allowed);
    }

    #[tokio::test]
    async fn memory_store_ping_is_ok() {
        assert!(CounterStore::memory().ping().await.is_ok());
    }
}
