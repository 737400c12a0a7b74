//! Cross-replica mutual exclusion with self-expiring, fencing-tokened
//! leases (§4.1, §9).
//!
//! Two variants share one trait so callers are oblivious to which is wired
//! in: `RedisLockManager` for production, `LocalLockManager` for a
//! single-process deployment or tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

/// Proof of current ownership returned by a successful `acquire`, required
/// by `release` to revoke the correct holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencingToken(Uuid);

impl FencingToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    fn as_redis_value(&self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for FencingToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from lock acquisition/release. `AcquireTimeout` is the only
/// retriable one and is what the Reservation Engine maps to 503.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock unavailable for key {0}")]
    AcquireTimeout(String),

    #[error("lock backend error: {0}")]
    Backend(String),
}

/// Grants mutually-exclusive, auto-expiring leases on named keys.
#[async_trait::async_trait]
pub trait LockManager: Send + Sync {
    /// Acquire exclusive ownership of `key`, retrying until `wait_budget`
    /// elapses. The lease self-expires after `lease_budget` so a dead
    /// holder cannot deadlock other claimants.
    async fn acquire(
        &self,
        key: &str,
        wait_budget: Duration,
        lease_budget: Duration,
    ) -> Result<FencingToken, LockError>;

    /// Release `key`, but only if `token` still matches the current holder.
    /// Idempotent: a no-op if the lease already expired or was released.
    async fn release(&self, key: &str, token: FencingToken) -> Result<(), LockError>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Production lock manager backed by Redis `SET NX PX` with a compare-and-
/// delete Lua release script, so acquire and release are both atomic and a
/// stale token can never release someone else's lock.
pub struct RedisLockManager {
    conn: ConnectionManager,
    release_script: redis::Script,
}

impl RedisLockManager {
    pub async fn connect(redis_url: &str) -> Result<Self, LockError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| LockError::Backend(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;
        Ok(Self {
            conn,
            release_script: redis::Script::new(
                r#"
                if redis.call("GET", KEYS[1]) == ARGV[1] then
                    return redis.call("DEL", KEYS[1])
                else
                    return 0
                end
                "#,
            ),
        })
    }
}

#[async_trait::async_trait]
impl LockManager for RedisLockManager {
    async fn acquire(
        &self,
        key: &str,
        wait_budget: Duration,
        lease_budget: Duration,
    ) -> Result<FencingToken, LockError> {
        let deadline = Instant::now() + wait_budget;
        let token = FencingToken::new();
        let lease_ms = lease_budget.as_millis().max(1) as u64;

        loop {
            let mut conn = self.conn.clone();
            let acquired: bool = redis::cmd("SET")
                .arg(key)
                .arg(token.as_redis_value())
                .arg("NX")
                .arg("PX")
                .arg(lease_ms)
                .query_async::<Option<String>>(&mut conn)
                .await
                .map_err(|e| LockError::Backend(e.to_string()))?
                .is_some();

            if acquired {
                return Ok(token);
            }

            if Instant::now() >= deadline {
                return Err(LockError::AcquireTimeout(key.to_string()));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn release(&self, key: &str, token: FencingToken) -> Result<(), LockError> {
        let mut conn = self.conn.clone();
        let _: i64 = self
            .release_script
            .key(key)
            .arg(token.as_redis_value())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;
        Ok(())
    }
}

struct LocalLease {
    token: FencingToken,
    expires_at: Instant,
}

/// Single-process lock manager for tests and single-replica deployments,
/// satisfying the same contract as `RedisLockManager` with a process-wide
/// mutex-guarded map instead of a coordination service.
#[derive(Clone)]
pub struct LocalLockManager {
    leases: Arc<Mutex<HashMap<String, LocalLease>>>,
}

impl LocalLockManager {
    pub fn new() -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for LocalLockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LockManager for LocalLockManager {
    async fn acquire(
        &self,
        key: &str,
        wait_budget: Duration,
        lease_budget: Duration,
    ) -> Result<FencingToken, LockError> {
        let deadline = Instant::now() + wait_budget;
        let token = FencingToken::new();

        loop {
            {
                let mut leases = self.leases.lock().await;
                let now = Instant::now();
                let held = leases
                    .get(key)
                    .map(|lease| lease.expires_at > now)
                    .unwrap_or(false);

                if !held {
                    leases.insert(
                        key.to_string(),
                        LocalLease {
                            token,
                            expires_at: now + lease_budget,
                        },
                    );
                    return Ok(token);
                }
            }

            if Instant::now() >= deadline {
                return Err(LockError::AcquireTimeout(key.to_string()));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn release(&self, key: &str, token: FencingToken) -> Result<(), LockError> {
        let mut leases = self.leases.lock().await;
        if let Some(lease) = leases.get(key) {
            if lease.token == token {
                leases.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_waits_then_times_out() {
        let mgr = LocalLockManager::new();
        let token = mgr
            .acquire("k", Duration::from_secs(5), Duration::from_secs(5))
            .await
            .unwrap();

        let result = mgr
            .acquire("k", Duration::from_millis(120), Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(LockError::AcquireTimeout(_))));

        mgr.release("k", token).await.unwrap();
        let second = mgr
            .acquire("k", Duration::from_millis(200), Duration::from_secs(5))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn release_with_wrong_token_is_noop() {
        let mgr = LocalLockManager::new();
        let real = mgr
            .acquire("k", Duration::from_secs(1), Duration::from_secs(5))
            .await
            .unwrap();
        let fake = FencingToken::new();
        mgr.release("k", fake).await.unwrap();

        // Lock is still held by the real token's lease.
        let result = mgr
            .acquire("k", Duration::from_millis(80), Duration::from_secs(5))
            .await;
        assert!(result.is_err());

        mgr.release("k", real).await.unwrap();
    }

    #[tokio::test]
    async fn lease_self_expires() {
        let mgr = LocalLockManager::new();
        let _first = mgr
            .acquire("k", Duration::from_secs(1), Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        let second = mgr
            .acquire("k", Duration::from_millis(100), Duration::from_secs(5))
            .await;
        assert!(second.is_ok());
    }
}
