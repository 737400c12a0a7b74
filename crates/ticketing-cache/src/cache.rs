//! Best-effort availability cache (§4.4, §9).
//!
//! The cache never computes derived state itself; callers read through it on
//! a miss and write back what the durable store returned. On any mutation the
//! write path invalidates rather than updates, so a crashed writer can never
//! leave a stale-but-present entry standing in for ground truth.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Object-safe raw-string cache. Kept deliberately narrow (`String` in,
/// `String` out) so it can live behind `Arc<dyn Cache>`; JSON (de)serialising
/// is layered on top via [`CacheExt`].
///
/// Errors are logged and treated as a miss/no-op rather than propagated: the
/// durable store is always the fallback of record, so a cache outage
/// degrades latency, not correctness.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_raw(&self, key: &str) -> Option<String>;

    async fn set_raw(&self, key: &str, value: String, ttl: Duration);

    async fn invalidate(&self, key: &str);
}

/// JSON convenience methods available on any `Cache` implementor, including
/// through a trait object.
#[async_trait]
pub trait CacheExt: Cache {
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(cache.key = key, error = %err, "cache entry failed to deserialize");
                None
            }
        }
    }

    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, raw, ttl).await,
            Err(err) => warn!(cache.key = key, error = %err, "failed to serialize cache entry"),
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match redis::cmd("GET").arg(key).query_async(&mut conn).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(cache.key = key, error = %err, "cache get failed, treating as miss");
                None
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) {
        let mut conn = self.conn.clone();
        let ttl_secs = ttl.as_secs().max(1);
        if let Err(err) = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<()>(&mut conn)
            .await
        {
            warn!(cache.key = key, error = %err, "cache set failed");
        }
    }

    async fn invalidate(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(err) = redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
        {
            warn!(cache.key = key, error = %err, "cache invalidate failed");
        }
    }
}

/// In-memory stand-in used by engine/read-path tests so they don't require a
/// live Redis instance.
#[derive(Default)]
pub struct InMemoryCache {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set_raw(&self, key: &str, value: String, _ttl: Duration) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }

    async fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}
