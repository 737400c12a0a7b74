//! Availability cache and cross-replica lock manager.
//!
//! The cache never owns state (§3 Ownership): it is best-effort, stale
//! reads are acceptable, and writers invalidate rather than update (§5,
//! §9). The lock manager grants self-expiring, fencing-tokened leases on
//! named keys so the Reservation Engine can serialise claims across
//! replicas without escalating to database row locks.

pub mod cache;
pub mod keys;
pub mod lock;

pub use cache::{Cache, CacheExt, InMemoryCache, RedisCache};
pub use lock::{FencingToken, LocalLockManager, LockError, LockManager, RedisLockManager};
