//! Read-through response caching.
//!
//! [`CacheMiddleware`] wraps a handler and serves its responses from a
//! [`CacheStore`], capturing fresh output through a [`CaptureSink`].
//! Two store backends are provided: [`RedisStore`] for production and
//! [`MemoryStore`] for tests and Redis-less local runs.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod capture;
pub mod memory;
pub mod middleware;
pub mod redis;

pub use capture::CaptureSink;
pub use memory::MemoryStore;
pub use middleware::CacheMiddleware;
pub use self::redis::RedisStore;

/// Errors produced by a cache store backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] ::redis::RedisError),
}

/// GET/SET-with-TTL access to a key-value store.
///
/// Keys are UTF-8 strings; values are opaque response bodies. A `get` that
/// finds nothing (absent or expired) returns `Ok(None)` — `Err` is reserved
/// for backend failures, so callers can tell the two apart even though the
/// middleware treats both as a miss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up `key`. Returns `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
}
