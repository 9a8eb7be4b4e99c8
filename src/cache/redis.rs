//! Redis-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::info;

use super::{CacheError, CacheStore};

/// A [`CacheStore`] over a Redis server.
///
/// Holds a [`ConnectionManager`], a cloneable multiplexed handle that
/// reconnects on its own; cloning it per call is how the `redis` crate
/// expects concurrent use. [`connect`](Self::connect) issues a `PING` so a
/// dead backend is caught at startup instead of on the first request.
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to the Redis server at `url` and verifies it with a `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Backend`] when the URL is malformed, the
    /// connection cannot be established, or the `PING` fails. Callers are
    /// expected to treat this as fatal.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;

        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!(url = %url, pong = %pong, "redis connected");

        Ok(Self { conn })
    }

    // SETEX takes whole seconds; round a fractional TTL up, never down to zero.
    fn ttl_secs(ttl: Duration) -> u64 {
        let mut secs = ttl.as_secs();
        if ttl.subsec_nanos() > 0 {
            secs += 1;
        }
        secs.max(1)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, Self::ttl_secs(ttl)).await?;
        Ok(())
    }
}
