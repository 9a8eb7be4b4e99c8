//! In-memory TTL store for tests and Redis-less local runs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CacheError, CacheStore};

/// A [`CacheStore`] backed by a mutex-guarded map.
///
/// Entries are expired lazily: a `get` past the deadline removes the entry
/// and reports a miss. Deadlines use `tokio::time::Instant`, so tests can
/// drive expiry with a paused clock.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: Bytes::copy_from_slice(value),
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(key.to_owned(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_returns_what_was_set() {
        let store = MemoryStore::new();
        store
            .set("k", b"value", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(&b"value"[..]));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("absent").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires() {
        let store = MemoryStore::new();
        store.set("k", b"v", Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_overwrites_wholesale() {
        let store = MemoryStore::new();
        store.set("k", b"old", Duration::from_secs(5)).await.unwrap();
        store.set("k", b"new", Duration::from_secs(5)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some(&b"new"[..]));
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_ttl_is_honored() {
        let store = MemoryStore::new();
        store
            .set("k", b"v", Duration::from_millis(250))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(store.get("k").await.unwrap().is_none());
    }
}
