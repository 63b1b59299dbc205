//! Per-browser-session state.
//!
//! [`SessionStorage`] is the key-value capability handed to components that
//! need session-scoped storage. [`SessionStore`] keeps one value per session
//! id and drops sessions that have been idle longer than the configured TTL.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use uuid::Uuid;

/// Ephemeral string storage scoped to one session.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<&str>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.items.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&mut self, key: &str) -> Option<String> {
        self.items.remove(key)
    }
}

struct Entry<T> {
    value: T,
    last_seen: Instant,
}

/// Session values keyed by an opaque id, shared across request handlers.
pub struct SessionStore<T> {
    entries: Arc<Mutex<HashMap<Uuid, Entry<T>>>>,
    ttl: Duration,
}

impl<T> Clone for SessionStore<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<T: Default> SessionStore<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Run `f` against the session for `id`, creating a fresh one when the id is
    /// unknown or expired. Returns the id the caller should keep using.
    pub async fn with_session<R>(&self, id: Option<Uuid>, f: impl FnOnce(&mut T) -> R) -> (Uuid, R) {
        self.with_session_at(id, Instant::now(), f).await
    }

    async fn with_session_at<R>(
        &self,
        id: Option<Uuid>,
        now: Instant,
        f: impl FnOnce(&mut T) -> R,
    ) -> (Uuid, R) {
        let mut entries = self.entries.lock().await;

        let live = id.filter(|id| {
            entries
                .get(id)
                .is_some_and(|entry| now.saturating_duration_since(entry.last_seen) < self.ttl)
        });

        let id = match live {
            Some(id) => id,
            None => {
                if let Some(stale) = id {
                    entries.remove(&stale);
                }
                let fresh = Uuid::new_v4();
                tracing::debug!(session = %fresh, "Starting session");
                fresh
            }
        };

        let entry = entries.entry(id).or_insert_with(|| Entry {
            value: T::default(),
            last_seen: now,
        });
        entry.last_seen = now;
        let result = f(&mut entry.value);
        (id, result)
    }

    /// Drop sessions idle for longer than the TTL. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    async fn purge_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < self.ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::default();
        assert!(storage.is_empty());

        storage.set_item("email", "Jordan@Example.com");
        assert_eq!(storage.get_item("email"), Some("Jordan@Example.com"));

        storage.set_item("email", "other@example.com");
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.remove_item("email").as_deref(), Some("other@example.com"));
        assert_eq!(storage.get_item("email"), None);
    }

    #[tokio::test]
    async fn test_with_session_reuses_live_id() {
        let store: SessionStore<MemoryStorage> = SessionStore::new(Duration::from_secs(60));

        let (id, _) = store.with_session(None, |s| s.set_item("email", "a@b.co")).await;
        let (same, email) = store
            .with_session(Some(id), |s| s.get_item("email").map(str::to_string))
            .await;

        assert_eq!(id, same);
        assert_eq!(email.as_deref(), Some("a@b.co"));
    }

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let store: SessionStore<MemoryStorage> = SessionStore::new(Duration::from_secs(60));
        let unknown = Uuid::new_v4();

        let (id, empty) = store.with_session(Some(unknown), |s| s.is_empty()).await;
        assert_ne!(id, unknown);
        assert!(empty);
    }

    #[tokio::test]
    async fn test_expired_session_is_replaced() {
        let store: SessionStore<MemoryStorage> = SessionStore::new(Duration::from_secs(10));
        let start = Instant::now();

        let (id, _) = store
            .with_session_at(None, start, |s| s.set_item("email", "a@b.co"))
            .await;
        let (next, email) = store
            .with_session_at(Some(id), start + Duration::from_secs(11), |s| {
                s.get_item("email").map(str::to_string)
            })
            .await;

        assert_ne!(id, next);
        assert_eq!(email, None);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store: SessionStore<MemoryStorage> = SessionStore::new(Duration::from_secs(10));
        let start = Instant::now();

        let (old, _) = store.with_session_at(None, start, |_| ()).await;
        let (fresh, _) = store
            .with_session_at(None, start + Duration::from_secs(8), |_| ())
            .await;
        assert_ne!(old, fresh);

        let removed = store.purge_expired_at(start + Duration::from_secs(12)).await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
    }
}
