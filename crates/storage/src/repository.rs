use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::bookmarks::BookmarkStore;
use crate::progress::ProgressStore;
use crate::xp::XpStore;

/// Keys under which the quiz keeps its durable state.
pub mod keys {
    pub const SCORES: &str = "quiz.scores";
    pub const SEEN: &str = "quiz.seen";
    pub const BOOKMARKS: &str = "quiz.bookmarks";
    pub const TOTAL_XP: &str = "quiz.total_xp";
    pub const LEVEL: &str = "quiz.level";
}

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable string key-value capability the typed stores are built on.
///
/// Each call is a single self-contained key update; there is no cross-key atomicity.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Read a JSON value, falling back to `T::default()` when the key is absent or unreadable.
///
/// Corrupt data must never block play, so decode failures are logged and swallowed.
/// Backend failures still propagate.
pub(crate) async fn read_json_or_default<T>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = kv.get(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "discarding unreadable stored value");
            Ok(T::default())
        }
    }
}

pub(crate) async fn write_json<T>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let raw =
        serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
    kv.set(key, &raw).await
}

/// Simple in-memory store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the typed stores over one key-value backend for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub progress: Arc<ProgressStore>,
    pub bookmarks: Arc<BookmarkStore>,
    pub xp: Arc<XpStore>,
}

impl Storage {
    /// Build all stores over the given backend.
    #[must_use]
    pub fn over(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            progress: Arc::new(ProgressStore::new(Arc::clone(&kv))),
            bookmarks: Arc::new(BookmarkStore::new(Arc::clone(&kv))),
            xp: Arc::new(XpStore::new(Arc::clone(&kv))),
            kv,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::over(Arc::new(InMemoryStore::new()))
    }

    /// Replace the progress store with one that keeps `limit` scores.
    #[must_use]
    pub fn with_score_history_limit(mut self, limit: usize) -> Self {
        self.progress = Arc::new(ProgressStore::new(Arc::clone(&self.kv)).with_history_limit(limit));
        self
    }
}
