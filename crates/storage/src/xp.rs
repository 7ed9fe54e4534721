use std::sync::Arc;

use crate::repository::{KeyValueStore, StorageError, keys, read_json_or_default, write_json};

/// Persisted XP counters. `cached_level` is derived and only used to detect level-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpState {
    pub total_xp: u64,
    pub cached_level: u32,
}

impl Default for XpState {
    fn default() -> Self {
        Self {
            total_xp: 0,
            cached_level: 1,
        }
    }
}

/// Raw access to the two XP keys. Level math lives in `quiz_core::leveling`.
pub struct XpStore {
    kv: Arc<dyn KeyValueStore>,
}

impl XpStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read both keys as stored. `cached_level` is the raw memo and is not
    /// checked against `total_xp`; display paths go through
    /// `services::XpService::current`, which recomputes and rewrites it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. Corrupt values read as defaults.
    pub async fn load(&self) -> Result<XpState, StorageError> {
        let total_xp: u64 = read_json_or_default(self.kv.as_ref(), keys::TOTAL_XP).await?;
        let cached_level: u32 = read_json_or_default(self.kv.as_ref(), keys::LEVEL).await?;
        Ok(XpState {
            total_xp,
            cached_level: cached_level.max(1),
        })
    }

    /// # Errors
    ///
    /// Returns `StorageError` if either key cannot be written.
    pub async fn save(&self, state: XpState) -> Result<(), StorageError> {
        write_json(self.kv.as_ref(), keys::TOTAL_XP, &state.total_xp).await?;
        write_json(self.kv.as_ref(), keys::LEVEL, &state.cached_level.max(1)).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be written.
    pub async fn save_cached_level(&self, level: u32) -> Result<(), StorageError> {
        write_json(self.kv.as_ref(), keys::LEVEL, &level.max(1)).await
    }
}
