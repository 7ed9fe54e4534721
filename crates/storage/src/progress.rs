use std::collections::BTreeSet;
use std::sync::Arc;

use quiz_core::model::{Question, QuestionId, Score};

use crate::repository::{KeyValueStore, StorageError, keys, read_json_or_default, write_json};

/// Default number of scores kept on the board.
pub const DEFAULT_SCORE_HISTORY_LIMIT: usize = 10;

/// Totals over the retained score history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifetimeStats {
    pub sessions_recorded: usize,
    pub total_points: u64,
    pub best_score: Option<u32>,
}

/// Score board and seen-question bookkeeping.
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
    history_limit: usize,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            history_limit: DEFAULT_SCORE_HISTORY_LIMIT,
        }
    }

    /// Keep at most `limit` scores (minimum one).
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Score history, best first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. Corrupt data reads as empty.
    pub async fn scores(&self) -> Result<Vec<Score>, StorageError> {
        read_json_or_default(self.kv.as_ref(), keys::SCORES).await
    }

    /// Insert a score, keep the board sorted by score descending and drop the overflow.
    ///
    /// Equal scores keep insertion order, so an older entry outranks a newer tie.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the board cannot be read or written.
    pub async fn record_score(&self, score: Score) -> Result<(), StorageError> {
        let mut scores = self.scores().await?;
        scores.push(score);
        scores.sort_by(|a, b| b.total_score().cmp(&a.total_score()));
        scores.truncate(self.history_limit);
        write_json(self.kv.as_ref(), keys::SCORES, &scores).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn lifetime_stats(&self) -> Result<LifetimeStats, StorageError> {
        let scores = self.scores().await?;
        Ok(LifetimeStats {
            sessions_recorded: scores.len(),
            total_points: scores.iter().map(|s| u64::from(s.total_score())).sum(),
            best_score: scores.iter().map(Score::total_score).max(),
        })
    }

    /// Every question id the user has answered at least once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. Corrupt data reads as empty.
    pub async fn seen(&self) -> Result<BTreeSet<QuestionId>, StorageError> {
        read_json_or_default(self.kv.as_ref(), keys::SEEN).await
    }

    /// Add `id` to the seen set. Returns `false` (and writes nothing) if it was already there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read or written.
    pub async fn mark_seen(&self, id: QuestionId) -> Result<bool, StorageError> {
        let mut seen = self.seen().await?;
        if !seen.insert(id) {
            return Ok(false);
        }
        write_json(self.kv.as_ref(), keys::SEEN, &seen).await?;
        Ok(true)
    }

    /// Forget every seen question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn reset_seen(&self) -> Result<(), StorageError> {
        self.kv.delete(keys::SEEN).await
    }

    /// Split `questions` into `(unseen, seen)` without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the seen set cannot be read.
    pub async fn partition_by_unseen(
        &self,
        questions: &[Question],
    ) -> Result<(Vec<Question>, Vec<Question>), StorageError> {
        let seen = self.seen().await?;
        Ok(partition_by_seen(questions, &seen))
    }
}

/// Split into `(unseen, seen)`, preserving the input order inside each half.
#[must_use]
pub fn partition_by_seen(
    questions: &[Question],
    seen: &BTreeSet<QuestionId>,
) -> (Vec<Question>, Vec<Question>) {
    questions
        .iter()
        .cloned()
        .partition(|q| !seen.contains(&q.id()))
}
