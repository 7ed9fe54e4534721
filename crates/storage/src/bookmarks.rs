use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{BookmarkedQuestion, Question, QuestionId};

use crate::repository::{KeyValueStore, StorageError, keys, read_json_or_default, write_json};

/// Bookmarks of one category, in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBookmarks {
    pub category: String,
    pub bookmarks: Vec<BookmarkedQuestion>,
}

/// Durable set of bookmarked question snapshots, keyed by question id.
///
/// Bookmarks never touch session scoring.
pub struct BookmarkStore {
    kv: Arc<dyn KeyValueStore>,
}

impl BookmarkStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// All bookmarks in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. Corrupt data reads as empty.
    pub async fn list(&self) -> Result<Vec<BookmarkedQuestion>, StorageError> {
        read_json_or_default(self.kv.as_ref(), keys::BOOKMARKS).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.list().await?.len())
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn is_bookmarked(&self, id: QuestionId) -> Result<bool, StorageError> {
        Ok(self.list().await?.iter().any(|b| b.id() == id))
    }

    /// Add a snapshot of `question` if absent, otherwise remove it.
    ///
    /// Returns the bookmarked state after the call.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read or written.
    pub async fn toggle(
        &self,
        question: &Question,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut bookmarks = self.list().await?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.id() != question.id());
        let added = bookmarks.len() == before;
        if added {
            bookmarks.push(BookmarkedQuestion::new(question.clone(), now));
        }
        write_json(self.kv.as_ref(), keys::BOOKMARKS, &bookmarks).await?;
        Ok(added)
    }

    /// Remove the bookmark for `id`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the set cannot be read or written.
    pub async fn remove(&self, id: QuestionId) -> Result<bool, StorageError> {
        let mut bookmarks = self.list().await?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.id() != id);
        if bookmarks.len() == before {
            return Ok(false);
        }
        write_json(self.kv.as_ref(), keys::BOOKMARKS, &bookmarks).await?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.delete(keys::BOOKMARKS).await
    }

    /// Bookmarks grouped by category. Categories appear in the order their first
    /// bookmark was added; within a category bookmarks keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn list_by_category(&self) -> Result<Vec<CategoryBookmarks>, StorageError> {
        let mut groups: Vec<CategoryBookmarks> = Vec::new();
        for bookmark in self.list().await? {
            match groups.iter_mut().find(|g| g.category == bookmark.category()) {
                Some(group) => group.bookmarks.push(bookmark),
                None => groups.push(CategoryBookmarks {
                    category: bookmark.category().to_owned(),
                    bookmarks: vec![bookmark],
                }),
            }
        }
        Ok(groups)
    }
}
