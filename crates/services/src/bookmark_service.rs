use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{BookmarkedQuestion, Question, QuestionId};
use storage::bookmarks::{BookmarkStore, CategoryBookmarks};
use storage::repository::StorageError;

/// Bookmark facade that stamps `bookmarked_at` from the service clock.
#[derive(Clone)]
pub struct BookmarkService {
    clock: Clock,
    bookmarks: Arc<BookmarkStore>,
}

impl BookmarkService {
    #[must_use]
    pub fn new(clock: Clock, bookmarks: Arc<BookmarkStore>) -> Self {
        Self { clock, bookmarks }
    }

    /// Bookmark `question` or drop its bookmark. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark set cannot be read or written.
    pub async fn toggle(&self, question: &Question) -> Result<bool, StorageError> {
        let bookmarked = self.bookmarks.toggle(question, self.clock.now()).await?;
        tracing::debug!(question_id = %question.id(), bookmarked, "bookmark toggled");
        Ok(bookmarked)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark set cannot be read.
    pub async fn is_bookmarked(&self, id: QuestionId) -> Result<bool, StorageError> {
        self.bookmarks.is_bookmarked(id).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark set cannot be read or written.
    pub async fn remove(&self, id: QuestionId) -> Result<bool, StorageError> {
        self.bookmarks.remove(id).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark set cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.bookmarks.clear().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark set cannot be read.
    pub async fn list(&self) -> Result<Vec<BookmarkedQuestion>, StorageError> {
        self.bookmarks.list().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark set cannot be read.
    pub async fn list_by_category(&self) -> Result<Vec<CategoryBookmarks>, StorageError> {
        self.bookmarks.list_by_category().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the bookmark set cannot be read.
    pub async fn count(&self) -> Result<usize, StorageError> {
        self.bookmarks.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionBank;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryStore;

    #[tokio::test]
    async fn toggle_stamps_clock_time() {
        let store = Arc::new(BookmarkStore::new(Arc::new(InMemoryStore::new())));
        let svc = BookmarkService::new(Clock::fixed(fixed_now()), store);
        let bank = QuestionBank::builtin();
        let question = &bank.questions()[0];

        assert!(svc.toggle(question).await.unwrap());
        let list = svc.list().await.unwrap();
        assert_eq!(list[0].bookmarked_at, fixed_now());
        assert!(svc.is_bookmarked(question.id()).await.unwrap());

        assert!(!svc.toggle(question).await.unwrap());
        assert_eq!(svc.count().await.unwrap(), 0);
    }
}
