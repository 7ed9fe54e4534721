use std::sync::Arc;

use quiz_core::model::QuizSettings;
use storage::progress::{LifetimeStats, ProgressStore};
use storage::repository::Storage;

use crate::Clock;
use crate::bookmark_service::BookmarkService;
use crate::error::AppServicesError;
use crate::feedback::{FeedbackSink, noop_feedback};
use crate::sessions::QuizLoopService;
use crate::xp_service::XpService;

/// Assembles app-facing services over one `Storage`.
#[derive(Clone)]
pub struct AppServices {
    settings: QuizSettings,
    progress: Arc<ProgressStore>,
    session_loop: Arc<QuizLoopService>,
    bookmarks: Arc<BookmarkService>,
    xp: Arc<XpService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let services = Self::from_storage(&storage, clock, settings, feedback);
        let level = services.xp.current().await?;
        tracing::info!(level = level.level, total_xp = level.total_xp, "services ready");
        Ok(services)
    }

    /// Build services over in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: QuizSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings, noop_feedback())
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        settings: QuizSettings,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Self {
        let storage = storage
            .clone()
            .with_score_history_limit(settings.score_history_limit());
        let xp = Arc::new(
            XpService::new(clock, Arc::clone(&storage.xp))
                .with_level_up_display(settings.level_up_display()),
        );
        let session_loop = Arc::new(
            QuizLoopService::new(
                clock,
                settings.clone(),
                Arc::clone(&storage.progress),
                Arc::clone(&xp),
            )
            .with_feedback(feedback),
        );
        let bookmarks = Arc::new(BookmarkService::new(clock, Arc::clone(&storage.bookmarks)));

        Self {
            settings,
            progress: Arc::clone(&storage.progress),
            session_loop,
            bookmarks,
            xp,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn bookmarks(&self) -> Arc<BookmarkService> {
        Arc::clone(&self.bookmarks)
    }

    #[must_use]
    pub fn xp(&self) -> Arc<XpService> {
        Arc::clone(&self.xp)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the score board cannot be read.
    pub async fn lifetime_stats(&self) -> Result<LifetimeStats, AppServicesError> {
        Ok(self.progress.lifetime_stats().await?)
    }
}
