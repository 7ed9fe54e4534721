//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::ScoreError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::SessionPhase;

/// Errors emitted by the session engine and the session loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("no session in progress")]
    NotInProgress,
    #[error("session already ended")]
    AlreadyEnded,
    #[error("expected phase {expected}, session is in {actual}")]
    InvalidPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Xp(#[from] XpServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `XpService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum XpServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Xp(#[from] XpServiceError),
}
