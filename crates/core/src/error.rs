use thiserror::Error;

use crate::import::ImportError;
use crate::model::{QuestionBankError, QuestionError, ScoreError, SettingsError};

/// Umbrella error for callers that do not care which domain rule failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuestionBank(#[from] QuestionBankError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
