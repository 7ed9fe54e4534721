use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scoring::accuracy_percent;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("correct answers ({correct}) exceed answered questions ({answered})")]
    CorrectExceedsAnswered { correct: u32, answered: u32 },

    #[error("accuracy {stored}% does not match {correct}/{answered}")]
    AccuracyMismatch {
        stored: u32,
        correct: u32,
        answered: u32,
    },
}

/// Result of one finished session, kept in the score history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScoreRecord", into = "ScoreRecord")]
pub struct Score {
    total_score: u32,
    correct_count: u32,
    answered_count: u32,
    accuracy_percent: u32,
    elapsed_secs: u64,
    recorded_at: DateTime<Utc>,
}

impl Score {
    /// Build a score for a finished session, deriving accuracy from the counts.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::CorrectExceedsAnswered` if `correct_count > answered_count`.
    pub fn new(
        total_score: u32,
        correct_count: u32,
        answered_count: u32,
        elapsed_secs: u64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, ScoreError> {
        if correct_count > answered_count {
            return Err(ScoreError::CorrectExceedsAnswered {
                correct: correct_count,
                answered: answered_count,
            });
        }
        Ok(Self {
            total_score,
            correct_count,
            answered_count,
            accuracy_percent: accuracy_percent(correct_count, answered_count),
            elapsed_secs,
            recorded_at,
        })
    }

    /// Rehydrate a score from storage.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError` if the counts are inconsistent or the stored accuracy disagrees.
    pub fn from_persisted(
        total_score: u32,
        correct_count: u32,
        answered_count: u32,
        accuracy: u32,
        elapsed_secs: u64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, ScoreError> {
        let score = Self::new(
            total_score,
            correct_count,
            answered_count,
            elapsed_secs,
            recorded_at,
        )?;
        if score.accuracy_percent != accuracy {
            return Err(ScoreError::AccuracyMismatch {
                stored: accuracy,
                correct: correct_count,
                answered: answered_count,
            });
        }
        Ok(score)
    }

    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn answered_count(&self) -> u32 {
        self.answered_count
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        self.accuracy_percent
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRecord {
    score: u32,
    correct_answers: u32,
    total_questions: u32,
    accuracy: u32,
    time_spent: u64,
    date: DateTime<Utc>,
}

impl TryFrom<ScoreRecord> for Score {
    type Error = ScoreError;

    fn try_from(r: ScoreRecord) -> Result<Self, Self::Error> {
        Score::from_persisted(
            r.score,
            r.correct_answers,
            r.total_questions,
            r.accuracy,
            r.time_spent,
            r.date,
        )
    }
}

impl From<Score> for ScoreRecord {
    fn from(s: Score) -> Self {
        Self {
            score: s.total_score,
            correct_answers: s.correct_count,
            total_questions: s.answered_count,
            accuracy: s.accuracy_percent,
            time_spent: s.elapsed_secs,
            date: s.recorded_at,
        }
    }
}
