use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId};

/// A question the user flagged for later, with the moment it was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkedQuestion {
    pub question: Question,
    pub bookmarked_at: DateTime<Utc>,
}

impl BookmarkedQuestion {
    #[must_use]
    pub fn new(question: Question, bookmarked_at: DateTime<Utc>) -> Self {
        Self {
            question,
            bookmarked_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.question.id()
    }

    #[must_use]
    pub fn category(&self) -> &str {
        self.question.category()
    }
}
