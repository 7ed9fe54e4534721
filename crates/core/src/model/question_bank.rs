use std::collections::HashSet;
use thiserror::Error;

use crate::import::{self, ImportError};
use crate::model::{Question, QuestionId};

const BUILTIN_QUESTIONS: &str = include_str!("../../data/questions.json");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question bank cannot be empty")]
    Empty,

    #[error("duplicate question id {id}")]
    DuplicateId { id: QuestionId },
}

/// Immutable, ordered set of questions a session draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Wrap already-validated questions.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Empty` for an empty list and
    /// `QuestionBankError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionBankError> {
        if questions.is_empty() {
            return Err(QuestionBankError::Empty);
        }
        let mut ids = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !ids.insert(q.id()) {
                return Err(QuestionBankError::DuplicateId { id: q.id() });
            }
        }
        Ok(Self { questions })
    }

    /// Parse and validate a question set in the import format.
    ///
    /// # Errors
    ///
    /// Returns the first `ImportError` encountered; nothing is loaded on failure.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let questions = import::parse_questions(json)?;
        Ok(Self { questions })
    }

    /// The networking question set bundled with the crate.
    ///
    /// # Panics
    ///
    /// Panics if the embedded data file fails validation, which the test suite guards against.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_QUESTIONS).expect("bundled questions should be valid")
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn find(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Distinct categories in first-appearance order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .map(Question::category)
            .filter(|c| seen.insert(*c))
            .collect()
    }
}
