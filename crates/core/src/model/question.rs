use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Minimum number of answer options a question must offer.
pub const MIN_OPTIONS: usize = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id must be a positive integer")]
    InvalidId,

    #[error("question text cannot be empty")]
    EmptyPrompt,

    #[error("must have at least 2 options, got {count}")]
    TooFewOptions { count: usize },

    #[error("correct answer {key} not found in provided options")]
    CorrectOptionMissing { key: OptionKey },

    #[error("explanation cannot be empty")]
    EmptyExplanation,

    #[error("category cannot be empty")]
    EmptyCategory,

    #[error("invalid option key {raw:?} (must be A, B, C, or D)")]
    InvalidOptionKey { raw: String },

    #[error("invalid difficulty {raw:?} (must be easy, medium, or hard)")]
    InvalidDifficulty { raw: String },
}

//
// ─── OPTION KEY ────────────────────────────────────────────────────────────────
//

/// Closed set of answer slots a question may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionKey {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(OptionKey::A),
            "B" => Ok(OptionKey::B),
            "C" => Ok(OptionKey::C),
            "D" => Ok(OptionKey::D),
            _ => Err(QuestionError::InvalidOptionKey { raw: s.to_string() }),
        }
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(QuestionError::InvalidDifficulty { raw: s.to_string() }),
        }
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question fields, as produced by an importer or a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: BTreeMap<OptionKey, String>,
    pub correct: OptionKey,
    pub explanation: String,
    pub category: String,
    pub difficulty: Difficulty,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id is zero, a text field is blank, fewer than
    /// two options are present, or the correct key is not among the options.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.id.value() == 0 {
            return Err(QuestionError::InvalidId);
        }
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                count: self.options.len(),
            });
        }
        if !self.options.contains_key(&self.correct) {
            return Err(QuestionError::CorrectOptionMissing { key: self.correct });
        }
        if self.explanation.trim().is_empty() {
            return Err(QuestionError::EmptyExplanation);
        }
        if self.category.trim().is_empty() {
            return Err(QuestionError::EmptyCategory);
        }

        Ok(Question {
            id: self.id,
            prompt: self.prompt,
            options: self.options,
            correct: self.correct,
            explanation: self.explanation,
            category: self.category,
            difficulty: self.difficulty,
        })
    }
}

/// A multiple-choice question. Immutable once validated.
///
/// Serializes to the same shape the importer accepts, so bookmarked snapshots
/// can be written and read back through the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionWire", into = "QuestionWire")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: BTreeMap<OptionKey, String>,
    correct: OptionKey,
    explanation: String,
    category: String,
    difficulty: Difficulty,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &BTreeMap<OptionKey, String> {
        &self.options
    }

    /// Text for a single option, if the question offers it.
    #[must_use]
    pub fn option(&self, key: OptionKey) -> Option<&str> {
        self.options.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn correct(&self) -> OptionKey {
        self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// A missing selection (timeout or skip) is never correct.
    #[must_use]
    pub fn is_correct(&self, selected: Option<OptionKey>) -> bool {
        selected == Some(self.correct)
    }
}

/// Wire shape shared by the import format and persisted snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionWire {
    id: u64,
    question: String,
    options: BTreeMap<OptionKey, String>,
    correct_answer: OptionKey,
    explanation: String,
    category: String,
    difficulty: Difficulty,
}

impl TryFrom<QuestionWire> for Question {
    type Error = QuestionError;

    fn try_from(wire: QuestionWire) -> Result<Self, Self::Error> {
        QuestionDraft {
            id: QuestionId::new(wire.id),
            prompt: wire.question,
            options: wire.options,
            correct: wire.correct_answer,
            explanation: wire.explanation,
            category: wire.category,
            difficulty: wire.difficulty,
        }
        .validate()
    }
}

impl From<Question> for QuestionWire {
    fn from(q: Question) -> Self {
        Self {
            id: q.id.value(),
            question: q.prompt,
            options: q.options,
            correct_answer: q.correct,
            explanation: q.explanation,
            category: q.category,
            difficulty: q.difficulty,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(4),
            prompt: "Which of these statements about UDP is true?".into(),
            options: BTreeMap::from([
                (OptionKey::A, "Flow control via window".into()),
                (OptionKey::C, "Checksum verifies integrity".into()),
            ]),
            correct: OptionKey::C,
            explanation: "UDP carries a checksum.".into(),
            category: "Transport Layer".into(),
            difficulty: Difficulty::Easy,
        }
    }

    #[test]
    fn valid_draft_builds_question() {
        let q = draft().validate().unwrap();
        assert_eq!(q.id(), QuestionId::new(4));
        assert_eq!(q.option(OptionKey::C), Some("Checksum verifies integrity"));
        assert_eq!(q.option(OptionKey::B), None);
        assert!(q.is_correct(Some(OptionKey::C)));
        assert!(!q.is_correct(Some(OptionKey::A)));
        assert!(!q.is_correct(None));
    }

    #[test]
    fn correct_key_must_be_present() {
        let mut d = draft();
        d.correct = OptionKey::D;
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::CorrectOptionMissing { key: OptionKey::D }
        );
    }

    #[test]
    fn needs_two_options() {
        let mut d = draft();
        d.options.remove(&OptionKey::A);
        assert_eq!(
            d.validate().unwrap_err(),
            QuestionError::TooFewOptions { count: 1 }
        );
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut d = draft();
        d.category = "  ".into();
        assert_eq!(d.validate().unwrap_err(), QuestionError::EmptyCategory);

        let mut d = draft();
        d.id = QuestionId::new(0);
        assert_eq!(d.validate().unwrap_err(), QuestionError::InvalidId);
    }

    #[test]
    fn snapshot_uses_import_shape() {
        let q = draft().validate().unwrap();
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["correctAnswer"], "C");
        assert_eq!(json["question"], "Which of these statements about UDP is true?");
        assert_eq!(json["difficulty"], "easy");

        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn parses_keys_and_difficulty() {
        assert_eq!("B".parse::<OptionKey>().unwrap(), OptionKey::B);
        assert!("E".parse::<OptionKey>().is_err());
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("Hard".parse::<Difficulty>().is_err());
    }
}
