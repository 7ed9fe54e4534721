//! Validation of user-supplied question sets.
//!
//! The import format is a JSON array of objects with `id`, `question`,
//! `options` (keys drawn from `A`..`D`), `correctAnswer`, `explanation`,
//! `category` and `difficulty`. Validation stops at the first problem and the
//! whole import is rejected; question numbers in errors are 1-based.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::model::{Difficulty, OptionKey, Question, QuestionDraft, QuestionId, MIN_OPTIONS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImportError {
    #[error("invalid JSON format, please check your syntax: {0}")]
    Syntax(String),

    #[error("JSON must be an array of questions")]
    NotAnArray,

    #[error("please provide at least one question")]
    Empty,

    #[error("question {number}: invalid question object")]
    InvalidRecord { number: usize },

    #[error("question {number}: missing or invalid id (must be a positive integer)")]
    InvalidId { number: usize },

    #[error("question {number}: missing or invalid question text")]
    InvalidPrompt { number: usize },

    #[error("question {number}: missing or invalid options object")]
    InvalidOptions { number: usize },

    #[error("question {number}: must have at least 2 options")]
    TooFewOptions { number: usize },

    #[error("question {number}: invalid correctAnswer (must be A, B, C, or D)")]
    InvalidCorrectAnswer { number: usize },

    #[error("question {number}: correctAnswer \"{key}\" not found in provided options")]
    CorrectAnswerNotInOptions { number: usize, key: OptionKey },

    #[error("question {number}: missing or invalid explanation")]
    InvalidExplanation { number: usize },

    #[error("question {number}: missing or invalid category")]
    InvalidCategory { number: usize },

    #[error("question {number}: invalid difficulty (must be easy, medium, or hard)")]
    InvalidDifficulty { number: usize },

    #[error("question {number}: duplicate id {id}, each question must have a unique id")]
    DuplicateId { number: usize, id: QuestionId },
}

impl ImportError {
    /// 1-based number of the offending question, when the error is tied to one.
    #[must_use]
    pub fn question_number(&self) -> Option<usize> {
        match self {
            ImportError::Syntax(_) | ImportError::NotAnArray | ImportError::Empty => None,
            ImportError::InvalidRecord { number }
            | ImportError::InvalidId { number }
            | ImportError::InvalidPrompt { number }
            | ImportError::InvalidOptions { number }
            | ImportError::TooFewOptions { number }
            | ImportError::InvalidCorrectAnswer { number }
            | ImportError::CorrectAnswerNotInOptions { number, .. }
            | ImportError::InvalidExplanation { number }
            | ImportError::InvalidCategory { number }
            | ImportError::InvalidDifficulty { number }
            | ImportError::DuplicateId { number, .. } => Some(*number),
        }
    }
}

/// Parse and validate a question set.
///
/// # Errors
///
/// Returns the first `ImportError` found, in document order. Duplicate ids are
/// checked after every record passed its own validation.
pub fn parse_questions(json: &str) -> Result<Vec<Question>, ImportError> {
    let root: Value =
        serde_json::from_str(json).map_err(|e| ImportError::Syntax(e.to_string()))?;
    let Value::Array(items) = root else {
        return Err(ImportError::NotAnArray);
    };
    if items.is_empty() {
        return Err(ImportError::Empty);
    }

    let questions = items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_record(item, index + 1))
        .collect::<Result<Vec<_>, _>>()?;

    let mut first_seen: HashMap<QuestionId, usize> = HashMap::with_capacity(questions.len());
    for (index, q) in questions.iter().enumerate() {
        if first_seen.insert(q.id(), index + 1).is_some() {
            return Err(ImportError::DuplicateId {
                number: index + 1,
                id: q.id(),
            });
        }
    }

    Ok(questions)
}

fn parse_record(item: &Value, number: usize) -> Result<Question, ImportError> {
    let Value::Object(obj) = item else {
        return Err(ImportError::InvalidRecord { number });
    };

    let id = obj
        .get("id")
        .and_then(Value::as_u64)
        .filter(|id| *id > 0)
        .ok_or(ImportError::InvalidId { number })?;

    let prompt = non_empty_str(obj, "question").ok_or(ImportError::InvalidPrompt { number })?;

    let options = parse_options(obj, number)?;

    let correct = obj
        .get("correctAnswer")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<OptionKey>().ok())
        .ok_or(ImportError::InvalidCorrectAnswer { number })?;
    if !options.contains_key(&correct) {
        return Err(ImportError::CorrectAnswerNotInOptions {
            number,
            key: correct,
        });
    }

    let explanation =
        non_empty_str(obj, "explanation").ok_or(ImportError::InvalidExplanation { number })?;
    let category = non_empty_str(obj, "category").ok_or(ImportError::InvalidCategory { number })?;
    let difficulty = obj
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<Difficulty>().ok())
        .ok_or(ImportError::InvalidDifficulty { number })?;

    // Every field was checked above; a draft failure here would mean the two
    // validators disagree, so report it against the record rather than panic.
    QuestionDraft {
        id: QuestionId::new(id),
        prompt: prompt.to_string(),
        options,
        correct,
        explanation: explanation.to_string(),
        category: category.to_string(),
        difficulty,
    }
    .validate()
    .map_err(|_| ImportError::InvalidRecord { number })
}

/// Collects the `A`..`D` entries; other keys are ignored.
fn parse_options(
    obj: &Map<String, Value>,
    number: usize,
) -> Result<BTreeMap<OptionKey, String>, ImportError> {
    let Some(Value::Object(raw)) = obj.get("options") else {
        return Err(ImportError::InvalidOptions { number });
    };

    let mut options = BTreeMap::new();
    for key in OptionKey::ALL {
        match raw.get(key.as_str()) {
            None => {}
            Some(Value::String(text)) => {
                options.insert(key, text.clone());
            }
            Some(_) => return Err(ImportError::InvalidOptions { number }),
        }
    }
    if options.len() < MIN_OPTIONS {
        return Err(ImportError::TooFewOptions { number });
    }
    Ok(options)
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid(id: u64) -> Value {
        json!({
            "id": id,
            "question": "What is the primary function of the Transport Layer?",
            "options": {
                "A": "Physical transmission of data",
                "B": "End-to-end communication and error recovery",
                "C": "Routing packets across networks",
                "D": "Data encryption"
            },
            "correctAnswer": "B",
            "explanation": "The Transport Layer provides end-to-end communication.",
            "category": "Transport Layer",
            "difficulty": "medium"
        })
    }

    fn parse(value: &Value) -> Result<Vec<Question>, ImportError> {
        parse_questions(&value.to_string())
    }

    fn with(id: u64, field: &str, replacement: Value) -> Value {
        let mut q = valid(id);
        q[field] = replacement;
        q
    }

    #[test]
    fn accepts_valid_set() {
        let questions = parse(&json!([valid(1), valid(2)])).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].id(), QuestionId::new(2));
        assert_eq!(questions[0].correct(), OptionKey::B);
        assert_eq!(questions[0].difficulty(), Difficulty::Medium);
    }

    #[test]
    fn rejects_bad_roots() {
        assert!(matches!(parse_questions("[{"), Err(ImportError::Syntax(_))));
        assert_eq!(parse(&json!({"id": 1})).unwrap_err(), ImportError::NotAnArray);
        assert_eq!(parse(&json!([])).unwrap_err(), ImportError::Empty);
        assert_eq!(
            parse(&json!([valid(1), "nope"])).unwrap_err(),
            ImportError::InvalidRecord { number: 2 }
        );
    }

    #[test]
    fn reports_each_field_problem_with_its_number() {
        let cases = [
            (with(1, "id", json!("1")), ImportError::InvalidId { number: 2 }),
            (with(1, "id", json!(0)), ImportError::InvalidId { number: 2 }),
            (with(1, "id", json!(1.5)), ImportError::InvalidId { number: 2 }),
            (with(1, "question", json!("")), ImportError::InvalidPrompt { number: 2 }),
            (with(1, "options", json!(["A"])), ImportError::InvalidOptions { number: 2 }),
            (
                with(1, "options", json!({"A": "only", "E": "ignored"})),
                ImportError::TooFewOptions { number: 2 },
            ),
            (
                with(1, "correctAnswer", json!("E")),
                ImportError::InvalidCorrectAnswer { number: 2 },
            ),
            (with(1, "explanation", json!(null)), ImportError::InvalidExplanation { number: 2 }),
            (with(1, "category", json!(7)), ImportError::InvalidCategory { number: 2 }),
            (with(1, "difficulty", json!("insane")), ImportError::InvalidDifficulty { number: 2 }),
        ];

        for (bad, expected) in cases {
            let err = parse(&json!([valid(100), bad])).unwrap_err();
            assert_eq!(err, expected);
            assert_eq!(err.question_number(), Some(2));
        }
    }

    #[test]
    fn correct_answer_must_be_a_provided_option() {
        let bad = with(1, "options", json!({"A": "yes", "C": "no"}));
        assert_eq!(
            parse(&json!([bad])).unwrap_err(),
            ImportError::CorrectAnswerNotInOptions {
                number: 1,
                key: OptionKey::B
            }
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = parse(&json!([valid(1), valid(2), valid(1)])).unwrap_err();
        assert_eq!(
            err,
            ImportError::DuplicateId {
                number: 3,
                id: QuestionId::new(1)
            }
        );
    }

    #[test]
    fn field_errors_win_over_duplicates() {
        let err = parse(&json!([valid(1), valid(1), with(2, "category", json!(""))])).unwrap_err();
        assert_eq!(err, ImportError::InvalidCategory { number: 3 });
    }
}
