use crate::model::{OptionKey, Question};

/// One answered question inside a session. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAnswerRecord {
    /// Position of the question in the session's working list.
    pub position: usize,
    pub question: Question,
    /// `None` when the question timed out or was skipped.
    pub selected: Option<OptionKey>,
    pub correct: bool,
    pub response_time_secs: f64,
    pub points: u32,
}

impl UserAnswerRecord {
    #[must_use]
    pub fn was_skipped(&self) -> bool {
        self.selected.is_none()
    }
}
