use serde::Serialize;

use quiz_core::model::{Score, UserAnswerRecord};
use quiz_core::scoring::xp_for_score;

/// How a session reached `Ended`. Message text is left to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Lives reached zero before the working list ran out.
    ExhaustedLives,
    /// Every question in the working list was answered.
    CompletedAll,
    /// The player stopped early with lives and questions left.
    PartialStop,
}

impl Termination {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::ExhaustedLives => "exhausted_lives",
            Termination::CompletedAll => "completed_all",
            Termination::PartialStop => "partial_stop",
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final, presentation-agnostic result of a session.
///
/// Carries the `Score` exactly as it is committed to the board, plus the answer
/// records needed by a review screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub score: Score,
    pub termination: Termination,
    pub lives_left: u32,
    pub best_streak: u32,
    pub answers: Vec<UserAnswerRecord>,
}

impl SessionOutcome {
    /// Every answered question was correct. Independent of `termination`.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        let answered = self.score.answered_count();
        answered > 0 && self.score.correct_count() == answered
    }

    /// XP this session is worth.
    #[must_use]
    pub fn xp_earned(&self) -> u64 {
        xp_for_score(self.score.total_score())
    }

    /// Records answered incorrectly or left unanswered.
    pub fn mistakes(&self) -> impl Iterator<Item = &UserAnswerRecord> {
        self.answers.iter().filter(|a| !a.correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    fn outcome(total: u32, correct: u32, answered: u32) -> SessionOutcome {
        SessionOutcome {
            score: Score::new(total, correct, answered, 30, fixed_now()).unwrap(),
            termination: Termination::PartialStop,
            lives_left: 3,
            best_streak: correct,
            answers: Vec::new(),
        }
    }

    #[test]
    fn perfect_requires_at_least_one_answer() {
        assert!(!outcome(0, 0, 0).is_perfect());
        assert!(outcome(200, 2, 2).is_perfect());
        assert!(!outcome(200, 2, 3).is_perfect());
    }

    #[test]
    fn xp_is_a_tenth_of_the_score_rounded() {
        assert_eq!(outcome(300, 3, 3).xp_earned(), 30);
        assert_eq!(outcome(45, 1, 1).xp_earned(), 5);
        assert_eq!(outcome(44, 1, 1).xp_earned(), 4);
    }

    #[test]
    fn termination_names_are_stable() {
        assert_eq!(Termination::ExhaustedLives.to_string(), "exhausted_lives");
        assert_eq!(Termination::CompletedAll.as_str(), "completed_all");
        assert_eq!(
            serde_json::to_string(&Termination::PartialStop).unwrap(),
            "\"partial_stop\""
        );
    }
}
