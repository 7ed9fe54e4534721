use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::Question;

/// Working list for one session: every unseen question first, then the seen ones.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub unseen_selected: usize,
    pub seen_selected: usize,
}

impl SessionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were selected for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Orders a question set so novelty wins over randomness.
///
/// Each partition is shuffled on its own, so unseen questions are never
/// interleaved with seen ones.
#[derive(Debug, Clone, Copy)]
pub struct SessionBuilder {
    shuffle: bool,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { shuffle: true }
    }

    /// Enable or disable shuffling inside each partition.
    ///
    /// With shuffling off the input order is kept, which makes sessions reproducible.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build a plan using the thread-local generator.
    pub fn build(
        self,
        unseen: impl IntoIterator<Item = Question>,
        seen: impl IntoIterator<Item = Question>,
    ) -> SessionPlan {
        self.build_with_rng(unseen, seen, &mut rng())
    }

    /// Build a plan with a caller-supplied generator.
    pub fn build_with_rng<R: Rng + ?Sized>(
        self,
        unseen: impl IntoIterator<Item = Question>,
        seen: impl IntoIterator<Item = Question>,
        rng: &mut R,
    ) -> SessionPlan {
        let mut unseen: Vec<Question> = unseen.into_iter().collect();
        let mut seen: Vec<Question> = seen.into_iter().collect();

        if self.shuffle {
            unseen.as_mut_slice().shuffle(rng);
            seen.as_mut_slice().shuffle(rng);
        }

        let unseen_selected = unseen.len();
        let seen_selected = seen.len();
        unseen.extend(seen);

        SessionPlan {
            questions: unseen,
            unseen_selected,
            seen_selected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, OptionKey, QuestionDraft, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;

    fn build_question(id: u64) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            options: BTreeMap::from([(OptionKey::A, "a".into()), (OptionKey::B, "b".into())]),
            correct: OptionKey::A,
            explanation: "e".into(),
            category: "Routing".into(),
            difficulty: Difficulty::Easy,
        }
        .validate()
        .unwrap()
    }

    fn ids(plan: &SessionPlan) -> Vec<u64> {
        plan.questions.iter().map(|q| q.id().value()).collect()
    }

    #[test]
    fn unseen_always_come_first() {
        let unseen: Vec<Question> = (1..=6).map(build_question).collect();
        let seen: Vec<Question> = (7..=12).map(build_question).collect();

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan =
                SessionBuilder::new().build_with_rng(unseen.clone(), seen.clone(), &mut rng);

            assert_eq!(plan.total(), 12);
            assert_eq!(plan.unseen_selected, 6);
            assert_eq!(plan.seen_selected, 6);
            assert!(ids(&plan)[..6].iter().all(|id| *id <= 6));
            assert!(ids(&plan)[6..].iter().all(|id| *id > 6));
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let unseen: Vec<Question> = (1..=20).map(build_question).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let plan = SessionBuilder::new().build_with_rng(unseen, Vec::new(), &mut rng);

        let mut sorted = ids(&plan);
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn unshuffled_keeps_input_order() {
        let plan = SessionBuilder::new()
            .with_shuffle(false)
            .build(vec![build_question(3), build_question(1)], vec![build_question(2)]);
        assert_eq!(ids(&plan), vec![3, 1, 2]);
    }

    #[test]
    fn empty_inputs_give_empty_plan() {
        let plan = SessionBuilder::new().build(Vec::new(), Vec::new());
        assert!(plan.is_empty());
    }
}
