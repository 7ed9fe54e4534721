use rand::Rng;
use std::sync::Arc;

use quiz_core::model::{OptionKey, Question, QuizSettings};
use storage::progress::ProgressStore;

use super::plan::{SessionBuilder, SessionPlan};
use super::service::{AnswerFeedback, NextStep, QuizSession};
use super::view::{SessionOutcome, Termination};
use crate::Clock;
use crate::error::SessionError;
use crate::feedback::{FeedbackSink, noop_feedback};
use crate::xp_service::{XpAward, XpService};

/// Everything produced when a session reaches `Ended`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEnd {
    pub outcome: SessionOutcome,
    pub award: XpAward,
}

/// Result of moving past the feedback screen.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    Question { position: usize },
    Ended(SessionEnd),
}

/// Orchestrates a session against the stores: ordering at start, seen
/// bookkeeping on every answer, score and XP commit at the end.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: QuizSettings,
    progress: Arc<ProgressStore>,
    xp: Arc<XpService>,
    feedback: Arc<dyn FeedbackSink>,
    shuffle: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        progress: Arc<ProgressStore>,
        xp: Arc<XpService>,
    ) -> Self {
        Self {
            clock,
            settings,
            progress,
            xp,
            feedback: noop_feedback(),
            shuffle: true,
        }
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Order `questions` (unseen first) and start a session over them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty set and
    /// `SessionError::Storage` if the seen set cannot be read.
    pub async fn start_session(&self, questions: &[Question]) -> Result<QuizSession, SessionError> {
        let (unseen, seen) = self.progress.partition_by_unseen(questions).await?;
        let plan = SessionBuilder::new()
            .with_shuffle(self.shuffle)
            .build(unseen, seen);
        self.start_from_plan(plan)
    }

    /// Same as `start_session` with a caller-supplied generator.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty set and
    /// `SessionError::Storage` if the seen set cannot be read.
    pub async fn start_session_with_rng<R: Rng + ?Sized>(
        &self,
        questions: &[Question],
        rng: &mut R,
    ) -> Result<QuizSession, SessionError> {
        let (unseen, seen) = self.progress.partition_by_unseen(questions).await?;
        let plan = SessionBuilder::new()
            .with_shuffle(self.shuffle)
            .build_with_rng(unseen, seen, rng);
        self.start_from_plan(plan)
    }

    fn start_from_plan(&self, plan: SessionPlan) -> Result<QuizSession, SessionError> {
        let (unseen, seen) = (plan.unseen_selected, plan.seen_selected);
        let mut session = QuizSession::new(self.settings.clone());
        session.start(plan.questions, self.clock.now())?;
        tracing::info!(unseen, seen, "quiz session started");
        if session.sound_enabled() {
            self.feedback.click();
        }
        Ok(session)
    }

    /// Answer the current question and mark it seen.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for phase violations or if the seen set cannot be written.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        selected: Option<OptionKey>,
    ) -> Result<AnswerFeedback, SessionError> {
        let feedback = session.answer(selected, self.clock.now())?;
        self.after_answer(session, &feedback).await?;
        Ok(feedback)
    }

    /// Force a null answer when the countdown for the current question ran out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the seen set cannot be written.
    pub async fn expire_if_due(
        &self,
        session: &mut QuizSession,
    ) -> Result<Option<AnswerFeedback>, SessionError> {
        let Some(feedback) = session.expire_if_due(self.clock.now())? else {
            return Ok(None);
        };
        self.after_answer(session, &feedback).await?;
        Ok(Some(feedback))
    }

    async fn after_answer(
        &self,
        session: &QuizSession,
        feedback: &AnswerFeedback,
    ) -> Result<(), SessionError> {
        self.progress.mark_seen(feedback.record.question.id()).await?;
        if session.sound_enabled() {
            if feedback.record.correct {
                self.feedback.success();
            } else {
                self.feedback.failure();
            }
        }
        Ok(())
    }

    /// Advance to the next question, committing the session if it ended.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for phase violations or persistence failures.
    pub async fn next(&self, session: &mut QuizSession) -> Result<SessionStep, SessionError> {
        match session.next(self.clock.now())? {
            NextStep::Question { position } => {
                if session.sound_enabled() {
                    self.feedback.click();
                }
                Ok(SessionStep::Question { position })
            }
            NextStep::Ended(outcome) => {
                let end = self.commit(session, outcome).await?;
                Ok(SessionStep::Ended(end))
            }
        }
    }

    /// Stop the session now and commit its score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyEnded` when called twice, otherwise
    /// persistence failures.
    pub async fn end_session(&self, session: &mut QuizSession) -> Result<SessionEnd, SessionError> {
        let outcome = session.end(self.clock.now())?;
        self.commit(session, outcome).await
    }

    /// Throw the session away without touching the score board.
    pub fn abandon(&self, session: &mut QuizSession) {
        session.abandon();
        tracing::info!("quiz session abandoned");
    }

    /// Flip the sound flag on `session`. Returns the new value.
    pub fn toggle_sound(&self, session: &mut QuizSession) -> bool {
        let enabled = session.toggle_sound();
        if enabled {
            self.feedback.click();
        }
        enabled
    }

    /// Forget every seen question. Running sessions keep their working list.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the seen set cannot be cleared.
    pub async fn reset_seen(&self) -> Result<(), SessionError> {
        self.progress.reset_seen().await?;
        tracing::info!("seen questions reset");
        Ok(())
    }

    async fn commit(
        &self,
        session: &QuizSession,
        outcome: SessionOutcome,
    ) -> Result<SessionEnd, SessionError> {
        self.progress.record_score(outcome.score.clone()).await?;
        let award = self.xp.award_session(outcome.score.total_score()).await?;

        tracing::info!(
            termination = %outcome.termination,
            score = outcome.score.total_score(),
            accuracy = outcome.score.accuracy_percent(),
            xp = award.xp_gained,
            "quiz session committed"
        );

        if session.sound_enabled() {
            match outcome.termination {
                Termination::ExhaustedLives => self.feedback.game_over(),
                Termination::CompletedAll | Termination::PartialStop => {
                    self.feedback.level_complete();
                }
            }
            if let Some(up) = &award.level_up {
                self.feedback.level_up(up.new_level);
            }
        }

        Ok(SessionEnd { outcome, award })
    }
}
