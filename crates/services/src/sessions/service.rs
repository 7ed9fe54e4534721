use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

use quiz_core::model::{OptionKey, Question, QuizSettings, Score, UserAnswerRecord};
use quiz_core::scoring::points_for_response;
use quiz_core::time::elapsed_secs;

use super::progress::SessionProgress;
use super::view::{SessionOutcome, Termination};
use crate::error::SessionError;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Where a session is in its lifecycle.
///
/// `AwaitingAnswer` and `ShowingFeedback` are the two sub-phases of an
/// in-progress session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    AwaitingAnswer,
    ShowingFeedback,
    Ended,
}

impl SessionPhase {
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::AwaitingAnswer | Self::ShowingFeedback)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::AwaitingAnswer => "awaiting_answer",
            Self::ShowingFeedback => "showing_feedback",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── TRANSITION RESULTS ────────────────────────────────────────────────────────
//

/// What the player sees right after answering.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub record: UserAnswerRecord,
    pub lives_left: u32,
    pub streak: u32,
    pub score: u32,
    /// `Next` will end the session: lives are gone or this was the last question.
    pub is_final: bool,
}

/// Result of the `Next` transition.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    Question { position: usize },
    Ended(SessionOutcome),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State of one playthrough.
///
/// Pure state machine: it never reads the clock or touches storage. Every
/// time-dependent transition takes `now`, and the caller persists what the
/// transitions return.
pub struct QuizSession {
    settings: QuizSettings,
    sound_enabled: bool,
    phase: SessionPhase,
    questions: Vec<Question>,
    position: usize,
    score: u32,
    streak: u32,
    best_streak: u32,
    lives: u32,
    correct_count: u32,
    answers: Vec<UserAnswerRecord>,
    started_at: Option<DateTime<Utc>>,
    question_started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self {
            sound_enabled: settings.sound_enabled(),
            lives: settings.max_lives(),
            settings,
            phase: SessionPhase::NotStarted,
            questions: Vec::new(),
            position: 0,
            score: 0,
            streak: 0,
            best_streak: 0,
            correct_count: 0,
            answers: Vec::new(),
            started_at: None,
            question_started_at: None,
            ended_at: None,
        }
    }

    /// Begin a session over `working_list`, already ordered by the caller.
    ///
    /// Allowed from `NotStarted` and `Ended`; all counters reset and lives
    /// refill to the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty list and
    /// `SessionError::InvalidPhase` while a session is in progress.
    pub fn start(
        &mut self,
        working_list: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.phase.is_in_progress() {
            return Err(SessionError::InvalidPhase {
                expected: SessionPhase::NotStarted,
                actual: self.phase,
            });
        }
        if working_list.is_empty() {
            return Err(SessionError::Empty);
        }

        self.questions = working_list;
        self.position = 0;
        self.score = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.lives = self.settings.max_lives();
        self.correct_count = 0;
        self.answers.clear();
        self.started_at = Some(now);
        self.question_started_at = Some(now);
        self.ended_at = None;
        self.phase = SessionPhase::AwaitingAnswer;

        tracing::debug!(total = self.questions.len(), "session started");
        Ok(())
    }

    /// Evaluate `selected` against the current question.
    ///
    /// `None` means timeout or skip and always counts as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` unless the session is awaiting an answer.
    pub fn answer(
        &mut self,
        selected: Option<OptionKey>,
        now: DateTime<Utc>,
    ) -> Result<AnswerFeedback, SessionError> {
        self.require(SessionPhase::AwaitingAnswer)?;
        let question = self
            .questions
            .get(self.position)
            .ok_or(SessionError::NotInProgress)?;
        let question_started_at = self.question_started_at.unwrap_or(now);

        let response_time_secs = elapsed_secs(question_started_at, now);
        let correct = question.is_correct(selected);
        let points = if correct {
            points_for_response(response_time_secs)
        } else {
            0
        };

        let record = UserAnswerRecord {
            position: self.position,
            question: question.clone(),
            selected,
            correct,
            response_time_secs,
            points,
        };

        if correct {
            self.score = self.score.saturating_add(points);
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            self.correct_count += 1;
        } else {
            self.streak = 0;
            self.lives = self.lives.saturating_sub(1);
        }
        self.answers.push(record);
        self.phase = SessionPhase::ShowingFeedback;

        tracing::debug!(
            position = self.position,
            correct,
            points,
            lives = self.lives,
            streak = self.streak,
            "answer recorded"
        );

        self.feedback()
    }

    /// Snapshot of the last answer, for feedback display.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless feedback is showing.
    pub fn feedback(&self) -> Result<AnswerFeedback, SessionError> {
        self.require(SessionPhase::ShowingFeedback)?;
        let record = self
            .answers
            .last()
            .cloned()
            .ok_or(SessionError::NotInProgress)?;
        Ok(AnswerFeedback {
            record,
            lives_left: self.lives,
            streak: self.streak,
            score: self.score,
            is_final: self.is_final_question_done(),
        })
    }

    /// Move past the feedback screen.
    ///
    /// Ends the session when lives are gone or the last question was answered.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` unless feedback is showing.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<NextStep, SessionError> {
        self.require(SessionPhase::ShowingFeedback)?;

        if self.is_final_question_done() {
            return Ok(NextStep::Ended(self.finish(now)?));
        }

        self.position += 1;
        self.question_started_at = Some(now);
        self.phase = SessionPhase::AwaitingAnswer;
        tracing::debug!(position = self.position, "advanced to next question");
        Ok(NextStep::Question {
            position: self.position,
        })
    }

    /// Stop the session from any in-progress phase and build its outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyEnded` when called twice and
    /// `SessionError::NotInProgress` before `start`.
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<SessionOutcome, SessionError> {
        match self.phase {
            SessionPhase::NotStarted => Err(SessionError::NotInProgress),
            SessionPhase::Ended => Err(SessionError::AlreadyEnded),
            SessionPhase::AwaitingAnswer | SessionPhase::ShowingFeedback => self.finish(now),
        }
    }

    /// Drop the session without producing a score. Always allowed.
    pub fn abandon(&mut self) {
        if self.phase.is_in_progress() {
            tracing::debug!(answered = self.answers.len(), "session abandoned");
        }
        self.phase = SessionPhase::NotStarted;
        self.questions.clear();
        self.answers.clear();
        self.position = 0;
        self.score = 0;
        self.streak = 0;
        self.best_streak = 0;
        self.correct_count = 0;
        self.lives = self.settings.max_lives();
        self.started_at = None;
        self.question_started_at = None;
        self.ended_at = None;
    }

    /// Flip the sound flag. Returns the new value.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    //
    // ─── COUNTDOWN ─────────────────────────────────────────────────────────────
    //

    /// Remaining answer budget for the current question.
    ///
    /// `None` when the session is untimed or not awaiting an answer.
    #[must_use]
    pub fn time_left(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.phase != SessionPhase::AwaitingAnswer {
            return None;
        }
        let limit = self.settings.question_time_limit()?;
        let started = self.question_started_at?;
        let spent = now.signed_duration_since(started).max(Duration::zero());
        Some((limit - spent).max(Duration::zero()))
    }

    /// Submit a null answer once the countdown has run out.
    ///
    /// Returns `Ok(None)` when untimed, not awaiting an answer, or still within budget.
    ///
    /// # Errors
    ///
    /// Propagates `answer` errors.
    pub fn expire_if_due(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<AnswerFeedback>, SessionError> {
        match self.time_left(now) {
            Some(left) if left <= Duration::zero() => {
                tracing::debug!(position = self.position, "question timed out");
                self.answer(None, now).map(Some)
            }
            _ => Ok(None),
        }
    }

    //
    // ─── ACCESSORS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase.is_in_progress() {
            self.questions.get(self.position)
        } else {
            None
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[UserAnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: self.position,
            total: self.questions.len(),
            answered: self.answers.len(),
            remaining: self.questions.len().saturating_sub(self.answers.len()),
            lives: self.lives,
            streak: self.streak,
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn require(&self, expected: SessionPhase) -> Result<(), SessionError> {
        match self.phase {
            actual if actual == expected => Ok(()),
            SessionPhase::NotStarted => Err(SessionError::NotInProgress),
            SessionPhase::Ended => Err(SessionError::AlreadyEnded),
            actual => Err(SessionError::InvalidPhase { expected, actual }),
        }
    }

    fn is_final_question_done(&self) -> bool {
        self.lives == 0 || self.position + 1 >= self.questions.len()
    }

    fn termination(&self) -> Termination {
        if self.lives == 0 {
            Termination::ExhaustedLives
        } else if self.answers.len() >= self.questions.len() {
            Termination::CompletedAll
        } else {
            Termination::PartialStop
        }
    }

    fn finish(&mut self, now: DateTime<Utc>) -> Result<SessionOutcome, SessionError> {
        let started_at = self.started_at.unwrap_or(now);
        let elapsed =
            u64::try_from(now.signed_duration_since(started_at).num_seconds()).unwrap_or(0);
        let answered = u32::try_from(self.answers.len()).unwrap_or(u32::MAX);
        let score = Score::new(self.score, self.correct_count, answered, elapsed, now)?;
        let termination = self.termination();

        self.phase = SessionPhase::Ended;
        self.ended_at = Some(now);
        self.question_started_at = None;

        tracing::debug!(%termination, score = self.score, answered, "session ended");

        Ok(SessionOutcome {
            score,
            termination,
            lives_left: self.lives,
            best_streak: self.best_streak,
            answers: self.answers.clone(),
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("position", &self.position)
            .field("score", &self.score)
            .field("lives", &self.lives)
            .field("streak", &self.streak)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Difficulty, QuestionDraft, QuestionId};
    use quiz_core::time::fixed_now;
    use std::collections::BTreeMap;

    fn build_question(id: u64) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            options: BTreeMap::from([
                (OptionKey::A, "a".into()),
                (OptionKey::B, "b".into()),
                (OptionKey::C, "c".into()),
            ]),
            correct: OptionKey::B,
            explanation: "e".into(),
            category: "Transport Layer".into(),
            difficulty: Difficulty::Medium,
        }
        .validate()
        .unwrap()
    }

    fn started(count: u64) -> QuizSession {
        let mut session = QuizSession::new(QuizSettings::default());
        session
            .start((1..=count).map(build_question).collect(), fixed_now())
            .unwrap();
        session
    }

    fn secs(s: i64) -> DateTime<Utc> {
        fixed_now() + Duration::seconds(s)
    }

    #[test]
    fn empty_session_returns_error() {
        let mut session = QuizSession::new(QuizSettings::default());
        let err = session.start(Vec::new(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
        assert_eq!(session.phase(), SessionPhase::NotStarted);
    }

    #[test]
    fn three_fast_correct_answers_complete_perfectly() {
        let mut session = started(3);
        let mut t = 0;
        let mut outcome = None;
        while outcome.is_none() {
            t += 4;
            session.answer(Some(OptionKey::B), secs(t)).unwrap();
            if let NextStep::Ended(o) = session.next(secs(t)).unwrap() {
                outcome = Some(o);
            }
        }
        let outcome = outcome.unwrap();

        assert_eq!(outcome.score.total_score(), 300);
        assert_eq!(outcome.score.accuracy_percent(), 100);
        assert_eq!(outcome.score.answered_count(), 3);
        assert_eq!(outcome.score.elapsed_secs(), 12);
        assert_eq!(outcome.termination, Termination::CompletedAll);
        assert!(outcome.is_perfect());
        assert_eq!(outcome.best_streak, 3);
        assert_eq!(session.phase(), SessionPhase::Ended);
    }

    #[test]
    fn running_out_of_lives_ends_early() {
        let mut session = started(8);
        let mut t = 0;
        let outcome = loop {
            t += 2;
            session.answer(Some(OptionKey::A), secs(t)).unwrap();
            match session.next(secs(t)).unwrap() {
                NextStep::Ended(outcome) => break outcome,
                NextStep::Question { .. } => {}
            }
        };

        assert_eq!(session.answered_count(), 3);
        assert_eq!(session.lives(), 0);
        assert_eq!(outcome.lives_left, 0);
        assert_eq!(outcome.score.answered_count(), 3);
        assert_eq!(outcome.score.accuracy_percent(), 0);
        assert_eq!(outcome.termination, Termination::ExhaustedLives);
        assert!(!outcome.is_perfect());
    }

    #[test]
    fn points_follow_response_time_tiers() {
        let mut session = started(5);
        let mut t = 0;
        let mut points = Vec::new();
        for delay in [5, 10, 15, 20, 25] {
            t += delay;
            points.push(session.answer(Some(OptionKey::B), secs(t)).unwrap().record.points);
            session.next(secs(t)).unwrap();
        }
        assert_eq!(points, vec![100, 80, 60, 40, 20]);
    }

    #[test]
    fn streak_resets_on_miss_and_best_streak_is_kept() {
        let mut session = started(6);
        let picks = [
            Some(OptionKey::B),
            Some(OptionKey::B),
            None,
            Some(OptionKey::B),
            Some(OptionKey::C),
        ];
        let mut streaks = Vec::new();
        for pick in picks {
            streaks.push(session.answer(pick, fixed_now()).unwrap().streak);
            session.next(fixed_now()).unwrap();
        }

        assert_eq!(streaks, vec![1, 2, 0, 1, 0]);
        assert_eq!(session.best_streak(), 2);
        assert_eq!(session.lives(), 1);
        assert_eq!(session.correct_count(), 3);
        assert!(session.answers()[2].was_skipped());
    }

    #[test]
    fn wrong_phase_calls_fail_fast() {
        let mut fresh = QuizSession::new(QuizSettings::default());
        assert!(matches!(
            fresh.answer(Some(OptionKey::A), fixed_now()),
            Err(SessionError::NotInProgress)
        ));
        assert!(matches!(fresh.end(fixed_now()), Err(SessionError::NotInProgress)));

        let mut session = started(2);
        assert!(matches!(
            session.next(fixed_now()),
            Err(SessionError::InvalidPhase {
                expected: SessionPhase::ShowingFeedback,
                actual: SessionPhase::AwaitingAnswer
            })
        ));
        session.answer(Some(OptionKey::B), fixed_now()).unwrap();
        assert!(matches!(
            session.answer(Some(OptionKey::B), fixed_now()),
            Err(SessionError::InvalidPhase { .. })
        ));
        assert!(matches!(
            session.start(vec![build_question(9)], fixed_now()),
            Err(SessionError::InvalidPhase { .. })
        ));

        session.end(fixed_now()).unwrap();
        assert!(matches!(session.end(fixed_now()), Err(SessionError::AlreadyEnded)));
        assert!(matches!(session.next(fixed_now()), Err(SessionError::AlreadyEnded)));
    }

    #[test]
    fn stopping_early_is_a_partial_stop() {
        let mut session = started(4);
        session.answer(Some(OptionKey::B), secs(3)).unwrap();
        session.next(secs(3)).unwrap();

        let outcome = session.end(secs(40)).unwrap();
        assert_eq!(outcome.termination, Termination::PartialStop);
        assert_eq!(outcome.score.answered_count(), 1);
        assert_eq!(outcome.score.elapsed_secs(), 40);
        assert!(outcome.is_perfect());
    }

    #[test]
    fn ending_before_any_answer_scores_zero_accuracy() {
        let mut session = started(2);
        let outcome = session.end(secs(1)).unwrap();
        assert_eq!(outcome.score.accuracy_percent(), 0);
        assert_eq!(outcome.score.answered_count(), 0);
        assert!(!outcome.is_perfect());
    }

    #[test]
    fn countdown_forces_a_null_answer() {
        let settings = QuizSettings::default()
            .with_question_time_limit(Some(60))
            .unwrap();
        let mut session = QuizSession::new(settings);
        session.start(vec![build_question(1), build_question(2)], fixed_now()).unwrap();

        assert_eq!(session.time_left(secs(15)), Some(Duration::seconds(45)));
        assert!(session.expire_if_due(secs(59)).unwrap().is_none());

        let feedback = session.expire_if_due(secs(61)).unwrap().unwrap();
        assert!(feedback.record.was_skipped());
        assert!(!feedback.record.correct);
        assert_eq!(feedback.lives_left, 2);
        assert_eq!(session.phase(), SessionPhase::ShowingFeedback);
        assert_eq!(session.time_left(secs(61)), None);
    }

    #[test]
    fn untimed_session_never_expires() {
        let mut session = started(1);
        assert_eq!(session.time_left(secs(10_000)), None);
        assert!(session.expire_if_due(secs(10_000)).unwrap().is_none());
        assert_eq!(session.phase(), SessionPhase::AwaitingAnswer);
    }

    #[test]
    fn abandon_discards_everything() {
        let mut session = started(3);
        session.answer(Some(OptionKey::A), secs(1)).unwrap();
        session.abandon();

        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert_eq!(session.answered_count(), 0);
        assert_eq!(session.lives(), 3);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn restart_after_end_refills_lives() {
        let mut session = started(2);
        session.answer(None, secs(1)).unwrap();
        session.end(secs(2)).unwrap();

        session.start(vec![build_question(5)], secs(3)).unwrap();
        assert_eq!(session.lives(), 3);
        assert_eq!(session.score(), 0);
        assert_eq!(session.progress().total, 1);
    }

    #[test]
    fn progress_tracks_position() {
        let mut session = started(3);
        session.answer(Some(OptionKey::B), secs(1)).unwrap();
        session.next(secs(1)).unwrap();

        let progress = session.progress();
        assert_eq!(progress.position, 1);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 2);
        assert_eq!(progress.score, 100);
        assert!(!progress.is_complete);

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["lives"], 3);
        assert_eq!(
            serde_json::to_value(session.phase()).unwrap(),
            "awaiting_answer"
        );
    }

    #[test]
    fn toggle_sound_flips() {
        let mut session = QuizSession::new(QuizSettings::default());
        assert!(session.sound_enabled());
        assert!(!session.toggle_sound());
        assert!(session.toggle_sound());
    }
}
