use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use quiz_core::model::{Difficulty, OptionKey, Question, QuestionDraft, QuestionId, QuizSettings};
use quiz_core::time::fixed_now;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{Clock, QuizLoopService, SessionError, SessionStep, Termination, XpService};
use storage::repository::{KeyValueStore, Storage, StorageError};

fn build_question(id: u64) -> Question {
    QuestionDraft {
        id: QuestionId::new(id),
        prompt: format!("Question {id}"),
        options: BTreeMap::from([
            (OptionKey::A, "Physical".into()),
            (OptionKey::B, "Transport".into()),
            (OptionKey::C, "Network".into()),
            (OptionKey::D, "Session".into()),
        ]),
        correct: OptionKey::B,
        explanation: "End-to-end delivery is a transport concern.".into(),
        category: "Transport Layer".into(),
        difficulty: Difficulty::Medium,
    }
    .validate()
    .unwrap()
}

fn loop_service(storage: &Storage, clock: Clock) -> QuizLoopService {
    let xp = Arc::new(XpService::new(clock, Arc::clone(&storage.xp)));
    QuizLoopService::new(
        clock,
        QuizSettings::default(),
        Arc::clone(&storage.progress),
        xp,
    )
}

#[tokio::test]
async fn three_correct_answers_in_four_seconds_each() {
    let storage = Storage::in_memory();
    let questions: Vec<Question> = (1..=3).map(build_question).collect();
    let start = fixed_now();

    let mut session = loop_service(&storage, Clock::fixed(start))
        .start_session(&questions)
        .await
        .unwrap();

    let mut t = start;
    let end = loop {
        t += Duration::seconds(4);
        let svc = loop_service(&storage, Clock::fixed(t));
        let feedback = svc
            .answer_current(&mut session, Some(OptionKey::B))
            .await
            .unwrap();
        assert_eq!(feedback.record.points, 100);
        if let SessionStep::Ended(end) = svc.next(&mut session).await.unwrap() {
            break end;
        }
    };

    assert_eq!(end.outcome.score.total_score(), 300);
    assert_eq!(end.outcome.score.accuracy_percent(), 100);
    assert_eq!(end.outcome.termination, Termination::CompletedAll);
    assert!(end.outcome.is_perfect());
    assert_eq!(end.award.xp_gained, 30);

    let board = storage.progress.scores().await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].total_score(), 300);
    assert_eq!(board[0].elapsed_secs(), 12);
}

#[tokio::test]
async fn three_misses_end_the_session_with_questions_left() {
    let storage = Storage::in_memory();
    let questions: Vec<Question> = (1..=10).map(build_question).collect();
    let svc = loop_service(&storage, Clock::fixed(fixed_now()));

    let mut session = svc.start_session(&questions).await.unwrap();
    let end = loop {
        svc.answer_current(&mut session, Some(OptionKey::A))
            .await
            .unwrap();
        if let SessionStep::Ended(end) = svc.next(&mut session).await.unwrap() {
            break end;
        }
    };

    assert_eq!(session.answered_count(), 3);
    assert_eq!(session.lives(), 0);
    assert_eq!(end.outcome.score.answered_count(), 3);
    assert_eq!(end.outcome.termination, Termination::ExhaustedLives);
    assert!(matches!(
        svc.answer_current(&mut session, Some(OptionKey::B)).await,
        Err(SessionError::AlreadyEnded)
    ));
}

#[tokio::test]
async fn seen_questions_are_placed_after_unseen_ones() {
    let storage = Storage::in_memory();
    let questions: Vec<Question> = (1..=6).map(build_question).collect();
    let svc = loop_service(&storage, Clock::fixed(fixed_now()));

    storage.progress.mark_seen(QuestionId::new(2)).await.unwrap();
    storage.progress.mark_seen(QuestionId::new(5)).await.unwrap();

    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let session = svc
            .start_session_with_rng(&questions, &mut rng)
            .await
            .unwrap();
        let order: Vec<u64> = session.questions().iter().map(|q| q.id().value()).collect();
        let tail = &order[4..];
        assert!(tail.contains(&2) && tail.contains(&5), "order {order:?}");
    }
}

#[tokio::test]
async fn countdown_expiry_counts_as_a_miss() {
    let storage = Storage::in_memory();
    let start = fixed_now();
    let settings = QuizSettings::default()
        .with_question_time_limit(Some(60))
        .unwrap();
    let xp = Arc::new(XpService::new(Clock::fixed(start), Arc::clone(&storage.xp)));
    let svc = QuizLoopService::new(
        Clock::fixed(start),
        settings,
        Arc::clone(&storage.progress),
        xp,
    );

    let mut session = svc.start_session(&[build_question(1)]).await.unwrap();
    assert!(svc.expire_if_due(&mut session).await.unwrap().is_none());

    let late = svc.clone().with_clock(Clock::fixed(start + Duration::seconds(60)));
    let feedback = late.expire_if_due(&mut session).await.unwrap().unwrap();
    assert!(feedback.record.was_skipped());
    assert_eq!(feedback.lives_left, 2);
    assert!(
        storage
            .progress
            .seen()
            .await
            .unwrap()
            .contains(&QuestionId::new(1))
    );
}

#[tokio::test]
async fn abandoned_session_leaves_history_untouched() {
    let storage = Storage::in_memory();
    let svc = loop_service(&storage, Clock::fixed(fixed_now()));

    let mut session = svc
        .start_session(&[build_question(1), build_question(2)])
        .await
        .unwrap();
    svc.answer_current(&mut session, Some(OptionKey::B))
        .await
        .unwrap();
    svc.abandon(&mut session);

    assert!(storage.progress.scores().await.unwrap().is_empty());
    assert_eq!(storage.xp.load().await.unwrap().total_xp, 0);
}

struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }
}

#[tokio::test]
async fn write_failures_surface_as_storage_errors() {
    let storage = Storage::over(Arc::new(ReadOnlyStore));
    let svc = loop_service(&storage, Clock::fixed(fixed_now()));

    let mut session = svc.start_session(&[build_question(1)]).await.unwrap();
    let err = svc
        .answer_current(&mut session, Some(OptionKey::B))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
}
