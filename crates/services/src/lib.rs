#![forbid(unsafe_code)]

pub mod app_services;
pub mod bookmark_service;
pub mod error;
pub mod feedback;
pub mod sessions;
pub mod xp_service;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use bookmark_service::BookmarkService;
pub use error::{AppServicesError, SessionError, XpServiceError};
pub use feedback::{FeedbackSink, NoopFeedback};
pub use xp_service::{XpAward, XpService};

pub use sessions::{
    AnswerFeedback, QuizLoopService, QuizSession, SessionEnd, SessionOutcome, SessionPhase,
    SessionProgress, SessionStep, Termination,
};
