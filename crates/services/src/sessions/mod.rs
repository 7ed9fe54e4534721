mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionBuilder, SessionPlan};
pub use progress::SessionProgress;
pub use service::{AnswerFeedback, NextStep, QuizSession, SessionPhase};
pub use view::{SessionOutcome, Termination};
pub use workflow::{QuizLoopService, SessionEnd, SessionStep};
