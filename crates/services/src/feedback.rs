//! Presentation cues emitted by the session loop.
//!
//! Sound, haptics and visual effects live outside the engine; they plug in
//! through `FeedbackSink`. Cues are only sent while sound is enabled.

use std::sync::Arc;

/// Receiver for engine cues. Every method defaults to doing nothing.
pub trait FeedbackSink: Send + Sync {
    /// A session started or the player moved to the next question.
    fn click(&self) {}
    /// The last answer was correct.
    fn success(&self) {}
    /// The last answer was wrong, skipped or timed out.
    fn failure(&self) {}
    /// The session ended because lives ran out.
    fn game_over(&self) {}
    /// The session ended with lives to spare.
    fn level_complete(&self) {}
    /// Cumulative XP crossed into a new level.
    fn level_up(&self, _new_level: u32) {}
}

/// Sink that ignores every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {}

#[must_use]
pub fn noop_feedback() -> Arc<dyn FeedbackSink> {
    Arc::new(NoopFeedback)
}
