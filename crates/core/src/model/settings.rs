use chrono::Duration;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("max lives must be > 0")]
    InvalidMaxLives,

    #[error("score history limit must be > 0")]
    InvalidScoreHistoryLimit,

    #[error("question time limit must be between 5 and 600 seconds")]
    InvalidQuestionTimeLimit,

    #[error("level-up display window must be > 0 seconds")]
    InvalidLevelUpDisplay,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables for a quiz run.
///
/// Defaults reproduce the classic game: three lives, a top-10 score board,
/// no per-question countdown and a five second level-up banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    max_lives: u32,
    score_history_limit: usize,
    question_time_limit_secs: Option<u32>,
    level_up_display_secs: u32,
    sound_enabled: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            max_lives: 3,
            score_history_limit: 10,
            question_time_limit_secs: None,
            level_up_display_secs: 5,
            sound_enabled: true,
        }
    }
}

impl QuizSettings {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if lives or history limit are zero, the countdown is
    /// outside 5..=600 seconds, or the level-up window is zero.
    pub fn new(
        max_lives: u32,
        score_history_limit: usize,
        question_time_limit_secs: Option<u32>,
        level_up_display_secs: u32,
        sound_enabled: bool,
    ) -> Result<Self, SettingsError> {
        if max_lives == 0 {
            return Err(SettingsError::InvalidMaxLives);
        }
        if score_history_limit == 0 {
            return Err(SettingsError::InvalidScoreHistoryLimit);
        }
        if let Some(limit) = question_time_limit_secs {
            if !(5..=600).contains(&limit) {
                return Err(SettingsError::InvalidQuestionTimeLimit);
            }
        }
        if level_up_display_secs == 0 {
            return Err(SettingsError::InvalidLevelUpDisplay);
        }

        Ok(Self {
            max_lives,
            score_history_limit,
            question_time_limit_secs,
            level_up_display_secs,
            sound_enabled,
        })
    }

    /// Returns a copy with a different life count.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidMaxLives` for zero.
    pub fn with_max_lives(self, max_lives: u32) -> Result<Self, SettingsError> {
        Self::new(
            max_lives,
            self.score_history_limit,
            self.question_time_limit_secs,
            self.level_up_display_secs,
            self.sound_enabled,
        )
    }

    /// Returns a copy with the per-question countdown set (or removed with `None`).
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidQuestionTimeLimit` if outside 5..=600 seconds.
    pub fn with_question_time_limit(self, secs: Option<u32>) -> Result<Self, SettingsError> {
        Self::new(
            self.max_lives,
            self.score_history_limit,
            secs,
            self.level_up_display_secs,
            self.sound_enabled,
        )
    }

    #[must_use]
    pub fn with_sound(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }

    #[must_use]
    pub fn max_lives(&self) -> u32 {
        self.max_lives
    }

    #[must_use]
    pub fn score_history_limit(&self) -> usize {
        self.score_history_limit
    }

    #[must_use]
    pub fn question_time_limit_secs(&self) -> Option<u32> {
        self.question_time_limit_secs
    }

    #[must_use]
    pub fn question_time_limit(&self) -> Option<Duration> {
        self.question_time_limit_secs
            .map(|secs| Duration::seconds(i64::from(secs)))
    }

    #[must_use]
    pub fn level_up_display(&self) -> Duration {
        Duration::seconds(i64::from(self.level_up_display_secs))
    }

    #[must_use]
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_game() {
        let s = QuizSettings::default();
        assert_eq!(s.max_lives(), 3);
        assert_eq!(s.score_history_limit(), 10);
        assert!(s.question_time_limit().is_none());
        assert_eq!(s.level_up_display(), Duration::seconds(5));
        assert!(s.sound_enabled());
    }

    #[test]
    fn rejects_zero_lives_and_history() {
        assert_eq!(
            QuizSettings::new(0, 10, None, 5, true).unwrap_err(),
            SettingsError::InvalidMaxLives
        );
        assert_eq!(
            QuizSettings::new(3, 0, None, 5, true).unwrap_err(),
            SettingsError::InvalidScoreHistoryLimit
        );
    }

    #[test]
    fn countdown_bounds() {
        let base = QuizSettings::default();
        assert!(base.clone().with_question_time_limit(Some(60)).is_ok());
        assert_eq!(
            base.clone().with_question_time_limit(Some(4)).unwrap_err(),
            SettingsError::InvalidQuestionTimeLimit
        );
        assert_eq!(
            base.with_question_time_limit(Some(601)).unwrap_err(),
            SettingsError::InvalidQuestionTimeLimit
        );
    }
}
