use chrono::Duration;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::leveling::{LevelInfo, LevelUp, Milestone, detect_level_up, level_info, next_milestone};
use quiz_core::scoring::xp_for_score;
use storage::xp::{XpState, XpStore};

use crate::error::XpServiceError;

/// Result of adding XP.
#[derive(Debug, Clone, PartialEq)]
pub struct XpAward {
    pub xp_gained: u64,
    pub info: LevelInfo,
    /// Set when the new total crosses into a level above the cached one.
    pub level_up: Option<LevelUp>,
}

/// Cumulative XP bookkeeping on top of `XpStore`.
#[derive(Clone)]
pub struct XpService {
    clock: Clock,
    xp: Arc<XpStore>,
    level_up_display: Duration,
}

impl XpService {
    #[must_use]
    pub fn new(clock: Clock, xp: Arc<XpStore>) -> Self {
        Self {
            clock,
            xp,
            level_up_display: Duration::seconds(5),
        }
    }

    /// How long a level-up notification stays active.
    #[must_use]
    pub fn with_level_up_display(mut self, display_for: Duration) -> Self {
        self.level_up_display = display_for;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Credit a finished session: a tenth of its score, rounded.
    ///
    /// # Errors
    ///
    /// Returns `XpServiceError::Storage` if XP cannot be read or written.
    pub async fn award_session(&self, total_score: u32) -> Result<XpAward, XpServiceError> {
        self.add_xp(xp_for_score(total_score)).await
    }

    /// Add `amount` XP, persist the total and the recomputed level.
    ///
    /// # Errors
    ///
    /// Returns `XpServiceError::Storage` if XP cannot be read or written.
    pub async fn add_xp(&self, amount: u64) -> Result<XpAward, XpServiceError> {
        let state = self.xp.load().await?;
        let total_xp = state.total_xp.saturating_add(amount);
        let info = level_info(total_xp);
        let level_up = detect_level_up(
            state.cached_level,
            &info,
            self.clock.now(),
            self.level_up_display,
        );

        self.xp
            .save(XpState {
                total_xp,
                cached_level: info.level,
            })
            .await?;

        if let Some(up) = &level_up {
            tracing::info!(
                level = up.new_level,
                reward = up.reward.unwrap_or("none"),
                total_xp,
                "level up"
            );
        }

        Ok(XpAward {
            xp_gained: amount,
            info,
            level_up,
        })
    }

    /// Level display data for the stored XP total.
    ///
    /// Rewrites the cached level if it disagrees with the computed one.
    ///
    /// # Errors
    ///
    /// Returns `XpServiceError::Storage` if XP cannot be read or written.
    pub async fn current(&self) -> Result<LevelInfo, XpServiceError> {
        let state = self.xp.load().await?;
        let info = level_info(state.total_xp);
        if info.level != state.cached_level {
            tracing::debug!(
                cached = state.cached_level,
                computed = info.level,
                "resyncing cached level"
            );
            self.xp.save_cached_level(info.level).await?;
        }
        Ok(info)
    }

    /// # Errors
    ///
    /// Returns `XpServiceError::Storage` if XP cannot be read or written.
    pub async fn next_milestone(&self) -> Result<Milestone, XpServiceError> {
        Ok(next_milestone(&self.current().await?))
    }
}
