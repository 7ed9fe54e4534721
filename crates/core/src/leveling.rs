//! XP-to-level math.
//!
//! Levels grow geometrically: reaching level `n` (n ≥ 2) from `n - 1` costs
//! `floor(100 * 1.5^(n-1))` XP, so 1→2 costs 150, 2→3 costs 225, and so on.
//! Everyone starts at level 1 with 0 XP.

use chrono::{DateTime, Duration, Utc};

/// Levels that carry a milestone marker, ascending.
pub const MILESTONES: [u32; 8] = [5, 10, 15, 20, 25, 30, 40, 50];

/// Milestone reported once every entry in `MILESTONES` is behind the player.
pub const FINAL_MILESTONE: u32 = 100;

const REWARDS: [(u32, &str); 6] = [
    (5, "Speed Demon Badge"),
    (10, "Network Novice Title"),
    (15, "Protocol Pro Badge"),
    (20, "Master Networker Title"),
    (25, "Elite Hacker Badge"),
    (30, "Network Guru Title"),
];

/// XP needed to advance into `level` from the level below it. Level 1 is free.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn xp_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    let exponent = i32::try_from(level - 1).unwrap_or(i32::MAX);
    // Saturates to u64::MAX for absurd levels; float-to-int casts clamp.
    (100.0 * 1.5_f64.powi(exponent)).floor() as u64
}

/// Total XP accumulated on the way to `level`, starting from 0 at level 1.
#[must_use]
pub fn cumulative_xp_for_level(level: u32) -> u64 {
    (1..=level).fold(0_u64, |acc, l| acc.saturating_add(xp_for_level(l)))
}

/// Display data for a cumulative XP total.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    pub total_xp: u64,
    pub level: u32,
    /// XP earned since reaching `level`.
    pub xp_into_level: u64,
    /// Cost of the next level up.
    pub xp_for_next_level: u64,
    pub total_xp_for_current_level: u64,
    /// In `[0, 100)`.
    pub progress_percentage: f64,
}

/// Compute the level for `total_xp`. Runs in O(level).
#[must_use]
pub fn level_info(total_xp: u64) -> LevelInfo {
    let mut level = 1_u32;
    let mut remaining = total_xp;
    loop {
        let next = xp_for_level(level.saturating_add(1));
        if remaining >= next && level < u32::MAX {
            remaining -= next;
            level += 1;
        } else {
            break;
        }
    }

    let xp_for_next_level = xp_for_level(level.saturating_add(1));
    #[allow(clippy::cast_precision_loss)]
    let progress_percentage = remaining as f64 / xp_for_next_level as f64 * 100.0;

    LevelInfo {
        total_xp,
        level,
        xp_into_level: remaining,
        xp_for_next_level,
        total_xp_for_current_level: cumulative_xp_for_level(level),
        progress_percentage,
    }
}

/// Reward unlocked on reaching `level`, if any.
#[must_use]
pub fn reward_for_level(level: u32) -> Option<&'static str> {
    REWARDS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, reward)| *reward)
}

/// The next milestone level and the XP still needed to get there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub level: u32,
    pub xp_needed: u64,
}

#[must_use]
pub fn next_milestone(info: &LevelInfo) -> Milestone {
    let level = MILESTONES
        .iter()
        .copied()
        .find(|m| *m > info.level)
        .unwrap_or(FINAL_MILESTONE);

    let ahead = (info.level.saturating_add(1)..=level)
        .fold(0_u64, |acc, l| acc.saturating_add(xp_for_level(l)));

    Milestone {
        level,
        xp_needed: ahead.saturating_sub(info.xp_into_level),
    }
}

//
// ─── LEVEL-UP NOTIFICATION ─────────────────────────────────────────────────────
//

/// One-shot, non-persisted notice that the player reached a new level.
///
/// Goes inactive once `expires_at` passes or after `dismiss`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u32,
    pub reward: Option<&'static str>,
    pub expires_at: DateTime<Utc>,
    dismissed: bool,
}

impl LevelUp {
    #[must_use]
    pub fn new(new_level: u32, now: DateTime<Utc>, display_for: Duration) -> Self {
        Self {
            new_level,
            reward: reward_for_level(new_level),
            expires_at: now + display_for,
            dismissed: false,
        }
    }

    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.dismissed && now < self.expires_at
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

/// Emit a `LevelUp` when `info` is above the previously cached level.
#[must_use]
pub fn detect_level_up(
    cached_level: u32,
    info: &LevelInfo,
    now: DateTime<Utc>,
    display_for: Duration,
) -> Option<LevelUp> {
    (info.level > cached_level).then(|| LevelUp::new(info.level, now, display_for))
}
