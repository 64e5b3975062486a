//! Per-game streak state machine and missed-day normalization.
//!
//! A streak counts consecutive calendar days with a completed result for a
//! single game. Transitions fire once per accepted result; normalization
//! reconciles streak state with reality when days pass without any result
//! arriving (app reopened after a quiet week, day rollover, post-sync).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::game::GameId;
use crate::result::GameResult;

/// Outcome of applying one accepted result to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// First play ever, or a fresh start after a gap.
    Started,
    /// Played exactly one day after the previous play.
    Extended,
    /// Same-day replay or out-of-order backfill; streak fields untouched.
    Unchanged,
    /// A failed result ended the active streak.
    Broken,
}

/// Running streak state for one game.
///
/// Invariants: `current_streak >= 0` (by type), `max_streak >= current_streak`,
/// `total_completed <= total_played`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStreak {
    pub game_id: GameId,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub max_streak: u32,
    #[serde(default)]
    pub total_played: u32,
    #[serde(default)]
    pub total_completed: u32,
    #[serde(default)]
    pub last_played: Option<NaiveDate>,
    #[serde(default)]
    pub streak_start: Option<NaiveDate>,
}

impl GameStreak {
    #[must_use]
    pub fn new(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            current_streak: 0,
            max_streak: 0,
            total_played: 0,
            total_completed: 0,
            last_played: None,
            streak_start: None,
        }
    }

    /// Apply one accepted result. Totals always move; the streak counter
    /// follows the calendar transition rules.
    pub fn apply_result(&mut self, result: &GameResult) -> StreakTransition {
        let day = result.day();
        self.total_played = self.total_played.saturating_add(1);

        let transition = if result.completed {
            self.total_completed = self.total_completed.saturating_add(1);
            self.apply_completed_day(day)
        } else {
            self.break_streak();
            StreakTransition::Broken
        };

        self.last_played = Some(self.last_played.map_or(day, |last| last.max(day)));
        self.max_streak = self.max_streak.max(self.current_streak);
        transition
    }

    fn apply_completed_day(&mut self, day: NaiveDate) -> StreakTransition {
        match self.last_played {
            None => {
                self.current_streak = 1;
                self.streak_start = Some(day);
                StreakTransition::Started
            }
            Some(last) if calendar::is_next_day(last, day) => {
                self.current_streak = self.current_streak.saturating_add(1);
                if self.current_streak == 1 {
                    self.streak_start = Some(day);
                }
                StreakTransition::Extended
            }
            // Same-day replay and out-of-order backfill leave the counter
            // alone so replays stay idempotent.
            Some(last) if calendar::days_between(last, day) <= 0 => StreakTransition::Unchanged,
            Some(_) => {
                self.current_streak = 1;
                self.streak_start = Some(day);
                StreakTransition::Started
            }
        }
    }

    /// A failed result zeroes the running streak; the best streak survives.
    fn break_streak(&mut self) {
        self.current_streak = 0;
        self.streak_start = None;
    }
}

/// Rebuild streak state from scratch by replaying a corpus in play order.
/// Used after a sync merge, when per-result transitions may have fired on
/// another device.
#[must_use]
pub fn rebuild_streaks(results: &[GameResult]) -> BTreeMap<GameId, GameStreak> {
    let mut by_game: HashMap<&str, Vec<&GameResult>> = HashMap::new();
    for result in results {
        by_game.entry(&result.game_id).or_default().push(result);
    }

    let mut streaks = BTreeMap::new();
    for (game_id, mut game_results) in by_game {
        game_results.sort_by_key(|result| result.played_at);
        let mut streak = GameStreak::new(game_id);
        for result in game_results {
            streak.apply_result(result);
        }
        streaks.insert(game_id.to_string(), streak);
    }
    streaks
}

/// Zero out any active streak whose run has a missed day between the last
/// played date (exclusive) and `reference` (inclusive).
///
/// `reference` should be the most recent day expected to already hold a
/// completed result; a rollover pass at the start of a new day passes the
/// previous day. Idempotent: a second pass from the same state changes
/// nothing, so overlapping triggers can safely collapse.
pub fn normalize_missed_days(
    streaks: &mut BTreeMap<GameId, GameStreak>,
    results: &[GameResult],
    reference: NaiveDate,
) {
    let mut completed_days: HashMap<&str, BTreeSet<NaiveDate>> = HashMap::new();
    for result in results.iter().filter(|result| result.completed) {
        completed_days
            .entry(&result.game_id)
            .or_default()
            .insert(result.day());
    }
    let empty = BTreeSet::new();

    for streak in streaks.values_mut() {
        if streak.current_streak == 0 {
            continue;
        }
        let Some(last) = streak.last_played else {
            continue;
        };
        let days = completed_days
            .get(streak.game_id.as_str())
            .unwrap_or(&empty);
        if calendar::gap_in_interval(days, last, reference) {
            info!(
                "streak for {} lapsed: missed day between {} and {}",
                streak.game_id, last, reference
            );
            streak.break_streak();
        }
    }
}
