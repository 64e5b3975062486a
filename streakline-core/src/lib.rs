//! Streakline Core Engine
//!
//! Platform-agnostic analytics and merge engine for the Streakline daily
//! puzzle tracker. This crate provides duplicate-aware ingestion, streak
//! transitions, tiered achievement progress, leaderboard scoring, and sync
//! conflict resolution without UI, network, or storage dependencies.
//!
//! All operations are pure, synchronous transformations over an in-memory
//! snapshot. A [`Tracker`] is the single logical owner of one snapshot;
//! callers invoking it from several async contexts must serialize access
//! (an actor or a mutex), and every recomputation entry point is idempotent
//! so overlapping triggers can collapse into one pass.

pub mod achievement;
pub mod calendar;
pub mod game;
pub mod ingest;
pub mod leaderboard;
pub mod merge;
pub mod result;
pub mod streak;

// Re-export commonly used types
pub use achievement::{
    AchievementCategory, AchievementProgress, Tier, TierRequirement, TieredAchievement, UnlockSet,
    UnlockedTier, check_all_achievements,
};
pub use calendar::{date_int, days_between};
pub use game::{GameCatalog, GameDefinition, GameId, ScoreRange, ScoringModel, ValidationError};
pub use ingest::{DedupIndex, DedupKey};
pub use leaderboard::{
    DailyGameScore, LeaderboardRow, UserId, aggregate_rows, metric_label, points, scores_in_window,
};
pub use merge::{merge_achievements, merge_results, merge_unique_games};
pub use result::{ATTR_DIFFICULTY, ATTR_PUZZLE_NUMBER, GameResult};
pub use streak::{GameStreak, StreakTransition, normalize_missed_days, rebuild_streaks};

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// Everything one device persists and syncs: the result corpus, derived
/// streaks, achievement progress, and the auxiliary unique-games set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackerSnapshot {
    #[serde(default)]
    pub results: Vec<GameResult>,
    #[serde(default)]
    pub streaks: BTreeMap<GameId, GameStreak>,
    #[serde(default)]
    pub achievements: Vec<TieredAchievement>,
    #[serde(default)]
    pub unique_games: BTreeSet<GameId>,
}

impl TrackerSnapshot {
    /// Empty snapshot seeded with the default achievement set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            achievements: TieredAchievement::default_set(),
            ..Self::default()
        }
    }
}

/// Trait for abstracting snapshot persistence.
/// Platform-specific implementations should provide this.
pub trait ProgressStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist the full snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save(&self, snapshot: &TrackerSnapshot) -> Result<(), Self::Error>;

    /// Load the previously persisted snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load(&self) -> Result<Option<TrackerSnapshot>, Self::Error>;
}

/// Single logical owner of a tracker snapshot. Funnels every mutation and
/// recomputation through one place so independent async triggers (share
/// ingestion, day rollover, foreground refresh, post-sync merge) stay
/// serialized and collapse into idempotent passes.
#[derive(Debug, Clone)]
pub struct Tracker {
    catalog: GameCatalog,
    snapshot: TrackerSnapshot,
    index: DedupIndex,
    dirty: bool,
}

impl Tracker {
    #[must_use]
    pub fn new(catalog: GameCatalog) -> Self {
        Self::from_snapshot(catalog, TrackerSnapshot::new())
    }

    #[must_use]
    pub fn from_snapshot(catalog: GameCatalog, snapshot: TrackerSnapshot) -> Self {
        Self {
            catalog,
            snapshot,
            index: DedupIndex::new(),
            dirty: false,
        }
    }

    #[must_use]
    pub const fn snapshot(&self) -> &TrackerSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub const fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    /// Consume the tracker, returning the underlying snapshot.
    #[must_use]
    pub fn into_snapshot(self) -> TrackerSnapshot {
        self.snapshot
    }

    /// Structural validation for a candidate, applied before ingestion.
    ///
    /// # Errors
    ///
    /// Returns the validation failure for scores outside the game's declared
    /// range. Unknown games carry no range and always pass.
    pub fn validate(&self, candidate: &GameResult) -> Result<(), ValidationError> {
        match self.catalog.get(&candidate.game_id) {
            Some(game) => game.validate(candidate),
            None => Ok(()),
        }
    }

    /// Ingest one parsed or manually entered result. Returns `None` when the
    /// candidate is a duplicate; otherwise the streak transition fires and a
    /// full achievement pass runs, returning any newly unlocked tiers.
    pub fn log_result(&mut self, candidate: GameResult, now: DateTime<Utc>) -> Option<UnlockSet> {
        let new_result = candidate.clone();
        let accepted =
            self.index
                .add_result(candidate, &mut self.snapshot.results, &self.catalog);
        if !accepted {
            return None;
        }

        let game_id = new_result.game_id.clone();
        self.snapshot
            .streaks
            .entry(game_id.clone())
            .or_insert_with(|| GameStreak::new(&game_id))
            .apply_result(&new_result);

        let unlocked = check_all_achievements(
            Some(&new_result),
            &self.snapshot.results,
            &self.snapshot.streaks,
            &mut self.snapshot.achievements,
            &mut self.snapshot.unique_games,
            now,
        );
        self.dirty = false;
        Some(unlocked)
    }

    /// Flag the snapshot for recomputation without running it yet. Multiple
    /// triggers before the next [`Tracker::recompute_if_needed`] collapse
    /// into one pass.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Run one full achievement pass if anything flagged the snapshot since
    /// the last pass. Idempotent; a clean snapshot is untouched.
    pub fn recompute_if_needed(&mut self, now: DateTime<Utc>) -> UnlockSet {
        if !self.dirty {
            debug!("recompute skipped: snapshot clean");
            return UnlockSet::new();
        }
        self.dirty = false;
        check_all_achievements(
            None,
            &self.snapshot.results,
            &self.snapshot.streaks,
            &mut self.snapshot.achievements,
            &mut self.snapshot.unique_games,
            now,
        )
    }

    /// Day-rollover pass: lapse streaks with missed days up to and including
    /// `reference` (the most recent day expected to hold a completed
    /// result), then recompute achievements.
    pub fn day_rollover(&mut self, reference: NaiveDate, now: DateTime<Utc>) -> UnlockSet {
        normalize_missed_days(&mut self.snapshot.streaks, &self.snapshot.results, reference);
        self.mark_dirty();
        self.recompute_if_needed(now)
    }

    /// Reconcile a remote snapshot into this one after a sync pull. Results
    /// merge last-writer-wins, achievements merge monotonically, streaks are
    /// rebuilt from the merged corpus (keeping the best historical maximum
    /// from either side), and a full achievement pass runs.
    pub fn merge_remote(&mut self, remote: TrackerSnapshot, now: DateTime<Utc>) -> UnlockSet {
        let local = std::mem::take(&mut self.snapshot);
        let results = merge_results(local.results, remote.results);

        let mut streaks = rebuild_streaks(&results);
        for previous in local.streaks.values().chain(remote.streaks.values()) {
            if let Some(rebuilt) = streaks.get_mut(&previous.game_id) {
                // History pruned on either side must not lower the best run
                // or the lifetime totals.
                rebuilt.max_streak = rebuilt.max_streak.max(previous.max_streak);
                rebuilt.total_played = rebuilt.total_played.max(previous.total_played);
                rebuilt.total_completed = rebuilt.total_completed.max(previous.total_completed);
            }
        }

        self.snapshot = TrackerSnapshot {
            results,
            streaks,
            achievements: merge_achievements(local.achievements, remote.achievements),
            unique_games: merge_unique_games(&local.unique_games, &remote.unique_games),
        };
        self.index.invalidate();
        self.mark_dirty();
        self.recompute_if_needed(now)
    }

    /// Persist the snapshot through the provided store.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save<S: ProgressStore>(&self, store: &S) -> Result<(), S::Error> {
        store.save(&self.snapshot)
    }

    /// Load a tracker from the provided store, falling back to a fresh
    /// snapshot when nothing was persisted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to load.
    pub fn load<S: ProgressStore>(store: &S, catalog: GameCatalog) -> Result<Self, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let snapshot = store
            .load()
            .map_err(Into::into)?
            .unwrap_or_else(TrackerSnapshot::new);
        Ok(Self::from_snapshot(catalog, snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::cell::RefCell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStore {
        saved: Rc<RefCell<Option<TrackerSnapshot>>>,
    }

    impl ProgressStore for MemoryStore {
        type Error = Infallible;

        fn save(&self, snapshot: &TrackerSnapshot) -> Result<(), Self::Error> {
            *self.saved.borrow_mut() = Some(snapshot.clone());
            Ok(())
        }

        fn load(&self) -> Result<Option<TrackerSnapshot>, Self::Error> {
            Ok(self.saved.borrow().clone())
        }
    }

    fn at(day: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    #[test]
    fn tracker_roundtrips_through_store() {
        let store = MemoryStore::default();
        let mut tracker = Tracker::new(GameCatalog::empty());
        let added = tracker.log_result(
            GameResult::new("r1", "wordle", at(1)).completed(true),
            now(),
        );
        assert!(added.is_some());
        tracker.save(&store).unwrap();

        let loaded = Tracker::load(&store, GameCatalog::empty()).unwrap();
        assert_eq!(loaded.snapshot(), tracker.snapshot());
        assert_eq!(loaded.snapshot().results.len(), 1);
        assert_eq!(loaded.snapshot().streaks["wordle"].current_streak, 1);
    }

    #[test]
    fn load_without_saved_state_starts_fresh() {
        let store = MemoryStore::default();
        let tracker = Tracker::load(&store, GameCatalog::empty()).unwrap();
        assert!(tracker.snapshot().results.is_empty());
        assert_eq!(
            tracker.snapshot().achievements.len(),
            TieredAchievement::default_set().len()
        );
    }

    #[test]
    fn duplicate_log_returns_none_and_keeps_one_copy() {
        let mut tracker = Tracker::new(GameCatalog::empty());
        let result = GameResult::new("r1", "wordle", at(1)).completed(true);
        assert!(tracker.log_result(result.clone(), now()).is_some());
        assert!(tracker.log_result(result, now()).is_none());
        assert_eq!(tracker.snapshot().results.len(), 1);
    }

    #[test]
    fn overlapping_triggers_collapse_into_one_pass() {
        let mut tracker = Tracker::new(GameCatalog::empty());
        tracker.log_result(
            GameResult::new("r1", "wordle", at(1)).completed(true),
            now(),
        );

        tracker.mark_dirty();
        tracker.mark_dirty();
        let before = tracker.snapshot().clone();
        let unlocked = tracker.recompute_if_needed(now());
        assert!(unlocked.is_empty());
        assert_eq!(tracker.snapshot(), &before);

        // Clean snapshot: nothing runs, nothing changes.
        let unlocked = tracker.recompute_if_needed(now());
        assert!(unlocked.is_empty());
        assert_eq!(tracker.snapshot(), &before);
    }
}
