//! Tiered achievement progress, recomputed from the full result corpus.
//!
//! Every category recomputation is monotonic: the stored value only moves
//! up, no matter how the corpus got there, so re-running a check over an
//! unchanged corpus is a no-op and historical pruning never demotes a
//! badge the player already earned.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::EnumIter;

use crate::calendar;
use crate::game::GameId;
use crate::result::GameResult;
use crate::streak::GameStreak;

/// Hours strictly below this bound count toward night owl play.
pub const NIGHT_OWL_END_HOUR: u32 = 4;
/// Hours in `NIGHT_OWL_END_HOUR..EARLY_BIRD_END_HOUR` count toward early
/// bird play; the two windows never overlap.
pub const EARLY_BIRD_END_HOUR: u32 = 8;
/// Minimum gap, in days, between consecutive plays of a game for the return
/// to count as a comeback.
pub const COMEBACK_GAP_DAYS: i64 = 4;

/// Ordered achievement levels. Ordering is rank order, used directly by the
/// merge resolver's tie-breaks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Legendary,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Bronze => write!(f, "bronze"),
            Tier::Silver => write!(f, "silver"),
            Tier::Gold => write!(f, "gold"),
            Tier::Legendary => write!(f, "legendary"),
        }
    }
}

/// What a category measures over the corpus.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "camelCase")]
pub enum AchievementCategory {
    /// Current streak length of the affected game.
    StreakMaster,
    /// Total results ever logged.
    GameCollector,
    /// Longest consecutive-day run (any game) ending at the latest play day.
    DailyDevotee,
    /// Distinct games ever played, backed by a persisted auxiliary set.
    VarietyPlayer,
    /// Completed results.
    Perfectionist,
    /// Results played in the early morning window.
    EarlyBird,
    /// Results played in the late-night window.
    NightOwl,
    /// Distinct calendar days with at least one result.
    MarathonRunner,
    /// Returns to a game after a multi-day gap.
    ComebackChampion,
}

/// A single unlockable level within an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRequirement {
    pub tier: Tier,
    pub threshold: u32,
}

/// Mutable progress attached to an achievement. `current_value` is
/// monotonically non-decreasing across recomputations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgress {
    #[serde(default)]
    pub current_value: u32,
    #[serde(default)]
    pub current_tier: Option<Tier>,
    #[serde(default)]
    pub tier_unlock_dates: BTreeMap<Tier, DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl Default for AchievementProgress {
    fn default() -> Self {
        Self {
            current_value: 0,
            current_tier: None,
            tier_unlock_dates: BTreeMap::new(),
            last_updated: DateTime::UNIX_EPOCH,
        }
    }
}

/// An achievement definition plus its progress state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredAchievement {
    pub id: String,
    pub category: AchievementCategory,
    /// Strictly increasing thresholds, lowest tier first.
    pub requirements: Vec<TierRequirement>,
    #[serde(default)]
    pub progress: AchievementProgress,
}

impl TieredAchievement {
    #[must_use]
    pub fn new(id: &str, category: AchievementCategory, requirements: Vec<TierRequirement>) -> Self {
        debug_assert!(
            requirements
                .windows(2)
                .all(|pair| pair[0].threshold < pair[1].threshold && pair[0].tier < pair[1].tier),
            "tier requirements must be strictly increasing"
        );
        Self {
            id: id.to_string(),
            category,
            requirements,
            progress: AchievementProgress::default(),
        }
    }

    /// Highest tier whose threshold is within `value`, if any.
    #[must_use]
    pub fn tier_for_value(&self, value: u32) -> Option<Tier> {
        self.requirements
            .iter()
            .filter(|req| req.threshold <= value)
            .map(|req| req.tier)
            .max()
    }

    /// Fraction of the way from the current tier's threshold to the next
    /// one, clamped to `0.0..=1.0`. At the maximum tier there is nothing
    /// left to progress toward, so this returns `0.0`.
    #[must_use]
    pub fn percentage_to_next_tier(&self) -> f32 {
        let value = self.progress.current_value;
        let low = self
            .progress
            .current_tier
            .and_then(|tier| {
                self.requirements
                    .iter()
                    .find(|req| req.tier == tier)
                    .map(|req| req.threshold)
            })
            .unwrap_or(0);
        let next = self
            .requirements
            .iter()
            .find(|req| self.progress.current_tier.is_none_or(|tier| req.tier > tier));
        let Some(next) = next else {
            return 0.0;
        };
        let span = next.threshold.saturating_sub(low);
        if span == 0 {
            return 0.0;
        }
        let gained = value.saturating_sub(low) as f32;
        (gained / span as f32).clamp(0.0, 1.0)
    }

    /// The default achievement set the app ships with.
    #[must_use]
    pub fn default_set() -> Vec<Self> {
        use AchievementCategory as Cat;
        let tiers = |thresholds: [u32; 4]| {
            vec![
                TierRequirement { tier: Tier::Bronze, threshold: thresholds[0] },
                TierRequirement { tier: Tier::Silver, threshold: thresholds[1] },
                TierRequirement { tier: Tier::Gold, threshold: thresholds[2] },
                TierRequirement { tier: Tier::Legendary, threshold: thresholds[3] },
            ]
        };
        vec![
            Self::new("streak_master", Cat::StreakMaster, tiers([3, 7, 30, 100])),
            Self::new("game_collector", Cat::GameCollector, tiers([10, 50, 250, 1000])),
            Self::new("daily_devotee", Cat::DailyDevotee, tiers([5, 15, 50, 150])),
            Self::new("variety_player", Cat::VarietyPlayer, tiers([3, 5, 10, 20])),
            Self::new("perfectionist", Cat::Perfectionist, tiers([10, 50, 200, 500])),
            Self::new("early_bird", Cat::EarlyBird, tiers([5, 25, 100, 250])),
            Self::new("night_owl", Cat::NightOwl, tiers([5, 25, 100, 250])),
            Self::new("marathon_runner", Cat::MarathonRunner, tiers([7, 30, 100, 365])),
            Self::new("comeback_champion", Cat::ComebackChampion, tiers([1, 5, 15, 50])),
        ]
    }
}

/// A newly crossed tier, reported back to the caller for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedTier {
    pub achievement_id: String,
    pub category: AchievementCategory,
    pub tier: Tier,
}

/// Newly unlocked tiers from one recomputation pass. Almost always empty or
/// a single entry.
pub type UnlockSet = SmallVec<[UnlockedTier; 4]>;

/// Recompute every achievement from the full corpus, clamp progress to its
/// stored maximum, stamp unlock dates, and report newly crossed tiers.
///
/// `new_result` is the result that triggered the pass, when there is one;
/// full recomputes (rollover, post-merge) pass `None`. `unique_games` is the
/// persisted auxiliary set backing `VarietyPlayer` and is unioned in place so
/// the count never shrinks when history is pruned.
pub fn check_all_achievements(
    new_result: Option<&GameResult>,
    results: &[GameResult],
    streaks: &BTreeMap<GameId, GameStreak>,
    achievements: &mut [TieredAchievement],
    unique_games: &mut BTreeSet<GameId>,
    now: DateTime<Utc>,
) -> UnlockSet {
    for result in results {
        unique_games.insert(result.game_id.clone());
    }
    let metrics = CorpusMetrics::collect(results, streaks, new_result, unique_games);

    let mut unlocked = UnlockSet::new();
    for achievement in achievements.iter_mut() {
        let computed = metrics.value_for(achievement.category);
        let progress = &mut achievement.progress;
        let clamped = progress.current_value.max(computed);
        if clamped != progress.current_value {
            progress.current_value = clamped;
            progress.last_updated = now;
        }

        let new_tier = achievement.tier_for_value(clamped);
        if new_tier <= achievement.progress.current_tier {
            continue;
        }
        let old_tier = achievement.progress.current_tier;
        for req in &achievement.requirements {
            let crossed = old_tier.is_none_or(|tier| req.tier > tier)
                && new_tier.is_some_and(|tier| req.tier <= tier);
            if !crossed {
                continue;
            }
            achievement
                .progress
                .tier_unlock_dates
                .entry(req.tier)
                .or_insert(now);
            info!(
                "achievement {} unlocked {} at value {}",
                achievement.id, req.tier, clamped
            );
            unlocked.push(UnlockedTier {
                achievement_id: achievement.id.clone(),
                category: achievement.category,
                tier: req.tier,
            });
        }
        achievement.progress.current_tier = new_tier;
        achievement.progress.last_updated = now;
    }
    unlocked
}

/// One pass over the corpus, shared by every category.
struct CorpusMetrics {
    total_results: u32,
    completed_results: u32,
    early_bird: u32,
    night_owl: u32,
    distinct_days: u32,
    longest_recent_run: u32,
    comebacks: u32,
    unique_games: u32,
    streak_value: u32,
}

impl CorpusMetrics {
    fn collect(
        results: &[GameResult],
        streaks: &BTreeMap<GameId, GameStreak>,
        new_result: Option<&GameResult>,
        unique_games: &BTreeSet<GameId>,
    ) -> Self {
        let mut all_days: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut days_per_game: HashMap<&str, BTreeSet<NaiveDate>> = HashMap::new();
        let mut completed_results = 0u32;
        let mut early_bird = 0u32;
        let mut night_owl = 0u32;

        for result in results {
            all_days.insert(result.day());
            days_per_game
                .entry(&result.game_id)
                .or_default()
                .insert(result.day());
            if result.completed {
                completed_results += 1;
            }
            let hour = result.hour();
            if hour < NIGHT_OWL_END_HOUR {
                night_owl += 1;
            } else if hour < EARLY_BIRD_END_HOUR {
                early_bird += 1;
            }
        }

        let longest_recent_run = all_days
            .iter()
            .next_back()
            .map_or(0, |latest| calendar::run_ending_at(&all_days, *latest));

        let comebacks = days_per_game
            .values()
            .map(|days| {
                days.iter()
                    .zip(days.iter().skip(1))
                    .filter(|(prev, next)| calendar::days_between(**prev, **next) >= COMEBACK_GAP_DAYS)
                    .count() as u32
            })
            .sum();

        let streak_value = match new_result {
            Some(result) => streaks
                .get(&result.game_id)
                .map_or(0, |streak| streak.current_streak),
            None => streaks
                .values()
                .map(|streak| streak.current_streak)
                .max()
                .unwrap_or(0),
        };

        Self {
            total_results: results.len() as u32,
            completed_results,
            early_bird,
            night_owl,
            distinct_days: all_days.len() as u32,
            longest_recent_run,
            comebacks,
            unique_games: unique_games.len() as u32,
            streak_value,
        }
    }

    const fn value_for(&self, category: AchievementCategory) -> u32 {
        match category {
            AchievementCategory::StreakMaster => self.streak_value,
            AchievementCategory::GameCollector => self.total_results,
            AchievementCategory::DailyDevotee => self.longest_recent_run,
            AchievementCategory::VarietyPlayer => self.unique_games,
            AchievementCategory::Perfectionist => self.completed_results,
            AchievementCategory::EarlyBird => self.early_bird,
            AchievementCategory::NightOwl => self.night_owl,
            AchievementCategory::MarathonRunner => self.distinct_days,
            AchievementCategory::ComebackChampion => self.comebacks,
        }
    }
}
