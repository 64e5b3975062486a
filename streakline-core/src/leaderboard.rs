//! Cross-game score normalization and leaderboard aggregation.
//!
//! Every game's raw score lands on one comparable points scale (roughly
//! 1..=7, hint-based games may exceed it) so totals can be summed across
//! games. Rows are always derived from a window of daily scores, never
//! persisted on their own.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::game::{GameCatalog, GameDefinition, GameId, ScoringModel};
use crate::result::GameResult;
use crate::streak::GameStreak;

/// Identifier of a player on the social layer.
pub type UserId = String;

/// Attempts assumed when no game metadata is available.
const DEFAULT_MAX_ATTEMPTS: u32 = 6;
/// Width of one elapsed-time scoring bucket, in seconds.
const TIME_BUCKET_SECONDS: u32 = 30;
/// Points awarded for the fastest elapsed-time bucket.
const TIME_BUCKET_TOP_POINTS: u32 = 7;

/// One player's published score for one game on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyGameScore {
    /// Composite id `userId|dateInt|gameId`.
    pub id: String,
    pub user_id: UserId,
    /// UTC date as a `yyyymmdd` integer.
    pub date_int: u32,
    pub game_id: GameId,
    #[serde(default)]
    pub score: Option<u32>,
    pub max_attempts: u32,
    #[serde(default)]
    pub completed: bool,
    /// Streak length at publish time, for display next to the row.
    #[serde(default)]
    pub streak: Option<u32>,
}

impl DailyGameScore {
    #[must_use]
    pub fn composite_id(user_id: &str, date_int: u32, game_id: &str) -> String {
        format!("{user_id}|{date_int}|{game_id}")
    }

    /// Build the published form of a logged result.
    #[must_use]
    pub fn from_result(user_id: &str, result: &GameResult, streak: Option<&GameStreak>) -> Self {
        let date_int = calendar::date_int(result.day());
        Self {
            id: Self::composite_id(user_id, date_int, &result.game_id),
            user_id: user_id.to_string(),
            date_int,
            game_id: result.game_id.clone(),
            score: result.score,
            max_attempts: result.max_attempts,
            completed: result.completed,
            streak: streak.map(|streak| streak.current_streak),
        }
    }
}

/// Normalize one daily score into comparable points. Falls back to the
/// attempts formula when the game is unknown.
#[must_use]
pub fn points(score: &DailyGameScore, game: Option<&GameDefinition>) -> u32 {
    let model = game.map_or(ScoringModel::default(), |game| game.scoring);
    let raw = match (score.completed, score.score) {
        (true, Some(raw)) => raw,
        // Incomplete or scoreless days never earn points.
        _ => return 0,
    };
    match model {
        ScoringModel::LowerAttempts | ScoringModel::LowerGuesses | ScoringModel::LowerHints => {
            score.max_attempts.saturating_sub(raw).saturating_add(1)
        }
        ScoringModel::LowerTimeSeconds => time_bucket_points(raw),
        ScoringModel::HigherIsBetter => raw.min(TIME_BUCKET_TOP_POINTS),
    }
}

/// Bucket elapsed seconds into the seven-tier time scale: under 30 seconds
/// earns 7, each further half minute one less, 180 seconds and up earns 1.
#[must_use]
pub const fn time_bucket_points(seconds: u32) -> u32 {
    let bucket = seconds / TIME_BUCKET_SECONDS;
    if bucket >= TIME_BUCKET_TOP_POINTS - 1 {
        1
    } else {
        TIME_BUCKET_TOP_POINTS - bucket
    }
}

/// Human-readable inverse of [`points`] for row display, with correct
/// singular and plural forms per scoring model.
#[must_use]
pub fn metric_label(points: u32, game: Option<&GameDefinition>) -> String {
    if points == 0 {
        return "DNF".to_string();
    }
    let model = game.map_or(ScoringModel::default(), |game| game.scoring);
    let max_attempts = game.map_or(DEFAULT_MAX_ATTEMPTS, |game| game.max_attempts);
    match model {
        ScoringModel::LowerAttempts | ScoringModel::LowerGuesses => {
            let guesses = max_attempts.saturating_add(1).saturating_sub(points);
            counted(guesses, "guess", "guesses")
        }
        ScoringModel::LowerHints => {
            let hints = max_attempts.saturating_add(1).saturating_sub(points);
            counted(hints, "hint", "hints")
        }
        ScoringModel::LowerTimeSeconds => time_bucket_label(points).to_string(),
        ScoringModel::HigherIsBetter => counted(points, "pt", "pts"),
    }
}

fn counted(n: u32, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("1 {singular}")
    } else {
        format!("{n} {plural}")
    }
}

const fn time_bucket_label(points: u32) -> &'static str {
    match points {
        7 => "<30s",
        6 => "<1m",
        5 => "<1m30s",
        4 => "<2m",
        3 => "<2m30s",
        2 => "<3m",
        _ => "\u{2265}3m",
    }
}

/// Scores whose `date_int` falls within the inclusive window.
pub fn scores_in_window(
    scores: &[DailyGameScore],
    start_int: u32,
    end_int: u32,
) -> impl Iterator<Item = &DailyGameScore> {
    scores
        .iter()
        .filter(move |score| score.date_int >= start_int && score.date_int <= end_int)
}

/// One ranked leaderboard row, recomputed from a window of daily scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub user_id: UserId,
    pub display_name: String,
    pub total_points: u32,
    /// Per-game point totals within the window.
    pub game_points: BTreeMap<GameId, u32>,
    /// Latest published streak per game within the window.
    pub game_streaks: BTreeMap<GameId, u32>,
}

/// Group a window's scores by user, sum totals and per-game breakdowns, and
/// rank: total points descending, display name ascending on ties.
#[must_use]
pub fn aggregate_rows(
    scores: &[DailyGameScore],
    display_names: &HashMap<UserId, String>,
    catalog: &GameCatalog,
) -> Vec<LeaderboardRow> {
    let mut rows: BTreeMap<&str, LeaderboardRow> = BTreeMap::new();
    for score in scores {
        let row = rows
            .entry(&score.user_id)
            .or_insert_with(|| LeaderboardRow {
                user_id: score.user_id.clone(),
                display_name: display_names
                    .get(&score.user_id)
                    .cloned()
                    .unwrap_or_else(|| score.user_id.clone()),
                total_points: 0,
                game_points: BTreeMap::new(),
                game_streaks: BTreeMap::new(),
            });
        let earned = points(score, catalog.get(&score.game_id));
        row.total_points = row.total_points.saturating_add(earned);
        *row.game_points.entry(score.game_id.clone()).or_default() += earned;
        if let Some(streak) = score.streak {
            let entry = row.game_streaks.entry(score.game_id.clone()).or_default();
            *entry = (*entry).max(streak);
        }
    }

    let mut rows: Vec<LeaderboardRow> = rows.into_values().collect();
    rows.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    rows
}
