//! Logged game results and the free-form attribute map the parser fills in.
//!
//! Attribute keys use stable snake_case string values so records survive
//! version bumps on either side of the sync boundary.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::game::GameId;

/// Puzzle number extracted from shared text (e.g. `"1,234"` for Wordle 1234).
pub const ATTR_PUZZLE_NUMBER: &str = "puzzle_number";
/// Declared difficulty for games with a difficulty dimension.
pub const ATTR_DIFFICULTY: &str = "difficulty";

/// A single logged puzzle result. Immutable once created; only
/// `last_modified` is bumped when a remote copy overwrites it during merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub id: String,
    pub game_id: GameId,
    /// Local wall-clock time the puzzle was played.
    pub played_at: NaiveDateTime,
    #[serde(default)]
    pub score: Option<u32>,
    pub max_attempts: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Sync ordering timestamp; last writer wins on merge.
    pub last_modified: DateTime<Utc>,
}

impl GameResult {
    /// Build a minimal result; callers layer score, completion, and parsed
    /// attributes on top.
    #[must_use]
    pub fn new(id: &str, game_id: &str, played_at: NaiveDateTime) -> Self {
        Self {
            id: id.to_string(),
            game_id: game_id.to_string(),
            played_at,
            score: None,
            max_attempts: 6,
            completed: false,
            attributes: HashMap::new(),
            last_modified: DateTime::UNIX_EPOCH,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: u32) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = at;
        self
    }

    /// Calendar day the puzzle was played, in local wall-clock terms.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.played_at.date()
    }

    /// Local hour of day, 0..=23.
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.played_at.hour()
    }

    /// Puzzle number normalized for dedup comparison: thousands separators
    /// and whitespace stripped, digits kept. `None` when absent or when
    /// nothing numeric survives.
    #[must_use]
    pub fn puzzle_number(&self) -> Option<String> {
        let raw = self.attributes.get(ATTR_PUZZLE_NUMBER)?;
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() { None } else { Some(digits) }
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<&str> {
        self.attributes.get(ATTR_DIFFICULTY).map(String::as_str)
    }
}
