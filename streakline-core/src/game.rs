//! Game definitions and the capability record the engines branch on.
//!
//! Engines never special-case games by name; every per-game behavior
//! (scoring model, difficulty dimension, valid score range) is declared
//! here and carried by the catalog.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::result::GameResult;

/// Stable identifier of a game definition (e.g. `"wordle"`).
pub type GameId = String;

/// How a game's raw score maps onto comparable leaderboard points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ScoringModel {
    /// Fewer attempts is better (Wordle-style grids).
    #[default]
    LowerAttempts,
    /// Fewer guesses is better; scored identically to `LowerAttempts`.
    LowerGuesses,
    /// Fewer hints is better; points may exceed the usual 7-point scale.
    LowerHints,
    /// Elapsed seconds, bucketed into seven tiers.
    LowerTimeSeconds,
    /// Raw points, capped at 7.
    HigherIsBetter,
}

/// Inclusive bounds a raw score must fall within to be structurally valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u32,
    pub max: u32,
}

impl ScoreRange {
    #[must_use]
    pub const fn contains(&self, score: u32) -> bool {
        score >= self.min && score <= self.max
    }
}

/// Structural validation failures caught before ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("score {score} outside valid range {min}..={max} for game {game}")]
    ScoreOutOfRange {
        game: GameId,
        score: u32,
        min: u32,
        max: u32,
    },
    #[error("score {score} exceeds {max_attempts} attempts for game {game}")]
    ScoreExceedsAttempts {
        game: GameId,
        score: u32,
        max_attempts: u32,
    },
}

/// Capability record for a single game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDefinition {
    pub id: GameId,
    pub name: String,
    pub max_attempts: u32,
    #[serde(default)]
    pub scoring: ScoringModel,
    #[serde(default)]
    pub score_range: Option<ScoreRange>,
    /// Games with a difficulty dimension allow several results for the same
    /// puzzle number, one per declared difficulty.
    #[serde(default)]
    pub multiple_per_puzzle: bool,
}

impl GameDefinition {
    /// Structural score validation, applied before a candidate reaches the
    /// dedup gate. A scoreless result is always structurally valid.
    ///
    /// # Errors
    ///
    /// Returns an error when the score falls outside the declared range, or,
    /// for attempt-counted games without an explicit range, exceeds
    /// `max_attempts`.
    pub fn validate(&self, result: &GameResult) -> Result<(), ValidationError> {
        let Some(score) = result.score else {
            return Ok(());
        };
        if let Some(range) = self.score_range {
            if !range.contains(score) {
                return Err(ValidationError::ScoreOutOfRange {
                    game: self.id.clone(),
                    score,
                    min: range.min,
                    max: range.max,
                });
            }
            return Ok(());
        }
        let attempt_counted = matches!(
            self.scoring,
            ScoringModel::LowerAttempts | ScoringModel::LowerGuesses
        );
        if attempt_counted && score > self.max_attempts {
            return Err(ValidationError::ScoreExceedsAttempts {
                game: self.id.clone(),
                score,
                max_attempts: self.max_attempts,
            });
        }
        Ok(())
    }
}

/// Container for every known game definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameCatalog {
    pub games: Vec<GameDefinition>,
}

impl GameCatalog {
    /// Create an empty catalog (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self { games: Vec::new() }
    }

    /// Load a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid definitions.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create a catalog from pre-built definitions.
    #[must_use]
    pub fn from_games(games: Vec<GameDefinition>) -> Self {
        Self { games }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GameDefinition> {
        self.games.iter().find(|game| game.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn result_with_score(game: &str, score: Option<u32>) -> GameResult {
        let played = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut result = GameResult::new("r1", game, played);
        result.score = score;
        result
    }

    #[test]
    fn catalog_from_json_reads_capabilities() {
        let json = r#"{
            "games": [
                {
                    "id": "wordle",
                    "name": "Wordle",
                    "max_attempts": 6,
                    "scoring": "lowerGuesses"
                },
                {
                    "id": "mini-cross",
                    "name": "Mini Crossword",
                    "max_attempts": 1,
                    "scoring": "lowerTimeSeconds",
                    "multiple_per_puzzle": true
                }
            ]
        }"#;

        let catalog = GameCatalog::from_json(json).unwrap();
        assert_eq!(catalog.games.len(), 2);
        let mini = catalog.get("mini-cross").unwrap();
        assert_eq!(mini.scoring, ScoringModel::LowerTimeSeconds);
        assert!(mini.multiple_per_puzzle);
        assert!(!catalog.get("wordle").unwrap().multiple_per_puzzle);
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_scores() {
        let game = GameDefinition {
            id: "digits".into(),
            name: "Digits".into(),
            max_attempts: 5,
            scoring: ScoringModel::HigherIsBetter,
            score_range: Some(ScoreRange { min: 0, max: 15 }),
            multiple_per_puzzle: false,
        };
        assert!(game.validate(&result_with_score("digits", Some(15))).is_ok());
        assert!(game.validate(&result_with_score("digits", None)).is_ok());
        let err = game
            .validate(&result_with_score("digits", Some(16)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::ScoreOutOfRange { .. }));
    }

    #[test]
    fn validate_caps_attempt_counted_games_at_max_attempts() {
        let game = GameDefinition {
            id: "wordle".into(),
            name: "Wordle".into(),
            max_attempts: 6,
            scoring: ScoringModel::LowerGuesses,
            score_range: None,
            multiple_per_puzzle: false,
        };
        assert!(game.validate(&result_with_score("wordle", Some(6))).is_ok());
        let err = game
            .validate(&result_with_score("wordle", Some(7)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::ScoreExceedsAttempts { .. }));
    }
}
