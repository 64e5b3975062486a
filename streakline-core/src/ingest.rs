//! Duplicate-aware result ingestion.
//!
//! Every candidate passes one gate before it enters the corpus:
//! exact-id match, normalized puzzle-number match (difficulty-aware for
//! games that allow several results per puzzle), or same-calendar-day match
//! when no puzzle number was parsed. Rejecting a duplicate is a normal
//! negative outcome, never an error.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::debug;

use crate::game::{GameCatalog, GameId};
use crate::result::GameResult;

/// Identity of a result within its game for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// Normalized puzzle number, one result allowed per puzzle.
    Puzzle(String),
    /// Puzzle number plus declared difficulty, for games with a
    /// difficulty dimension. An absent difficulty is its own lane.
    PuzzleAndDifficulty(String, String),
    /// Local calendar day, for results without a puzzle number.
    Day(NaiveDate),
}

impl DedupKey {
    /// Derive the key a result occupies, honoring the game's
    /// `multiple_per_puzzle` capability.
    #[must_use]
    pub fn for_result(result: &GameResult, catalog: &GameCatalog) -> Self {
        let multi = catalog
            .get(&result.game_id)
            .is_some_and(|game| game.multiple_per_puzzle);
        match result.puzzle_number() {
            Some(number) if multi => Self::PuzzleAndDifficulty(
                number,
                result.difficulty().unwrap_or_default().to_string(),
            ),
            Some(number) => Self::Puzzle(number),
            None => Self::Day(result.day()),
        }
    }
}

/// Per-game index of occupied dedup keys, plus the set of known result ids.
///
/// The index is rebuilt lazily whenever it is empty or no longer matches the
/// corpus length, so [`DedupIndex::add_result`] is always safe to call
/// without prior construction and stays correct after out-of-band corpus
/// changes such as a sync merge.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    keys: HashMap<GameId, HashSet<DedupKey>>,
    ids: HashSet<String>,
    indexed_len: usize,
}

impl DedupIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached index; the next call rebuilds from the corpus.
    pub fn invalidate(&mut self) {
        self.keys.clear();
        self.ids.clear();
        self.indexed_len = 0;
    }

    fn ensure_fresh(&mut self, corpus: &[GameResult], catalog: &GameCatalog) {
        if self.indexed_len == corpus.len() && (!self.ids.is_empty() || corpus.is_empty()) {
            return;
        }
        self.invalidate();
        for result in corpus {
            self.insert(result, catalog);
        }
        self.indexed_len = corpus.len();
    }

    fn insert(&mut self, result: &GameResult, catalog: &GameCatalog) {
        self.ids.insert(result.id.clone());
        self.keys
            .entry(result.game_id.clone())
            .or_default()
            .insert(DedupKey::for_result(result, catalog));
    }

    /// Check a candidate against the corpus without admitting it.
    #[must_use]
    pub fn is_duplicate(
        &mut self,
        candidate: &GameResult,
        corpus: &[GameResult],
        catalog: &GameCatalog,
    ) -> bool {
        self.ensure_fresh(corpus, catalog);
        if self.ids.contains(&candidate.id) {
            return true;
        }
        let key = DedupKey::for_result(candidate, catalog);
        self.keys
            .get(&candidate.game_id)
            .is_some_and(|keys| keys.contains(&key))
    }

    /// Admit `candidate` into `corpus` unless it duplicates an existing
    /// result. Returns whether the candidate was added.
    pub fn add_result(
        &mut self,
        candidate: GameResult,
        corpus: &mut Vec<GameResult>,
        catalog: &GameCatalog,
    ) -> bool {
        if self.is_duplicate(&candidate, corpus, catalog) {
            debug!(
                "rejecting duplicate result {} for game {}",
                candidate.id, candidate.game_id
            );
            return false;
        }
        self.insert(&candidate, catalog);
        corpus.push(candidate);
        self.indexed_len = corpus.len();
        true
    }
}
