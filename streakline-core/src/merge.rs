//! Conflict resolution between local and remote copies of synced state.
//!
//! Every comparison here has a deterministic tie-break, so a merge always
//! terminates with a single valid result regardless of which device runs it
//! or in which order the sides arrive. Achievement state merges field by
//! field toward the monotonic maximum; result records are last-writer-wins.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::achievement::TieredAchievement;
use crate::game::GameId;
use crate::result::GameResult;

/// Union two achievement lists by id, keeping the furthest progress on each
/// side: higher tier rank, higher value, and the later unlock timestamp per
/// tier. Ids present on only one side pass through unchanged.
#[must_use]
pub fn merge_achievements(
    local: Vec<TieredAchievement>,
    remote: Vec<TieredAchievement>,
) -> Vec<TieredAchievement> {
    let mut merged: BTreeMap<String, TieredAchievement> = local
        .into_iter()
        .map(|achievement| (achievement.id.clone(), achievement))
        .collect();

    for theirs in remote {
        match merged.entry(theirs.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(theirs);
            }
            Entry::Occupied(mut slot) => {
                let ours = slot.get_mut();
                let progress = &mut ours.progress;
                if theirs.progress.current_tier > progress.current_tier {
                    debug!(
                        "merge: {} tier {:?} -> {:?}",
                        ours.id, progress.current_tier, theirs.progress.current_tier
                    );
                    progress.current_tier = theirs.progress.current_tier;
                }
                progress.current_value = progress.current_value.max(theirs.progress.current_value);
                for (tier, stamped) in theirs.progress.tier_unlock_dates {
                    progress
                        .tier_unlock_dates
                        .entry(tier)
                        .and_modify(|existing| *existing = (*existing).max(stamped))
                        .or_insert(stamped);
                }
                progress.last_updated = progress.last_updated.max(theirs.progress.last_updated);
            }
        }
    }

    merged.into_values().collect()
}

/// Union of the persisted "unique games ever" auxiliary sets.
#[must_use]
pub fn merge_unique_games(
    local: &BTreeSet<GameId>,
    remote: &BTreeSet<GameId>,
) -> BTreeSet<GameId> {
    local.union(remote).cloned().collect()
}

/// Reconcile two result sets per id: the copy with the greater-or-equal
/// `last_modified` wins in full, remote winning exact ties. Results are
/// practically append-only, so full-record last-writer-wins is deliberate.
/// Output is sorted by id for deterministic downstream diffs.
#[must_use]
pub fn merge_results(local: Vec<GameResult>, remote: Vec<GameResult>) -> Vec<GameResult> {
    let mut merged: BTreeMap<String, GameResult> = local
        .into_iter()
        .map(|result| (result.id.clone(), result))
        .collect();

    for theirs in remote {
        match merged.entry(theirs.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(theirs);
            }
            Entry::Occupied(mut slot) => {
                if theirs.last_modified >= slot.get().last_modified {
                    debug!("merge: remote copy of result {} wins", theirs.id);
                    slot.insert(theirs);
                }
            }
        }
    }

    merged.into_values().collect()
}
