//! Two-device sync scenarios: merging diverged snapshots must be
//! deterministic, monotonic, and safe to repeat.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use streakline_core::{
    GameCatalog, GameResult, Tier, Tracker, merge_achievements, ATTR_PUZZLE_NUMBER,
};

fn played(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, day)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap()
}

fn stamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_750_000_000 + secs, 0).unwrap()
}

fn wordle(id: &str, day: u32, puzzle: u32, modified: i64) -> GameResult {
    GameResult::new(id, "wordle", played(day))
        .with_score(4)
        .completed(true)
        .with_attribute(ATTR_PUZZLE_NUMBER, &format!("{puzzle}"))
        .modified_at(stamp(modified))
}

#[test]
fn diverged_devices_converge_on_the_union() {
    // Phone logged days 1-2, tablet logged days 2-3 (day 2 shared).
    let mut phone = Tracker::new(GameCatalog::empty());
    phone.log_result(wordle("r1", 1, 1400, 10), stamp(10));
    phone.log_result(wordle("r2", 2, 1401, 20), stamp(20));

    let mut tablet = Tracker::new(GameCatalog::empty());
    tablet.log_result(wordle("r2", 2, 1401, 25), stamp(25));
    tablet.log_result(wordle("r3", 3, 1402, 30), stamp(30));

    let remote = tablet.snapshot().clone();
    phone.merge_remote(remote, stamp(100));

    let snapshot = phone.snapshot();
    assert_eq!(snapshot.results.len(), 3);
    // r2 took the tablet's newer copy.
    let r2 = snapshot.results.iter().find(|r| r.id == "r2").unwrap();
    assert_eq!(r2.last_modified, stamp(25));
    // Rebuilt streak spans all three days.
    assert_eq!(snapshot.streaks["wordle"].current_streak, 3);
    assert_eq!(snapshot.streaks["wordle"].max_streak, 3);
}

#[test]
fn merge_is_idempotent_and_order_insensitive_for_progress() {
    let mut a = Tracker::new(GameCatalog::empty());
    for day in 1..=3u32 {
        a.log_result(wordle(&format!("a{day}"), day, 1400 + day, i64::from(day)), stamp(1));
    }
    let mut b = Tracker::new(GameCatalog::empty());
    b.log_result(wordle("b1", 5, 1500, 40), stamp(40));

    let mut a_then_b = a.clone();
    a_then_b.merge_remote(b.snapshot().clone(), stamp(100));
    let mut b_then_a = b.clone();
    b_then_a.merge_remote(a.snapshot().clone(), stamp(100));

    assert_eq!(a_then_b.snapshot().results, b_then_a.snapshot().results);
    assert_eq!(a_then_b.snapshot().streaks, b_then_a.snapshot().streaks);
    assert_eq!(
        a_then_b.snapshot().unique_games,
        b_then_a.snapshot().unique_games
    );

    // Merging the same remote again changes nothing.
    let before = a_then_b.snapshot().clone();
    a_then_b.merge_remote(b.into_snapshot(), stamp(200));
    assert_eq!(a_then_b.snapshot(), &before);
}

#[test]
fn achievement_merge_keeps_the_furthest_progress() {
    let mut local = Tracker::new(GameCatalog::empty());
    for day in 1..=3u32 {
        local.log_result(
            wordle(&format!("l{day}"), day, 1400 + day, i64::from(day)),
            stamp(1),
        );
    }
    // Remote device saw a week-long run before its history was pruned.
    let mut remote = local.snapshot().clone();
    remote.results.clear();
    for achievement in &mut remote.achievements {
        if achievement.id == "streak_master" {
            achievement.progress.current_value = 8;
            achievement.progress.current_tier = Some(Tier::Silver);
            achievement
                .progress
                .tier_unlock_dates
                .insert(Tier::Silver, stamp(50));
        }
    }

    local.merge_remote(remote, stamp(100));
    let master = local
        .snapshot()
        .achievements
        .iter()
        .find(|a| a.id == "streak_master")
        .unwrap();
    assert_eq!(master.progress.current_tier, Some(Tier::Silver));
    assert_eq!(master.progress.current_value, 8);
    assert_eq!(
        master.progress.tier_unlock_dates.get(&Tier::Silver),
        Some(&stamp(50))
    );
}

#[test]
fn bare_merge_resolver_tie_breaks_match_the_contract() {
    let bronze = {
        let mut set = streakline_core::TieredAchievement::default_set();
        let master = set.iter_mut().find(|a| a.id == "streak_master").unwrap();
        master.progress.current_tier = Some(Tier::Bronze);
        master.progress.current_value = 5;
        set
    };
    let silver = {
        let mut set = streakline_core::TieredAchievement::default_set();
        let master = set.iter_mut().find(|a| a.id == "streak_master").unwrap();
        master.progress.current_tier = Some(Tier::Silver);
        master.progress.current_value = 8;
        set
    };

    let merged = merge_achievements(bronze, silver);
    let master = merged.iter().find(|a| a.id == "streak_master").unwrap();
    assert_eq!(master.progress.current_tier, Some(Tier::Silver));
    assert_eq!(master.progress.current_value, 8);
}

#[test]
fn pruned_history_never_demotes_streak_records() {
    let mut device = Tracker::new(GameCatalog::empty());
    for day in 1..=5u32 {
        device.log_result(
            wordle(&format!("r{day}"), day, 1400 + day, i64::from(day)),
            stamp(1),
        );
    }
    assert_eq!(device.snapshot().streaks["wordle"].max_streak, 5);

    // Remote kept only the latest result.
    let mut remote = device.snapshot().clone();
    remote.results.retain(|r| r.id == "r5");

    let mut merged = Tracker::new(GameCatalog::empty());
    merged.merge_remote(remote, stamp(100));
    // The streak record carried the historical best even though the corpus
    // no longer shows the run.
    assert_eq!(merged.snapshot().streaks["wordle"].max_streak, 5);
    assert_eq!(merged.snapshot().streaks["wordle"].total_played, 5);
}
