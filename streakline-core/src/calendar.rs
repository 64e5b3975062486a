//! Calendar-day arithmetic shared by the streak, achievement, and
//! leaderboard engines. All helpers operate on `NaiveDate` wall-clock days;
//! time zones are the caller's concern.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

/// Encode a date as a `yyyymmdd` integer, the form used by
/// [`DailyGameScore`](crate::leaderboard::DailyGameScore) composite ids.
#[must_use]
pub fn date_int(date: NaiveDate) -> u32 {
    let year = u32::try_from(date.year().max(0)).unwrap_or(0);
    year * 10_000 + date.month() * 100 + date.day()
}

/// Signed whole-day distance from `earlier` to `later`.
#[must_use]
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    later.signed_duration_since(earlier).num_days()
}

/// True when `next` is exactly one calendar day after `prev`.
#[must_use]
pub fn is_next_day(prev: NaiveDate, next: NaiveDate) -> bool {
    days_between(prev, next) == 1
}

/// Scan the interval `(after, through]` and report whether any day in it is
/// missing from `days`. Returns `false` when the interval is empty
/// (`through <= after`).
#[must_use]
pub fn gap_in_interval(days: &BTreeSet<NaiveDate>, after: NaiveDate, through: NaiveDate) -> bool {
    let mut cursor = after.succ_opt();
    while let Some(day) = cursor {
        if day > through {
            break;
        }
        if !days.contains(&day) {
            return true;
        }
        cursor = day.succ_opt();
    }
    false
}

/// Length of the run of consecutive days in `days` ending at `end`,
/// inclusive. Zero when `end` itself is not in the set.
#[must_use]
pub fn run_ending_at(days: &BTreeSet<NaiveDate>, end: NaiveDate) -> u32 {
    let mut length = 0u32;
    let mut cursor = Some(end);
    while let Some(day) = cursor {
        if !days.contains(&day) {
            break;
        }
        length = length.saturating_add(1);
        cursor = day.pred_opt();
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_int_encodes_ymd() {
        assert_eq!(date_int(day(2025, 3, 7)), 20_250_307);
        assert_eq!(date_int(day(2024, 12, 31)), 20_241_231);
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(day(2025, 1, 1), day(2025, 1, 4)), 3);
        assert_eq!(days_between(day(2025, 1, 4), day(2025, 1, 1)), -3);
        assert!(is_next_day(day(2025, 1, 31), day(2025, 2, 1)));
        assert!(!is_next_day(day(2025, 1, 31), day(2025, 2, 2)));
    }

    #[test]
    fn gap_scan_covers_exclusive_inclusive_interval() {
        let days: BTreeSet<_> = [day(2025, 1, 1), day(2025, 1, 2), day(2025, 1, 4)]
            .into_iter()
            .collect();
        // (1st, 2nd] fully covered.
        assert!(!gap_in_interval(&days, day(2025, 1, 1), day(2025, 1, 2)));
        // 3rd is missing inside (2nd, 4th].
        assert!(gap_in_interval(&days, day(2025, 1, 2), day(2025, 1, 4)));
        // Empty interval is never a gap.
        assert!(!gap_in_interval(&days, day(2025, 1, 4), day(2025, 1, 4)));
        assert!(!gap_in_interval(&days, day(2025, 1, 4), day(2025, 1, 2)));
    }

    #[test]
    fn run_length_counts_backwards_from_end() {
        let days: BTreeSet<_> = [
            day(2025, 1, 1),
            day(2025, 1, 3),
            day(2025, 1, 4),
            day(2025, 1, 5),
        ]
        .into_iter()
        .collect();
        assert_eq!(run_ending_at(&days, day(2025, 1, 5)), 3);
        assert_eq!(run_ending_at(&days, day(2025, 1, 1)), 1);
        assert_eq!(run_ending_at(&days, day(2025, 1, 2)), 0);
    }
}
