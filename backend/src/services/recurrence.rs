//! Weekly recurrence matching.
//!
//! Weeks are grouped Monday..Sunday. The week index of a candidate date is the
//! number of whole weeks between the Monday of the schedule's basis date and
//! the Monday of the candidate. Every pattern field adds one conjunctive check.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::schedule::{RecurrencePattern, WeekParity};

/// Returns true when `pattern` fires on `date` for a schedule whose validity
/// starts on `basis`.
pub fn matches(date: NaiveDate, basis: NaiveDate, pattern: &RecurrencePattern) -> bool {
    if date.weekday().number_from_monday() as i16 != pattern.day_of_week {
        return false;
    }

    // Offset weeks are skipped before the pattern starts.
    let adjusted = week_index(basis, date) - i64::from(pattern.start_offset_weeks);
    if adjusted < 0 {
        return false;
    }

    let interval = i64::from(pattern.interval_weeks);
    if interval <= 0 {
        if adjusted != 0 {
            return false;
        }
    } else if adjusted % interval != 0 {
        return false;
    }

    match pattern.week_parity {
        WeekParity::All => {}
        WeekParity::Odd if adjusted % 2 != 0 => return false,
        WeekParity::Even if adjusted % 2 != 1 => return false,
        _ => {}
    }

    if !pattern.weeks_of_month.is_empty()
        && !pattern.weeks_of_month.contains(&week_of_month(date))
    {
        return false;
    }

    if pattern.last_week_of_month && !is_last_week_of_month(date) {
        return false;
    }

    true
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Whole weeks from the basis week to the candidate week. Negative when the
/// candidate precedes the basis.
pub fn week_index(basis: NaiveDate, date: NaiveDate) -> i64 {
    (monday_of(date) - monday_of(basis)).num_days().div_euclid(7)
}

/// 1-based week of the month, where week 1 is the Monday-based week holding
/// the 1st. Clamped to 1..=5 so a sixth partial week counts as the fifth.
pub fn week_of_month(date: NaiveDate) -> i16 {
    let first = date.with_day(1).unwrap_or(date);
    let ordinal = week_index(first, date) + 1;
    ordinal.clamp(1, 5) as i16
}

/// True when the same weekday one week later falls in the next month.
pub fn is_last_week_of_month(date: NaiveDate) -> bool {
    (date + Duration::days(7)).month() != date.month()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn biweekly_monday() -> RecurrencePattern {
        RecurrencePattern {
            interval_weeks: 2,
            ..RecurrencePattern::weekly(1)
        }
    }

    #[test]
    fn wrong_weekday_never_matches() {
        let pattern = RecurrencePattern::weekly(1);
        // 2024-01-02 is a Tuesday
        assert!(!matches(d(2024, 1, 2), d(2024, 1, 1), &pattern));
        assert!(matches(d(2024, 1, 8), d(2024, 1, 1), &pattern));
    }

    #[test]
    fn same_inputs_give_same_answer() {
        let pattern = biweekly_monday();
        let first = matches(d(2024, 1, 15), d(2024, 1, 1), &pattern);
        for _ in 0..10 {
            assert_eq!(matches(d(2024, 1, 15), d(2024, 1, 1), &pattern), first);
        }
    }

    #[test]
    fn every_second_week_from_basis() {
        let pattern = biweekly_monday();
        let basis = d(2024, 1, 1);
        for day in [1, 15, 29] {
            assert!(matches(d(2024, 1, day), basis, &pattern), "2024-01-{day} should fire");
        }
        for day in [8, 22] {
            assert!(!matches(d(2024, 1, day), basis, &pattern), "2024-01-{day} should not fire");
        }
    }

    #[test]
    fn basis_mid_week_still_counts_from_its_monday() {
        // Basis Wednesday 2024-01-03 belongs to the week of Monday 2024-01-01.
        let pattern = biweekly_monday();
        assert!(matches(d(2024, 1, 15), d(2024, 1, 3), &pattern));
        assert!(!matches(d(2024, 1, 8), d(2024, 1, 3), &pattern));
    }

    #[test]
    fn even_parity_keeps_odd_adjusted_indexes() {
        let pattern = RecurrencePattern {
            week_parity: WeekParity::Even,
            ..RecurrencePattern::weekly(1)
        };
        let basis = d(2024, 1, 1);
        for day in [8, 22] {
            assert!(matches(d(2024, 1, day), basis, &pattern));
        }
        for day in [1, 15, 29] {
            assert!(!matches(d(2024, 1, day), basis, &pattern));
        }
    }

    #[test]
    fn odd_parity_keeps_first_firing_week() {
        let pattern = RecurrencePattern {
            week_parity: WeekParity::Odd,
            ..RecurrencePattern::weekly(1)
        };
        let basis = d(2024, 1, 1);
        assert!(matches(d(2024, 1, 1), basis, &pattern));
        assert!(!matches(d(2024, 1, 8), basis, &pattern));
        assert!(matches(d(2024, 1, 15), basis, &pattern));
    }

    #[test]
    fn start_offset_delays_pattern_and_shifts_parity() {
        let pattern = RecurrencePattern {
            start_offset_weeks: 2,
            week_parity: WeekParity::Odd,
            ..RecurrencePattern::weekly(1)
        };
        let basis = d(2024, 1, 1);
        assert!(!matches(d(2024, 1, 1), basis, &pattern));
        assert!(!matches(d(2024, 1, 8), basis, &pattern));
        assert!(matches(d(2024, 1, 15), basis, &pattern));
        assert!(!matches(d(2024, 1, 22), basis, &pattern));
        assert!(matches(d(2024, 1, 29), basis, &pattern));
    }

    #[test]
    fn non_positive_interval_fires_once() {
        let pattern = RecurrencePattern {
            interval_weeks: 0,
            start_offset_weeks: 1,
            ..RecurrencePattern::weekly(1)
        };
        let basis = d(2024, 1, 1);
        assert!(!matches(d(2024, 1, 1), basis, &pattern));
        assert!(matches(d(2024, 1, 8), basis, &pattern));
        assert!(!matches(d(2024, 1, 15), basis, &pattern));
    }

    #[test]
    fn candidate_before_basis_is_rejected() {
        let pattern = RecurrencePattern::weekly(1);
        assert!(!matches(d(2023, 12, 25), d(2024, 1, 1), &pattern));
    }

    #[test]
    fn last_week_of_month() {
        let pattern = RecurrencePattern {
            last_week_of_month: true,
            ..RecurrencePattern::weekly(1)
        };
        let basis = d(2024, 1, 1);
        assert!(matches(d(2024, 2, 26), basis, &pattern));
        assert!(!matches(d(2024, 2, 5), basis, &pattern));
        assert!(!matches(d(2024, 2, 19), basis, &pattern));
    }

    #[test]
    fn first_and_third_weeks_of_month() {
        // January 2024 starts on a Monday, so Wednesdays fall in weeks 1..=5 in order.
        let pattern = RecurrencePattern {
            weeks_of_month: vec![1, 3],
            ..RecurrencePattern::weekly(3)
        };
        let basis = d(2024, 1, 1);
        assert!(matches(d(2024, 1, 3), basis, &pattern));
        assert!(!matches(d(2024, 1, 10), basis, &pattern));
        assert!(matches(d(2024, 1, 17), basis, &pattern));
        assert!(!matches(d(2024, 1, 24), basis, &pattern));
        assert!(!matches(d(2024, 1, 31), basis, &pattern));
    }

    #[test]
    fn weeks_of_month_follow_calendar_weeks_not_weekday_count() {
        // September 2024 starts on a Sunday. Monday the 2nd is the first Monday
        // but sits in calendar week 2; Monday the 16th sits in week 4.
        let pattern = RecurrencePattern {
            weeks_of_month: vec![1, 3],
            ..RecurrencePattern::weekly(1)
        };
        let basis = d(2024, 9, 1);
        assert!(!matches(d(2024, 9, 2), basis, &pattern));
        assert!(matches(d(2024, 9, 9), basis, &pattern));
        assert!(!matches(d(2024, 9, 16), basis, &pattern));
        assert!(!matches(d(2024, 9, 23), basis, &pattern));
    }

    #[test]
    fn week_of_month_uses_monday_grouping_and_clamps() {
        // September 2024 starts on a Sunday: the 1st is week 1, Monday the 2nd is week 2.
        assert_eq!(week_of_month(d(2024, 9, 1)), 1);
        assert_eq!(week_of_month(d(2024, 9, 2)), 2);
        // Monday the 30th would be week 6.
        assert_eq!(week_of_month(d(2024, 9, 30)), 5);
    }

    #[test]
    fn week_index_counts_whole_weeks() {
        assert_eq!(week_index(d(2024, 1, 1), d(2024, 1, 7)), 0);
        assert_eq!(week_index(d(2024, 1, 1), d(2024, 1, 8)), 1);
        assert_eq!(week_index(d(2024, 1, 7), d(2024, 1, 8)), 1);
        assert_eq!(week_index(d(2024, 1, 8), d(2024, 1, 7)), -1);
    }
}
