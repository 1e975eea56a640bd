//! Calendar week bucketing.
//!
//! Weeks start on Monday at local midnight in the ledger's timezone, like
//! `date_trunc('week', ...)` in PostgreSQL. The window is half open:
//! `[start, end)`.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

/// The calendar week containing a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    /// Returns the week that contains `now`, as seen from `timezone`.
    pub fn containing(now: DateTime<Utc>, timezone: Tz) -> Self {
        let today = now.with_timezone(&timezone).date_naive();
        let back = u64::from(today.weekday().num_days_from_monday());
        let monday = today.checked_sub_days(Days::new(back)).unwrap_or(today);
        let next_monday = monday.checked_add_days(Days::new(7)).unwrap_or(monday);

        Self {
            start: local_midnight(monday, timezone),
            end: local_midnight(next_monday, timezone),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Midnight of `date` in `timezone`. When a DST change skips midnight the
/// window starts at the first local minute that exists after the gap.
fn local_midnight(date: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    (0..MAX_GAP_MINUTES)
        .filter_map(|minute| naive.checked_add_signed(TimeDelta::minutes(minute)))
        .find_map(|candidate| timezone.from_local_datetime(&candidate).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

// Transitions land on whole minutes and never skip a full day.
const MAX_GAP_MINUTES: i64 = 24 * 60;

#[cfg(test)]
mod tests {
    use chrono_tz::{Asia::Tehran, Europe::Rome, UTC};

    use super::*;

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn midweek_instant_maps_to_monday_start() {
        // 2026-10-14 is a Wednesday.
        let window = WeekWindow::containing(utc("2026-10-14T15:30:00Z"), UTC);
        assert_eq!(window.start, utc("2026-10-12T00:00:00Z"));
        assert_eq!(window.end, utc("2026-10-19T00:00:00Z"));
    }

    #[test]
    fn monday_midnight_starts_a_new_week() {
        let window = WeekWindow::containing(utc("2026-10-19T00:00:00Z"), UTC);
        assert_eq!(window.start, utc("2026-10-19T00:00:00Z"));
        assert!(window.contains(utc("2026-10-19T00:00:00Z")));
        assert!(!window.contains(utc("2026-10-18T23:59:59Z")));
    }

    #[test]
    fn end_is_exclusive() {
        let window = WeekWindow::containing(utc("2026-10-18T23:59:59Z"), UTC);
        assert!(window.contains(utc("2026-10-18T23:59:59Z")));
        assert!(!window.contains(window.end));
    }

    #[test]
    fn timezone_shifts_the_boundary() {
        // Sunday 23:30 UTC is already Monday 01:30 in Rome (CEST).
        let window = WeekWindow::containing(utc("2026-10-18T23:30:00Z"), Rome);
        assert_eq!(window.start, utc("2026-10-18T22:00:00Z"));
        // The following Monday is after the switch back to CET.
        assert_eq!(window.end, utc("2026-10-25T23:00:00Z"));
    }

    #[test]
    fn skipped_midnight_starts_at_first_valid_instant() {
        // Tehran jumped from 00:00 to 01:00 (+04:30) on Monday 2021-03-22.
        let window = WeekWindow::containing(utc("2021-03-22T12:00:00Z"), Tehran);
        assert_eq!(window.start, utc("2021-03-21T20:30:00Z"));
        assert_eq!(window.end, utc("2021-03-28T19:30:00Z"));
        // 01:30 local on that Monday.
        assert!(window.contains(utc("2021-03-21T21:00:00Z")));
        assert!(!window.contains(utc("2021-03-21T20:29:59Z")));
    }
}
