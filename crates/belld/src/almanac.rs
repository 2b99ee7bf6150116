//! Calendar arithmetic for the countdown broadcasts.
//!
//! Everything in here is pure: callers pass in "now" already converted to
//! the reference timezone, so ticks stay deterministic and testable.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Weekday};
use chrono_tz::Tz;

/// How far the current year has progressed, in calendar days of the
/// reference timezone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearProgress {
    pub elapsed_days: i64,
    pub remaining_days: i64,
    pub total_days: i64,
    pub percentage: f64,
}

/// Computes year progress for `now`.
///
/// Day counts are calendar-day truncated in `now`'s timezone, so a DST
/// shift earlier in the year does not knock a day off the elapsed count.
/// `elapsed_days + remaining_days == total_days` always holds.
pub fn year_progress(now: DateTime<Tz>) -> YearProgress {
    let date = now.date_naive();
    let total_days = days_in_year(date.year());
    let elapsed_days = i64::from(date.ordinal0());
    let remaining_days = total_days - elapsed_days;
    let percentage = elapsed_days as f64 / total_days as f64 * 100.0;

    YearProgress {
        elapsed_days,
        remaining_days,
        total_days,
        percentage,
    }
}

fn days_in_year(year: i32) -> i64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

/// State of the Christmas countdown at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChristmasStatus {
    /// The target instant has been reached exactly.
    Arrived,
    Counting { days: i64, hours: i64, minutes: i64 },
}

/// Start of day on December 24 in `now`'s timezone, rolled forward one
/// year once the current year's target has passed.
pub fn christmas_target(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let eve = |year: i32| tz.with_ymd_and_hms(year, 12, 24, 0, 0, 0).earliest();

    let target = eve(now.year())?;
    if *now > target { eve(now.year() + 1) } else { Some(target) }
}

/// Decomposes the time remaining until Christmas into whole days, hours
/// and minutes. Exactly zero remaining reports `Arrived`, never a
/// negative countdown. A nonexistent local midnight (DST gap) also counts
/// as arrived rather than failing the tick.
pub fn christmas_status(now: DateTime<Tz>) -> ChristmasStatus {
    let Some(target) = christmas_target(&now) else {
        return ChristmasStatus::Arrived;
    };

    let duration = target.signed_duration_since(&now);
    if duration <= Duration::zero() {
        return ChristmasStatus::Arrived;
    }

    ChristmasStatus::Counting {
        days: duration.num_days(),
        hours: duration.num_hours() % 24,
        minutes: duration.num_minutes() % 60,
    }
}

/// The four Advent Sundays preceding the upcoming Christmas.
///
/// Sunday 1 is the first Sunday on or after November 27; the rest follow
/// at one-week steps. The Christmas year rolls forward once December 24
/// has passed.
pub fn advent_sundays(now: DateTime<Tz>) -> Vec<NaiveDate> {
    let date = now.date_naive();
    let year = if date.month() == 12 && date.day() > 24 {
        date.year() + 1
    } else {
        date.year()
    };

    let Some(mut first) = NaiveDate::from_ymd_opt(year, 11, 27) else {
        return Vec::new();
    };
    while first.weekday() != Weekday::Sun {
        first = match first.succ_opt() {
            Some(next) => next,
            None => return Vec::new(),
        };
    }

    (0..4).map(|week| first + Duration::weeks(week)).collect()
}

/// Advent Sundays strictly after `now`'s calendar date.
pub fn remaining_advent_sundays(now: DateTime<Tz>) -> Vec<NaiveDate> {
    let today = now.date_naive();
    advent_sundays(now)
        .into_iter()
        .filter(|sunday| *sunday > today)
        .collect()
}

/// The next local midnight after `now`. If midnight falls into a DST gap
/// the tick fires at 01:00 instead.
pub fn next_local_midnight(now: DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let next = now.date_naive().succ_opt()?;

    let at = |hour: u32| {
        next.and_hms_opt(hour, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
    };
    at(0).or_else(|| at(1))
}
