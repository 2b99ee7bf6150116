use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serenity::all::ChannelId;

use crate::almanac;
use crate::broadcast::{Broadcast, Interval};

/// Daily "the year is N% complete" message.
pub struct YearProgress {
    channel: ChannelId,
    timezone: Tz,
}

impl YearProgress {
    pub fn new(channel: ChannelId, timezone: Tz) -> Self {
        Self { channel, timezone }
    }
}

impl Broadcast for YearProgress {
    fn name(&self) -> &'static str {
        "year-progress"
    }

    fn channel_id(&self) -> ChannelId {
        self.channel
    }

    fn interval(&self) -> Interval {
        Interval::Daily
    }

    fn enabled(&self, _now: DateTime<Utc>) -> bool {
        true
    }

    fn render(&self, now: DateTime<Utc>) -> String {
        let progress = almanac::year_progress(now.with_timezone(&self.timezone));
        format!(
            "The year is now **{:.2}%** complete.\nWe've had **{}** days so far, with **{}** days left.",
            progress.percentage, progress.elapsed_days, progress.remaining_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::London;

    fn broadcast() -> YearProgress {
        YearProgress::new(ChannelId::new(1), London)
    }

    #[test]
    fn always_enabled_and_daily() {
        let b = broadcast();
        let now = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        assert!(b.enabled(now));
        assert_eq!(b.interval(), Interval::Daily);
    }

    #[test]
    fn renders_reference_timezone_figures() {
        // Midnight July 1 in London is still June 30 in UTC.
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 23, 0, 0).unwrap();
        let text = broadcast().render(now);
        assert!(text.contains("**49.59%**"), "{text}");
        assert!(text.contains("**181** days"));
        assert!(text.contains("**184** days"));
    }
}
