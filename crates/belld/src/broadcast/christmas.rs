use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serenity::all::ChannelId;

use crate::almanac::{self, ChristmasStatus};
use crate::broadcast::{Broadcast, Interval};

/// December-only daily countdown to Christmas Eve midnight, with the
/// remaining Advent Sundays.
pub struct Christmas {
    channel: ChannelId,
    timezone: Tz,
}

impl Christmas {
    pub fn new(channel: ChannelId, timezone: Tz) -> Self {
        Self { channel, timezone }
    }
}

impl Broadcast for Christmas {
    fn name(&self) -> &'static str {
        "christmas-countdown"
    }

    fn channel_id(&self) -> ChannelId {
        self.channel
    }

    fn interval(&self) -> Interval {
        Interval::Daily
    }

    fn enabled(&self, now: DateTime<Utc>) -> bool {
        now.with_timezone(&self.timezone).month() == 12
    }

    fn render(&self, now: DateTime<Utc>) -> String {
        let local = now.with_timezone(&self.timezone);
        match almanac::christmas_status(local) {
            ChristmasStatus::Arrived => [
                "🎄 Merry Christmas! 🎅",
                "",
                "🕯️ The long-awaited day has finally arrived, and we're celebrating the birth of Jesus Christ. 🙏 Let's rejoice in the gift of God's love and share it with everyone around us! 🌟",
                "",
                "I hope you like it. Have a wonderful Christmas! 🎁",
            ]
            .join("\n"),
            ChristmasStatus::Counting {
                days,
                hours,
                minutes,
            } => {
                let remaining = almanac::remaining_advent_sundays(local);
                let sundays = if remaining.is_empty() {
                    "🕯️ All the Advent Sundays have passed, and we're in the final stretch.\nLet's spread the holiday cheer and look forward to the joy and warmth that Christmas brings! 🌟"
                        .to_string()
                } else {
                    let list: Vec<String> = remaining
                        .iter()
                        .map(|sunday| format!("- {}", sunday.format("%B %-d, %Y")))
                        .collect();
                    format!("🕯️ The remaining Advent Sundays are:\n{}", list.join("\n"))
                };

                format!(
                    "🎄 With **{days}** days, **{hours}** hours, and **{minutes}** minutes left, Christmas is just around the corner! 🎅\n\n{sundays}"
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::London;

    fn broadcast() -> Christmas {
        Christmas::new(ChannelId::new(1), London)
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn only_enabled_in_december() {
        let b = broadcast();
        assert!(b.enabled(utc(2025, 12, 5, 12)));
        assert!(!b.enabled(utc(2025, 7, 5, 12)));
        // 23:30 UTC on November 30 is already December in CET.
        let cet = Christmas::new(ChannelId::new(1), chrono_tz::Europe::Paris);
        assert!(cet.enabled(utc(2025, 11, 30, 23)));
    }

    #[test]
    fn counts_down_with_remaining_sundays() {
        let text = broadcast().render(utc(2025, 12, 1, 12));
        assert!(text.contains("**22** days"), "{text}");
        assert!(text.contains("December 7, 2025"));
        assert!(text.contains("December 21, 2025"));
        assert!(!text.contains("November 30"));
    }

    #[test]
    fn final_stretch_after_last_sunday() {
        let text = broadcast().render(utc(2025, 12, 22, 12));
        assert!(text.contains("final stretch"), "{text}");
        assert!(!text.contains("remaining Advent Sundays are"));
    }

    #[test]
    fn arrival_message_on_the_day() {
        let now = London
            .with_ymd_and_hms(2025, 12, 24, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let text = broadcast().render(now);
        assert!(text.contains("Merry Christmas"));
        assert!(!text.contains("just around the corner"));
    }
}
