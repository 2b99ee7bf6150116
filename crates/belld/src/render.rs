//! ANSI-coded text for the New Year dashboard.

use chrono::{DateTime, Utc};

use crate::timezone::TimezoneBucket;

const RESET: &str = "\u{1b}[0m";
const CYAN_BOLD: &str = "\u{1b}[1;36m";
const YELLOW: &str = "\u{1b}[0;33m";
const GREEN_BOLD: &str = "\u{1b}[1;32m";
const RED_BOLD: &str = "\u{1b}[1;31m";

/// Renders the full dashboard as a Discord `ansi` code block, one
/// two-line entry per bucket.
pub fn dashboard_block(buckets: &[&TimezoneBucket], now: DateTime<Utc>) -> String {
    let entries: Vec<String> = buckets
        .iter()
        .map(|bucket| format!("{}\n{}", header_line(bucket), clock_line(bucket, now)))
        .collect();
    format!("```ansi\n{}\n```", entries.join("\n\n"))
}

fn header_line(bucket: &TimezoneBucket) -> String {
    let notable: Vec<&str> = bucket.notable_aliases().into_iter().take(3).collect();
    let aliases = if notable.is_empty() {
        String::new()
    } else {
        format!(" [{}]", notable.join(", "))
    };
    format!(
        "{CYAN_BOLD}{}{RESET} {YELLOW}({}){RESET}{}",
        bucket.name, bucket.offset, aliases
    )
}

fn clock_line(bucket: &TimezoneBucket, now: DateTime<Utc>) -> String {
    if bucket.minutes_until <= 0 {
        return format!("  {RED_BOLD}🎉 ARRIVED! 🎉{RESET}");
    }

    let hours = bucket.minutes_until / 60;
    let minutes = bucket.minutes_until % 60;
    // The catalog only tracks whole minutes; fake a live seconds digit
    // off the wall clock so consecutive edits visibly move.
    let seconds = 59 - (now.timestamp() % 60);
    format!("  ⏱️ {GREEN_BOLD}{hours}h {minutes:02}m {seconds:02}s{RESET}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bucket(minutes_until: i64, aliases: &[&str]) -> TimezoneBucket {
        TimezoneBucket {
            name: "Asia/Kolkata".to_string(),
            offset: "UTC+05:30".to_string(),
            minutes_until,
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn block_is_ansi_fenced_and_names_the_bucket() {
        let b = bucket(90, &[]);
        let block = dashboard_block(&[&b], noon());
        assert!(block.starts_with("```ansi\n"));
        assert!(block.ends_with("\n```"));
        assert!(block.contains("Asia/Kolkata"));
        assert!(block.contains("(UTC+05:30)"));
    }

    #[test]
    fn countdown_decomposes_minutes() {
        let b = bucket(90, &[]);
        let line = clock_line(&b, noon());
        assert!(line.contains("1h 30m"), "{line}");
    }

    #[test]
    fn arrived_buckets_celebrate() {
        let b = bucket(0, &[]);
        assert!(clock_line(&b, noon()).contains("ARRIVED!"));
        let b = bucket(-15, &[]);
        assert!(clock_line(&b, noon()).contains("ARRIVED!"));
    }

    #[test]
    fn header_caps_aliases_at_three() {
        let b = bucket(
            10,
            &[
                "Europe/Berlin",
                "Europe/Rome",
                "Europe/Madrid",
                "Europe/Paris",
            ],
        );
        let line = header_line(&b);
        assert!(line.contains("[Europe/Berlin, Europe/Rome, Europe/Madrid]"));
        assert!(!line.contains("Europe/Paris"));
    }

    #[test]
    fn header_omits_alias_list_without_notable_aliases() {
        // The ANSI escapes themselves contain `[`, so check for the
        // closing bracket and the alias name instead.
        let b = bucket(10, &["Antarctica/Vostok"]);
        let line = header_line(&b);
        assert!(!line.contains(']'), "{line}");
        assert!(!line.contains("Antarctica"));
    }
}
