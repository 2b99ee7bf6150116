//! Collapses the IANA timezone database into distinct UTC-offset buckets
//! and tracks how long each bucket has until the next New Year.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Datelike, Offset, TimeZone, Utc};
use chrono_tz::{TZ_VARIANTS, Tz};

/// One distinct UTC offset currently in effect somewhere in the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneBucket {
    /// Representative identifier, e.g. `America/New_York`.
    pub name: String,
    /// Offset label, e.g. `UTC-05:00`.
    pub offset: String,
    /// Signed minutes until the target New Year's midnight; negative once
    /// it has arrived.
    pub minutes_until: i64,
    /// Every other identifier sharing this offset, in database order.
    pub aliases: Vec<String>,
}

impl TimezoneBucket {
    /// Aliases worth showing to humans, filtered to well-known cities.
    pub fn notable_aliases(&self) -> Vec<&str> {
        self.aliases
            .iter()
            .filter(|alias| NOTABLE_CITIES.iter().any(|city| alias.contains(city)))
            .map(String::as_str)
            .collect()
    }
}

/// The year whose January 1 everyone is counting down to.
pub fn target_year(now: DateTime<Utc>) -> i32 {
    if now.month() == 12 {
        now.year() + 1
    } else {
        now.year()
    }
}

/// Zones whose distance to the target midnight exceeds this are assumed
/// to carry bad historical data and are dropped.
const OUT_OF_RANGE_MINUTES: i64 = 366 * 24 * 60;

/// Arrived buckets stay on the dashboard for this long after their
/// midnight has passed.
pub const DASHBOARD_WINDOW_MINUTES: i64 = 12 * 60;

/// Buckets that crossed midnight within this window are eligible for a
/// greeting.
pub const GREETING_WINDOW_MINUTES: i64 = 24 * 60;

/// Snapshots every known timezone into offset buckets, sorted soonest
/// midnight first.
///
/// Membership is a function of the instant: a zone sits in whatever
/// bucket matches its offset right now, so two calls straddling a DST
/// transition may disagree.
pub fn catalog(now: DateTime<Utc>) -> Vec<TimezoneBucket> {
    let year = target_year(now);

    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, (Vec<&'static str>, i64)> = HashMap::new();

    for tz in TZ_VARIANTS {
        let Some(new_year) = tz.with_ymd_and_hms(year, 1, 1, 0, 0, 0).earliest() else {
            continue;
        };
        let minutes = new_year.signed_duration_since(&now).num_minutes();
        if minutes.abs() > OUT_OF_RANGE_MINUTES {
            continue;
        }

        let local = now.with_timezone(&tz);
        let label = offset_label(local.offset().fix().local_minus_utc());
        if !buckets.contains_key(&label) {
            order.push(label.clone());
            buckets.insert(label.clone(), (Vec::new(), minutes));
        }
        if let Some((members, _)) = buckets.get_mut(&label) {
            members.push(tz.name());
        }
    }

    let mut out: Vec<TimezoneBucket> = order
        .iter()
        .filter_map(|label| {
            let (members, minutes) = buckets.get(label)?;
            let name = representative(label, members)?;
            let aliases = members
                .iter()
                .filter(|member| **member != name)
                .map(|member| (*member).to_string())
                .collect();
            Some(TimezoneBucket {
                name: name.to_string(),
                offset: label.clone(),
                minutes_until: *minutes,
                aliases,
            })
        })
        .collect();

    out.sort_by_key(|bucket| bucket.minutes_until);
    out
}

/// Picks the bucket representative: the curated name for this offset when
/// it is currently a member, otherwise the first member encountered.
///
/// The membership check matters: unconditional promotion would surface a
/// zone in two buckets whenever DST moves it off its canonical offset.
fn representative(label: &str, members: &[&'static str]) -> Option<&'static str> {
    if let Some(preferred) = priority_name(label)
        && members.contains(&preferred)
    {
        return Some(preferred);
    }
    members.first().copied()
}

fn offset_label(offset_seconds: i32) -> String {
    let minutes = offset_seconds / 60;
    let sign = if minutes < 0 { '-' } else { '+' };
    let magnitude = minutes.abs();
    format!("UTC{sign}{:02}:{:02}", magnitude / 60, magnitude % 60)
}

/// Buckets whose midnight arrived within the greeting window, most
/// recently arrived first.
pub fn arrived_recently(buckets: &[TimezoneBucket]) -> Vec<&TimezoneBucket> {
    let mut arrived: Vec<&TimezoneBucket> = buckets
        .iter()
        .filter(|b| b.minutes_until <= 0 && b.minutes_until > -GREETING_WINDOW_MINUTES)
        .collect();
    arrived.sort_by_key(|b| Reverse(b.minutes_until));
    arrived
}

/// Buckets still interesting for the dashboard: everything upcoming plus
/// arrivals from the last twelve hours.
pub fn dashboard_buckets(buckets: &[TimezoneBucket]) -> Vec<&TimezoneBucket> {
    buckets
        .iter()
        .filter(|b| b.minutes_until > -DASHBOARD_WINDOW_MINUTES)
        .collect()
}

fn priority_name(label: &str) -> Option<&'static str> {
    PRIORITY_REPRESENTATIVES
        .iter()
        .find(|(offset, _)| *offset == label)
        .map(|(_, name)| *name)
}

/// Preferred representative per offset. Without this the bucket is named
/// after whichever zone the database lists first, usually an obscure one.
const PRIORITY_REPRESENTATIVES: &[(&str, &str)] = &[
    ("UTC-12:00", "Etc/GMT+12"),
    ("UTC-11:00", "Pacific/Pago_Pago"),
    ("UTC-10:00", "Pacific/Honolulu"),
    ("UTC-09:30", "Pacific/Marquesas"),
    ("UTC-09:00", "America/Anchorage"),
    ("UTC-08:00", "America/Los_Angeles"),
    ("UTC-07:00", "America/Denver"),
    ("UTC-06:00", "America/Chicago"),
    ("UTC-05:00", "America/New_York"),
    ("UTC-04:00", "America/Halifax"),
    ("UTC-03:30", "America/St_Johns"),
    ("UTC-03:00", "America/Argentina/Buenos_Aires"),
    ("UTC-02:00", "Atlantic/South_Georgia"),
    ("UTC-01:00", "Atlantic/Cape_Verde"),
    ("UTC+00:00", "Europe/London"),
    ("UTC+01:00", "Europe/Paris"),
    ("UTC+02:00", "Africa/Cairo"),
    ("UTC+03:00", "Europe/Moscow"),
    ("UTC+03:30", "Asia/Tehran"),
    ("UTC+04:00", "Asia/Dubai"),
    ("UTC+04:30", "Asia/Kabul"),
    ("UTC+05:00", "Asia/Karachi"),
    ("UTC+05:30", "Asia/Kolkata"),
    ("UTC+05:45", "Asia/Kathmandu"),
    ("UTC+06:00", "Asia/Dhaka"),
    ("UTC+06:30", "Asia/Yangon"),
    ("UTC+07:00", "Asia/Bangkok"),
    ("UTC+08:00", "Asia/Shanghai"),
    ("UTC+08:45", "Australia/Eucla"),
    ("UTC+09:00", "Asia/Tokyo"),
    ("UTC+09:30", "Australia/Adelaide"),
    ("UTC+10:00", "Australia/Sydney"),
    ("UTC+10:30", "Australia/Lord_Howe"),
    ("UTC+11:00", "Pacific/Guadalcanal"),
    ("UTC+12:00", "Pacific/Auckland"),
    ("UTC+12:45", "Pacific/Chatham"),
    ("UTC+13:00", "Pacific/Tongatapu"),
    ("UTC+14:00", "Pacific/Kiritimati"),
];

/// Cities people actually recognize; aliases outside this list stay off
/// the dashboard.
const NOTABLE_CITIES: &[&str] = &[
    "New_York",
    "Los_Angeles",
    "London",
    "Paris",
    "Tokyo",
    "Sydney",
    "Dubai",
    "Mumbai",
    "Singapore",
    "Hong_Kong",
    "Bangkok",
    "Moscow",
    "Istanbul",
    "Cairo",
    "Toronto",
    "Mexico_City",
    "Sao_Paulo",
    "Buenos_Aires",
    "Auckland",
    "Shanghai",
    "Beijing",
    "Seoul",
    "Delhi",
    "Lagos",
    "Vancouver",
    "Bratislava",
    "Berlin",
    "Rome",
    "Madrid",
];
