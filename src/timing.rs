//! Duration parsing and upload-age window checks.
//!
//! Two precisions of age check exist:
//!
//! - **Coarse** ([`coarse_within_age`]): evaluated during Discovery against a
//!   relative label (`3시간 전`, `2 days ago`) without any network round trip.
//!   It is deliberately permissive and never rejects an item the precise check
//!   would keep.
//! - **Precise** ([`precise_within_age`]): evaluated during Enrichment against
//!   the authoritative upload instant. The window is exclusive at `max_age`.
//!
//! Every parser here is lenient: unparseable input yields `0` seconds or
//! `None`, never an error.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use once_cell::sync::Lazy;
use crate::text::rules::compile;
use regex::Regex;
use std::time::Duration;

/// Canonical zone for upload instants (KST, UTC+09:00, no DST).
pub const KST: FixedOffset = match FixedOffset::east_opt(9 * 3600) {
    Some(offset) => offset,
    None => panic!("invalid KST offset"),
};

/// Display format for canonical instants (second precision).
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static ISO_DURATION: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)^P(?:(\d+)D)?T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$"));

static KOREAN_DURATION: Lazy<Regex> =
    Lazy::new(|| compile(r"^(?:(\d+)\s*시간)?\s*(?:(\d+)\s*분)?\s*(?:(\d+)\s*초)?$"));

static KOREAN_RELATIVE: Lazy<Regex> =
    Lazy::new(|| compile(r"(\d+)\s*(초|분|시간|일|주|개월|달|년)\s*전"));

static ENGLISH_RELATIVE: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?i)(\d+)\s*(second|minute|hour|day|week|month|year)s?\s+ago")
});

/// Convert a length label into seconds.
///
/// Accepted shapes:
/// - colon-delimited `[[H:]M:]S` (`1:30`, `0:05:10`)
/// - ISO-8601 `PT#H#M#S` (`PT1H2M3S`)
/// - Korean units (`1시간 2분 3초`, `1분 30초`)
///
/// Anything else yields `0`, which later fails the duration-band check. So
/// does a total too large for `u64`.
pub fn parse_duration(s: &str) -> u64 {
    let s = s.trim();
    if s.is_empty() {
        return 0;
    }

    if let Some(secs) = parse_colon_duration(s) {
        return secs;
    }

    if let Some(caps) = ISO_DURATION.captures(s) {
        let parts = [(1, 86_400), (2, 3_600), (3, 60), (4, 1)];
        return sum_units(&caps, &parts).unwrap_or(0);
    }

    if let Some(caps) = KOREAN_DURATION.captures(s) {
        let parts = [(1, 3_600), (2, 60), (3, 1)];
        return sum_units(&caps, &parts).unwrap_or(0);
    }

    0
}

fn parse_colon_duration(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let mut total = 0u64;
    for part in parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(part.parse::<u64>().ok()?)?;
    }
    Some(total)
}

/// Sum `(capture group, seconds per unit)` pairs; `None` on overflow or a
/// count that does not fit `u64`.
fn sum_units(caps: &regex::Captures<'_>, parts: &[(usize, u64)]) -> Option<u64> {
    parts.iter().try_fold(0u64, |total, &(group, unit)| {
        let count: u64 = match caps.get(group) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        total.checked_add(count.checked_mul(unit)?)
    })
}

/// Granularity of a relative upload label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl AgeUnit {
    fn seconds(self) -> u64 {
        match self {
            AgeUnit::Second => 1,
            AgeUnit::Minute => 60,
            AgeUnit::Hour => 3_600,
            AgeUnit::Day => 86_400,
            AgeUnit::Week => 7 * 86_400,
            AgeUnit::Month => 30 * 86_400,
            AgeUnit::Year => 365 * 86_400,
        }
    }
}

/// A parsed relative label such as `3시간 전`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeAge {
    pub amount: u64,
    pub unit: AgeUnit,
}

impl RelativeAge {
    /// Parse a Korean (`N시간 전`) or English (`N hours ago`) relative label.
    pub fn parse(label: &str) -> Option<Self> {
        if let Some(caps) = KOREAN_RELATIVE.captures(label) {
            let amount = caps[1].parse().ok()?;
            let unit = match &caps[2] {
                "초" => AgeUnit::Second,
                "분" => AgeUnit::Minute,
                "시간" => AgeUnit::Hour,
                "일" => AgeUnit::Day,
                "주" => AgeUnit::Week,
                "개월" | "달" => AgeUnit::Month,
                _ => AgeUnit::Year,
            };
            return Some(Self { amount, unit });
        }
        let caps = ENGLISH_RELATIVE.captures(label)?;
        let amount = caps[1].parse().ok()?;
        let unit = match caps[2].to_ascii_lowercase().as_str() {
            "second" => AgeUnit::Second,
            "minute" => AgeUnit::Minute,
            "hour" => AgeUnit::Hour,
            "day" => AgeUnit::Day,
            "week" => AgeUnit::Week,
            "month" => AgeUnit::Month,
            _ => AgeUnit::Year,
        };
        Some(Self { amount, unit })
    }

    /// Smallest true age the label can stand for.
    ///
    /// Labels are floored by the source, so `1일 전` means at least 24 hours.
    pub fn lower_bound_secs(&self) -> u64 {
        self.amount.saturating_mul(self.unit.seconds())
    }

    /// Whether the label guarantees the item is at or past the window boundary.
    pub fn is_beyond(&self, max_age: Duration) -> bool {
        self.lower_bound_secs() >= max_age.as_secs()
    }
}

/// Coarse, discovery-stage age check against a relative label.
///
/// Day-granularity labels are admissible whenever the day count does not
/// exceed `max_age` in whole days; exact-boundary rejection is left to
/// [`precise_within_age`].
pub fn coarse_within_age(age: &RelativeAge, max_age: Duration) -> bool {
    let max = max_age.as_secs();
    if age.lower_bound_secs() < max {
        return true;
    }
    age.unit == AgeUnit::Day && age.amount <= max / 86_400
}

/// Authoritative age check: `now - upload < max_age`.
///
/// Uploads stamped in the future (clock skew) are inside the window.
pub fn precise_within_age(
    upload: &DateTime<FixedOffset>,
    now: &DateTime<FixedOffset>,
    max_age: Duration,
) -> bool {
    let age = now.signed_duration_since(*upload).num_seconds();
    age < i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX)
}

/// Current instant in the canonical zone.
pub fn now_canonical() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&KST)
}

/// Parse an absolute upload timestamp and move it into the canonical zone.
///
/// Accepts RFC 3339 (`2025-06-13T02:00:12-07:00`). Date-only values are too
/// coarse for the precise check and yield `None`.
pub fn parse_upload_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&KST));
    }
    if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        tracing::debug!(value = %s, "Upload date has no time component; treating as absent");
    }
    None
}

/// Format an instant in the canonical zone and format.
pub fn format_canonical(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&KST).format(CANONICAL_FORMAT).to_string()
}
