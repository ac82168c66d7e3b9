//! Temporal phrase parsing for mailbox questions.
//!
//! Maps natural-language temporal phrases ("yesterday", "last 3 days",
//! "2025-11-02") to absolute `[after, before]` instants. Rules are evaluated
//! in a fixed order and the first match wins; questions with no temporal
//! phrase produce no date constraint at all.
//!
//! All boundaries are UTC day boundaries. `now` is injected by the caller so
//! derived ranges are reproducible in tests.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::defaults::DATE_RANGE_MAX_DAYS;

/// An absolute date window derived from a temporal phrase.
///
/// `description` is the human-readable form used in deterministic fallback
/// answers ("within last month", "yesterday", …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
    pub description: String,
}

impl DateRange {
    /// Provider query clause for this window (`after:` inclusive,
    /// `before:` exclusive, provider date syntax).
    pub fn query_clause(&self) -> String {
        let after = self.after.date_naive();
        let before = self.before.date_naive() + Duration::days(1);
        format!(
            "after:{} before:{}",
            after.format("%Y/%m/%d"),
            before.format("%Y/%m/%d")
        )
    }
}

fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc()
}

fn end_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("end of day is a valid time")
        .and_utc()
}

fn last_n_days_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"last\s+(\d{1,3})\s+days?").expect("valid regex"))
}

fn explicit_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(20\d{2})[-/.](\d{1,2})[-/.](\d{1,2})").expect("valid regex"))
}

/// Parse a temporal phrase out of a question.
///
/// Rules, first match wins:
/// 1. `yesterday` / `a day ago`
/// 2. `today`
/// 3. `last N days` (N clamped to `[1, 30]`)
/// 4. `last week` (7 days)
/// 5. `last month` (30 days)
/// 6. explicit `YYYY[-/.]MM[-/.]DD` (that single day)
pub fn parse_date_range(text: &str, now: DateTime<Utc>) -> Option<DateRange> {
    let text = text.to_lowercase();

    if text.contains("yesterday") || text.contains("a day ago") {
        let day = now - Duration::days(1);
        return Some(DateRange {
            after: start_of_day(day),
            before: end_of_day(day),
            description: "yesterday".to_string(),
        });
    }

    if text.contains("today") {
        return Some(DateRange {
            after: start_of_day(now),
            before: end_of_day(now),
            description: "today".to_string(),
        });
    }

    if let Some(caps) = last_n_days_re().captures(&text) {
        let n: i64 = caps[1].parse().unwrap_or(1);
        let n = n.clamp(1, DATE_RANGE_MAX_DAYS);
        return Some(DateRange {
            after: start_of_day(now - Duration::days(n)),
            before: end_of_day(now),
            description: format!("within last {} days", n),
        });
    }

    if text.contains("last week") {
        return Some(DateRange {
            after: start_of_day(now - Duration::days(7)),
            before: end_of_day(now),
            description: "within last week".to_string(),
        });
    }

    if text.contains("last month") {
        return Some(DateRange {
            after: start_of_day(now - Duration::days(30)),
            before: end_of_day(now),
            description: "within last month".to_string(),
        });
    }

    if let Some(caps) = explicit_date_re().captures(&text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(DateRange {
            after: start_of_day(midnight),
            before: end_of_day(midnight),
            description: format!("on {}", date.format("%Y-%m-%d")),
        });
    }

    None
}

/// Parse a message date header (RFC 2822, falling back to RFC 3339).
pub fn parse_message_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

// =============================================================================
// TESTS
// =============================================================================
