//! Best-effort "is this link recent?" heuristic for harvested links.
//!
//! A text is recent when it mentions a calendar date no older than
//! [`RECENCY_WINDOW_DAYS`] or one of a handful of recency keywords. The
//! flag is informational only; it never decides whether a link is stored.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};

/// How many days back a date still counts as recent.
pub const RECENCY_WINDOW_DAYS: i64 = 5;

#[derive(Debug, Clone, Copy)]
enum DateOrder {
    DayMonthYear,
    YearMonthDay,
}

static DATE_PATTERNS: LazyLock<Vec<(Regex, DateOrder)>> = LazyLock::new(|| {
    [
        (r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b", DateOrder::DayMonthYear),
        (r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b", DateOrder::DayMonthYear),
        (r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b", DateOrder::YearMonthDay),
        (r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b", DateOrder::DayMonthYear),
    ]
    .into_iter()
    .filter_map(|(pattern, order)| Regex::new(pattern).ok().map(|re| (re, order)))
    .collect()
});

static RECENCY_KEYWORDS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(today|yesterday|recent|new|latest|updated)").ok()
});

/// True if `text` carries a recent date or a recency keyword.
pub fn is_recent(text: &str, today: NaiveDate) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if RECENCY_KEYWORDS
        .as_ref()
        .is_some_and(|re| re.is_match(text))
    {
        return true;
    }
    mentions_recent_date(text, today)
}

fn mentions_recent_date(text: &str, today: NaiveDate) -> bool {
    DATE_PATTERNS.iter().any(|(re, order)| {
        re.captures_iter(text).any(|caps| {
            // Impossible dates (31/02/2026, 99.99.2026) are skipped, not fatal.
            parse_date(&caps, *order).is_some_and(|date| within_window(date, today))
        })
    })
}

fn parse_date(caps: &Captures<'_>, order: DateOrder) -> Option<NaiveDate> {
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let (year, month, day) = match order {
        DateOrder::DayMonthYear => (field(3)?, field(2)?, field(1)?),
        DateOrder::YearMonthDay => (field(1)?, field(2)?, field(3)?),
    };
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn within_window(date: NaiveDate, today: NaiveDate) -> bool {
    let age = today.signed_duration_since(date).num_days();
    (0..=RECENCY_WINDOW_DAYS).contains(&age)
}
