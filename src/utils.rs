//! Stateless helpers: date parsing and formatting, input validation, and string
//! and tag normalisation.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::hash::Hash;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use regex::Regex;

use crate::error::{Error, Result};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});
static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,20}$").expect("username pattern"));
static SLUG_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("slug strip pattern"));
static SLUG_JOIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("slug join pattern"));

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - weekday names ("fri", "friday", "this friday") and "next friday"
/// - "end of week" / "eow", "end of month" / "eom"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => return Some(start_end_of_week(today).1),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            return NaiveDate::from_ymd_opt(year, month, 1).map(|d| d - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(unit) = rest.chars().last() {
            let num = &rest[..rest.len() - unit.len_utf8()];
            if let Ok(n) = num.trim().parse::<i64>() {
                // Months are approximated as 30 days.
                let per_unit = match unit {
                    'd' => 1,
                    'w' => 7,
                    'm' => 30,
                    _ => return None,
                };
                let days = Duration::try_days(n.checked_mul(per_unit)?)?;
                return today.checked_add_signed(days);
            }
        }
    }

    let (next, day) = match s.strip_prefix("next ") {
        Some(day) => (true, day),
        None => (false, s.strip_prefix("this ").unwrap_or(s.as_str())),
    };
    if let Some(target) = parse_weekday(day) {
        let ahead = (target.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
        let ahead = if next { ahead + 7 } else { ahead };
        return Some(today + Duration::days(i64::from(ahead)));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    let day = match s {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tuesday" => Weekday::Tue,
        "wed" | "wednesday" => Weekday::Wed,
        "thu" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Monday and Sunday of the ISO week containing `today`.
pub fn start_end_of_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (start, start + Duration::days(6))
}

/// Whole days from `now` until `due`, rounded down (negative once overdue).
pub fn days_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due - now).num_seconds().div_euclid(86_400)
}

/// True once `now` is past `due`; a task due right now is not overdue yet.
pub fn is_overdue(due: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due < now
}

pub fn is_due_today(due: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due.date_naive() == now.date_naive()
}

/// Format a timestamp with a strftime-style pattern, falling back to RFC 3339 when the
/// pattern is invalid.
pub fn format_date(date: DateTime<Utc>, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        return date.to_rfc3339();
    }
    out
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => match (d.date_naive() - today).num_days() {
            0 => "today".into(),
            1 => "tomorrow".into(),
            n if n > 1 => format!("in {n}d"),
            n => format!("{}d late", -n),
        },
    }
}

pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Usernames are 3 to 20 ASCII letters, digits or underscores.
pub fn validate_username(username: &str) -> bool {
    USERNAME.is_match(username)
}

/// Check that `value` is between `min` and `max` characters long.
pub fn validate_string(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

/// Truncate `text` to at most `width` characters, ending in `...` when shortened.
pub fn truncate(text: &str, width: usize) -> String {
    const SUFFIX: &str = "...";
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(SUFFIX.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(SUFFIX);
    out
}

/// Convert text to a URL-friendly slug: "Hello World Test" becomes "hello-world-test".
pub fn to_slug(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    SLUG_JOIN.replace_all(&stripped, "-").into_owned()
}

pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize a tag string by trimming, lowercasing, and replacing spaces with hyphens.
pub fn normalise_tag(s: &str) -> String {
    s.trim().to_lowercase().replace(' ', "-")
}

/// Split comma-separated tag strings and normalize each tag, keeping the order given.
pub fn split_and_normalise_tags(inputs: &[String]) -> Vec<String> {
    unique(
        inputs
            .iter()
            .flat_map(|raw| raw.split(','))
            .map(normalise_tag)
            .filter(|t| !t.is_empty()),
    )
}

/// Drop repeated items, keeping the first occurrence of each.
pub fn unique<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
