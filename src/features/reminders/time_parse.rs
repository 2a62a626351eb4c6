//! Natural-language reminder times
//!
//! Turns free text such as `in 1 hour`, `1h30m`, `tomorrow at 9am` or
//! `2025-03-01 14:00` into an absolute UTC timestamp. Everything is
//! interpreted in UTC and ambiguous inputs resolve to the future.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use regex::Regex;
use std::sync::OnceLock;

use crate::core::ReminderError;

/// Hour used when only a day is given (`tomorrow`, `friday`, `2025-03-01`)
const DEFAULT_HOUR: u32 = 9;
/// Hour used for a bare `tonight`
const TONIGHT_HOUR: u32 = 20;

fn compact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\d+[smhdw])+$").expect("valid regex"))
}

fn worded_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(\d+|an|a|one)\s*(weeks?|wks?|days?|hours?|hrs?|minutes?|mins?|seconds?|secs?)\b",
        )
        .expect("valid regex")
    })
}

fn anchored_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(today|tonight|tomorrow)|(next\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun))(?:\s+(?:at\s+)?(.+))?$",
        )
        .expect("valid regex")
    })
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").expect("valid regex"))
}

/// Parse `text` relative to `now`
///
/// The result is always strictly after `now`; inputs naming a past moment are
/// rejected rather than delivered immediately.
pub fn parse_time(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ReminderError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ReminderError::Parse(text.to_string()));
    }

    if let Some(at) = parse_absolute(trimmed) {
        return future_or_err(at, now, text);
    }

    let normalized = trimmed
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if let Some(secs) = parse_compact_duration(strip_relative_words(&normalized)) {
        return after(now, secs, text);
    }

    if let Some(secs) = parse_worded_duration(&normalized) {
        return after(now, secs, text);
    }

    if let Some(at) = parse_day_anchored(&normalized, now) {
        return future_or_err(at?, now, text);
    }

    if let Some(at) = parse_bare_time(&normalized, now) {
        return Ok(at);
    }

    Err(ReminderError::Parse(text.to_string()))
}

/// `now + secs`, rejecting offsets beyond what a timestamp can hold
fn after(now: DateTime<Utc>, secs: i64, text: &str) -> Result<DateTime<Utc>, ReminderError> {
    Duration::try_seconds(secs)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or_else(|| ReminderError::Parse(format!("{text} (that is too far in the future)")))
}

/// Drop the optional `in ` prefix and ` from now` suffix around a duration
fn strip_relative_words(text: &str) -> &str {
    let body = text.strip_prefix("in ").unwrap_or(text);
    body.strip_suffix(" from now").unwrap_or(body)
}

fn future_or_err(
    at: DateTime<Utc>,
    now: DateTime<Utc>,
    text: &str,
) -> Result<DateTime<Utc>, ReminderError> {
    if at <= now {
        Err(ReminderError::Parse(format!("{text} (that time has already passed)")))
    } else {
        Ok(at)
    }
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(DEFAULT_HOUR, 0, 0))
        .map(|ndt| ndt.and_utc())
}

/// Parse a compact duration like "30m", "2h", "1d", "1h30m" into seconds
fn parse_compact_duration(text: &str) -> Option<i64> {
    if !compact_re().is_match(text) {
        return None;
    }

    let mut total_seconds: i64 = 0;
    let mut current_number = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            current_number.push(c);
        } else {
            let value: i64 = current_number.parse().ok()?;
            current_number.clear();
            total_seconds = total_seconds.checked_add(value.checked_mul(unit_seconds(c)?)?)?;
        }
    }

    (total_seconds > 0).then_some(total_seconds)
}

fn unit_seconds(unit: char) -> Option<i64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(60 * 60),
        'd' => Some(60 * 60 * 24),
        'w' => Some(60 * 60 * 24 * 7),
        _ => None,
    }
}

/// Parse "in 2 hours and 30 minutes", "an hour", "5 mins from now"
fn parse_worded_duration(text: &str) -> Option<i64> {
    let body = strip_relative_words(text);

    let mut total_seconds: i64 = 0;
    let mut last_end = 0;
    let mut matched = false;

    for caps in worded_re().captures_iter(body) {
        let whole = caps.get(0)?;
        if !is_separator(&body[last_end..whole.start()], matched) {
            return None;
        }
        last_end = whole.end();
        matched = true;

        let amount: i64 = match &caps[1] {
            "a" | "an" | "one" => 1,
            n => n.parse().ok()?,
        };
        // Unit words all start with their compact letter (w, d, h, m, s)
        let per_unit = unit_seconds(caps[2].chars().next()?)?;
        total_seconds = total_seconds.checked_add(amount.checked_mul(per_unit)?)?;
    }

    if !matched || !body[last_end..].trim().is_empty() {
        return None;
    }
    (total_seconds > 0).then_some(total_seconds)
}

fn is_separator(gap: &str, after_first: bool) -> bool {
    let gap = gap.trim();
    if !after_first {
        return gap.is_empty();
    }
    matches!(gap, "" | "and" | "," | ", and")
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    Some(match name {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    })
}

/// Parse "tomorrow at 9am", "tonight", "next friday 17:30"
///
/// Returns `None` when the text is not day-anchored at all, and `Some(Err)`
/// when it is but the time part is malformed.
fn parse_day_anchored(
    text: &str,
    now: DateTime<Utc>,
) -> Option<Result<DateTime<Utc>, ReminderError>> {
    let caps = anchored_re().captures(text)?;
    let clock = match caps.get(4) {
        Some(m) => match parse_clock(m.as_str(), true) {
            Some(t) => Some(t),
            None => return Some(Err(ReminderError::Parse(text.to_string()))),
        },
        None => None,
    };
    let today = now.date_naive();

    let (date, default_hour) = if let Some(day) = caps.get(1) {
        match day.as_str() {
            "today" => {
                if clock.is_none() {
                    return Some(Err(ReminderError::Parse(text.to_string())));
                }
                (today, DEFAULT_HOUR)
            }
            "tonight" => (today, TONIGHT_HOUR),
            _ => (today.succ_opt()?, DEFAULT_HOUR),
        }
    } else {
        let target = parse_weekday(caps.get(3)?.as_str())?;
        let explicit_next = caps.get(2).is_some();
        let mut days_ahead = (7 + target.num_days_from_monday() as i64
            - today.weekday().num_days_from_monday() as i64)
            % 7;
        if days_ahead == 0 {
            let time = clock.unwrap_or_else(|| hour(DEFAULT_HOUR));
            if explicit_next || today.and_time(time).and_utc() <= now {
                days_ahead = 7;
            }
        }
        (today + Duration::days(days_ahead), DEFAULT_HOUR)
    };

    let time = clock.unwrap_or_else(|| hour(default_hour));
    Some(Ok(date.and_time(time).and_utc()))
}

/// Parse "at 5pm", "17:30", "noon"; rolls over to tomorrow when already past
fn parse_bare_time(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (body, has_at) = match text.strip_prefix("at ") {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    let time = parse_clock(body, has_at)?;
    let today = now.date_naive().and_time(time).and_utc();
    if today > now {
        Some(today)
    } else {
        Some(today + Duration::days(1))
    }
}

/// Parse a wall-clock time
///
/// A bare hour ("5") is only accepted when the caller already knows the text
/// is a time, e.g. after "at".
fn parse_clock(text: &str, allow_bare_hour: bool) -> Option<NaiveTime> {
    match text.trim() {
        "noon" | "midday" => return Some(hour(12)),
        "midnight" => return Some(hour(0)),
        _ => {}
    }

    let caps = clock_re().captures(text.trim())?;
    let mut h: u32 = caps[1].parse().ok()?;
    let m: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    match caps.get(3).map(|m| m.as_str()) {
        Some(meridiem) => {
            if !(1..=12).contains(&h) {
                return None;
            }
            h %= 12;
            if meridiem == "pm" {
                h += 12;
            }
        }
        None => {
            if caps.get(2).is_none() && !allow_bare_hour {
                return None;
            }
        }
    }

    NaiveTime::from_hms_opt(h, m, 0)
}

fn hour(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Format a duration in seconds into a human-readable string
pub fn format_duration(seconds: i64) -> String {
    fn unit(n: i64, name: &str) -> String {
        format!("{} {}{}", n, name, if n == 1 { "" } else { "s" })
    }

    if seconds < 60 {
        unit(seconds, "second")
    } else if seconds < 3600 {
        unit(seconds / 60, "minute")
    } else if seconds < 86400 {
        let mins = (seconds % 3600) / 60;
        if mins > 0 {
            format!("{} {}", unit(seconds / 3600, "hour"), unit(mins, "minute"))
        } else {
            unit(seconds / 3600, "hour")
        }
    } else {
        let hours = (seconds % 86400) / 3600;
        if hours > 0 {
            format!("{} {}", unit(seconds / 86400, "day"), unit(hours, "hour"))
        } else {
            unit(seconds / 86400, "day")
        }
    }
}
