use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use std::sync::LazyLock;

use crate::core::task::TIME_FORMAT;

static EXPLICIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}\s+\d{4}$").unwrap());

static WEEKDAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<day>[A-Za-z]+)(?:\s+(?P<hour>\d{2})(?P<minute>\d{2}))?$").unwrap()
});

/// Clock time used when a weekday phrase gives none.
const DEFAULT_HOUR: u32 = 23;
const DEFAULT_MINUTE: u32 = 59;

/// Resolve a time phrase relative to `now`.
///
/// Accepts `dd/mm/yyyy HHmm` with strict calendar checks, or an English
/// weekday name (full or abbreviated, any case) with an optional `HHmm`,
/// which resolves to the first such moment strictly after `now`. Anything
/// else yields `None`.
pub fn parse_time(phrase: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let phrase = phrase.trim();
    if EXPLICIT_RE.is_match(phrase) {
        return NaiveDateTime::parse_from_str(phrase, TIME_FORMAT).ok();
    }

    let caps = WEEKDAY_RE.captures(phrase)?;
    let weekday: Weekday = caps["day"].parse().ok()?;
    let time = match (caps.name("hour"), caps.name("minute")) {
        (Some(h), Some(m)) => {
            NaiveTime::from_hms_opt(h.as_str().parse().ok()?, m.as_str().parse().ok()?, 0)?
        }
        _ => NaiveTime::from_hms_opt(DEFAULT_HOUR, DEFAULT_MINUTE, 0)?,
    };
    next_weekday_at(weekday, time, now)
}

fn next_weekday_at(weekday: Weekday, time: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    (0..=7)
        .map(|offset| (now.date() + Duration::days(offset)).and_time(time))
        .find(|candidate| candidate.weekday() == weekday && *candidate > now)
}
