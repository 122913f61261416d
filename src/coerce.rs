//! Best-effort value coercion.
//!
//! Sources disagree on how they encode dates: epoch seconds, epoch milliseconds,
//! ISO strings with or without offsets, or French agenda text such as
//! `mardi 12 mars 2025 à 19h00`. Everything here returns `Option` and never fails;
//! a value that cannot be read becomes `None`.

use crate::constants::EPOCH_MILLIS_THRESHOLD;
use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static AMPM_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b").expect("valid am/pm regex")
});

static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\s?[hH:](\d{2})?\b").expect("valid clock regex"));

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %Hh%M",
    "%d.%m.%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Coerce any JSON value into a UTC timestamp.
pub fn to_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                epoch_to_utc(i)
            } else {
                n.as_f64().and_then(epoch_float_to_utc)
            }
        }
        Value::String(s) => str_to_utc(s),
        _ => None,
    }
}

/// Coerce a string: digit-only strings are epochs, anything else is date text.
pub fn str_to_utc(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(epoch_to_utc);
    }
    parse_datetime_text(s)
}

/// Interpret an integer as a Unix epoch in seconds or milliseconds.
pub fn epoch_to_utc(n: i64) -> Option<DateTime<Utc>> {
    if (n as f64) > EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

fn epoch_float_to_utc(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    let millis = if n > EPOCH_MILLIS_THRESHOLD { n } else { n * 1000.0 };
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64)
}

/// Parse ISO, RFC 2822, day-first numeric or free-form English/French date text.
/// Naive values are read as UTC.
pub fn parse_datetime_text(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0).map(|ndt| Utc.from_utc_datetime(&ndt));
        }
    }

    parse_free_text(s)
}

/// Render a timestamp the way every export writes it: `2023-11-14T22:13:20Z`.
pub fn format_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn to_iso(value: &Value) -> Option<String> {
    to_utc(value).map(|dt| format_iso(&dt))
}

/// Join address fragments with ", ", skipping the empty ones.
pub fn concat_address<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_free_text(s: &str) -> Option<DateTime<Utc>> {
    let lowered = s.to_lowercase();
    let (time, rest) = extract_time(&lowered);

    let mut day: Option<u32> = None;
    let mut month: Option<u32> = None;
    let mut year: Option<i32> = None;
    // "mar" is both March and the French abbreviation for Tuesday
    let mut ambiguous_march = false;

    for token in rest.split(|c: char| !c.is_alphanumeric()) {
        if token.is_empty() {
            continue;
        }
        if token == "mar" {
            ambiguous_march = true;
            continue;
        }
        if month.is_none() {
            if let Some(m) = month_from_name(token) {
                month = Some(m);
                continue;
            }
        }
        if token.len() == 4 && token.chars().all(|c| c.is_ascii_digit()) {
            if year.is_none() {
                year = token.parse().ok();
            }
            continue;
        }
        if day.is_none() {
            if let Some(d) = day_from_token(token) {
                day = Some(d);
            }
        }
    }

    let month = month.or(if ambiguous_march { Some(3) } else { None })?;
    let date = NaiveDate::from_ymd_opt(year.unwrap_or_else(|| Utc::now().year()), month, day?)?;
    let time = time.unwrap_or_default();
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Pull a clock time out of the text and return what is left for date parsing.
fn extract_time(text: &str) -> (Option<NaiveTime>, String) {
    if let Some(caps) = AMPM_TIME_RE.captures(text) {
        let hour: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let is_pm = caps.get(3).map(|m| m.as_str() == "pm").unwrap_or(false);
        let hour_24 = match (is_pm, hour) {
            (true, h) if h != 12 => h + 12,
            (false, 12) => 0,
            (_, h) => h,
        };
        let rest = AMPM_TIME_RE.replace(text, " ").into_owned();
        return (NaiveTime::from_hms_opt(hour_24, minute, 0), rest);
    }
    if let Some(caps) = CLOCK_TIME_RE.captures(text) {
        let hour: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let rest = CLOCK_TIME_RE.replace(text, " ").into_owned();
        return (NaiveTime::from_hms_opt(hour, minute, 0), rest);
    }
    (None, text.to_string())
}

fn day_from_token(token: &str) -> Option<u32> {
    let digits = token
        .strip_suffix("er")
        .or_else(|| token.strip_suffix("st"))
        .or_else(|| token.strip_suffix("nd"))
        .or_else(|| token.strip_suffix("rd"))
        .or_else(|| token.strip_suffix("th"))
        .unwrap_or(token);
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

fn month_from_name(token: &str) -> Option<u32> {
    let month = match token {
        "janvier" | "janv" | "january" | "jan" => 1,
        "février" | "fevrier" | "févr" | "fevr" | "fév" | "fev" | "february" | "feb" => 2,
        "mars" | "march" => 3,
        "avril" | "avr" | "april" | "apr" => 4,
        "mai" | "may" => 5,
        "juin" | "june" | "jun" => 6,
        "juillet" | "juil" | "july" | "jul" => 7,
        "août" | "aout" | "aoû" | "august" | "aug" => 8,
        "septembre" | "sept" | "september" | "sep" => 9,
        "octobre" | "october" | "oct" => 10,
        "novembre" | "november" | "nov" => 11,
        "décembre" | "decembre" | "déc" | "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Serde adapter for optional timestamps written as `...Z` strings or `null`.
pub mod iso_opt {
    use super::format_iso;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&format_iso(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::str_to_utc))
    }
}
