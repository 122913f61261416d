//! Minimal iCalendar reader: enough of RFC 5545 to pull VEVENT fields out of
//! the public feeds alumni agendas expose.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IcsEvent {
    pub summary: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub uid: Option<String>,
    pub description: Option<String>,
}

impl IcsEvent {
    /// Detail link, falling back to the UID the way many feeds use it
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().or(self.uid.as_deref())
    }
}

/// Parse every VEVENT in a calendar body. Unknown properties and malformed
/// lines are ignored.
pub fn parse_ics(body: &str) -> Vec<IcsEvent> {
    let mut events = Vec::new();
    let mut current: Option<IcsEvent> = None;

    for line in unfold_lines(body) {
        let Some((name, params, value)) = split_property(&line) else {
            continue;
        };
        match name.as_str() {
            "BEGIN" if value.eq_ignore_ascii_case("VEVENT") => {
                current = Some(IcsEvent::default());
            }
            "END" if value.eq_ignore_ascii_case("VEVENT") => {
                events.extend(current.take());
            }
            _ => {
                if let Some(ev) = current.as_mut() {
                    apply_property(ev, &name, params, value);
                }
            }
        }
    }
    events
}

fn apply_property(ev: &mut IcsEvent, name: &str, params: &str, value: &str) {
    match name {
        "SUMMARY" => ev.summary = non_empty(unescape_text(value)),
        "DTSTART" => ev.start = parse_ics_datetime(value, tzid_param(params)),
        "DTEND" => ev.end = parse_ics_datetime(value, tzid_param(params)),
        "LOCATION" => ev.location = non_empty(unescape_text(value)),
        "URL" => ev.url = non_empty(value.trim().to_string()),
        "UID" => ev.uid = non_empty(value.trim().to_string()),
        "DESCRIPTION" => ev.description = non_empty(unescape_text(value)),
        _ => {}
    }
}

/// Join continuation lines (those starting with a space or tab) onto the
/// previous line.
fn unfold_lines(body: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in body.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match raw.strip_prefix(|c: char| c == ' ' || c == '\t') {
            Some(rest) if !lines.is_empty() => {
                if let Some(last) = lines.last_mut() {
                    last.push_str(rest);
                }
            }
            _ => lines.push(raw.to_string()),
        }
    }
    lines
}

/// Split `NAME;PARAM=x:value` into upper-cased name, raw parameter list and
/// value. Colons inside quoted parameter values do not end the name part.
fn split_property(line: &str) -> Option<(String, &str, &str)> {
    let mut in_quotes = false;
    let mut colon = None;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let head = &line[..colon];
    let (name, params) = head.split_once(';').unwrap_or((head, ""));
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_uppercase(), params, &line[colon + 1..]))
}

/// `TZID` value from a raw parameter list, unquoted
fn tzid_param(params: &str) -> Option<&str> {
    params
        .split(';')
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("TZID"))
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
}

fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out.trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`.
///
/// Local times carrying an IANA `TZID` are converted from that zone; floating
/// times and zone names chrono-tz does not know are read as UTC. Dates are
/// midnight UTC.
pub fn parse_ics_datetime(value: &str, tzid: Option<&str>) -> Option<DateTime<Utc>> {
    let v = value.trim();
    let (v, utc) = match v.strip_suffix('Z') {
        Some(rest) => (rest, true),
        None => (v, false),
    };
    if v.contains('T') {
        let naive = NaiveDateTime::parse_from_str(v, "%Y%m%dT%H%M%S")
            .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y%m%dT%H%M"))
            .ok()?;
        let zone = if utc { None } else { tzid.and_then(|id| id.parse::<Tz>().ok()) };
        return Some(match zone {
            Some(tz) => local_to_utc(tz, naive),
            None => naive.and_utc(),
        });
    }
    let date = NaiveDate::parse_from_str(v, "%Y%m%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Ambiguous local times (clocks going back) take the earlier instant; times
/// inside a spring-forward gap use the offset in force before the gap.
fn local_to_utc(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
