//! Date rendering with moment-style format patterns.
//!
//! Patterns such as `YYYY-MM-DD HH:mm:ss` are translated token by token into
//! a chrono `strftime` string. Text inside `[...]` is copied literally, as is
//! any character that is not a recognised token, so formatting never fails.

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use serde::Serialize;

/// Pattern used when the caller supplies none.
pub const DEFAULT_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

/// Recognised tokens and their strftime equivalents.
///
/// Longer tokens precede their prefixes so the first match is the longest.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("DD", "%d"),
    ("D", "%-d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("SSS", "%3f"),
    ("A", "%p"),
    ("a", "%P"),
    ("ZZ", "%z"),
    ("Z", "%:z"),
    ("X", "%s"),
];

/// Translate a moment-style pattern into a chrono strftime string.
pub fn to_strftime(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            // Unterminated brackets run to the end of the pattern.
            let body = &rest[1..];
            let (literal, remaining) = match body.find(']') {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
            push_literal(&mut out, literal);
            rest = remaining;
            continue;
        }

        match TOKENS.iter().find(|(token, _)| rest.starts_with(token)) {
            Some((token, spec)) => {
                out.push_str(spec);
                rest = &rest[token.len()..];
            }
            None => {
                push_literal(&mut out, &rest[..c.len_utf8()]);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    out
}

fn push_literal(out: &mut String, literal: &str) {
    for c in literal.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}

/// Render `dt` using a moment-style pattern.
pub fn format_with<Tz>(dt: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dt.format(&to_strftime(pattern)).to_string()
}

/// Local time as RFC 3339 with offset, seconds precision.
pub fn local_timestamp(dt: &DateTime<Local>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Four renderings of a single instant.
#[derive(Debug, Clone, Serialize)]
pub struct DateReport {
    /// Local time rendered with the pattern.
    pub current: String,
    /// UTC time rendered with the pattern.
    pub utc: String,
    /// Unix epoch seconds.
    pub unix: i64,
    /// ISO-8601 UTC with milliseconds.
    pub iso: String,
}

impl DateReport {
    /// Build the report for `now` with the given pattern.
    pub fn at(now: DateTime<Utc>, pattern: &str) -> Self {
        Self {
            current: format_with(&now.with_timezone(&Local), pattern),
            utc: format_with(&now, pattern),
            unix: now.timestamp(),
            iso: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
