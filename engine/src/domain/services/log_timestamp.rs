//! Log timestamp formatting
//!
//! Translates moment-style date patterns (`YYYY-MM-DD HH:mm:ss`) used in process
//! declarations into chrono strftime strings.

use chrono::{DateTime, Local, TimeZone};
use std::fmt;

/// Pattern tokens, longest first so that `YYYY` wins over `YY`
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("DD", "%d"),
    ("D", "%-d"),
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
];

/// A compiled log date format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTimestampFormat {
    pattern: String,
    strftime: String,
}

impl LogTimestampFormat {
    /// Compile a moment-style pattern
    ///
    /// Text inside `[brackets]` is emitted literally. Characters that are not
    /// tokens are copied as-is.
    pub fn parse(pattern: &str) -> Self {
        let mut strftime = String::with_capacity(pattern.len() * 2);
        let mut rest = pattern;

        while let Some(c) = rest.chars().next() {
            if c == '[' {
                if let Some(end) = rest.find(']') {
                    push_literal(&mut strftime, &rest[1..end]);
                    rest = &rest[end + 1..];
                    continue;
                }
            }

            if let Some((token, spec)) = TOKENS.iter().find(|(token, _)| rest.starts_with(token)) {
                strftime.push_str(spec);
                rest = &rest[token.len()..];
                continue;
            }

            push_literal(&mut strftime, &rest[..c.len_utf8()]);
            rest = &rest[c.len_utf8()..];
        }

        Self {
            pattern: pattern.to_string(),
            strftime,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn strftime(&self) -> &str {
        &self.strftime
    }

    pub fn format<Tz>(&self, time: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        time.format(&self.strftime).to_string()
    }

    /// Current local time in this format
    pub fn now(&self) -> String {
        self.format(&Local::now())
    }
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}
