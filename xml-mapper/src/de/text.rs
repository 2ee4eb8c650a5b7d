// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of XML text to primitive values.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{BoxedStdError, Culture, MappingConfig};

/// A type which can be parsed from the text of an attribute or element.
///
/// Implemented here for the primitive types the mapper supports, and by
/// `#[derive(ParseText)]` for unit-only enums.
pub trait ParseText: Sized {
    fn parse(text: &str, config: &MappingConfig) -> Result<Self, BoxedStdError>;
}

/// A simple `Error` impl for use by internal parsers.
#[derive(Debug)]
pub(crate) struct SimpleError(pub(crate) String);

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SimpleError {}

pub(crate) fn simple(msg: String) -> BoxedStdError {
    Box::new(SimpleError(msg))
}

/// Helper for macros.
#[doc(hidden)]
pub fn no_such_variant(enum_: &str, t: &str) -> BoxedStdError {
    simple(format!("no such {} variant {:?}", enum_, t))
}

fn is_xml_whitespace(c: char) -> bool {
    matches!(c, '\x09' | '\x0A' | '\x0D' | '\x20')
}

/// Applies XML Schema's `whiteSpace="collapse"` normalization.
///
/// Leading and trailing white space is removed and interior runs become a
/// single space.
///
/// ```rust
/// # use xml_mapper::de::collapse_whitespace;
/// assert_eq!(collapse_whitespace("\n foo\t bar\n\n"), "foo bar");
/// assert_eq!(collapse_whitespace("foo"), "foo");
/// ```
pub fn collapse_whitespace(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim_matches(is_xml_whitespace);
    let mut prev_space = false;
    let already_collapsed = trimmed.chars().all(|c| {
        let ok = c != '\x09' && c != '\x0A' && c != '\x0D' && !(c == ' ' && prev_space);
        prev_space = c == ' ';
        ok
    });
    if already_collapsed {
        return Cow::Borrowed(trimmed);
    }
    let mut out = String::with_capacity(trimmed.len());
    for word in trimmed.split(is_xml_whitespace).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    Cow::Owned(out)
}

impl ParseText for bool {
    fn parse(text: &str, _config: &MappingConfig) -> Result<Self, BoxedStdError> {
        match collapse_whitespace(text).to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(simple(format!("invalid bool {:?}", text))),
        }
    }
}

impl ParseText for String {
    fn parse(text: &str, _config: &MappingConfig) -> Result<Self, BoxedStdError> {
        Ok(text.to_owned())
    }
}

impl ParseText for char {
    fn parse(text: &str, _config: &MappingConfig) -> Result<Self, BoxedStdError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(simple(format!("expected exactly one character, got {:?}", text))),
        }
    }
}

/// Parses a float, honoring the culture's separators.
fn parse_float<T>(text: &str, culture: &Culture) -> Result<T, BoxedStdError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let collapsed = collapse_whitespace(text);
    culture
        .normalize_number(&collapsed)
        .parse()
        .map_err(|e| Box::new(e) as BoxedStdError)
}

/// Parses an integer. Group separators are rejected.
fn parse_integer<T>(text: &str) -> Result<T, BoxedStdError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    collapse_whitespace(text)
        .parse()
        .map_err(|e| Box::new(e) as BoxedStdError)
}

macro_rules! text_for_int {
    ( $($t:ident)* ) => {
        $(
            impl ParseText for $t {
                fn parse(text: &str, _config: &MappingConfig) -> Result<Self, BoxedStdError> {
                    parse_integer(text)
                }
            }
        )*
    }
}

macro_rules! text_for_float {
    ( $($t:ident)* ) => {
        $(
            impl ParseText for $t {
                fn parse(text: &str, config: &MappingConfig) -> Result<Self, BoxedStdError> {
                    parse_float(text, &config.culture)
                }
            }
        )*
    }
}

text_for_int!(i8 u8 i16 u16 i32 u32 i64 u64 i128 u128 isize usize);
text_for_float!(f32 f64);

impl ParseText for Decimal {
    fn parse(text: &str, config: &MappingConfig) -> Result<Self, BoxedStdError> {
        let collapsed = collapse_whitespace(text);
        let normalized = config.culture.normalize_number(&collapsed);
        Decimal::from_str(&normalized)
            .or_else(|e| Decimal::from_scientific(&normalized).map_err(|_| e))
            .map_err(|e| Box::new(e) as BoxedStdError)
    }
}

/// A URI which may be absolute or relative.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Uri {
    Absolute(url::Url),

    /// A relative reference, kept verbatim since it can't be resolved without a base.
    Relative(String),
}

impl Uri {
    pub fn as_str(&self) -> &str {
        match self {
            Uri::Absolute(u) => u.as_str(),
            Uri::Relative(s) => s,
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, Uri::Absolute(_))
    }
}

impl Default for Uri {
    fn default() -> Self {
        Uri::Relative(String::new())
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParseText for Uri {
    fn parse(text: &str, _config: &MappingConfig) -> Result<Self, BoxedStdError> {
        match url::Url::parse(text) {
            Ok(u) => Ok(Uri::Absolute(u)),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Uri::Relative(text.to_owned())),
            Err(e) => Err(Box::new(e) as BoxedStdError),
        }
    }
}

impl ParseText for Uuid {
    fn parse(text: &str, _config: &MappingConfig) -> Result<Self, BoxedStdError> {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return Ok(Uuid::nil());
        }
        Uuid::parse_str(&text).map_err(|e| Box::new(e) as BoxedStdError)
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Time-of-day suffixes tried after a culture-ordered numeric date.
const TIME_SUFFIXES: &[&str] = &[" %H:%M:%S", " %H:%M", " %I:%M:%S %p", " %I:%M %p"];

fn date_error(text: &str) -> BoxedStdError {
    simple(format!("unrecognized date/time {:?}", text))
}

/// Parses a date and time without a time zone, leniently.
fn parse_naive_general(text: &str, culture: &Culture) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for f in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, f) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    for date in culture.date_formats() {
        if let Ok(d) = NaiveDate::parse_from_str(text, &date) {
            return Some(d.and_time(NaiveTime::MIN));
        }
        for time in TIME_SUFFIXES {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, &format!("{}{}", date, time)) {
                return Some(dt);
            }
        }
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Parses with an exact format, allowing date-only formats.
fn parse_naive_exact(text: &str, format: &str) -> Result<NaiveDateTime, BoxedStdError> {
    NaiveDateTime::parse_from_str(text, format).or_else(|e| {
        NaiveDate::parse_from_str(text, format)
            .map(|d| d.and_time(NaiveTime::MIN))
            .map_err(|_| Box::new(e) as BoxedStdError)
    })
}

impl ParseText for NaiveDateTime {
    fn parse(text: &str, config: &MappingConfig) -> Result<Self, BoxedStdError> {
        if let Some(format) = config.date_format() {
            return parse_naive_exact(text, format);
        }
        let text = collapse_whitespace(text);
        parse_naive_general(&text, &config.culture).ok_or_else(|| date_error(&text))
    }
}

impl ParseText for NaiveDate {
    fn parse(text: &str, config: &MappingConfig) -> Result<Self, BoxedStdError> {
        <NaiveDateTime as ParseText>::parse(text, config).map(|dt| dt.date())
    }
}

impl ParseText for DateTime<FixedOffset> {
    fn parse(text: &str, config: &MappingConfig) -> Result<Self, BoxedStdError> {
        let text = collapse_whitespace(text);
        if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
            return Ok(dt);
        }
        for f in OFFSET_DATE_TIME_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&text, f) {
                return Ok(dt);
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(&text) {
            return Ok(dt);
        }
        for date in config.culture.date_formats() {
            for time in TIME_SUFFIXES {
                let format = format!("{}{} %:z", date, time);
                if let Ok(dt) = DateTime::parse_from_str(&text, &format) {
                    return Ok(dt);
                }
            }
        }
        parse_naive_general(&text, &config.culture)
            .map(|dt| dt.and_utc().fixed_offset())
            .ok_or_else(|| date_error(&text))
    }
}

/// Parses an `xs:duration` such as `-P1DT2H30.5S`.
///
/// Years count as 365 days and months as 30 days.
fn parse_duration(text: &str) -> Option<Duration> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) if !t.is_empty() => (d, Some(t)),
        Some(_) => return None,
        None => (rest, None),
    };

    const DAY: i128 = 86_400_000_000_000;
    const HOUR: i128 = 3_600_000_000_000;
    const MINUTE: i128 = 60_000_000_000;
    const SECOND: i128 = 1_000_000_000;

    let mut nanos: i128 = 0;
    let mut components = 0;
    let mut units = date_part;
    for (designator, scale) in [('Y', 365 * DAY), ('M', 30 * DAY), ('D', DAY)] {
        if let Some((n, r)) = split_component(units, designator) {
            nanos = nanos.checked_add(n.checked_mul(scale)?)?;
            units = r;
            components += 1;
        }
    }
    if !units.is_empty() {
        return None;
    }
    if let Some(time_part) = time_part {
        let mut units = time_part;
        let before = components;
        for (designator, scale) in [('H', HOUR), ('M', MINUTE)] {
            if let Some((n, r)) = split_component(units, designator) {
                nanos = nanos.checked_add(n.checked_mul(scale)?)?;
                units = r;
                components += 1;
            }
        }
        if let Some(secs) = units.strip_suffix('S') {
            let (whole, frac) = secs.split_once('.').unwrap_or((secs, ""));
            if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            if !frac.bytes().all(|b| b.is_ascii_digit()) || (secs.contains('.') && frac.is_empty())
            {
                return None;
            }
            let whole: i128 = whole.parse().ok()?;
            let mut frac_nanos: i128 = 0;
            for (i, b) in frac.bytes().take(9).enumerate() {
                frac_nanos += i128::from(b - b'0') * 10i128.pow(8 - i as u32);
            }
            nanos = nanos.checked_add(whole.checked_mul(SECOND)?.checked_add(frac_nanos)?)?;
            units = "";
            components += 1;
        }
        if !units.is_empty() || components == before {
            return None;
        }
    }
    if components == 0 {
        return None;
    }
    if negative {
        nanos = -nanos;
    }
    let secs = i64::try_from(nanos.div_euclid(SECOND)).ok()?;
    let subsec = i64::try_from(nanos.rem_euclid(SECOND)).ok()?;
    Duration::try_seconds(secs)?.checked_add(&Duration::nanoseconds(subsec))
}

/// Splits a leading `<digits><designator>` off `s`.
fn split_component(s: &str, designator: char) -> Option<(i128, &str)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !s[digits..].starts_with(designator) {
        return None;
    }
    let n = s[..digits].parse().ok()?;
    Some((n, &s[digits + designator.len_utf8()..]))
}

impl ParseText for Duration {
    fn parse(text: &str, _config: &MappingConfig) -> Result<Self, BoxedStdError> {
        let text = collapse_whitespace(text);
        parse_duration(&text).ok_or_else(|| simple(format!("invalid xs:duration {:?}", &*text)))
    }
}
