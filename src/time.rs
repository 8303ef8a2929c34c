//! Date and time span kinds with their wire layouts.
//!
//! Dates travel as `yyyy-MM-dd HH:mm:ss` with an optional trailing `Z`, time
//! spans as `HH:mm:ss`. A [`DateTime`] pairs a wall-clock reading with a
//! [`DateTimeKind`] telling how that reading relates to UTC.

use std::fmt::{self, Write as _};

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{JsonError, JsonResult};

const WIRE_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// How a wall-clock reading relates to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateTimeKind {
    /// No relation declared.
    #[default]
    Unspecified,
    /// The reading is UTC.
    Utc,
    /// The reading is in the local time zone.
    Local,
}

/// Per-member date options: the expected kind and an optional strftime format.
///
/// With a format, values are parsed and written exactly in that format and
/// tagged with `kind`, without any time zone shift.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DateOptions {
    /// Kind the member expects.
    pub kind: DateTimeKind,
    /// Custom chrono format string, e.g. `%Y.%m.%d`.
    pub format: Option<String>,
}

impl DateOptions {
    /// Options expecting `kind` in the standard layout.
    pub fn kind(kind: DateTimeKind) -> Self {
        Self { kind, format: None }
    }

    /// Options with a custom format.
    pub fn format(format: impl Into<String>, kind: DateTimeKind) -> Self {
        Self {
            kind,
            format: Some(format.into()),
        }
    }
}

/// A wall-clock date and time tagged with its [`DateTimeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    wall: NaiveDateTime,
    kind: DateTimeKind,
}

impl DateTime {
    /// Tag a wall-clock reading.
    pub fn new(wall: NaiveDateTime, kind: DateTimeKind) -> Self {
        Self { wall, kind }
    }

    /// Build from calendar parts; `None` when the parts are out of range.
    pub fn from_parts(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        kind: DateTimeKind,
    ) -> Option<Self> {
        let wall = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
        Some(Self::new(wall, kind))
    }

    /// The wall-clock reading.
    pub fn wall(&self) -> NaiveDateTime {
        self.wall
    }

    /// The kind tag.
    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    /// Same reading under a different kind, without shifting.
    pub fn specify_kind(self, kind: DateTimeKind) -> Self {
        Self { kind, ..self }
    }

    /// Convert a local reading to UTC. Other kinds are only re-tagged.
    pub fn to_utc(self) -> Self {
        match self.kind {
            DateTimeKind::Local => Self::new(local_to_utc(self.wall), DateTimeKind::Utc),
            _ => self.specify_kind(DateTimeKind::Utc),
        }
    }

    /// Convert a UTC reading to local time. Other kinds are only re-tagged.
    pub fn to_local(self) -> Self {
        match self.kind {
            DateTimeKind::Utc => Self::new(utc_to_local(self.wall), DateTimeKind::Local),
            _ => self.specify_kind(DateTimeKind::Local),
        }
    }

    /// Parse a date read from JSON according to the member options.
    ///
    /// In the standard layout a trailing `Z` marks UTC input. UTC input
    /// for a local member is shifted to local time; for any other member it
    /// is tagged UTC with the numbers unchanged.
    pub fn parse(text: &str, options: &DateOptions) -> JsonResult<Self> {
        if let Some(format) = &options.format {
            return parse_with_format(text, format).map(|wall| Self::new(wall, options.kind));
        }

        let wall = parse_wire_layout(text)?;
        if !text.ends_with('Z') {
            return Ok(Self::new(wall, options.kind));
        }

        let utc = Self::new(wall, DateTimeKind::Utc);
        match options.kind {
            DateTimeKind::Local => Ok(utc.to_local()),
            DateTimeKind::Utc => Ok(utc),
            // Kept for compatibility: UTC input re-tags an unspecified member without shifting.
            DateTimeKind::Unspecified => Ok(utc),
        }
    }

    /// Write in the standard layout, converting local readings to UTC and
    /// appending `Z` when `use_utc` is set.
    pub fn write_wire(&self, use_utc: bool, out: &mut String) {
        let value = if use_utc && self.kind == DateTimeKind::Local {
            self.to_utc()
        } else {
            *self
        };
        // Writing into a String cannot fail.
        let _ = write!(out, "{}", value.wall.format(WIRE_LAYOUT));
        if use_utc {
            out.push('Z');
        }
    }

    /// Write the reading in a custom format without any conversion.
    pub fn write_formatted(&self, format: &str, out: &mut String) -> JsonResult<()> {
        write!(out, "{}", self.wall.format(format)).map_err(|_| JsonError::InvalidFormat {
            text: format.to_string(),
            target: "date format",
        })
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.wall.format(WIRE_LAYOUT), self.kind)
    }
}

fn invalid_date(text: &str) -> JsonError {
    JsonError::InvalidFormat {
        text: text.to_string(),
        target: "DateTime",
    }
}

/// Strict parse of `yyyy-MM-dd HH:mm:ss[Z]` with fixed field widths.
fn parse_wire_layout(text: &str) -> JsonResult<NaiveDateTime> {
    let body = text.strip_suffix('Z').unwrap_or(text);
    let digits_in_place = body
        .bytes()
        .enumerate()
        .all(|(i, b)| matches!(i, 4 | 7 | 10 | 13 | 16) || b.is_ascii_digit());
    if body.len() != 19 || !digits_in_place {
        return Err(invalid_date(text));
    }
    NaiveDateTime::parse_from_str(body, WIRE_LAYOUT).map_err(|_| invalid_date(text))
}

fn parse_with_format(text: &str, format: &str) -> JsonResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, format)
        .or_else(|_| {
            NaiveDate::parse_from_str(text, format)
                .map(|date| date.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| invalid_date(text))
}

fn local_to_utc(wall: NaiveDateTime) -> NaiveDateTime {
    match Local.from_local_datetime(&wall).earliest() {
        Some(local) => local.naive_utc(),
        None => {
            // Inside a DST gap; fall back to the offset in effect at that instant.
            let offset = Local.offset_from_utc_datetime(&wall);
            wall - Duration::seconds(i64::from(offset.local_minus_utc()))
        }
    }
}

fn utc_to_local(wall: NaiveDateTime) -> NaiveDateTime {
    Local.from_utc_datetime(&wall).naive_local()
}

/// A signed duration with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimeSpan {
    seconds: i64,
}

impl TimeSpan {
    /// Span from a total number of seconds.
    pub const fn from_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    /// Span from hours, minutes and seconds.
    pub const fn from_hms(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self::from_seconds(hours * 3600 + minutes * 60 + seconds)
    }

    /// Total seconds.
    pub const fn total_seconds(&self) -> i64 {
        self.seconds
    }

    /// Whole days.
    pub const fn days(&self) -> i64 {
        self.seconds / 86_400
    }

    /// Hours component within the day.
    pub const fn hours(&self) -> i64 {
        (self.seconds / 3600) % 24
    }

    /// Minutes component.
    pub const fn minutes(&self) -> i64 {
        (self.seconds / 60) % 60
    }

    /// Seconds component.
    pub const fn seconds(&self) -> i64 {
        self.seconds % 60
    }

    /// Parse `[-][d.]HH:mm:ss[.fraction]`; any fraction is truncated.
    pub fn parse(text: &str) -> JsonResult<Self> {
        let invalid = || JsonError::InvalidFormat {
            text: text.to_string(),
            target: "TimeSpan",
        };
        let number = |part: &str| -> JsonResult<i64> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let mut parts = body.split(':');
        let (Some(first), Some(minutes), Some(rest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let (days, hours) = match first.split_once('.') {
            Some((days, hours)) => (number(days)?, number(hours)?),
            None => (0, number(first)?),
        };
        let seconds = match rest.split_once('.') {
            Some((seconds, fraction)) => {
                number(fraction)?;
                number(seconds)?
            }
            None => number(rest)?,
        };
        let minutes = number(minutes)?;
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err(invalid());
        }

        let total = days
            .checked_mul(86_400)
            .and_then(|total| total.checked_add(hours * 3600 + minutes * 60 + seconds))
            .ok_or_else(invalid)?;
        let total = if negative {
            total.checked_neg().ok_or_else(invalid)?
        } else {
            total
        };
        Ok(Self::from_seconds(total))
    }

    /// Write `HH:mm:ss`, prefixed with `d.` when the span covers whole days.
    pub fn write_wire(&self, out: &mut String) {
        if self.seconds < 0 {
            out.push('-');
        }
        let total = self.seconds.unsigned_abs();
        let days = total / 86_400;
        if days != 0 {
            let _ = write!(out, "{}.", days);
        }
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            (total / 3600) % 24,
            (total / 60) % 60,
            total % 60
        );
    }
}

impl From<Duration> for TimeSpan {
    fn from(duration: Duration) -> Self {
        Self::from_seconds(duration.num_seconds())
    }
}

impl From<TimeSpan> for Duration {
    fn from(span: TimeSpan) -> Self {
        Duration::seconds(span.seconds)
    }
}
