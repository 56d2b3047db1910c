//! Timezone-normalized date handling. Post dates are pinned to a reference
//! timezone so that a post written "on the 15th" stays on the 15th no matter
//! where the site is built.
//!
//! Normalization is a two-step re-projection:
//!
//! 1. [`project_to_timezone_fields`] takes an instant and reads its
//!    wall-clock fields as they appear in the reference timezone.
//! 2. [`fields_as_local_instant`] rebuilds an instant from those fields,
//!    interpreting them as *local* time ([`LocalZone`]).
//!
//! The resulting instant carries the local zone's UTC offset but the
//! reference zone's calendar fields. [`DateNormalizer`] bundles both steps
//! together with the ISO-8601 rendering used throughout the content model.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use std::fmt;

/// The reference timezone used when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Ho_Chi_Minh;

/// Calendar and clock fields of an instant as seen from one timezone.
/// Sub-second precision is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallClock {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl WallClock {
    fn to_naive(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// The zone that naive (offset-less) date strings and re-projected wall
/// clocks are interpreted in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocalZone {
    /// The build machine's own timezone.
    #[default]
    Host,

    /// A pinned zone, for reproducible builds and tests.
    Zone(Tz),
}

impl LocalZone {
    fn resolve(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            LocalZone::Host => resolve_in(&chrono::Local, naive),
            LocalZone::Zone(tz) => resolve_in(tz, naive),
        }
    }
}

impl From<Option<Tz>> for LocalZone {
    fn from(tz: Option<Tz>) -> LocalZone {
        match tz {
            Some(tz) => LocalZone::Zone(tz),
            None => LocalZone::Host,
        }
    }
}

// Ambiguous wall clocks (DST fall-back) resolve to the earlier instant;
// skipped ones (DST spring-forward) are pushed past the gap.
fn resolve_in<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => zone
            .from_local_datetime(&(*naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Reads the wall-clock fields of `instant` as they appear in `tz`.
pub fn project_to_timezone_fields(instant: &DateTime<Utc>, tz: Tz) -> WallClock {
    let projected = instant.with_timezone(&tz);
    WallClock {
        year: projected.year(),
        month: projected.month(),
        day: projected.day(),
        hour: projected.hour(),
        minute: projected.minute(),
        second: projected.second(),
    }
}

/// Builds an instant from `fields` interpreted as wall-clock time in
/// `local`.
pub fn fields_as_local_instant(fields: WallClock, local: LocalZone) -> Result<DateTime<Utc>> {
    let naive = fields.to_naive().ok_or(Error::InvalidWallClock(fields))?;
    local.resolve(&naive).ok_or(Error::InvalidWallClock(fields))
}

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f %:z"];

/// Parses a date string into an instant without any re-projection.
///
/// * RFC 3339 strings (with an offset or `Z`) denote that exact instant.
/// * Date-only strings (`YYYY-MM-DD`) denote midnight UTC.
/// * Date-time strings without an offset are read as `local` time.
/// * RFC 2822 strings are accepted as well.
pub fn parse_instant(input: &str, local: LocalZone) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }

    for format in OFFSET_DATE_TIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return local
                .resolve(&naive)
                .ok_or_else(|| Error::InvalidDate(input.to_owned()));
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(Error::InvalidDate(input.to_owned()))
}

/// Parses `input` and re-projects it so its calendar fields match
/// `time_zone` while its offset bookkeeping follows `local`.
pub fn parse_date(input: &str, time_zone: Tz, local: LocalZone) -> Result<DateTime<Utc>> {
    let instant = parse_instant(input, local)?;
    fields_as_local_instant(project_to_timezone_fields(&instant, time_zone), local)
}

/// Renders an instant the way the content model stores dates:
/// `YYYY-MM-DDTHH:MM:SS.sssZ`. Lexicographic order of these strings is
/// chronological order.
pub fn to_iso_string(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Renders an instant as an RFC 2822 date in GMT, as used by RSS.
pub fn to_utc_string(instant: &DateTime<Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Applies [`parse_date`] with a fixed reference and local zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateNormalizer {
    /// The zone whose calendar the normalized dates follow.
    pub reference: Tz,

    /// The zone used for offset bookkeeping and naive inputs.
    pub local: LocalZone,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        DateNormalizer {
            reference: DEFAULT_TIMEZONE,
            local: LocalZone::Host,
        }
    }
}

impl DateNormalizer {
    pub fn new(reference: Tz, local: LocalZone) -> DateNormalizer {
        DateNormalizer { reference, local }
    }

    /// Normalizes a frontmatter date into its ISO-8601 form.
    pub fn normalize(&self, input: &str) -> Result<String> {
        parse_date(input, self.reference, self.local).map(|instant| to_iso_string(&instant))
    }

    /// Parses a date without re-projection (see [`parse_instant`]).
    pub fn instant(&self, input: &str) -> Result<DateTime<Utc>> {
        parse_instant(input, self.local)
    }

    /// Formats a date for display, e.g. `March 15, 2024`, using the
    /// reference zone's calendar.
    pub fn format_date(&self, input: &str) -> Result<String> {
        let fields = project_to_timezone_fields(&self.instant(input)?, self.reference);
        let naive = fields.to_naive().ok_or(Error::InvalidWallClock(fields))?;
        Ok(naive.format("%B %-d, %Y").to_string())
    }
}

/// The result of a fallible date operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem parsing or re-projecting a date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Returned when a date string matches none of the accepted forms.
    #[error("invalid date `{0}`")]
    InvalidDate(String),

    /// Returned when wall-clock fields can't be placed in the local zone.
    #[error("wall-clock time `{0}` has no instant in the local timezone")]
    InvalidWallClock(WallClock),
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono_tz::{Asia::Ho_Chi_Minh, America::New_York, UTC};

    fn utc() -> LocalZone {
        LocalZone::Zone(UTC)
    }

    #[test]
    fn test_project_to_timezone_fields() -> Result<()> {
        let instant = parse_instant("2024-03-15T20:30:15Z", utc())?;
        assert_eq!(
            WallClock {
                year: 2024,
                month: 3,
                day: 16,
                hour: 3,
                minute: 30,
                second: 15,
            },
            project_to_timezone_fields(&instant, Ho_Chi_Minh)
        );
        Ok(())
    }

    #[test]
    fn test_fields_as_local_instant() -> Result<()> {
        let fields = WallClock {
            year: 2024,
            month: 3,
            day: 15,
            hour: 7,
            minute: 0,
            second: 0,
        };
        assert_eq!(
            "2024-03-15T07:00:00.000Z",
            to_iso_string(&fields_as_local_instant(fields, utc())?)
        );
        assert_eq!(
            "2024-03-15T00:00:00.000Z",
            to_iso_string(&fields_as_local_instant(fields, LocalZone::Zone(Ho_Chi_Minh))?)
        );
        Ok(())
    }

    #[test]
    fn test_fields_as_local_instant_rejects_impossible_dates() {
        let fields = WallClock {
            year: 2024,
            month: 2,
            day: 30,
            hour: 0,
            minute: 0,
            second: 0,
        };
        assert_eq!(
            Err(Error::InvalidWallClock(fields)),
            fields_as_local_instant(fields, utc())
        );
    }

    #[test]
    fn test_parse_date_only_is_midnight_utc() -> Result<()> {
        // Midnight UTC is 07:00 in Ho Chi Minh City; those wall-clock fields
        // are then read back as UTC.
        let normalizer = DateNormalizer::new(Ho_Chi_Minh, utc());
        assert_eq!("2024-03-15T07:00:00.000Z", normalizer.normalize("2024-03-15")?);
        Ok(())
    }

    #[test]
    fn test_parse_date_is_deterministic() -> Result<()> {
        let first = parse_date("2024-03-15", Ho_Chi_Minh, utc())?;
        let second = parse_date("2024-03-15", Ho_Chi_Minh, utc())?;
        assert_eq!(first, second);
        assert_eq!(
            project_to_timezone_fields(&first, UTC),
            project_to_timezone_fields(&second, UTC)
        );
        Ok(())
    }

    #[test]
    fn test_parse_naive_date_time_is_local() -> Result<()> {
        let local = LocalZone::Zone(New_York);
        assert_eq!(
            "2024-01-10T15:00:00.000Z",
            to_iso_string(&parse_instant("2024-01-10T10:00:00", local)?)
        );
        assert_eq!(
            "2024-01-10T15:00:00.000Z",
            to_iso_string(&parse_instant("2024-01-10 10:00", local)?)
        );
        Ok(())
    }

    #[test]
    fn test_local_time_in_dst_gap_moves_forward() -> Result<()> {
        // 02:30 doesn't exist on 2024-03-10 in New York; 03:30 EDT does.
        assert_eq!(
            "2024-03-10T07:30:00.000Z",
            to_iso_string(&parse_instant("2024-03-10T02:30:00", LocalZone::Zone(New_York))?)
        );
        Ok(())
    }

    #[test]
    fn test_ambiguous_local_time_is_earliest() -> Result<()> {
        // 01:30 happens twice on 2024-11-03 in New York; the EDT one is first.
        assert_eq!(
            "2024-11-03T05:30:00.000Z",
            to_iso_string(&parse_instant("2024-11-03T01:30:00", LocalZone::Zone(New_York))?)
        );
        Ok(())
    }

    #[test]
    fn test_parse_offsets() -> Result<()> {
        assert_eq!(
            "2024-01-10T03:00:00.000Z",
            to_iso_string(&parse_instant("2024-01-10T10:00:00+07:00", utc())?)
        );
        assert_eq!(
            "2024-03-15T07:00:00.000Z",
            to_iso_string(&parse_instant("Fri, 15 Mar 2024 07:00:00 GMT", utc())?)
        );
        Ok(())
    }

    #[test]
    fn test_parse_invalid_date() {
        assert_eq!(
            Err(Error::InvalidDate("not a date".to_owned())),
            parse_instant("not a date", utc())
        );
        assert!(DateNormalizer::default().normalize("2024-13-45").is_err());
    }

    #[test]
    fn test_to_utc_string() -> Result<()> {
        let instant = parse_instant("2024-03-15T07:00:00Z", utc())?;
        assert_eq!("Fri, 15 Mar 2024 07:00:00 GMT", to_utc_string(&instant));
        Ok(())
    }

    #[test]
    fn test_format_date() -> Result<()> {
        let normalizer = DateNormalizer::new(Ho_Chi_Minh, utc());
        assert_eq!("March 16, 2024", normalizer.format_date("2024-03-15T20:00:00Z")?);
        assert_eq!("January 5, 2023", normalizer.format_date("2023-01-05")?);
        Ok(())
    }
}
