use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeError {
    #[error("unsupported time representation: {0}")]
    UnsupportedTimeType(String),

    #[error("could not parse time string: {0}")]
    Unparseable(String),
}

/// A single time-like value in any of the accepted representations.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSpec {
    /// ISO-like text, e.g. "2015-03-21T12:00:00" or "2021-06-01"
    Text(String),
    /// Calendar date with no time-of-day; normalizes to midnight
    Date(NaiveDate),
    /// Fully resolved instant
    Instant(DateTime<Utc>),
}

impl From<&str> for TimeSpec {
    fn from(s: &str) -> Self {
        TimeSpec::Text(s.to_string())
    }
}

impl From<DateTime<Utc>> for TimeSpec {
    fn from(t: DateTime<Utc>) -> Self {
        TimeSpec::Instant(t)
    }
}

impl From<NaiveDate> for TimeSpec {
    fn from(d: NaiveDate) -> Self {
        TimeSpec::Date(d)
    }
}

/// Time argument to a query: one value, or an explicit sequence.
///
/// A two-element sequence is interpreted as a [start, stop) range and
/// expanded to hourly steps; any other length passes through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeInput {
    Single(TimeSpec),
    Sequence(Vec<TimeSpec>),
}

impl TimeInput {
    pub fn single(spec: impl Into<TimeSpec>) -> Self {
        TimeInput::Single(spec.into())
    }

    pub fn sequence<T: Into<TimeSpec>>(specs: impl IntoIterator<Item = T>) -> Self {
        TimeInput::Sequence(specs.into_iter().map(Into::into).collect())
    }

    /// True when the input is a single time-like value rather than a
    /// sequence or range. Drives fast-path dispatch.
    pub fn is_single(&self) -> bool {
        matches!(self, TimeInput::Single(_))
    }
}

/// Parse a time string, trying formats from most to least specific.
pub fn parse_time_string(s: &str) -> Result<DateTime<Utc>, TimeError> {
    let trimmed = s.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(t.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    // Bare date: midnight of that day
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(midnight(date));
    }

    Err(TimeError::Unparseable(trimmed.to_string()))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// Strict coercion to exactly one instant.
///
/// A length-1 sequence collapses recursively; longer sequences are not a
/// single instant and fail with `UnsupportedTimeType`.
pub fn to_instant(time: &TimeInput) -> Result<DateTime<Utc>, TimeError> {
    match time {
        TimeInput::Single(spec) => spec_to_instant(spec),
        TimeInput::Sequence(specs) => {
            if specs.len() == 1 {
                to_instant(&TimeInput::Single(specs[0].clone()))
            } else {
                Err(TimeError::UnsupportedTimeType(format!(
                    "sequence of {} values is not a single instant",
                    specs.len()
                )))
            }
        }
    }
}

fn spec_to_instant(spec: &TimeSpec) -> Result<DateTime<Utc>, TimeError> {
    match spec {
        TimeSpec::Text(s) => parse_time_string(s),
        TimeSpec::Date(d) => Ok(midnight(*d)),
        TimeSpec::Instant(t) => Ok(*t),
    }
}

/// Normalize a time input to the canonical ordered instant sequence.
///
/// Single value -> length-1 sequence. Two-element sequence -> hourly steps
/// from start (inclusive, truncated to the hour) to stop (exclusive).
/// Any other sequence length passes through element-wise.
pub fn to_instant_sequence(time: &TimeInput) -> Result<Vec<DateTime<Utc>>, TimeError> {
    match time {
        TimeInput::Single(spec) => Ok(vec![spec_to_instant(spec)?]),
        TimeInput::Sequence(specs) => match specs.len() {
            1 => Ok(vec![spec_to_instant(&specs[0])?]),
            2 => {
                let start = spec_to_instant(&specs[0])?;
                let stop = spec_to_instant(&specs[1])?;
                Ok(hourly_range(start, stop))
            }
            _ => specs.iter().map(spec_to_instant).collect(),
        },
    }
}

/// Hourly-stepped sequence over [start, stop), start truncated to the hour.
pub fn hourly_range(start: DateTime<Utc>, stop: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let mut t = start
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(start);

    let mut out = Vec::new();
    while t < stop {
        out.push(t);
        t += Duration::hours(1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_datetime() {
        let t = parse_time_string("2015-03-21T12:00:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2015, 3, 21, 12, 0, 0).unwrap());

        let t = parse_time_string("2015-03-21 12:30:45").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2015, 3, 21, 12, 30, 45).unwrap());
    }

    #[test]
    fn test_bare_date_is_midnight() {
        let t = parse_time_string("2021-06-01").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_unparseable_string() {
        assert!(matches!(
            parse_time_string("not a time"),
            Err(TimeError::Unparseable(_))
        ));
    }

    #[test]
    fn test_range_expands_hourly() {
        let seq = to_instant_sequence(&TimeInput::sequence(["2020-01-01", "2020-01-02"])).unwrap();
        assert_eq!(seq.len(), 24);
        assert_eq!(seq[0], Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(seq[23], Utc.with_ymd_and_hms(2020, 1, 1, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_three_element_sequence_passes_through() {
        let times = [
            "2020-01-01T00:00:00",
            "2020-01-05T06:00:00",
            "2020-02-01T12:00:00",
        ];
        let seq = to_instant_sequence(&TimeInput::sequence(times)).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq[1], Utc.with_ymd_and_hms(2020, 1, 5, 6, 0, 0).unwrap());
    }

    #[test]
    fn test_single_preserves_minute_second() {
        let seq = to_instant_sequence(&TimeInput::single("2015-03-21T12:34:56")).unwrap();
        assert_eq!(
            seq,
            vec![Utc.with_ymd_and_hms(2015, 3, 21, 12, 34, 56).unwrap()]
        );
    }

    #[test]
    fn test_strict_coercion_collapses_length_one() {
        let t = to_instant(&TimeInput::sequence(["2021-06-01"])).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_strict_coercion_rejects_longer_sequences() {
        let input = TimeInput::sequence(["2021-06-01", "2021-06-02"]);
        assert!(matches!(
            to_instant(&input),
            Err(TimeError::UnsupportedTimeType(_))
        ));
    }
}
