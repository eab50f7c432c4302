use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default smoothing window for the F10.7 flux, in days.
pub const SMOOTH_DAYS: u32 = 81;

#[derive(Error, Debug)]
pub enum IndicesError {
    #[error("could not read indices file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed indices line {lineno}: {line}")]
    Parse { lineno: usize, line: String },

    #[error("no geomagnetic indices available for {0}")]
    MissingDate(NaiveDate),
}

/// Solar/geomagnetic activity indices for one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivingParameters {
    /// 81-day smoothed F10.7 solar radio flux (sfu)
    pub f107_avg81: f64,
    /// Daily F10.7 solar radio flux (sfu)
    pub f107_daily: f64,
    /// Daily planetary geomagnetic Ap index
    pub ap_index: f64,
}

/// Source of driving parameters for the atmosphere model.
///
/// One call per point evaluation; the smoothing window is fixed policy.
/// Failures propagate to the caller unchanged, with no fallback values.
pub trait IndexProvider: Sync {
    fn get(&self, time: DateTime<Utc>, smooth_days: u32)
        -> Result<DrivingParameters, IndicesError>;
}

/// Index provider backed by a local daily table.
///
/// File format: one record per line, `YYYY-MM-DD F107 AP`, whitespace
/// separated. Lines starting with '#' and blank lines are skipped. The
/// smoothed flux is the mean over a centered window of the given width,
/// using whichever days of the window are present in the table.
#[derive(Debug)]
pub struct FileIndexProvider {
    daily: BTreeMap<NaiveDate, (f64, f64)>,
}

impl FileIndexProvider {
    pub fn open(path: &Path) -> Result<Self, IndicesError> {
        let text = fs::read_to_string(path).map_err(|source| IndicesError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, IndicesError> {
        let mut daily = BTreeMap::new();

        for (lineno, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let malformed = || IndicesError::Parse {
                lineno: lineno + 1,
                line: trimmed.to_string(),
            };

            let mut fields = trimmed.split_whitespace();
            let date = fields
                .next()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .ok_or_else(malformed)?;
            let f107: f64 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(malformed)?;
            let ap: f64 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(malformed)?;

            daily.insert(date, (f107, ap));
        }

        Ok(Self { daily })
    }

    fn smoothed_f107(&self, date: NaiveDate, smooth_days: u32) -> Option<f64> {
        let half = Duration::days(i64::from(smooth_days) / 2);
        let window = self.daily.range(date - half..=date + half);

        let mut sum = 0.0;
        let mut n = 0usize;
        for (_, (f107, _)) in window {
            sum += f107;
            n += 1;
        }

        if n == 0 {
            None
        } else {
            Some(sum / n as f64)
        }
    }
}

impl IndexProvider for FileIndexProvider {
    fn get(&self, time: DateTime<Utc>, smooth_days: u32) -> Result<DrivingParameters, IndicesError> {
        let date = time.date_naive();

        let (f107_daily, ap_index) = self
            .daily
            .get(&date)
            .copied()
            .ok_or(IndicesError::MissingDate(date))?;
        let f107_avg81 = self
            .smoothed_f107(date, smooth_days)
            .ok_or(IndicesError::MissingDate(date))?;

        Ok(DrivingParameters {
            f107_avg81,
            f107_daily,
            ap_index,
        })
    }
}
