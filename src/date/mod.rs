//! Date extraction for files
//!
//! `DateSource` is the seam the organizer, checker and fixer use to ask for a
//! file's timestamp. `FileDateExtractor` is the default source: a processed
//! marker, then a date encoded in the filename, then the modification time.

pub mod mark;

use crate::types::Timestamp;
use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Source of file timestamps; `None` means the date is unknown
pub trait DateSource {
    fn date_of(&self, path: &Path) -> Option<Timestamp>;
}

impl<T: DateSource + ?Sized> DateSource for &T {
    fn date_of(&self, path: &Path) -> Option<Timestamp> {
        (**self).date_of(path)
    }
}

/// Default date source backed by file names and modification times
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDateExtractor {
    ignore_mark: bool,
}

impl FileDateExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the processed-marker shortcut and always derive the date again
    pub fn ignoring_marks(mut self, ignore: bool) -> Self {
        self.ignore_mark = ignore;
        self
    }

    pub fn ignore_mark(&self) -> bool {
        self.ignore_mark
    }
}

impl DateSource for FileDateExtractor {
    fn date_of(&self, path: &Path) -> Option<Timestamp> {
        let metadata = fs::metadata(path).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().ok();
        let name = path.file_name().map(|n| n.to_string_lossy());

        if !self.ignore_mark {
            if let (Some(name), Some(modified)) = (&name, modified) {
                if mark::is_marked(name, modified) {
                    return Some(local_time(modified));
                }
            }
        }
        if let Some(ts) = name.as_deref().and_then(date_from_name) {
            return Some(ts);
        }
        modified.map(local_time)
    }
}

/// Convert a filesystem time to local wall-clock time
pub fn local_time(time: SystemTime) -> Timestamp {
    DateTime::<Local>::from(time).naive_local()
}

/// Drop the sub-second part of a timestamp
pub fn truncate_to_seconds(ts: &Timestamp) -> Timestamp {
    ts.with_nanosecond(0).unwrap_or(*ts)
}

/// Parse a date embedded in a filename such as `IMG_2022-08-05-16-38-25.jpg`.
///
/// Digit runs are read left to right: the first run with at least four digits
/// starts the year, then month, day, hour, minute and second are taken two
/// digits at a time. Dates later than the current year are rejected.
pub fn date_from_name(name: &str) -> Option<Timestamp> {
    let mut units: Vec<u32> = Vec::with_capacity(6);
    for run in name
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
    {
        let mut rest = run;
        if units.is_empty() {
            if rest.len() < 4 {
                continue;
            }
            units.push(rest[..4].parse().ok()?);
            rest = &rest[4..];
        }
        while rest.len() >= 2 && units.len() < 6 {
            units.push(rest[..2].parse().ok()?);
            rest = &rest[2..];
        }
        if units.len() == 6 {
            break;
        }
    }
    if units.len() < 6 {
        return None;
    }

    let ts = NaiveDate::from_ymd_opt(units[0] as i32, units[1], units[2])?
        .and_hms_opt(units[3], units[4], units[5])?;
    if ts.year() > Local::now().year() {
        return None;
    }
    Some(ts)
}
