//! Processed marker stored in the modification time.
//!
//! A marked file carries its resolved date in the modification time, with the
//! millisecond part replaced by a hash of the file name. Reading the marker
//! back is a single `stat`, so later runs skip date extraction.

use crate::types::Timestamp;
use chrono::{Local, TimeZone};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Non-negative rolling hash of a file name
pub fn name_hash(name: &str) -> u64 {
    let mut h: i64 = 0;
    for c in name.chars() {
        h = h.wrapping_mul(31).wrapping_add(c as i64);
    }
    h.checked_abs().unwrap_or(i64::MAX) as u64
}

/// Millisecond value identifying a marked file named `name`
pub fn mark_of(name: &str) -> u64 {
    name_hash(name) % 1000
}

/// Whether a file named `name` with modification time `modified` is marked
pub fn is_marked(name: &str, modified: SystemTime) -> bool {
    modified
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_millis() % 1000 == u128::from(mark_of(name)))
        .unwrap_or(false)
}

/// Modification time that marks a file named `name` as dated `ts`
pub fn marked_time(ts: &Timestamp, name: &str) -> Option<SystemTime> {
    let millis = local_millis(ts)?;
    let marked = millis - millis.rem_euclid(1000) + mark_of(name) as i64;
    from_millis(marked)
}

/// Stamp `path` with the processed marker for `ts`
pub fn mark_file(path: &Path, ts: &Timestamp) -> io::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let time = marked_time(ts, &name)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "timestamp out of range"))?;
    File::options().write(true).open(path)?.set_modified(time)
}

/// Whether the file at `path` carries the processed marker
pub fn is_file_marked(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|modified| is_marked(&name, modified))
        .unwrap_or(false)
}

/// Set the modification time of `path` to the local time `ts`
pub fn set_modified(path: &Path, ts: &Timestamp) -> io::Result<()> {
    let time = local_millis(ts)
        .and_then(from_millis)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "timestamp out of range"))?;
    File::options().write(true).open(path)?.set_modified(time)
}

fn local_millis(ts: &Timestamp) -> Option<i64> {
    Local
        .from_local_datetime(ts)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

fn from_millis(millis: i64) -> Option<SystemTime> {
    if millis >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_millis(millis as u64))
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_millis(millis.unsigned_abs()))
    }
}
