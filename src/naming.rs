//! Folder naming scheme
//!
//! Maps a timestamp and a depth to the canonical folder name for that depth and
//! validates names read back from disk. Depth 1 is the year, then month token,
//! day, hour (`9h`), minute (`25min`) and second (`10s`). A folder at depth `d`
//! is named by joining components `1..=d` with `_`, so `2023_märz_17` is the day
//! folder nested as `2023/2023_märz/2023_märz_17`.

use crate::types::{Timestamp, MAX_DEPTH};
use chrono::{Datelike, Timelike};
use unicode_normalization::UnicodeNormalization;

/// Month tokens indexed by zero-based month
pub const MONTH_TOKENS: [&str; 12] = [
    "jan", "feb", "märz", "apr", "mai", "jun", "jul", "aug", "sep", "okt", "nov", "dez",
];

const SEPARATOR: char = '_';

/// Single naming component of `ts` at `depth` (1..=6)
pub fn component(ts: &Timestamp, depth: usize) -> Option<String> {
    let value = match depth {
        1 => ts.year().to_string(),
        2 => MONTH_TOKENS[ts.month0() as usize].to_string(),
        3 => ts.day().to_string(),
        4 => format!("{}h", ts.hour()),
        5 => format!("{}min", ts.minute()),
        6 => format!("{}s", ts.second()),
        _ => return None,
    };
    Some(value)
}

/// Full folder name of `ts` at `depth`; deeper requests are capped at the finest depth
pub fn folder_name(ts: &Timestamp, depth: usize) -> String {
    (1..=depth.min(MAX_DEPTH))
        .filter_map(|d| component(ts, d))
        .collect::<Vec<_>>()
        .join("_")
}

/// Folder names from depth 1 down to `depth`
pub fn folder_chain(ts: &Timestamp, depth: usize) -> Vec<String> {
    (1..=depth.min(MAX_DEPTH))
        .map(|d| folder_name(ts, d))
        .collect()
}

/// Whether `segment` is a valid component at `depth`
pub fn is_valid_component(segment: &str, depth: usize) -> bool {
    match depth {
        1 => parse_signed(segment).is_some(),
        2 => MONTH_TOKENS.contains(&segment),
        3 => in_range(segment, 31),
        4 => segment
            .strip_suffix('h')
            .map_or(false, |value| in_range(value, 23)),
        5 => segment
            .strip_suffix("min")
            .map_or(false, |value| in_range(value, 59)),
        6 => segment
            .strip_suffix('s')
            .map_or(false, |value| in_range(value, 59)),
        _ => false,
    }
}

fn parse_signed(segment: &str) -> Option<i64> {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn in_range(segment: &str, max: u32) -> bool {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    segment.parse::<u32>().map_or(false, |value| value <= max)
}

/// Validate a bare folder name against the scheme at `depth`
pub fn validate_name(name: &str, depth: usize) -> bool {
    if depth == 0 {
        return name.is_empty();
    }
    if depth > MAX_DEPTH {
        return false;
    }
    let segments: Vec<&str> = name.split(SEPARATOR).collect();
    segments.len() == depth
        && segments
            .iter()
            .enumerate()
            .all(|(i, segment)| is_valid_component(segment, i + 1))
}

/// Validate the root-to-folder name chain.
///
/// `names[0]` is the root and must be empty. Every later name must extend its
/// parent by exactly one valid component: the whole name at depth 1, and
/// `parent + "_" + component` below that.
pub fn validate_chain<S: AsRef<str>>(names: &[S]) -> bool {
    let Some(root) = names.first() else {
        return false;
    };
    if !root.as_ref().is_empty() || names.len() > MAX_DEPTH + 1 {
        return false;
    }
    names.windows(2).enumerate().all(|(i, pair)| {
        let depth = i + 1;
        let (parent, name) = (pair[0].as_ref(), pair[1].as_ref());
        let Some(rest) = name.strip_prefix(parent) else {
            return false;
        };
        let suffix = if depth == 1 {
            rest
        } else {
            match rest.strip_prefix(SEPARATOR) {
                Some(suffix) => suffix,
                None => return false,
            }
        };
        !suffix.contains(SEPARATOR) && is_valid_component(suffix, depth)
    })
}

/// Name of the parent folder implied by `name`, i.e. `name` minus its last component
pub fn parent_name(name: &str) -> Option<&str> {
    name.rfind(SEPARATOR).map(|idx| &name[..idx])
}

/// Normalize a name read from disk to NFC so composed and decomposed umlauts compare equal
pub fn normalize(name: &str) -> String {
    name.nfc().collect()
}
