//! Fixtures shared by the integration tests.
//!
//! Files carry their date in the name (`IMG_2023-03-21-09-25-10.jpg`), so the
//! default `FileDateExtractor` is exercised end to end.

use chronofold::config::ChronofoldConfig;
use chronofold::date::mark;
use chronofold::tooling::cli::CliContext;
use chronofold::tree::FileGraph;
use chronofold::Repository;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

/// Dates of the five-file scenario, `YYYY-MM-DD-hh-mm-ss`
pub const FIVE_DATES: [&str; 5] = [
    "2023-03-21-09-25-10",
    "2023-02-03-02-31-30",
    "2010-07-17-19-24-53",
    "2023-03-17-22-13-03",
    "2021-08-19-17-32-03",
];

pub fn file_name(date: &str) -> String {
    format!("IMG_{}.jpg", date)
}

/// Write a file whose name encodes `date`.
///
/// The modification time is pinned to a millisecond value that never reads
/// as a processed marker, so the date always comes from the name.
pub fn dated_file(dir: &Path, date: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let name = file_name(date);
    let path = dir.join(&name);
    fs::write(&path, date).unwrap();
    let millis = 1_600_000_000_000 + (mark::mark_of(&name) + 1) % 1000;
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_millis(millis))
        .unwrap();
    path
}

/// A source directory holding one file per date
pub fn source_with(dates: &[&str]) -> TempDir {
    let source = TempDir::new().unwrap();
    for date in dates {
        dated_file(source.path(), date);
    }
    source
}

/// An initialized, empty repository
pub fn repository(folder_size: usize) -> (TempDir, Repository) {
    let dir = TempDir::new().unwrap();
    let repository = Repository::init(dir.path(), Some(folder_size)).unwrap();
    (dir, repository)
}

/// Names of all leaves outside the error folder, sorted
pub fn leaf_names(graph: &FileGraph) -> Vec<String> {
    let mut names: Vec<String> = graph
        .leaves()
        .into_iter()
        .map(|id| graph.node(id).unwrap().name.clone())
        .collect();
    names.sort();
    names
}

/// Regular files below `root` outside the error folder, excluding the marker
pub fn files_on_disk(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != "error")
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() != ".chronofold.toml")
        .count()
}

pub fn context(root: &Path) -> CliContext {
    CliContext::with_config(root.to_path_buf(), ChronofoldConfig::default())
}
