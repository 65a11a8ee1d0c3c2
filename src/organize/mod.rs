//! Organizer: placement, splitting and collapsing of repository folders
//!
//! All operations mutate the `FileGraph` and the filesystem together. Progress
//! is reported through a plain callback receiving the running counter.

mod place;
mod reduce;
mod split;

pub use place::{PlaceOutcome, SkipReason};

use crate::date::{mark, DateSource};
use crate::error::GraphError;
use crate::transfer::TransferMode;
use crate::tree::FileGraph;
use crate::types::{Timestamp, MARKER_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// When an overflowing folder is split during a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReorganizePolicy {
    /// Split the target folder right after each placement
    #[default]
    Immediate,
    /// Split every overflowing target once, after the whole batch
    Deferred,
}

/// Options for a batch organize run
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub mode: TransferMode,
    /// Lowercase extensions to accept; empty accepts every file
    pub extensions: Vec<String>,
    pub policy: ReorganizePolicy,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            mode: TransferMode::Copy,
            extensions: Vec::new(),
            policy: ReorganizePolicy::Immediate,
        }
    }
}

/// Outcome counters of a batch organize run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrganizeReport {
    pub files: usize,
    pub placed: usize,
    pub replaced: usize,
    pub unknown_date: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Outcome counters of a mark run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkReport {
    pub marked: usize,
    pub undated: usize,
    pub failed: usize,
}

/// Places files into a repository and keeps folder sizes around `threshold`
pub struct Organizer<'a> {
    graph: &'a mut FileGraph,
    dates: &'a dyn DateSource,
    threshold: usize,
}

impl<'a> Organizer<'a> {
    pub fn new(graph: &'a mut FileGraph, dates: &'a dyn DateSource, threshold: usize) -> Self {
        Self {
            graph,
            dates,
            threshold,
        }
    }

    pub fn graph(&self) -> &FileGraph {
        &*self.graph
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Place every file below `source` into the repository.
    ///
    /// The repository's error folder is never read back as a source. Transient
    /// failures are logged and counted; graph invariant failures abort the run.
    pub fn organize(
        &mut self,
        source: &Path,
        options: &OrganizeOptions,
        progress: &mut dyn FnMut(usize),
    ) -> Result<OrganizeReport, GraphError> {
        let files = self.source_files(source, &options.extensions)?;
        info!(
            source = %source.display(),
            files = files.len(),
            mode = ?options.mode,
            "Organizing files"
        );

        let mut report = OrganizeReport {
            files: files.len(),
            ..OrganizeReport::default()
        };
        let mut overflowing = BTreeSet::new();
        for (index, file) in files.iter().enumerate() {
            match self.place(options.mode, file) {
                Ok(PlaceOutcome::Placed { node, replaced }) => {
                    report.placed += 1;
                    if replaced {
                        report.replaced += 1;
                    }
                    if self.graph.is_error_node(node) {
                        report.unknown_date += 1;
                    }
                    match options.policy {
                        ReorganizePolicy::Immediate => self.reorganize(node)?,
                        ReorganizePolicy::Deferred => {
                            if self.graph.node(node)?.file_count > self.threshold {
                                overflowing.insert(node);
                            }
                        }
                    }
                }
                Ok(PlaceOutcome::Skipped(_)) => report.skipped += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "Failed to place file");
                    report.failed += 1;
                }
            }
            progress(index + 1);
        }

        for node in overflowing {
            if self.graph.contains(node) {
                self.reorganize(node)?;
            }
        }
        info!(
            placed = report.placed,
            skipped = report.skipped,
            failed = report.failed,
            "Organize finished"
        );
        Ok(report)
    }

    /// Stamp every repository file outside the error folder with its processed marker
    pub fn mark_all(&mut self, progress: &mut dyn FnMut(usize)) -> Result<MarkReport, GraphError> {
        let root = self.graph.root_path().to_path_buf();
        let files = self.source_files(&root, &[])?;
        let mut report = MarkReport::default();
        for (index, file) in files.iter().enumerate() {
            match self.dates.date_of(file) {
                Some(ts) => match mark::mark_file(file, &ts) {
                    Ok(()) => report.marked += 1,
                    Err(e) => {
                        warn!(path = %file.display(), error = %e, "Failed to mark file");
                        report.failed += 1;
                    }
                },
                None => report.undated += 1,
            }
            progress(index + 1);
        }
        Ok(report)
    }

    fn source_files(&self, source: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, GraphError> {
        let source = dunce::canonicalize(source).map_err(|e| GraphError::io(source, e))?;
        let error_folder = self.graph.error_folder_path();
        let mut files = Vec::new();
        let walker = WalkDir::new(&source)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.path() != error_folder);
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || entry.file_name() == MARKER_FILE_NAME {
                continue;
            }
            if !extensions.is_empty() && !has_extension(entry.path(), extensions) {
                continue;
            }
            files.push(entry.into_path());
        }
        Ok(files)
    }

    fn stamp(&self, path: &Path, date: Option<&Timestamp>) {
        if let Some(ts) = date {
            if let Err(e) = mark::mark_file(path, ts) {
                warn!(path = %path.display(), error = %e, "Failed to mark file");
            }
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map_or(false, |ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
}
