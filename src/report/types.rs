//! Shared output types for check, repair, organize, mark and status.

use crate::consistency::{CheckReport, FixReport};
use crate::organize::{MarkReport, OrganizeReport};
use crate::repository::RepositoryProperties;
use crate::tree::{FileGraph, GraphStats};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One violation kind with the folders it was found in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationEntry {
    pub kind: String,
    pub count: usize,
    pub paths: Vec<String>,
}

/// Check result for text and JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutput {
    pub repository: String,
    pub folders_checked: usize,
    pub total: usize,
    pub violations: Vec<ViolationEntry>,
}

impl CheckOutput {
    /// Resolve node ids against the graph that was checked.
    pub fn from_report(graph: &FileGraph, report: &CheckReport) -> Self {
        let violations = report
            .iter()
            .map(|(kind, nodes)| ViolationEntry {
                kind: kind.to_string(),
                count: nodes.len(),
                paths: nodes
                    .iter()
                    .filter_map(|id| graph.get(*id))
                    .map(|node| display_path(graph.root_path(), &node.path))
                    .collect(),
            })
            .collect();
        Self {
            repository: graph.root_path().display().to_string(),
            folders_checked: report.folders_checked(),
            total: report.total(),
            violations,
        }
    }
}

/// A folder renamed by repair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameEntry {
    pub from: String,
    pub to: String,
}

/// Repair result: counts before and after plus what was changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutput {
    pub repository: String,
    pub found: usize,
    pub fixed: usize,
    /// Violations left by the check that ran after the repair
    pub remaining: usize,
    pub error_folder_created: bool,
    pub renamed: Vec<RenameEntry>,
    pub relocated_files: usize,
    pub failed_files: usize,
    pub reorganized: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<CheckOutput>,
}

impl RepairOutput {
    pub fn nothing_to_repair(root: &Path) -> Self {
        Self {
            repository: root.display().to_string(),
            found: 0,
            fixed: 0,
            remaining: 0,
            error_folder_created: false,
            renamed: Vec::new(),
            relocated_files: 0,
            failed_files: 0,
            reorganized: 0,
            after: None,
        }
    }

    pub fn from_fix(root: &Path, fix: &FixReport, after: CheckOutput) -> Self {
        Self {
            repository: root.display().to_string(),
            found: fix.found,
            fixed: fix.fixed,
            remaining: after.total,
            error_folder_created: fix.error_folder_created,
            renamed: fix
                .restored
                .iter()
                .map(|rename| RenameEntry {
                    from: display_path(root, &rename.from),
                    to: display_path(root, &rename.to),
                })
                .collect(),
            relocated_files: fix.relocated_files,
            failed_files: fix.failed_files,
            reorganized: fix.reorganized,
            after: Some(after),
        }
    }
}

/// Organize result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOutput {
    pub repository: String,
    pub source: String,
    pub mode: String,
    pub files: usize,
    pub placed: usize,
    pub replaced: usize,
    pub unknown_date: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl OrganizeOutput {
    pub fn new(root: &Path, source: &Path, mode: &str, report: &OrganizeReport) -> Self {
        Self {
            repository: root.display().to_string(),
            source: source.display().to_string(),
            mode: mode.to_string(),
            files: report.files,
            placed: report.placed,
            replaced: report.replaced,
            unknown_date: report.unknown_date,
            skipped: report.skipped,
            failed: report.failed,
        }
    }
}

/// Mark result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkOutput {
    pub repository: String,
    pub marked: usize,
    pub undated: usize,
    pub failed: usize,
}

impl MarkOutput {
    pub fn new(root: &Path, report: &MarkReport) -> Self {
        Self {
            repository: root.display().to_string(),
            marked: report.marked,
            undated: report.undated,
            failed: report.failed,
        }
    }
}

/// Status of a directory: repository or not, its properties and graph figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOutput {
    pub path: String,
    pub initialized: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<RepositoryProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<GraphStats>,
}

/// Path relative to the repository root, `.` for the root itself
pub fn display_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) if relative.as_os_str().is_empty() => ".".to_string(),
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
