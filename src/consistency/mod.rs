//! Consistency checking and repair
//!
//! The `Checker` walks the graph once and records every violation it finds
//! per kind. The `Fixer` consumes that report and repairs the repository in a
//! fixed order: error folder, renames, relocation, splitting, collapsing.

pub mod checker;
pub mod fixer;

pub use checker::Checker;
pub use fixer::{FixReport, Fixer, Rename};

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of consistency violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    InvalidFolderName,
    InvalidFolderStructure,
    FolderAboveThreshold,
    FilesInNonLeaf,
    FolderContainsInconsistentDates,
    CanBeReduced,
    ErrorFolderMissing,
}

impl Violation {
    pub const ALL: [Violation; 7] = [
        Violation::InvalidFolderName,
        Violation::InvalidFolderStructure,
        Violation::FolderAboveThreshold,
        Violation::FilesInNonLeaf,
        Violation::FolderContainsInconsistentDates,
        Violation::CanBeReduced,
        Violation::ErrorFolderMissing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Violation::InvalidFolderName => "INVALID_FOLDER_NAME",
            Violation::InvalidFolderStructure => "INVALID_FOLDER_STRUCTURE",
            Violation::FolderAboveThreshold => "FOLDER_ABOVE_THRESHOLD",
            Violation::FilesInNonLeaf => "FILES_IN_NON_LEAF",
            Violation::FolderContainsInconsistentDates => "FOLDER_CONTAINS_INCONSISTENT_DATES",
            Violation::CanBeReduced => "CAN_BE_REDUCED",
            Violation::ErrorFolderMissing => "ERROR_FOLDER_MISSING",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violations found by one check, grouped by kind in discovery order
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    violations: BTreeMap<Violation, Vec<NodeId>>,
    folders_checked: usize,
}

impl CheckReport {
    pub fn record(&mut self, kind: Violation, node: NodeId) {
        self.violations.entry(kind).or_default().push(node);
    }

    pub(crate) fn folder_checked(&mut self) -> usize {
        self.folders_checked += 1;
        self.folders_checked
    }

    pub fn folders_checked(&self) -> usize {
        self.folders_checked
    }

    pub fn nodes(&self, kind: Violation) -> &[NodeId] {
        self.violations.get(&kind).map_or(&[], |nodes| nodes.as_slice())
    }

    pub fn count(&self, kind: Violation) -> usize {
        self.nodes(kind).len()
    }

    pub fn contains(&self, kind: Violation, node: NodeId) -> bool {
        self.nodes(kind).contains(&node)
    }

    /// Total number of recorded violations across all kinds
    pub fn total(&self) -> usize {
        self.violations.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// Every kind with its offending nodes, including kinds with none
    pub fn iter(&self) -> impl Iterator<Item = (Violation, &[NodeId])> {
        Violation::ALL.into_iter().map(|kind| (kind, self.nodes(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_per_kind() {
        let mut report = CheckReport::default();
        report.record(Violation::InvalidFolderName, NodeId(3));
        report.record(Violation::CanBeReduced, NodeId(3));
        report.record(Violation::CanBeReduced, NodeId(4));

        assert_eq!(report.total(), 3);
        assert_eq!(report.count(Violation::CanBeReduced), 2);
        assert_eq!(report.count(Violation::FilesInNonLeaf), 0);
        assert!(report.contains(Violation::InvalidFolderName, NodeId(3)));
        assert!(!report.is_clean());
        assert_eq!(report.iter().count(), Violation::ALL.len());
    }

    #[test]
    fn test_violation_names() {
        assert_eq!(
            Violation::FolderContainsInconsistentDates.to_string(),
            "FOLDER_CONTAINS_INCONSISTENT_DATES"
        );
        let json = serde_json::to_string(&Violation::CanBeReduced).unwrap();
        assert_eq!(json, "\"CAN_BE_REDUCED\"");
    }
}
