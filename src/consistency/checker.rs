//! Consistency checker

use super::{CheckReport, Violation};
use crate::date::DateSource;
use crate::error::GraphError;
use crate::naming;
use crate::tree::{FileGraph, Node};
use crate::types::NodeId;
use tracing::{info, warn};

/// Verifies naming, placement and size invariants over a whole graph
pub struct Checker<'a> {
    graph: &'a FileGraph,
    dates: &'a dyn DateSource,
    threshold: usize,
}

impl<'a> Checker<'a> {
    pub fn new(graph: &'a FileGraph, dates: &'a dyn DateSource, threshold: usize) -> Self {
        Self {
            graph,
            dates,
            threshold,
        }
    }

    /// Walk every folder outside the error folder once and collect violations.
    ///
    /// `progress` receives the number of folders checked so far. A leaf whose
    /// directory has vanished aborts the check.
    pub fn check_all(&self, progress: &mut dyn FnMut(usize)) -> Result<CheckReport, GraphError> {
        let mut report = CheckReport::default();
        let mut chain = Vec::new();
        let root = self.graph.root();
        self.visit(root, &mut chain, &mut report, progress)?;

        let error_present = match self.graph.error_node() {
            Some(id) => self.graph.node(id)?.path.is_dir(),
            None => false,
        };
        if !error_present {
            report.record(Violation::ErrorFolderMissing, root);
        }
        info!(
            folders = report.folders_checked(),
            violations = report.total(),
            "Check finished"
        );
        Ok(report)
    }

    fn visit(
        &self,
        id: NodeId,
        chain: &mut Vec<String>,
        report: &mut CheckReport,
        progress: &mut dyn FnMut(usize),
    ) -> Result<usize, GraphError> {
        if self.graph.is_error_node(id) {
            return Ok(0);
        }
        let node = self.graph.node(id)?;
        chain.push(node.name.clone());

        if !naming::validate_name(&node.name, node.depth) {
            report.record(Violation::InvalidFolderName, id);
        }
        if node.file_count > self.threshold {
            report.record(Violation::FolderAboveThreshold, id);
        }
        if !node.leaf && node.file_count != 0 {
            report.record(Violation::FilesInNonLeaf, id);
        }

        let mut files = node.file_count;
        if node.leaf {
            if !naming::validate_chain(chain) {
                report.record(Violation::InvalidFolderStructure, id);
            }
            if !node.path.is_dir() {
                return Err(GraphError::Desync(format!(
                    "leaf folder {} no longer exists",
                    node.path.display()
                )));
            }
            if !self.dates_match(node) {
                report.record(Violation::FolderContainsInconsistentDates, id);
            }
        } else {
            let mut children: Vec<&Node> = node
                .children
                .iter()
                .map(|child| self.graph.node(*child))
                .collect::<Result<_, _>>()?;
            children.sort_by(|a, b| a.name.cmp(&b.name));
            for child in children {
                files += self.visit(child.id, chain, report, progress)?;
            }
        }

        let reducible = if node.leaf {
            files == 0
        } else {
            files <= self.threshold
        };
        if reducible && !node.is_root() {
            report.record(Violation::CanBeReduced, id);
        }

        progress(report.folder_checked());
        chain.pop();
        Ok(files)
    }

    /// Whether every file in a leaf encodes to the leaf's own name
    fn dates_match(&self, node: &Node) -> bool {
        let files = match self.graph.direct_files(node.id) {
            Ok(files) => files,
            Err(e) => {
                warn!(path = %node.path.display(), error = %e, "Cannot list folder");
                return true;
            }
        };
        files.iter().all(|file| {
            self.dates
                .date_of(file)
                .map_or(false, |ts| naming::folder_name(&ts, node.depth) == node.name)
        })
    }
}
