//! Consistency fixer
//!
//! Repairs run in phases, each building on the previous one:
//!
//! 1. recreate a missing error folder
//! 2. rename misnamed folders whose files all agree on the correct name
//! 3. re-place the files of every folder that could not be renamed
//! 4. split folders above the threshold
//! 5. collapse sparse subtrees
//!
//! Renames are applied one folder at a time and are not rolled back when a
//! later rename in the same chain is refused.

use super::{CheckReport, Violation};
use crate::date::DateSource;
use crate::error::GraphError;
use crate::naming;
use crate::organize::{Organizer, PlaceOutcome};
use crate::transfer::TransferMode;
use crate::tree::FileGraph;
use crate::types::{NodeId, MAX_DEPTH};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A folder renamed during repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of one repair run
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixReport {
    /// Violations in the check report that was repaired
    pub found: usize,
    /// Violations resolved by one of the phases
    pub fixed: usize,
    pub error_folder_created: bool,
    pub restored: Vec<Rename>,
    pub relocated_files: usize,
    pub failed_files: usize,
    pub reorganized: usize,
}

/// Kinds that a successful rename resolves for every folder on the path
const RESTORED_KINDS: [Violation; 3] = [
    Violation::InvalidFolderName,
    Violation::InvalidFolderStructure,
    Violation::FolderContainsInconsistentDates,
];

/// Kinds that emptying a folder resolves
const RELOCATED_KINDS: [Violation; 4] = [
    Violation::InvalidFolderName,
    Violation::InvalidFolderStructure,
    Violation::FolderContainsInconsistentDates,
    Violation::FilesInNonLeaf,
];

enum Restore {
    Complete(Vec<Rename>),
    Partial(Vec<Rename>),
    Impossible,
}

pub struct Fixer<'a> {
    graph: &'a mut FileGraph,
    dates: &'a dyn DateSource,
    threshold: usize,
    pending: BTreeSet<(Violation, NodeId)>,
    found: usize,
}

impl<'a> Fixer<'a> {
    pub fn new(graph: &'a mut FileGraph, dates: &'a dyn DateSource, threshold: usize) -> Self {
        Self {
            graph,
            dates,
            threshold,
            pending: BTreeSet::new(),
            found: 0,
        }
    }

    /// Repair everything recorded in `check`.
    ///
    /// `progress` receives the number of violations resolved so far. Per-file
    /// transfer failures are counted and skipped; only graph desync aborts.
    pub fn fix(
        &mut self,
        check: &CheckReport,
        progress: &mut dyn FnMut(usize),
    ) -> Result<FixReport, GraphError> {
        self.pending = check
            .iter()
            .flat_map(|(kind, nodes)| nodes.iter().map(move |node| (kind, *node)))
            .collect();
        self.found = check.total();
        let mut report = FixReport {
            found: self.found,
            ..FixReport::default()
        };

        if check.count(Violation::ErrorFolderMissing) > 0 {
            self.graph.ensure_error_node()?;
            self.pending
                .retain(|(kind, _)| *kind != Violation::ErrorFolderMissing);
            report.error_folder_created = true;
            progress(self.fixed());
        }

        let mut faulty = self.faulty_set(check)?;
        self.restore_phase(check, &mut faulty, &mut report, progress)?;
        let overflowing = self.relocate_phase(check, &faulty, &mut report, progress)?;
        self.reorganize_phase(check, overflowing, &mut report, progress)?;

        Organizer::new(&mut *self.graph, self.dates, self.threshold).reduce()?;
        let mut reduced = Vec::new();
        for &(kind, id) in &self.pending {
            if kind == Violation::CanBeReduced && !self.still_reducible(id)? {
                reduced.push(id);
            }
        }
        for id in reduced {
            self.credit(id, &[Violation::CanBeReduced]);
        }
        progress(self.fixed());

        report.fixed = self.fixed();
        info!(
            found = report.found,
            fixed = report.fixed,
            restored = report.restored.len(),
            relocated = report.relocated_files,
            "Repair finished"
        );
        Ok(report)
    }

    fn fixed(&self) -> usize {
        self.found - self.pending.len()
    }

    fn credit(&mut self, node: NodeId, kinds: &[Violation]) {
        self.pending
            .retain(|(kind, id)| *id != node || !kinds.contains(kind));
    }

    fn still_reducible(&self, id: NodeId) -> Result<bool, GraphError> {
        if !self.graph.contains(id) {
            return Ok(false);
        }
        let node = self.graph.node(id)?;
        if node.leaf {
            return Ok(node.file_count == 0);
        }
        Ok(self.subtree_files(id)? <= self.threshold)
    }

    fn subtree_files(&self, id: NodeId) -> Result<usize, GraphError> {
        let node = self.graph.node(id)?;
        let mut total = node.file_count;
        for &child in &node.children {
            if !self.graph.is_error_node(child) {
                total += self.subtree_files(child)?;
            }
        }
        Ok(total)
    }

    /// Folders whose name or contents cannot be trusted: every folder on the
    /// path to a structurally invalid leaf, misnamed folders, and leaves with
    /// foreign files. The root is never part of it.
    fn faulty_set(&self, check: &CheckReport) -> Result<BTreeSet<NodeId>, GraphError> {
        let mut faulty = BTreeSet::new();
        for &id in check.nodes(Violation::InvalidFolderStructure) {
            if self.graph.contains(id) {
                faulty.extend(self.graph.ancestry(id)?);
            }
        }
        faulty.extend(check.nodes(Violation::InvalidFolderName).iter().copied());
        faulty.extend(
            check
                .nodes(Violation::FolderContainsInconsistentDates)
                .iter()
                .copied(),
        );
        faulty.remove(&self.graph.root());
        Ok(faulty)
    }

    fn restore_phase(
        &mut self,
        check: &CheckReport,
        faulty: &mut BTreeSet<NodeId>,
        report: &mut FixReport,
        progress: &mut dyn FnMut(usize),
    ) -> Result<(), GraphError> {
        let mut candidates = Vec::new();
        let mut seen = BTreeSet::new();
        let leaves_named_wrong = check
            .nodes(Violation::InvalidFolderName)
            .iter()
            .filter(|id| self.graph.get(**id).map_or(false, |n| n.leaf));
        for &id in check
            .nodes(Violation::InvalidFolderStructure)
            .iter()
            .chain(check.nodes(Violation::FolderContainsInconsistentDates))
            .chain(leaves_named_wrong)
        {
            if seen.insert(id) {
                candidates.push(id);
            }
        }

        for id in candidates {
            if !self.graph.contains(id) || !faulty.contains(&id) {
                continue;
            }
            let depth = self.graph.node(id)?.depth;
            if depth == 0 || depth > MAX_DEPTH {
                continue;
            }
            match self.restore(id, faulty)? {
                Restore::Complete(renames) => {
                    for node in self.graph.ancestry(id)? {
                        faulty.remove(&node);
                        self.credit(node, &RESTORED_KINDS);
                    }
                    report.restored.extend(renames);
                    progress(self.fixed());
                }
                Restore::Partial(renames) => report.restored.extend(renames),
                Restore::Impossible => {}
            }
        }
        Ok(())
    }

    /// Rename `id` and its ancestors after the name its files agree on
    fn restore(&mut self, id: NodeId, faulty: &BTreeSet<NodeId>) -> Result<Restore, GraphError> {
        let Some(leaf_name) = self.inferred_name(id)? else {
            return Ok(Restore::Impossible);
        };

        let mut plan = Vec::new();
        let mut name = leaf_name;
        for node in self.graph.ancestry(id)?.into_iter().skip(1).rev() {
            let parent = naming::parent_name(&name).map(str::to_string);
            plan.push((node, name));
            match parent {
                Some(parent) => name = parent,
                None => break,
            }
        }

        let mut renames = Vec::new();
        let mut below = None;
        for (node, new_name) in plan {
            let current = self.graph.node(node)?;
            if current.name != new_name {
                if !self.siblings_agree(node, &new_name, faulty)?
                    || !self.children_agree(node, &new_name, below, faulty)?
                {
                    debug!(
                        path = %current.path.display(),
                        name = %new_name,
                        "Rename refused by neighbouring folders"
                    );
                    return Ok(partial(renames));
                }
                let from = current.path.clone();
                match self.graph.rename(node, &new_name) {
                    Ok(()) => renames.push(Rename {
                        from,
                        to: self.graph.node(node)?.path.clone(),
                    }),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(path = %from.display(), error = %e, "Failed to rename folder");
                        return Ok(partial(renames));
                    }
                }
            }
            below = Some(node);
        }
        Ok(Restore::Complete(renames))
    }

    /// The folder name at this depth shared by every file in `id`, if any
    fn inferred_name(&self, id: NodeId) -> Result<Option<String>, GraphError> {
        let depth = self.graph.node(id)?.depth;
        let files = match self.graph.direct_files(id) {
            Ok(files) => files,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Cannot list folder");
                return Ok(None);
            }
        };

        let mut shared: Option<String> = None;
        for file in files {
            let Some(ts) = self.dates.date_of(&file) else {
                return Ok(None);
            };
            let name = naming::folder_name(&ts, depth);
            match &shared {
                Some(existing) if *existing != name => return Ok(None),
                Some(_) => {}
                None => shared = Some(name),
            }
        }
        Ok(shared)
    }

    /// Whether `id` may take `new_name` among its siblings.
    ///
    /// No sibling may already carry the name, and below the first level every
    /// sound sibling must share the new parent prefix.
    fn siblings_agree(
        &self,
        id: NodeId,
        new_name: &str,
        faulty: &BTreeSet<NodeId>,
    ) -> Result<bool, GraphError> {
        let node = self.graph.node(id)?;
        let Some(parent) = node.parent else {
            return Ok(false);
        };
        let siblings: Vec<NodeId> = self
            .graph
            .children(parent)?
            .into_iter()
            .filter(|sibling| *sibling != id)
            .collect();

        for &sibling in &siblings {
            if self.graph.node(sibling)?.name == new_name {
                return Ok(false);
            }
        }
        if node.depth < 2 {
            return Ok(true);
        }

        let Some(prefix) = naming::parent_name(new_name) else {
            return Ok(false);
        };
        let prefix = format!("{}_", prefix);
        for sibling in siblings {
            if faulty.contains(&sibling) || self.graph.is_error_node(sibling) {
                continue;
            }
            if !self.graph.node(sibling)?.name.starts_with(&prefix) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether the sound children of `id` outside the restored chain already
    /// carry `new_name` as their prefix
    fn children_agree(
        &self,
        id: NodeId,
        new_name: &str,
        chain_child: Option<NodeId>,
        faulty: &BTreeSet<NodeId>,
    ) -> Result<bool, GraphError> {
        let prefix = format!("{}_", new_name);
        for child in self.graph.children(id)? {
            if Some(child) == chain_child
                || faulty.contains(&child)
                || self.graph.is_error_node(child)
            {
                continue;
            }
            if !self.graph.node(child)?.name.starts_with(&prefix) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Move the files of faulty and overpopulated inner folders to where
    /// their dates belong. Returns folders pushed above the threshold.
    fn relocate_phase(
        &mut self,
        check: &CheckReport,
        faulty: &BTreeSet<NodeId>,
        report: &mut FixReport,
        progress: &mut dyn FnMut(usize),
    ) -> Result<BTreeSet<NodeId>, GraphError> {
        let mut sources = faulty.clone();
        sources.extend(check.nodes(Violation::FilesInNonLeaf).iter().copied());

        let mut overflowing = BTreeSet::new();
        for source in sources {
            if !self.graph.contains(source) || self.graph.is_error_node(source) {
                continue;
            }
            let files = match self.graph.direct_files(source) {
                Ok(files) => files,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Cannot list folder, skipping relocation");
                    continue;
                }
            };

            let mut organizer = Organizer::new(&mut *self.graph, self.dates, self.threshold);
            for file in files {
                match organizer.place(TransferMode::MoveReplace, &file) {
                    Ok(PlaceOutcome::Placed { node, .. }) => {
                        if node != source {
                            report.relocated_files += 1;
                        }
                        if organizer.graph().node(node)?.file_count > self.threshold {
                            overflowing.insert(node);
                        }
                    }
                    Ok(PlaceOutcome::Skipped(_)) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        warn!(path = %file.display(), error = %e, "Failed to relocate file");
                        report.failed_files += 1;
                    }
                }
            }

            // placement may have moved files that were counted here
            let remaining = match self.graph.direct_files(source) {
                Ok(files) => files.len(),
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => 0,
            };
            self.graph.node_mut(source)?.file_count = remaining;
            self.credit(source, &RELOCATED_KINDS);
            progress(self.fixed());
        }
        Ok(overflowing)
    }

    fn reorganize_phase(
        &mut self,
        check: &CheckReport,
        mut targets: BTreeSet<NodeId>,
        report: &mut FixReport,
        progress: &mut dyn FnMut(usize),
    ) -> Result<(), GraphError> {
        targets.extend(check.nodes(Violation::FolderAboveThreshold).iter().copied());
        for id in targets {
            if !self.graph.contains(id) {
                continue;
            }
            let overflowing = self.graph.node(id)?.file_count > self.threshold;
            if overflowing {
                Organizer::new(&mut *self.graph, self.dates, self.threshold).reorganize(id)?;
            }
            let resolved =
                !self.graph.contains(id) || self.graph.node(id)?.file_count <= self.threshold;
            if resolved {
                if overflowing {
                    report.reorganized += 1;
                }
                self.credit(id, &[Violation::FolderAboveThreshold]);
            }
            progress(self.fixed());
        }
        Ok(())
    }
}

fn partial(renames: Vec<Rename>) -> Restore {
    if renames.is_empty() {
        Restore::Impossible
    } else {
        Restore::Partial(renames)
    }
}
