//! Reduce: collapse sparse subtrees back into their parent

use super::Organizer;
use crate::error::GraphError;
use crate::transfer::{resolve_file_name, TransferMode};
use crate::types::NodeId;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

impl Organizer<'_> {
    /// Collapse every subtree that no longer needs its subfolders.
    ///
    /// Post-order over the whole graph: empty leaves are deleted, then a folder
    /// whose children are all leaves holding at most `threshold` files in
    /// total absorbs their files and becomes a leaf. The root and the error
    /// folder are never collapsed or deleted.
    pub fn reduce(&mut self) -> Result<(), GraphError> {
        let root = self.graph.root();
        self.reduce_node(root)
    }

    fn reduce_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if self.graph.is_error_node(id) || self.graph.node(id)?.leaf {
            return Ok(());
        }
        for child in self.graph.children(id)? {
            if self.graph.is_error_node(child) {
                continue;
            }
            self.reduce_node(child)?;
            let node = self.graph.node(child)?;
            if node.leaf && node.file_count == 0 {
                self.delete_empty_leaf(child)?;
            }
        }

        if id == self.graph.root() {
            return Ok(());
        }
        let children = self.graph.children(id)?;
        let mut total = 0;
        for child in &children {
            let node = self.graph.node(*child)?;
            if !node.leaf {
                return Ok(());
            }
            total += node.file_count;
        }
        if total > self.threshold {
            return Ok(());
        }
        self.collapse(id, &children)
    }

    fn delete_empty_leaf(&mut self, id: NodeId) -> Result<(), GraphError> {
        let path = self.graph.node(id)?.path.clone();
        match fs::remove_dir(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed empty folder"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                if has_entries(&path) {
                    return Err(GraphError::Desync(format!(
                        "{} is counted empty but is not: {}",
                        path.display(),
                        e
                    )));
                }
                warn!(path = %path.display(), error = %e, "Failed to remove empty folder");
                return Ok(());
            }
        }
        self.graph.remove(id)
    }

    fn collapse(&mut self, id: NodeId, children: &[NodeId]) -> Result<(), GraphError> {
        let dir = self.graph.node(id)?.path.clone();
        debug!(path = %dir.display(), children = children.len(), "Collapsing folder");

        let mut added = 0;
        for &child in children {
            let files = match self.graph.direct_files(child) {
                Ok(files) => files,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Cannot list folder, keeping it");
                    continue;
                }
            };

            let mut remaining = 0;
            for file in files {
                let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                    continue;
                };
                let date = self.dates.date_of(&file);
                let to = dir.join(resolve_file_name(&dir, &name, date.as_ref(), self.dates));
                let existed = fs::symlink_metadata(&to).is_ok();
                match TransferMode::MoveReplace.execute(&file, &to) {
                    Ok(()) => {
                        if !existed {
                            added += 1;
                        }
                        self.stamp(&to, date.as_ref());
                    }
                    Err(e) => {
                        warn!(path = %file.display(), error = %e, "Failed to move file while collapsing");
                        remaining += 1;
                    }
                }
            }

            if remaining == 0 {
                self.graph.node_mut(child)?.file_count = 0;
                self.delete_empty_leaf(child)?;
            } else {
                self.graph.node_mut(child)?.file_count = remaining;
            }
        }

        let node = self.graph.node_mut(id)?;
        node.file_count += added;
        node.leaf = node.children.is_empty();
        Ok(())
    }
}

fn has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
