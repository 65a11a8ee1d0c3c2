//! Resync: refresh graph nodes from the live filesystem

use crate::error::GraphError;
use crate::tree::graph::FileGraph;
use crate::types::{NodeId, ERROR_FOLDER_NAME, MARKER_FILE_NAME};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;

impl FileGraph {
    /// Refresh `id` and its descendants from disk.
    ///
    /// Counts, leaf flags and children are rebuilt; nodes whose directory has
    /// vanished are dropped. Nothing on disk is modified.
    pub fn resync(&mut self, id: NodeId) -> Result<(), GraphError> {
        let path = self.node(id)?.path.clone();
        let is_root = id == self.root();

        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound && !is_root => {
                self.remove(id)?;
                return Ok(());
            }
            Err(e) => return Err(GraphError::io(&path, e)),
        };

        let mut file_count = 0;
        let mut size = 0u64;
        let mut dirs: Vec<OsString> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GraphError::io(&path, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| GraphError::io(entry.path(), e))?;
            if file_type.is_dir() {
                dirs.push(entry.file_name());
            } else if entry.file_name() != MARKER_FILE_NAME {
                file_count += 1;
                size += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        dirs.sort();

        let stale: Vec<NodeId> = self
            .node(id)?
            .children
            .iter()
            .copied()
            .filter(|child| {
                self.get(*child)
                    .map_or(true, |c| !dirs.contains(&c.file_name))
            })
            .collect();
        for child in stale {
            self.remove(child)?;
        }

        let mut subtree_files = file_count;
        let mut subtree_size = size;
        for file_name in dirs {
            let existing = self
                .node(id)?
                .children
                .iter()
                .copied()
                .find(|child| self.get(*child).map_or(false, |c| c.file_name == file_name));
            let child = match existing {
                Some(child) => child,
                None => self.add_child_from_disk(id, file_name)?,
            };
            self.resync(child)?;
            if let Some(child) = self.get(child) {
                subtree_files += child.subtree_file_count;
                subtree_size += child.subtree_size;
            }
        }

        let node = self.node_mut(id)?;
        node.file_count = file_count;
        node.subtree_file_count = subtree_files;
        node.subtree_size = subtree_size;
        node.leaf = !is_root && node.children.is_empty();

        if is_root {
            let error = self.child_named(id, ERROR_FOLDER_NAME)?;
            self.set_error_node(error);
        }
        Ok(())
    }
}
