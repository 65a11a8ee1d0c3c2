//! Folder node stored in the graph arena

use crate::types::NodeId;
use std::ffi::OsString;
use std::path::PathBuf;

/// One folder of the repository.
///
/// `name` is the NFC-normalized folder name used for comparisons and naming
/// checks; `file_name` is the name as it appears on disk and is what `path` is
/// derived from. The root has an empty `name`.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub file_name: OsString,
    pub path: PathBuf,
    pub depth: usize,
    /// Holds files directly rather than subfolders
    pub leaf: bool,
    /// Files directly inside this folder, excluding the repository marker
    pub file_count: usize,
    /// Files in this folder and all descendants, refreshed by resync only
    pub subtree_file_count: usize,
    /// Bytes in this folder and all descendants, refreshed by resync only
    pub subtree_size: u64,
    pub children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn root(id: NodeId, path: PathBuf) -> Self {
        Self {
            id,
            parent: None,
            name: String::new(),
            file_name: OsString::new(),
            path,
            depth: 0,
            leaf: false,
            file_count: 0,
            subtree_file_count: 0,
            subtree_size: 0,
            children: Vec::new(),
        }
    }

    pub(crate) fn child_of(parent: &Node, id: NodeId, name: String, file_name: OsString) -> Self {
        Self {
            id,
            parent: Some(parent.id),
            path: parent.path.join(&file_name),
            name,
            file_name,
            depth: parent.depth + 1,
            leaf: true,
            file_count: 0,
            subtree_file_count: 0,
            subtree_size: 0,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
