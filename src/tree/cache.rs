//! Per-repository graph cache owned by the command layer

use crate::error::GraphError;
use crate::tree::graph::FileGraph;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Graphs keyed by canonical repository root.
///
/// Repeated lookups for the same root within one command reuse the same
/// graph instead of rescanning.
#[derive(Debug, Default)]
pub struct GraphCache {
    graphs: HashMap<PathBuf, FileGraph>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached graph for `root`, scanning it on first use
    pub fn get(&mut self, root: &Path) -> Result<&mut FileGraph, GraphError> {
        let key = dunce::canonicalize(root).map_err(|e| GraphError::io(root, e))?;
        match self.graphs.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let graph = FileGraph::scan(entry.key())?;
                Ok(entry.insert(graph))
            }
        }
    }

    /// Drop the cached graph for `root` so the next `get` rescans
    pub fn invalidate(&mut self, root: &Path) -> Option<FileGraph> {
        let key = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        self.graphs.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}
