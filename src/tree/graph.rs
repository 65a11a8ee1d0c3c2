//! File graph: lookup by timestamp and structural mutation

use crate::error::GraphError;
use crate::naming;
use crate::tree::node::Node;
use crate::types::{NodeId, Timestamp, ERROR_FOLDER_NAME, MARKER_FILE_NAME, MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Folder tree mirroring one repository root
#[derive(Debug)]
pub struct FileGraph {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    error_node: Option<NodeId>,
}

/// Aggregate figures for status output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub folders: usize,
    pub leaves: usize,
    pub files: usize,
    pub bytes: u64,
    pub max_depth: usize,
}

impl FileGraph {
    /// Build a graph by scanning `root`, without touching the filesystem
    pub fn scan(root: &Path) -> Result<Self, GraphError> {
        let root_path = dunce::canonicalize(root).map_err(|e| GraphError::io(root, e))?;
        let mut graph = Self {
            nodes: vec![Some(Node::root(NodeId(0), root_path))],
            root: NodeId(0),
            error_node: None,
        };
        graph.resync(graph.root)?;
        debug!(
            root = %graph.root_path().display(),
            folders = graph.iter().count(),
            "Scanned repository"
        );
        Ok(graph)
    }

    /// Build a graph by scanning `root` and create the error folder if absent
    pub fn open(root: &Path) -> Result<Self, GraphError> {
        let mut graph = Self::scan(root)?;
        graph.ensure_error_node()?;
        Ok(graph)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_path(&self) -> &Path {
        self.nodes[self.root.0]
            .as_ref()
            .map(|n| n.path.as_path())
            .unwrap_or_else(|| Path::new(""))
    }

    pub fn error_node(&self) -> Option<NodeId> {
        self.error_node
    }

    pub fn is_error_node(&self, id: NodeId) -> bool {
        self.error_node == Some(id)
    }

    pub(crate) fn set_error_node(&mut self, id: Option<NodeId>) {
        self.error_node = id;
    }

    pub fn error_folder_path(&self) -> PathBuf {
        self.root_path().join(ERROR_FOLDER_NAME)
    }

    /// Return the error node, creating the folder and node when missing
    pub fn ensure_error_node(&mut self) -> Result<NodeId, GraphError> {
        let path = self.error_folder_path();
        fs::create_dir_all(&path).map_err(|e| GraphError::io(&path, e))?;
        if let Some(id) = self.error_node {
            if self.contains(id) {
                return Ok(id);
            }
        }
        let id = match self.child_named(self.root, ERROR_FOLDER_NAME)? {
            Some(id) => id,
            None => {
                debug!(path = %path.display(), "Created error folder");
                self.add_child(self.root, ERROR_FOLDER_NAME)?
            }
        };
        self.error_node = Some(id);
        Ok(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.get(id).ok_or(GraphError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or(GraphError::UnknownNode(id))
    }

    /// Live nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        Ok(self.node(id)?.children.clone())
    }

    pub fn child_named(&self, id: NodeId, name: &str) -> Result<Option<NodeId>, GraphError> {
        let node = self.node(id)?;
        Ok(node
            .children
            .iter()
            .copied()
            .find(|child| self.get(*child).map_or(false, |c| c.name == name)))
    }

    /// Node whose folder is `path`, if the graph knows it
    pub fn find(&self, path: &Path) -> Option<NodeId> {
        let relative = path.strip_prefix(self.root_path()).ok()?;
        let mut current = self.root;
        for component in relative.components() {
            let Component::Normal(part) = component else {
                return None;
            };
            let name = naming::normalize(&part.to_string_lossy());
            current = self.child_named(current, &name).ok()??;
        }
        Some(current)
    }

    /// Node ids from the root down to `id`, inclusive
    pub fn ancestry(&self, id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        let mut path = vec![id];
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            path.push(parent);
            current = self.node(parent)?;
        }
        path.reverse();
        Ok(path)
    }

    /// Folder names from the root (empty) down to `id`
    pub fn name_chain(&self, id: NodeId) -> Result<Vec<String>, GraphError> {
        self.ancestry(id)?
            .into_iter()
            .map(|n| self.node(n).map(|node| node.name.clone()))
            .collect()
    }

    /// Folder a file dated `ts` belongs in.
    ///
    /// Descends through existing scheme folders. At the first missing level a
    /// single node is created when the current folder has been split; an
    /// unsplit leaf absorbs the file itself. Only the graph is touched, callers
    /// create the directory.
    pub fn locate(&mut self, ts: &Timestamp) -> Result<NodeId, GraphError> {
        let mut current = self.root;
        for depth in 1..=MAX_DEPTH {
            let name = naming::folder_name(ts, depth);
            match self.child_named(current, &name)? {
                Some(child) => current = child,
                None => {
                    if !self.node(current)?.leaf {
                        current = self.add_child(current, &name)?;
                    }
                    break;
                }
            }
        }
        Ok(current)
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, GraphError> {
        self.add_child_from_disk(parent, OsString::from(name))
    }

    pub(crate) fn add_child_from_disk(
        &mut self,
        parent: NodeId,
        file_name: OsString,
    ) -> Result<NodeId, GraphError> {
        let id = NodeId(self.nodes.len());
        let name = naming::normalize(&file_name.to_string_lossy());
        let child = Node::child_of(self.node(parent)?, id, name, file_name);
        self.nodes.push(Some(child));
        let parent = self.node_mut(parent)?;
        parent.children.push(id);
        parent.leaf = false;
        Ok(id)
    }

    /// Drop `id` and its subtree from the graph; the parent's leaf flag is left to the caller
    pub(crate) fn remove(&mut self, id: NodeId) -> Result<(), GraphError> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| GraphError::Desync("cannot remove the repository root".to_string()))?;
        self.node_mut(parent)?.children.retain(|c| *c != id);

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                pending.extend(node.children);
            }
            if self.error_node == Some(current) {
                self.error_node = None;
            }
        }
        Ok(())
    }

    /// Rename the folder of `id` on disk and re-derive the paths of its subtree
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<(), GraphError> {
        if self.is_error_node(id) {
            return Err(GraphError::Desync("the error folder is never renamed".to_string()));
        }
        let node = self.node(id)?;
        let parent = node
            .parent
            .ok_or_else(|| GraphError::Desync("cannot rename the repository root".to_string()))?;
        let from = node.path.clone();
        let to = self.node(parent)?.path.join(new_name);
        if to.exists() {
            return Err(GraphError::io(
                &to,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "target folder exists"),
            ));
        }
        fs::rename(&from, &to).map_err(|e| GraphError::io(&from, e))?;
        debug!(from = %from.display(), to = %to.display(), "Renamed folder");

        let node = self.node_mut(id)?;
        node.name = naming::normalize(new_name);
        node.file_name = OsString::from(new_name);
        self.refresh_paths(id)
    }

    fn refresh_paths(&mut self, id: NodeId) -> Result<(), GraphError> {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let node = self.node(current)?;
            let path = match node.parent {
                Some(parent) => self.node(parent)?.path.join(&node.file_name),
                None => node.path.clone(),
            };
            let node = self.node_mut(current)?;
            node.path = path;
            pending.extend(node.children.iter().copied());
        }
        Ok(())
    }

    /// Regular files directly inside the folder of `id`, sorted, excluding the marker
    pub fn direct_files(&self, id: NodeId) -> Result<Vec<PathBuf>, GraphError> {
        let path = &self.node(id)?.path;
        let entries = fs::read_dir(path).map_err(|e| GraphError::io(path, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GraphError::io(path, e))?;
            let file_type = entry.file_type().map_err(|e| GraphError::io(entry.path(), e))?;
            if file_type.is_dir() || entry.file_name() == MARKER_FILE_NAME {
                continue;
            }
            files.push(entry.path());
        }
        files.sort();
        Ok(files)
    }

    /// Sum of direct file counts over all folders, including the error folder
    pub fn total_files(&self) -> usize {
        self.iter().map(|n| n.file_count).sum()
    }

    /// Leaf folders outside the error folder, in path order
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves: Vec<&Node> = self
            .iter()
            .filter(|n| n.leaf && !self.is_error_node(n.id))
            .collect();
        leaves.sort_by(|a, b| a.path.cmp(&b.path));
        leaves.into_iter().map(|n| n.id).collect()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for node in self.iter() {
            if !node.is_root() {
                stats.folders += 1;
            }
            if node.leaf {
                stats.leaves += 1;
            }
            stats.files += node.file_count;
            stats.max_depth = stats.max_depth.max(node.depth);
        }
        stats.bytes = self.get(self.root).map_or(0, |n| n.subtree_size);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts(y: i32, mo: u32, d: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(12, 30, 15)
            .unwrap()
    }

    #[test]
    fn test_open_creates_error_folder() {
        let temp = TempDir::new().unwrap();
        let graph = FileGraph::open(temp.path()).unwrap();
        let error = graph.error_node().unwrap();
        assert!(graph.node(error).unwrap().path.is_dir());
        assert!(graph.node(error).unwrap().leaf);
        assert!(!graph.node(graph.root()).unwrap().leaf);
    }

    #[test]
    fn test_scan_has_no_side_effects() {
        let temp = TempDir::new().unwrap();
        let graph = FileGraph::scan(temp.path()).unwrap();
        assert!(graph.error_node().is_none());
        assert!(!temp.path().join(ERROR_FOLDER_NAME).exists());
    }

    #[test]
    fn test_locate_materializes_one_level() {
        let temp = TempDir::new().unwrap();
        let mut graph = FileGraph::open(temp.path()).unwrap();
        let id = graph.locate(&ts(2023, 3, 17)).unwrap();
        let node = graph.node(id).unwrap();
        assert_eq!(node.name, "2023");
        assert_eq!(node.depth, 1);
        assert!(node.leaf);
        // graph only, the folder is created on placement
        assert!(!node.path.exists());

        let again = graph.locate(&ts(2023, 11, 2)).unwrap();
        assert_eq!(again, id);
    }

    #[test]
    fn test_locate_descends_into_split_folders() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("2023").join("2023_märz")).unwrap();
        let mut graph = FileGraph::open(temp.path()).unwrap();

        let id = graph.locate(&ts(2023, 3, 17)).unwrap();
        assert_eq!(graph.node(id).unwrap().name, "2023_märz");

        let feb = graph.locate(&ts(2023, 2, 1)).unwrap();
        let node = graph.node(feb).unwrap();
        assert_eq!(node.name, "2023_feb");
        assert_eq!(node.depth, 2);
    }

    #[test]
    fn test_rename_cascades_paths() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("2011").join("2011_jan").join("2011_jan_5");
        fs::create_dir_all(&nested).unwrap();
        let mut graph = FileGraph::open(temp.path()).unwrap();
        let year = graph.find(&graph.root_path().join("2011")).unwrap();

        graph.rename(year, "2012").unwrap();

        let root = graph.root_path().to_path_buf();
        let month = graph.find(&root.join("2012").join("2011_jan")).unwrap();
        assert_eq!(
            graph.node(month).unwrap().path,
            root.join("2012").join("2011_jan")
        );
        let day = graph.children(month).unwrap()[0];
        assert_eq!(
            graph.node(day).unwrap().path,
            root.join("2012").join("2011_jan").join("2011_jan_5")
        );
        assert!(graph.node(day).unwrap().path.is_dir());
    }

    #[test]
    fn test_rename_refuses_existing_target() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("2010")).unwrap();
        fs::create_dir_all(temp.path().join("2011")).unwrap();
        let mut graph = FileGraph::open(temp.path()).unwrap();
        let id = graph.find(&graph.root_path().join("2011")).unwrap();
        assert!(graph.rename(id, "2010").is_err());
        assert!(temp.path().join("2011").is_dir());
    }

    #[test]
    fn test_error_folder_never_renamed() {
        let temp = TempDir::new().unwrap();
        let mut graph = FileGraph::open(temp.path()).unwrap();
        let error = graph.error_node().unwrap();
        assert!(graph.rename(error, "2010").unwrap_err().is_fatal());
    }

    #[test]
    fn test_direct_files_skip_marker_and_folders() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MARKER_FILE_NAME), "folderSize = 5\n").unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        let graph = FileGraph::open(temp.path()).unwrap();
        let files = graph.direct_files(graph.root()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_name_chain_starts_at_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("2020").join("2020_mai")).unwrap();
        let graph = FileGraph::open(temp.path()).unwrap();
        let id = graph
            .find(&graph.root_path().join("2020").join("2020_mai"))
            .unwrap();
        assert_eq!(graph.name_chain(id).unwrap(), vec!["", "2020", "2020_mai"]);
    }
}
