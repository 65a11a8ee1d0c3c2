//! Placement of a single file

use super::Organizer;
use crate::error::GraphError;
use crate::transfer::{resolve_file_name, TransferMode};
use crate::types::{NodeId, MARKER_FILE_NAME};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Result of placing one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// The file now lives in `node`; `replaced` when an identical file was overwritten
    Placed { node: NodeId, replaced: bool },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MarkerFile,
    /// The file already sits at its target path
    SameLocation,
    /// A preserving transfer met an existing target
    TargetExists,
}

impl PlaceOutcome {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            PlaceOutcome::Placed { node, .. } => Some(*node),
            PlaceOutcome::Skipped(_) => None,
        }
    }
}

impl Organizer<'_> {
    /// Transfer `file` into the folder its date belongs to.
    ///
    /// Files with an unknown date go to the error folder. On a failed transfer
    /// the target's count is untouched and a folder created for this file alone
    /// is removed again.
    pub fn place(&mut self, mode: TransferMode, file: &Path) -> Result<PlaceOutcome, GraphError> {
        let name = match file.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                return Err(GraphError::io(
                    file,
                    std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
                ))
            }
        };
        if name == MARKER_FILE_NAME {
            return Ok(PlaceOutcome::Skipped(SkipReason::MarkerFile));
        }

        let date = self.dates.date_of(file);
        let target = match &date {
            Some(ts) => self.graph.locate(ts)?,
            None => self.graph.ensure_error_node()?,
        };
        let dir = self.graph.node(target)?.path.clone();
        let fresh = !dir.exists();
        if fresh {
            fs::create_dir_all(&dir).map_err(|e| GraphError::io(&dir, e))?;
            debug!(path = %dir.display(), "Created folder");
        }

        let to = dir.join(resolve_file_name(&dir, &name, date.as_ref(), self.dates));
        if to == file {
            return Ok(PlaceOutcome::Skipped(SkipReason::SameLocation));
        }
        let existed = fs::symlink_metadata(&to).is_ok();
        if let Err(source) = mode.execute(file, &to) {
            if fresh {
                self.discard_fresh(target);
            }
            if source.kind() == ErrorKind::AlreadyExists && !mode.replaces() {
                return Ok(PlaceOutcome::Skipped(SkipReason::TargetExists));
            }
            return Err(GraphError::Transfer {
                from: file.to_path_buf(),
                to,
                source,
            });
        }

        self.stamp(&to, date.as_ref());
        if !existed {
            self.graph.node_mut(target)?.file_count += 1;
        }
        Ok(PlaceOutcome::Placed {
            node: target,
            replaced: existed,
        })
    }

    fn discard_fresh(&mut self, target: NodeId) {
        if self.graph.is_error_node(target) {
            return;
        }
        let Ok(node) = self.graph.node(target) else {
            return;
        };
        if node.file_count == 0 && node.children.is_empty() && fs::remove_dir(&node.path).is_ok() {
            let _ = self.graph.remove(target);
        }
    }
}
