//! Reorganize: split an overflowing folder one level finer

use super::{Organizer, PlaceOutcome};
use crate::error::GraphError;
use crate::transfer::TransferMode;
use crate::types::{NodeId, MAX_DEPTH};
use tracing::{debug, warn};

impl Organizer<'_> {
    /// Split `id` when it holds more than `threshold` files.
    ///
    /// The folder stops being a leaf, so re-placing its files lands each of
    /// them one level deeper. New children are split again if they overflow.
    /// The error folder and the finest (seconds) folders are never split.
    pub fn reorganize(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.graph.node(id)?;
        if self.graph.is_error_node(id)
            || node.depth >= MAX_DEPTH
            || node.file_count <= self.threshold
        {
            return Ok(());
        }
        debug!(
            path = %node.path.display(),
            files = node.file_count,
            threshold = self.threshold,
            "Splitting folder"
        );

        let files = match self.graph.direct_files(id) {
            Ok(files) => files,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Cannot list folder, leaving it unsplit");
                return Ok(());
            }
        };
        self.graph.node_mut(id)?.leaf = false;

        let mut remaining = 0;
        for file in files {
            match self.place(TransferMode::MoveReplace, &file) {
                Ok(PlaceOutcome::Placed { .. }) => {}
                Ok(PlaceOutcome::Skipped(_)) => remaining += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "Failed to move file while splitting");
                    remaining += 1;
                }
            }
        }
        self.graph.node_mut(id)?.file_count = remaining;

        for child in self.graph.children(id)? {
            self.reorganize(child)?;
        }
        Ok(())
    }
}
