//! Core types for the chronofold repository model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// NodeId: stable index of a folder node inside a `FileGraph` arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Timestamp: local wall-clock date and time of a file
pub type Timestamp = chrono::NaiveDateTime;

/// Finest folder depth (seconds granularity)
pub const MAX_DEPTH: usize = 6;

/// Folder holding files whose date could not be determined
pub const ERROR_FOLDER_NAME: &str = "error";

/// Hidden repository marker holding the repository properties
pub const MARKER_FILE_NAME: &str = ".chronofold.toml";

/// Default folder size threshold for new repositories
pub const DEFAULT_FOLDER_SIZE: usize = 1000;
