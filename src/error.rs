//! Error types for the graph engine and the command layer.

use crate::types::NodeId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while the file graph and the filesystem are mutated together
#[derive(Debug, Error)]
pub enum GraphError {
    /// A single folder operation failed; callers log and continue
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving or copying one file failed; callers log and continue
    #[error("Failed to transfer {} to {}: {source}", from.display(), to.display())]
    Transfer {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The graph no longer mirrors the filesystem; the run must abort
    #[error("Graph out of sync with filesystem: {0}")]
    Desync(String),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
}

impl GraphError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is an invariant violation rather than a transient failure
    pub fn is_fatal(&self) -> bool {
        matches!(self, GraphError::Desync(_) | GraphError::UnknownNode(_))
    }
}

/// Errors surfaced by repository and CLI operations
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not a chronofold repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Invalid property: {0}")]
    InvalidProperty(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<toml::de::Error> for ApiError {
    fn from(err: toml::de::Error) -> Self {
        ApiError::ConfigError(format!("Failed to parse repository properties: {}", err))
    }
}

impl From<toml::ser::Error> for ApiError {
    fn from(err: toml::ser::Error) -> Self {
        ApiError::ConfigError(format!("Failed to write repository properties: {}", err))
    }
}
