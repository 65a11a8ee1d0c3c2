//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::ChronofoldConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    pub fn load() -> Result<ChronofoldConfig, ConfigError> {
        MergeService::load()
    }

    /// Load configuration from a specific file instead of the global one.
    pub fn load_from_file(path: &Path) -> Result<ChronofoldConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    /// Load from `path` when given, otherwise from the standard sources.
    pub fn load_with_override(path: Option<&Path>) -> Result<ChronofoldConfig, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }
}
