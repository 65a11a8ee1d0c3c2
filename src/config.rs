//! User configuration
//!
//! Layered with the `config` crate: built-in defaults, the global file under
//! `$XDG_CONFIG_HOME/chronofold/`, then `CHRONOFOLD__SECTION__KEY` variables.
//! Per-repository settings live in the repository marker instead.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::organize::ReorganizePolicy;
use serde::{Deserialize, Serialize};

/// Process-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronofoldConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub organize: OrganizeConfig,
}

/// Defaults for organize runs; CLI flags override them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    /// Re-read dates of files that already carry the processed marker
    pub ignore_mark: bool,

    pub reorganize: ReorganizePolicy,

    /// Lowercase extensions to accept; empty accepts every file
    pub extensions: Vec<String>,
}
