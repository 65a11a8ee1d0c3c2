//! Tooling & Integration Layer
//!
//! Command line interface and terminal progress output.

pub mod cli;
pub mod progress;

pub use cli::{Cli, CliContext, Commands};
