//! chronofold: time-partitioned file organizer
//!
//! Files are placed into nested date folders (`2023/2023_märz/2023_märz_17`).
//! A folder holding more files than the repository threshold is split one
//! level finer; sparse subtrees are collapsed again. A checker and fixer keep
//! a repository consistent after manual edits.

pub mod config;
pub mod consistency;
pub mod date;
pub mod error;
pub mod logging;
pub mod naming;
pub mod organize;
pub mod report;
pub mod repository;
pub mod tooling;
pub mod transfer;
pub mod tree;
pub mod types;

pub use consistency::{CheckReport, Checker, Fixer, Violation};
pub use date::{DateSource, FileDateExtractor};
pub use error::{ApiError, GraphError};
pub use organize::{OrganizeOptions, Organizer, ReorganizePolicy};
pub use repository::Repository;
pub use transfer::TransferMode;
pub use tree::FileGraph;
pub use types::{NodeId, Timestamp};
