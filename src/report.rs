//! Command output: serializable result types and their text rendering.

pub mod format;
pub mod types;

pub use types::{
    CheckOutput, MarkOutput, OrganizeOutput, RenameEntry, RepairOutput, StatusOutput,
    ViolationEntry,
};
