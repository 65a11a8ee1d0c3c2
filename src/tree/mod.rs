//! In-memory model of the repository folder tree
//!
//! The graph is an arena of folder nodes addressed by stable `NodeId`s. Parents
//! hold child ids; every node keeps its on-disk name and an absolute path that
//! is re-derived for the whole subtree after a rename.

pub mod cache;
pub mod graph;
pub mod node;
mod scan;

pub use cache::GraphCache;
pub use graph::{FileGraph, GraphStats};
pub use node::Node;
