//! Configuration sources above the defaults.

pub mod environment;
pub mod global_file;
