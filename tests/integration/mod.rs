//! Integration tests for the chronofold organizer

mod cli;
mod consistency;
mod organize;
mod support;
