//! Integration tests for the chronofold organizer

mod integration;
