//! Integration tests for mower-command.
//!
//! These tests post commands to a local control endpoint and check how each
//! response shape maps to an outcome.

pub mod common;
