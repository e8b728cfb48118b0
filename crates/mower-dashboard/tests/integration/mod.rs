//! Integration tests for mower-dashboard.
//!
//! These tests run a full dashboard session against a local backend:
//! - Stream lifecycle notifications and snapshot updates
//! - Command outcomes and their notifications
//! - Detach releasing every stream

pub mod common;
