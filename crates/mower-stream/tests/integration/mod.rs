//! Integration tests for mower-stream.
//!
//! These tests run the SSE transport against a local HTTP server:
//! - Handshake success and refusal
//! - Message delivery through the subscription manager
//! - Remote close and local stop

pub mod common;
