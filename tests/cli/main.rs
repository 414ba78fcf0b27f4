//! CLI integration tests for markmatch.
//!
//! These tests execute the compiled binary and verify stdin/stdout handling,
//! config discovery, exit codes and the printed JSON tree.

mod common;
mod parse;
