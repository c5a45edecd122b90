//! Deterministic, pure logic for an upgrade run.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! path sets and return deterministic outputs suitable for tests.

pub mod classifier;
pub mod paths;
pub mod report;
