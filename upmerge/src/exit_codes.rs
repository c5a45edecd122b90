//! Stable exit codes for the `upmerge` binary.

/// Upgrade ran to completion, whether or not conflicts remain.
pub const OK: i32 = 0;
/// A fatal git failure, invalid config, or dirty worktree stopped the run.
pub const FATAL: i32 = 1;
/// Invalid command-line usage (reported by clap).
pub const USAGE: i32 = 2;
