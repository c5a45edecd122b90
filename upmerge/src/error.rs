//! Typed failures raised by the git-facing layer.
//!
//! Every variant is fatal for an upgrade run. Outcomes that are expected to
//! fail under normal use (a conflicted merge, a checkout of a path deleted on
//! one side) are never turned into an [`Error`]; callers inspect the exit code
//! of a tolerated command instead.

use std::time::Duration;

use thiserror::Error;

/// Fatal failure of an external command or of a precondition check.
#[derive(Debug, Error)]
pub enum Error {
    /// The program could not be started at all (missing binary, bad workdir).
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program started but waiting on it or draining its pipes failed.
    #[error("failed to collect output of `{command}`: {message}")]
    Wait { command: String, message: String },

    /// The program exceeded the configured per-command timeout and was killed.
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },

    /// A command that must succeed exited non-zero.
    #[error(
        "SUBPROCESS EXITED WITH CODE {}\n{command}\n{stdout}\n{stderr}",
        code.map_or_else(|| "<signal>".to_string(), |c| c.to_string())
    )]
    CommandFailed {
        code: Option<i32>,
        command: String,
        stdout: String,
        stderr: String,
    },

    /// The worktree has local changes and a clean head was required.
    #[error("working tree not clean:\n{entries}")]
    DirtyWorktree { entries: String },
}

/// Shorthand used across the library.
pub type Result<T> = std::result::Result<T, Error>;
