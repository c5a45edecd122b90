//! Git adapter bound to one checked-out repository.
//!
//! Every version-control call made during an upgrade goes through
//! [`Git::call`], which fixes the working directory to the repository path and
//! applies the caller's [`OnFailure`] policy to the exit status. The query,
//! merge and resolve operations live in sibling modules as further `impl`
//! blocks on [`Git`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::io::process::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};

/// What to do when a git command exits non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Return [`Error::CommandFailed`]; the run cannot continue.
    Abort,
    /// Hand the captured output back to the caller.
    Tolerate,
}

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    /// Path for the changed file.
    pub path: String,
}

/// Handle for a repository checkout plus the backend that executes git.
#[derive(Debug, Clone)]
pub struct Git<R = SystemRunner> {
    workdir: PathBuf,
    binary: String,
    timeout: Option<Duration>,
    runner: R,
}

impl Git<SystemRunner> {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self::with_runner(workdir, SystemRunner)
    }
}

impl<R: CommandRunner> Git<R> {
    pub fn with_runner(workdir: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            workdir: workdir.into(),
            binary: "git".to_string(),
            timeout: None,
            runner,
        }
    }

    /// Use a different git executable (path or name on `PATH`).
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Kill any single git command running longer than `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run `git <args>` in the repository and capture its output.
    pub fn call(&self, args: &[&str], on_failure: OnFailure) -> Result<CommandOutput> {
        let spec = CommandSpec {
            program: self.binary.clone(),
            args: args.iter().map(|a| a.to_string()).collect(),
            workdir: self.workdir.clone(),
            timeout: self.timeout,
        };
        let output = self.runner.run(&spec)?;
        if output.success() {
            return Ok(output);
        }
        match on_failure {
            OnFailure::Abort => Err(Error::CommandFailed {
                code: output.code,
                command: spec.command_line(),
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            OnFailure::Tolerate => {
                debug!(
                    command = %spec.command_line(),
                    exit_code = ?output.code,
                    "tolerated non-zero exit"
                );
                Ok(output)
            }
        }
    }

    /// Get status entries (including untracked) in porcelain format.
    pub fn status_porcelain(&self) -> Result<Vec<StatusEntry>> {
        let out = self.call(&["status", "--porcelain=v1", "-uall"], OnFailure::Abort)?;
        Ok(out
            .stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(parse_status_line)
            .collect())
    }

    /// Ensure the worktree has no staged, unstaged or untracked changes.
    #[instrument(skip_all)]
    pub fn ensure_clean(&self) -> Result<()> {
        let entries = self.status_porcelain()?;
        if entries.is_empty() {
            debug!("worktree is clean");
            return Ok(());
        }
        warn!(dirty_count = entries.len(), "worktree not clean");
        let entries = entries
            .iter()
            .map(|entry| format!("{} {}", entry.code, entry.path))
            .collect::<Vec<_>>()
            .join("\n");
        Err(Error::DirtyWorktree { entries })
    }
}

fn parse_status_line(line: &str) -> Option<StatusEntry> {
    if let Some(path) = line.strip_prefix("?? ") {
        return Some(StatusEntry {
            code: "??".to_string(),
            path: path.trim().to_string(),
        });
    }
    let code = line.get(..2)?;
    let rest = line.get(3..)?.trim();
    if rest.is_empty() {
        return None;
    }
    let path = match rest.split_once(" -> ") {
        Some((_, new)) => new.trim(),
        None => rest,
    };
    Some(StatusEntry {
        code: code.to_string(),
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedRunner, ScriptedResponse};

    #[test]
    fn parses_untracked_line() {
        let e = parse_status_line("?? foo.txt").expect("parse");
        assert_eq!(
            e,
            StatusEntry {
                code: "??".to_string(),
                path: "foo.txt".to_string()
            }
        );
    }

    #[test]
    fn parses_unmerged_line() {
        let e = parse_status_line("UU lib/core.php").expect("parse");
        assert_eq!(e.code, "UU");
        assert_eq!(e.path, "lib/core.php");
    }

    #[test]
    fn parses_rename_line_uses_new_path() {
        let e = parse_status_line("R  old.txt -> new.txt").expect("parse");
        assert_eq!(e.path, "new.txt");
    }

    #[test]
    fn short_line_is_skipped() {
        assert_eq!(parse_status_line("M"), None);
    }

    #[test]
    fn abort_policy_turns_non_zero_exit_into_error() {
        let runner = ScriptedRunner::new().respond(
            &["fetch", "upstream", "--tags"],
            ScriptedResponse::fail(128, "fatal: 'upstream' does not appear to be a git repository"),
        );
        let git = Git::with_runner("/repo", &runner);

        let err = git
            .call(&["fetch", "upstream", "--tags"], OnFailure::Abort)
            .expect_err("fetch should abort");
        match err {
            Error::CommandFailed {
                code,
                command,
                stderr,
                ..
            } => {
                assert_eq!(code, Some(128));
                assert_eq!(command, "git fetch upstream --tags");
                assert!(stderr.contains("does not appear"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn tolerate_policy_returns_output() {
        let runner = ScriptedRunner::new().respond(
            &["merge", "--no-ff", "--no-edit", "v2"],
            ScriptedResponse::fail(1, "CONFLICT (content): Merge conflict in a.txt"),
        );
        let git = Git::with_runner("/repo", &runner);

        let out = git
            .call(&["merge", "--no-ff", "--no-edit", "v2"], OnFailure::Tolerate)
            .expect("tolerated");
        assert_eq!(out.code, Some(1));
    }

    #[test]
    fn call_uses_configured_binary_workdir_and_timeout() {
        let runner = ScriptedRunner::new();
        let git = Git::with_runner("/srv/fork", &runner)
            .binary("/usr/local/bin/git")
            .timeout(Some(Duration::from_secs(5)));

        git.call(&["status"], OnFailure::Abort).expect("status");

        let specs = runner.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].program, "/usr/local/bin/git");
        assert_eq!(specs[0].workdir, PathBuf::from("/srv/fork"));
        assert_eq!(specs[0].timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn timeout_is_fatal_even_when_tolerated() {
        let git = Git::new(std::env::temp_dir())
            .binary("sh")
            .timeout(Some(Duration::from_secs(1)));

        let err = git
            .call(&["-c", "exec sleep 5"], OnFailure::Tolerate)
            .expect_err("timeout is never tolerated");
        assert!(matches!(err, Error::TimedOut { .. }));
    }

    #[test]
    fn ensure_clean_lists_dirty_entries() {
        let runner = ScriptedRunner::new().respond(
            &["status", "--porcelain=v1", "-uall"],
            ScriptedResponse::ok(" M config.php\n?? notes.txt\n"),
        );
        let git = Git::with_runner("/repo", &runner);

        let err = git.ensure_clean().expect_err("dirty");
        let msg = err.to_string();
        assert!(msg.contains(" M config.php"));
        assert!(msg.contains("?? notes.txt"));
    }

    #[test]
    fn ensure_clean_accepts_empty_status() {
        let runner = ScriptedRunner::new();
        let git = Git::with_runner("/repo", &runner);
        git.ensure_clean().expect("clean");
    }
}
