//! Child process execution behind the [`CommandRunner`] seam.
//!
//! [`SystemRunner`] spawns real processes. Tests swap in a scripted runner so
//! the git layer can be driven without a repository on disk.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::error::{Error, Result};

/// A fully described command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; never inherited from the process cwd.
    pub workdir: PathBuf,
    /// Kill the child after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// Command line as a single space-joined string, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured output of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Abstraction over process execution backends.
pub trait CommandRunner {
    /// Run `spec` to completion. A non-zero exit is not an error here; only a
    /// failure to spawn, wait or collect output is.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        (**self).run(spec)
    }
}

/// Runner that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(command = %spec.command_line()))]
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let command = spec.command_line();
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("spawning child process");
        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(source) => {
                error!(err = %source, "failed to spawn command");
                return Err(Error::Spawn { command, source });
            }
        };

        let stdout = child.stdout.take().ok_or_else(|| Error::Wait {
            command: command.clone(),
            message: "stdout was not piped".to_string(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| Error::Wait {
            command: command.clone(),
            message: "stderr was not piped".to_string(),
        })?;

        // Both pipes are drained while the child runs so a chatty command
        // cannot block on a full pipe buffer.
        let stdout_handle = thread::spawn(move || read_stream(stdout));
        let stderr_handle = thread::spawn(move || read_stream(stderr));

        let wait_err = |e: std::io::Error| Error::Wait {
            command: command.clone(),
            message: e.to_string(),
        };
        let status = match spec.timeout {
            None => child.wait().map_err(wait_err)?,
            Some(timeout) => match child.wait_timeout(timeout).map_err(wait_err)? {
                Some(status) => status,
                None => {
                    warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
                    child.kill().map_err(wait_err)?;
                    child.wait().map_err(wait_err)?;
                    return Err(Error::TimedOut { command, timeout });
                }
            },
        };

        let stdout = join_output(stdout_handle, &command)?;
        let stderr = join_output(stderr_handle, &command)?;

        debug!(exit_code = ?status.code(), "command finished");
        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn join_output(
    handle: thread::JoinHandle<std::io::Result<String>>,
    command: &str,
) -> Result<String> {
    match handle.join() {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(Error::Wait {
            command: command.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Err(Error::Wait {
            command: command.to_string(),
            message: "output reader thread panicked".to_string(),
        }),
    }
}

fn read_stream<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(program: &str, args: &[&str]) -> CommandSpec {
        CommandSpec {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            workdir: std::env::temp_dir(),
            timeout: None,
        }
    }

    #[test]
    fn command_line_joins_program_and_args() {
        let s = spec("git", &["diff", "--name-only", "--diff-filter=U"]);
        assert_eq!(s.command_line(), "git diff --name-only --diff-filter=U");
    }

    #[test]
    fn captures_stdout_and_exit_code() {
        let out = SystemRunner
            .run(&spec("git", &["--version"]))
            .expect("run git --version");
        assert!(out.success());
        assert!(out.stdout.starts_with("git version"));
    }

    #[test]
    fn non_zero_exit_is_not_an_error() {
        let out = SystemRunner
            .run(&spec("git", &["definitely-not-a-subcommand"]))
            .expect("run");
        assert!(!out.success());
        assert!(!out.stderr.is_empty());
    }

    #[test]
    fn slow_command_is_killed_after_timeout() {
        let mut s = spec("sh", &["-c", "exec sleep 5"]);
        s.timeout = Some(Duration::from_secs(1));

        let started = std::time::Instant::now();
        let err = SystemRunner.run(&s).expect_err("should time out");

        assert!(started.elapsed() < Duration::from_secs(4));
        match err {
            Error::TimedOut { command, timeout } => {
                assert_eq!(command, "sh -c exec sleep 5");
                assert_eq!(timeout, Duration::from_secs(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fast_command_finishes_within_timeout() {
        let mut s = spec("git", &["--version"]);
        s.timeout = Some(Duration::from_secs(30));

        let out = SystemRunner.run(&s).expect("run");
        assert!(out.success());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = SystemRunner
            .run(&spec("upmerge-no-such-binary", &[]))
            .expect_err("spawn should fail");
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
