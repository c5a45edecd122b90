//! Test-only helpers: a scripted git backend and real on-disk fixtures.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::TempDir;

use crate::core::paths::{PathSet, parse_name_list};
use crate::error::Result as GitResult;
use crate::io::process::{CommandOutput, CommandRunner, CommandSpec};

/// Build a [`PathSet`] from string literals.
pub fn path_set(paths: &[&str]) -> PathSet {
    paths.iter().map(|p| p.to_string()).collect()
}

/// Canned result for one scripted invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedResponse {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptedResponse {
    pub fn ok(stdout: &str) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Fake backend that replays scripted responses keyed by argument list.
///
/// Responses registered for the same arguments are returned in order; the
/// last one repeats once the queue is drained. Unscripted invocations succeed
/// with empty output. Every invocation is recorded.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: RefCell<HashMap<Vec<String>, VecDeque<ScriptedResponse>>>,
    specs: RefCell<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `response` for the next invocation with exactly `args`.
    pub fn respond(self, args: &[&str], response: ScriptedResponse) -> Self {
        let key = args.iter().map(|a| a.to_string()).collect();
        self.responses
            .borrow_mut()
            .entry(key)
            .or_default()
            .push_back(response);
        self
    }

    /// Argument lists of every invocation, oldest first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.specs
            .borrow()
            .iter()
            .map(|spec| spec.args.clone())
            .collect()
    }

    /// Full specs of every invocation, oldest first.
    pub fn specs(&self) -> Vec<CommandSpec> {
        self.specs.borrow().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> GitResult<CommandOutput> {
        self.specs.borrow_mut().push(spec.clone());
        let mut responses = self.responses.borrow_mut();
        let response = match responses.get_mut(&spec.args) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
        .unwrap_or_else(|| ScriptedResponse::ok(""));
        Ok(CommandOutput {
            code: response.code,
            stdout: response.stdout,
            stderr: response.stderr,
        })
    }
}

/// Run git in `dir`, failing on non-zero exit. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !out.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn init_repo(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    git(dir, &["init", "--quiet"])?;
    git(dir, &["config", "user.email", "test@example.com"])?;
    git(dir, &["config", "user.name", "test"])?;
    git(dir, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

fn write_and_commit(dir: &Path, files: &[(&str, &str)], message: &str) -> Result<()> {
    for &(name, contents) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        git(dir, &["add", "--", name])?;
    }
    git(dir, &["commit", "--quiet", "-m", message])?;
    Ok(())
}

/// An upstream repository with tagged releases and a fork checked out at `v1`
/// with `upstream` configured as a remote.
pub struct ForkFixture {
    _temp: TempDir,
    upstream: PathBuf,
    fork: PathBuf,
}

impl ForkFixture {
    /// Upstream cut `v1` and `v2` from separate release branches off a common
    /// base, both touching `a.txt` and `b.txt`. The fork changed `b.txt`.
    ///
    /// Merging `v2` conflicts in `a.txt` (safe) and `b.txt` (fork-modified).
    pub fn diverged_releases() -> Result<Self> {
        let fixture = Self::empty()?;
        let up = &fixture.upstream;
        init_repo(up)?;
        write_and_commit(
            up,
            &[
                ("a.txt", "base a\n"),
                ("b.txt", "base b\n"),
                ("c.txt", "base c\n"),
            ],
            "base",
        )?;
        git(up, &["checkout", "--quiet", "-b", "release-1"])?;
        write_and_commit(up, &[("a.txt", "r1 a\n"), ("b.txt", "r1 b\n")], "release 1")?;
        git(up, &["tag", "v1"])?;
        git(up, &["checkout", "--quiet", "-b", "release-2", "HEAD~1"])?;
        write_and_commit(up, &[("a.txt", "r2 a\n"), ("b.txt", "r2 b\n")], "release 2")?;
        git(up, &["tag", "v2"])?;

        fixture.checkout_fork_at_v1()?;
        write_and_commit(&fixture.fork, &[("b.txt", "fork b\n")], "fork: customise b")?;
        Ok(fixture)
    }

    /// Like [`ForkFixture::diverged_releases`] but with a single conflicting
    /// file named `name`, which the fork never touches.
    pub fn untouched_conflict(name: &str) -> Result<Self> {
        let fixture = Self::empty()?;
        let up = &fixture.upstream;
        init_repo(up)?;
        write_and_commit(up, &[(name, "base\n")], "base")?;
        git(up, &["checkout", "--quiet", "-b", "release-1"])?;
        write_and_commit(up, &[(name, "r1\n")], "release 1")?;
        git(up, &["tag", "v1"])?;
        git(up, &["checkout", "--quiet", "-b", "release-2", "HEAD~1"])?;
        write_and_commit(up, &[(name, "r2\n")], "release 2")?;
        git(up, &["tag", "v2"])?;

        fixture.checkout_fork_at_v1()?;
        write_and_commit(&fixture.fork, &[("local.txt", "fork only\n")], "fork: add local")?;
        Ok(fixture)
    }

    /// Upstream `v2` is a direct descendant of `v1`; the fork only added its
    /// own file. Merging `v2` is clean.
    pub fn linear_releases() -> Result<Self> {
        let fixture = Self::empty()?;
        let up = &fixture.upstream;
        init_repo(up)?;
        write_and_commit(up, &[("a.txt", "v1 a\n"), ("b.txt", "v1 b\n")], "release 1")?;
        git(up, &["tag", "v1"])?;
        write_and_commit(up, &[("a.txt", "v2 a\n")], "release 2")?;
        git(up, &["tag", "v2"])?;

        fixture.checkout_fork_at_v1()?;
        write_and_commit(&fixture.fork, &[("local.txt", "fork only\n")], "fork: add local")?;
        Ok(fixture)
    }

    fn empty() -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let upstream = temp.path().join("upstream");
        let fork = temp.path().join("fork");
        Ok(Self {
            _temp: temp,
            upstream,
            fork,
        })
    }

    fn checkout_fork_at_v1(&self) -> Result<()> {
        init_repo(&self.fork)?;
        let url = self
            .upstream
            .to_str()
            .context("upstream path is not utf-8")?;
        git(&self.fork, &["remote", "add", "upstream", url])?;
        git(&self.fork, &["fetch", "--quiet", "upstream", "--tags"])?;
        git(&self.fork, &["checkout", "--quiet", "-b", "fork", "v1"])?;
        Ok(())
    }

    pub fn fork(&self) -> &Path {
        &self.fork
    }

    pub fn upstream(&self) -> &Path {
        &self.upstream
    }

    /// Contents of a file in the fork's working tree.
    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.fork.join(name);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    /// Whether git considers a merge to be in progress in the fork.
    pub fn merge_in_progress(&self) -> bool {
        self.fork.join(".git").join("MERGE_HEAD").exists()
    }

    /// Paths git reports as unmerged in the fork.
    pub fn unmerged(&self) -> Result<PathSet> {
        let out = git(&self.fork, &["diff", "--name-only", "-z", "--diff-filter=U"])?;
        Ok(parse_name_list(&out))
    }
}
