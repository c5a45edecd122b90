//! Orchestration for one upgrade run.
//!
//! An upgrade fetches the `from` and `to` reference points, records which
//! paths the fork changed since `from`, merges `to`, and accepts upstream's
//! version of every conflicted path the fork never touched. The run moves
//! through [`Stage`]s strictly in order; any fatal error aborts it where it
//! stands and leaves the working tree as git left it.

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::core::classifier::classify_safe;
use crate::core::paths::PathSet;
use crate::core::report::{Summary, summarize};
use crate::error::Result;
use crate::io::git::Git;
use crate::io::process::CommandRunner;

/// Pipeline position of an upgrade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Fetched,
    MergeAttempted,
    Classified,
    Resolved,
    Reported,
}

/// The three positional inputs of an upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeRequest {
    /// Remote holding the upstream reference points.
    pub remote: String,
    /// Upstream reference the fork is currently based on.
    pub from: String,
    /// Upstream reference to upgrade to.
    pub to: String,
}

/// Run-time switches that do not change what gets merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Refuse to start on a dirty worktree.
    pub require_clean: bool,
}

/// Everything an upgrade run learned, in the order it learned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeReport {
    #[serde(flatten)]
    pub request: UpgradeRequest,
    /// Paths the fork changed relative to `from`.
    pub modified: PathSet,
    /// Paths conflicted right after the merge.
    pub conflicted: PathSet,
    /// Conflicted paths the fork never changed.
    pub safe: PathSet,
    /// Safe paths whose incoming version was checked out and staged.
    pub accepted: PathSet,
    /// Safe paths that could not be resolved automatically.
    pub failed: PathSet,
    /// Paths still conflicted after resolution.
    pub remaining: PathSet,
}

impl UpgradeReport {
    /// Guidance based on the post-resolution conflict count.
    pub fn summary(&self) -> Summary {
        Summary::from_remaining(self.remaining.len())
    }

    /// Remaining count implied by classification alone, before the recount.
    pub fn expected_remaining(&self) -> usize {
        summarize(self.conflicted.len(), self.safe.len()).remaining
    }
}

/// Run an upgrade against the repository behind `git`.
///
/// On a fatal error the last stage reached is logged before the error is
/// returned.
#[instrument(skip_all, fields(remote = %request.remote, from = %request.from, to = %request.to))]
pub fn run_upgrade<R: CommandRunner>(
    git: &Git<R>,
    request: &UpgradeRequest,
    options: UpgradeOptions,
) -> Result<UpgradeReport> {
    let mut stage = Stage::Start;
    debug!(?stage, workdir = %git.workdir().display(), "starting upgrade");
    let result = run_stages(git, request, options, &mut stage);
    if result.is_err() {
        error!(?stage, "upgrade aborted");
    }
    result
}

fn run_stages<R: CommandRunner>(
    git: &Git<R>,
    request: &UpgradeRequest,
    options: UpgradeOptions,
    stage: &mut Stage,
) -> Result<UpgradeReport> {
    if options.require_clean {
        git.ensure_clean()?;
    }

    git.sync_references(&request.remote, &[request.from.as_str(), request.to.as_str()])?;
    advance(stage, Stage::Fetched);

    let modified = git.modified_since(&request.from)?;
    info!(count = modified.len(), from = %request.from, "fork changes since baseline");

    git.merge_into(&request.to)?;
    advance(stage, Stage::MergeAttempted);

    let conflicted = git.currently_conflicted()?;
    let safe = classify_safe(&conflicted, &modified);
    info!(
        conflicted = conflicted.len(),
        safe = safe.len(),
        "conflicts classified"
    );
    advance(stage, Stage::Classified);

    let outcome = git.accept_incoming(&safe)?;
    advance(stage, Stage::Resolved);

    // Re-query instead of trusting `conflicted - safe`: a safe path whose
    // checkout failed is still conflicted.
    let remaining = git.currently_conflicted()?;
    let expected: PathSet = conflicted.difference(&outcome.accepted).cloned().collect();
    if remaining != expected {
        warn!(
            expected = expected.len(),
            actual = remaining.len(),
            "conflicts after resolution differ from classification"
        );
    }
    advance(stage, Stage::Reported);

    Ok(UpgradeReport {
        request: request.clone(),
        modified,
        conflicted,
        safe,
        accepted: outcome.accepted,
        failed: outcome.failed,
        remaining,
    })
}

fn advance(stage: &mut Stage, to: Stage) {
    debug!(from = ?*stage, ?to, "stage transition");
    *stage = to;
}
