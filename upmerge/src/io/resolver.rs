//! Accepting the incoming version of conflicted paths.

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::paths::PathSet;
use crate::error::Result;
use crate::io::git::{Git, OnFailure};
use crate::io::process::CommandRunner;

/// Partition of the requested paths by whether resolution succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AcceptOutcome {
    /// Checked out from the merge source and staged.
    pub accepted: PathSet,
    /// Checkout or staging exited non-zero; the path may still be conflicted.
    pub failed: PathSet,
}

impl<R: CommandRunner> Git<R> {
    /// Take "theirs" for every path and stage it.
    ///
    /// Paths are handled independently. A path deleted on one side makes
    /// `checkout --theirs` fail, which is recorded and skipped rather than
    /// aborting the remaining paths.
    #[instrument(skip_all, fields(count = paths.len()))]
    pub fn accept_incoming(&self, paths: &PathSet) -> Result<AcceptOutcome> {
        let mut outcome = AcceptOutcome::default();
        for path in paths {
            let checkout = self.call(
                &["checkout", "--theirs", "--", path.as_str()],
                OnFailure::Tolerate,
            )?;
            let add = self.call(&["add", "--", path.as_str()], OnFailure::Tolerate)?;
            if checkout.success() && add.success() {
                debug!(path = %path, "accepted incoming version");
                outcome.accepted.insert(path.clone());
            } else {
                warn!(
                    path = %path,
                    checkout_exit = ?checkout.code,
                    add_exit = ?add.code,
                    stderr = %checkout.stderr.trim(),
                    "could not accept incoming version"
                );
                outcome.failed.insert(path.clone());
            }
        }
        info!(
            accepted = outcome.accepted.len(),
            failed = outcome.failed.len(),
            "safe conflicts resolved"
        );
        Ok(outcome)
    }
}
