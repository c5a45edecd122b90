//! Read-only queries against the repository state.

use tracing::{debug, instrument};

use crate::core::paths::{PathSet, parse_name_list};
use crate::error::Result;
use crate::io::git::{Git, OnFailure};
use crate::io::process::CommandRunner;

impl<R: CommandRunner> Git<R> {
    /// Paths that differ between the current checkout and `reference`.
    ///
    /// An unknown reference aborts: it can only mean a bad argument.
    #[instrument(skip(self))]
    pub fn modified_since(&self, reference: &str) -> Result<PathSet> {
        let out = self.call(&["diff", reference, "--name-only", "-z"], OnFailure::Abort)?;
        let modified = parse_name_list(&out.stdout);
        debug!(count = modified.len(), "modified paths");
        Ok(modified)
    }

    /// Paths currently marked unmerged.
    #[instrument(skip(self))]
    pub fn currently_conflicted(&self) -> Result<PathSet> {
        let out = self.call(
            &["diff", "--name-only", "-z", "--diff-filter=U"],
            OnFailure::Abort,
        )?;
        let conflicted = parse_name_list(&out.stdout);
        debug!(count = conflicted.len(), "conflicted paths");
        Ok(conflicted)
    }
}
