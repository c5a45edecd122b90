//! Fetching upstream reference points and starting the merge.

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::io::git::{Git, OnFailure};
use crate::io::process::CommandRunner;

impl<R: CommandRunner> Git<R> {
    /// Refresh tags from `remote`, then fetch each reference explicitly.
    ///
    /// Both steps abort on failure; a bad remote or reference name is a user
    /// error and nothing has been touched yet.
    #[instrument(skip(self, references))]
    pub fn sync_references(&self, remote: &str, references: &[&str]) -> Result<()> {
        self.call(&["fetch", remote, "--tags"], OnFailure::Abort)?;
        for &reference in references {
            debug!(reference, "fetching reference");
            self.call(&["fetch", remote, reference], OnFailure::Abort)?;
        }
        info!(count = references.len(), "references fetched");
        Ok(())
    }

    /// Start a non-fast-forward merge of `reference` into the checkout.
    ///
    /// A merge stopped by conflicts is an expected outcome, so the exit status
    /// is only logged. Conflicts are discovered by the next inspection.
    #[instrument(skip(self))]
    pub fn merge_into(&self, reference: &str) -> Result<()> {
        let out = self.call(
            &["merge", "--no-ff", "--no-edit", reference],
            OnFailure::Tolerate,
        )?;
        if out.success() {
            info!("merge completed without conflicts");
        } else {
            info!(exit_code = ?out.code, "merge stopped, checking for conflicts");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::io::git::Git;
    use crate::test_support::{ScriptedResponse, ScriptedRunner};

    #[test]
    fn sync_fetches_tags_then_each_reference_in_order() {
        let runner = ScriptedRunner::new();
        let git = Git::with_runner("/repo", &runner);

        git.sync_references("upstream", &["v1", "v2"]).expect("sync");

        assert_eq!(
            runner.calls(),
            vec![
                vec!["fetch", "upstream", "--tags"],
                vec!["fetch", "upstream", "v1"],
                vec!["fetch", "upstream", "v2"],
            ]
        );
    }

    #[test]
    fn sync_stops_at_first_unknown_reference() {
        let runner = ScriptedRunner::new().respond(
            &["fetch", "upstream", "v1"],
            ScriptedResponse::fail(128, "fatal: couldn't find remote ref v1"),
        );
        let git = Git::with_runner("/repo", &runner);

        let err = git
            .sync_references("upstream", &["v1", "v2"])
            .expect_err("unknown ref");
        assert!(matches!(err, Error::CommandFailed { .. }));
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn conflicted_merge_is_not_an_error() {
        let runner = ScriptedRunner::new().respond(
            &["merge", "--no-ff", "--no-edit", "v2"],
            ScriptedResponse::fail(1, "Automatic merge failed; fix conflicts"),
        );
        let git = Git::with_runner("/repo", &runner);

        git.merge_into("v2").expect("merge tolerated");
    }
}
