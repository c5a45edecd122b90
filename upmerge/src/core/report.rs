//! Final summary and next-step guidance shown after an upgrade.

use std::fmt;

/// Hint appended to every summary.
pub const ABORT_HINT: &str = "Or use 'git merge --abort' to pretend this never happened";

/// What the user should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Conflicts remain; finish them with a merge tool.
    ResolveManually,
    /// Nothing left to resolve; the merge can be committed.
    Commit,
}

impl NextStep {
    pub fn message(self) -> &'static str {
        match self {
            Self::ResolveManually => "Use 'git mergetool' to resolve, then 'git commit'",
            Self::Commit => "Safe to 'git commit'",
        }
    }
}

/// Remaining-conflict count plus the guidance derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub remaining: usize,
}

impl Summary {
    pub fn from_remaining(remaining: usize) -> Self {
        Self { remaining }
    }

    pub fn next_step(&self) -> NextStep {
        if self.remaining > 0 {
            NextStep::ResolveManually
        } else {
            NextStep::Commit
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Completed with {} conflicts", self.remaining)?;
        writeln!(f, "{}", self.next_step().message())?;
        write!(f, "{ABORT_HINT}")
    }
}

/// Summary for `conflicted_count` conflicts of which `safe_count` were
/// auto-resolved.
pub fn summarize(conflicted_count: usize, safe_count: usize) -> Summary {
    Summary::from_remaining(conflicted_count.saturating_sub(safe_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_conflicts_point_at_mergetool() {
        let summary = summarize(3, 2);
        assert_eq!(summary.remaining, 1);
        assert_eq!(
            summary.to_string(),
            "Completed with 1 conflicts\n\
             Use 'git mergetool' to resolve, then 'git commit'\n\
             Or use 'git merge --abort' to pretend this never happened"
        );
    }

    #[test]
    fn no_remaining_conflicts_is_ready_to_commit() {
        let summary = summarize(0, 0);
        assert_eq!(summary.next_step(), NextStep::Commit);
        assert!(summary.to_string().starts_with("Completed with 0 conflicts\nSafe to 'git commit'\n"));
    }

    #[test]
    fn all_conflicts_unsafe_keeps_full_count() {
        let summary = summarize(2, 0);
        assert_eq!(summary.remaining, 2);
        assert_eq!(summary.next_step(), NextStep::ResolveManually);
    }

    #[test]
    fn every_summary_ends_with_abort_hint() {
        for summary in [summarize(0, 0), summarize(5, 1)] {
            assert!(summary.to_string().ends_with(ABORT_HINT));
        }
    }

    #[test]
    fn safe_count_above_conflicts_saturates() {
        assert_eq!(summarize(1, 4).remaining, 0);
    }
}
