//! Merge a new upstream release into a customized fork.
//!
//! `upmerge` fetches two upstream reference points, merges the newer one into
//! the current checkout and accepts upstream's version of every conflicted
//! file the fork never modified relative to the older one. Whatever is left
//! is reported for manual resolution.
//!
//! - **[`core`]**: Pure logic (path sets, safety classification, summary text).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (process execution, git, config).
//!   Process execution sits behind [`io::process::CommandRunner`] so tests can
//!   script git's answers.
//!
//! [`upgrade::run_upgrade`] sequences the two into one run.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod upgrade;
