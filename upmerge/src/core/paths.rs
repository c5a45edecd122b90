//! Path sets exchanged between the git queries and the classifier.

use std::collections::BTreeSet;

/// Repository-relative file paths. Ordered only so that output is stable.
pub type PathSet = BTreeSet<String>;

/// Parse the output of a `--name-only -z` query into a set of paths.
///
/// Entries are NUL-terminated and verbatim, so names with spaces, quotes or
/// non-ASCII characters come through unchanged. Empty entries are skipped.
pub fn parse_name_list(output: &str) -> PathSet {
    output
        .split('\0')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
