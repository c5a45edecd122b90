//! Decides which conflicted paths can take the incoming version verbatim.
//!
//! A path that conflicts after merging the new upstream release, but that the
//! fork never changed relative to the old upstream baseline, only conflicts
//! because of upstream's own history. Accepting upstream's version is safe.

use crate::core::paths::PathSet;

/// Every path in `conflicted` that is absent from `modified`.
pub fn classify_safe(conflicted: &PathSet, modified: &PathSet) -> PathSet {
    conflicted.difference(modified).cloned().collect()
}
