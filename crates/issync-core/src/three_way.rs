//! Generic base/local/remote classification. Pure and type-agnostic:
//! the caller supplies whatever equality makes sense for the field (string
//! equality for scalars, bag equality for label sets).

use issync_types::ComparisonOutcome;

/// Classify `(base, local, remote)` given an equality predicate over `T`.
pub fn compare<T>(base: &T, local: &T, remote: &T, eq: impl Fn(&T, &T) -> bool) -> ComparisonOutcome {
    let base_local = eq(base, local);
    let base_remote = eq(base, remote);
    let local_remote = eq(local, remote);

    if base_local && base_remote {
        ComparisonOutcome::NoChange
    } else if base_local && !base_remote {
        ComparisonOutcome::RemoteChanged
    } else if !base_local && base_remote {
        ComparisonOutcome::LocalChanged
    } else if !base_local && local_remote {
        ComparisonOutcome::ConvergedChanged
    } else {
        ComparisonOutcome::Conflict
    }
}

/// Bag (multiset-as-set) equality for label comparisons — order never
/// matters, only membership.
pub fn labels_equal(a: &[String], b: &[String]) -> bool {
    use std::collections::BTreeSet;
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}
