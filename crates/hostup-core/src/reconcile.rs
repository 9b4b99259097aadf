//! Merges per-manager discovery results and applies the exclusion list.

use serde::Serialize;

use crate::models::{ExclusionSet, UpgradeCandidate};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Reconciliation {
    pub accepted: Vec<UpgradeCandidate>,
    pub excluded: Vec<UpgradeCandidate>,
}

impl Reconciliation {
    pub fn discovered(&self) -> usize {
        self.accepted.len() + self.excluded.len()
    }
}

/// Concatenates candidate lists in manager-query order and splits them into
/// accepted and excluded, preserving discovery order in both.
///
/// The same application reported by two managers stays as two candidates;
/// each manager upgrades its own copy.
pub fn partition<I>(candidate_lists: I, exclusions: &ExclusionSet) -> Reconciliation
where
    I: IntoIterator<Item = Vec<UpgradeCandidate>>,
{
    let mut reconciliation = Reconciliation::default();

    for candidate in candidate_lists.into_iter().flatten() {
        if is_excluded(&candidate, exclusions) {
            reconciliation.excluded.push(candidate);
        } else {
            reconciliation.accepted.push(candidate);
        }
    }

    reconciliation
}

pub fn reconcile<I>(candidate_lists: I, exclusions: &ExclusionSet) -> Vec<UpgradeCandidate>
where
    I: IntoIterator<Item = Vec<UpgradeCandidate>>,
{
    partition(candidate_lists, exclusions).accepted
}

pub fn is_excluded(candidate: &UpgradeCandidate, exclusions: &ExclusionSet) -> bool {
    exclusions.contains(candidate.normalized_id()) || exclusions.contains(&candidate.id)
}
