//! New-vs-seen classification.
//!
//! Compares this run's matches against the ledger snapshot taken before the
//! run merged anything, so every match whose key was unknown at load time
//! counts as new, in listing order.

use crate::models::MatchedAnnouncement;
use crate::storage::Ledger;

/// Matches split by ledger membership.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Full records of the new matches (for notifications)
    pub newly_matched: Vec<MatchedAnnouncement>,
    /// Number of matches already in the ledger
    pub seen_count: usize,
}

impl Classification {
    /// Check if there is anything to notify.
    pub fn has_new(&self) -> bool {
        !self.newly_matched.is_empty()
    }
}

/// Classify matches against a ledger snapshot.
pub fn classify(snapshot: &Ledger, matched: &[MatchedAnnouncement]) -> Classification {
    let mut result = Classification::default();
    for item in matched {
        if snapshot.contains(&item.key) {
            result.seen_count += 1;
        } else {
            result.newly_matched.push(item.clone());
        }
    }
    result
}
