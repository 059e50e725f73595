//! A pull request awaiting approvals.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::Sha;

use super::policy::same_login;

/// One tracked pull request.
///
/// Approvals are scoped to `head_sha`: a new head commit replaces the whole
/// entry, so counts never carry over between commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPull {
    /// The head commit approvals are being collected for.
    pub head_sha: Sha,

    /// Login of the PR author, when known.
    pub author: Option<String>,

    /// Qualifying approvals counted against `head_sha`.
    pub approvals: u32,

    /// Distinct reviewers who approved `head_sha`, in order of first approval.
    pub approvers: Vec<String>,

    /// When tracking of `head_sha` began.
    pub tracked_since: DateTime<Utc>,
}

impl PendingPull {
    pub fn new(head_sha: Sha, author: Option<String>) -> Self {
        PendingPull {
            head_sha,
            author,
            approvals: 0,
            approvers: Vec::new(),
            tracked_since: Utc::now(),
        }
    }

    /// Whether `reviewer` has already approved this head commit.
    pub fn has_approved(&self, reviewer: &str) -> bool {
        self.approvers.iter().any(|a| same_login(a, reviewer))
    }

    /// Counts one approval from `reviewer` and returns the new total.
    pub fn record_approval(&mut self, reviewer: &str) -> u32 {
        self.approvals += 1;
        if !self.has_approved(reviewer) {
            self.approvers.push(reviewer.to_string());
        }
        self.approvals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_has_no_approvals() {
        let pull = PendingPull::new(Sha::new("abc"), Some("roland".to_string()));
        assert_eq!(pull.approvals, 0);
        assert!(pull.approvers.is_empty());
        assert_eq!(pull.head_sha, Sha::new("abc"));
    }

    #[test]
    fn repeated_approvals_count_but_list_reviewer_once() {
        let mut pull = PendingPull::new(Sha::new("abc"), None);
        assert_eq!(pull.record_approval("alice"), 1);
        assert_eq!(pull.record_approval("Alice"), 2);
        assert_eq!(pull.record_approval("bob"), 3);
        assert_eq!(pull.approvers, vec!["alice".to_string(), "bob".to_string()]);
        assert!(pull.has_approved("ALICE"));
        assert!(!pull.has_approved("carol"));
    }
}
