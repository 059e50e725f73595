//! The review tracker: pending pull requests and their approval counts.
//!
//! The tracker owns the only shared mutable state in the bot, a map from pull
//! request number to [`PendingPull`]. Every operation takes one lock for its
//! full duration, including the outbound status report, so reports for a
//! commit can never race or arrive out of order.
//!
//! Per pull request:
//!
//! ```text
//! untracked --commit--> pending(sha, 0) --approval--> pending(sha, k)
//!     ^                                                    |
//!     +------------- success reported (k >= required) -----+
//! ```
//!
//! A failed success report leaves the entry at its incremented count. There
//! is no automatic retry: the next qualifying approval re-attempts the report.

mod pending;
mod policy;

pub use pending::PendingPull;
pub use policy::ApprovalPolicy;

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::github::{CommitState, StatusError, StatusReporter};
use crate::types::{PrNumber, Sha};

/// What `observe_commit` did.
#[derive(Debug)]
pub enum CommitOutcome {
    /// Tracking (re)started and `pending` was reported.
    Reported,
    /// Tracking (re)started but the `pending` report failed.
    ReportFailed(StatusError),
}

/// What `observe_approval` did.
#[derive(Debug)]
pub enum ApprovalOutcome {
    /// The commenter is not on the reviewer allow-list.
    NotAReviewer,
    /// The pull request is not being tracked.
    Untracked,
    /// The author approved their own pull request and the policy forbids it.
    SelfReview,
    /// The reviewer already approved this head commit and repeats count once.
    Duplicate,
    /// Counted, but the threshold is not reached yet.
    Counted { approvals: u32, required: u32 },
    /// Threshold reached, `success` reported and the entry removed.
    Approved { head_sha: Sha },
    /// Threshold reached but the `success` report failed; the entry stays.
    ReportFailed {
        head_sha: Sha,
        approvals: u32,
        error: StatusError,
    },
}

/// Tracks pending pull requests and reports their commit status through `R`.
pub struct ReviewTracker<R> {
    reporter: R,
    policy: ApprovalPolicy,
    pending: Mutex<HashMap<PrNumber, PendingPull>>,
}

impl<R: StatusReporter> ReviewTracker<R> {
    pub fn new(reporter: R, policy: ApprovalPolicy) -> Self {
        ReviewTracker {
            reporter,
            policy,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// Starts tracking `head_sha` for `pr`, discarding any earlier entry and
    /// its approvals, and reports `pending` for the new commit.
    ///
    /// A failed report is logged; the new entry is kept either way.
    pub async fn observe_commit(
        &self,
        pr: PrNumber,
        head_sha: Sha,
        author: Option<String>,
    ) -> CommitOutcome {
        let mut pending = self.pending.lock().await;

        let previous = pending.insert(pr, PendingPull::new(head_sha.clone(), author));
        match previous {
            Some(old) if old.head_sha != head_sha => info!(
                pr = %pr,
                sha = %head_sha.short(),
                previous = %old.head_sha.short(),
                discarded_approvals = old.approvals,
                "New head commit, approvals reset"
            ),
            Some(_) => info!(
                pr = %pr,
                sha = %head_sha.short(),
                "Head commit re-observed, approvals reset"
            ),
            None => info!(pr = %pr, sha = %head_sha.short(), "Tracking pull request"),
        }

        match self.reporter.report(&head_sha, CommitState::Pending).await {
            Ok(()) => CommitOutcome::Reported,
            Err(e) => {
                warn!(
                    pr = %pr,
                    sha = %head_sha.short(),
                    error = %e,
                    "Failed to report pending status"
                );
                CommitOutcome::ReportFailed(e)
            }
        }
    }

    /// Counts an approval of `pr` by `reviewer`.
    ///
    /// Once the count reaches the required number of reviews, `success` is
    /// reported for the tracked head commit and, only if that report
    /// succeeds, the entry is removed.
    pub async fn observe_approval(&self, pr: PrNumber, reviewer: &str) -> ApprovalOutcome {
        if !self.policy.is_allowed_reviewer(reviewer) {
            debug!(pr = %pr, reviewer, "Ignoring approval from non-reviewer");
            return ApprovalOutcome::NotAReviewer;
        }

        let mut pending = self.pending.lock().await;

        let Some(entry) = pending.get_mut(&pr) else {
            warn!(pr = %pr, reviewer, "Approval for untracked pull request");
            return ApprovalOutcome::Untracked;
        };

        if self
            .policy
            .rejects_self_review(entry.author.as_deref(), reviewer)
        {
            info!(pr = %pr, reviewer, "Ignoring self-review");
            return ApprovalOutcome::SelfReview;
        }

        let required = self.policy.required_reviews;
        let approvals = if self.policy.dedupe_reviewers && entry.has_approved(reviewer) {
            // A repeat cannot add to the count, but after a failed success
            // report it still retries the report.
            if entry.approvals < required {
                debug!(pr = %pr, reviewer, "Ignoring repeated approval");
                return ApprovalOutcome::Duplicate;
            }
            entry.approvals
        } else {
            entry.record_approval(reviewer)
        };

        if approvals < required {
            info!(pr = %pr, reviewer, approvals, required, "Approval counted");
            return ApprovalOutcome::Counted {
                approvals,
                required,
            };
        }

        let head_sha = entry.head_sha.clone();
        match self.reporter.report(&head_sha, CommitState::Success).await {
            Ok(()) => {
                pending.remove(&pr);
                info!(pr = %pr, sha = %head_sha.short(), approvals, "Pull request approved");
                ApprovalOutcome::Approved { head_sha }
            }
            Err(error) => {
                warn!(
                    pr = %pr,
                    sha = %head_sha.short(),
                    approvals,
                    error = %error,
                    "Failed to report success status, keeping pull request tracked"
                );
                ApprovalOutcome::ReportFailed {
                    head_sha,
                    approvals,
                    error,
                }
            }
        }
    }

    /// Returns a copy of the entry for `pr`, if tracked.
    pub async fn get(&self, pr: PrNumber) -> Option<PendingPull> {
        self.pending.lock().await.get(&pr).cloned()
    }

    /// Returns every tracked entry, ordered by pull request number.
    pub async fn snapshot(&self) -> Vec<(PrNumber, PendingPull)> {
        let pending = self.pending.lock().await;
        let mut entries: Vec<_> = pending
            .iter()
            .map(|(pr, pull)| (*pr, pull.clone()))
            .collect();
        entries.sort_by_key(|(pr, _)| *pr);
        entries
    }

    pub async fn is_tracked(&self, pr: PrNumber) -> bool {
        self.pending.lock().await.contains_key(&pr)
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
