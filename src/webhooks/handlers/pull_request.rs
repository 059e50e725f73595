//! Handler for `pull_request` webhook events.
//!
//! A PR that is opened or receives new commits needs fresh approvals for its
//! head commit. Every other action is ignored.

use tracing::debug;

use crate::github::StatusReporter;
use crate::tracker::ReviewTracker;
use crate::webhooks::events::PullRequestEvent;

use super::{HandlerOutcome, IgnoreReason};

/// Handles a pull request event.
pub async fn handle_pull_request<R: StatusReporter>(
    event: &PullRequestEvent,
    tracker: &ReviewTracker<R>,
) -> HandlerOutcome {
    if !event.action.starts_review() {
        debug!(pr = %event.pr_number, action = ?event.action, "Ignoring pull request action");
        return HandlerOutcome::Ignored(IgnoreReason::PrAction);
    }

    let outcome = tracker
        .observe_commit(event.pr_number, event.head_sha.clone(), event.author.clone())
        .await;
    HandlerOutcome::Commit(outcome)
}
