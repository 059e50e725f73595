//! Handler for `issue_comment` webhook events.
//!
//! A newly created PR comment whose body matches the approval pattern is an
//! approval by the commenter. Reviewer allow-list and self-review rules are
//! applied by the tracker's policy.

use regex::Regex;
use tracing::debug;

use crate::github::StatusReporter;
use crate::tracker::ReviewTracker;
use crate::webhooks::events::{CommentAction, IssueCommentEvent};

use super::{HandlerOutcome, IgnoreReason};

/// Handles an issue comment event.
pub async fn handle_issue_comment<R: StatusReporter>(
    event: &IssueCommentEvent,
    tracker: &ReviewTracker<R>,
    approval_pattern: &Regex,
) -> HandlerOutcome {
    let Some(pr_number) = event.pr_number else {
        debug!(commenter = %event.commenter, "Ignoring comment on plain issue");
        return HandlerOutcome::Ignored(IgnoreReason::NotAPullRequest);
    };

    if event.action != CommentAction::Created {
        debug!(pr = %pr_number, action = ?event.action, "Ignoring comment action");
        return HandlerOutcome::Ignored(IgnoreReason::CommentAction);
    }

    if !approval_pattern.is_match(&event.body) {
        return HandlerOutcome::Ignored(IgnoreReason::NoApproval);
    }

    HandlerOutcome::Approval(tracker.observe_approval(pr_number, &event.commenter).await)
}
