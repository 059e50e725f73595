//! Event handlers: filter decoded events and drive the review tracker.
//!
//! | Event | Handler | Acts on |
//! |-------|---------|---------|
//! | `pull_request` | `handle_pull_request` | `opened`, `synchronize` |
//! | `issue_comment` | `handle_issue_comment` | `created` on a PR, body matching the approval pattern |
//!
//! Handlers never fail: anything that does not qualify is reported as
//! [`HandlerOutcome::Ignored`].

mod issue_comment;
mod pull_request;

use regex::Regex;

use crate::github::StatusReporter;
use crate::tracker::{ApprovalOutcome, CommitOutcome, ReviewTracker};
use crate::webhooks::GitHubEvent;

pub use issue_comment::handle_issue_comment;
pub use pull_request::handle_pull_request;

/// Why an event did not reach the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Pull request action other than `opened`/`synchronize`.
    PrAction,
    /// Comment was edited or deleted rather than created.
    CommentAction,
    /// Comment is on a plain issue.
    NotAPullRequest,
    /// Comment body does not match the approval pattern.
    NoApproval,
}

/// What handling an event did.
#[derive(Debug)]
pub enum HandlerOutcome {
    Ignored(IgnoreReason),
    Commit(CommitOutcome),
    Approval(ApprovalOutcome),
}

/// Routes a decoded event to its handler.
pub async fn handle_event<R: StatusReporter>(
    event: &GitHubEvent,
    tracker: &ReviewTracker<R>,
    approval_pattern: &Regex,
) -> HandlerOutcome {
    match event {
        GitHubEvent::PullRequest(e) => handle_pull_request(e, tracker).await,
        GitHubEvent::IssueComment(e) => handle_issue_comment(e, tracker, approval_pattern).await,
    }
}
