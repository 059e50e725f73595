//! GitHub webhook event types.
//!
//! Typed representations of the two deliveries the bot consumes, carrying
//! only the fields the review tracker needs.
//!
//! - `pull_request`: a PR was opened or received new commits
//! - `issue_comment`: someone commented on a PR conversation (where `r+` lives)

use serde::{Deserialize, Serialize};

use crate::types::{PrNumber, Sha};

/// Which webhook endpoint a delivery arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PullRequest,
    IssueComment,
}

impl EventKind {
    /// The `X-GitHub-Event` header value GitHub uses for this kind.
    pub fn github_name(self) -> &'static str {
        match self {
            EventKind::PullRequest => "pull_request",
            EventKind::IssueComment => "issue_comment",
        }
    }
}

/// A parsed webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitHubEvent {
    PullRequest(PullRequestEvent),
    IssueComment(IssueCommentEvent),
}

/// Action performed on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// PR was opened.
    Opened,
    /// PR head was updated (new commits pushed).
    Synchronize,
    /// PR was reopened.
    Reopened,
    /// PR was closed (merged or not).
    Closed,
    /// PR title, body or base branch changed.
    Edited,
}

impl PrAction {
    /// Whether this action introduces a head commit that needs fresh approvals.
    pub fn starts_review(self) -> bool {
        matches!(self, PrAction::Opened | PrAction::Synchronize)
    }
}

/// A pull request lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// The action that triggered this event.
    pub action: PrAction,

    /// The PR number.
    pub pr_number: PrNumber,

    /// The current head SHA of the PR branch.
    pub head_sha: Sha,

    /// Login of the PR author, if the payload carried one.
    pub author: Option<String>,
}

/// Action performed on an issue comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
}

/// An issue/PR comment event.
///
/// GitHub delivers comments on the PR conversation tab as issue comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCommentEvent {
    /// The action that triggered this event.
    pub action: CommentAction,

    /// The PR number, or `None` when the comment is on a plain issue.
    pub pr_number: Option<PrNumber>,

    /// The comment body text (empty if absent).
    pub body: String,

    /// Login of the commenter.
    pub commenter: String,
}
