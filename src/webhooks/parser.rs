//! GitHub webhook payload parser.
//!
//! Parses raw webhook JSON into the typed events in [`super::events`]. The
//! payload structs below mirror GitHub's JSON closely enough to pull out the
//! fields we need and ignore everything else.
//!
//! # Parsing Strategy
//!
//! 1. The endpoint the delivery arrived on decides the event kind
//! 2. Pull request actions the bot has no use for return `Ok(None)`
//! 3. Malformed payloads return `Err` with details
//!
//! Payloads are untrusted: nothing here panics on bad input.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{PrNumber, Sha};

use super::events::{
    CommentAction, EventKind, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent,
};

/// Error type for webhook parsing failures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON deserialization failed (includes missing required fields).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A field the bot needs was absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Field has an invalid value (e.g. empty SHA, unknown action).
    #[error("invalid field value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

/// Parses a webhook payload received on the endpoint for `kind`.
///
/// # Returns
///
/// * `Ok(Some(event))` - a decoded event
/// * `Ok(None)` - a pull request action the bot does not model (labeled, assigned, ...)
/// * `Err(e)` - malformed payload
///
/// # Examples
///
/// ```
/// use r_plus::webhooks::{EventKind, GitHubEvent, parse_webhook};
///
/// let payload = br#"{
///     "action": "created",
///     "issue": { "number": 5, "pull_request": {} },
///     "comment": { "body": "r+" },
///     "sender": { "login": "alice" }
/// }"#;
///
/// let event = parse_webhook(EventKind::IssueComment, payload).unwrap();
/// assert!(matches!(event, Some(GitHubEvent::IssueComment(_))));
/// ```
pub fn parse_webhook(kind: EventKind, payload: &[u8]) -> Result<Option<GitHubEvent>, ParseError> {
    match kind {
        EventKind::PullRequest => {
            parse_pull_request(payload).map(|opt| opt.map(GitHubEvent::PullRequest))
        }
        EventKind::IssueComment => {
            parse_issue_comment(payload).map(|e| Some(GitHubEvent::IssueComment(e)))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

// ============================================================================
// pull_request event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    // Top-level `number` is what GitHub documents for this event; the nested
    // one is identical but some senders omit the top-level field.
    number: Option<u64>,
    pull_request: RawPullRequest,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: Option<u64>,
    head: RawHead,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawHead {
    sha: String,
}

/// Parses a `pull_request` payload.
///
/// Returns `Ok(None)` for actions other than the ones in [`PrAction`].
pub fn parse_pull_request(payload: &[u8]) -> Result<Option<PullRequestEvent>, ParseError> {
    let raw: RawPullRequestPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_str() {
        "opened" => PrAction::Opened,
        "synchronize" => PrAction::Synchronize,
        "reopened" => PrAction::Reopened,
        "closed" => PrAction::Closed,
        "edited" => PrAction::Edited,
        _ => return Ok(None),
    };

    let number = raw
        .number
        .or(raw.pull_request.number)
        .ok_or(ParseError::MissingField("number"))?;

    let head_sha = raw.pull_request.head.sha.trim();
    if head_sha.is_empty() {
        return Err(ParseError::InvalidField {
            field: "pull_request.head.sha",
            value: raw.pull_request.head.sha.clone(),
        });
    }

    Ok(Some(PullRequestEvent {
        action,
        pr_number: PrNumber(number),
        head_sha: Sha::new(head_sha),
        author: raw.pull_request.user.map(|u| u.login),
    }))
}

// ============================================================================
// issue_comment event
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: Option<String>,
    issue: RawIssue,
    comment: RawComment,
    sender: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    // Present (even if empty) only when the issue is actually a PR.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: Option<String>,
    user: Option<RawUser>,
}

/// Parses an `issue_comment` payload.
///
/// The commenter is taken from `sender`, falling back to `comment.user`. A
/// missing `action` is read as `created`.
pub fn parse_issue_comment(payload: &[u8]) -> Result<IssueCommentEvent, ParseError> {
    let raw: RawIssueCommentPayload = serde_json::from_slice(payload)?;

    let action = match raw.action.as_deref() {
        None | Some("created") => CommentAction::Created,
        Some("edited") => CommentAction::Edited,
        Some("deleted") => CommentAction::Deleted,
        Some(other) => {
            return Err(ParseError::InvalidField {
                field: "action",
                value: other.to_string(),
            });
        }
    };

    let commenter = raw
        .sender
        .or(raw.comment.user)
        .map(|u| u.login)
        .ok_or(ParseError::MissingField("sender.login"))?;

    let pr_number = raw.issue.pull_request.map(|_| PrNumber(raw.issue.number));

    Ok(IssueCommentEvent {
        action,
        pr_number,
        body: raw.comment.body.unwrap_or_default(),
        commenter,
    })
}
