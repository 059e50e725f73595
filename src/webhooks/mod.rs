//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA1 and HMAC-SHA256)
//! - Decoding of `pull_request` and `issue_comment` payloads
//! - Handlers that filter events and drive the review tracker

pub mod events;
pub mod handlers;
pub mod parser;
pub mod signature;

pub use events::{
    CommentAction, EventKind, GitHubEvent, IssueCommentEvent, PrAction, PullRequestEvent,
};
pub use handlers::{HandlerOutcome, IgnoreReason, handle_event};
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    SHA1_HEADER, SHA256_HEADER, SignatureAlgorithm, compute_signature, format_signature_header,
    parse_signature_header, verify_signature,
};
