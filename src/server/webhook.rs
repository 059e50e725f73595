//! Webhook endpoint handlers and the signature gate in front of them.
//!
//! Each event kind has its own endpoint. A delivery is authenticated by
//! [`require_signature`] before its handler runs, decoded, filtered and
//! applied to the review tracker. The sender only ever sees a status code.

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::github::StatusReporter;
use crate::tracker::{ApprovalOutcome, CommitOutcome};
use crate::webhooks::{
    EventKind, HandlerOutcome, ParseError, SHA1_HEADER, SHA256_HEADER, handle_event,
    parse_webhook, verify_signature,
};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";

/// GitHub's payload cap.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Neither signature header is present.
    #[error("missing signature header")]
    MissingSignature,

    /// Invalid signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// The request body could not be read.
    #[error("unreadable request body")]
    UnreadableBody,

    /// The payload could not be decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ParseError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::UnreadableBody | WebhookError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// Middleware rejecting deliveries whose signature does not verify.
///
/// `X-Hub-Signature-256` is checked when present, otherwise `X-Hub-Signature`.
/// The body is buffered to verify it and handed on unchanged.
pub async fn require_signature<R: StatusReporter + 'static>(
    State(app_state): State<AppState<R>>,
    request: Request,
    next: Next,
) -> Result<Response, WebhookError> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| WebhookError::UnreadableBody)?;

    let signature = get_header(&parts.headers, SHA256_HEADER)
        .or_else(|| get_header(&parts.headers, SHA1_HEADER))
        .ok_or_else(|| {
            warn!(path = %parts.uri.path(), "Webhook without signature");
            WebhookError::MissingSignature
        })?;

    if !verify_signature(&bytes, signature, app_state.webhook_secret()) {
        warn!(
            path = %parts.uri.path(),
            delivery_id = get_header(&parts.headers, HEADER_DELIVERY).unwrap_or("-"),
            "Invalid webhook signature"
        );
        return Err(WebhookError::InvalidSignature);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Handler for the pull request endpoint.
pub async fn pull_request_handler<R: StatusReporter + 'static>(
    State(app_state): State<AppState<R>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    handle_delivery(&app_state, EventKind::PullRequest, &headers, &body).await
}

/// Handler for the issue comment endpoint.
pub async fn issue_comment_handler<R: StatusReporter + 'static>(
    State(app_state): State<AppState<R>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    handle_delivery(&app_state, EventKind::IssueComment, &headers, &body).await
}

async fn handle_delivery<R: StatusReporter>(
    app_state: &AppState<R>,
    kind: EventKind,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<StatusCode, WebhookError> {
    let delivery_id = get_header(headers, HEADER_DELIVERY).unwrap_or("-");

    match get_header(headers, HEADER_EVENT) {
        Some("ping") => {
            info!(delivery_id, endpoint = kind.github_name(), "Received ping");
            return Ok(StatusCode::ACCEPTED);
        }
        Some(event_type) if event_type != kind.github_name() => {
            debug!(
                delivery_id,
                event_type,
                endpoint = kind.github_name(),
                "Ignoring event delivered to the wrong endpoint"
            );
            return Ok(StatusCode::ACCEPTED);
        }
        _ => {}
    }

    let event = match parse_webhook(kind, body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery_id, endpoint = kind.github_name(), "Ignoring unsupported action");
            return Ok(StatusCode::ACCEPTED);
        }
        Err(e) => {
            warn!(
                delivery_id,
                endpoint = kind.github_name(),
                error = %e,
                "Failed to decode webhook"
            );
            return Err(WebhookError::InvalidPayload(e));
        }
    };

    let outcome = handle_event(&event, app_state.tracker(), app_state.approval_pattern()).await;
    log_outcome(delivery_id, &outcome);

    Ok(StatusCode::ACCEPTED)
}

fn log_outcome(delivery_id: &str, outcome: &HandlerOutcome) {
    match outcome {
        HandlerOutcome::Ignored(reason) => debug!(delivery_id, reason = ?reason, "Event ignored"),
        HandlerOutcome::Commit(CommitOutcome::ReportFailed(_))
        | HandlerOutcome::Approval(ApprovalOutcome::ReportFailed { .. }) => {
            debug!(delivery_id, "Event applied, status report failed")
        }
        HandlerOutcome::Commit(_) | HandlerOutcome::Approval(_) => {
            debug!(delivery_id, outcome = ?outcome, "Event applied")
        }
    }
}

/// Extracts a header value as a string.
fn get_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_errors_are_unauthorized() {
        for err in [WebhookError::MissingSignature, WebhookError::InvalidSignature] {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn decode_errors_are_bad_request() {
        let err = WebhookError::InvalidPayload(ParseError::MissingField("number"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WebhookError::UnreadableBody.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn get_header_ignores_non_ascii() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_EVENT, "pull_request".parse().unwrap());
        headers.insert(HEADER_DELIVERY, axum::http::HeaderValue::from_bytes(b"\xff").unwrap());

        assert_eq!(get_header(&headers, HEADER_EVENT), Some("pull_request"));
        assert_eq!(get_header(&headers, HEADER_DELIVERY), None);
        assert_eq!(get_header(&headers, SHA1_HEADER), None);
    }
}
