//! HTTP server for the review bot.
//!
//! # Endpoints
//!
//! - `POST <pr-path>` - `pull_request` deliveries (returns 202 Accepted)
//! - `POST <comment-path>` - `issue_comment` deliveries (returns 202 Accepted)
//! - `GET /pending` - Tracked pull requests as JSON
//! - `GET /health` - Returns 200 if server is running
//!
//! Both webhook endpoints sit behind [`webhook::require_signature`]; a
//! delivery that fails verification gets 401 and never reaches a handler.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use regex::Regex;
use tower_http::trace::TraceLayer;

use crate::github::StatusReporter;
use crate::tracker::ReviewTracker;

pub mod health;
pub mod pending;
pub mod tls;
pub mod webhook;

pub use health::health_handler;
pub use pending::pending_handler;
pub use tls::{TlsError, load_acceptor, serve_tls};
pub use webhook::{WebhookError, issue_comment_handler, pull_request_handler, require_signature};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<R> {
    inner: Arc<AppStateInner<R>>,
}

struct AppStateInner<R> {
    tracker: ReviewTracker<R>,

    /// Pattern a comment must match to count as an approval.
    approval_pattern: Regex,

    /// Webhook secret for signature verification.
    webhook_secret: Vec<u8>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: StatusReporter> AppState<R> {
    pub fn new(
        tracker: ReviewTracker<R>,
        approval_pattern: Regex,
        webhook_secret: impl Into<Vec<u8>>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                tracker,
                approval_pattern,
                webhook_secret: webhook_secret.into(),
            }),
        }
    }

    pub fn tracker(&self) -> &ReviewTracker<R> {
        &self.inner.tracker
    }

    pub fn approval_pattern(&self) -> &Regex {
        &self.inner.approval_pattern
    }

    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<R: StatusReporter + 'static>(
    app_state: AppState<R>,
    pr_path: &str,
    comment_path: &str,
) -> Router {
    // Layered on the POST endpoints only, so other methods still get 405.
    let signed = || middleware::from_fn_with_state(app_state.clone(), require_signature::<R>);

    Router::new()
        .route("/health", get(health_handler))
        .route("/pending", get(pending_handler::<R>))
        .route(pr_path, post(pull_request_handler::<R>).route_layer(signed()))
        .route(comment_path, post(issue_comment_handler::<R>).route_layer(signed()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
