//! Read-only view of the tracked pull requests.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::github::StatusReporter;
use crate::tracker::PendingPull;
use crate::types::PrNumber;

/// One tracked pull request as shown by `GET /pending`.
#[derive(Debug, Serialize)]
pub struct PendingView {
    pub number: PrNumber,
    #[serde(flatten)]
    pub pull: PendingPull,
}

/// Lists every pull request awaiting approvals, ordered by number.
///
/// ```ignore
/// GET /pending HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// [{"number":5,"head_sha":"abc","author":"roland","approvals":0,
///   "approvers":[],"tracked_since":"2024-05-01T12:00:00Z"}]
/// ```
pub async fn pending_handler<R: StatusReporter + 'static>(
    State(app_state): State<AppState<R>>,
) -> Json<Vec<PendingView>> {
    let pending = app_state
        .tracker()
        .snapshot()
        .await
        .into_iter()
        .map(|(number, pull)| PendingView { number, pull })
        .collect();
    Json(pending)
}
