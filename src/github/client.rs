//! Octocrab client wrapper scoped to a specific repository.
//!
//! `OctocrabClient` wraps an `Octocrab` instance and scopes all operations to
//! the one repository the bot serves.

use std::time::Duration;

use http_body_util::BodyExt;
use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;
use tracing::debug;

use crate::types::{RepoId, Sha};

use super::error::StatusError;
use super::status::{CommitState, DEFAULT_CONTEXT, StatusReporter, StatusRequest, status_route};

/// Default upper bound on a single status request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The repository this client is scoped to.
    repo: RepoId,

    /// Context label attached to every status.
    context: String,

    /// Upper bound on a single status request.
    timeout: Duration,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given repository.
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self {
            client,
            repo,
            context: DEFAULT_CONTEXT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a client authenticated with a bearer token.
    ///
    /// `api_base` overrides `https://api.github.com` (GitHub Enterprise, tests).
    /// Octocrab's own retries are switched off; a failed report is returned
    /// to the tracker as is.
    pub fn from_token(
        token: impl Into<String>,
        repo: RepoId,
        api_base: Option<&str>,
    ) -> Result<Self, octocrab::Error> {
        let mut builder = Octocrab::builder()
            .personal_token(token.into())
            .add_retry_config(RetryConfig::None);
        if let Some(base) = api_base {
            builder = builder.base_uri(base.to_string())?;
        }
        Ok(Self::new(builder.build()?, repo))
    }

    /// Sets the status context label.
    pub fn with_status_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn create_status(&self, sha: &Sha, state: CommitState) -> Result<(), StatusError> {
        let route = status_route(&self.repo, sha);
        let request = StatusRequest::new(state, &self.context);

        debug!(route = %route, state = %state, "Creating commit status");

        // Error bodies are not always GitHub JSON (proxies, load balancers).
        let response = self
            .client
            ._post(route.as_str(), Some(&request))
            .await
            .map_err(StatusError::Request)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .unwrap_or_default();
        Err(StatusError::rejected(status.as_u16(), &body))
    }
}

impl StatusReporter for OctocrabClient {
    async fn report(&self, sha: &Sha, state: CommitState) -> Result<(), StatusError> {
        // The tracker lock is held across this call.
        tokio::time::timeout(self.timeout, self.create_status(sha, state))
            .await
            .map_err(|_| StatusError::TimedOut(self.timeout))?
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .field("context", &self.context)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    const ROUTE: &str = "/repos/{owner}/{repo}/statuses/{sha}";

    #[derive(Debug, Clone)]
    struct Received {
        path: (String, String, String),
        authorization: Option<String>,
        body: serde_json::Value,
    }

    type Log = Arc<Mutex<Vec<Received>>>;

    async fn record(
        State(log): State<Log>,
        Path(path): Path<(String, String, String)>,
        headers: HeaderMap,
        body: Bytes,
    ) -> StatusCode {
        log.lock().unwrap().push(Received {
            path,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(&body).unwrap(),
        });
        StatusCode::CREATED
    }

    /// Serves `router` on an ephemeral port and returns its base URL.
    async fn fake_github(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    async fn recording_github() -> (String, Log) {
        let log = Log::default();
        let router = Router::new().route(ROUTE, post(record)).with_state(log.clone());
        (fake_github(router).await, log)
    }

    fn client(base: &str) -> OctocrabClient {
        let _ = rustls::crypto::ring::default_provider().install_default();
        OctocrabClient::from_token("t0ken", RepoId::new("owner", "repo"), Some(base)).unwrap()
    }

    #[tokio::test]
    async fn posts_pending_status_to_commit_route() {
        let (base, log) = recording_github().await;

        client(&base)
            .report(&Sha::new("abc123"), CommitState::Pending)
            .await
            .unwrap();

        let received = log.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].path,
            ("owner".to_string(), "repo".to_string(), "abc123".to_string())
        );
        assert_eq!(received[0].authorization.as_deref(), Some("Bearer t0ken"));
        assert_eq!(
            received[0].body,
            serde_json::json!({
                "state": "pending",
                "description": "",
                "context": "github/reviews"
            })
        );
    }

    #[tokio::test]
    async fn success_uses_configured_context() {
        let (base, log) = recording_github().await;

        client(&base)
            .with_status_context("ci/r-plus")
            .report(&Sha::new("def456"), CommitState::Success)
            .await
            .unwrap();

        let received = log.lock().unwrap().clone();
        assert_eq!(received[0].body["state"], "success");
        assert_eq!(received[0].body["context"], "ci/r-plus");
    }

    #[tokio::test]
    async fn plain_text_error_keeps_status_and_body() {
        let router = Router::new().route(
            ROUTE,
            post(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
        );
        let base = fake_github(router).await;

        let err = client(&base)
            .report(&Sha::new("abc123"), CommitState::Pending)
            .await
            .unwrap_err();

        match err {
            StatusError::Rejected { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>upstream down</html>");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_error_keeps_status_and_message() {
        let router = Router::new().route(
            ROUTE,
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    r#"{"message":"No commit found for SHA: abc123"}"#,
                )
            }),
        );
        let base = fake_github(router).await;

        let err = client(&base)
            .report(&Sha::new("abc123"), CommitState::Success)
            .await
            .unwrap_err();

        match err {
            StatusError::Rejected { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("No commit found for SHA: abc123"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let router = Router::new().route(
            ROUTE,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::CREATED
            }),
        );
        let base = fake_github(router).await;
        let timeout = Duration::from_millis(100);

        let err = client(&base)
            .with_timeout(timeout)
            .report(&Sha::new("abc123"), CommitState::Pending)
            .await
            .unwrap_err();

        assert!(matches!(err, StatusError::TimedOut(d) if d == timeout));
    }

    #[tokio::test]
    async fn unreachable_api_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .report(&Sha::new("abc123"), CommitState::Pending)
            .await
            .unwrap_err();

        assert!(matches!(err, StatusError::Request(_)));
    }

    #[tokio::test]
    async fn debug_omits_token() {
        let client = client("http://127.0.0.1:1").with_timeout(Duration::from_secs(3));

        let debug = format!("{client:?}");
        assert!(debug.contains("owner"));
        assert!(debug.contains("3s"));
        assert!(!debug.contains("t0ken"));
    }
}
