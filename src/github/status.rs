//! Commit status reporting.
//!
//! A commit status is the coloured dot GitHub shows next to a commit. The bot
//! sets `pending` when a head commit needs approvals and `success` once it has
//! enough of them.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::{RepoId, Sha};

use super::error::StatusError;

/// Default status context, the label the status is shown under.
pub const DEFAULT_CONTEXT: &str = "github/reviews";

/// The commit states the bot reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitState {
    /// The head commit is awaiting approvals.
    Pending,
    /// The head commit has received enough approvals.
    Success,
}

impl CommitState {
    /// Returns the GitHub API string for this state.
    pub fn as_api_str(self) -> &'static str {
        match self {
            CommitState::Pending => "pending",
            CommitState::Success => "success",
        }
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Pushes commit statuses to the hosting platform.
///
/// Implementations are scoped to a single repository. The production
/// implementation is [`super::OctocrabClient`]; tests use a recording fake.
pub trait StatusReporter: Send + Sync {
    /// Sets the status of `sha` to `state`.
    fn report(
        &self,
        sha: &Sha,
        state: CommitState,
    ) -> impl Future<Output = Result<(), StatusError>> + Send;
}

/// JSON body of `POST /repos/{owner}/{repo}/statuses/{sha}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRequest<'a> {
    pub state: CommitState,
    pub description: &'a str,
    pub context: &'a str,
}

impl<'a> StatusRequest<'a> {
    pub fn new(state: CommitState, context: &'a str) -> Self {
        StatusRequest {
            state,
            description: "",
            context,
        }
    }
}

/// Returns the API route for setting a status on `sha` in `repo`.
pub fn status_route(repo: &RepoId, sha: &Sha) -> String {
    format!("/repos/{}/{}/statuses/{}", repo.owner, repo.repo, sha.as_str())
}
