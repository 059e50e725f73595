//! Status reporting error types.

use std::time::Duration;

use thiserror::Error;

/// Longest response body kept on a [`StatusError::Rejected`].
const MAX_BODY_CHARS: usize = 512;

/// A failed attempt to set a commit status.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The API answered with a non-success status code.
    #[error("unexpected response status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The request never produced a response (network, TLS, URI).
    #[error("status request failed: {0}")]
    Request(#[source] octocrab::Error),

    /// The request did not complete within the configured timeout.
    #[error("status request timed out after {0:?}")]
    TimedOut(Duration),
}

impl StatusError {
    /// Builds a [`StatusError::Rejected`] from a raw response.
    ///
    /// The body need not be JSON; a proxy's HTML error page is kept too.
    pub fn rejected(status: u16, body: &[u8]) -> Self {
        StatusError::Rejected {
            status,
            body: single_line(&String::from_utf8_lossy(body)),
        }
    }
}

/// Collapses a response body onto one line so it fits in a log event.
fn single_line(body: &str) -> String {
    let joined = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    match joined.char_indices().nth(MAX_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &joined[..cut]),
        None => joined,
    }
}
