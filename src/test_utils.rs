//! Shared test utilities: a recording status reporter and proptest generators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::github::{CommitState, StatusError, StatusReporter};
use crate::types::{PrNumber, Sha};

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    (1u64..100_000).prop_map(PrNumber)
}

pub fn arb_sha() -> impl Strategy<Value = Sha> {
    "[0-9a-f]{40}".prop_map(Sha::new)
}

pub fn arb_login() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// A [`StatusReporter`] that records every call instead of talking to GitHub.
///
/// Clones share the same call log, so a test can keep one handle while the
/// tracker owns another.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    inner: Arc<RecordingInner>,
}

#[derive(Default)]
struct RecordingInner {
    calls: Mutex<Vec<(Sha, CommitState)>>,
    fail_pending: AtomicBool,
    fail_success: AtomicBool,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent reports of `state` fail (or succeed again).
    pub fn set_failing(&self, state: CommitState, failing: bool) {
        let flag = match state {
            CommitState::Pending => &self.inner.fail_pending,
            CommitState::Success => &self.inner.fail_success,
        };
        flag.store(failing, Ordering::SeqCst);
    }

    /// Every report attempted so far, failed ones included.
    pub fn calls(&self) -> Vec<(Sha, CommitState)> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// The states reported for `sha`, in order.
    pub fn states_for(&self, sha: &Sha) -> Vec<CommitState> {
        self.calls()
            .into_iter()
            .filter(|(s, _)| s == sha)
            .map(|(_, state)| state)
            .collect()
    }

    pub fn last_state_for(&self, sha: &Sha) -> Option<CommitState> {
        self.states_for(sha).last().copied()
    }

    pub fn count(&self, state: CommitState) -> usize {
        self.calls().iter().filter(|(_, s)| *s == state).count()
    }
}

impl StatusReporter for RecordingReporter {
    async fn report(&self, sha: &Sha, state: CommitState) -> Result<(), StatusError> {
        self.inner.calls.lock().unwrap().push((sha.clone(), state));

        let failing = match state {
            CommitState::Pending => self.inner.fail_pending.load(Ordering::SeqCst),
            CommitState::Success => self.inner.fail_success.load(Ordering::SeqCst),
        };
        if failing {
            Err(StatusError::Rejected {
                status: 500,
                body: "Internal Server Error".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
