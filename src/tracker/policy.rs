//! Rules deciding which approvals count.

use std::collections::HashSet;

/// Which approvals count toward a pull request's threshold.
///
/// GitHub logins are case-insensitive, so every login comparison here is too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPolicy {
    /// Approvals needed on the current head commit.
    pub required_reviews: u32,

    /// Lower-cased allow-list; `None` lets anyone approve.
    reviewers: Option<HashSet<String>>,

    /// Whether a PR author's approval counts on their own PR.
    pub self_review: bool,

    /// Whether a reviewer's repeated approvals count once per head commit.
    pub dedupe_reviewers: bool,
}

impl ApprovalPolicy {
    /// A policy requiring `required_reviews` approvals from anyone except the
    /// author, counting repeats.
    pub fn new(required_reviews: u32) -> Self {
        ApprovalPolicy {
            required_reviews,
            reviewers: None,
            self_review: false,
            dedupe_reviewers: false,
        }
    }

    /// Restricts counted approvals to the given logins.
    pub fn with_reviewers<I, S>(mut self, reviewers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reviewers = Some(
            reviewers
                .into_iter()
                .map(|r| r.as_ref().to_lowercase())
                .collect(),
        );
        self
    }

    pub fn with_self_review(mut self, allowed: bool) -> Self {
        self.self_review = allowed;
        self
    }

    pub fn with_dedupe_reviewers(mut self, dedupe: bool) -> Self {
        self.dedupe_reviewers = dedupe;
        self
    }

    /// Whether `login` may approve at all.
    pub fn is_allowed_reviewer(&self, login: &str) -> bool {
        match &self.reviewers {
            Some(allowed) => allowed.contains(&login.to_lowercase()),
            None => true,
        }
    }

    /// Whether an approval by `reviewer` on a PR written by `author` is a
    /// self-review the policy rejects.
    pub fn rejects_self_review(&self, author: Option<&str>, reviewer: &str) -> bool {
        !self.self_review && author.is_some_and(|a| same_login(a, reviewer))
    }
}

/// Compares two GitHub logins.
pub fn same_login(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
