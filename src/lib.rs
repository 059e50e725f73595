//! r+ - A GitHub bot that gates pull requests on review approvals.
//!
//! The bot tracks each open pull request's head commit, counts `r+` comments
//! from reviewers, and sets a commit status that turns green once enough
//! approvals have been collected for the current head commit.

pub mod config;
pub mod github;
pub mod server;
pub mod tracker;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
