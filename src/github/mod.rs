//! GitHub commit status reporting.
//!
//! This module provides the [`StatusReporter`] seam the review tracker reports
//! through, and its octocrab-backed implementation.
//!
//! - `POST /repos/{owner}/{repo}/statuses/{sha}` with `{state, description, context}`
//! - Bearer-token authentication
//! - Every request bounded by a timeout
//! - No automatic retry: a failure is returned to the caller

mod client;
mod error;
mod status;

pub use client::{DEFAULT_TIMEOUT, OctocrabClient};
pub use error::StatusError;
pub use status::{
    CommitState, DEFAULT_CONTEXT, StatusReporter, StatusRequest, status_route,
};
