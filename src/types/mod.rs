//! Core domain types for the review gate.

pub mod ids;

pub use ids::{InvalidRepoId, PrNumber, RepoId, Sha};
